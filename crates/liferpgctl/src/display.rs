//! Display - text rendering for the menu and subcommands
//!
//! Everything returns strings so callers decide where they go.

use liferpg_common::level_curve::{CHILD_SKILL_CURVE, LIFE_SKILL_CURVE, PLAYER_CURVE};
use liferpg_common::{CompletionReport, PlayerSummary, QuestSummary, SkillBreakdownRow};
use owo_colors::OwoColorize;

const BAR_WIDTH: usize = 20;

/// `[=====-----]` style bar for a 0-100 value
pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = (percent * width) / 100;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "=".repeat(filled), "-".repeat(empty))
}

/// One numbered menu entry
pub fn quest_line(index: usize, quest: &QuestSummary) -> String {
    let mut extra = String::new();
    if let Some(period) = quest.reset_period {
        extra = format!(" ({})", period.as_str());
    }
    if let Some(limit) = quest.time_limit {
        extra = format!(
            " (Time Limit: {}, Streak: {})",
            limit.format("%Y-%m-%d %H:%M"),
            quest.streak_required.unwrap_or(0)
        );
    }
    format!(
        "{}. {} ({} EXP, {} Coins){}",
        index,
        quest.name,
        quest.exp_reward,
        quest.coin_reward,
        extra.dimmed()
    )
}

pub fn quest_list(quests: &[QuestSummary]) -> String {
    let mut out = String::from("Available Quests:\n");
    for (i, quest) in quests.iter().enumerate() {
        out.push_str(&quest_line(i + 1, quest));
        out.push('\n');
    }
    out
}

/// Messages printed after a completion, level-ups highlighted
pub fn completion_lines(report: &CompletionReport) -> Vec<String> {
    let mut lines = vec![
        format!("Completed quest: {}", report.quest.name.bold()),
        format!(
            "Gained {} EXP in {}!",
            report.experience_gained, report.child_skill
        ),
    ];

    let deltas = report.deltas;
    if deltas.child_skill > 0 {
        lines.push(
            format!(
                "{} leveled up to {}! Earned {} coins!",
                report.child_skill,
                report.child_skill_level,
                deltas.child_skill as u64 * CHILD_SKILL_CURVE.coins_per_level
            )
            .bright_green()
            .to_string(),
        );
    }
    if deltas.life_skill > 0 {
        lines.push(
            format!(
                "{} leveled up to {}! Earned {} coins!",
                report.life_skill,
                report.life_skill_level,
                deltas.life_skill as u64 * LIFE_SKILL_CURVE.coins_per_level
            )
            .bright_green()
            .to_string(),
        );
    }
    if deltas.player > 0 {
        lines.push(
            format!(
                "Player leveled up to {}! Earned {} coins!",
                report.player_level,
                deltas.player as u64 * PLAYER_CURVE.coins_per_level
            )
            .bright_yellow()
            .to_string(),
        );
    }
    if report.quest_coins > 0 {
        lines.push(format!("Earned {} coins from quest!", report.quest_coins));
    }
    lines
}

pub fn player_line(summary: &PlayerSummary) -> String {
    format!(
        "Player: {} (Level {}, EXP {}, Coins {}, Quests Completed {})\n  {} {}% ({} EXP to level {})",
        summary.name.bold(),
        summary.level,
        summary.experience,
        summary.coins,
        summary.quests_completed,
        progress_bar(summary.progress_percent, BAR_WIDTH).cyan(),
        summary.progress_percent,
        summary.experience_to_next,
        summary.level + 1
    )
}

/// Skills grouped under their life skill, in breakdown order
pub fn skill_tree(rows: &[SkillBreakdownRow]) -> String {
    let mut out = String::from("Player Stats:\n");
    let mut current: Option<&str> = None;
    for row in rows {
        if current != Some(row.life_skill.as_str()) {
            out.push_str(&format!(
                "\n{} (Level {}, EXP {}):\n",
                row.life_skill.bold(),
                row.life_skill_level,
                row.life_skill_experience
            ));
            current = Some(row.life_skill.as_str());
        }
        out.push_str(&format!(
            "  - {}: Level {}, EXP {}\n",
            row.child_skill, row.child_skill_level, row.child_skill_experience
        ));
    }
    out
}

/// Player line followed by the skill tree
pub fn stats_block(summary: &PlayerSummary, rows: &[SkillBreakdownRow]) -> String {
    format!("{}\n\n{}", player_line(summary), skill_tree(rows))
}

pub fn error_line(err: &anyhow::Error) -> String {
    format!("[ERROR] {:#}", err).red().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use liferpg_common::{LevelDeltas, PlayerStatus, QuestVariant};

    fn summary(name: &str, coins: u64) -> QuestSummary {
        QuestSummary {
            variant: QuestVariant::Daily,
            id: 1,
            name: name.to_string(),
            description: String::new(),
            child_skill_id: 1,
            exp_reward: 50,
            coin_reward: coins,
            reset_period: None,
            time_limit: None,
            streak_required: None,
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(50, 10), "[=====-----]");
        assert_eq!(progress_bar(100, 10), "[==========]");
        assert_eq!(progress_bar(250, 4), "[====]");
    }

    #[test]
    fn test_quest_line() {
        let line = quest_line(2, &summary("Train Stamina", 0));
        assert!(line.starts_with("2. Train Stamina (50 EXP, 0 Coins)"));
    }

    #[test]
    fn test_completion_lines_level_up() {
        let report = CompletionReport {
            quest: summary("Grind Stamina", 0),
            experience_gained: 40,
            deltas: LevelDeltas {
                child_skill: 1,
                life_skill: 0,
                player: 0,
            },
            child_skill: "Stamina".to_string(),
            child_skill_level: 2,
            life_skill: "Agility".to_string(),
            life_skill_level: 1,
            player_level: 1,
            player_experience: 130,
            level_up_coins: 20,
            quest_coins: 0,
            coin_balance: 20,
            quests_completed: 3,
        };
        let lines = completion_lines(&report);
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("Gained 40 EXP in Stamina!"));
        assert!(lines[2].contains("Stamina leveled up to 2! Earned 20 coins!"));
    }

    #[test]
    fn test_stats_block_groups_skills() {
        let player = PlayerSummary {
            name: "hero".to_string(),
            status: PlayerStatus::Live,
            level: 1,
            experience: 50,
            experience_to_next: 450,
            progress_percent: 10,
            coins: 0,
            quests_completed: 1,
        };
        let row = |life: &str, child: &str| SkillBreakdownRow {
            life_skill: life.to_string(),
            life_skill_level: 1,
            life_skill_experience: 0,
            child_skill: child.to_string(),
            child_skill_level: 1,
            child_skill_experience: 0,
        };
        let rows = vec![
            row("Agility", "Stamina"),
            row("Agility", "Mobility"),
            row("Intellect", "Reading"),
        ];

        let block = stats_block(&player, &rows);
        assert!(block.contains("Level 1, EXP 50, Coins 0, Quests Completed 1"));
        assert!(block.contains("450 EXP to level 2"));
        assert_eq!(block.matches("Agility").count(), 1);
        assert!(block.contains("  - Mobility: Level 1, EXP 0"));
    }
}
