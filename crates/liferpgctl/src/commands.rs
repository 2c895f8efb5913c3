//! Non-interactive subcommands
//!
//! Each handler writes to the given output; `--json` prints only JSON.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use liferpg_common::{ProgressionEngine, QuestVariant};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::display;
use crate::errors::CliError;

/// Name of the install's player, or `NoPlayer`
pub fn require_player(engine: &ProgressionEngine) -> Result<String> {
    engine
        .current_player()?
        .map(|player| player.name)
        .ok_or_else(|| CliError::NoPlayer.into())
}

fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn init<W: Write>(engine: &mut ProgressionEngine, name: &str, now: NaiveDateTime, out: &mut W) -> Result<()> {
    let player = engine
        .create_player(name, now)
        .with_context(|| format!("Failed to create player '{}'", name.trim()))?;
    writeln!(out, "Welcome {}! Your adventure begins!", player.name.bold())?;
    Ok(())
}

pub fn status<W: Write>(engine: &ProgressionEngine, json: bool, out: &mut W) -> Result<()> {
    let player = require_player(engine)?;
    let summary = engine.player_summary(&player)?;
    if json {
        return print_json(out, &summary);
    }
    writeln!(out, "{}", display::player_line(&summary))?;
    writeln!(out, "  Status: {}", summary.status.as_str())?;
    Ok(())
}

pub fn skills<W: Write>(engine: &ProgressionEngine, json: bool, out: &mut W) -> Result<()> {
    let player = require_player(engine)?;
    let rows = engine.skill_breakdown(&player)?;
    if json {
        return print_json(out, &rows);
    }
    write!(out, "{}", display::skill_tree(&rows))?;
    Ok(())
}

pub fn quests<W: Write>(engine: &mut ProgressionEngine, now: NaiveDateTime, json: bool, out: &mut W) -> Result<()> {
    let player = require_player(engine)?;
    let quests = engine.list_available_quests(&player, now)?;
    if json {
        return print_json(out, &quests);
    }
    if quests.is_empty() {
        writeln!(out, "No quests available!")?;
        return Ok(());
    }

    writeln!(out, "Available Quests:")?;
    for quest in &quests {
        writeln!(
            out,
            "  {:<12} #{:<3} {} ({} EXP, {} Coins)",
            quest.variant.as_str(),
            quest.id,
            quest.name,
            quest.exp_reward,
            quest.coin_reward
        )?;
    }
    Ok(())
}

pub fn complete<W: Write>(
    engine: &mut ProgressionEngine,
    variant: QuestVariant,
    id: u32,
    now: NaiveDateTime,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let player = require_player(engine)?;
    let report = engine
        .complete_quest(&player, variant, id, now)
        .with_context(|| format!("Failed to complete {} quest #{}", variant, id))?;
    if json {
        return print_json(out, &report);
    }
    for line in display::completion_lines(&report) {
        writeln!(out, "{}", line)?;
    }
    writeln!(
        out,
        "Coins: {}, Quests Completed: {}",
        report.coin_balance, report.quests_completed
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{exit_code_for, EXIT_NO_PLAYER, EXIT_QUEST_UNAVAILABLE};
    use liferpg_common::{QuestCatalog, QuestStore};

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn engine() -> ProgressionEngine {
        ProgressionEngine::new(QuestStore::open_in_memory().unwrap(), &QuestCatalog::builtin()).unwrap()
    }

    #[test]
    fn test_commands_need_a_player() {
        let engine = engine();
        let mut out = Vec::new();
        let err = status(&engine, false, &mut out).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_NO_PLAYER);
    }

    #[test]
    fn test_complete_then_status_json() {
        let mut engine = engine();
        let now = at("2026-10-21 10:00:00");
        let mut out = Vec::new();
        init(&mut engine, "hero", now, &mut out).unwrap();

        out.clear();
        complete(&mut engine, QuestVariant::Rng, 1, now, true, &mut out).unwrap();
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["coin_balance"], 20);
        assert_eq!(report["child_skill"], "Discipline");

        out.clear();
        status(&engine, true, &mut out).unwrap();
        let summary: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(summary["name"], "hero");
        assert_eq!(summary["experience"], 80);
        assert_eq!(summary["quests_completed"], 1);

        let err = complete(&mut engine, QuestVariant::Rng, 1, now, false, &mut out).unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_QUEST_UNAVAILABLE);
    }

    #[test]
    fn test_quests_text_lists_variants() {
        let mut engine = engine();
        let now = at("2026-10-21 10:00:00");
        let mut out = Vec::new();
        init(&mut engine, "hero", now, &mut out).unwrap();

        out.clear();
        quests(&mut engine, now, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("daily"));
        assert!(text.contains("Train Stamina (50 EXP, 0 Coins)"));
        assert!(text.contains("Stamina Streak"));
    }
}
