//! Interactive menu tests
//!
//! Feeds scripted stdin to the menu and checks both the transcript and the
//! resulting engine state.

use std::io::Cursor;

use chrono::NaiveDateTime;
use liferpg_common::{ProgressionEngine, QuestCatalog, QuestStore};
use liferpgctl::menu;

fn at(date: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn builtin_engine() -> ProgressionEngine {
    ProgressionEngine::new(QuestStore::open_in_memory().unwrap(), &QuestCatalog::builtin()).unwrap()
}

fn play(engine: &mut ProgressionEngine, script: &str, now: NaiveDateTime) -> String {
    let mut output = Vec::new();
    menu::run(engine, Cursor::new(script.to_string()), &mut output, || now).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn first_run_creates_player_and_completes_quest() {
    let mut engine = builtin_engine();
    let now = at("2026-10-21 10:00:00");

    // Blank name, bad input, first quest (Train Stamina), then exit.
    // 13 quests are offered at first, 12 after the daily is done.
    let transcript = play(&mut engine, "\nhero\nabc\n99\n1\n13\n", now);

    assert!(transcript.contains("Welcome to LifeRPG!"));
    assert!(transcript.contains("A player name is required."));
    assert!(transcript.contains("Welcome hero! Your adventure begins!"));
    assert!(transcript.contains("Choose a quest (1-13 or 14 to Exit): "));
    assert!(transcript.contains("Invalid input. Enter a number."));
    assert!(transcript.contains("Invalid choice. Pick 1-14."));
    assert!(transcript.contains("Train Stamina"));
    assert!(transcript.contains("Gained 50 EXP in Stamina!"));
    assert!(transcript.contains("Choose a quest (1-12 or 13 to Exit): "));

    let summary = engine.player_summary("hero").unwrap();
    assert_eq!(summary.experience, 50);
    assert_eq!(summary.quests_completed, 1);
}

#[test]
fn returning_player_is_welcomed_back() {
    let mut engine = builtin_engine();
    let now = at("2026-10-21 10:00:00");
    engine.create_player("hero", now).unwrap();

    let transcript = play(&mut engine, "14\n", at("2026-10-22 08:00:00"));
    assert!(transcript.contains("Welcome back hero!"));
    assert!(transcript.contains("Player Status: live"));
    assert!(transcript.contains("Player Stats:"));
    assert_eq!(engine.player_summary("hero").unwrap().quests_completed, 0);
}

#[test]
fn end_of_input_exits_cleanly() {
    let mut engine = builtin_engine();
    let transcript = play(&mut engine, "", at("2026-10-21 10:00:00"));
    assert!(transcript.contains("Please enter your player name: "));
    assert!(engine.current_player().unwrap().is_none());
}

#[test]
fn menu_stops_when_nothing_is_left() {
    let catalog = QuestCatalog::from_toml_str(
        r#"
[[special]]
id = 1
name = "First Steps"
child_skill_id = 1
exp_reward = 100
coin_reward = 5
"#,
    )
    .unwrap();
    let mut engine = ProgressionEngine::new(QuestStore::open_in_memory().unwrap(), &catalog).unwrap();

    let transcript = play(&mut engine, "hero\n1\n", at("2026-10-21 10:00:00"));
    assert!(transcript.contains("Stamina leveled up to 2! Earned 20 coins!"));
    assert!(transcript.contains("Earned 5 coins from quest!"));
    assert!(transcript.contains("No quests available!"));

    let summary = engine.player_summary("hero").unwrap();
    assert_eq!(summary.coins, 25);
}
