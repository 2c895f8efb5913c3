//! Interactive quest menu
//!
//! Greets (or creates) the player, then loops: list available quests, read a
//! choice, complete it, print the stats block. Bad input re-prompts. The loop
//! ends on the exit entry, end of input, or when nothing is left to do.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use liferpg_common::{LifeRpgError, ProgressionEngine};
use thiserror::Error;
use tracing::debug;

use crate::display;

/// Menu input that does not name a quest or the exit entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSelection {
    #[error("Invalid input. Enter a number.")]
    NotANumber,

    #[error("Invalid choice. Pick 1-{max}.")]
    OutOfRange { max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based index into the listed quests
    Quest(usize),
    Exit,
}

/// Map a 1-based menu choice; `quest_count + 1` is the exit entry
pub fn parse_selection(input: &str, quest_count: usize) -> Result<Selection, InvalidSelection> {
    let choice: usize = input
        .trim()
        .parse()
        .map_err(|_| InvalidSelection::NotANumber)?;

    if choice == quest_count + 1 {
        Ok(Selection::Exit)
    } else if (1..=quest_count).contains(&choice) {
        Ok(Selection::Quest(choice - 1))
    } else {
        Err(InvalidSelection::OutOfRange {
            max: quest_count + 1,
        })
    }
}

/// Run the menu until the player exits
pub fn run<R, W, C>(engine: &mut ProgressionEngine, input: R, output: W, clock: C) -> Result<()>
where
    R: BufRead,
    W: Write,
    C: FnMut() -> NaiveDateTime,
{
    Menu {
        engine,
        input,
        output,
        clock,
    }
    .run()
}

struct Menu<'a, R, W, C> {
    engine: &'a mut ProgressionEngine,
    input: R,
    output: W,
    clock: C,
}

impl<'a, R, W, C> Menu<'a, R, W, C>
where
    R: BufRead,
    W: Write,
    C: FnMut() -> NaiveDateTime,
{
    fn run(mut self) -> Result<()> {
        let player = match self.greet()? {
            Some(player) => player,
            None => return Ok(()),
        };
        self.print_stats(&player)?;

        loop {
            let now = (self.clock)();
            let quests = self.engine.list_available_quests(&player, now)?;
            if quests.is_empty() {
                writeln!(self.output, "\nNo quests available!")?;
                break;
            }

            write!(self.output, "\n{}", display::quest_list(&quests))?;
            let line = match self.prompt(&format!(
                "Choose a quest (1-{} or {} to Exit): ",
                quests.len(),
                quests.len() + 1
            ))? {
                Some(line) => line,
                None => break,
            };

            let index = match parse_selection(&line, quests.len()) {
                Ok(Selection::Quest(index)) => index,
                Ok(Selection::Exit) => break,
                Err(invalid) => {
                    debug!(input = %line, "Rejected menu input");
                    writeln!(self.output, "{}", invalid)?;
                    continue;
                }
            };

            let quest = &quests[index];
            match self
                .engine
                .complete_quest(&player, quest.variant, quest.id, (self.clock)())
            {
                Ok(report) => {
                    writeln!(self.output)?;
                    for line in display::completion_lines(&report) {
                        writeln!(self.output, "{}", line)?;
                    }
                }
                // The listing went stale (e.g. midnight passed while waiting)
                Err(LifeRpgError::QuestUnavailable { .. }) => {
                    writeln!(self.output, "That quest is no longer available.")?;
                }
                Err(err) => return Err(err).context("Failed to complete quest"),
            }
            self.print_stats(&player)?;
        }
        Ok(())
    }

    /// Welcome back the existing player or create one. None on end of input.
    fn greet(&mut self) -> Result<Option<String>> {
        let now = (self.clock)();
        if let Some(player) = self.engine.current_player()? {
            self.engine.begin_session(&player.name, now)?;
            writeln!(self.output, "Welcome back {}!", player.name)?;
            writeln!(self.output, "Player Status: live")?;
            return Ok(Some(player.name));
        }

        writeln!(self.output, "Welcome to LifeRPG!")?;
        loop {
            let name = match self.prompt("Please enter your player name: ")? {
                Some(name) => name,
                None => return Ok(None),
            };
            match self.engine.create_player(&name, now) {
                Ok(player) => {
                    writeln!(self.output, "Welcome {}! Your adventure begins!", player.name)?;
                    return Ok(Some(player.name));
                }
                Err(LifeRpgError::InvalidPlayerName) => {
                    writeln!(self.output, "A player name is required.")?;
                }
                Err(err) => return Err(err).context("Failed to create player"),
            }
        }
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_stats(&mut self, player: &str) -> Result<()> {
        let summary = self.engine.player_summary(player)?;
        let rows = self.engine.skill_breakdown(player)?;
        writeln!(self.output, "\n{}", display::stats_block(&summary, &rows))?;
        Ok(())
    }
}
