//! Error codes and exit status for liferpgctl

use liferpg_common::LifeRpgError;
use thiserror::Error;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when no player exists yet (or the named one is missing)
pub const EXIT_NO_PLAYER: i32 = 64;

/// Exit code when the requested quest is not in the catalog
pub const EXIT_UNKNOWN_QUEST: i32 = 65;

/// Exit code when the quest exists but cannot be taken right now
pub const EXIT_QUEST_UNAVAILABLE: i32 = 66;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("No player yet. Run `liferpgctl init <NAME>` or start `liferpgctl play`")]
    NoPlayer,
}

/// Pick the exit code for an error, looking through its context chain
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(CliError::NoPlayer) = cause.downcast_ref::<CliError>() {
            return EXIT_NO_PLAYER;
        }
        if let Some(core) = cause.downcast_ref::<LifeRpgError>() {
            return match core {
                LifeRpgError::UnknownPlayer(_) => EXIT_NO_PLAYER,
                LifeRpgError::UnknownQuest { .. } => EXIT_UNKNOWN_QUEST,
                LifeRpgError::QuestUnavailable { .. } => EXIT_QUEST_UNAVAILABLE,
                _ => EXIT_GENERAL_ERROR,
            };
        }
    }
    EXIT_GENERAL_ERROR
}
