//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use liferpg_common::QuestVariant;

/// LifeRPG CLI
#[derive(Debug, Parser)]
#[command(name = "liferpgctl")]
#[command(about = "LifeRPG - Level up by completing real-life quests", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Database file (overrides config and $LIFERPG_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file (overrides $LIFERPG_CONFIG and the default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand (if not provided, starts the interactive quest menu)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive quest menu
    Play,

    /// Create the player
    Init {
        /// Player name
        name: String,
    },

    /// Show player level, experience and coins
    Status {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Show life and child skill levels
    Skills {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// List quests available right now
    Quests {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Complete one quest
    Complete {
        /// daily, routine, special, progression, challenge or rng
        variant: QuestVariant,

        /// Quest id within its variant
        id: u32,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_complete() {
        let cli = Cli::try_parse_from(["liferpgctl", "--db", "/tmp/x.db", "complete", "Routine", "2"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Some(Commands::Complete { variant, id, json }) => {
                assert_eq!(variant, QuestVariant::Routine);
                assert_eq!(id, 2);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_means_play() {
        let cli = Cli::try_parse_from(["liferpgctl", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_rejects_unknown_variant() {
        assert!(Cli::try_parse_from(["liferpgctl", "complete", "weekly", "1"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
