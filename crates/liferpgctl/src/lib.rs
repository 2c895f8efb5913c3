//! LifeRPG Control - command-line front end for the progression engine
//!
//! Exposes the CLI modules as a library so integration tests can drive the
//! menu and subcommands without spawning the binary.

pub mod cli;
pub mod commands;
pub mod display;
pub mod errors;
pub mod logging;
pub mod menu;
