//! LifeRPG Common - Progression and quest-lifecycle engine
//!
//! Real-world activities are modelled as quests. Completing one feeds
//! experience into a three-tier skill hierarchy (child skill, life skill,
//! player), awards coins for every level gained, and records the completion so
//! the quest's reset rules decide when it comes back.

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod level_curve;
pub mod quest_catalog;
pub mod skills;
pub mod store;

pub use config::Config;
pub use engine::{CompletionReport, PlayerSummary, ProgressionEngine};
pub use error::{LifeRpgError, Result};
pub use ledger::{DailyRefresh, QuestLedger, QuestRecord, QuestSummary};
pub use level_curve::{LevelCurve, LevelDeltas, Tier};
pub use quest_catalog::{QuestCatalog, QuestDefinition, QuestKind, QuestVariant, ResetPeriod};
pub use skills::{SkillBreakdownRow, SkillHierarchy};
pub use store::{Player, PlayerStatus, QuestStore};
