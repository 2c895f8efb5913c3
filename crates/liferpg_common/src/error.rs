//! Error types for the progression engine.

use thiserror::Error;

use crate::quest_catalog::QuestVariant;

#[derive(Error, Debug)]
pub enum LifeRpgError {
    #[error("Unknown child skill id {0}")]
    InvalidSkillReference(u32),

    #[error("Unknown {variant} quest #{id}")]
    UnknownQuest { variant: QuestVariant, id: u32 },

    #[error("{variant} quest #{id} is not available right now")]
    QuestUnavailable { variant: QuestVariant, id: u32 },

    #[error("No player named '{0}'")]
    UnknownPlayer(String),

    #[error("A player named '{0}' already exists")]
    PlayerExists(String),

    #[error("Player name must not be blank")]
    InvalidPlayerName,

    /// Cached aggregates disagree with the sum of their children.
    /// Never user-triggerable; indicates corrupted or hand-edited storage.
    #[error("Internal consistency fault: {scope} has {stored} exp but its parts sum to {computed}")]
    AggregateMismatch {
        scope: String,
        stored: u64,
        computed: u64,
    },

    #[error("Invalid quest catalog: {0}")]
    InvalidCatalog(String),

    #[error("Duplicate {variant} quest id {id} in catalog")]
    DuplicateQuest { variant: QuestVariant, id: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LifeRpgError>;
