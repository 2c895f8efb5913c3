//! Quest Store - SQLite persistence
//!
//! Owns the connection, bootstraps the schema, and seeds the fixed skill and
//! quest catalogs. Composite updates go through [`QuestStore::transaction`].
//!
//! Schema:
//! - players: one row per player name
//! - life_skills / child_skills: process-wide skill rows with cached levels
//! - player_skills: which child skills a player tracks
//! - daily_quests .. rng_quests: immutable quest definitions, one table per variant
//! - player_quests: one record per (player, quest id, quest type)

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LifeRpgError, Result};
use crate::quest_catalog::QuestCatalog;
use crate::skills::{PlayerProgress, CHILD_SKILLS, LIFE_SKILLS};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    name TEXT PRIMARY KEY,
    status TEXT NOT NULL DEFAULT 'live'
);

CREATE TABLE IF NOT EXISTS life_skills (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    level INTEGER NOT NULL DEFAULT 1,
    exp INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS child_skills (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    life_skill_id INTEGER NOT NULL REFERENCES life_skills(id),
    level INTEGER NOT NULL DEFAULT 1,
    exp INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS player_skills (
    player_name TEXT NOT NULL REFERENCES players(name),
    life_skill_id INTEGER NOT NULL REFERENCES life_skills(id),
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    UNIQUE(player_name, child_skill_id)
);

CREATE TABLE IF NOT EXISTS daily_quests (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    exp_reward INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS routine_quests (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    exp_reward INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0,
    reset_period TEXT NOT NULL CHECK (reset_period IN ('weekly', 'monthly'))
);

CREATE TABLE IF NOT EXISTS special_quests (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    exp_reward INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS progression_quests (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    exp_reward INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS challenge_quests (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    exp_reward INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0,
    time_limit TEXT NOT NULL,
    streak_required INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS rng_quests (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    child_skill_id INTEGER NOT NULL REFERENCES child_skills(id),
    exp_reward INTEGER NOT NULL,
    coin_reward INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS player_quests (
    player_name TEXT NOT NULL REFERENCES players(name),
    quest_id INTEGER NOT NULL,
    quest_type TEXT NOT NULL CHECK (quest_type IN ('daily', 'routine', 'special', 'progression', 'challenge', 'rng')),
    completed BOOLEAN NOT NULL DEFAULT 0,
    completion_date TEXT NOT NULL,
    streak_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE(player_name, quest_id, quest_type)
);

CREATE INDEX IF NOT EXISTS idx_player_quests_player ON player_quests(player_name);
"#;

/// Player columns added after the first schema; (column, definition)
const PLAYER_COLUMNS: &[(&str, &str)] = &[
    ("level", "INTEGER NOT NULL DEFAULT 1"),
    ("exp", "INTEGER NOT NULL DEFAULT 0"),
    ("coins", "INTEGER NOT NULL DEFAULT 0"),
    ("quests_completed", "INTEGER NOT NULL DEFAULT 0"),
];

/// Player lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Live,
    Other(String),
}

impl PlayerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PlayerStatus::Live => "live",
            PlayerStatus::Other(status) => status,
        }
    }
}

impl From<String> for PlayerStatus {
    fn from(status: String) -> Self {
        if status == "live" {
            PlayerStatus::Live
        } else {
            PlayerStatus::Other(status)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub status: PlayerStatus,
    pub level: u32,
    pub experience: u64,
    pub coins: u64,
    pub quests_completed: u64,
}

/// SQLite-backed store for skills, quests and players
pub struct QuestStore {
    conn: Connection,
}

impl QuestStore {
    /// Open or create the database at a path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening quest database at: {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    /// Private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.migrate_player_columns()?;
        Ok(())
    }

    /// Add any player columns an older database is missing
    fn migrate_player_columns(&self) -> Result<()> {
        let existing: Vec<String> = {
            let mut stmt = self.conn.prepare("PRAGMA table_info(players)")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            names
        };

        for (column, definition) in PLAYER_COLUMNS {
            if !existing.iter().any(|name| name.as_str() == *column) {
                debug!("Adding players.{} column", column);
                self.conn.execute(
                    &format!("ALTER TABLE players ADD COLUMN {} {}", column, definition),
                    [],
                )?;
            }
        }
        Ok(())
    }

    /// Seed skills and quest definitions. Safe to call on every start.
    pub fn seed(&mut self, catalog: &QuestCatalog) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (id, name) in LIFE_SKILLS {
            tx.execute(
                "INSERT OR IGNORE INTO life_skills (id, name, level, exp) VALUES (?1, ?2, 1, 0)",
                params![id, name],
            )?;
        }
        for (id, name, life_skill_id) in CHILD_SKILLS {
            tx.execute(
                "INSERT OR IGNORE INTO child_skills (id, name, life_skill_id, level, exp)
                 VALUES (?1, ?2, ?3, 1, 0)",
                params![id, name, life_skill_id],
            )?;
        }
        let inserted = catalog.seed(&tx)?;
        tx.commit()?;

        if inserted > 0 {
            info!("Seeded {} quest definitions", inserted);
        }
        Ok(())
    }

    /// Start a transaction; dropping it without commit rolls back
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// The first player row, if any (single-player installs have exactly one)
    pub fn first_player(&self) -> Result<Option<Player>> {
        let player = self
            .conn
            .query_row(
                "SELECT name, status, level, exp, coins, quests_completed
                 FROM players ORDER BY rowid LIMIT 1",
                [],
                player_from_row,
            )
            .optional()?;
        Ok(player)
    }

    pub fn player(&self, name: &str) -> Result<Player> {
        load_player(&self.conn, name)
    }
}

pub(crate) fn load_player(conn: &Connection, name: &str) -> Result<Player> {
    conn.query_row(
        "SELECT name, status, level, exp, coins, quests_completed
         FROM players WHERE name = ?1",
        params![name],
        player_from_row,
    )
    .optional()?
    .ok_or_else(|| LifeRpgError::UnknownPlayer(name.to_string()))
}

/// Insert a live player starting at `progress` with no coins
pub(crate) fn insert_player(conn: &Connection, name: &str, progress: PlayerProgress) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM players WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?;
    if exists {
        return Err(LifeRpgError::PlayerExists(name.to_string()));
    }

    conn.execute(
        "INSERT INTO players (name, status, level, exp, coins, quests_completed)
         VALUES (?1, 'live', ?2, ?3, 0, 0)",
        params![name, progress.level, progress.experience as i64],
    )?;
    Ok(())
}

pub(crate) fn set_player_status(conn: &Connection, name: &str, status: &PlayerStatus) -> Result<()> {
    let updated = conn.execute(
        "UPDATE players SET status = ?1 WHERE name = ?2",
        params![status.as_str(), name],
    )?;
    if updated == 0 {
        return Err(LifeRpgError::UnknownPlayer(name.to_string()));
    }
    Ok(())
}

pub(crate) fn add_coins(conn: &Connection, name: &str, coins: u64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE players SET coins = coins + ?1 WHERE name = ?2",
        params![coins as i64, name],
    )?;
    if updated == 0 {
        return Err(LifeRpgError::UnknownPlayer(name.to_string()));
    }
    Ok(())
}

pub(crate) fn count_completion(conn: &Connection, name: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE players SET quests_completed = quests_completed + 1 WHERE name = ?1",
        params![name],
    )?;
    if updated == 0 {
        return Err(LifeRpgError::UnknownPlayer(name.to_string()));
    }
    Ok(())
}

fn player_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        name: row.get(0)?,
        status: PlayerStatus::from(row.get::<_, String>(1)?),
        level: row.get(2)?,
        experience: row.get::<_, i64>(3)?.max(0) as u64,
        coins: row.get::<_, i64>(4)?.max(0) as u64,
        quests_completed: row.get::<_, i64>(5)?.max(0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn count(store: &QuestStore, table: &str) -> i64 {
        store
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut store = QuestStore::open_in_memory().unwrap();
        let catalog = QuestCatalog::builtin();
        store.seed(&catalog).unwrap();
        store.seed(&catalog).unwrap();

        assert_eq!(count(&store, "life_skills"), 4);
        assert_eq!(count(&store, "child_skills"), 13);
        assert_eq!(count(&store, "daily_quests"), 3);
        assert_eq!(count(&store, "challenge_quests"), 2);
        assert_eq!(QuestCatalog::load(store.conn()).unwrap(), catalog);
    }

    #[test]
    fn test_player_insert_and_duplicate() {
        let store = QuestStore::open_in_memory().unwrap();
        assert!(store.first_player().unwrap().is_none());

        insert_player(store.conn(), "hero", PlayerProgress::default()).unwrap();
        let player = store.player("hero").unwrap();
        assert_eq!(player.status, PlayerStatus::Live);
        assert_eq!(player.level, 1);
        assert_eq!(player.coins, 0);

        let err = insert_player(store.conn(), "hero", PlayerProgress::default()).unwrap_err();
        assert!(matches!(err, LifeRpgError::PlayerExists(_)));
        assert!(matches!(
            store.player("ghost").unwrap_err(),
            LifeRpgError::UnknownPlayer(_)
        ));
    }

    #[test]
    fn test_migrates_legacy_players_table() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(tmp.path()).unwrap();
            conn.execute_batch(
                "CREATE TABLE players (name TEXT PRIMARY KEY, status TEXT NOT NULL DEFAULT 'live');
                 INSERT INTO players (name, status) VALUES ('old-timer', 'resting');",
            )
            .unwrap();
        }

        let store = QuestStore::open_at(tmp.path()).unwrap();
        let player = store.player("old-timer").unwrap();
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert_eq!(player.quests_completed, 0);
        assert_eq!(player.status, PlayerStatus::Other("resting".to_string()));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let store = QuestStore::open_at(tmp.path()).unwrap();
            insert_player(store.conn(), "hero", PlayerProgress::default()).unwrap();
            add_coins(store.conn(), "hero", 35).unwrap();
            count_completion(store.conn(), "hero").unwrap();
        }
        let store = QuestStore::open_at(tmp.path()).unwrap();
        let player = store.player("hero").unwrap();
        assert_eq!(player.coins, 35);
        assert_eq!(player.quests_completed, 1);
    }

    #[test]
    fn test_uncommitted_transaction_rolls_back() {
        let mut store = QuestStore::open_in_memory().unwrap();
        insert_player(store.conn(), "hero", PlayerProgress::default()).unwrap();
        {
            let tx = store.transaction().unwrap();
            add_coins(&tx, "hero", 100).unwrap();
        }
        assert_eq!(store.player("hero").unwrap().coins, 0);
    }

    #[test]
    fn test_updates_require_player() {
        let store = QuestStore::open_in_memory().unwrap();
        assert!(matches!(
            add_coins(store.conn(), "ghost", 5).unwrap_err(),
            LifeRpgError::UnknownPlayer(_)
        ));
        assert!(matches!(
            set_player_status(store.conn(), "ghost", &PlayerStatus::Live).unwrap_err(),
            LifeRpgError::UnknownPlayer(_)
        ));
    }
}
