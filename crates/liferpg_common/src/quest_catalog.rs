//! Quest Catalog
//!
//! Immutable quest definitions for the six quest variants. The catalog is
//! either the built-in set or a TOML file, validated once and then seeded into
//! the per-variant tables with insert-or-ignore so re-seeding is a no-op.
//!
//! ## Catalog File
//!
//! ```toml
//! [[daily]]
//! id = 1
//! name = "Train Stamina"
//! description = "Complete a 20-minute run."
//! child_skill_id = 1
//! exp_reward = 50
//! coin_reward = 0
//!
//! [[routine]]
//! id = 1
//! name = "Weekly Workout"
//! child_skill_id = 11
//! exp_reward = 150
//! coin_reward = 10
//! reset_period = "weekly"
//!
//! [[challenge]]
//! id = 1
//! name = "Stamina Streak"
//! child_skill_id = 1
//! exp_reward = 100
//! coin_reward = 30
//! time_limit = "2026-12-31T23:59:59"
//! streak_required = 3
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LifeRpgError, Result};
use crate::skills::child_skill_name;

/// Quest variant tag, persisted as `quest_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestVariant {
    Daily,
    Routine,
    Special,
    Progression,
    Challenge,
    Rng,
}

impl QuestVariant {
    /// Listing order
    pub const ALL: [QuestVariant; 6] = [
        QuestVariant::Daily,
        QuestVariant::Routine,
        QuestVariant::Special,
        QuestVariant::Progression,
        QuestVariant::Challenge,
        QuestVariant::Rng,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestVariant::Daily => "daily",
            QuestVariant::Routine => "routine",
            QuestVariant::Special => "special",
            QuestVariant::Progression => "progression",
            QuestVariant::Challenge => "challenge",
            QuestVariant::Rng => "rng",
        }
    }

    /// Definition table for this variant
    pub fn table(&self) -> &'static str {
        match self {
            QuestVariant::Daily => "daily_quests",
            QuestVariant::Routine => "routine_quests",
            QuestVariant::Special => "special_quests",
            QuestVariant::Progression => "progression_quests",
            QuestVariant::Challenge => "challenge_quests",
            QuestVariant::Rng => "rng_quests",
        }
    }
}

impl fmt::Display for QuestVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestVariant {
    type Err = LifeRpgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(QuestVariant::Daily),
            "routine" => Ok(QuestVariant::Routine),
            "special" => Ok(QuestVariant::Special),
            "progression" => Ok(QuestVariant::Progression),
            "challenge" => Ok(QuestVariant::Challenge),
            "rng" => Ok(QuestVariant::Rng),
            other => Err(LifeRpgError::InvalidCatalog(format!(
                "unknown quest variant '{}'",
                other
            ))),
        }
    }
}

/// Reset period for routine quests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPeriod {
    Weekly,
    Monthly,
}

impl ResetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetPeriod::Weekly => "weekly",
            ResetPeriod::Monthly => "monthly",
        }
    }
}

impl FromStr for ResetPeriod {
    type Err = LifeRpgError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "weekly" => Ok(ResetPeriod::Weekly),
            "monthly" => Ok(ResetPeriod::Monthly),
            other => Err(LifeRpgError::InvalidCatalog(format!(
                "unknown reset period '{}'",
                other
            ))),
        }
    }
}

/// Variant plus the fields only that variant carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum QuestKind {
    Daily,
    Routine {
        reset_period: ResetPeriod,
    },
    Special,
    Progression,
    Challenge {
        time_limit: NaiveDateTime,
        /// Recorded for display; availability does not gate on it
        streak_required: u32,
    },
    Rng,
}

impl QuestKind {
    pub fn variant(&self) -> QuestVariant {
        match self {
            QuestKind::Daily => QuestVariant::Daily,
            QuestKind::Routine { .. } => QuestVariant::Routine,
            QuestKind::Special => QuestVariant::Special,
            QuestKind::Progression => QuestVariant::Progression,
            QuestKind::Challenge { .. } => QuestVariant::Challenge,
            QuestKind::Rng => QuestVariant::Rng,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub child_skill_id: u32,
    pub exp_reward: u64,
    pub coin_reward: u64,
    #[serde(flatten)]
    pub kind: QuestKind,
}

impl QuestDefinition {
    pub fn variant(&self) -> QuestVariant {
        self.kind.variant()
    }
}

/// One entry of a catalog file, before per-variant validation
#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    id: u32,
    name: String,
    #[serde(default)]
    description: String,
    child_skill_id: u32,
    exp_reward: u64,
    #[serde(default)]
    coin_reward: u64,
    reset_period: Option<ResetPeriod>,
    time_limit: Option<NaiveDateTime>,
    #[serde(default)]
    streak_required: u32,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    daily: Vec<CatalogEntry>,
    #[serde(default)]
    routine: Vec<CatalogEntry>,
    #[serde(default)]
    special: Vec<CatalogEntry>,
    #[serde(default)]
    progression: Vec<CatalogEntry>,
    #[serde(default)]
    challenge: Vec<CatalogEntry>,
    #[serde(default)]
    rng: Vec<CatalogEntry>,
}

impl CatalogEntry {
    fn into_definition(self, variant: QuestVariant) -> Result<QuestDefinition> {
        let kind = match variant {
            QuestVariant::Daily => QuestKind::Daily,
            QuestVariant::Routine => QuestKind::Routine {
                reset_period: self.reset_period.ok_or_else(|| {
                    LifeRpgError::InvalidCatalog(format!(
                        "routine quest #{} has no reset_period",
                        self.id
                    ))
                })?,
            },
            QuestVariant::Special => QuestKind::Special,
            QuestVariant::Progression => QuestKind::Progression,
            QuestVariant::Challenge => QuestKind::Challenge {
                time_limit: self.time_limit.ok_or_else(|| {
                    LifeRpgError::InvalidCatalog(format!(
                        "challenge quest #{} has no time_limit",
                        self.id
                    ))
                })?,
                streak_required: self.streak_required,
            },
            QuestVariant::Rng => QuestKind::Rng,
        };

        Ok(QuestDefinition {
            id: self.id,
            name: self.name,
            description: self.description,
            child_skill_id: self.child_skill_id,
            exp_reward: self.exp_reward,
            coin_reward: self.coin_reward,
            kind,
        })
    }
}

/// Validated quest definitions, ordered by variant then catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestCatalog {
    quests: Vec<QuestDefinition>,
}

impl QuestCatalog {
    /// Build a catalog, rejecting duplicate ids and unknown skills
    pub fn new(mut quests: Vec<QuestDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for quest in &quests {
            if child_skill_name(quest.child_skill_id).is_none() {
                return Err(LifeRpgError::InvalidSkillReference(quest.child_skill_id));
            }
            if !seen.insert((quest.variant(), quest.id)) {
                return Err(LifeRpgError::DuplicateQuest {
                    variant: quest.variant(),
                    id: quest.id,
                });
            }
        }
        // Stable: keeps catalog order within a variant
        quests.sort_by_key(|quest| quest.variant());
        Ok(Self { quests })
    }

    /// The catalog shipped with the game
    pub fn builtin() -> Self {
        let challenge_deadline = NaiveDate::from_ymd_opt(2026, 12, 31)
            .and_then(|date| date.and_hms_opt(23, 59, 59))
            .unwrap_or(NaiveDateTime::MAX);

        let quest = |id: u32, name: &str, description: &str, child_skill_id: u32, exp: u64, coins: u64, kind: QuestKind| {
            QuestDefinition {
                id,
                name: name.to_string(),
                description: description.to_string(),
                child_skill_id,
                exp_reward: exp,
                coin_reward: coins,
                kind,
            }
        };

        let quests = vec![
            quest(1, "Train Stamina", "Complete a 20-minute run.", 1, 50, 0, QuestKind::Daily),
            quest(2, "Read a Chapter", "Read one chapter of a book.", 4, 75, 0, QuestKind::Daily),
            quest(3, "Practice Discipline", "Meditate for 10 minutes.", 8, 100, 0, QuestKind::Daily),
            quest(1, "Weekly Workout", "Complete 3 workouts this week.", 11, 150, 10,
                QuestKind::Routine { reset_period: ResetPeriod::Weekly }),
            quest(2, "Monthly Study", "Finish a course module.", 4, 200, 20,
                QuestKind::Routine { reset_period: ResetPeriod::Monthly }),
            quest(1, "First Milestone", "Reach Level 2 in any child skill.", 1, 100, 50, QuestKind::Special),
            quest(2, "Master Focus", "Complete 5 Focus-related tasks.", 5, 200, 100, QuestKind::Special),
            quest(1, "Grind Stamina", "Run for 15 minutes.", 1, 40, 0, QuestKind::Progression),
            quest(2, "Study Session", "Study for 30 minutes.", 4, 60, 0, QuestKind::Progression),
            quest(1, "Stamina Streak", "Run daily for 3 days.", 1, 100, 30,
                QuestKind::Challenge { time_limit: challenge_deadline, streak_required: 3 }),
            quest(2, "Focus Challenge", "Study without distractions for 1 hour.", 5, 120, 40,
                QuestKind::Challenge { time_limit: challenge_deadline, streak_required: 0 }),
            quest(1, "Random Skill Boost", "Practice a random skill.", 8, 80, 20, QuestKind::Rng),
            quest(2, "Mystery Task", "Complete a surprise task.", 10, 90, 25, QuestKind::Rng),
        ];

        Self { quests }
    }

    /// Parse a catalog file
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let groups = [
            (QuestVariant::Daily, file.daily),
            (QuestVariant::Routine, file.routine),
            (QuestVariant::Special, file.special),
            (QuestVariant::Progression, file.progression),
            (QuestVariant::Challenge, file.challenge),
            (QuestVariant::Rng, file.rng),
        ];

        let mut quests = Vec::new();
        for (variant, entries) in groups {
            for entry in entries {
                quests.push(entry.into_definition(variant)?);
            }
        }
        Self::new(quests)
    }

    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            "Loaded {} quests from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestDefinition> {
        self.quests.iter()
    }

    /// Quests of one variant, in catalog order
    pub fn by_variant(&self, variant: QuestVariant) -> impl Iterator<Item = &QuestDefinition> {
        self.quests.iter().filter(move |quest| quest.variant() == variant)
    }

    pub fn get(&self, variant: QuestVariant, id: u32) -> Result<&QuestDefinition> {
        self.quests
            .iter()
            .find(|quest| quest.variant() == variant && quest.id == id)
            .ok_or(LifeRpgError::UnknownQuest { variant, id })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Quests whose stored row under the same id holds a different definition
    pub fn conflicts(&self, conn: &Connection) -> Result<Vec<(QuestVariant, u32)>> {
        let stored = Self::load(conn)?;
        Ok(self
            .quests
            .iter()
            .filter(|quest| {
                stored
                    .get(quest.variant(), quest.id)
                    .map_or(false, |existing| existing != *quest)
            })
            .map(|quest| (quest.variant(), quest.id))
            .collect())
    }

    /// Write definitions into their tables. Existing ids are left untouched.
    pub fn seed(&self, conn: &Connection) -> Result<usize> {
        for (variant, id) in self.conflicts(conn)? {
            warn!(
                "Keeping stored {} quest #{}; the configured definition differs",
                variant, id
            );
        }

        let mut inserted = 0;
        for quest in &self.quests {
            inserted += match &quest.kind {
                QuestKind::Routine { reset_period } => conn.execute(
                    "INSERT OR IGNORE INTO routine_quests
                     (id, name, description, child_skill_id, exp_reward, coin_reward, reset_period)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        quest.id,
                        quest.name,
                        quest.description,
                        quest.child_skill_id,
                        quest.exp_reward as i64,
                        quest.coin_reward as i64,
                        reset_period.as_str(),
                    ],
                )?,
                QuestKind::Challenge {
                    time_limit,
                    streak_required,
                } => conn.execute(
                    "INSERT OR IGNORE INTO challenge_quests
                     (id, name, description, child_skill_id, exp_reward, coin_reward, time_limit, streak_required)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        quest.id,
                        quest.name,
                        quest.description,
                        quest.child_skill_id,
                        quest.exp_reward as i64,
                        quest.coin_reward as i64,
                        time_limit,
                        streak_required,
                    ],
                )?,
                _ => conn.execute(
                    &format!(
                        "INSERT OR IGNORE INTO {}
                         (id, name, description, child_skill_id, exp_reward, coin_reward)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        quest.variant().table()
                    ),
                    params![
                        quest.id,
                        quest.name,
                        quest.description,
                        quest.child_skill_id,
                        quest.exp_reward as i64,
                        quest.coin_reward as i64,
                    ],
                )?,
            };
        }
        debug!("Seeded {} new quest definitions", inserted);
        Ok(inserted)
    }

    /// Read every variant table back into a catalog
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut quests = Vec::new();
        for variant in QuestVariant::ALL {
            let extra = match variant {
                QuestVariant::Routine => ", reset_period",
                QuestVariant::Challenge => ", time_limit, streak_required",
                _ => "",
            };
            let sql = format!(
                "SELECT id, name, COALESCE(description, ''), child_skill_id, exp_reward, coin_reward{}
                 FROM {} ORDER BY id",
                extra,
                variant.table()
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let kind = match variant {
                    QuestVariant::Daily => QuestKind::Daily,
                    QuestVariant::Routine => {
                        let period: String = row.get(6)?;
                        QuestKind::Routine {
                            reset_period: period.parse()?,
                        }
                    }
                    QuestVariant::Special => QuestKind::Special,
                    QuestVariant::Progression => QuestKind::Progression,
                    QuestVariant::Challenge => QuestKind::Challenge {
                        time_limit: row.get(6)?,
                        streak_required: row.get(7)?,
                    },
                    QuestVariant::Rng => QuestKind::Rng,
                };
                quests.push(QuestDefinition {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    child_skill_id: row.get(3)?,
                    exp_reward: row.get::<_, i64>(4)?.max(0) as u64,
                    coin_reward: row.get::<_, i64>(5)?.max(0) as u64,
                    kind,
                });
            }
        }
        Self::new(quests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = QuestCatalog::builtin();
        assert_eq!(catalog.len(), 13);
        assert_eq!(catalog.by_variant(QuestVariant::Daily).count(), 3);
        assert_eq!(catalog.by_variant(QuestVariant::Routine).count(), 2);
        assert_eq!(catalog.by_variant(QuestVariant::Rng).count(), 2);

        let stamina = catalog.get(QuestVariant::Daily, 1).unwrap();
        assert_eq!(stamina.name, "Train Stamina");
        assert_eq!(stamina.child_skill_id, 1);
        assert_eq!(stamina.exp_reward, 50);

        // Builtin data must pass the same validation as a file
        assert_eq!(QuestCatalog::new(catalog.iter().cloned().collect()).unwrap(), catalog);
    }

    #[test]
    fn test_unknown_quest() {
        let catalog = QuestCatalog::builtin();
        let err = catalog.get(QuestVariant::Special, 9).unwrap_err();
        assert!(matches!(
            err,
            LifeRpgError::UnknownQuest { variant: QuestVariant::Special, id: 9 }
        ));
    }

    #[test]
    fn test_variant_parse_roundtrip() {
        for variant in QuestVariant::ALL {
            assert_eq!(variant.as_str().parse::<QuestVariant>().unwrap(), variant);
        }
        assert_eq!("RNG".parse::<QuestVariant>().unwrap(), QuestVariant::Rng);
        assert!("weekly".parse::<QuestVariant>().is_err());
    }

    #[test]
    fn test_from_toml() {
        let catalog = QuestCatalog::from_toml_str(
            r#"
[[daily]]
id = 7
name = "Stretch"
child_skill_id = 2
exp_reward = 30

[[routine]]
id = 1
name = "Long Run"
child_skill_id = 13
exp_reward = 120
coin_reward = 5
reset_period = "monthly"

[[challenge]]
id = 4
name = "Cold Showers"
child_skill_id = 8
exp_reward = 60
time_limit = "2027-01-31T23:59:59"
streak_required = 5
"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        let daily = catalog.get(QuestVariant::Daily, 7).unwrap();
        assert_eq!(daily.coin_reward, 0);
        assert_eq!(daily.description, "");

        let routine = catalog.get(QuestVariant::Routine, 1).unwrap();
        assert_eq!(
            routine.kind,
            QuestKind::Routine {
                reset_period: ResetPeriod::Monthly
            }
        );

        match &catalog.get(QuestVariant::Challenge, 4).unwrap().kind {
            QuestKind::Challenge {
                streak_required, ..
            } => assert_eq!(*streak_required, 5),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_toml_routine_requires_period() {
        let err = QuestCatalog::from_toml_str(
            r#"
[[routine]]
id = 1
name = "Anything"
child_skill_id = 1
exp_reward = 10
"#,
        )
        .unwrap_err();
        assert!(matches!(err, LifeRpgError::InvalidCatalog(_)));
    }

    #[test]
    fn test_duplicate_and_unknown_skill_rejected() {
        let duplicate = r#"
[[special]]
id = 1
name = "A"
child_skill_id = 1
exp_reward = 10

[[special]]
id = 1
name = "B"
child_skill_id = 2
exp_reward = 10
"#;
        assert!(matches!(
            QuestCatalog::from_toml_str(duplicate).unwrap_err(),
            LifeRpgError::DuplicateQuest { variant: QuestVariant::Special, id: 1 }
        ));

        let bad_skill = r#"
[[rng]]
id = 1
name = "Nowhere"
child_skill_id = 40
exp_reward = 10
"#;
        assert!(matches!(
            QuestCatalog::from_toml_str(bad_skill).unwrap_err(),
            LifeRpgError::InvalidSkillReference(40)
        ));
    }

    #[test]
    fn test_seed_keeps_stored_definitions_and_reports_conflicts() {
        let mut store = crate::store::QuestStore::open_in_memory().unwrap();
        store.seed(&QuestCatalog::builtin()).unwrap();

        let overlay = QuestCatalog::from_toml_str(
            r#"
[[daily]]
id = 1
name = "Train Stamina Harder"
child_skill_id = 1
exp_reward = 500

[[daily]]
id = 2
name = "Read a Chapter"
description = "Read one chapter of a book."
child_skill_id = 4
exp_reward = 75

[[daily]]
id = 9
name = "Stretch"
child_skill_id = 2
exp_reward = 30
"#,
        )
        .unwrap();

        let conflicts = overlay.conflicts(store.conn()).unwrap();
        assert_eq!(conflicts, vec![(QuestVariant::Daily, 1)]);

        assert_eq!(overlay.seed(store.conn()).unwrap(), 1);
        let stored = QuestCatalog::load(store.conn()).unwrap();
        let kept = stored.get(QuestVariant::Daily, 1).unwrap();
        assert_eq!(kept.name, "Train Stamina");
        assert_eq!(kept.exp_reward, 50);
        assert!(stored.get(QuestVariant::Daily, 9).is_ok());
        assert!(overlay.conflicts(store.conn()).unwrap().contains(&(QuestVariant::Daily, 1)));
    }

    #[test]
    fn test_same_id_across_variants_allowed() {
        let catalog = QuestCatalog::builtin();
        assert!(catalog.get(QuestVariant::Daily, 1).is_ok());
        assert!(catalog.get(QuestVariant::Special, 1).is_ok());
    }
}
