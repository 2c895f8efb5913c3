//! Quest Ledger
//!
//! Per-player quest records in `player_quests` and the availability rules that
//! read them. One record exists per (player, quest id, variant).
//!
//! ## Availability
//!
//! - daily: assigned once per calendar day; available while today's record is
//!   incomplete. Records from earlier days are retired on the first listing of
//!   a new day.
//! - routine: hidden while a completion falls inside the current week
//!   (from Monday 00:00) or month (from the 1st, 00:00).
//! - special, rng: one completion ever.
//! - progression: always.
//! - challenge: until its deadline passes or it is completed once.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LifeRpgError, Result};
use crate::quest_catalog::{QuestCatalog, QuestDefinition, QuestKind, QuestVariant, ResetPeriod};

/// Completion state of one quest for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub player_name: String,
    pub quest_id: u32,
    pub variant: QuestVariant,
    pub completed: bool,
    /// Completion time, or the assignment day for an incomplete daily record
    pub recorded_at: NaiveDateTime,
    /// Stored for challenges; not used for gating
    pub streak_count: u32,
}

/// Outcome of a daily reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRefresh {
    /// Records from earlier days that were removed
    pub retired: usize,
    /// Fresh records assigned for today
    pub assigned: usize,
}

/// A quest as offered to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestSummary {
    pub variant: QuestVariant,
    pub id: u32,
    pub name: String,
    pub description: String,
    pub child_skill_id: u32,
    pub exp_reward: u64,
    pub coin_reward: u64,
    pub reset_period: Option<ResetPeriod>,
    pub time_limit: Option<NaiveDateTime>,
    pub streak_required: Option<u32>,
}

impl From<&QuestDefinition> for QuestSummary {
    fn from(quest: &QuestDefinition) -> Self {
        let (reset_period, time_limit, streak_required) = match &quest.kind {
            QuestKind::Routine { reset_period } => (Some(*reset_period), None, None),
            QuestKind::Challenge {
                time_limit,
                streak_required,
            } => (None, Some(*time_limit), Some(*streak_required)),
            _ => (None, None, None),
        };
        Self {
            variant: quest.variant(),
            id: quest.id,
            name: quest.name.clone(),
            description: quest.description.clone(),
            child_skill_id: quest.child_skill_id,
            exp_reward: quest.exp_reward,
            coin_reward: quest.coin_reward,
            reset_period,
            time_limit,
            streak_required,
        }
    }
}

// ============================================================================
// Reset windows
// ============================================================================

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 00:00 of the current day
pub fn day_start(now: NaiveDateTime) -> NaiveDateTime {
    midnight(now.date())
}

/// 00:00 of the most recent Monday (today if today is Monday)
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    let days_since_monday = now.weekday().num_days_from_monday() as i64;
    midnight(now.date() - Duration::days(days_since_monday))
}

/// 00:00 of the first day of the current month
pub fn month_start(now: NaiveDateTime) -> NaiveDateTime {
    midnight(now.date().with_day(1).unwrap_or(now.date()))
}

impl ResetPeriod {
    /// Start of the window that `now` falls in
    pub fn window_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            ResetPeriod::Weekly => week_start(now),
            ResetPeriod::Monthly => month_start(now),
        }
    }
}

/// Decide whether a quest can be taken at `now` given its current record
pub fn is_available(quest: &QuestDefinition, record: Option<&QuestRecord>, now: NaiveDateTime) -> bool {
    let completed = record.map_or(false, |record| record.completed);
    match &quest.kind {
        QuestKind::Daily => record
            .map_or(false, |record| !record.completed && record.recorded_at >= day_start(now)),
        QuestKind::Routine { reset_period } => {
            let window = reset_period.window_start(now);
            !record.map_or(false, |record| record.completed && record.recorded_at >= window)
        }
        QuestKind::Special | QuestKind::Rng => !completed,
        QuestKind::Progression => true,
        QuestKind::Challenge { time_limit, .. } => now <= *time_limit && !completed,
    }
}

// ============================================================================
// Ledger operations
// ============================================================================

/// Quest records for one player, keyed by (variant, quest id)
#[derive(Debug, Clone, Default)]
pub struct QuestLedger {
    records: HashMap<(QuestVariant, u32), QuestRecord>,
}

impl QuestLedger {
    pub fn load(conn: &Connection, player_name: &str) -> Result<Self> {
        let mut stmt = conn.prepare(
            "SELECT quest_id, quest_type, completed, completion_date, streak_count
             FROM player_quests WHERE player_name = ?1",
        )?;
        let mut rows = stmt.query(params![player_name])?;

        let mut records = HashMap::new();
        while let Some(row) = rows.next()? {
            let quest_type: String = row.get(1)?;
            let variant: QuestVariant = quest_type.parse()?;
            let record = QuestRecord {
                player_name: player_name.to_string(),
                quest_id: row.get(0)?,
                variant,
                completed: row.get(2)?,
                recorded_at: row.get(3)?,
                streak_count: row.get(4)?,
            };
            records.insert((variant, record.quest_id), record);
        }
        Ok(Self { records })
    }

    pub fn record(&self, variant: QuestVariant, quest_id: u32) -> Option<&QuestRecord> {
        self.records.get(&(variant, quest_id))
    }

    pub fn records(&self) -> impl Iterator<Item = &QuestRecord> {
        self.records.values()
    }

    pub fn is_available(&self, quest: &QuestDefinition, now: NaiveDateTime) -> bool {
        is_available(quest, self.record(quest.variant(), quest.id), now)
    }

    /// Available quests in catalog order
    pub fn available<'a>(&self, catalog: &'a QuestCatalog, now: NaiveDateTime) -> Vec<&'a QuestDefinition> {
        catalog
            .iter()
            .filter(|quest| self.is_available(quest, now))
            .collect()
    }

    /// Retire daily records from earlier days, then assign today's set if the
    /// player has no daily record dated today.
    pub fn refresh_daily(
        &mut self,
        conn: &Connection,
        player_name: &str,
        catalog: &QuestCatalog,
        now: NaiveDateTime,
    ) -> Result<DailyRefresh> {
        let today = day_start(now);
        let mut refresh = DailyRefresh::default();

        let stale: Vec<u32> = self
            .records
            .values()
            .filter(|record| record.variant == QuestVariant::Daily && record.recorded_at < today)
            .map(|record| record.quest_id)
            .collect();
        for quest_id in stale {
            conn.execute(
                "DELETE FROM player_quests
                 WHERE player_name = ?1 AND quest_id = ?2 AND quest_type = ?3",
                params![player_name, quest_id, QuestVariant::Daily.as_str()],
            )?;
            self.records.remove(&(QuestVariant::Daily, quest_id));
            refresh.retired += 1;
        }

        let has_today = self
            .records
            .values()
            .any(|record| record.variant == QuestVariant::Daily && record.recorded_at >= today);
        if !has_today {
            for quest in catalog.by_variant(QuestVariant::Daily) {
                let record = QuestRecord {
                    player_name: player_name.to_string(),
                    quest_id: quest.id,
                    variant: QuestVariant::Daily,
                    completed: false,
                    recorded_at: today,
                    streak_count: 0,
                };
                upsert(conn, &record)?;
                self.records.insert((QuestVariant::Daily, quest.id), record);
                refresh.assigned += 1;
            }
        }

        if refresh.retired > 0 || refresh.assigned > 0 {
            info!(
                "Daily reset for {}: retired {}, assigned {}",
                player_name, refresh.retired, refresh.assigned
            );
        }
        Ok(refresh)
    }

    /// Record a completion. Rejects quests that are not available at `now`.
    pub fn mark_completed(
        &mut self,
        conn: &Connection,
        player_name: &str,
        quest: &QuestDefinition,
        now: NaiveDateTime,
    ) -> Result<QuestRecord> {
        if !self.is_available(quest, now) {
            return Err(LifeRpgError::QuestUnavailable {
                variant: quest.variant(),
                id: quest.id,
            });
        }

        let record = QuestRecord {
            player_name: player_name.to_string(),
            quest_id: quest.id,
            variant: quest.variant(),
            completed: true,
            recorded_at: now,
            streak_count: 1,
        };
        upsert(conn, &record)?;
        self.records
            .insert((record.variant, record.quest_id), record.clone());
        debug!(
            "Marked {} quest #{} completed for {}",
            quest.variant(),
            quest.id,
            player_name
        );
        Ok(record)
    }
}

/// Insert or replace the single record for (player, quest id, variant)
fn upsert(conn: &Connection, record: &QuestRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO player_quests
         (player_name, quest_id, quest_type, completed, completion_date, streak_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.player_name,
            record.quest_id,
            record.variant.as_str(),
            record.completed,
            record.recorded_at,
            record.streak_count,
        ],
    )?;
    Ok(())
}
