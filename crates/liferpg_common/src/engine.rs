//! Progression Engine
//!
//! Orchestrates the store, the skill hierarchy and the quest ledger. Every
//! state change runs inside one SQLite transaction and is committed only after
//! all of its steps succeed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::error::{LifeRpgError, Result};
use crate::ledger::{DailyRefresh, QuestLedger, QuestSummary};
use crate::level_curve::{LevelDeltas, Tier};
use crate::quest_catalog::{QuestCatalog, QuestVariant};
use crate::skills::{SkillBreakdownRow, SkillHierarchy};
use crate::store::{self, Player, PlayerStatus, QuestStore};

/// Outcome of one quest completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub quest: QuestSummary,
    pub experience_gained: u64,
    pub deltas: LevelDeltas,
    pub child_skill: String,
    pub child_skill_level: u32,
    pub life_skill: String,
    pub life_skill_level: u32,
    pub player_level: u32,
    pub player_experience: u64,
    pub level_up_coins: u64,
    pub quest_coins: u64,
    pub coin_balance: u64,
    pub quests_completed: u64,
}

impl CompletionReport {
    pub fn coins_awarded(&self) -> u64 {
        self.level_up_coins + self.quest_coins
    }
}

/// Player stats block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub status: PlayerStatus,
    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,
    pub progress_percent: u8,
    pub coins: u64,
    pub quests_completed: u64,
}

impl From<Player> for PlayerSummary {
    fn from(player: Player) -> Self {
        let curve = Tier::Player.curve();
        Self {
            experience_to_next: curve.experience_to_next(player.experience),
            progress_percent: curve.progress_percent(player.experience),
            name: player.name,
            status: player.status,
            level: player.level,
            experience: player.experience,
            coins: player.coins,
            quests_completed: player.quests_completed,
        }
    }
}

pub struct ProgressionEngine {
    store: QuestStore,
    catalog: QuestCatalog,
}

impl ProgressionEngine {
    /// Seed `catalog` into the store, then serve quests from what the store holds
    pub fn new(mut store: QuestStore, catalog: &QuestCatalog) -> Result<Self> {
        store.seed(catalog)?;
        let catalog = QuestCatalog::load(store.conn())?;
        info!("Quest catalog ready: {} quests", catalog.len());
        Ok(Self { store, catalog })
    }

    /// Open the configured database with the configured catalog
    pub fn open(config: &Config) -> Result<Self> {
        let store = QuestStore::open_at(config.database.resolved_path())?;
        let catalog = config.catalog.load_catalog()?;
        Self::new(store, &catalog)
    }

    pub fn catalog(&self) -> &QuestCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &QuestStore {
        &self.store
    }

    /// The player this install belongs to, if one has been created
    pub fn current_player(&self) -> Result<Option<Player>> {
        self.store.first_player()
    }

    /// Create a player, link every child skill and hand out today's dailies
    pub fn create_player(&mut self, name: &str, now: NaiveDateTime) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LifeRpgError::InvalidPlayerName);
        }

        let tx = self.store.transaction()?;
        let progress = SkillHierarchy::shared_progress(&tx)?;
        store::insert_player(&tx, name, progress)?;
        SkillHierarchy::link_player(&tx, name)?;
        let mut ledger = QuestLedger::load(&tx, name)?;
        ledger.refresh_daily(&tx, name, &self.catalog, now)?;
        let player = store::load_player(&tx, name)?;
        tx.commit()?;

        info!("Created player {}", name);
        Ok(player)
    }

    /// Mark the player live and run the daily reset
    pub fn begin_session(&mut self, player: &str, now: NaiveDateTime) -> Result<DailyRefresh> {
        let tx = self.store.transaction()?;
        store::set_player_status(&tx, player, &PlayerStatus::Live)?;
        let mut ledger = QuestLedger::load(&tx, player)?;
        let refresh = ledger.refresh_daily(&tx, player, &self.catalog, now)?;
        tx.commit()?;
        Ok(refresh)
    }

    /// Quests the player can take at `now`, in catalog order
    pub fn list_available_quests(&mut self, player: &str, now: NaiveDateTime) -> Result<Vec<QuestSummary>> {
        let tx = self.store.transaction()?;
        store::load_player(&tx, player)?;
        let mut ledger = QuestLedger::load(&tx, player)?;
        ledger.refresh_daily(&tx, player, &self.catalog, now)?;
        let available = ledger
            .available(&self.catalog, now)
            .into_iter()
            .map(QuestSummary::from)
            .collect();
        tx.commit()?;
        Ok(available)
    }

    /// Complete a quest: experience, coins, the ledger record and the
    /// completion counter change together or not at all.
    pub fn complete_quest(
        &mut self,
        player: &str,
        variant: QuestVariant,
        quest_id: u32,
        now: NaiveDateTime,
    ) -> Result<CompletionReport> {
        let quest = self.catalog.get(variant, quest_id)?;

        let tx = self.store.transaction()?;
        store::load_player(&tx, player)?;
        let mut ledger = QuestLedger::load(&tx, player)?;
        ledger.refresh_daily(&tx, player, &self.catalog, now)?;
        if !ledger.is_available(quest, now) {
            return Err(LifeRpgError::QuestUnavailable {
                variant,
                id: quest_id,
            });
        }

        let mut hierarchy = SkillHierarchy::load(&tx, player)?;
        let gain = hierarchy.gain_child_experience(quest.child_skill_id, quest.exp_reward)?;
        hierarchy.persist(&tx, &gain)?;

        let level_up_coins = gain.deltas.level_up_coins();
        store::add_coins(&tx, player, level_up_coins + quest.coin_reward)?;
        ledger.mark_completed(&tx, player, quest, now)?;
        store::count_completion(&tx, player)?;

        let updated = store::load_player(&tx, player)?;
        tx.commit()?;

        info!(
            player,
            quest = %quest.name,
            variant = %variant,
            exp = quest.exp_reward,
            coins = level_up_coins + quest.coin_reward,
            "Quest completed"
        );
        if gain.deltas.any() {
            info!(player, deltas = ?gain.deltas, "Level up");
        }

        Ok(CompletionReport {
            quest: QuestSummary::from(quest),
            experience_gained: quest.exp_reward,
            deltas: gain.deltas,
            child_skill: gain.child_skill.name,
            child_skill_level: gain.child_skill.level,
            life_skill: gain.life_skill.name,
            life_skill_level: gain.life_skill.level,
            player_level: gain.player.level,
            player_experience: gain.player.experience,
            level_up_coins,
            quest_coins: quest.coin_reward,
            coin_balance: updated.coins,
            quests_completed: updated.quests_completed,
        })
    }

    pub fn player_summary(&self, player: &str) -> Result<PlayerSummary> {
        Ok(PlayerSummary::from(self.store.player(player)?))
    }

    /// Life and child skill rows for the skills linked to the player
    pub fn skill_breakdown(&self, player: &str) -> Result<Vec<SkillBreakdownRow>> {
        let conn = self.store.conn();
        let hierarchy = SkillHierarchy::load(conn, player)?;
        let linked = SkillHierarchy::linked_child_skills(conn, player)?;
        Ok(hierarchy.breakdown(Some(&linked)))
    }
}
