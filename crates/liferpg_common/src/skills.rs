//! Skill Hierarchy
//!
//! Player -> life skill -> child skill. Only child skills receive experience
//! directly; life skills and the player carry cached sums that are recomputed
//! bottom-up on every gain.
//!
//! Skills are process-wide rows shared by every player record. Player links in
//! `player_skills` decide which of them a player's breakdown shows.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LifeRpgError, Result};
use crate::level_curve::{LevelDeltas, Tier};

/// Built-in life skills: (id, name)
pub const LIFE_SKILLS: &[(u32, &str)] = &[
    (1, "Agility"),
    (2, "Intellect"),
    (3, "Soul"),
    (4, "Strength"),
];

/// Built-in child skills: (id, name, life skill id)
pub const CHILD_SKILLS: &[(u32, &str, u32)] = &[
    (1, "Stamina", 1),
    (2, "Mobility", 1),
    (3, "Balance", 1),
    (4, "Reading", 2),
    (5, "Focus", 2),
    (6, "Language Learning", 2),
    (7, "Critical Thinking", 2),
    (8, "Discipline", 3),
    (9, "Practice", 3),
    (10, "Reflection", 3),
    (11, "Weight Training", 4),
    (12, "Core", 4),
    (13, "Endurance", 4),
];

/// Look up a built-in child skill name
pub fn child_skill_name(id: u32) -> Option<&'static str> {
    CHILD_SKILLS
        .iter()
        .find(|(child_id, _, _)| *child_id == id)
        .map(|(_, name, _)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSkill {
    pub id: u32,
    pub name: String,
    pub level: u32,
    pub experience: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSkill {
    pub id: u32,
    pub name: String,
    pub life_skill_id: u32,
    pub level: u32,
    pub experience: u64,
}

/// Player-level aggregate carried by the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub level: u32,
    pub experience: u64,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
        }
    }
}

/// One (life skill, child skill) row of a player's breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBreakdownRow {
    pub life_skill: String,
    pub life_skill_level: u32,
    pub life_skill_experience: u64,
    pub child_skill: String,
    pub child_skill_level: u32,
    pub child_skill_experience: u64,
}

/// Result of a single experience gain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceGain {
    pub deltas: LevelDeltas,
    pub child_skill: ChildSkill,
    pub life_skill: LifeSkill,
    pub player: PlayerProgress,
}

/// In-memory view of all skills plus one player's aggregate
#[derive(Debug, Clone)]
pub struct SkillHierarchy {
    life_skills: BTreeMap<u32, LifeSkill>,
    child_skills: BTreeMap<u32, ChildSkill>,
    player: PlayerProgress,
}

impl SkillHierarchy {
    /// Fresh hierarchy from the built-in catalog, everything at level 1 / 0 exp
    pub fn builtin() -> Self {
        let life_skills = LIFE_SKILLS
            .iter()
            .map(|(id, name)| {
                (
                    *id,
                    LifeSkill {
                        id: *id,
                        name: name.to_string(),
                        level: 1,
                        experience: 0,
                    },
                )
            })
            .collect();
        let child_skills = CHILD_SKILLS
            .iter()
            .map(|(id, name, life_skill_id)| {
                (
                    *id,
                    ChildSkill {
                        id: *id,
                        name: name.to_string(),
                        life_skill_id: *life_skill_id,
                        level: 1,
                        experience: 0,
                    },
                )
            })
            .collect();

        Self {
            life_skills,
            child_skills,
            player: PlayerProgress {
                level: 1,
                experience: 0,
            },
        }
    }

    pub fn life_skill(&self, id: u32) -> Option<&LifeSkill> {
        self.life_skills.get(&id)
    }

    pub fn child_skill(&self, id: u32) -> Option<&ChildSkill> {
        self.child_skills.get(&id)
    }

    pub fn player(&self) -> PlayerProgress {
        self.player
    }

    pub fn life_skills(&self) -> impl Iterator<Item = &LifeSkill> {
        self.life_skills.values()
    }

    pub fn child_skills(&self) -> impl Iterator<Item = &ChildSkill> {
        self.child_skills.values()
    }

    /// Add experience to a child skill and recompute every aggregate above it.
    ///
    /// Unknown ids fail before anything is touched.
    pub fn gain_child_experience(&mut self, child_skill_id: u32, amount: u64) -> Result<ExperienceGain> {
        let (life_skill_id, old_child_level) = match self.child_skills.get(&child_skill_id) {
            Some(child) => (child.life_skill_id, child.level),
            None => return Err(LifeRpgError::InvalidSkillReference(child_skill_id)),
        };
        let old_life_level = self
            .life_skills
            .get(&life_skill_id)
            .map(|life| life.level)
            .ok_or(LifeRpgError::InvalidSkillReference(child_skill_id))?;
        let old_player_level = self.player.level;

        let child = self
            .child_skills
            .get_mut(&child_skill_id)
            .ok_or(LifeRpgError::InvalidSkillReference(child_skill_id))?;
        child.experience = child.experience.saturating_add(amount);
        child.level = Tier::ChildSkill.curve().level_for(child.experience);
        let new_child_level = child.level;

        let life_exp = self.children_sum(life_skill_id);
        let new_life_level = Tier::LifeSkill.curve().level_for(life_exp);
        if let Some(life) = self.life_skills.get_mut(&life_skill_id) {
            life.experience = life_exp;
            life.level = new_life_level;
        }

        self.player.experience = self.life_skills_sum();
        self.player.level = Tier::Player.curve().level_for(self.player.experience);

        self.verify_aggregates()?;

        let deltas = LevelDeltas {
            child_skill: new_child_level.saturating_sub(old_child_level),
            life_skill: new_life_level.saturating_sub(old_life_level),
            player: self.player.level.saturating_sub(old_player_level),
        };
        debug!(
            child_skill_id,
            amount,
            ?deltas,
            player_exp = self.player.experience,
            "Applied child skill experience"
        );

        Ok(ExperienceGain {
            deltas,
            child_skill: self.child_skills[&child_skill_id].clone(),
            life_skill: self.life_skills[&life_skill_id].clone(),
            player: self.player,
        })
    }

    /// Check both cached sums against their parts
    pub fn verify_aggregates(&self) -> Result<()> {
        self.verify_life_skills()?;

        let computed = self.life_skills_sum();
        if computed != self.player.experience {
            return Err(LifeRpgError::AggregateMismatch {
                scope: "player".to_string(),
                stored: self.player.experience,
                computed,
            });
        }
        Ok(())
    }

    fn verify_life_skills(&self) -> Result<()> {
        for life in self.life_skills.values() {
            let computed = self.children_sum(life.id);
            if computed != life.experience {
                return Err(LifeRpgError::AggregateMismatch {
                    scope: format!("life skill {}", life.name),
                    stored: life.experience,
                    computed,
                });
            }
        }
        Ok(())
    }

    /// Ordered (life skill, child skill) rows, optionally restricted to linked children
    pub fn breakdown(&self, linked: Option<&[u32]>) -> Vec<SkillBreakdownRow> {
        let mut keyed: Vec<((u32, u32), SkillBreakdownRow)> = self
            .child_skills
            .values()
            .filter(|child| linked.map_or(true, |ids| ids.contains(&child.id)))
            .filter_map(|child| {
                let life = self.life_skills.get(&child.life_skill_id)?;
                let row = SkillBreakdownRow {
                    life_skill: life.name.clone(),
                    life_skill_level: life.level,
                    life_skill_experience: life.experience,
                    child_skill: child.name.clone(),
                    child_skill_level: child.level,
                    child_skill_experience: child.experience,
                };
                Some(((life.id, child.id), row))
            })
            .collect();

        keyed.sort_by_key(|(key, _)| *key);
        keyed.into_iter().map(|(_, row)| row).collect()
    }

    fn children_sum(&self, life_skill_id: u32) -> u64 {
        self.child_skills
            .values()
            .filter(|child| child.life_skill_id == life_skill_id)
            .map(|child| child.experience)
            .sum()
    }

    fn life_skills_sum(&self) -> u64 {
        self.life_skills.values().map(|life| life.experience).sum()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Load all skills and the named player's aggregate.
    ///
    /// Both cached sums are verified on load.
    pub fn load(conn: &Connection, player_name: &str) -> Result<Self> {
        let mut life_skills = BTreeMap::new();
        {
            let mut stmt = conn.prepare("SELECT id, name, level, exp FROM life_skills ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok(LifeSkill {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    level: row.get(2)?,
                    experience: row.get::<_, i64>(3)?.max(0) as u64,
                })
            })?;
            for life in rows {
                let life = life?;
                life_skills.insert(life.id, life);
            }
        }

        let mut child_skills = BTreeMap::new();
        {
            let mut stmt = conn.prepare(
                "SELECT id, name, life_skill_id, level, exp FROM child_skills ORDER BY id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(ChildSkill {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    life_skill_id: row.get(2)?,
                    level: row.get(3)?,
                    experience: row.get::<_, i64>(4)?.max(0) as u64,
                })
            })?;
            for child in rows {
                let child = child?;
                child_skills.insert(child.id, child);
            }
        }

        let player = conn
            .query_row(
                "SELECT level, exp FROM players WHERE name = ?1",
                params![player_name],
                |row| {
                    Ok(PlayerProgress {
                        level: row.get(0)?,
                        experience: row.get::<_, i64>(1)?.max(0) as u64,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| LifeRpgError::UnknownPlayer(player_name.to_string()))?;

        let hierarchy = Self {
            life_skills,
            child_skills,
            player,
        };
        hierarchy.verify_aggregates()?;
        Ok(hierarchy)
    }

    /// Player aggregate implied by the stored life skills
    pub fn shared_progress(conn: &Connection) -> Result<PlayerProgress> {
        let total: i64 = conn.query_row("SELECT COALESCE(SUM(exp), 0) FROM life_skills", [], |row| {
            row.get(0)
        })?;
        let experience = total.max(0) as u64;
        Ok(PlayerProgress {
            level: Tier::Player.curve().level_for(experience),
            experience,
        })
    }

    /// Write back the rows touched by a gain.
    ///
    /// Every player row gets the new aggregate, since all of them sit on the
    /// same shared skill rows.
    pub fn persist(&self, conn: &Connection, gain: &ExperienceGain) -> Result<()> {
        conn.execute(
            "UPDATE child_skills SET exp = ?1, level = ?2 WHERE id = ?3",
            params![
                gain.child_skill.experience as i64,
                gain.child_skill.level,
                gain.child_skill.id
            ],
        )?;
        conn.execute(
            "UPDATE life_skills SET exp = ?1, level = ?2 WHERE id = ?3",
            params![
                gain.life_skill.experience as i64,
                gain.life_skill.level,
                gain.life_skill.id
            ],
        )?;
        conn.execute(
            "UPDATE players SET exp = ?1, level = ?2",
            params![self.player.experience as i64, self.player.level],
        )?;
        Ok(())
    }

    /// Child skill ids linked to a player, in id order
    pub fn linked_child_skills(conn: &Connection, player_name: &str) -> Result<Vec<u32>> {
        let mut stmt = conn.prepare(
            "SELECT child_skill_id FROM player_skills
             WHERE player_name = ?1
             ORDER BY life_skill_id, child_skill_id",
        )?;
        let ids = stmt
            .query_map(params![player_name], |row| row.get(0))?
            .collect::<std::result::Result<Vec<u32>, _>>()?;
        Ok(ids)
    }

    /// Link every child skill to a player, replacing any previous links
    pub fn link_player(conn: &Connection, player_name: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM player_skills WHERE player_name = ?1",
            params![player_name],
        )?;
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO player_skills (player_name, life_skill_id, child_skill_id)
             VALUES (?1, ?2, ?3)",
        )?;
        for (child_id, _, life_id) in CHILD_SKILLS {
            stmt.execute(params![player_name, life_id, child_id])?;
        }
        Ok(())
    }
}
