//! Level Curves
//!
//! Each tier of the skill hierarchy levels on its own geometric schedule.
//!
//! ## Threshold Schedule
//!
//! Leaving level 1 costs `base` experience. Every following level costs the
//! previous threshold multiplied by `growth`:
//!
//! | Tier        | base | growth | coins per level-up |
//! |-------------|------|--------|--------------------|
//! | Child skill | 100  | x1.5   | 20                 |
//! | Life skill  | 350  | x1.25  | 50                 |
//! | Player      | 500  | x1.5   | 100                |
//!
//! So a child skill reaches level 2 at 100 exp, level 3 at 250, level 4 at 475.
//!
//! Thresholds are tracked as `f64`. Both growth ratios are exact binary
//! fractions, so early thresholds are exact; past a few dozen levels the
//! thresholds exceed 2^53 and the comparison loses integer precision.

use serde::{Deserialize, Serialize};

/// Which tier of the hierarchy a curve applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ChildSkill,
    LifeSkill,
    Player,
}

impl Tier {
    pub fn curve(&self) -> &'static LevelCurve {
        match self {
            Tier::ChildSkill => &CHILD_SKILL_CURVE,
            Tier::LifeSkill => &LIFE_SKILL_CURVE,
            Tier::Player => &PLAYER_CURVE,
        }
    }
}

/// Geometric experience curve for one tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCurve {
    /// Experience needed to leave level 1
    pub base_threshold: f64,
    /// Multiplier applied to the threshold after every level
    pub growth: f64,
    /// Coins awarded for each level gained on this tier
    pub coins_per_level: u64,
}

pub const CHILD_SKILL_CURVE: LevelCurve = LevelCurve {
    base_threshold: 100.0,
    growth: 1.5,
    coins_per_level: 20,
};

pub const LIFE_SKILL_CURVE: LevelCurve = LevelCurve {
    base_threshold: 350.0,
    growth: 1.25,
    coins_per_level: 50,
};

pub const PLAYER_CURVE: LevelCurve = LevelCurve {
    base_threshold: 500.0,
    growth: 1.5,
    coins_per_level: 100,
};

impl LevelCurve {
    /// Calculate level from total experience
    pub fn level_for(&self, total_exp: u64) -> u32 {
        self.walk(total_exp).0
    }

    /// Experience needed to leave `level` (cost of that single level)
    pub fn threshold_for(&self, level: u32) -> f64 {
        let mut threshold = self.base_threshold;
        for _ in 1..level.max(1) {
            threshold *= self.growth;
        }
        threshold
    }

    /// Experience still missing before the next level-up
    pub fn experience_to_next(&self, total_exp: u64) -> u64 {
        let (_, remaining, threshold) = self.walk(total_exp);
        (threshold - remaining).ceil().max(0.0) as u64
    }

    /// Progress through the current level (0-100)
    pub fn progress_percent(&self, total_exp: u64) -> u8 {
        let (_, remaining, threshold) = self.walk(total_exp);
        if threshold <= 0.0 {
            return 100;
        }
        ((remaining / threshold) * 100.0).clamp(0.0, 100.0) as u8
    }

    /// Subtract thresholds until the remainder no longer covers one.
    /// Returns (level, experience into that level, threshold of that level).
    fn walk(&self, total_exp: u64) -> (u32, f64, f64) {
        let mut level = 1;
        let mut remaining = total_exp as f64;
        let mut threshold = self.base_threshold;

        while remaining >= threshold {
            remaining -= threshold;
            level += 1;
            threshold *= self.growth;
        }

        (level, remaining, threshold)
    }
}

/// Level changes produced by a single experience gain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDeltas {
    pub child_skill: u32,
    pub life_skill: u32,
    pub player: u32,
}

impl LevelDeltas {
    /// Coins earned purely from crossing thresholds
    pub fn level_up_coins(&self) -> u64 {
        self.child_skill as u64 * CHILD_SKILL_CURVE.coins_per_level
            + self.life_skill as u64 * LIFE_SKILL_CURVE.coins_per_level
            + self.player as u64 * PLAYER_CURVE.coins_per_level
    }

    pub fn any(&self) -> bool {
        self.child_skill > 0 || self.life_skill > 0 || self.player > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: [Tier; 3] = [Tier::ChildSkill, Tier::LifeSkill, Tier::Player];

    #[test]
    fn test_below_base_is_level_one() {
        for tier in TIERS {
            let curve = tier.curve();
            let base = curve.base_threshold as u64;
            for exp in [0, 1, base / 2, base - 1] {
                assert_eq!(curve.level_for(exp), 1, "{:?} at {} exp", tier, exp);
            }
        }
    }

    #[test]
    fn test_child_skill_thresholds() {
        let curve = &CHILD_SKILL_CURVE;
        assert_eq!(curve.level_for(90), 1);
        assert_eq!(curve.level_for(100), 2);
        assert_eq!(curve.level_for(249), 2);
        assert_eq!(curve.level_for(250), 3);
        assert_eq!(curve.level_for(474), 3);
        assert_eq!(curve.level_for(475), 4);
    }

    #[test]
    fn test_life_skill_thresholds() {
        let curve = &LIFE_SKILL_CURVE;
        // 350, then 437.5
        assert_eq!(curve.level_for(349), 1);
        assert_eq!(curve.level_for(350), 2);
        assert_eq!(curve.level_for(787), 2);
        assert_eq!(curve.level_for(788), 3);
    }

    #[test]
    fn test_player_thresholds() {
        let curve = &PLAYER_CURVE;
        assert_eq!(curve.level_for(499), 1);
        assert_eq!(curve.level_for(500), 2);
        assert_eq!(curve.level_for(1249), 2);
        assert_eq!(curve.level_for(1250), 3);
    }

    #[test]
    fn test_levels_monotonic() {
        for tier in TIERS {
            let curve = tier.curve();
            let mut previous = curve.level_for(0);
            for exp in (0..20_000).step_by(7) {
                let level = curve.level_for(exp);
                assert!(level >= previous, "{:?} dropped at {} exp", tier, exp);
                previous = level;
            }
        }
    }

    #[test]
    fn test_threshold_for() {
        assert_eq!(CHILD_SKILL_CURVE.threshold_for(1), 100.0);
        assert_eq!(CHILD_SKILL_CURVE.threshold_for(2), 150.0);
        assert_eq!(CHILD_SKILL_CURVE.threshold_for(3), 225.0);
        assert_eq!(LIFE_SKILL_CURVE.threshold_for(2), 437.5);
        assert_eq!(PLAYER_CURVE.threshold_for(0), 500.0);
    }

    #[test]
    fn test_experience_to_next_and_progress() {
        let curve = &CHILD_SKILL_CURVE;
        assert_eq!(curve.experience_to_next(0), 100);
        assert_eq!(curve.experience_to_next(50), 50);
        assert_eq!(curve.experience_to_next(100), 150);
        assert_eq!(curve.progress_percent(0), 0);
        assert_eq!(curve.progress_percent(50), 50);
        assert_eq!(curve.progress_percent(175), 50);

        // Fractional threshold rounds the missing amount up
        assert_eq!(LIFE_SKILL_CURVE.experience_to_next(350), 438);
    }

    #[test]
    fn test_large_experience_terminates() {
        let level = CHILD_SKILL_CURVE.level_for(u64::MAX);
        assert!(level > 50 && level < 200, "level {}", level);
    }

    #[test]
    fn test_level_up_coins() {
        let deltas = LevelDeltas {
            child_skill: 1,
            life_skill: 0,
            player: 0,
        };
        assert_eq!(deltas.level_up_coins(), 20);

        let deltas = LevelDeltas {
            child_skill: 2,
            life_skill: 1,
            player: 1,
        };
        assert_eq!(deltas.level_up_coins(), 40 + 50 + 100);
        assert!(deltas.any());
        assert!(!LevelDeltas::default().any());
    }
}
