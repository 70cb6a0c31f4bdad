//! Leveling curve.
//!
//! `xp_required_for_level(L)` is the cumulative XP needed to leave level `L`:
//! a player at level `L` advances once their XP reaches that threshold.
//!
//! ```text
//! level  : 1    2    3    4     5
//! leaves : 100  150  225  338   506  ...  (x1.5 per level)
//! ```

use serde::{Deserialize, Serialize};

const BASE_XP: f64 = 100.0;
const GROWTH: f64 = 1.5;

/// Highest reachable level. Thresholds beyond this no longer fit in `u64`.
pub const MAX_LEVEL: u32 = 98;

/// Cumulative XP threshold associated with `level` (clamped to at least 1).
pub fn xp_required_for_level(level: u32) -> u64 {
    let level = level.max(1);
    let raw = BASE_XP * GROWTH.powi(level as i32 - 1);
    // Saturates at u64::MAX for levels past the cap.
    raw.round() as u64
}

/// Level reached with `xp` cumulative experience. Never below 1.
///
/// Walks upward one threshold at a time so a single large grant may cross
/// several levels.
pub fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1;
    while level < MAX_LEVEL && xp >= xp_required_for_level(level) {
        level += 1;
    }
    level
}

/// Progress snapshot within the current level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpProgress {
    pub level: u32,
    pub xp_into_level: u64,
    pub xp_needed_for_next_level: u64,
    /// Always within `0.0..=100.0`.
    pub progress_percent: f64,
}

pub fn xp_progress(xp: u64) -> XpProgress {
    let level = level_for_xp(xp);
    let floor = if level > 1 {
        xp_required_for_level(level - 1)
    } else {
        0
    };
    let ceiling = xp_required_for_level(level);
    let span = ceiling.saturating_sub(floor);
    let into = xp.saturating_sub(floor);

    let progress_percent = if level >= MAX_LEVEL || span == 0 {
        100.0
    } else {
        (into as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
    };

    XpProgress {
        level,
        xp_into_level: into,
        xp_needed_for_next_level: span,
        progress_percent,
    }
}

/// Result of moving from one XP total to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub old_level: u32,
    pub new_level: u32,
}

impl LevelChange {
    pub fn between(old_xp: u64, new_xp: u64) -> Self {
        Self {
            old_level: level_for_xp(old_xp),
            new_level: level_for_xp(new_xp),
        }
    }

    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.old_level)
    }
}

const RANK_TITLES: [&str; 50] = [
    "Novice", "Initiate", "Apprentice", "Adept", "Journeyman",
    "Skilled", "Expert", "Elite", "Master", "Champion",
    "Hero", "Warrior", "Guardian", "Sentinel", "Protector",
    "Defender", "Vanguard", "Paragon", "Exemplar", "Legend",
    "Mythic", "Fabled", "Renowned", "Illustrious", "Exalted",
    "Transcendent", "Ascendant", "Immortal", "Eternal", "Divine",
    "Celestial", "Cosmic", "Universal", "Infinite", "Omnipotent",
    "Supreme", "Ultimate", "Absolute", "Boundless", "Limitless",
    "Sovereign", "Emperor", "Overlord", "Titan", "Colossus",
    "Behemoth", "Leviathan", "Phoenix", "Apex", "Zenith",
];

/// Rank title shown next to a level. Past 50 the top title gains a roman tier.
pub fn rank_title(level: u32) -> String {
    match level {
        0 => RANK_TITLES[0].to_string(),
        1..=50 => RANK_TITLES[level as usize - 1].to_string(),
        _ => {
            let tier = (level - 50) / 10 + 1;
            format!("{} {}", RANK_TITLES[49], to_roman(tier))
        }
    }
}

fn to_roman(mut n: u32) -> String {
    const NUMERALS: [(&str, u32); 5] = [("X", 10), ("IX", 9), ("V", 5), ("IV", 4), ("I", 1)];
    let mut out = String::new();
    for (symbol, value) in NUMERALS {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}
