//! Achievement evaluator.
//!
//! A stateless sweep over aggregate statistics. `check_achievements` only
//! reports achievements that are not already unlocked, so evaluating an
//! unchanged snapshot twice yields nothing the second time.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::state::{MiniGame, PlayerState};

/// Snapshot of the statistics achievements are judged on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStats {
    pub total_quests_completed: u32,
    pub daily_streak: u32,
    pub level: u32,
    pub main_quests_completed: u32,
    pub total_coins_earned: u64,
    pub total_purchases: u32,
    pub mini_games_played: BTreeMap<MiniGame, u32>,
}

impl AchievementStats {
    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            total_quests_completed: state.stats.total_quests_completed,
            daily_streak: state.best_current_streak(),
            level: state.level,
            main_quests_completed: state.stats.main_quests_completed,
            total_coins_earned: state.stats.total_coins_earned,
            total_purchases: state.stats.total_purchases,
            mini_games_played: state.stats.mini_games_played.clone(),
        }
    }

    fn played_every_game(&self) -> bool {
        MiniGame::ALL
            .iter()
            .all(|g| self.mini_games_played.get(g).copied().unwrap_or(0) > 0)
    }
}

#[derive(Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    condition: fn(&AchievementStats) -> bool,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish()
    }
}

impl Achievement {
    pub fn is_met(&self, stats: &AchievementStats) -> bool {
        (self.condition)(stats)
    }
}

pub static ACHIEVEMENTS: [Achievement; 13] = [
    Achievement {
        id: "first_steps",
        title: "First Steps",
        description: "Complete your first quest",
        condition: |s| s.total_quests_completed >= 1,
    },
    Achievement {
        id: "week_warrior",
        title: "Week Warrior",
        description: "Maintain a 7-day streak",
        condition: |s| s.daily_streak >= 7,
    },
    Achievement {
        id: "month_master",
        title: "Month Master",
        description: "Maintain a 30-day streak",
        condition: |s| s.daily_streak >= 30,
    },
    Achievement {
        id: "century_club",
        title: "Century Club",
        description: "Maintain a 100-day streak",
        condition: |s| s.daily_streak >= 100,
    },
    Achievement {
        id: "level_10",
        title: "Level 10",
        description: "Reach Level 10",
        condition: |s| s.level >= 10,
    },
    Achievement {
        id: "level_25",
        title: "Level 25",
        description: "Reach Level 25",
        condition: |s| s.level >= 25,
    },
    Achievement {
        id: "level_50",
        title: "Level 50",
        description: "Reach Level 50",
        condition: |s| s.level >= 50,
    },
    Achievement {
        id: "game_master",
        title: "Game Master",
        description: "Complete all 4 mini-games",
        condition: |s| s.played_every_game(),
    },
    Achievement {
        id: "boss_slayer",
        title: "Boss Slayer",
        description: "Complete your first Main Quest",
        condition: |s| s.main_quests_completed >= 1,
    },
    Achievement {
        id: "centurion",
        title: "Centurion",
        description: "Complete 100 total quests",
        condition: |s| s.total_quests_completed >= 100,
    },
    Achievement {
        id: "legendary",
        title: "Legendary",
        description: "Complete 500 total quests",
        condition: |s| s.total_quests_completed >= 500,
    },
    Achievement {
        id: "coin_collector",
        title: "Coin Collector",
        description: "Earn 100 coins",
        condition: |s| s.total_coins_earned >= 100,
    },
    Achievement {
        id: "first_purchase",
        title: "First Purchase",
        description: "Buy your first item from the Reward Store",
        condition: |s| s.total_purchases >= 1,
    },
];

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Achievements whose condition holds and that are not yet unlocked, in table
/// order.
pub fn check_achievements(
    stats: &AchievementStats,
    unlocked: &BTreeSet<String>,
) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !unlocked.contains(a.id) && a.is_met(stats))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub unlocked: usize,
    pub total: usize,
    pub percentage: u32,
}

/// How many achievement conditions currently hold.
pub fn achievement_progress(stats: &AchievementStats) -> AchievementProgress {
    let unlocked = ACHIEVEMENTS.iter().filter(|a| a.is_met(stats)).count();
    let total = ACHIEVEMENTS.len();
    AchievementProgress {
        unlocked,
        total,
        percentage: ((unlocked as f64 / total as f64) * 100.0).round() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_is_idempotent() {
        let stats = AchievementStats {
            total_quests_completed: 1,
            ..Default::default()
        };
        let mut unlocked = BTreeSet::new();
        let first = check_achievements(&stats, &unlocked);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "first_steps");

        unlocked.extend(first.iter().map(|a| a.id.to_string()));
        assert!(check_achievements(&stats, &unlocked).is_empty());
    }

    #[test]
    fn several_can_unlock_at_once() {
        let stats = AchievementStats {
            total_quests_completed: 100,
            level: 12,
            ..Default::default()
        };
        let ids: Vec<&str> = check_achievements(&stats, &BTreeSet::new())
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["first_steps", "level_10", "centurion"]);
    }

    #[test]
    fn game_master_needs_all_four_games() {
        let mut stats = AchievementStats::default();
        for game in [MiniGame::Dice, MiniGame::FocusHunt, MiniGame::RaceClock] {
            stats.mini_games_played.insert(game, 3);
        }
        assert!(!find_achievement("game_master").unwrap().is_met(&stats));
        stats.mini_games_played.insert(MiniGame::BossBattle, 1);
        assert!(find_achievement("game_master").unwrap().is_met(&stats));
    }

    #[test]
    fn progress_percentage() {
        let stats = AchievementStats {
            total_quests_completed: 1,
            total_purchases: 1,
            ..Default::default()
        };
        let p = achievement_progress(&stats);
        assert_eq!(p.unlocked, 2);
        assert_eq!(p.total, 13);
        assert_eq!(p.percentage, 15);
    }
}
