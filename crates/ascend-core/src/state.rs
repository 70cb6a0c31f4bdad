//! Player state: the aggregate root every engine transition consumes and
//! produces.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::daily_log::DailyLog;
use crate::effects::{EffectKind, EffectRegistry};
use crate::leveling::{level_for_xp, xp_progress, XpProgress};
use crate::quest::{DailyQuest, MainQuest, MainQuestRecord, QuestCategory, QuestRef, SideQuest, WeeklyQuest};
use crate::streak::StreakLedger;

/// How daily streaks are tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreakMode {
    /// One streak for "completed any daily quest today".
    #[default]
    Global,
    /// Each quest keeps its own streak.
    PerQuest,
}

impl fmt::Display for StreakMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreakMode::Global => write!(f, "global"),
            StreakMode::PerQuest => write!(f, "per-quest"),
        }
    }
}

impl FromStr for StreakMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(StreakMode::Global),
            "per-quest" | "perquest" | "per_quest" => Ok(StreakMode::PerQuest),
            other => Err(format!("unknown streak mode '{other}'")),
        }
    }
}

/// Consumable inventory item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    StreakSaver,
    XpMultiplier,
}

impl ItemKind {
    /// Catalog identifier.
    pub fn id(self) -> &'static str {
        match self {
            ItemKind::StreakSaver => "streak_saver",
            ItemKind::XpMultiplier => "xp_multiplier",
        }
    }

    /// Effect activated by consuming this item.
    pub fn effect(self) -> EffectKind {
        match self {
            ItemKind::StreakSaver => EffectKind::StreakFreeze,
            ItemKind::XpMultiplier => EffectKind::XpMultiplier,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::StreakSaver => write!(f, "streak saver token"),
            ItemKind::XpMultiplier => write!(f, "XP multiplier"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "streak_saver" | "streak_freeze" | "streaksaver" => Ok(ItemKind::StreakSaver),
            "xp_multiplier" | "xpmultiplier" => Ok(ItemKind::XpMultiplier),
            other => Err(format!("unknown item '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    #[serde(default)]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    pub fn new(kind: ItemKind, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: format!("item-{}", uuid::Uuid::new_v4()),
            kind,
            name: name.into(),
            acquired_at: Some(at),
        }
    }
}

/// The four reward mini-games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MiniGame {
    Dice,
    FocusHunt,
    RaceClock,
    BossBattle,
}

impl MiniGame {
    pub const ALL: [MiniGame; 4] = [
        MiniGame::Dice,
        MiniGame::FocusHunt,
        MiniGame::RaceClock,
        MiniGame::BossBattle,
    ];
}

impl fmt::Display for MiniGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MiniGame::Dice => "dice",
            MiniGame::FocusHunt => "focus-hunt",
            MiniGame::RaceClock => "race-clock",
            MiniGame::BossBattle => "boss-battle",
        };
        f.write_str(s)
    }
}

impl FromStr for MiniGame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "dice" => Ok(MiniGame::Dice),
            "focushunt" => Ok(MiniGame::FocusHunt),
            "raceclock" => Ok(MiniGame::RaceClock),
            "bossbattle" => Ok(MiniGame::BossBattle),
            _ => Err(format!("unknown mini-game '{s}'")),
        }
    }
}

/// Lifetime counters feeding the achievement evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeStats {
    #[serde(default, rename = "totalXPEarned")]
    pub total_xp_earned: u64,
    #[serde(default)]
    pub total_quests_completed: u32,
    #[serde(default)]
    pub total_coins_earned: u64,
    #[serde(default)]
    pub total_coins_spent: u64,
    #[serde(default)]
    pub total_purchases: u32,
    #[serde(default)]
    pub main_quests_completed: u32,
    #[serde(default)]
    pub mini_games_played: BTreeMap<MiniGame, u32>,
}

/// Per-day creation counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationCounter {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,
}

impl CreationCounter {
    /// Creations recorded on `today`; a stale date counts as zero.
    pub fn count_on(&self, today: NaiveDate) -> u32 {
        if self.last_reset_date == Some(today) {
            self.count
        } else {
            0
        }
    }

    pub fn record(&mut self, today: NaiveDate) {
        self.count = self.count_on(today) + 1;
        self.last_reset_date = Some(today);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub level: u32,
    pub xp: u64,
    pub coins: u64,

    #[serde(default)]
    pub daily_streak: u32,
    #[serde(default)]
    pub weekly_streak: u32,
    #[serde(default)]
    pub longest_daily_streak: u32,
    #[serde(default)]
    pub longest_weekly_streak: u32,
    #[serde(default)]
    pub streak_mode: StreakMode,

    #[serde(default)]
    pub quest_streaks: StreakLedger,
    #[serde(default)]
    pub active_effects: EffectRegistry,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub unlocked_achievements: BTreeSet<String>,
    #[serde(default)]
    pub unlocked_avatars: BTreeSet<String>,
    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub main_quest: Option<MainQuest>,
    #[serde(default)]
    pub main_quest_history: Vec<MainQuestRecord>,
    #[serde(default)]
    pub main_quest_cooldown: Option<DateTime<Utc>>,
    #[serde(default)]
    pub daily_quests: Vec<DailyQuest>,
    #[serde(default)]
    pub weekly_quests: Vec<WeeklyQuest>,
    #[serde(default)]
    pub side_quests: Vec<SideQuest>,

    #[serde(default, flatten)]
    pub stats: LifetimeStats,

    #[serde(default, rename = "dailyQuestCreation")]
    pub daily_creation: CreationCounter,
    #[serde(default, rename = "weeklyQuestCreation")]
    pub weekly_creation: CreationCounter,
    #[serde(default)]
    pub tutorial_completed: bool,

    #[serde(default)]
    pub last_check_in: Option<NaiveDate>,
    #[serde(default)]
    pub used_promo_codes: BTreeSet<String>,
    #[serde(default)]
    pub mini_game_cooldowns: BTreeMap<MiniGame, DateTime<Utc>>,

    /// Daily period last processed by rollover.
    #[serde(default)]
    pub last_daily_reset: Option<NaiveDate>,
    /// Weekly period (its Monday) last processed by rollover.
    #[serde(default)]
    pub last_weekly_reset: Option<NaiveDate>,
    /// Daily period that last credited the global daily streak.
    #[serde(default)]
    pub last_daily_streak_period: Option<NaiveDate>,
    /// A consumed freeze keeps the global streak alive until this instant.
    #[serde(default)]
    pub daily_grace_until: Option<DateTime<Utc>>,
    /// Weekly period whose all-complete bonus was claimed.
    #[serde(default)]
    pub weekly_bonus_claimed: Option<NaiveDate>,

    /// Activity per local day, last 30 days.
    #[serde(default)]
    pub daily_log: DailyLog,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            coins: 0,
            daily_streak: 0,
            weekly_streak: 0,
            longest_daily_streak: 0,
            longest_weekly_streak: 0,
            streak_mode: StreakMode::default(),
            quest_streaks: StreakLedger::new(),
            active_effects: EffectRegistry::new(),
            inventory: Vec::new(),
            unlocked_achievements: BTreeSet::new(),
            unlocked_avatars: BTreeSet::new(),
            avatar: None,
            main_quest: None,
            main_quest_history: Vec::new(),
            main_quest_cooldown: None,
            daily_quests: Vec::new(),
            weekly_quests: Vec::new(),
            side_quests: Vec::new(),
            stats: LifetimeStats::default(),
            daily_creation: CreationCounter::default(),
            weekly_creation: CreationCounter::default(),
            tutorial_completed: false,
            last_check_in: None,
            used_promo_codes: BTreeSet::new(),
            mini_game_cooldowns: BTreeMap::new(),
            last_daily_reset: None,
            last_weekly_reset: None,
            last_daily_streak_period: None,
            daily_grace_until: None,
            weekly_bonus_claimed: None,
            daily_log: DailyLog::new(),
        }
    }
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> XpProgress {
        xp_progress(self.xp)
    }

    /// Recompute `level` from `xp`. Returns `true` if it changed.
    pub(crate) fn sync_level(&mut self) -> bool {
        let level = level_for_xp(self.xp);
        let changed = level != self.level;
        self.level = level;
        changed
    }

    pub fn daily(&self, id: &str) -> Option<&DailyQuest> {
        self.daily_quests.iter().find(|q| q.id == id)
    }

    pub fn weekly(&self, id: &str) -> Option<&WeeklyQuest> {
        self.weekly_quests.iter().find(|q| q.id == id)
    }

    pub fn side(&self, id: &str) -> Option<&SideQuest> {
        self.side_quests.iter().find(|q| q.id == id)
    }

    /// Look up any quest by category and id.
    pub fn find_quest(&self, category: QuestCategory, id: &str) -> Option<QuestRef<'_>> {
        match category {
            QuestCategory::Main => self
                .main_quest
                .as_ref()
                .filter(|q| q.id == id)
                .map(QuestRef::Main),
            QuestCategory::Daily => self.daily(id).map(QuestRef::Daily),
            QuestCategory::Weekly => self.weekly(id).map(QuestRef::Weekly),
            QuestCategory::Side => self.side(id).map(QuestRef::Side),
        }
    }

    /// Every active quest, main first.
    pub fn quests(&self) -> Vec<QuestRef<'_>> {
        let mut out = Vec::new();
        if let Some(main) = &self.main_quest {
            out.push(QuestRef::Main(main));
        }
        out.extend(self.daily_quests.iter().map(QuestRef::Daily));
        out.extend(self.weekly_quests.iter().map(QuestRef::Weekly));
        out.extend(self.side_quests.iter().map(QuestRef::Side));
        out
    }

    pub fn inventory_count(&self, kind: ItemKind) -> usize {
        self.inventory.iter().filter(|i| i.kind == kind).count()
    }

    /// Highest daily streak currently held, whichever mode produced it.
    pub fn best_current_streak(&self) -> u32 {
        let per_quest = self
            .quest_streaks
            .iter()
            .map(|r| r.streak)
            .max()
            .unwrap_or(0);
        self.daily_streak.max(per_quest)
    }
}
