use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::quest::QuestCategory;
use crate::state::{ItemKind, MiniGame, StreakMode};
use crate::streak::MilestoneReward;

/// What an XP grant or refund was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    DailyQuest,
    WeeklyProgress,
    WeeklyBonus,
    Objective,
    MainQuest,
    SideQuest,
    CheckIn,
    Milestone,
    Promo,
}

/// Which streak counter an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakScope {
    /// Global daily streak.
    Daily,
    /// Global weekly streak.
    Weekly,
    /// A single quest's ledger record.
    Quest,
}

/// Every engine transition produces an ordered list of events.
/// The presentation layer drives notifications from them; the engine never
/// calls presentation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    XpGained {
        amount: u64,
        base: u64,
        multiplier: u64,
        source: XpSource,
        at: DateTime<Utc>,
    },
    XpRefunded {
        amount: u64,
        source: XpSource,
        at: DateTime<Utc>,
    },
    CoinsGained {
        amount: u64,
        at: DateTime<Utc>,
    },
    CoinsSpent {
        amount: u64,
        at: DateTime<Utc>,
    },
    LevelUp {
        old_level: u32,
        new_level: u32,
        levels_gained: u32,
        at: DateTime<Utc>,
    },
    /// A refund pushed XP below the current level's threshold.
    LevelDown {
        old_level: u32,
        new_level: u32,
        at: DateTime<Utc>,
    },
    StreakUpdated {
        scope: StreakScope,
        #[serde(skip_serializing_if = "Option::is_none")]
        quest_id: Option<String>,
        old_streak: u32,
        new_streak: u32,
        at: DateTime<Utc>,
    },
    StreakBroken {
        scope: StreakScope,
        previous: u32,
        at: DateTime<Utc>,
    },
    /// A streak freeze absorbed a break.
    StreakFrozen {
        scope: StreakScope,
        streak: u32,
        at: DateTime<Utc>,
    },
    MilestoneReached {
        #[serde(skip_serializing_if = "Option::is_none")]
        quest_id: Option<String>,
        milestone: u32,
        reward: MilestoneReward,
        at: DateTime<Utc>,
    },
    AchievementUnlocked {
        id: String,
        title: String,
        at: DateTime<Utc>,
    },
    AvatarUnlocked {
        id: String,
        at: DateTime<Utc>,
    },
    AvatarPurchased {
        id: String,
        cost: u64,
        at: DateTime<Utc>,
    },
    AvatarSelected {
        id: String,
        at: DateTime<Utc>,
    },
    QuestCreated {
        category: QuestCategory,
        id: String,
        at: DateTime<Utc>,
    },
    QuestCompleted {
        category: QuestCategory,
        id: String,
        at: DateTime<Utc>,
    },
    QuestUndone {
        category: QuestCategory,
        id: String,
        at: DateTime<Utc>,
    },
    QuestDeleted {
        category: QuestCategory,
        id: String,
        at: DateTime<Utc>,
    },
    /// A completed side quest aged out of the active list.
    SideQuestExpired {
        id: String,
        at: DateTime<Utc>,
    },
    WeeklyProgressed {
        id: String,
        current: u32,
        target: u32,
        at: DateTime<Utc>,
    },
    WeeklyAllComplete {
        at: DateTime<Utc>,
    },
    ObjectiveToggled {
        index: usize,
        completed: bool,
        at: DateTime<Utc>,
    },
    MainQuestSet {
        id: String,
        at: DateTime<Utc>,
    },
    MainQuestEdited {
        id: String,
        at: DateTime<Utc>,
    },
    MainQuestFinalized {
        id: String,
        cooldown_until: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    MainQuestAbandoned {
        id: String,
        at: DateTime<Utc>,
    },
    EffectActivated {
        kind: EffectKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    EffectExpired {
        kind: EffectKind,
        at: DateTime<Utc>,
    },
    ItemPurchased {
        item_id: String,
        cost: u64,
        at: DateTime<Utc>,
    },
    ItemUsed {
        kind: ItemKind,
        at: DateTime<Utc>,
    },
    PromoRedeemed {
        code: String,
        at: DateTime<Utc>,
    },
    CheckedIn {
        at: DateTime<Utc>,
    },
    MiniGamePlayed {
        game: MiniGame,
        coins: u64,
        cooldown_until: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    DailyReset {
        period: NaiveDate,
        at: DateTime<Utc>,
    },
    WeeklyReset {
        period: NaiveDate,
        at: DateTime<Utc>,
    },
    StreakModeChanged {
        mode: StreakMode,
        at: DateTime<Utc>,
    },
    TutorialCompleted {
        at: DateTime<Utc>,
    },
    ProfileReset {
        at: DateTime<Utc>,
    },
    OperationRejected {
        reason: String,
        message: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Tag name as it appears in the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::XpGained { .. } => "XpGained",
            Event::XpRefunded { .. } => "XpRefunded",
            Event::CoinsGained { .. } => "CoinsGained",
            Event::CoinsSpent { .. } => "CoinsSpent",
            Event::LevelUp { .. } => "LevelUp",
            Event::LevelDown { .. } => "LevelDown",
            Event::StreakUpdated { .. } => "StreakUpdated",
            Event::StreakBroken { .. } => "StreakBroken",
            Event::StreakFrozen { .. } => "StreakFrozen",
            Event::MilestoneReached { .. } => "MilestoneReached",
            Event::AchievementUnlocked { .. } => "AchievementUnlocked",
            Event::AvatarUnlocked { .. } => "AvatarUnlocked",
            Event::AvatarPurchased { .. } => "AvatarPurchased",
            Event::AvatarSelected { .. } => "AvatarSelected",
            Event::QuestCreated { .. } => "QuestCreated",
            Event::QuestCompleted { .. } => "QuestCompleted",
            Event::QuestUndone { .. } => "QuestUndone",
            Event::QuestDeleted { .. } => "QuestDeleted",
            Event::SideQuestExpired { .. } => "SideQuestExpired",
            Event::WeeklyProgressed { .. } => "WeeklyProgressed",
            Event::WeeklyAllComplete { .. } => "WeeklyAllComplete",
            Event::ObjectiveToggled { .. } => "ObjectiveToggled",
            Event::MainQuestSet { .. } => "MainQuestSet",
            Event::MainQuestEdited { .. } => "MainQuestEdited",
            Event::MainQuestFinalized { .. } => "MainQuestFinalized",
            Event::MainQuestAbandoned { .. } => "MainQuestAbandoned",
            Event::EffectActivated { .. } => "EffectActivated",
            Event::EffectExpired { .. } => "EffectExpired",
            Event::ItemPurchased { .. } => "ItemPurchased",
            Event::ItemUsed { .. } => "ItemUsed",
            Event::PromoRedeemed { .. } => "PromoRedeemed",
            Event::CheckedIn { .. } => "CheckedIn",
            Event::MiniGamePlayed { .. } => "MiniGamePlayed",
            Event::DailyReset { .. } => "DailyReset",
            Event::WeeklyReset { .. } => "WeeklyReset",
            Event::StreakModeChanged { .. } => "StreakModeChanged",
            Event::TutorialCompleted { .. } => "TutorialCompleted",
            Event::ProfileReset { .. } => "ProfileReset",
            Event::OperationRejected { .. } => "OperationRejected",
        }
    }
}
