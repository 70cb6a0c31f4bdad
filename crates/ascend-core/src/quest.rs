//! Quest types.
//!
//! Four categories share identity (`id`, `text`) and an XP reward but follow
//! different lifecycles:
//!
//! | Category | Lifecycle                                                     |
//! |----------|---------------------------------------------------------------|
//! | Main     | singleton; objectives toggle; finalize into history + cooldown |
//! | Daily    | complete / undo (5 min); reset at 00:01                        |
//! | Weekly   | one progress step per day up to `target`; reset Monday 00:01   |
//! | Side     | complete / undo (5 min); removed 5 min after completion        |

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::QuestTemplate;
use crate::effects::EffectInstance;
use crate::streak::StreakRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestCategory {
    Main,
    Daily,
    Weekly,
    Side,
}

impl fmt::Display for QuestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestCategory::Main => "main",
            QuestCategory::Daily => "daily",
            QuestCategory::Weekly => "weekly",
            QuestCategory::Side => "side",
        };
        f.write_str(s)
    }
}

/// Default XP per objective completion.
pub const OBJECTIVE_XP: u64 = 25;
/// Default main quest finalization bonus.
pub const MAIN_QUEST_BONUS_XP: u64 = 200;
/// Default XP per weekly progress step.
pub const WEEKLY_INCREMENT_XP: u64 = 5;
/// Fewest non-blank objectives a main quest may carry.
pub const MIN_MAIN_OBJECTIVES: usize = 3;

/// Streak side effects caused by a daily completion, kept so undo can roll
/// them back exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReceipt {
    /// The quest's ledger record before this completion (`None` if absent).
    pub ledger_before: Option<StreakRecord>,
    /// Whether this completion credited the global daily streak.
    pub credited_global: bool,
    /// Global credit marker before this completion.
    pub previous_credit: Option<NaiveDate>,
    /// Longest daily streak before this completion.
    pub previous_longest: u32,
    /// Freeze recovery window before this completion.
    #[serde(default)]
    pub previous_grace: Option<DateTime<Utc>>,
    /// Milestone rewards granted by this completion.
    pub milestone_xp: u64,
    pub milestone_coins: u64,
    /// Streak freeze as it was before this completion spent it.
    #[serde(default)]
    pub consumed_freeze: Option<EffectInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// XP actually granted when toggled on, refunded when toggled off.
    #[serde(default)]
    pub xp_granted: Option<u64>,
}

impl Objective {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
            xp_granted: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainQuest {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    #[serde(default = "default_main_bonus")]
    pub xp: u64,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_main_bonus() -> u64 {
    MAIN_QUEST_BONUS_XP
}

impl MainQuest {
    /// False for an empty objective list, so a quest without objectives can
    /// never be finalized.
    pub fn all_objectives_complete(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    pub fn completed_objectives(&self) -> usize {
        self.objectives.iter().filter(|o| o.completed).count()
    }
}

/// A finalized main quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainQuestRecord {
    pub id: String,
    pub quest_id: String,
    pub text: String,
    pub objectives: Vec<Objective>,
    pub completed_at: DateTime<Utc>,
    pub xp_earned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyQuest {
    pub id: String,
    pub text: String,
    pub xp: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// XP before the multiplier, captured at completion.
    #[serde(default, rename = "baseXP")]
    pub base_xp: Option<u64>,
    /// XP actually granted, captured at completion.
    #[serde(default, rename = "totalXP")]
    pub total_xp: Option<u64>,
    #[serde(default)]
    pub multiplier_applied: Option<u64>,
    #[serde(default)]
    pub receipt: Option<CompletionReceipt>,
    #[serde(default)]
    pub category: Option<String>,
}

impl DailyQuest {
    pub(crate) fn clear_completion(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.base_xp = None;
        self.total_xp = None;
        self.multiplier_applied = None;
        self.receipt = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyQuest {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub current: u32,
    pub target: u32,
    #[serde(default = "default_weekly_increment")]
    pub xp_per_increment: u64,
    #[serde(default)]
    pub last_progress_at: Option<DateTime<Utc>>,
}

fn default_weekly_increment() -> u64 {
    WEEKLY_INCREMENT_XP
}

impl WeeklyQuest {
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SideQuest {
    pub id: String,
    pub text: String,
    pub xp: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// XP actually granted, refunded in full on undo.
    #[serde(default)]
    pub xp_granted: Option<u64>,
    #[serde(default)]
    pub receipt: Option<CompletionReceipt>,
}

impl SideQuest {
    pub(crate) fn clear_completion(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.xp_granted = None;
        self.receipt = None;
    }
}

/// Borrowed view over any quest.
#[derive(Debug, Clone, Copy)]
pub enum QuestRef<'a> {
    Main(&'a MainQuest),
    Daily(&'a DailyQuest),
    Weekly(&'a WeeklyQuest),
    Side(&'a SideQuest),
}

impl QuestRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            QuestRef::Main(q) => &q.id,
            QuestRef::Daily(q) => &q.id,
            QuestRef::Weekly(q) => &q.id,
            QuestRef::Side(q) => &q.id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            QuestRef::Main(q) => &q.text,
            QuestRef::Daily(q) => &q.text,
            QuestRef::Weekly(q) => &q.text,
            QuestRef::Side(q) => &q.text,
        }
    }

    /// Base XP reward of the quest's primary action.
    pub fn xp(&self) -> u64 {
        match self {
            QuestRef::Main(q) => q.xp,
            QuestRef::Daily(q) => q.xp,
            QuestRef::Weekly(q) => q.xp_per_increment,
            QuestRef::Side(q) => q.xp,
        }
    }

    pub fn category(&self) -> QuestCategory {
        match self {
            QuestRef::Main(_) => QuestCategory::Main,
            QuestRef::Daily(_) => QuestCategory::Daily,
            QuestRef::Weekly(_) => QuestCategory::Weekly,
            QuestRef::Side(_) => QuestCategory::Side,
        }
    }
}

/// Caller-supplied definition of a new quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum QuestDraft {
    Main {
        #[serde(default)]
        id: Option<String>,
        text: String,
        #[serde(default)]
        objectives: Vec<String>,
    },
    Daily {
        #[serde(default)]
        id: Option<String>,
        text: String,
        xp: u64,
        /// Life area, e.g. `health`. Inferred from a matching template when
        /// absent.
        #[serde(default, rename = "area")]
        category: Option<String>,
    },
    Weekly {
        #[serde(default)]
        id: Option<String>,
        text: String,
        target: u32,
        #[serde(default = "default_weekly_increment")]
        xp_per_increment: u64,
    },
    Side {
        #[serde(default)]
        id: Option<String>,
        text: String,
        xp: u64,
    },
}

impl QuestDraft {
    pub fn category(&self) -> QuestCategory {
        match self {
            QuestDraft::Main { .. } => QuestCategory::Main,
            QuestDraft::Daily { .. } => QuestCategory::Daily,
            QuestDraft::Weekly { .. } => QuestCategory::Weekly,
            QuestDraft::Side { .. } => QuestCategory::Side,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            QuestDraft::Main { text, .. }
            | QuestDraft::Daily { text, .. }
            | QuestDraft::Weekly { text, .. }
            | QuestDraft::Side { text, .. } => text,
        }
    }

    pub fn daily(text: impl Into<String>, xp: u64) -> Self {
        QuestDraft::Daily {
            id: None,
            text: text.into(),
            xp,
            category: None,
        }
    }

    /// Daily quest adopted from a catalog template, carrying its area.
    pub fn from_template(template: &QuestTemplate) -> Self {
        QuestDraft::Daily {
            id: None,
            text: template.text.to_string(),
            xp: template.xp,
            category: Some(template.category.to_string()),
        }
    }

    pub fn weekly(text: impl Into<String>, target: u32) -> Self {
        QuestDraft::Weekly {
            id: None,
            text: text.into(),
            target,
            xp_per_increment: WEEKLY_INCREMENT_XP,
        }
    }

    pub fn side(text: impl Into<String>, xp: u64) -> Self {
        QuestDraft::Side {
            id: None,
            text: text.into(),
            xp,
        }
    }

    pub fn main<I, S>(text: impl Into<String>, objectives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QuestDraft::Main {
            id: None,
            text: text.into(),
            objectives: objectives.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach an explicit identifier.
    pub fn with_id(mut self, new_id: impl Into<String>) -> Self {
        let new_id = Some(new_id.into());
        match &mut self {
            QuestDraft::Main { id, .. }
            | QuestDraft::Daily { id, .. }
            | QuestDraft::Weekly { id, .. }
            | QuestDraft::Side { id, .. } => *id = new_id,
        }
        self
    }
}

pub(crate) fn new_quest_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_quest_serializes_cached_fields_with_original_names() {
        let quest = DailyQuest {
            id: "d1".into(),
            text: "Walk".into(),
            xp: 10,
            completed: true,
            completed_at: Some(Utc::now()),
            base_xp: Some(10),
            total_xp: Some(20),
            multiplier_applied: Some(2),
            receipt: None,
            category: None,
        };
        let json = serde_json::to_value(&quest).unwrap();
        assert_eq!(json["baseXP"], 10);
        assert_eq!(json["totalXP"], 20);
        assert_eq!(json["multiplierApplied"], 2);
        let back: DailyQuest = serde_json::from_value(json).unwrap();
        assert_eq!(back, quest);
    }

    #[test]
    fn draft_parses_from_tagged_json() {
        let draft: QuestDraft =
            serde_json::from_str(r#"{"category":"weekly","text":"Gym","target":3}"#).unwrap();
        assert_eq!(draft.category(), QuestCategory::Weekly);
        match draft {
            QuestDraft::Weekly {
                xp_per_increment, ..
            } => assert_eq!(xp_per_increment, WEEKLY_INCREMENT_XP),
            other => panic!("unexpected draft {other:?}"),
        }
    }

    #[test]
    fn quest_ref_exposes_shared_identity() {
        let weekly = WeeklyQuest {
            id: "w1".into(),
            text: "Run".into(),
            current: 3,
            target: 3,
            xp_per_increment: 7,
            last_progress_at: None,
        };
        let q = QuestRef::Weekly(&weekly);
        assert_eq!(q.id(), "w1");
        assert_eq!(q.xp(), 7);
        assert_eq!(q.category(), QuestCategory::Weekly);
        assert!(weekly.is_complete());
    }

    #[test]
    fn template_draft_carries_area() {
        let template = crate::catalog::DAILY_TEMPLATES[0];
        match QuestDraft::from_template(&template) {
            QuestDraft::Daily { text, xp, category, .. } => {
                assert_eq!(text, "Exercise 30 min");
                assert_eq!(xp, 10);
                assert_eq!(category.as_deref(), Some("health"));
            }
            other => panic!("unexpected draft {other:?}"),
        }
        let draft: QuestDraft =
            serde_json::from_str(r#"{"category":"daily","text":"Nap","xp":3,"area":"wellness"}"#).unwrap();
        assert!(matches!(draft, QuestDraft::Daily { category: Some(ref c), .. } if c == "wellness"));
    }

    #[test]
    fn with_id_overrides_generated_id() {
        match QuestDraft::daily("Walk", 5).with_id("fixed") {
            QuestDraft::Daily { id, .. } => assert_eq!(id.as_deref(), Some("fixed")),
            other => panic!("unexpected draft {other:?}"),
        }
    }
}
