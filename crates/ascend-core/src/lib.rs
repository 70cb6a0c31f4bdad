//! # Ascend Core Library
//!
//! This library provides the progression and quest-lifecycle engine behind the
//! Ascend habit tracker. The engine is pure: every transition takes a player
//! state snapshot plus the current instant, and returns a new snapshot with the
//! events it produced. Persistence and presentation belong to the caller; the
//! bundled `ascend-cli` binary is one such caller.
//!
//! ## Architecture
//!
//! - **Engine**: quest transitions (daily, weekly, main, side), lazy rollovers
//!   at the 00:01 daily and Monday 00:01 weekly boundaries, the store, and
//!   reward loops
//! - **Progression**: leveling curve, per-quest streak ledger with milestones,
//!   temporary effects, achievements
//! - **Storage**: JSON player document with legacy-shape normalization and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: Transition entry point
//! - [`PlayerState`]: Aggregate root consumed and produced by the engine
//! - [`Event`]: Notifications emitted by transitions
//! - [`StateStore`]: Player document persistence
//! - [`Config`]: Application configuration management

pub mod achievements;
pub mod catalog;
pub mod clock;
pub mod daily_log;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod leveling;
pub mod quest;
pub mod state;
pub mod storage;
pub mod streak;

pub use clock::DayCalendar;
pub use daily_log::{DailyLog, DayLog};
pub use effects::{ActiveEffectView, EffectKind, EffectRegistry};
pub use engine::{Engine, Transition};
pub use error::{ConfigError, CoreError, EngineError, InvalidState, Rejection};
pub use events::{Event, StreakScope, XpSource};
pub use leveling::{level_for_xp, rank_title, xp_progress, XpProgress};
pub use quest::{DailyQuest, MainQuest, QuestCategory, QuestDraft, SideQuest, WeeklyQuest};
pub use state::{ItemKind, MiniGame, PlayerState, StreakMode};
pub use storage::{normalize_state, Config, StateStore};
pub use streak::{StreakLedger, StreakRecord};
