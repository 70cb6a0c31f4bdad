//! Core error types for ascend-core.
//!
//! Engine transitions distinguish two failure families:
//!
//! - [`Rejection`]: a time or rate precondition was not met (undo window
//!   expired, creation limit reached, cooldown active). Recoverable and meant
//!   to be surfaced to the player.
//! - [`InvalidState`]: the caller asked for a transition that is impossible
//!   given the data (undo of a quest that was never completed, unknown id).
//!   Indicates a caller bug.
//!
//! Neither is fatal: the caller's state snapshot is never mutated when a
//! transition fails.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::effects::EffectKind;
use crate::quest::QuestCategory;
use crate::state::ItemKind;

/// Core error type for ascend-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Engine transition failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Failure of a single engine transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("invalid state: {0}")]
    InvalidState(#[from] InvalidState),
}

impl EngineError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Rejected(r) => r.code(),
            EngineError::InvalidState(i) => i.code(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::Rejected(_))
    }

    /// Convert into the event consumed by the presentation layer.
    pub fn to_event(&self, at: DateTime<Utc>) -> crate::events::Event {
        crate::events::Event::OperationRejected {
            reason: self.code().to_string(),
            message: self.to_string(),
            at,
        }
    }
}

/// A transition blocked by an unmet time, rate, or resource precondition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("undo window has closed")]
    UndoWindowExpired,

    #[error("already progressed today")]
    AlreadyProgressedToday,

    #[error("{category} quest creation limit reached ({limit}/day)")]
    CreationLimitReached { category: QuestCategory, limit: u32 },

    #[error("main quest cooldown active until {until}")]
    MainQuestCooldown { until: DateTime<Utc> },

    #[error("a main quest is already active")]
    MainQuestActive,

    #[error("main quest objectives are not all complete")]
    ObjectivesIncomplete,

    #[error("{0} is already active")]
    EffectAlreadyActive(EffectKind),

    #[error("no {0} in inventory")]
    ItemNotInInventory(ItemKind),

    #[error("store item '{0}' is not available")]
    ItemUnavailable(String),

    #[error("avatar '{0}' is not for sale")]
    AvatarUnavailable(String),

    #[error("avatar '{0}' is already owned")]
    AvatarAlreadyOwned(String),

    #[error("avatar '{0}' is locked")]
    AvatarLocked(String),

    #[error("not enough coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },

    #[error("invalid promo code")]
    PromoCodeInvalid,

    #[error("promo code already used")]
    PromoCodeAlreadyUsed,

    #[error("already checked in today")]
    AlreadyCheckedIn,

    #[error("mini-game on cooldown until {until}")]
    MiniGameCooldown { until: DateTime<Utc> },

    #[error("explicit confirmation required")]
    ConfirmationRequired,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::UndoWindowExpired => "undo_window_expired",
            Rejection::AlreadyProgressedToday => "already_progressed_today",
            Rejection::CreationLimitReached { .. } => "creation_limit_reached",
            Rejection::MainQuestCooldown { .. } => "main_quest_cooldown",
            Rejection::MainQuestActive => "main_quest_active",
            Rejection::ObjectivesIncomplete => "objectives_incomplete",
            Rejection::EffectAlreadyActive(_) => "effect_already_active",
            Rejection::ItemNotInInventory(_) => "item_not_in_inventory",
            Rejection::ItemUnavailable(_) => "item_unavailable",
            Rejection::AvatarUnavailable(_) => "avatar_unavailable",
            Rejection::AvatarAlreadyOwned(_) => "avatar_already_owned",
            Rejection::AvatarLocked(_) => "avatar_locked",
            Rejection::InsufficientCoins { .. } => "insufficient_coins",
            Rejection::PromoCodeInvalid => "promo_code_invalid",
            Rejection::PromoCodeAlreadyUsed => "promo_code_already_used",
            Rejection::AlreadyCheckedIn => "already_checked_in",
            Rejection::MiniGameCooldown { .. } => "mini_game_cooldown",
            Rejection::ConfirmationRequired => "confirmation_required",
        }
    }
}

/// A transition that is impossible given the current data shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidState {
    #[error("unknown {category} quest '{id}'")]
    UnknownQuest { category: QuestCategory, id: String },

    #[error("quest '{0}' is already completed")]
    AlreadyCompleted(String),

    #[error("quest '{0}' is not completed")]
    NotCompleted(String),

    #[error("completed quest '{0}' has no completion timestamp")]
    MissingCompletedAt(String),

    #[error("no active main quest")]
    NoMainQuest,

    #[error("objective index {index} out of bounds (len {len})")]
    ObjectiveOutOfBounds { index: usize, len: usize },

    #[error("invalid quest definition: {0}")]
    InvalidDefinition(String),
}

impl InvalidState {
    pub fn code(&self) -> &'static str {
        match self {
            InvalidState::UnknownQuest { .. } => "unknown_quest",
            InvalidState::AlreadyCompleted(_) => "already_completed",
            InvalidState::NotCompleted(_) => "not_completed",
            InvalidState::MissingCompletedAt(_) => "missing_completed_at",
            InvalidState::NoMainQuest => "no_main_quest",
            InvalidState::ObjectiveOutOfBounds { .. } => "objective_out_of_bounds",
            InvalidState::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
