//! Profile-level transitions: streak mode switch, tutorial, full reset.

use chrono::{DateTime, Utc};

use super::{Engine, Settlement, Transition};
use crate::error::{EngineError, Rejection};
use crate::events::Event;
use crate::state::{PlayerState, StreakMode};

impl Engine {
    /// Switch between global and per-quest daily streaks.
    ///
    /// Destructive: every daily streak restarts from zero, so `confirm` must
    /// be set. Switching to the mode already in use is a no-op.
    pub fn set_streak_mode(
        &self,
        state: &PlayerState,
        mode: StreakMode,
        confirm: bool,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "set_streak_mode", |s| s.set_streak_mode(mode, confirm))
    }

    /// Mark onboarding finished. Quest creation limits apply from here on.
    pub fn complete_tutorial(&self, state: &PlayerState, now: DateTime<Utc>) -> Result<Transition, EngineError> {
        self.transact(state, now, "complete_tutorial", |s| {
            if !s.state.tutorial_completed {
                s.state.tutorial_completed = true;
                s.emit(Event::TutorialCompleted { at: s.now });
            }
            Ok(())
        })
    }

    /// Wipe all progress back to a fresh profile.
    pub fn reset_all(
        &self,
        state: &PlayerState,
        confirm: bool,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        if !confirm {
            tracing::debug!(op = "reset_all", "transition rejected");
            return Err(Rejection::ConfirmationRequired.into());
        }
        tracing::info!(level = state.level, xp = state.xp, "profile reset");
        Ok(Transition {
            state: PlayerState::new(),
            events: vec![Event::ProfileReset { at: now }],
        })
    }
}

impl Settlement {
    fn set_streak_mode(&mut self, mode: StreakMode, confirm: bool) -> Result<(), EngineError> {
        if self.state.streak_mode == mode {
            return Ok(());
        }
        if !confirm {
            return Err(Rejection::ConfirmationRequired.into());
        }
        self.state.streak_mode = mode;
        self.state.daily_streak = 0;
        self.state.last_daily_streak_period = None;
        self.state.daily_grace_until = None;
        self.state.quest_streaks.reset_all();
        self.emit(Event::StreakModeChanged { mode, at: self.now });
        Ok(())
    }
}
