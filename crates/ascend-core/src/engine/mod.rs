//! Quest lifecycle engine.
//!
//! Every transition takes a [`PlayerState`] snapshot plus the current instant
//! and returns a new state together with the events it produced. The caller's
//! snapshot is never touched: work happens on a clone, and a failed transition
//! simply drops it.
//!
//! ## Flow of a transition
//!
//! ```text
//! clone state -> catch_up (rollovers, expiry) -> operation -> achievements
//! ```
//!
//! Boundary crossings (daily 00:01, weekly Monday 00:01) are applied lazily by
//! `catch_up` the next time the engine runs with a `now` past the boundary;
//! nothing is scheduled in the background.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = Engine::new(DayCalendar::utc());
//! let t = engine.complete_daily(&state, "d1", Utc::now())?;
//! for event in &t.events { /* notify */ }
//! state = t.state;
//! ```

mod admin;
mod avatar;
mod creation;
mod daily;
mod inventory;
mod main_quest;
mod rollover;
mod side;
mod weekly;

pub use avatar::AvatarView;
pub use creation::{DAILY_CREATION_LIMIT, WEEKLY_CREATION_LIMIT};
pub use inventory::{CHECK_IN_XP, MINI_GAME_COOLDOWN};
pub use main_quest::MAIN_QUEST_COOLDOWN;
pub use weekly::WEEKLY_BONUS_XP;

use chrono::{DateTime, Duration, Utc};

use crate::achievements::{check_achievements, AchievementStats};
use crate::clock::{self, DayCalendar};
use crate::daily_log::DayLog;
use crate::effects::{ActiveEffectView, EffectInstance, EffectKind, FREEZE_EXTENSION};
use crate::error::{EngineError, InvalidState, Rejection};
use crate::events::{Event, StreakScope, XpSource};
use crate::leveling::XpProgress;
use crate::quest::QuestCategory;
use crate::state::PlayerState;
use crate::streak::{check_milestones, StreakUpdate, STREAK_GRACE};

/// Avatar unlocked by the 100-day milestone.
pub const PHOENIX_AVATAR: &str = "phoenix";

/// Outcome of a successful transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: PlayerState,
    pub events: Vec<Event>,
}

impl Transition {
    pub fn into_parts(self) -> (PlayerState, Vec<Event>) {
        (self.state, self.events)
    }

    /// Whether an event with the given type tag was produced.
    pub fn has_event(&self, kind: &str) -> bool {
        self.events.iter().any(|e| e.kind() == kind)
    }
}

/// Progression engine bound to the player's calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    calendar: DayCalendar,
}

impl Engine {
    pub fn new(calendar: DayCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &DayCalendar {
        &self.calendar
    }

    /// Apply pending boundary maintenance without any other change.
    pub fn catch_up(&self, state: &PlayerState, now: DateTime<Utc>) -> Transition {
        let mut s = Settlement::new(state.clone(), now, self.calendar);
        s.catch_up();
        s.finish()
    }

    pub(crate) fn transact<F>(
        &self,
        state: &PlayerState,
        now: DateTime<Utc>,
        op: &'static str,
        f: F,
    ) -> Result<Transition, EngineError>
    where
        F: FnOnce(&mut Settlement) -> Result<(), EngineError>,
    {
        let mut s = Settlement::new(state.clone(), now, self.calendar);
        s.catch_up();
        match f(&mut s) {
            Ok(()) => {
                let t = s.finish();
                tracing::debug!(op, events = t.events.len(), xp = t.state.xp, "transition settled");
                Ok(t)
            }
            Err(err @ EngineError::Rejected(_)) => {
                tracing::debug!(op, reason = err.code(), "transition rejected");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(op, reason = err.code(), "invalid transition: {err}");
                Err(err)
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn progress(&self, state: &PlayerState) -> XpProgress {
        state.progress()
    }

    pub fn current_multiplier(&self, state: &PlayerState, now: DateTime<Utc>) -> u64 {
        state.active_effects.multiplier_at(now)
    }

    pub fn active_effects(&self, state: &PlayerState, now: DateTime<Utc>) -> Vec<ActiveEffectView> {
        state.active_effects.active_effects(now)
    }

    /// Whether `undo_daily` would currently be accepted for `id`.
    pub fn can_undo_daily(&self, state: &PlayerState, id: &str, now: DateTime<Utc>) -> bool {
        state
            .daily(id)
            .map(|q| q.completed && clock::can_undo(q.completed_at, now))
            .unwrap_or(false)
    }

    pub fn can_undo_side(&self, state: &PlayerState, id: &str, now: DateTime<Utc>) -> bool {
        state
            .side(id)
            .map(|q| q.completed && clock::can_undo(q.completed_at, now))
            .unwrap_or(false)
    }

    /// Whether `progress_weekly` would currently be accepted for `id`.
    pub fn can_progress_weekly(&self, state: &PlayerState, id: &str, now: DateTime<Utc>) -> bool {
        state
            .weekly(id)
            .map(|q| {
                !q.is_complete()
                    && !q
                        .last_progress_at
                        .map(|at| self.calendar.same_day(at, now))
                        .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    /// Activity logged for the local day containing `now`.
    pub fn today_log(&self, state: &PlayerState, now: DateTime<Utc>) -> DayLog {
        state.daily_log.day(self.calendar.local_date(now))
    }

    pub fn main_quest_cooldown_remaining(&self, state: &PlayerState, now: DateTime<Utc>) -> Duration {
        clock::cooldown_remaining(state.main_quest_cooldown, now)
    }
}

/// Working copy of the player state for one transition.
pub(crate) struct Settlement {
    pub state: PlayerState,
    pub events: Vec<Event>,
    pub now: DateTime<Utc>,
    pub cal: DayCalendar,
    /// Side quests removed by this transition's maintenance pass.
    pub expired_side: Vec<String>,
    /// Freeze instance spent by the last `record_quest_streak`, before the use.
    pub consumed_freeze: Option<EffectInstance>,
}

impl Settlement {
    fn new(state: PlayerState, now: DateTime<Utc>, cal: DayCalendar) -> Self {
        Self {
            state,
            events: Vec::new(),
            now,
            cal,
            expired_side: Vec::new(),
            consumed_freeze: None,
        }
    }

    pub fn emit(&mut self, event: Event) {
        let today = self.cal.local_date(self.now);
        self.state.daily_log.record(today, &event);
        self.events.push(event);
    }

    /// Grant quest XP with the current multiplier applied. Returns the amount
    /// granted.
    pub fn grant_xp(&mut self, base: u64, source: XpSource) -> u64 {
        let multiplier = self.state.active_effects.current_multiplier(self.now);
        let amount = base.saturating_mul(multiplier);
        self.credit_xp(amount, base, multiplier, source);
        amount
    }

    /// Grant XP exactly as given (milestones, promo codes).
    pub fn grant_flat_xp(&mut self, amount: u64, source: XpSource) {
        self.credit_xp(amount, amount, 1, source);
    }

    fn credit_xp(&mut self, amount: u64, base: u64, multiplier: u64, source: XpSource) {
        if amount == 0 {
            return;
        }
        let old_level = self.state.level;
        self.state.xp = self.state.xp.saturating_add(amount);
        self.state.stats.total_xp_earned = self.state.stats.total_xp_earned.saturating_add(amount);
        self.emit(Event::XpGained {
            amount,
            base,
            multiplier,
            source,
            at: self.now,
        });
        self.state.sync_level();
        if self.state.level > old_level {
            self.emit(Event::LevelUp {
                old_level,
                new_level: self.state.level,
                levels_gained: self.state.level - old_level,
                at: self.now,
            });
        }
    }

    /// Take back XP, never going below zero.
    pub fn refund_xp(&mut self, amount: u64, source: XpSource) {
        if amount == 0 {
            return;
        }
        let old_level = self.state.level;
        self.state.xp = self.state.xp.saturating_sub(amount);
        self.state.stats.total_xp_earned = self.state.stats.total_xp_earned.saturating_sub(amount);
        self.emit(Event::XpRefunded {
            amount,
            source,
            at: self.now,
        });
        self.state.sync_level();
        if self.state.level < old_level {
            self.emit(Event::LevelDown {
                old_level,
                new_level: self.state.level,
                at: self.now,
            });
        }
    }

    pub fn grant_coins(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        self.state.coins = self.state.coins.saturating_add(amount);
        self.state.stats.total_coins_earned = self.state.stats.total_coins_earned.saturating_add(amount);
        self.emit(Event::CoinsGained {
            amount,
            at: self.now,
        });
    }

    pub fn revoke_coins(&mut self, amount: u64) {
        let today = self.cal.local_date(self.now);
        self.state.daily_log.revoke_coins(today, amount);
        self.state.coins = self.state.coins.saturating_sub(amount);
        self.state.stats.total_coins_earned = self.state.stats.total_coins_earned.saturating_sub(amount);
    }

    pub fn spend_coins(&mut self, amount: u64) -> Result<(), Rejection> {
        if self.state.coins < amount {
            return Err(Rejection::InsufficientCoins {
                needed: amount,
                available: self.state.coins,
            });
        }
        self.state.coins -= amount;
        self.state.stats.total_coins_spent = self.state.stats.total_coins_spent.saturating_add(amount);
        self.emit(Event::CoinsSpent {
            amount,
            at: self.now,
        });
        Ok(())
    }

    pub fn count_completion(&mut self) {
        self.state.stats.total_quests_completed = self.state.stats.total_quests_completed.saturating_add(1);
    }

    pub fn uncount_completion(&mut self) {
        self.state.stats.total_quests_completed = self.state.stats.total_quests_completed.saturating_sub(1);
    }

    /// Pay out every milestone crossed between `old` and `new`. Returns the XP
    /// and coins granted.
    pub fn award_milestones(&mut self, quest_id: Option<&str>, old: u32, new: u32) -> (u64, u64) {
        let mut xp = 0;
        let mut coins = 0;
        for reward in check_milestones(old, new) {
            self.grant_flat_xp(reward.xp, XpSource::Milestone);
            self.grant_coins(reward.coins);
            xp += reward.xp;
            coins += reward.coins;
            if reward.unlocks_special_avatar && self.state.unlocked_avatars.insert(PHOENIX_AVATAR.to_string()) {
                self.emit(Event::AvatarUnlocked {
                    id: PHOENIX_AVATAR.to_string(),
                    at: self.now,
                });
            }
            self.emit(Event::MilestoneReached {
                quest_id: quest_id.map(str::to_string),
                milestone: reward.milestone,
                reward,
                at: self.now,
            });
        }
        (xp, coins)
    }

    pub fn revoke_milestones(&mut self, xp: u64, coins: u64) {
        self.refund_xp(xp, XpSource::Milestone);
        self.revoke_coins(coins);
    }

    /// Record a completion in the per-quest ledger. With `allow_freeze`, a
    /// live streak freeze absorbs a lapsed grace window once.
    pub fn record_quest_streak(&mut self, id: &str, text: &str, allow_freeze: bool) -> StreakUpdate {
        let mut tolerance = STREAK_GRACE;
        if allow_freeze && self.state.quest_streaks.would_break(id, self.now, &self.cal) {
            let extended = STREAK_GRACE + FREEZE_EXTENSION;
            let within = self
                .state
                .quest_streaks
                .get(id)
                .and_then(|r| r.last_completed)
                .map(|last| self.now - last <= extended)
                .unwrap_or(false);
            let snapshot = self.state.active_effects.get(EffectKind::StreakFreeze).cloned();
            if within && self.state.active_effects.consume_freeze(self.now) {
                self.consumed_freeze = snapshot;
                tolerance = extended;
                let streak = self.state.quest_streaks.streak_of(id);
                tracing::info!(quest = id, streak, "streak freeze absorbed a missed day");
                self.emit(Event::StreakFrozen {
                    scope: StreakScope::Quest,
                    streak,
                    at: self.now,
                });
            }
        }
        let update = self
            .state
            .quest_streaks
            .record_completion_within(id, text, self.now, &self.cal, tolerance);
        self.emit(Event::StreakUpdated {
            scope: StreakScope::Quest,
            quest_id: Some(id.to_string()),
            old_streak: update.old_streak,
            new_streak: update.new_streak,
            at: self.now,
        });
        update
    }

    pub fn unknown(&self, category: QuestCategory, id: &str) -> EngineError {
        EngineError::InvalidState(InvalidState::UnknownQuest {
            category,
            id: id.to_string(),
        })
    }

    pub fn require_effect_inactive(&self, kind: EffectKind) -> Result<(), Rejection> {
        if self.state.active_effects.is_active(kind, self.now) {
            return Err(Rejection::EffectAlreadyActive(kind));
        }
        Ok(())
    }

    /// Run the achievement sweep and hand back the result.
    fn finish(mut self) -> Transition {
        self.state.sync_level();
        let stats = AchievementStats::from_state(&self.state);
        let unlocked = check_achievements(&stats, &self.state.unlocked_achievements);
        for achievement in unlocked {
            self.state
                .unlocked_achievements
                .insert(achievement.id.to_string());
            self.events.push(Event::AchievementUnlocked {
                id: achievement.id.to_string(),
                title: achievement.title.to_string(),
                at: self.now,
            });
        }
        Transition {
            state: self.state,
            events: self.events,
        }
    }
}
