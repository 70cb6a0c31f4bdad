//! Lazy boundary maintenance.
//!
//! Runs at the start of every transition:
//!
//! 1. expired effects are deactivated,
//! 2. daily rollover (00:01): completed daily quests reopen and the global
//!    daily streak is checked for a missed day,
//! 3. weekly rollover (Monday 00:01): weekly counters return to zero and the
//!    weekly streak is checked,
//! 4. side quests completed at least the undo window ago are removed.

use chrono::Duration;

use super::Settlement;
use crate::clock::UNDO_WINDOW;
use crate::effects::FREEZE_EXTENSION;
use crate::events::{Event, StreakScope};
use crate::state::StreakMode;

impl Settlement {
    pub(crate) fn catch_up(&mut self) {
        self.state.sync_level();
        self.expire_effects();
        self.daily_rollover();
        self.weekly_rollover();
        self.remove_finished_side_quests();
    }

    fn expire_effects(&mut self) {
        for kind in self.state.active_effects.sweep_expired(self.now) {
            tracing::debug!(%kind, "effect expired");
            self.emit(Event::EffectExpired { kind, at: self.now });
        }
    }

    fn daily_rollover(&mut self) {
        let period = self.cal.daily_period(self.now);
        let previous_marker = self.state.last_daily_reset;
        if previous_marker == Some(period) {
            return;
        }

        let cal = self.cal;
        let mut reopened = 0;
        for quest in &mut self.state.daily_quests {
            let stale = match quest.completed_at {
                Some(at) => cal.daily_period(at) != period,
                None => true,
            };
            if quest.completed && stale {
                quest.clear_completion();
                reopened += 1;
            }
        }

        // Streak evaluation needs a known previous period.
        if previous_marker.is_some() && self.state.streak_mode == StreakMode::Global {
            self.check_daily_streak(period);
        }

        let pruned = self.state.daily_log.prune(self.cal.local_date(self.now));
        self.state.last_daily_reset = Some(period);
        tracing::info!(%period, reopened, pruned, "daily rollover");
        self.emit(Event::DailyReset { period, at: self.now });
    }

    fn check_daily_streak(&mut self, period: chrono::NaiveDate) {
        if self.state.daily_streak == 0 {
            return;
        }
        let yesterday = period - Duration::days(1);
        let credited_recently = self
            .state
            .last_daily_streak_period
            .map(|p| p >= yesterday)
            .unwrap_or(true);
        if credited_recently {
            return;
        }

        let in_grace = self
            .state
            .daily_grace_until
            .map(|until| self.now < until)
            .unwrap_or(false);
        if in_grace {
            return;
        }

        let streak = self.state.daily_streak;
        if self.state.active_effects.consume_freeze(self.now) {
            self.state.daily_grace_until = Some(self.now + FREEZE_EXTENSION);
            tracing::info!(streak, "streak freeze absorbed a missed day");
            self.emit(Event::StreakFrozen {
                scope: StreakScope::Daily,
                streak,
                at: self.now,
            });
        } else {
            self.state.daily_streak = 0;
            self.state.daily_grace_until = None;
            tracing::info!(previous = streak, "daily streak broken");
            self.emit(Event::StreakBroken {
                scope: StreakScope::Daily,
                previous: streak,
                at: self.now,
            });
        }
    }

    fn weekly_rollover(&mut self) {
        let week = self.cal.weekly_period(self.now);
        let previous_marker = self.state.last_weekly_reset;
        if previous_marker == Some(week) {
            return;
        }

        if let Some(last_week) = previous_marker {
            let all_met = !self.state.weekly_quests.is_empty()
                && self.state.weekly_quests.iter().all(|q| q.is_complete());
            let consecutive = last_week + Duration::days(7) == week;
            if self.state.weekly_streak > 0 && !(all_met && consecutive) {
                let streak = self.state.weekly_streak;
                if self.state.active_effects.consume_freeze(self.now) {
                    tracing::info!(streak, "streak freeze absorbed a missed week");
                    self.emit(Event::StreakFrozen {
                        scope: StreakScope::Weekly,
                        streak,
                        at: self.now,
                    });
                } else {
                    tracing::info!(previous = streak, "weekly streak broken");
                    self.state.weekly_streak = 0;
                    self.emit(Event::StreakBroken {
                        scope: StreakScope::Weekly,
                        previous: streak,
                        at: self.now,
                    });
                }
            }
        }

        let cal = self.cal;
        for quest in &mut self.state.weekly_quests {
            let stale = match quest.last_progress_at {
                Some(at) => cal.weekly_period(at) != week,
                None => true,
            };
            if stale {
                quest.current = 0;
            }
        }

        self.state.last_weekly_reset = Some(week);
        tracing::info!(%week, "weekly rollover");
        self.emit(Event::WeeklyReset {
            period: week,
            at: self.now,
        });
    }

    fn remove_finished_side_quests(&mut self) {
        let now = self.now;
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.side_quests)
            .into_iter()
            .partition(|q| match q.completed_at {
                Some(at) => q.completed && now - at >= UNDO_WINDOW,
                None => false,
            });
        self.state.side_quests = kept;
        for quest in expired {
            tracing::debug!(quest = %quest.id, "side quest removed");
            self.emit(Event::SideQuestExpired {
                id: quest.id.clone(),
                at: now,
            });
            self.expired_side.push(quest.id);
        }
    }
}
