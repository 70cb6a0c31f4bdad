//! Daily quest transitions.
//!
//! ```text
//! Incomplete --complete--> Completed --undo (< 5 min)--> Incomplete
//!                              |
//!                              +--daily boundary--> Incomplete
//! ```

use chrono::{DateTime, Utc};

use super::{Engine, Settlement, Transition};
use crate::clock;
use crate::error::{EngineError, InvalidState, Rejection};
use crate::events::{Event, StreakScope, XpSource};
use crate::quest::{CompletionReceipt, QuestCategory};
use crate::state::{PlayerState, StreakMode};

impl Engine {
    /// Complete a daily quest.
    ///
    /// Grants `xp x multiplier` and caches the base, total, and multiplier on
    /// the quest. In global streak mode the first completion of the day
    /// credits the global daily streak; in per-quest mode the quest's own
    /// streak advances.
    pub fn complete_daily(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "complete_daily", |s| s.complete_daily(id))
    }

    /// Undo a daily completion within the undo window. Refunds the base XP
    /// only and reverts any streak credit the completion caused.
    pub fn undo_daily(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "undo_daily", |s| s.undo_daily(id))
    }
}

impl Settlement {
    fn daily_index(&self, id: &str) -> Result<usize, EngineError> {
        self.state
            .daily_quests
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| self.unknown(QuestCategory::Daily, id))
    }

    fn complete_daily(&mut self, id: &str) -> Result<(), EngineError> {
        let idx = self.daily_index(id)?;
        let quest = &self.state.daily_quests[idx];
        if quest.completed {
            return Err(InvalidState::AlreadyCompleted(id.to_string()).into());
        }
        let base = quest.xp;
        let text = quest.text.clone();

        let mut receipt = CompletionReceipt {
            ledger_before: self.state.quest_streaks.get(id).cloned(),
            credited_global: false,
            previous_credit: self.state.last_daily_streak_period,
            previous_longest: self.state.longest_daily_streak,
            previous_grace: self.state.daily_grace_until,
            milestone_xp: 0,
            milestone_coins: 0,
            consumed_freeze: None,
        };

        let multiplier = self.state.active_effects.current_multiplier(self.now);
        let total = self.grant_xp(base, XpSource::DailyQuest);
        self.count_completion();

        let (milestone_xp, milestone_coins) = match self.state.streak_mode {
            StreakMode::Global => {
                self.record_quest_streak(id, &text, false);
                match self.credit_daily_streak() {
                    Some((old, new)) => {
                        receipt.credited_global = true;
                        self.award_milestones(None, old, new)
                    }
                    None => (0, 0),
                }
            }
            StreakMode::PerQuest => {
                let update = self.record_quest_streak(id, &text, true);
                receipt.consumed_freeze = self.consumed_freeze.take();
                self.award_milestones(Some(id), update.old_streak, update.new_streak)
            }
        };
        receipt.milestone_xp = milestone_xp;
        receipt.milestone_coins = milestone_coins;

        let quest = &mut self.state.daily_quests[idx];
        quest.completed = true;
        quest.completed_at = Some(self.now);
        quest.base_xp = Some(base);
        quest.total_xp = Some(total);
        quest.multiplier_applied = Some(multiplier);
        quest.receipt = Some(receipt);

        self.emit(Event::QuestCompleted {
            category: QuestCategory::Daily,
            id: id.to_string(),
            at: self.now,
        });
        Ok(())
    }

    /// Credit the global daily streak for the current period. Returns the old
    /// and new streak if this call credited it.
    fn credit_daily_streak(&mut self) -> Option<(u32, u32)> {
        let period = self.cal.daily_period(self.now);
        if self.state.last_daily_streak_period == Some(period) {
            return None;
        }
        let old = self.state.daily_streak;
        let new = old + 1;
        self.state.daily_streak = new;
        self.state.longest_daily_streak = self.state.longest_daily_streak.max(new);
        self.state.last_daily_streak_period = Some(period);
        self.state.daily_grace_until = None;
        self.emit(Event::StreakUpdated {
            scope: StreakScope::Daily,
            quest_id: None,
            old_streak: old,
            new_streak: new,
            at: self.now,
        });
        Some((old, new))
    }

    fn undo_daily(&mut self, id: &str) -> Result<(), EngineError> {
        let idx = self.daily_index(id)?;
        let quest = &self.state.daily_quests[idx];
        if !quest.completed {
            return Err(InvalidState::NotCompleted(id.to_string()).into());
        }
        let Some(completed_at) = quest.completed_at else {
            return Err(InvalidState::MissingCompletedAt(id.to_string()).into());
        };
        if !clock::can_undo(Some(completed_at), self.now) {
            return Err(Rejection::UndoWindowExpired.into());
        }

        let refund = quest.base_xp.unwrap_or(quest.xp);
        let mut receipt = quest.receipt.clone();
        self.state.daily_quests[idx].clear_completion();

        self.refund_xp(refund, XpSource::DailyQuest);
        self.uncount_completion();

        if let Some(receipt) = receipt.as_mut() {
            self.state.quest_streaks.restore(id, receipt.ledger_before.take());
            if let Some(freeze) = receipt.consumed_freeze.take() {
                tracing::info!(quest = id, "streak freeze returned by undo");
                self.state.active_effects.restore_freeze(freeze, self.now);
            }
            if receipt.credited_global {
                self.release_global_credit(receipt);
            }
            self.revoke_milestones(receipt.milestone_xp, receipt.milestone_coins);
        }

        self.emit(Event::QuestUndone {
            category: QuestCategory::Daily,
            id: id.to_string(),
            at: self.now,
        });
        Ok(())
    }

    /// Revert a global streak credit, or hand it to another quest still
    /// completed in the same period so the streak stays earned.
    fn release_global_credit(&mut self, receipt: &mut CompletionReceipt) {
        let period = self.cal.daily_period(self.now);
        let cal = self.cal;
        let heir = self
            .state
            .daily_quests
            .iter_mut()
            .filter(|q| {
                q.completed
                    && q.completed_at
                        .map(|at| cal.daily_period(at) == period)
                        .unwrap_or(false)
            })
            .max_by_key(|q| q.completed_at);

        if let Some(heir) = heir {
            if let Some(heir_receipt) = heir.receipt.as_mut() {
                heir_receipt.credited_global = true;
                heir_receipt.previous_credit = receipt.previous_credit;
                heir_receipt.previous_longest = receipt.previous_longest;
                heir_receipt.previous_grace = receipt.previous_grace;
                heir_receipt.milestone_xp += receipt.milestone_xp;
                heir_receipt.milestone_coins += receipt.milestone_coins;
                receipt.milestone_xp = 0;
                receipt.milestone_coins = 0;
                return;
            }
        }

        let old = self.state.daily_streak;
        let new = old.saturating_sub(1);
        self.state.daily_streak = new;
        self.state.last_daily_streak_period = receipt.previous_credit;
        self.state.longest_daily_streak = receipt.previous_longest;
        self.state.daily_grace_until = receipt.previous_grace;
        self.emit(Event::StreakUpdated {
            scope: StreakScope::Daily,
            quest_id: None,
            old_streak: old,
            new_streak: new,
            at: self.now,
        });
    }
}
