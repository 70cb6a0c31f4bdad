//! Side quest transitions.
//!
//! One-shot quests. Completion grants XP and advances the quest's ledger
//! record; undo inside the window refunds exactly what was granted. A
//! completed side quest is dropped from the active list once the undo window
//! has passed.

use chrono::{DateTime, Utc};

use super::{Engine, Settlement, Transition};
use crate::clock;
use crate::error::{EngineError, InvalidState, Rejection};
use crate::events::{Event, XpSource};
use crate::quest::{CompletionReceipt, QuestCategory};
use crate::state::PlayerState;

impl Engine {
    pub fn complete_side(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "complete_side", |s| s.complete_side(id))
    }

    pub fn undo_side(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "undo_side", |s| s.undo_side(id))
    }
}

impl Settlement {
    fn side_index(&self, id: &str) -> Result<usize, EngineError> {
        self.state
            .side_quests
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| self.unknown(QuestCategory::Side, id))
    }

    fn complete_side(&mut self, id: &str) -> Result<(), EngineError> {
        let idx = self.side_index(id)?;
        let quest = &self.state.side_quests[idx];
        if quest.completed {
            return Err(InvalidState::AlreadyCompleted(id.to_string()).into());
        }
        let base = quest.xp;
        let text = quest.text.clone();
        let ledger_before = self.state.quest_streaks.get(id).cloned();

        let granted = self.grant_xp(base, XpSource::SideQuest);
        self.count_completion();
        let update = self.record_quest_streak(id, &text, false);
        let (milestone_xp, milestone_coins) =
            self.award_milestones(Some(id), update.old_streak, update.new_streak);

        let quest = &mut self.state.side_quests[idx];
        quest.completed = true;
        quest.completed_at = Some(self.now);
        quest.xp_granted = Some(granted);
        quest.receipt = Some(CompletionReceipt {
            ledger_before,
            credited_global: false,
            previous_credit: None,
            previous_longest: 0,
            previous_grace: None,
            milestone_xp,
            milestone_coins,
            consumed_freeze: None,
        });

        self.emit(Event::QuestCompleted {
            category: QuestCategory::Side,
            id: id.to_string(),
            at: self.now,
        });
        Ok(())
    }

    fn undo_side(&mut self, id: &str) -> Result<(), EngineError> {
        // Removed by this transition's maintenance pass: the window closed.
        if self.expired_side.iter().any(|expired| expired == id) {
            return Err(Rejection::UndoWindowExpired.into());
        }
        let idx = self.side_index(id)?;
        let quest = &self.state.side_quests[idx];
        if !quest.completed {
            return Err(InvalidState::NotCompleted(id.to_string()).into());
        }
        if quest.completed_at.is_none() {
            return Err(InvalidState::MissingCompletedAt(id.to_string()).into());
        }
        if !clock::can_undo(quest.completed_at, self.now) {
            return Err(Rejection::UndoWindowExpired.into());
        }

        let refund = quest.xp_granted.unwrap_or(quest.xp);
        let receipt = quest.receipt.clone();
        self.state.side_quests[idx].clear_completion();

        self.refund_xp(refund, XpSource::SideQuest);
        self.uncount_completion();
        if let Some(receipt) = receipt {
            self.state.quest_streaks.restore(id, receipt.ledger_before);
            self.revoke_milestones(receipt.milestone_xp, receipt.milestone_coins);
        }

        self.emit(Event::QuestUndone {
            category: QuestCategory::Side,
            id: id.to_string(),
            at: self.now,
        });
        Ok(())
    }
}
