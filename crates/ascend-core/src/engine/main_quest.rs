//! Main quest transitions.
//!
//! A single active main quest holds an ordered list of objectives. Each
//! objective pays on completion and refunds on un-toggle. Finalizing moves
//! the quest into history, pays the completion bonus, and starts the
//! cooldown before a new main quest can be set.

use chrono::{DateTime, Duration, Utc};

use super::{Engine, Settlement, Transition};
use crate::error::{EngineError, InvalidState, Rejection};
use crate::events::{Event, XpSource};
use crate::quest::{MainQuestRecord, Objective, QuestCategory, MIN_MAIN_OBJECTIVES, OBJECTIVE_XP};
use crate::state::PlayerState;

/// Wait after finalizing before another main quest may be set.
pub const MAIN_QUEST_COOLDOWN: Duration = Duration::days(7);

impl Engine {
    /// Toggle objective `index` of the active main quest.
    pub fn toggle_objective(
        &self,
        state: &PlayerState,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "toggle_objective", |s| s.toggle_objective(index))
    }

    /// Finalize the active main quest once every objective is complete.
    pub fn finalize_main_quest(
        &self,
        state: &PlayerState,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "finalize_main_quest", |s| s.finalize_main_quest())
    }

    /// Replace the main quest's text and objectives. Objectives whose text is
    /// unchanged keep their completion state.
    pub fn edit_main_quest(
        &self,
        state: &PlayerState,
        text: &str,
        objectives: &[String],
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "edit_main_quest", |s| s.edit_main_quest(text, objectives))
    }

    /// Drop the active main quest without reward or cooldown.
    pub fn abandon_main_quest(
        &self,
        state: &PlayerState,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "abandon_main_quest", |s| s.abandon_main_quest())
    }

    /// Finalized main quests, most recent first.
    pub fn main_quest_history<'a>(&self, state: &'a PlayerState) -> Vec<&'a MainQuestRecord> {
        let mut history: Vec<_> = state.main_quest_history.iter().collect();
        history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        history
    }
}

/// Trim objective texts, drop blank ones, and require at least
/// [`MIN_MAIN_OBJECTIVES`] to remain.
pub(super) fn clean_objectives<S: AsRef<str>>(objectives: &[S]) -> Result<Vec<String>, InvalidState> {
    let cleaned: Vec<String> = objectives
        .iter()
        .map(|o| o.as_ref().trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if cleaned.len() < MIN_MAIN_OBJECTIVES {
        return Err(InvalidState::InvalidDefinition(format!(
            "main quest needs at least {MIN_MAIN_OBJECTIVES} objectives, got {}",
            cleaned.len()
        )));
    }
    Ok(cleaned)
}

impl Settlement {
    fn toggle_objective(&mut self, index: usize) -> Result<(), EngineError> {
        let quest = self
            .state
            .main_quest
            .as_ref()
            .ok_or(InvalidState::NoMainQuest)?;
        let len = quest.objectives.len();
        let objective = quest
            .objectives
            .get(index)
            .ok_or(InvalidState::ObjectiveOutOfBounds { index, len })?;

        let completed = if objective.completed {
            let refund = objective.xp_granted.unwrap_or(OBJECTIVE_XP);
            self.refund_xp(refund, XpSource::Objective);
            self.set_objective(index, false, None);
            false
        } else {
            let granted = self.grant_xp(OBJECTIVE_XP, XpSource::Objective);
            self.set_objective(index, true, Some(granted));
            true
        };

        self.emit(Event::ObjectiveToggled {
            index,
            completed,
            at: self.now,
        });
        Ok(())
    }

    fn set_objective(&mut self, index: usize, completed: bool, xp_granted: Option<u64>) {
        if let Some(objective) = self
            .state
            .main_quest
            .as_mut()
            .and_then(|q| q.objectives.get_mut(index))
        {
            objective.completed = completed;
            objective.xp_granted = xp_granted;
        }
    }

    fn finalize_main_quest(&mut self) -> Result<(), EngineError> {
        let quest = self
            .state
            .main_quest
            .as_ref()
            .ok_or(InvalidState::NoMainQuest)?;
        if !quest.all_objectives_complete() {
            return Err(Rejection::ObjectivesIncomplete.into());
        }
        let Some(quest) = self.state.main_quest.take() else {
            return Err(InvalidState::NoMainQuest.into());
        };

        let earned = self.grant_xp(quest.xp, XpSource::MainQuest);
        self.count_completion();
        self.state.stats.main_quests_completed += 1;

        let cooldown_until = self.now + MAIN_QUEST_COOLDOWN;
        self.state.main_quest_cooldown = Some(cooldown_until);
        self.state.main_quest_history.push(MainQuestRecord {
            id: format!("mq-{}", uuid::Uuid::new_v4()),
            quest_id: quest.id.clone(),
            text: quest.text,
            objectives: quest.objectives,
            completed_at: self.now,
            xp_earned: earned,
        });

        self.emit(Event::QuestCompleted {
            category: QuestCategory::Main,
            id: quest.id.clone(),
            at: self.now,
        });
        self.emit(Event::MainQuestFinalized {
            id: quest.id,
            cooldown_until,
            at: self.now,
        });
        Ok(())
    }

    fn edit_main_quest(&mut self, text: &str, objectives: &[String]) -> Result<(), EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InvalidState::InvalidDefinition("main quest text is empty".into()).into());
        }
        let objectives = clean_objectives(objectives)?;
        let quest = self
            .state
            .main_quest
            .as_mut()
            .ok_or(InvalidState::NoMainQuest)?;

        let mut previous = std::mem::take(&mut quest.objectives);
        quest.objectives = objectives
            .into_iter()
            .map(|new_text| match previous.iter().position(|o| o.text == new_text) {
                Some(pos) => previous.remove(pos),
                None => Objective::new(new_text),
            })
            .collect();
        quest.text = text.to_string();
        let id = quest.id.clone();

        self.emit(Event::MainQuestEdited { id, at: self.now });
        Ok(())
    }

    fn abandon_main_quest(&mut self) -> Result<(), EngineError> {
        let quest = self
            .state
            .main_quest
            .take()
            .ok_or(InvalidState::NoMainQuest)?;
        tracing::info!(quest = %quest.id, "main quest abandoned");
        self.emit(Event::MainQuestAbandoned {
            id: quest.id,
            at: self.now,
        });
        Ok(())
    }
}
