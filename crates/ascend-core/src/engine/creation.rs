//! Quest creation and deletion.
//!
//! After the tutorial, creation is rate limited per local calendar day:
//! [`DAILY_CREATION_LIMIT`] daily quests and [`WEEKLY_CREATION_LIMIT`] weekly
//! quests. Main quests are limited by the singleton slot and the cooldown
//! instead.

use chrono::{DateTime, Utc};

use super::{Engine, Settlement, Transition};
use crate::catalog::template_for;
use crate::error::{EngineError, InvalidState, Rejection};
use crate::events::Event;
use crate::quest::{
    new_quest_id, DailyQuest, MainQuest, Objective, QuestCategory, QuestDraft, SideQuest,
    WeeklyQuest, MAIN_QUEST_BONUS_XP,
};
use crate::state::PlayerState;

pub const DAILY_CREATION_LIMIT: u32 = 2;
pub const WEEKLY_CREATION_LIMIT: u32 = 1;

impl Engine {
    /// Add a quest from a caller-supplied definition. Returns the new quest's
    /// id in the `QuestCreated` event.
    pub fn create_quest(
        &self,
        state: &PlayerState,
        draft: QuestDraft,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "create_quest", |s| s.create_quest(draft))
    }

    /// Remove a daily, weekly, or side quest. Nothing is refunded.
    pub fn delete_quest(
        &self,
        state: &PlayerState,
        category: QuestCategory,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "delete_quest", |s| s.delete_quest(category, id))
    }

    /// Creations of `category` still allowed today, `None` when unlimited.
    pub fn creations_left(
        &self,
        state: &PlayerState,
        category: QuestCategory,
        now: DateTime<Utc>,
    ) -> Option<u32> {
        if !state.tutorial_completed {
            return None;
        }
        let today = self.calendar().local_date(now);
        match category {
            QuestCategory::Daily => {
                Some(DAILY_CREATION_LIMIT.saturating_sub(state.daily_creation.count_on(today)))
            }
            QuestCategory::Weekly => {
                Some(WEEKLY_CREATION_LIMIT.saturating_sub(state.weekly_creation.count_on(today)))
            }
            QuestCategory::Main | QuestCategory::Side => None,
        }
    }
}

fn resolve_id(id: Option<String>, prefix: &str) -> String {
    match id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => new_quest_id(prefix),
    }
}

fn require_text(text: &str) -> Result<String, InvalidState> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InvalidState::InvalidDefinition("quest text is empty".into()));
    }
    Ok(text.to_string())
}

impl Settlement {
    fn id_taken(&self, category: QuestCategory, id: &str) -> bool {
        self.state.find_quest(category, id).is_some()
    }

    fn create_quest(&mut self, draft: QuestDraft) -> Result<(), EngineError> {
        let category = draft.category();
        let today = self.cal.local_date(self.now);

        let id = match draft {
            QuestDraft::Main {
                id,
                text,
                objectives,
            } => {
                if self.state.main_quest.is_some() {
                    return Err(Rejection::MainQuestActive.into());
                }
                if let Some(until) = self.state.main_quest_cooldown {
                    if self.now < until {
                        return Err(Rejection::MainQuestCooldown { until }.into());
                    }
                }
                let text = require_text(&text)?;
                let objectives = super::main_quest::clean_objectives(&objectives)?;
                let id = resolve_id(id, "main");
                self.state.main_quest = Some(MainQuest {
                    id: id.clone(),
                    text,
                    objectives: objectives.into_iter().map(Objective::new).collect(),
                    xp: MAIN_QUEST_BONUS_XP,
                    created_at: Some(self.now),
                });
                self.emit(Event::MainQuestSet {
                    id: id.clone(),
                    at: self.now,
                });
                id
            }
            QuestDraft::Daily {
                id,
                text,
                xp,
                category: area,
            } => {
                self.check_limit(category, today)?;
                let text = require_text(&text)?;
                let area = area
                    .map(|a| a.trim().to_lowercase())
                    .filter(|a| !a.is_empty())
                    .or_else(|| template_for(&text).map(|t| t.category.to_string()));
                let id = resolve_id(id, "daily");
                if self.id_taken(category, &id) {
                    return Err(InvalidState::InvalidDefinition(format!("duplicate id '{id}'")).into());
                }
                self.state.daily_quests.push(DailyQuest {
                    id: id.clone(),
                    text,
                    xp,
                    completed: false,
                    completed_at: None,
                    base_xp: None,
                    total_xp: None,
                    multiplier_applied: None,
                    receipt: None,
                    category: area,
                });
                if self.state.tutorial_completed {
                    self.state.daily_creation.record(today);
                }
                id
            }
            QuestDraft::Weekly {
                id,
                text,
                target,
                xp_per_increment,
            } => {
                self.check_limit(category, today)?;
                let text = require_text(&text)?;
                if target == 0 {
                    return Err(InvalidState::InvalidDefinition("weekly target must be at least 1".into()).into());
                }
                let id = resolve_id(id, "weekly");
                if self.id_taken(category, &id) {
                    return Err(InvalidState::InvalidDefinition(format!("duplicate id '{id}'")).into());
                }
                self.state.weekly_quests.push(WeeklyQuest {
                    id: id.clone(),
                    text,
                    current: 0,
                    target,
                    xp_per_increment,
                    last_progress_at: None,
                });
                if self.state.tutorial_completed {
                    self.state.weekly_creation.record(today);
                }
                id
            }
            QuestDraft::Side { id, text, xp } => {
                let text = require_text(&text)?;
                let id = resolve_id(id, "side");
                if self.id_taken(category, &id) {
                    return Err(InvalidState::InvalidDefinition(format!("duplicate id '{id}'")).into());
                }
                self.state.side_quests.push(SideQuest {
                    id: id.clone(),
                    text,
                    xp,
                    completed: false,
                    completed_at: None,
                    xp_granted: None,
                    receipt: None,
                });
                id
            }
        };

        self.emit(Event::QuestCreated {
            category,
            id,
            at: self.now,
        });
        Ok(())
    }

    fn check_limit(&self, category: QuestCategory, today: chrono::NaiveDate) -> Result<(), Rejection> {
        if !self.state.tutorial_completed {
            return Ok(());
        }
        let (counter, limit) = match category {
            QuestCategory::Daily => (&self.state.daily_creation, DAILY_CREATION_LIMIT),
            QuestCategory::Weekly => (&self.state.weekly_creation, WEEKLY_CREATION_LIMIT),
            QuestCategory::Main | QuestCategory::Side => return Ok(()),
        };
        if counter.count_on(today) >= limit {
            return Err(Rejection::CreationLimitReached { category, limit });
        }
        Ok(())
    }

    fn delete_quest(&mut self, category: QuestCategory, id: &str) -> Result<(), EngineError> {
        let removed = match category {
            QuestCategory::Daily => {
                let n = self.state.daily_quests.len();
                self.state.daily_quests.retain(|q| q.id != id);
                n != self.state.daily_quests.len()
            }
            QuestCategory::Weekly => {
                let n = self.state.weekly_quests.len();
                self.state.weekly_quests.retain(|q| q.id != id);
                n != self.state.weekly_quests.len()
            }
            QuestCategory::Side => {
                let n = self.state.side_quests.len();
                self.state.side_quests.retain(|q| q.id != id);
                n != self.state.side_quests.len()
            }
            QuestCategory::Main => {
                return Err(InvalidState::InvalidDefinition(
                    "main quests are abandoned, not deleted".into(),
                )
                .into())
            }
        };
        if !removed {
            return Err(self.unknown(category, id));
        }
        self.emit(Event::QuestDeleted {
            category,
            id: id.to_string(),
            at: self.now,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::clock::DayCalendar;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn engine() -> Engine {
        Engine::new(DayCalendar::utc())
    }

    #[test]
    fn limits_apply_only_after_tutorial() {
        let now = at("2024-03-04T10:00:00Z");
        let mut state = PlayerState::new();
        for i in 0..5 {
            state = engine()
                .create_quest(&state, QuestDraft::daily(format!("Task {i}"), 5), now)
                .unwrap()
                .state;
        }
        assert_eq!(state.daily_quests.len(), 5);
        assert_eq!(engine().creations_left(&state, QuestCategory::Daily, now), None);
    }

    #[test]
    fn third_daily_creation_is_rejected_without_mutation() {
        let now = at("2024-03-04T10:00:00Z");
        let mut state = PlayerState::new();
        state.tutorial_completed = true;
        for i in 0..2 {
            state = engine()
                .create_quest(&state, QuestDraft::daily(format!("Task {i}"), 5), now)
                .unwrap()
                .state;
        }
        let before = state.clone();
        let err = engine()
            .create_quest(&state, QuestDraft::daily("One more", 5), now)
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.code(), "creation_limit_reached");
        assert_eq!(state, before);

        // Counter resets on the next calendar day.
        let tomorrow = now + Duration::days(1);
        assert_eq!(engine().creations_left(&state, QuestCategory::Daily, tomorrow), Some(2));
        assert!(engine()
            .create_quest(&state, QuestDraft::daily("One more", 5), tomorrow)
            .is_ok());
    }

    #[test]
    fn one_weekly_per_day() {
        let now = at("2024-03-04T10:00:00Z");
        let mut state = PlayerState::new();
        state.tutorial_completed = true;
        let state = engine()
            .create_quest(&state, QuestDraft::weekly("Gym", 3), now)
            .unwrap()
            .state;
        let err = engine()
            .create_quest(&state, QuestDraft::weekly("Swim", 2), now)
            .unwrap_err();
        assert_eq!(err.code(), "creation_limit_reached");
    }

    #[test]
    fn second_main_quest_is_rejected_while_active() {
        let now = at("2024-03-04T10:00:00Z");
        let state = engine()
            .create_quest(&PlayerState::new(), QuestDraft::main("A", ["x", "y", "z"]), now)
            .unwrap()
            .state;
        let err = engine()
            .create_quest(&state, QuestDraft::main("B", ["u", "v", "w"]), now)
            .unwrap_err();
        assert_eq!(err.code(), "main_quest_active");
    }

    #[test]
    fn daily_area_comes_from_draft_or_template() {
        let now = at("2024-03-04T10:00:00Z");
        let template = crate::catalog::template_for("Plan tomorrow").unwrap();
        let state = engine()
            .create_quest(&PlayerState::new(), QuestDraft::from_template(template).with_id("d1"), now)
            .unwrap()
            .state;
        let state = engine()
            .create_quest(&state, QuestDraft::daily("meditate 10 MIN", 5).with_id("d2"), now)
            .unwrap()
            .state;
        let state = engine()
            .create_quest(&state, QuestDraft::daily("Water plants", 5).with_id("d3"), now)
            .unwrap()
            .state;
        assert_eq!(state.daily("d1").unwrap().category.as_deref(), Some("work"));
        assert_eq!(state.daily("d2").unwrap().category.as_deref(), Some("health"));
        assert_eq!(state.daily("d3").unwrap().category, None);
    }

    #[test]
    fn main_quest_needs_three_non_blank_objectives() {
        let now = at("2024-03-04T10:00:00Z");
        let err = engine()
            .create_quest(&PlayerState::new(), QuestDraft::main("Empty", Vec::<String>::new()), now)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_definition");

        let err = engine()
            .create_quest(&PlayerState::new(), QuestDraft::main("Two", ["a", " ", "b"]), now)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_definition");

        let t = engine()
            .create_quest(&PlayerState::new(), QuestDraft::main("Three", [" a ", "b", "c"]), now)
            .unwrap();
        let quest = t.state.main_quest.unwrap();
        assert_eq!(quest.objectives.len(), 3);
        assert_eq!(quest.objectives[0].text, "a");
    }

    #[test]
    fn empty_text_is_invalid() {
        let now = at("2024-03-04T10:00:00Z");
        let err = engine()
            .create_quest(&PlayerState::new(), QuestDraft::side("   ", 5), now)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_definition");
    }

    #[test]
    fn delete_removes_quest() {
        let now = at("2024-03-04T10:00:00Z");
        let state = engine()
            .create_quest(&PlayerState::new(), QuestDraft::daily("Walk", 5).with_id("d1"), now)
            .unwrap()
            .state;
        let t = engine()
            .delete_quest(&state, QuestCategory::Daily, "d1", now)
            .unwrap();
        assert!(t.state.daily_quests.is_empty());
        let err = engine()
            .delete_quest(&t.state, QuestCategory::Daily, "d1", now)
            .unwrap_err();
        assert_eq!(err.code(), "unknown_quest");
    }
}
