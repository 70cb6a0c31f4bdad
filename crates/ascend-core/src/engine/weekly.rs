//! Weekly quest transitions: one progress step per quest per calendar day.

use chrono::{DateTime, Utc};

use super::{Engine, Settlement, Transition};
use crate::error::{EngineError, InvalidState, Rejection};
use crate::events::{Event, StreakScope, XpSource};
use crate::quest::QuestCategory;
use crate::state::PlayerState;

/// Bonus granted once per week when every weekly quest reaches its target.
pub const WEEKLY_BONUS_XP: u64 = 10;

impl Engine {
    /// Log one unit of progress on a weekly quest.
    ///
    /// A second attempt on the same calendar day is rejected. Reaching the
    /// target on the last open weekly quest pays the weekly bonus and
    /// advances the weekly streak.
    pub fn progress_weekly(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "progress_weekly", |s| s.progress_weekly(id))
    }
}

impl Settlement {
    fn progress_weekly(&mut self, id: &str) -> Result<(), EngineError> {
        let idx = self
            .state
            .weekly_quests
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| self.unknown(QuestCategory::Weekly, id))?;

        let quest = &self.state.weekly_quests[idx];
        if quest.is_complete() {
            return Err(InvalidState::AlreadyCompleted(id.to_string()).into());
        }
        if let Some(last) = quest.last_progress_at {
            if self.cal.same_day(last, self.now) {
                return Err(Rejection::AlreadyProgressedToday.into());
            }
        }
        let xp = quest.xp_per_increment;
        let text = quest.text.clone();

        let quest = &mut self.state.weekly_quests[idx];
        quest.current += 1;
        quest.last_progress_at = Some(self.now);
        let (current, target) = (quest.current, quest.target);

        self.grant_xp(xp, XpSource::WeeklyProgress);
        self.count_completion();
        let update = self.record_quest_streak(id, &text, false);
        self.award_milestones(Some(id), update.old_streak, update.new_streak);

        self.emit(Event::WeeklyProgressed {
            id: id.to_string(),
            current,
            target,
            at: self.now,
        });
        if current >= target {
            self.emit(Event::QuestCompleted {
                category: QuestCategory::Weekly,
                id: id.to_string(),
                at: self.now,
            });
            self.settle_weekly_bonus();
        }
        Ok(())
    }

    fn settle_weekly_bonus(&mut self) {
        let week = self.cal.weekly_period(self.now);
        let all_done = self.state.weekly_quests.iter().all(|q| q.is_complete());
        if !all_done || self.state.weekly_bonus_claimed == Some(week) {
            return;
        }
        self.state.weekly_bonus_claimed = Some(week);
        self.emit(Event::WeeklyAllComplete { at: self.now });
        self.grant_xp(WEEKLY_BONUS_XP, XpSource::WeeklyBonus);

        let old = self.state.weekly_streak;
        let new = old + 1;
        self.state.weekly_streak = new;
        self.state.longest_weekly_streak = self.state.longest_weekly_streak.max(new);
        self.emit(Event::StreakUpdated {
            scope: StreakScope::Weekly,
            quest_id: None,
            old_streak: old,
            new_streak: new,
            at: self.now,
        });
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use crate::clock::DayCalendar;
    use crate::engine::Engine;
    use crate::quest::QuestDraft;
    use crate::state::PlayerState;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn setup(target: u32, now: DateTime<Utc>) -> (Engine, PlayerState) {
        let engine = Engine::new(DayCalendar::utc());
        let state = engine
            .create_quest(&PlayerState::new(), QuestDraft::weekly("Gym", target).with_id("w1"), now)
            .unwrap()
            .state;
        (engine, state)
    }

    #[test]
    fn second_progress_same_day_is_rejected() {
        let monday = at("2024-03-04T08:00:00Z");
        let (engine, state) = setup(3, monday);
        let state = engine.progress_weekly(&state, "w1", monday).unwrap().state;

        let err = engine
            .progress_weekly(&state, "w1", monday + Duration::hours(10))
            .unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.code(), "already_progressed_today");
        assert_eq!(state.weekly("w1").unwrap().current, 1);
    }

    #[test]
    fn reaching_every_target_pays_bonus_once() {
        let monday = at("2024-03-04T08:00:00Z");
        let (engine, state) = setup(2, monday);
        let state = engine.progress_weekly(&state, "w1", monday).unwrap().state;
        let t = engine
            .progress_weekly(&state, "w1", monday + Duration::days(1))
            .unwrap();
        assert!(t.has_event("WeeklyAllComplete"));
        assert_eq!(t.state.weekly_streak, 1);
        // 5 + 5 per step, 10 bonus
        assert_eq!(t.state.xp, 20);

        let err = engine
            .progress_weekly(&t.state, "w1", monday + Duration::days(2))
            .unwrap_err();
        assert_eq!(err.code(), "already_completed");
    }

    #[test]
    fn weekly_streak_survives_a_completed_week() {
        let monday = at("2024-03-04T08:00:00Z");
        let (engine, state) = setup(1, monday);
        let state = engine.progress_weekly(&state, "w1", monday).unwrap().state;
        assert_eq!(state.weekly_streak, 1);

        let next_week = engine.catch_up(&state, monday + Duration::days(7)).state;
        assert_eq!(next_week.weekly_streak, 1);
        assert_eq!(next_week.weekly("w1").unwrap().current, 0);

        // Skipping the whole next week breaks it.
        let later = engine.catch_up(&next_week, monday + Duration::days(14));
        assert_eq!(later.state.weekly_streak, 0);
        assert!(later.has_event("StreakBroken"));
    }
}
