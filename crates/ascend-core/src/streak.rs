//! Per-quest streak ledger and milestone rewards.
//!
//! A quest's streak counts consecutive calendar days on which it was
//! completed. Repeated completions on the same day only bump the completion
//! total. A new day continues the streak when the previous completion is at
//! most [`STREAK_GRACE`] old (24h nominal + 24h grace); otherwise the streak
//! restarts at 1.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::DayCalendar;

/// Maximum gap between completions on different days that keeps a streak alive.
pub const STREAK_GRACE: Duration = Duration::hours(48);

/// Milestone streak lengths, ascending.
pub const STREAK_MILESTONES: [u32; 6] = [3, 7, 14, 30, 60, 100];

/// Streak state for a single quest identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    pub quest_id: String,
    pub quest_text: String,
    pub streak: u32,
    pub last_completed: Option<DateTime<Utc>>,
    pub total_completions: u32,
}

impl StreakRecord {
    /// Milestones already reached by the current streak.
    pub fn milestones_reached(&self) -> Vec<u32> {
        STREAK_MILESTONES
            .iter()
            .copied()
            .filter(|m| *m <= self.streak)
            .collect()
    }
}

/// How a completion affected a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuity {
    /// First ever completion of this quest.
    Started,
    /// Another completion on the same calendar day.
    SameDay,
    /// New day within the grace window.
    Continued,
    /// New day after the grace window lapsed (or after an explicit reset).
    Restarted,
}

/// Outcome of recording a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub old_streak: u32,
    pub new_streak: u32,
    pub continuity: Continuity,
}

/// Mapping from quest identifier to its streak record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreakLedger {
    records: BTreeMap<String, StreakRecord>,
}

impl StreakLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, quest_id: &str) -> Option<&StreakRecord> {
        self.records.get(quest_id)
    }

    pub fn streak_of(&self, quest_id: &str) -> u32 {
        self.get(quest_id).map(|r| r.streak).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreakRecord> {
        self.records.values()
    }

    /// Whether completing `quest_id` at `now` would restart its streak because
    /// the grace window lapsed.
    pub fn would_break(&self, quest_id: &str, now: DateTime<Utc>, cal: &DayCalendar) -> bool {
        match self.get(quest_id) {
            Some(record) => match record.last_completed {
                Some(last) => {
                    record.streak > 0 && !cal.same_day(last, now) && now - last > STREAK_GRACE
                }
                None => false,
            },
            None => false,
        }
    }

    /// Record a completion using the standard grace window.
    pub fn record_completion(
        &mut self,
        quest_id: &str,
        quest_text: &str,
        now: DateTime<Utc>,
        cal: &DayCalendar,
    ) -> StreakUpdate {
        self.record_completion_within(quest_id, quest_text, now, cal, STREAK_GRACE)
    }

    /// Record a completion, continuing the streak if the gap since the last
    /// completion is at most `tolerance`.
    pub fn record_completion_within(
        &mut self,
        quest_id: &str,
        quest_text: &str,
        now: DateTime<Utc>,
        cal: &DayCalendar,
        tolerance: Duration,
    ) -> StreakUpdate {
        let Some(record) = self.records.get_mut(quest_id) else {
            self.records.insert(
                quest_id.to_string(),
                StreakRecord {
                    quest_id: quest_id.to_string(),
                    quest_text: quest_text.to_string(),
                    streak: 1,
                    last_completed: Some(now),
                    total_completions: 1,
                },
            );
            return StreakUpdate {
                old_streak: 0,
                new_streak: 1,
                continuity: Continuity::Started,
            };
        };

        let old_streak = record.streak;
        let (new_streak, continuity) = match record.last_completed {
            Some(last) if cal.same_day(last, now) => (old_streak.max(1), Continuity::SameDay),
            Some(last) if now - last <= tolerance && old_streak > 0 => {
                (old_streak + 1, Continuity::Continued)
            }
            _ => (1, Continuity::Restarted),
        };

        record.streak = new_streak;
        record.last_completed = Some(now);
        record.total_completions += 1;
        record.quest_text = quest_text.to_string();

        StreakUpdate {
            old_streak,
            new_streak,
            continuity,
        }
    }

    /// Immutable variant of [`record_completion`](Self::record_completion):
    /// returns an updated copy and leaves `self` untouched.
    pub fn updated(
        &self,
        quest_id: &str,
        quest_text: &str,
        now: DateTime<Utc>,
        cal: &DayCalendar,
    ) -> (Self, StreakUpdate) {
        let mut next = self.clone();
        let update = next.record_completion(quest_id, quest_text, now, cal);
        (next, update)
    }

    /// Break a quest's streak, keeping its completion history.
    pub fn reset_streak(&mut self, quest_id: &str) {
        if let Some(record) = self.records.get_mut(quest_id) {
            record.streak = 0;
            record.last_completed = None;
        }
    }

    /// Break every tracked streak.
    pub fn reset_all(&mut self) {
        for record in self.records.values_mut() {
            record.streak = 0;
            record.last_completed = None;
        }
    }

    /// Replace (or remove) a record wholesale. Used to roll back a completion.
    pub(crate) fn restore(&mut self, quest_id: &str, snapshot: Option<StreakRecord>) {
        match snapshot {
            Some(record) => {
                self.records.insert(quest_id.to_string(), record);
            }
            None => {
                self.records.remove(quest_id);
            }
        }
    }

    /// Records with a live streak, longest first.
    pub fn active_streaks(&self) -> Vec<&StreakRecord> {
        let mut active: Vec<_> = self.records.values().filter(|r| r.streak > 0).collect();
        active.sort_by(|a, b| b.streak.cmp(&a.streak).then_with(|| a.quest_id.cmp(&b.quest_id)));
        active
    }

    pub(crate) fn insert(&mut self, record: StreakRecord) {
        self.records.insert(record.quest_id.clone(), record);
    }
}

/// Reward granted when a streak first reaches a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneReward {
    pub milestone: u32,
    pub xp: u64,
    pub coins: u64,
    pub title: String,
    pub unlocks_special_avatar: bool,
}

/// Reward table entry for a milestone, `None` if `milestone` is not one.
pub fn milestone_reward(milestone: u32) -> Option<MilestoneReward> {
    let (xp, title) = match milestone {
        3 => (40, "3-Day Streak!"),
        7 => (100, "Week Warrior!"),
        14 => (200, "2-Week Champion!"),
        30 => (400, "Monthly Master!"),
        60 => (1000, "60-Day Legend!"),
        100 => (2000, "100-Day Titan!"),
        _ => return None,
    };
    Some(MilestoneReward {
        milestone,
        xp,
        coins: 5,
        title: title.to_string(),
        unlocks_special_avatar: milestone == 100,
    })
}

/// Every milestone crossed going from `old_streak` to `new_streak`, ascending.
pub fn check_milestones(old_streak: u32, new_streak: u32) -> Vec<MilestoneReward> {
    STREAK_MILESTONES
        .iter()
        .copied()
        .filter(|m| old_streak < *m && *m <= new_streak)
        .filter_map(milestone_reward)
        .collect()
}

/// Position of a streak between milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    pub current: u32,
    pub next: u32,
    pub previous: u32,
    pub completed: Vec<u32>,
}

pub fn milestone_progress(streak: u32) -> MilestoneProgress {
    let last = STREAK_MILESTONES[STREAK_MILESTONES.len() - 1];
    MilestoneProgress {
        current: streak,
        next: STREAK_MILESTONES
            .iter()
            .copied()
            .find(|m| *m > streak)
            .unwrap_or(last),
        previous: STREAK_MILESTONES
            .iter()
            .copied()
            .filter(|m| *m <= streak)
            .last()
            .unwrap_or(0),
        completed: STREAK_MILESTONES
            .iter()
            .copied()
            .filter(|m| *m <= streak)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn first_completion_starts_streak() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        let update = ledger.record_completion("q1", "Read", at("2024-03-01T09:00:00Z"), &cal);
        assert_eq!(update.continuity, Continuity::Started);
        assert_eq!(update.new_streak, 1);
        let record = ledger.get("q1").unwrap();
        assert_eq!(record.total_completions, 1);
    }

    #[test]
    fn same_day_does_not_inflate_streak() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("q1", "Read", at("2024-03-01T09:00:00Z"), &cal);
        let update = ledger.record_completion("q1", "Read", at("2024-03-01T21:00:00Z"), &cal);
        assert_eq!(update.continuity, Continuity::SameDay);
        assert_eq!(update.new_streak, 1);
        assert_eq!(ledger.get("q1").unwrap().total_completions, 2);
    }

    #[test]
    fn late_then_early_keeps_continuity() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("q1", "Read", at("2024-03-01T23:30:00Z"), &cal);
        let update = ledger.record_completion("q1", "Read", at("2024-03-02T06:00:00Z"), &cal);
        assert_eq!(update.continuity, Continuity::Continued);
        assert_eq!(update.new_streak, 2);
    }

    #[test]
    fn skipped_day_inside_grace_still_continues() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("q1", "Read", at("2024-03-01T20:00:00Z"), &cal);
        // 46 hours later, two calendar days on
        let update = ledger.record_completion("q1", "Read", at("2024-03-03T18:00:00Z"), &cal);
        assert_eq!(update.new_streak, 2);
    }

    #[test]
    fn gap_over_48h_restarts() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("q1", "Read", at("2024-03-01T08:00:00Z"), &cal);
        ledger.record_completion("q1", "Read", at("2024-03-02T08:00:00Z"), &cal);
        assert!(ledger.would_break("q1", at("2024-03-04T09:00:00Z"), &cal));
        let update = ledger.record_completion("q1", "Read", at("2024-03-04T09:00:00Z"), &cal);
        assert_eq!(update.old_streak, 2);
        assert_eq!(update.new_streak, 1);
        assert_eq!(update.continuity, Continuity::Restarted);
        assert_eq!(ledger.get("q1").unwrap().total_completions, 3);
    }

    #[test]
    fn text_is_refreshed() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("q1", "Read", at("2024-03-01T08:00:00Z"), &cal);
        ledger.record_completion("q1", "Read 20 pages", at("2024-03-02T08:00:00Z"), &cal);
        assert_eq!(ledger.get("q1").unwrap().quest_text, "Read 20 pages");
    }

    #[test]
    fn updated_leaves_original_untouched() {
        let cal = DayCalendar::utc();
        let ledger = StreakLedger::new();
        let (next, _) = ledger.updated("q1", "Read", at("2024-03-01T08:00:00Z"), &cal);
        assert!(ledger.is_empty());
        assert_eq!(next.streak_of("q1"), 1);
    }

    #[test]
    fn reset_keeps_history() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("q1", "Read", at("2024-03-01T08:00:00Z"), &cal);
        ledger.record_completion("q1", "Read", at("2024-03-02T08:00:00Z"), &cal);
        ledger.reset_streak("q1");
        let record = ledger.get("q1").unwrap();
        assert_eq!(record.streak, 0);
        assert_eq!(record.last_completed, None);
        assert_eq!(record.total_completions, 2);

        // Completing after a reset starts over at 1.
        let update = ledger.record_completion("q1", "Read", at("2024-03-02T09:00:00Z"), &cal);
        assert_eq!(update.new_streak, 1);
        assert_eq!(update.continuity, Continuity::Restarted);
    }

    #[test]
    fn milestones_between() {
        assert!(check_milestones(7, 7).is_empty());
        let hits: Vec<u32> = check_milestones(2, 8).iter().map(|m| m.milestone).collect();
        assert_eq!(hits, vec![3, 7]);
        let all: Vec<u32> = check_milestones(0, 100).iter().map(|m| m.milestone).collect();
        assert_eq!(all, STREAK_MILESTONES.to_vec());
    }

    #[test]
    fn only_hundred_day_unlocks_avatar() {
        let rewards = check_milestones(0, 100);
        let unlocking: Vec<u32> = rewards
            .iter()
            .filter(|r| r.unlocks_special_avatar)
            .map(|r| r.milestone)
            .collect();
        assert_eq!(unlocking, vec![100]);
        assert_eq!(milestone_reward(3).unwrap().xp, 40);
        assert_eq!(milestone_reward(4), None);
    }

    #[test]
    fn active_streaks_sorted_desc() {
        let cal = DayCalendar::utc();
        let mut ledger = StreakLedger::new();
        ledger.record_completion("a", "A", at("2024-03-01T08:00:00Z"), &cal);
        ledger.record_completion("b", "B", at("2024-03-01T08:00:00Z"), &cal);
        ledger.record_completion("b", "B", at("2024-03-02T08:00:00Z"), &cal);
        ledger.record_completion("c", "C", at("2024-03-01T08:00:00Z"), &cal);
        ledger.reset_streak("c");
        let ids: Vec<&str> = ledger.active_streaks().iter().map(|r| r.quest_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn progress_between_milestones() {
        let p = milestone_progress(8);
        assert_eq!(p.previous, 7);
        assert_eq!(p.next, 14);
        assert_eq!(p.completed, vec![3, 7]);
        assert_eq!(milestone_progress(150).next, 100);
        assert_eq!(milestone_progress(0).previous, 0);
    }
}
