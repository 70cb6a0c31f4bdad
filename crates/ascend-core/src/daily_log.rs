//! Per-day activity summary.
//!
//! Every transition feeds its events into the log entry for the local day it
//! ran on: XP and coins net of refunds, completions per quest category, and
//! the net change of the global streaks. Entries older than
//! [`DAILY_LOG_RETENTION_DAYS`] are pruned at the daily rollover.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::events::{Event, StreakScope};
use crate::quest::QuestCategory;

pub const DAILY_LOG_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionCounts {
    pub daily: u32,
    pub weekly: u32,
    pub side: u32,
    pub main: u32,
}

impl CompletionCounts {
    fn slot(&mut self, category: QuestCategory) -> &mut u32 {
        match category {
            QuestCategory::Daily => &mut self.daily,
            QuestCategory::Weekly => &mut self.weekly,
            QuestCategory::Side => &mut self.side,
            QuestCategory::Main => &mut self.main,
        }
    }

    pub fn total(&self) -> u32 {
        self.daily + self.weekly + self.side + self.main
    }
}

/// Net streak movement over a day. Negative after a break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakChanges {
    pub daily: i64,
    pub weekly: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DayLog {
    pub xp: u64,
    pub coins: u64,
    pub completed: CompletionCounts,
    pub streak_changes: StreakChanges,
}

impl DayLog {
    /// Fold one event into the day's totals. Events without a bearing on the
    /// log are ignored.
    pub fn apply(&mut self, event: &Event) {
        match event {
            Event::XpGained { amount, .. } => self.xp = self.xp.saturating_add(*amount),
            Event::XpRefunded { amount, .. } => self.xp = self.xp.saturating_sub(*amount),
            Event::CoinsGained { amount, .. } => self.coins = self.coins.saturating_add(*amount),
            Event::QuestCompleted { category, .. } => {
                let slot = self.completed.slot(*category);
                *slot = slot.saturating_add(1);
            }
            Event::QuestUndone { category, .. } => {
                let slot = self.completed.slot(*category);
                *slot = slot.saturating_sub(1);
            }
            Event::StreakUpdated {
                scope,
                old_streak,
                new_streak,
                ..
            } => self.shift_streak(*scope, i64::from(*new_streak) - i64::from(*old_streak)),
            Event::StreakBroken { scope, previous, .. } => {
                self.shift_streak(*scope, -i64::from(*previous))
            }
            _ => {}
        }
    }

    fn shift_streak(&mut self, scope: StreakScope, delta: i64) {
        match scope {
            StreakScope::Daily => self.streak_changes.daily += delta,
            StreakScope::Weekly => self.streak_changes.weekly += delta,
            StreakScope::Quest => {}
        }
    }
}

/// Day logs keyed by local calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyLog {
    days: BTreeMap<NaiveDate, DayLog>,
}

impl DailyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `date`, zeroed when nothing happened that day.
    pub fn day(&self, date: NaiveDate) -> DayLog {
        self.days.get(&date).copied().unwrap_or_default()
    }

    /// Logged days, most recent first.
    pub fn recent(&self) -> impl Iterator<Item = (NaiveDate, &DayLog)> {
        self.days.iter().rev().map(|(date, log)| (*date, log))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub(crate) fn record(&mut self, date: NaiveDate, event: &Event) {
        self.days.entry(date).or_default().apply(event);
    }

    /// Revoked coins carry no event of their own.
    pub(crate) fn revoke_coins(&mut self, date: NaiveDate, amount: u64) {
        if let Some(day) = self.days.get_mut(&date) {
            day.coins = day.coins.saturating_sub(amount);
        }
    }

    /// Drop entries older than the retention window. Returns how many went.
    pub(crate) fn prune(&mut self, today: NaiveDate) -> usize {
        let cutoff = today - Duration::days(DAILY_LOG_RETENTION_DAYS);
        let before = self.days.len();
        self.days.retain(|date, _| *date >= cutoff);
        before - self.days.len()
    }
}
