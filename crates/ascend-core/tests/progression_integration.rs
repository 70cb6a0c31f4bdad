//! End-to-end progression scenarios driven through the public engine API.

use ascend_core::{
    DayCalendar, EffectKind, Engine, Event, ItemKind, PlayerState, QuestDraft, StateStore,
    StreakMode, XpSource,
};
use chrono::{DateTime, Duration, Utc};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn engine() -> Engine {
    Engine::new(DayCalendar::utc())
}

fn create(state: &PlayerState, draft: QuestDraft, now: DateTime<Utc>) -> PlayerState {
    engine().create_quest(state, draft, now).unwrap().state
}

#[test]
fn test_hundred_xp_reaches_level_two() {
    let now = at("2024-03-04T10:00:00Z");
    let state = create(&PlayerState::new(), QuestDraft::side("Big task", 100).with_id("s1"), now);

    let t = engine().complete_side(&state, "s1", now).unwrap();
    assert_eq!(t.state.xp, 100);
    assert_eq!(t.state.level, 2);
    assert_eq!(t.state.progress().progress_percent, 0.0);

    let level_up = t.events.iter().find_map(|e| match e {
        Event::LevelUp {
            old_level,
            new_level,
            levels_gained,
            ..
        } => Some((*old_level, *new_level, *levels_gained)),
        _ => None,
    });
    assert_eq!(level_up, Some((1, 2, 1)));
}

#[test]
fn test_daily_complete_then_undo_restores_totals() {
    let now = at("2024-03-04T10:00:00Z");
    let state = create(&PlayerState::new(), QuestDraft::daily("Stretch", 5).with_id("d1"), now);
    let before_xp = state.xp;
    let before_completed = state.stats.total_quests_completed;

    let done = engine().complete_daily(&state, "d1", now).unwrap().state;
    assert_eq!(done.xp, before_xp + 5);

    let undone = engine()
        .undo_daily(&done, "d1", now + Duration::minutes(4))
        .unwrap()
        .state;
    assert_eq!(undone.xp, before_xp);
    assert_eq!(undone.stats.total_quests_completed, before_completed);
    assert!(!undone.daily("d1").unwrap().completed);
}

#[test]
fn test_multiplier_doubles_grant_and_cannot_stack() {
    let now = at("2024-03-04T10:00:00Z");
    let mut state = create(&PlayerState::new(), QuestDraft::side("Deep work", 50).with_id("s1"), now);
    state.coins = 200;
    let state = engine().purchase(&state, "xp_multiplier", now).unwrap().state;
    let state = engine().purchase(&state, "xp_multiplier", now).unwrap().state;
    let state = engine().use_item(&state, ItemKind::XpMultiplier, now).unwrap().state;
    assert_eq!(engine().current_multiplier(&state, now), 2);

    let t = engine().complete_side(&state, "s1", now).unwrap();
    let granted: u64 = t
        .events
        .iter()
        .filter_map(|e| match e {
            Event::XpGained {
                amount,
                source: XpSource::SideQuest,
                ..
            } => Some(*amount),
            _ => None,
        })
        .sum();
    assert_eq!(granted, 100);

    let err = engine()
        .use_item(&t.state, ItemKind::XpMultiplier, now + Duration::minutes(1))
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.code(), "effect_already_active");
    // The rejected use leaves the spare item in the inventory.
    assert_eq!(t.state.inventory_count(ItemKind::XpMultiplier), 1);
}

#[test]
fn test_four_consecutive_days_fire_three_day_milestone_once() {
    let day1 = at("2024-03-04T20:00:00Z");
    let mut state = create(&PlayerState::new(), QuestDraft::daily("Journal", 10).with_id("d1"), day1);
    state.streak_mode = StreakMode::PerQuest;

    let mut all_events = Vec::new();
    for day in 0..4 {
        let now = day1 + Duration::days(day);
        let t = engine().complete_daily(&state, "d1", now).unwrap();
        all_events.extend(t.events);
        state = t.state;
    }

    assert_eq!(state.quest_streaks.streak_of("d1"), 4);
    let three_day = all_events
        .iter()
        .filter(|e| matches!(e, Event::MilestoneReached { milestone: 3, .. }))
        .count();
    assert_eq!(three_day, 1);
}

#[test]
fn test_multiplied_completion_undo_refunds_base_only() {
    let now = at("2024-03-04T10:00:00Z");
    let mut state = create(&PlayerState::new(), QuestDraft::daily("Read", 10).with_id("d1"), now);
    state.active_effects.activate(EffectKind::XpMultiplier, now);

    let done = engine().complete_daily(&state, "d1", now).unwrap().state;
    assert_eq!(done.xp, 20);

    let undone = engine()
        .undo_daily(&done, "d1", now + Duration::minutes(1))
        .unwrap()
        .state;
    assert_eq!(undone.xp, 10, "net change over complete+undo is the base amount");
}

#[test]
fn test_weekly_second_progress_same_day_is_rejected() {
    let now = at("2024-03-05T07:00:00Z");
    let state = create(&PlayerState::new(), QuestDraft::weekly("Swim", 3).with_id("w1"), now);
    let state = engine().progress_weekly(&state, "w1", now).unwrap().state;

    assert!(!engine().can_progress_weekly(&state, "w1", now + Duration::hours(3)));
    let err = engine()
        .progress_weekly(&state, "w1", now + Duration::hours(3))
        .unwrap_err();
    assert_eq!(err.code(), "already_progressed_today");
    assert_eq!(state.weekly("w1").unwrap().current, 1);

    // The rejection converts into the event the presentation layer consumes.
    let event = err.to_event(now);
    assert_eq!(event.kind(), "OperationRejected");
}

#[test]
fn test_achievement_sweep_is_idempotent() {
    let now = at("2024-03-04T10:00:00Z");
    let state = create(&PlayerState::new(), QuestDraft::side("First", 5).with_id("s1"), now);
    let t = engine().complete_side(&state, "s1", now).unwrap();
    assert!(t.state.unlocked_achievements.contains("first_steps"));

    let again = engine().catch_up(&t.state, now + Duration::seconds(1));
    assert!(!again.has_event("AchievementUnlocked"));
}

#[test]
fn test_week_of_play_survives_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("player.json"));
    let monday = at("2024-03-04T09:00:00Z");

    let mut state = store.load().unwrap();
    state = create(&state, QuestDraft::daily("Walk", 5).with_id("d1"), monday);
    state = create(&state, QuestDraft::weekly("Gym", 2).with_id("w1"), monday);
    store.save(&state).unwrap();

    for day in 0..7 {
        let now = monday + Duration::days(day);
        let mut state = store.load().unwrap();
        state = engine().complete_daily(&state, "d1", now).unwrap().state;
        if day < 2 {
            state = engine().progress_weekly(&state, "w1", now).unwrap().state;
        }
        store.save(&state).unwrap();
    }

    let state = store.load().unwrap();
    assert_eq!(state.daily_streak, 7);
    assert_eq!(state.weekly_streak, 1);
    assert!(state.unlocked_achievements.contains("week_warrior"));
    // 7 daily completions plus 2 weekly increments.
    assert_eq!(state.stats.total_quests_completed, 9);
}
