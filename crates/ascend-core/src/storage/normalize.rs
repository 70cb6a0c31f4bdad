//! Player document normalization.
//!
//! Persisted player documents come from several generations of clients and
//! from a remote backend that nests some sections differently. Loading never
//! fails on shape: each rewrite below is applied in order to the raw JSON,
//! fields that still do not deserialize are dropped with a warning, and the
//! result is always a valid [`PlayerState`].
//!
//! Rewrites, in order:
//! 1. hoist `quests.{daily,weekly,main,side}` and `streaks.*` to the top level
//! 2. rename legacy keys (`achievements`, snake_case creation counters,
//!    `settings.individualDailyStreaks`, `settings.tutorialCompleted`)
//! 3. coerce keyed maps to sequences where sequences are expected
//! 4. coerce numeric strings, clamp negatives to zero
//! 5. give id-less quests positional ids, map legacy inventory ids to kinds
//! 6. rebuild the effect map and the streak ledger from legacy layouts
//! 7. drop single list elements that still do not deserialize

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::quest::{DailyQuest, MainQuestRecord, SideQuest, WeeklyQuest};
use crate::state::{InventoryItem, PlayerState, StreakMode};

/// Top-level fields that must be sequences.
const SEQUENCE_FIELDS: [&str; 8] = [
    "inventory",
    "dailyQuests",
    "weeklyQuests",
    "sideQuests",
    "mainQuestHistory",
    "unlockedAchievements",
    "unlockedAvatars",
    "usedPromoCodes",
];

/// Top-level unsigned counters.
const NUMERIC_FIELDS: [&str; 13] = [
    "level",
    "xp",
    "coins",
    "dailyStreak",
    "weeklyStreak",
    "longestDailyStreak",
    "longestWeeklyStreak",
    "totalXPEarned",
    "totalQuestsCompleted",
    "totalCoinsEarned",
    "totalCoinsSpent",
    "totalPurchases",
    "mainQuestsCompleted",
];

const QUEST_NUMERIC_FIELDS: [&str; 5] = ["xp", "current", "target", "xpPerIncrement", "baseXP"];

/// Build a valid [`PlayerState`] from any JSON value.
pub fn normalize_state(raw: Value) -> PlayerState {
    let Value::Object(mut doc) = raw else {
        tracing::warn!("player document is not an object; starting fresh");
        return PlayerState::new();
    };

    hoist_nested(&mut doc);
    rename_legacy_keys(&mut doc);
    for field in SEQUENCE_FIELDS {
        coerce_sequence(&mut doc, field);
    }
    for field in NUMERIC_FIELDS {
        coerce_unsigned(&mut doc, field);
    }
    for (field, prefix) in [
        ("dailyQuests", "daily"),
        ("weeklyQuests", "weekly"),
        ("sideQuests", "side"),
    ] {
        clean_quest_list(&mut doc, field, prefix);
    }
    clean_inventory(&mut doc);
    match doc.get_mut("mainQuest") {
        Some(Value::Object(main)) => {
            if let Some(objectives) = main.get_mut("objectives") {
                *objectives = into_sequence(objectives.take());
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            tracing::warn!("mainQuest is not an object; dropped");
            *other = Value::Null;
        }
    }
    rebuild_effects(&mut doc);
    rebuild_streak_ledger(&mut doc);
    fix_creation_dates(&mut doc);

    retain_valid::<DailyQuest>(&mut doc, "dailyQuests");
    retain_valid::<WeeklyQuest>(&mut doc, "weeklyQuests");
    retain_valid::<SideQuest>(&mut doc, "sideQuests");
    retain_valid::<InventoryItem>(&mut doc, "inventory");
    retain_valid::<MainQuestRecord>(&mut doc, "mainQuestHistory");

    let mut state = deserialize_lenient(doc);
    state.sync_level();
    state
}

fn hoist_nested(doc: &mut Map<String, Value>) {
    if let Some(Value::Object(quests)) = doc.remove("quests") {
        for (nested, flat) in [
            ("daily", "dailyQuests"),
            ("weekly", "weeklyQuests"),
            ("side", "sideQuests"),
            ("main", "mainQuest"),
        ] {
            if let Some(value) = quests.get(nested) {
                doc.insert(flat.to_string(), value.clone());
            }
        }
    }
    if let Some(Value::Object(streaks)) = doc.remove("streaks") {
        for key in ["dailyStreak", "weeklyStreak", "longestDailyStreak", "longestWeeklyStreak"] {
            if let Some(value) = streaks.get(key) {
                doc.insert(key.to_string(), value.clone());
            }
        }
    }
}

fn rename_legacy_keys(doc: &mut Map<String, Value>) {
    if !doc.contains_key("unlockedAchievements") {
        if let Some(achievements) = doc.remove("achievements") {
            doc.insert("unlockedAchievements".into(), achievements);
        }
    }

    for (legacy, current) in [
        ("daily_quest_creation", "dailyQuestCreation"),
        ("weekly_quest_creation", "weeklyQuestCreation"),
    ] {
        if let Some(value) = doc.remove(legacy) {
            doc.entry(current).or_insert(value);
        }
    }
    // Flat counters from older clients.
    for key in ["dailyQuestCreation", "weeklyQuestCreation"] {
        let count = doc.remove(&format!("{key}Count"));
        let date = doc.remove(&format!("{key}Date"));
        if let Some(count) = count {
            let mut counter = Map::new();
            counter.insert("count".into(), count);
            counter.insert("lastResetDate".into(), date.unwrap_or(Value::Null));
            doc.entry(key).or_insert(Value::Object(counter));
        }
    }
    for key in ["dailyQuestCreation", "weeklyQuestCreation"] {
        if let Some(Value::Object(counter)) = doc.get_mut(key) {
            if let Some(date) = counter.remove("last_reset_date") {
                counter.entry("lastResetDate").or_insert(date);
            }
            coerce_unsigned(counter, "count");
        }
    }

    if let Some(Value::Object(settings)) = doc.remove("settings") {
        if !doc.contains_key("streakMode") {
            if let Some(Value::Bool(per_quest)) = settings.get("individualDailyStreaks") {
                let mode = if *per_quest {
                    StreakMode::PerQuest
                } else {
                    StreakMode::Global
                };
                if let Ok(mode) = serde_json::to_value(mode) {
                    doc.insert("streakMode".into(), mode);
                }
            }
        }
        if settings.get("tutorialCompleted") == Some(&Value::Bool(true)) {
            doc.insert("tutorialCompleted".into(), Value::Bool(true));
        }
    }
}

fn into_sequence(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        Value::Object(map) => Value::Array(map.into_iter().map(|(_, v)| v).collect()),
        _ => Value::Array(Vec::new()),
    }
}

fn coerce_sequence(doc: &mut Map<String, Value>, field: &str) {
    let Some(value) = doc.remove(field) else {
        return;
    };
    match value {
        Value::Array(_) => {
            doc.insert(field.to_string(), value);
        }
        Value::Object(_) => {
            tracing::warn!(field, "keyed map where a sequence was expected; using its values");
            doc.insert(field.to_string(), into_sequence(value));
        }
        Value::Null => {}
        _ => tracing::warn!(field, "unexpected value where a sequence was expected; dropped"),
    }
}

/// Parse numeric strings, clamp negatives, drop anything else unusable.
fn coerce_unsigned(doc: &mut Map<String, Value>, field: &str) {
    let Some(value) = doc.get(field) else {
        return;
    };
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|_| 0))
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<i64>().ok().map(|_| 0))
                .or_else(|| s.parse::<f64>().ok().map(|f| f.max(0.0) as u64))
        }
        Value::Null => None,
        _ => None,
    };
    match parsed {
        Some(n) => {
            doc.insert(field.to_string(), Value::Number(Number::from(n)));
        }
        None => {
            if !value.is_null() {
                tracing::warn!(field, "non-numeric counter; using default");
            }
            doc.remove(field);
        }
    }
}

fn clean_quest_list(doc: &mut Map<String, Value>, field: &str, prefix: &str) {
    let Some(Value::Array(quests)) = doc.get_mut(field) else {
        return;
    };
    quests.retain(|q| q.is_object());
    for (index, quest) in quests.iter_mut().enumerate() {
        if let Value::Object(quest) = quest {
            for key in QUEST_NUMERIC_FIELDS {
                coerce_unsigned(quest, key);
            }
            match quest.get("id") {
                Some(Value::Number(id)) => {
                    let id = id.to_string();
                    quest.insert("id".into(), Value::String(id));
                }
                Some(Value::String(id)) if !id.trim().is_empty() => {}
                _ => {
                    let text = quest.get("text").and_then(Value::as_str).unwrap_or_default();
                    let id = positional_id(prefix, index, text);
                    tracing::debug!(field, %id, "quest without id; assigned one");
                    quest.insert("id".into(), Value::String(id));
                }
            }
        }
    }
}

/// Id older clients derived from list position and the first ten characters
/// of the text.
fn positional_id(prefix: &str, index: usize, text: &str) -> String {
    let head: String = text.chars().take(10).collect();
    format!("{prefix}-{index}-{head}")
}

/// Older clients stored the catalog id (`xp_multiplier`) as the item id and
/// had no `kind`.
fn clean_inventory(doc: &mut Map<String, Value>) {
    let Some(Value::Array(items)) = doc.get_mut("inventory") else {
        return;
    };
    items.retain(|item| item.is_object());
    for item in items.iter_mut() {
        let Value::Object(item) = item else {
            continue;
        };
        let kind = ["kind", "type", "id"]
            .into_iter()
            .filter_map(|key| item.get(key).and_then(Value::as_str))
            .find_map(legacy_item_kind);
        let Some(kind) = kind else {
            continue;
        };
        let id_is_kind = item
            .get("id")
            .and_then(Value::as_str)
            .and_then(legacy_item_kind)
            .is_some();
        if id_is_kind || !matches!(item.get("id"), Some(Value::String(_))) {
            item.insert("id".into(), Value::String(format!("item-{}", uuid::Uuid::new_v4())));
        }
        item.insert("kind".into(), Value::String(kind.into()));
        item.remove("type");
        item.entry("name").or_insert_with(|| Value::String(kind.into()));
    }
}

fn legacy_item_kind(name: &str) -> Option<&'static str> {
    match name {
        "streak_saver" | "streakSaver" | "streak-saver" | "streak_freeze" | "streakFreeze" => {
            Some("streak_saver")
        }
        "xp_multiplier" | "xpMultiplier" | "xp-multiplier" => Some("xp_multiplier"),
        _ => None,
    }
}

/// Drop elements of a list field that do not deserialize as `T`, keeping the
/// rest of the list.
fn retain_valid<T: DeserializeOwned>(doc: &mut Map<String, Value>, field: &str) {
    let Some(Value::Array(items)) = doc.get_mut(field) else {
        return;
    };
    items.retain(|item| match serde_json::from_value::<T>(item.clone()) {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(field, "list element dropped: {err}");
            false
        }
    });
}

fn rebuild_effects(doc: &mut Map<String, Value>) {
    let Some(effects) = doc.remove("activeEffects") else {
        return;
    };
    let entries: Vec<(String, Value)> = match effects {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(list) => list
            .into_iter()
            .filter_map(|effect| {
                let kind = effect
                    .get("kind")
                    .or_else(|| effect.get("type"))
                    .and_then(Value::as_str)?
                    .to_string();
                Some((kind, effect))
            })
            .collect(),
        _ => Vec::new(),
    };

    let mut rebuilt = Map::new();
    for (key, mut effect) in entries {
        let kind = match key.as_str() {
            "xpMultiplier" | "xp_multiplier" => "xpMultiplier",
            "streakFreeze" | "streak_freeze" | "streakSaver" | "streak_saver" => "streakFreeze",
            other => {
                tracing::warn!(kind = other, "unknown effect kind; dropped");
                continue;
            }
        };
        if let Value::Object(fields) = &mut effect {
            fields.insert("kind".into(), Value::String(kind.into()));
            fields.remove("type");
            fields.entry("active").or_insert(Value::Bool(true));
            if !fields.contains_key("activatedAt") {
                tracing::warn!(kind, "effect without activation time; dropped");
                continue;
            }
        } else {
            continue;
        }
        rebuilt.insert(kind.to_string(), effect);
    }
    doc.insert("activeEffects".into(), Value::Object(rebuilt));
}

fn rebuild_streak_ledger(doc: &mut Map<String, Value>) {
    let Some(ledger) = doc.remove("questStreaks") else {
        return;
    };
    let records: Vec<(Option<String>, Value)> = match ledger {
        Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        Value::Array(list) => list.into_iter().map(|v| (None, v)).collect(),
        _ => Vec::new(),
    };

    let mut rebuilt = Map::new();
    for (key, record) in records {
        let Value::Object(mut fields) = record else {
            continue;
        };
        let Some(quest_id) = fields
            .get("questId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(key)
        else {
            continue;
        };
        coerce_unsigned(&mut fields, "streak");
        coerce_unsigned(&mut fields, "totalCompletions");
        let streak = fields.get("streak").cloned().unwrap_or(Value::from(0));
        fields.insert("questId".into(), Value::String(quest_id.clone()));
        fields.entry("questText").or_insert(Value::String(String::new()));
        fields.entry("streak").or_insert(Value::from(0));
        fields.entry("lastCompleted").or_insert(Value::Null);
        fields.entry("totalCompletions").or_insert(streak);
        rebuilt.insert(quest_id, Value::Object(fields));
    }
    doc.insert("questStreaks".into(), Value::Object(rebuilt));
}

/// Dates may have been stored as full ISO timestamps.
fn fix_creation_dates(doc: &mut Map<String, Value>) {
    for key in ["dailyQuestCreation", "weeklyQuestCreation"] {
        if let Some(Value::Object(counter)) = doc.get_mut(key) {
            truncate_to_date(counter, "lastResetDate");
        }
    }
    truncate_to_date(doc, "lastCheckIn");
}

fn truncate_to_date(map: &mut Map<String, Value>, key: &str) {
    if let Some(Value::String(s)) = map.get_mut(key) {
        if s.len() > 10 && s.is_char_boundary(10) {
            s.truncate(10);
        }
    }
}

/// Deserialize, dropping top-level fields that fail until the rest parses.
fn deserialize_lenient(doc: Map<String, Value>) -> PlayerState {
    let whole = Value::Object(doc.clone());
    if let Ok(state) = serde_json::from_value::<PlayerState>(whole) {
        return state;
    }

    let mut accepted = match serde_json::to_value(PlayerState::new()) {
        Ok(Value::Object(map)) => map,
        _ => return PlayerState::new(),
    };
    for (key, value) in doc {
        let previous = accepted.insert(key.clone(), value);
        if serde_json::from_value::<PlayerState>(Value::Object(accepted.clone())).is_err() {
            tracing::warn!(field = %key, "field failed to deserialize; using default");
            match previous {
                Some(previous) => accepted.insert(key, previous),
                None => accepted.remove(&key),
            };
        }
    }
    serde_json::from_value(Value::Object(accepted)).unwrap_or_else(|err| {
        tracing::warn!("player document unusable after normalization: {err}");
        PlayerState::new()
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::effects::EffectKind;

    #[test]
    fn non_object_yields_fresh_state() {
        assert_eq!(normalize_state(json!(null)), PlayerState::new());
        assert_eq!(normalize_state(json!([1, 2, 3])), PlayerState::new());
    }

    #[test]
    fn keyed_maps_become_sequences() {
        let state = normalize_state(json!({
            "xp": 120,
            "dailyQuests": {
                "a": { "id": "d1", "text": "Read", "xp": 10 },
                "b": { "id": "d2", "text": "Walk", "xp": "15" }
            },
            "unlockedAchievements": { "0": "first_steps" }
        }));
        assert_eq!(state.daily_quests.len(), 2);
        assert_eq!(state.daily("d2").unwrap().xp, 15);
        assert!(state.unlocked_achievements.contains("first_steps"));
    }

    #[test]
    fn nested_backend_shape_is_hoisted() {
        let state = normalize_state(json!({
            "xp": "250",
            "coins": -4,
            "quests": {
                "weekly": [{ "id": "w1", "text": "Gym", "target": 3 }],
                "main": { "id": "m1", "text": "Marathon", "objectives": [] }
            },
            "streaks": { "dailyStreak": "5", "longestDailyStreak": 9 },
            "achievements": ["first_steps"]
        }));
        assert_eq!(state.xp, 250);
        assert_eq!(state.level, crate::leveling::level_for_xp(250));
        assert_eq!(state.coins, 0);
        assert_eq!(state.weekly("w1").unwrap().xp_per_increment, 5);
        assert_eq!(state.main_quest.as_ref().unwrap().id, "m1");
        assert_eq!(state.daily_streak, 5);
        assert_eq!(state.longest_daily_streak, 9);
        assert!(state.unlocked_achievements.contains("first_steps"));
    }

    #[test]
    fn legacy_settings_and_counters() {
        let state = normalize_state(json!({
            "settings": { "individualDailyStreaks": true, "tutorialCompleted": true },
            "daily_quest_creation": { "count": "2", "last_reset_date": "2024-03-04T09:12:00.000Z" }
        }));
        assert_eq!(state.streak_mode, StreakMode::PerQuest);
        assert!(state.tutorial_completed);
        assert_eq!(state.daily_creation.count, 2);
        assert_eq!(
            state.daily_creation.last_reset_date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn legacy_streak_saver_effect_maps_to_freeze() {
        let state = normalize_state(json!({
            "activeEffects": {
                "streakSaver": { "activatedAt": "2024-03-04T09:00:00Z", "usesLeft": 1 },
                "confetti": { "activatedAt": "2024-03-04T09:00:00Z" }
            }
        }));
        let freeze = state.active_effects.get(EffectKind::StreakFreeze).unwrap();
        assert!(freeze.active);
        assert_eq!(freeze.uses_left, Some(1));
        assert!(state.active_effects.get(EffectKind::XpMultiplier).is_none());
    }

    #[test]
    fn ledger_records_gain_missing_fields() {
        let state = normalize_state(json!({
            "questStreaks": {
                "d1": { "streak": 4, "lastCompleted": "2024-03-04T09:00:00Z" }
            }
        }));
        let record = state.quest_streaks.get("d1").unwrap();
        assert_eq!(record.quest_id, "d1");
        assert_eq!(record.streak, 4);
        assert_eq!(record.total_completions, 4);
    }

    #[test]
    fn legacy_lists_keep_every_usable_element() {
        let state = normalize_state(json!({
            "xp": 120,
            "dailyQuests": [
                { "text": "Morning stretch routine", "xp": 10, "completed": false },
                { "text": "Read", "xp": "5" },
                { "text": 42 }
            ],
            "sideQuests": [
                { "id": 1700000000000u64, "text": "Pay rent", "xp": 15 },
                { "text": "Call mom", "xp": 20, "completed": false }
            ],
            "inventory": [
                {
                    "id": "xp_multiplier",
                    "name": "XP Multiplier",
                    "icon": "x",
                    "description": "2x XP for 2 hours",
                    "canUse": true
                },
                { "id": "mystery", "name": "??" }
            ]
        }));
        assert_eq!(state.xp, 120);
        assert_eq!(state.daily_quests.len(), 2);
        assert_eq!(state.daily_quests[0].id, "daily-0-Morning st");
        assert_eq!(state.daily_quests[1].id, "daily-1-Read");
        assert_eq!(state.daily_quests[1].xp, 5);
        assert_eq!(state.side_quests.len(), 2);
        assert_eq!(state.side_quests[0].id, "1700000000000");
        assert_eq!(state.side_quests[1].id, "side-1-Call mom");
        assert_eq!(state.inventory.len(), 1);
        assert_eq!(state.inventory[0].kind, crate::state::ItemKind::XpMultiplier);
        assert_ne!(state.inventory[0].id, "xp_multiplier");
    }

    #[test]
    fn broken_field_falls_back_without_losing_the_rest() {
        let state = normalize_state(json!({
            "xp": 40,
            "mainQuestCooldown": "not a date",
            "inventory": "nope"
        }));
        assert_eq!(state.xp, 40);
        assert!(state.main_quest_cooldown.is_none());
        assert!(state.inventory.is_empty());
    }
}
