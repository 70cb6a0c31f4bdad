//! Temporary and use-limited modifiers.
//!
//! Two kinds exist, each independently active:
//!
//! - **XP multiplier**: doubles quest XP for two hours after activation.
//! - **Streak freeze**: one use; absorbs a single streak break and opens a
//!   24-hour window to recover.
//!
//! Instances are deactivated in place once expired or exhausted rather than
//! removed, so the last activation stays visible to persistence.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::format_countdown;

/// Lifetime of an XP multiplier activation.
pub const XP_MULTIPLIER_DURATION: Duration = Duration::hours(2);

/// Multiplier value while active.
pub const XP_MULTIPLIER_VALUE: u64 = 2;

/// Recovery window granted when a streak freeze absorbs a break.
pub const FREEZE_EXTENSION: Duration = Duration::hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    XpMultiplier,
    StreakFreeze,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::XpMultiplier => write!(f, "XP multiplier"),
            EffectKind::StreakFreeze => write!(f, "streak freeze"),
        }
    }
}

/// A single activation of an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectInstance {
    pub kind: EffectKind,
    pub active: bool,
    pub activated_at: DateTime<Utc>,
    /// Set for time-boxed effects.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Set for use-limited effects.
    #[serde(default)]
    pub uses_left: Option<u32>,
    #[serde(default = "default_multiplier")]
    pub multiplier: u64,
}

fn default_multiplier() -> u64 {
    1
}

impl EffectInstance {
    fn xp_multiplier(now: DateTime<Utc>) -> Self {
        Self {
            kind: EffectKind::XpMultiplier,
            active: true,
            activated_at: now,
            expires_at: Some(now + XP_MULTIPLIER_DURATION),
            uses_left: None,
            multiplier: XP_MULTIPLIER_VALUE,
        }
    }

    fn streak_freeze(now: DateTime<Utc>) -> Self {
        Self {
            kind: EffectKind::StreakFreeze,
            active: true,
            activated_at: now,
            expires_at: None,
            uses_left: Some(1),
            multiplier: 1,
        }
    }

    /// Active right now, without touching the stored flag.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        let unexpired = self.expires_at.map(|at| now < at).unwrap_or(true);
        let has_uses = self.uses_left.map(|n| n > 0).unwrap_or(true);
        unexpired && has_uses
    }
}

/// Effect summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEffectView {
    pub kind: EffectKind,
    pub name: String,
    pub remaining: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uses_left: Option<u32>,
}

/// Effects keyed by kind. At most one instance per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectRegistry {
    effects: BTreeMap<EffectKind, EffectInstance>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: EffectKind) -> Option<&EffectInstance> {
        self.effects.get(&kind)
    }

    pub fn is_active(&self, kind: EffectKind, now: DateTime<Utc>) -> bool {
        self.get(kind).map(|e| e.is_live(now)).unwrap_or(false)
    }

    /// Activate an effect. Returns `false` (and changes nothing) if an
    /// instance of the same kind is already live.
    pub fn activate(&mut self, kind: EffectKind, now: DateTime<Utc>) -> bool {
        if self.is_active(kind, now) {
            return false;
        }
        let instance = match kind {
            EffectKind::XpMultiplier => EffectInstance::xp_multiplier(now),
            EffectKind::StreakFreeze => EffectInstance::streak_freeze(now),
        };
        self.effects.insert(kind, instance);
        true
    }

    /// Current XP multiplier. Deactivates an expired multiplier the first time
    /// expiry is observed.
    pub fn current_multiplier(&mut self, now: DateTime<Utc>) -> u64 {
        match self.effects.get_mut(&EffectKind::XpMultiplier) {
            Some(effect) if effect.active => {
                if effect.is_live(now) {
                    effect.multiplier.max(1)
                } else {
                    effect.active = false;
                    tracing::debug!("xp multiplier expired");
                    1
                }
            }
            _ => 1,
        }
    }

    /// Read-only multiplier lookup for display.
    pub fn multiplier_at(&self, now: DateTime<Utc>) -> u64 {
        match self.get(EffectKind::XpMultiplier) {
            Some(effect) if effect.is_live(now) => effect.multiplier.max(1),
            _ => 1,
        }
    }

    /// Consume one streak-freeze use. Returns whether a use was available.
    pub fn consume_freeze(&mut self, now: DateTime<Utc>) -> bool {
        let Some(effect) = self.effects.get_mut(&EffectKind::StreakFreeze) else {
            return false;
        };
        if !effect.is_live(now) {
            return false;
        }
        let left = effect.uses_left.unwrap_or(1).saturating_sub(1);
        effect.uses_left = Some(left);
        if left == 0 {
            effect.active = false;
        }
        true
    }

    /// Deactivate every expired or exhausted instance. Returns the kinds that
    /// changed.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        for effect in self.effects.values_mut() {
            if effect.active && !effect.is_live(now) {
                effect.active = false;
                expired.push(effect.kind);
            }
        }
        expired
    }

    /// Live effects with their remaining time or uses.
    pub fn active_effects(&self, now: DateTime<Utc>) -> Vec<ActiveEffectView> {
        self.effects
            .values()
            .filter(|e| e.is_live(now))
            .map(|e| match e.kind {
                EffectKind::XpMultiplier => {
                    let remaining = e.expires_at.map(|at| at - now).unwrap_or_else(Duration::zero);
                    ActiveEffectView {
                        kind: e.kind,
                        name: format!("XP Multiplier ({}x)", e.multiplier),
                        remaining: format!("{} remaining", format_countdown(remaining)),
                        expires_at: e.expires_at,
                        uses_left: None,
                    }
                }
                EffectKind::StreakFreeze => {
                    let uses = e.uses_left.unwrap_or(0);
                    ActiveEffectView {
                        kind: e.kind,
                        name: "Streak Freeze".to_string(),
                        remaining: format!("{uses} use(s) left"),
                        expires_at: None,
                        uses_left: Some(uses),
                    }
                }
            })
            .collect()
    }

    pub(crate) fn insert(&mut self, instance: EffectInstance) {
        self.effects.insert(instance.kind, instance);
    }

    /// Give back a freeze use taken by `consume_freeze`. `snapshot` is the
    /// instance as it was before the use. A freeze activated since then keeps
    /// its own state and gains the use instead.
    pub(crate) fn restore_freeze(&mut self, snapshot: EffectInstance, now: DateTime<Utc>) {
        let newer = self
            .get(EffectKind::StreakFreeze)
            .map(|current| current.is_live(now) && current.activated_at != snapshot.activated_at)
            .unwrap_or(false);
        if !newer {
            self.insert(snapshot);
        } else if let Some(current) = self.effects.get_mut(&EffectKind::StreakFreeze) {
            current.uses_left = Some(current.uses_left.unwrap_or(1).saturating_add(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn multiplier_lasts_two_hours() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        assert_eq!(reg.current_multiplier(now), 1);
        assert!(reg.activate(EffectKind::XpMultiplier, now));
        assert_eq!(reg.current_multiplier(now + Duration::minutes(119)), 2);
        assert_eq!(reg.current_multiplier(now + Duration::hours(2)), 1);

        let effect = reg.get(EffectKind::XpMultiplier).unwrap();
        assert!(!effect.active, "expired multiplier is deactivated once observed");
    }

    #[test]
    fn no_stacking() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        assert!(reg.activate(EffectKind::XpMultiplier, now));
        assert!(!reg.activate(EffectKind::XpMultiplier, now + Duration::minutes(30)));
        assert_eq!(
            reg.get(EffectKind::XpMultiplier).unwrap().expires_at,
            Some(now + XP_MULTIPLIER_DURATION)
        );

        assert!(reg.activate(EffectKind::StreakFreeze, now));
        assert!(!reg.activate(EffectKind::StreakFreeze, now));
    }

    #[test]
    fn reactivation_after_expiry_is_allowed() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        reg.activate(EffectKind::XpMultiplier, now);
        assert!(reg.activate(EffectKind::XpMultiplier, now + Duration::hours(3)));
    }

    #[test]
    fn freeze_has_a_single_use() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        assert!(!reg.consume_freeze(now));
        reg.activate(EffectKind::StreakFreeze, now);
        assert!(reg.is_active(EffectKind::StreakFreeze, now));
        assert!(reg.consume_freeze(now));
        assert!(!reg.consume_freeze(now));
        let freeze = reg.get(EffectKind::StreakFreeze).unwrap();
        assert_eq!(freeze.uses_left, Some(0));
        assert!(!freeze.active);
    }

    #[test]
    fn restored_freeze_is_usable_again() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        reg.activate(EffectKind::StreakFreeze, now);
        let snapshot = reg.get(EffectKind::StreakFreeze).cloned().unwrap();
        assert!(reg.consume_freeze(now));
        reg.restore_freeze(snapshot.clone(), now);
        assert_eq!(reg.get(EffectKind::StreakFreeze), Some(&snapshot));

        // A newer freeze bought in between keeps its activation and gains a use.
        assert!(reg.consume_freeze(now));
        let later = now + chrono::Duration::minutes(2);
        assert!(reg.activate(EffectKind::StreakFreeze, later));
        reg.restore_freeze(snapshot, later);
        let freeze = reg.get(EffectKind::StreakFreeze).unwrap();
        assert_eq!(freeze.activated_at, later);
        assert_eq!(freeze.uses_left, Some(2));
    }

    #[test]
    fn views_report_remaining() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        reg.activate(EffectKind::XpMultiplier, now);
        reg.activate(EffectKind::StreakFreeze, now);
        let views = reg.active_effects(now + Duration::minutes(30));
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].remaining, "1h 30m remaining");
        assert_eq!(views[1].remaining, "1 use(s) left");
    }

    #[test]
    fn sweep_reports_expired_kinds() {
        let now = at("2024-03-01T10:00:00Z");
        let mut reg = EffectRegistry::new();
        reg.activate(EffectKind::XpMultiplier, now);
        assert!(reg.sweep_expired(now).is_empty());
        assert_eq!(reg.sweep_expired(now + Duration::hours(5)), vec![EffectKind::XpMultiplier]);
        assert!(reg.sweep_expired(now + Duration::hours(6)).is_empty());
    }
}
