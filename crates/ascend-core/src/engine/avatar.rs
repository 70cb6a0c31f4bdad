//! Avatar ownership and selection.
//!
//! Free avatars are always owned. Paid avatars are bought once with coins and
//! recorded in `unlocked_avatars`, as are milestone avatars when their streak
//! milestone pays out.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Engine, Settlement, Transition};
use crate::catalog::{self, Avatar, AvatarUnlock, AVATARS, DEFAULT_AVATAR};
use crate::error::{EngineError, Rejection};
use crate::events::Event;
use crate::state::PlayerState;

/// Catalog entry annotated with the player's ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarView {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    pub owned: bool,
    pub selected: bool,
}

impl Engine {
    /// Buy a paid avatar with coins.
    pub fn purchase_avatar(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "purchase_avatar", |s| s.purchase_avatar(id))
    }

    /// Make an owned avatar the current one.
    pub fn select_avatar(
        &self,
        state: &PlayerState,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "select_avatar", |s| s.select_avatar(id))
    }

    /// Every catalog avatar with the player's ownership.
    pub fn avatars(&self, state: &PlayerState) -> Vec<AvatarView> {
        let selected = state.avatar.as_deref().unwrap_or(DEFAULT_AVATAR);
        AVATARS
            .iter()
            .map(|a| AvatarView {
                id: a.id,
                name: a.name,
                emoji: a.emoji,
                category: a.category,
                price: match a.unlock {
                    AvatarUnlock::Price(price) => Some(price),
                    AvatarUnlock::Free | AvatarUnlock::Milestone(_) => None,
                },
                owned: owns(state, a),
                selected: a.id == selected,
            })
            .collect()
    }
}

fn owns(state: &PlayerState, avatar: &Avatar) -> bool {
    avatar.unlock == AvatarUnlock::Free || state.unlocked_avatars.contains(avatar.id)
}

impl Settlement {
    fn purchase_avatar(&mut self, id: &str) -> Result<(), EngineError> {
        let avatar =
            catalog::avatar(id).ok_or_else(|| Rejection::AvatarUnavailable(id.trim().to_string()))?;
        if owns(&self.state, avatar) {
            return Err(Rejection::AvatarAlreadyOwned(avatar.id.to_string()).into());
        }
        let AvatarUnlock::Price(price) = avatar.unlock else {
            return Err(Rejection::AvatarUnavailable(avatar.id.to_string()).into());
        };

        self.spend_coins(price)?;
        self.state.stats.total_purchases += 1;
        self.state.unlocked_avatars.insert(avatar.id.to_string());
        tracing::info!(avatar = avatar.id, price, "avatar purchased");
        self.emit(Event::AvatarPurchased {
            id: avatar.id.to_string(),
            cost: price,
            at: self.now,
        });
        Ok(())
    }

    fn select_avatar(&mut self, id: &str) -> Result<(), EngineError> {
        let avatar = catalog::avatar(id).ok_or_else(|| Rejection::AvatarLocked(id.trim().to_string()))?;
        if !owns(&self.state, avatar) {
            return Err(Rejection::AvatarLocked(avatar.id.to_string()).into());
        }
        self.state.avatar = Some(avatar.id.to_string());
        self.emit(Event::AvatarSelected {
            id: avatar.id.to_string(),
            at: self.now,
        });
        Ok(())
    }
}
