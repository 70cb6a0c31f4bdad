//! Coins, inventory, effects, and the small reward loops around them:
//! store purchases, item use, promo codes, daily check-in, mini-games.

use chrono::{DateTime, Duration, Utc};

use super::{Engine, Settlement, Transition};
use crate::catalog::{self, PromoReward};
use crate::error::{EngineError, Rejection};
use crate::events::{Event, XpSource};
use crate::state::{InventoryItem, ItemKind, MiniGame, PlayerState};

pub const CHECK_IN_XP: u64 = 10;

/// Per-game wait between mini-game reward claims.
pub const MINI_GAME_COOLDOWN: Duration = Duration::minutes(30);

impl Engine {
    /// Buy a store item with coins.
    pub fn purchase(
        &self,
        state: &PlayerState,
        item_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "purchase", |s| s.purchase(item_id))
    }

    /// Consume one inventory item and activate its effect.
    pub fn use_item(
        &self,
        state: &PlayerState,
        kind: ItemKind,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "use_item", |s| s.use_item(kind))
    }

    pub fn redeem_promo(
        &self,
        state: &PlayerState,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "redeem_promo", |s| s.redeem_promo(code))
    }

    /// Once per local calendar day.
    pub fn check_in(&self, state: &PlayerState, now: DateTime<Utc>) -> Result<Transition, EngineError> {
        self.transact(state, now, "check_in", |s| s.check_in())
    }

    /// Claim the coin reward of a finished mini-game round.
    pub fn claim_mini_game(
        &self,
        state: &PlayerState,
        game: MiniGame,
        coins: u64,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transact(state, now, "claim_mini_game", |s| s.claim_mini_game(game, coins))
    }

    pub fn can_check_in(&self, state: &PlayerState, now: DateTime<Utc>) -> bool {
        state.last_check_in != Some(self.calendar().local_date(now))
    }

    pub fn mini_game_cooldown_remaining(
        &self,
        state: &PlayerState,
        game: MiniGame,
        now: DateTime<Utc>,
    ) -> Duration {
        crate::clock::cooldown_remaining(state.mini_game_cooldowns.get(&game).copied(), now)
    }
}

impl Settlement {
    fn purchase(&mut self, item_id: &str) -> Result<(), EngineError> {
        let item = catalog::store_item(item_id)
            .ok_or_else(|| Rejection::ItemUnavailable(item_id.trim().to_string()))?;
        if !item.available {
            return Err(Rejection::ItemUnavailable(item.id.to_string()).into());
        }
        self.spend_coins(item.price)?;
        self.state.stats.total_purchases += 1;
        if let Some(kind) = item.grants {
            self.state
                .inventory
                .push(InventoryItem::new(kind, item.name, self.now));
        }
        self.emit(Event::ItemPurchased {
            item_id: item.id.to_string(),
            cost: item.price,
            at: self.now,
        });
        Ok(())
    }

    fn use_item(&mut self, kind: ItemKind) -> Result<(), EngineError> {
        let effect = kind.effect();
        self.require_effect_inactive(effect)?;
        let pos = self
            .state
            .inventory
            .iter()
            .position(|i| i.kind == kind)
            .ok_or(Rejection::ItemNotInInventory(kind))?;

        self.state.inventory.remove(pos);
        self.state.active_effects.activate(effect, self.now);
        let expires_at = self
            .state
            .active_effects
            .get(effect)
            .and_then(|e| e.expires_at);

        self.emit(Event::ItemUsed { kind, at: self.now });
        self.emit(Event::EffectActivated {
            kind: effect,
            expires_at,
            at: self.now,
        });
        Ok(())
    }

    fn redeem_promo(&mut self, code: &str) -> Result<(), EngineError> {
        let promo = catalog::promo_code(code).ok_or(Rejection::PromoCodeInvalid)?;
        if !promo.reusable && self.state.used_promo_codes.contains(promo.code) {
            return Err(Rejection::PromoCodeAlreadyUsed.into());
        }
        match promo.reward {
            PromoReward::Xp(amount) => self.grant_flat_xp(amount, XpSource::Promo),
            PromoReward::Coins(amount) => self.grant_coins(amount),
            PromoReward::Item(kind) => {
                let name = catalog::store_item(kind.id()).map(|i| i.name).unwrap_or("Promo item");
                self.state
                    .inventory
                    .push(InventoryItem::new(kind, name, self.now));
            }
        }
        if !promo.reusable {
            self.state.used_promo_codes.insert(promo.code.to_string());
        }
        self.emit(Event::PromoRedeemed {
            code: promo.code.to_string(),
            at: self.now,
        });
        Ok(())
    }

    fn check_in(&mut self) -> Result<(), EngineError> {
        let today = self.cal.local_date(self.now);
        if self.state.last_check_in == Some(today) {
            return Err(Rejection::AlreadyCheckedIn.into());
        }
        self.state.last_check_in = Some(today);
        self.grant_xp(CHECK_IN_XP, XpSource::CheckIn);
        self.emit(Event::CheckedIn { at: self.now });
        Ok(())
    }

    fn claim_mini_game(&mut self, game: MiniGame, coins: u64) -> Result<(), EngineError> {
        if let Some(&until) = self.state.mini_game_cooldowns.get(&game) {
            if self.now < until {
                return Err(Rejection::MiniGameCooldown { until }.into());
            }
        }
        let cooldown_until = self.now + MINI_GAME_COOLDOWN;
        self.state.mini_game_cooldowns.insert(game, cooldown_until);
        *self.state.stats.mini_games_played.entry(game).or_insert(0) += 1;
        self.grant_coins(coins);
        self.emit(Event::MiniGamePlayed {
            game,
            coins,
            cooldown_until,
            at: self.now,
        });
        Ok(())
    }
}
