use clap::Subcommand;

use ascend_core::catalog::STORE_ITEMS;
use ascend_core::{ItemKind, MiniGame};

use crate::session::{countdown, CliResult, Session};

#[derive(Subcommand)]
pub enum EffectAction {
    /// Consume an inventory item (streak-saver, xp-multiplier)
    Use { item: ItemKind },
    /// Active effects and inventory
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum StoreAction {
    /// Items for sale
    List,
    /// Buy an item by id
    Buy { item: String },
}

#[derive(Subcommand)]
pub enum PromoAction {
    /// Redeem a promo code
    Redeem { code: String },
}

#[derive(Subcommand)]
pub enum MiniGameAction {
    /// Claim the coin reward of a finished round
    Claim {
        /// dice, focus-hunt, race-clock or boss-battle
        game: MiniGame,
        #[arg(long)]
        coins: u64,
    },
    /// Cooldowns per game
    Status,
}

pub fn run_effect(action: EffectAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        EffectAction::Use { item } => session.apply(|e, s, now| e.use_item(s, item, now)),
        EffectAction::List { json } => {
            let state = session.view();
            let effects = session.engine.active_effects(&state, session.now);
            if json {
                println!("{}", serde_json::to_string_pretty(&effects)?);
                return Ok(());
            }
            if effects.is_empty() {
                println!("No active effects.");
            }
            for effect in &effects {
                println!("{} ({})", effect.name, effect.remaining);
            }
            for kind in [ItemKind::StreakSaver, ItemKind::XpMultiplier] {
                println!("{kind}: {} in inventory", state.inventory_count(kind));
            }
            Ok(())
        }
    }
}

pub fn run_store(action: StoreAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        StoreAction::List => {
            println!("Coins: {}", session.state.coins);
            for item in STORE_ITEMS.iter() {
                let tag = if item.available { "" } else { "  (coming soon)" };
                println!("{:<14} {:>4}c  {} - {}{tag}", item.id, item.price, item.name, item.description);
            }
            Ok(())
        }
        StoreAction::Buy { item } => session.apply(|e, s, now| e.purchase(s, &item, now)),
    }
}

pub fn run_promo(action: PromoAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        PromoAction::Redeem { code } => session.apply(|e, s, now| e.redeem_promo(s, &code, now)),
    }
}

pub fn check_in() -> CliResult {
    let mut session = Session::open()?;
    session.apply(|e, s, now| e.check_in(s, now))
}

pub fn run_mini_game(action: MiniGameAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        MiniGameAction::Claim { game, coins } => {
            session.apply(|e, s, now| e.claim_mini_game(s, game, coins, now))
        }
        MiniGameAction::Status => {
            for game in MiniGame::ALL {
                let wait = session
                    .engine
                    .mini_game_cooldown_remaining(&session.state, game, session.now);
                if wait > chrono::Duration::zero() {
                    println!("{:<12} ready in {}", game.to_string(), countdown(&session.config, wait));
                } else {
                    println!("{:<12} ready", game.to_string());
                }
            }
            Ok(())
        }
    }
}
