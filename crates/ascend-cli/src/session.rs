//! Load, transition, print, save.
//!
//! Every mutating command follows the same cycle: load the normalized player
//! document, run one engine transition at `Utc::now()`, print the produced
//! events as JSON lines on stdout, and persist the new state.

use std::error::Error;

use ascend_core::{Config, Engine, EngineError, Event, PlayerState, StateStore, Transition};
use chrono::{DateTime, Utc};

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

pub struct Session {
    pub store: StateStore,
    pub config: Config,
    pub engine: Engine,
    pub state: PlayerState,
    pub now: DateTime<Utc>,
}

impl Session {
    pub fn open() -> CliResult<Self> {
        let config = Config::load_or_default();
        let store = StateStore::open_default()?;
        let is_new = !store.path().exists();
        let mut state = store.load()?;
        if is_new {
            state.tutorial_completed = config.player.tutorial_completed;
            if let Some(avatar) = &config.player.starting_avatar {
                state.avatar = Some(avatar.clone());
            }
            tracing::info!(path = %store.path().display(), "creating new profile");
        }
        Ok(Self {
            engine: Engine::new(config.calendar()),
            store,
            config,
            state,
            now: Utc::now(),
        })
    }

    /// Apply pending rollovers and return the up-to-date state for display.
    /// Nothing is written.
    pub fn view(&self) -> PlayerState {
        self.engine.catch_up(&self.state, self.now).state
    }

    /// Run one transition, print its events, and save on success.
    pub fn apply<F>(&mut self, op: F) -> CliResult
    where
        F: FnOnce(&Engine, &PlayerState, DateTime<Utc>) -> Result<Transition, EngineError>,
    {
        match op(&self.engine, &self.state, self.now) {
            Ok(transition) => {
                print_events(&transition.events)?;
                self.store.save(&transition.state)?;
                self.state = transition.state;
                Ok(())
            }
            Err(err) => {
                print_events(&[err.to_event(self.now)])?;
                Err(err.into())
            }
        }
    }
}

pub fn print_events(events: &[Event]) -> CliResult {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

/// Render a countdown in the configured style.
pub fn countdown(config: &Config, remaining: chrono::Duration) -> String {
    if config.display.countdown_style == "clock" {
        let total = remaining.num_seconds().max(0);
        format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    } else {
        ascend_core::clock::format_countdown(remaining)
    }
}
