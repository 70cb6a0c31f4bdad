pub mod avatar;
pub mod config;
pub mod main_quest;
pub mod profile;
pub mod quest;
pub mod store;
pub mod streaks;
