use clap::Subcommand;

use crate::session::{CliResult, Session};

#[derive(Subcommand)]
pub enum AvatarAction {
    /// All avatars with price and ownership
    List {
        #[arg(long)]
        json: bool,
    },
    /// Buy a paid avatar
    Buy { id: String },
    /// Switch to an owned avatar
    Select { id: String },
}

pub fn run(action: AvatarAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        AvatarAction::List { json } => {
            let state = session.view();
            let avatars = session.engine.avatars(&state);
            if json {
                println!("{}", serde_json::to_string_pretty(&avatars)?);
                return Ok(());
            }
            println!("Coins: {}", state.coins);
            for avatar in &avatars {
                let mark = if avatar.selected { "*" } else { " " };
                let status = match (avatar.owned, avatar.price) {
                    (true, _) => "owned".to_string(),
                    (false, Some(price)) => format!("{price}c"),
                    (false, None) => "locked".to_string(),
                };
                println!(
                    "{mark} {} {:<20} {:<12} {status}",
                    avatar.emoji, avatar.id, avatar.category
                );
            }
            Ok(())
        }
        AvatarAction::Buy { id } => session.apply(|e, s, now| e.purchase_avatar(s, &id, now)),
        AvatarAction::Select { id } => session.apply(|e, s, now| e.select_avatar(s, &id, now)),
    }
}
