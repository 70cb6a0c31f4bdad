use clap::Subcommand;

use ascend_core::streak::milestone_progress;
use ascend_core::StreakMode;

use crate::session::{CliResult, Session};

#[derive(Subcommand)]
pub enum StreaksAction {
    /// Global and per-quest streaks
    List {
        #[arg(long)]
        json: bool,
    },
    /// Switch streak mode (global or per-quest); resets daily streaks
    Mode {
        mode: StreakMode,
        #[arg(long)]
        confirm: bool,
    },
}

pub fn run(action: StreaksAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        StreaksAction::List { json } => {
            let state = session.view();
            let active = state.quest_streaks.active_streaks();
            if json {
                let out = serde_json::json!({
                    "mode": state.streak_mode,
                    "daily": state.daily_streak,
                    "weekly": state.weekly_streak,
                    "longestDaily": state.longest_daily_streak,
                    "longestWeekly": state.longest_weekly_streak,
                    "quests": active,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            println!("Mode: {}", state.streak_mode);
            let daily = milestone_progress(state.best_current_streak());
            println!(
                "Daily: {} (best {}), next milestone {}",
                state.daily_streak, state.longest_daily_streak, daily.next
            );
            println!("Weekly: {} (best {})", state.weekly_streak, state.longest_weekly_streak);
            for record in active {
                let progress = milestone_progress(record.streak);
                println!(
                    "  {:<24} {:>3} day(s), next {} ({} total)",
                    record.quest_text, record.streak, progress.next, record.total_completions
                );
            }
            Ok(())
        }
        StreaksAction::Mode { mode, confirm } => {
            session.apply(|e, s, now| e.set_streak_mode(s, mode, confirm, now))
        }
    }
}
