use clap::Subcommand;

use ascend_core::QuestDraft;

use crate::session::{countdown, CliResult, Session};

#[derive(Subcommand)]
pub enum MainAction {
    /// Set a new main quest
    Set {
        text: String,
        /// Objective (repeat; at least three)
        #[arg(long = "objective", short = 'o')]
        objectives: Vec<String>,
    },
    /// Show the active main quest
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Toggle objective completion (1-based)
    Objective { number: usize },
    /// Replace text and objectives; unchanged objectives keep their state
    Edit {
        text: String,
        #[arg(long = "objective", short = 'o')]
        objectives: Vec<String>,
    },
    /// Finalize once every objective is done
    Finalize,
    /// Drop the main quest without reward
    Abandon,
    /// Finalized main quests
    History {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: MainAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        MainAction::Set { text, objectives } => {
            let draft = QuestDraft::main(text, objectives);
            session.apply(|e, s, now| e.create_quest(s, draft, now))
        }
        MainAction::Show { json } => {
            let state = session.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&state.main_quest)?);
                return Ok(());
            }
            match &state.main_quest {
                Some(quest) => {
                    println!(
                        "{} ({}/{} objectives)",
                        quest.text,
                        quest.completed_objectives(),
                        quest.objectives.len()
                    );
                    for (i, objective) in quest.objectives.iter().enumerate() {
                        let mark = if objective.completed { "x" } else { " " };
                        println!("  {}. [{mark}] {}", i + 1, objective.text);
                    }
                }
                None => {
                    let wait = session.engine.main_quest_cooldown_remaining(&state, session.now);
                    if wait > chrono::Duration::zero() {
                        println!("No main quest. Next one in {}", countdown(&session.config, wait));
                    } else {
                        println!("No main quest.");
                    }
                }
            }
            Ok(())
        }
        MainAction::Objective { number } => {
            let index = number.checked_sub(1).ok_or("objectives are numbered from 1")?;
            session.apply(|e, s, now| e.toggle_objective(s, index, now))
        }
        MainAction::Edit { text, objectives } => {
            session.apply(|e, s, now| e.edit_main_quest(s, &text, &objectives, now))
        }
        MainAction::Finalize => session.apply(|e, s, now| e.finalize_main_quest(s, now)),
        MainAction::Abandon => session.apply(|e, s, now| e.abandon_main_quest(s, now)),
        MainAction::History { json } => {
            let history = session.engine.main_quest_history(&session.state);
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
                return Ok(());
            }
            for record in history {
                println!(
                    "{}  {} (+{} XP)",
                    record.completed_at.format("%Y-%m-%d"),
                    record.text,
                    record.xp_earned
                );
            }
            Ok(())
        }
    }
}
