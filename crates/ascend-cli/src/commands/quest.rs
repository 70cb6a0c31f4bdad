use clap::Subcommand;

use ascend_core::catalog::{daily_templates, DAILY_TEMPLATES};
use ascend_core::clock::undo_time_remaining;
use ascend_core::{QuestCategory, QuestDraft};

use crate::session::{countdown, CliResult, Session};

#[derive(Subcommand)]
pub enum DailyAction {
    /// Add a daily quest
    Add {
        /// Quest text
        text: String,
        /// Base XP per completion
        #[arg(long, default_value_t = 10)]
        xp: u64,
        /// Explicit quest id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Life area (health, work, ...); inferred when the text matches a template
        #[arg(long)]
        area: Option<String>,
    },
    /// Complete a daily quest
    Complete { id: String },
    /// Undo a completion within the undo window
    Undo { id: String },
    /// Delete a daily quest
    Delete { id: String },
    /// List daily quests
    List {
        #[arg(long)]
        json: bool,
    },
    /// Suggested daily quests
    Templates {
        /// Filter by category (health, work, learning, wellness, personal)
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum WeeklyAction {
    /// Add a weekly quest
    Add {
        text: String,
        /// Progress steps needed this week
        #[arg(long)]
        target: u32,
        /// XP per progress step
        #[arg(long, default_value_t = 5)]
        xp: u64,
        #[arg(long)]
        id: Option<String>,
    },
    /// Log today's progress step
    Progress { id: String },
    /// Delete a weekly quest
    Delete { id: String },
    /// List weekly quests
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SideAction {
    /// Add a side quest
    Add {
        text: String,
        #[arg(long, default_value_t = 15)]
        xp: u64,
        #[arg(long)]
        id: Option<String>,
    },
    /// Complete a side quest
    Complete { id: String },
    /// Undo a completion within the undo window
    Undo { id: String },
    /// Delete a side quest
    Delete { id: String },
    /// List side quests
    List {
        #[arg(long)]
        json: bool,
    },
}

fn with_id(draft: QuestDraft, id: Option<String>) -> QuestDraft {
    match id {
        Some(id) => draft.with_id(id),
        None => draft,
    }
}

pub fn run_daily(action: DailyAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        DailyAction::Add { text, xp, id, area } => {
            let mut draft = QuestDraft::daily(text, xp);
            if let QuestDraft::Daily { category, .. } = &mut draft {
                *category = area;
            }
            let draft = with_id(draft, id);
            session.apply(|e, s, now| e.create_quest(s, draft, now))
        }
        DailyAction::Complete { id } => session.apply(|e, s, now| e.complete_daily(s, &id, now)),
        DailyAction::Undo { id } => session.apply(|e, s, now| e.undo_daily(s, &id, now)),
        DailyAction::Delete { id } => {
            session.apply(|e, s, now| e.delete_quest(s, QuestCategory::Daily, &id, now))
        }
        DailyAction::List { json } => {
            let state = session.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&state.daily_quests)?);
                return Ok(());
            }
            if let Some(left) = session.engine.creations_left(&state, QuestCategory::Daily, session.now) {
                println!("({left} daily quest creation(s) left today)");
            }
            for quest in &state.daily_quests {
                let mark = if quest.completed { "x" } else { " " };
                let streak = state.quest_streaks.streak_of(&quest.id);
                print!("[{mark}] {} - {} ({} XP, streak {streak})", quest.id, quest.text, quest.xp);
                if let Some(area) = &quest.category {
                    print!(" [{area}]");
                }
                let undo = undo_time_remaining(quest.completed_at, session.now);
                if quest.completed && undo > chrono::Duration::zero() {
                    print!("  undo: {}", countdown(&session.config, undo));
                }
                println!();
            }
            Ok(())
        }
        DailyAction::Templates { category } => {
            let templates: Vec<_> = match &category {
                Some(category) => daily_templates(category).collect(),
                None => DAILY_TEMPLATES.iter().collect(),
            };
            for template in templates {
                println!("{:<10} {} ({} XP)", template.category, template.text, template.xp);
            }
            Ok(())
        }
    }
}

pub fn run_weekly(action: WeeklyAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        WeeklyAction::Add { text, target, xp, id } => {
            let mut draft = QuestDraft::weekly(text, target);
            if let QuestDraft::Weekly { xp_per_increment, .. } = &mut draft {
                *xp_per_increment = xp;
            }
            let draft = with_id(draft, id);
            session.apply(|e, s, now| e.create_quest(s, draft, now))
        }
        WeeklyAction::Progress { id } => session.apply(|e, s, now| e.progress_weekly(s, &id, now)),
        WeeklyAction::Delete { id } => {
            session.apply(|e, s, now| e.delete_quest(s, QuestCategory::Weekly, &id, now))
        }
        WeeklyAction::List { json } => {
            let state = session.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&state.weekly_quests)?);
                return Ok(());
            }
            for quest in &state.weekly_quests {
                let today = if session.engine.can_progress_weekly(&state, &quest.id, session.now) {
                    ""
                } else {
                    "  (done for today)"
                };
                println!(
                    "{} - {} [{}/{}] {} XP/step{today}",
                    quest.id, quest.text, quest.current, quest.target, quest.xp_per_increment
                );
            }
            Ok(())
        }
    }
}

pub fn run_side(action: SideAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        SideAction::Add { text, xp, id } => {
            let draft = with_id(QuestDraft::side(text, xp), id);
            session.apply(|e, s, now| e.create_quest(s, draft, now))
        }
        SideAction::Complete { id } => session.apply(|e, s, now| e.complete_side(s, &id, now)),
        SideAction::Undo { id } => session.apply(|e, s, now| e.undo_side(s, &id, now)),
        SideAction::Delete { id } => {
            session.apply(|e, s, now| e.delete_quest(s, QuestCategory::Side, &id, now))
        }
        SideAction::List { json } => {
            let state = session.view();
            if json {
                println!("{}", serde_json::to_string_pretty(&state.side_quests)?);
                return Ok(());
            }
            for quest in &state.side_quests {
                let mark = if quest.completed { "x" } else { " " };
                println!("[{mark}] {} - {} ({} XP)", quest.id, quest.text, quest.xp);
            }
            Ok(())
        }
    }
}
