use clap::Subcommand;

use ascend_core::achievements::{achievement_progress, AchievementStats, ACHIEVEMENTS};
use ascend_core::rank_title;

use crate::session::{countdown as render, CliResult, Session};

#[derive(Subcommand)]
pub enum TutorialAction {
    /// Finish onboarding; daily creation limits apply afterwards
    Complete,
}

pub fn status(json: bool) -> CliResult {
    let session = Session::open()?;
    let state = session.view();
    let progress = state.progress();
    let multiplier = session.engine.current_multiplier(&state, session.now);

    if json {
        let out = serde_json::json!({
            "level": progress.level,
            "rank": rank_title(progress.level),
            "xp": state.xp,
            "xpIntoLevel": progress.xp_into_level,
            "xpForNextLevel": progress.xp_needed_for_next_level,
            "progressPercent": progress.progress_percent,
            "coins": state.coins,
            "dailyStreak": state.daily_streak,
            "weeklyStreak": state.weekly_streak,
            "streakMode": state.streak_mode,
            "multiplier": multiplier,
            "avatar": state.avatar,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if session.config.display.show_rank_titles {
        println!("Level {} - {}", progress.level, rank_title(progress.level));
    } else {
        println!("Level {}", progress.level);
    }
    println!(
        "XP: {} ({}/{} into level, {:.0}%)",
        state.xp, progress.xp_into_level, progress.xp_needed_for_next_level, progress.progress_percent
    );
    println!("Coins: {}", state.coins);
    println!(
        "Streaks: daily {} / weekly {} ({})",
        state.daily_streak, state.weekly_streak, state.streak_mode
    );
    if multiplier > 1 {
        println!("XP multiplier: x{multiplier}");
    }
    if !state.tutorial_completed {
        println!("Tutorial not completed: run `ascend-cli tutorial complete` when ready.");
    }
    Ok(())
}

pub fn achievements(json: bool) -> CliResult {
    let session = Session::open()?;
    let state = session.view();
    let stats = AchievementStats::from_state(&state);
    let progress = achievement_progress(&stats);

    if json {
        let list: Vec<_> = ACHIEVEMENTS
            .iter()
            .map(|a| {
                serde_json::json!({
                    "id": a.id,
                    "title": a.title,
                    "description": a.description,
                    "unlocked": state.unlocked_achievements.contains(a.id),
                })
            })
            .collect();
        let out = serde_json::json!({ "progress": progress, "achievements": list });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{}/{} unlocked ({}%)",
        state.unlocked_achievements.len(),
        progress.total,
        progress.percentage
    );
    for achievement in ACHIEVEMENTS.iter() {
        let mark = if state.unlocked_achievements.contains(achievement.id) {
            "x"
        } else {
            " "
        };
        println!("[{mark}] {} - {}", achievement.title, achievement.description);
    }
    Ok(())
}

/// Activity per day, most recent first.
pub fn log(days: usize, json: bool) -> CliResult {
    let session = Session::open()?;
    let state = session.view();
    let recent: Vec<_> = state.daily_log.recent().take(days).collect();

    if json {
        let out: serde_json::Map<String, serde_json::Value> = recent
            .iter()
            .map(|(date, day)| Ok((date.to_string(), serde_json::to_value(day)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if recent.is_empty() {
        println!("No activity logged yet.");
    }
    for (date, day) in recent {
        println!(
            "{date}  {:>4} XP  {:>3}c  {} done (d{} w{} s{} m{})  streaks {:+}/{:+}",
            day.xp,
            day.coins,
            day.completed.total(),
            day.completed.daily,
            day.completed.weekly,
            day.completed.side,
            day.completed.main,
            day.streak_changes.daily,
            day.streak_changes.weekly
        );
    }
    Ok(())
}

pub fn countdown() -> CliResult {
    let session = Session::open()?;
    let calendar = session.engine.calendar();
    println!(
        "Daily reset in {}",
        render(&session.config, calendar.time_until_daily_reset(session.now))
    );
    println!(
        "Weekly reset in {}",
        render(&session.config, calendar.time_until_weekly_reset(session.now))
    );
    Ok(())
}

pub fn run_tutorial(action: TutorialAction) -> CliResult {
    let mut session = Session::open()?;
    match action {
        TutorialAction::Complete => session.apply(|e, s, now| e.complete_tutorial(s, now)),
    }
}

pub fn reset(confirm: bool) -> CliResult {
    let mut session = Session::open()?;
    session.apply(|e, s, now| e.reset_all(s, confirm, now))
}
