use clap::{CommandFactory, Parser, Subcommand};

mod commands;
mod session;

#[derive(Parser)]
#[command(name = "ascend-cli", version, about = "Ascend CLI: quests, streaks and levels")]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Level, XP, coins and streak overview
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Daily quests
    Daily {
        #[command(subcommand)]
        action: commands::quest::DailyAction,
    },
    /// Weekly quests
    Weekly {
        #[command(subcommand)]
        action: commands::quest::WeeklyAction,
    },
    /// Side quests
    Side {
        #[command(subcommand)]
        action: commands::quest::SideAction,
    },
    /// Main quest and its objectives
    Main {
        #[command(subcommand)]
        action: commands::main_quest::MainAction,
    },
    /// Active effects
    Effect {
        #[command(subcommand)]
        action: commands::store::EffectAction,
    },
    /// Reward store
    Store {
        #[command(subcommand)]
        action: commands::store::StoreAction,
    },
    /// Promo codes
    Promo {
        #[command(subcommand)]
        action: commands::store::PromoAction,
    },
    /// Daily check-in bonus
    Checkin,
    /// Mini-game rewards
    Minigame {
        #[command(subcommand)]
        action: commands::store::MiniGameAction,
    },
    /// Streaks and streak mode
    Streaks {
        #[command(subcommand)]
        action: commands::streaks::StreaksAction,
    },
    /// Avatars: browse, buy, select
    Avatar {
        #[command(subcommand)]
        action: commands::avatar::AvatarAction,
    },
    /// XP, coins, and completions per day (last 30 days kept)
    Log {
        /// Number of days to show
        #[arg(long, default_value_t = 7)]
        days: usize,
        #[arg(long)]
        json: bool,
    },
    /// Unlocked and locked achievements
    Achievements {
        #[arg(long)]
        json: bool,
    },
    /// Time until the next daily and weekly resets
    Countdown,
    /// Onboarding
    Tutorial {
        #[command(subcommand)]
        action: commands::profile::TutorialAction,
    },
    /// Wipe all progress
    Reset {
        /// Required: the reset cannot be undone
        #[arg(long)]
        confirm: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("ASCEND_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Status { json } => commands::profile::status(json),
        Commands::Daily { action } => commands::quest::run_daily(action),
        Commands::Weekly { action } => commands::quest::run_weekly(action),
        Commands::Side { action } => commands::quest::run_side(action),
        Commands::Main { action } => commands::main_quest::run(action),
        Commands::Effect { action } => commands::store::run_effect(action),
        Commands::Store { action } => commands::store::run_store(action),
        Commands::Promo { action } => commands::store::run_promo(action),
        Commands::Checkin => commands::store::check_in(),
        Commands::Minigame { action } => commands::store::run_mini_game(action),
        Commands::Streaks { action } => commands::streaks::run(action),
        Commands::Avatar { action } => commands::avatar::run(action),
        Commands::Log { days, json } => commands::profile::log(days, json),
        Commands::Achievements { json } => commands::profile::achievements(json),
        Commands::Countdown => commands::profile::countdown(),
        Commands::Tutorial { action } => commands::profile::run_tutorial(action),
        Commands::Reset { confirm } => commands::profile::reset(confirm),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "ascend-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
