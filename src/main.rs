use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use poop_runner::config::RunnerConfig;
use poop_runner::leaderboard::{HttpLeaderboard, Leaderboard};
use poop_runner::profile::{JsonProfileStore, Profile, ProfileStore};
use poop_runner::runner::score::ScoringMode;
use poop_runner::runner::{LoopClock, RunController};
use poop_runner::ui::render_runner_scene;
use poop_runner::utils::version_string;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "poop-runner", about = "Endless runner in the terminal", version = version_string())]
struct Cli {
    /// JSON file overriding the default tuning
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// What the final score counts
    #[arg(long, value_enum, global = true)]
    scoring: Option<ScoringMode>,

    /// Leaderboard server base URL, e.g. http://localhost:3000
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play in the terminal (default)
    Play {
        /// Save a new player name before starting
        #[arg(long)]
        name: Option<String>,
        /// Country tag appended to the name on the leaderboard
        #[arg(long)]
        country: Option<String>,
        /// Fixed seed for a reproducible course
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the leaderboard server
    #[cfg(feature = "web")]
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

fn init_logging(default_filter: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = RunnerConfig::load(cli.config.as_deref())?;
    if let Some(scoring) = cli.scoring {
        config.scoring = scoring;
    }
    if let Some(server) = cli.server {
        config.leaderboard.server_url = Some(server);
    }

    match cli.command {
        #[cfg(feature = "web")]
        Some(Command::Serve { port }) => {
            init_logging("info");
            serve(port)
        }
        Some(Command::Play {
            name,
            country,
            seed,
        }) => {
            init_logging("warn");
            play(config, name, country, seed)
        }
        None => {
            init_logging("warn");
            play(config, None, None, None)
        }
    }
}

#[cfg(feature = "web")]
fn serve(port: u16) -> Result<(), Box<dyn Error>> {
    use poop_runner::web::{start_leaderboard_server, Boards};
    use tokio::sync::Mutex;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let boards = Arc::new(Mutex::new(Boards::default()));
    runtime.block_on(start_leaderboard_server(port, boards))?;
    Ok(())
}

fn play(
    config: RunnerConfig,
    name: Option<String>,
    country: Option<String>,
    seed: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    let mut store = JsonProfileStore::open(config.leaderboard.local_best_limit)?;
    if name.is_some() || country.is_some() {
        let current = store.profile();
        let profile = Profile::new(
            name.as_deref().unwrap_or(&current.name),
            country.as_deref().unwrap_or(&current.country),
        );
        store.save_profile(&profile)?;
    }

    let leaderboard = config.leaderboard.server_url.as_deref().map(|url| {
        log::info!("submitting scores to {}", url);
        Arc::new(HttpLeaderboard::new(url, config.leaderboard.timeout)) as Arc<dyn Leaderboard>
    });

    let mut controller = RunController::new(config, Box::new(store), leaderboard, seed);

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut controller);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut RunController,
) -> Result<(), Box<dyn Error>> {
    let origin = Instant::now();
    let mut clock = LoopClock::from_config(&controller.config().game_loop);
    let poll_interval = controller.config().game_loop.frame_interval / 2;

    loop {
        if let Some(dt) = clock.advance(origin.elapsed()) {
            controller.frame(dt);
        }
        controller.poll_leaderboard();

        terminal.draw(|frame| {
            let area = frame.size();
            render_runner_scene(frame, area, controller);
        })?;

        if !event::poll(poll_interval.max(Duration::from_millis(1)))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char(' ') | KeyCode::Up => {
                controller.jump();
            }
            KeyCode::Char('r') | KeyCode::Enter if controller.is_over() => {
                controller.reset();
                clock.reset();
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                let timeout = controller.config().leaderboard.timeout;
                controller.shutdown(timeout);
                return Ok(());
            }
            _ => {}
        }
    }
}
