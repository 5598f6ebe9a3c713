//! Poop Runner headless balance simulator.
//!
//! Drives the same `tick()` the game uses with a simple auto-jump policy
//! and reports score and death statistics over many seeded runs.
//!
//! Usage:
//!   cargo run --bin simulator -- [OPTIONS]

use clap::Parser;
use poop_runner::config::RunnerConfig;
use poop_runner::runner::entities::{Altitude, EntityKind};
use poop_runner::runner::score::{evaluate_rank, final_score, ScoringMode};
use poop_runner::runner::{request_jump, tick, RunEnd, SimulationState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "simulator", about = "Headless Poop Runner balance runs")]
struct Args {
    /// Number of runs with incrementing seeds
    #[arg(long, default_value_t = 100)]
    runs: u64,
    /// Seed of the first run
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Stop a run that survives this long
    #[arg(long, default_value_t = 300)]
    max_seconds: u64,
    /// Seconds of scrolling the policy looks ahead
    #[arg(long, default_value_t = 0.3)]
    lookahead: f64,
    #[arg(long, value_enum, default_value_t = ScoringMode::Collected)]
    scoring: ScoringMode,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print one line per run
    #[arg(long)]
    verbose: bool,
}

/// Jump when a gap or a ground fireball is coming up, and spend mid-air
/// jumps when falling over a gap.
fn wants_jump(state: &SimulationState, lookahead: f64) -> bool {
    let player = &state.player;
    let reach = state.config.terrain.scroll_speed * lookahead;
    let front = player.x + player.width;

    let under = state.terrain.height_at(player.center_x());
    if !player.grounded {
        return under.is_gap && player.vy > 0.0;
    }

    if state.terrain.height_at(front + reach).is_gap {
        return true;
    }
    state.entities.iter().any(|entity| match &entity.kind {
        EntityKind::Hazard(hazard) if hazard.altitude == Altitude::Ground => {
            let left = entity.bounds.x;
            left >= player.x && left <= front + reach
        }
        _ => false,
    })
}

struct RunSummary {
    score: u32,
    elapsed: Duration,
    end: Option<RunEnd>,
}

fn simulate(config: &RunnerConfig, seed: u64, args: &Args) -> RunSummary {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut state = SimulationState::new(config.clone(), &mut rng);
    let dt = config.game_loop.frame_interval;
    let limit = Duration::from_secs(args.max_seconds);

    request_jump(&mut state);
    while state.run.is_running() && state.run.elapsed < limit {
        if wants_jump(&state, args.lookahead) {
            request_jump(&mut state);
        }
        tick(&mut state, dt, &mut rng);
    }

    RunSummary {
        score: final_score(args.scoring, &state.run),
        elapsed: state.run.elapsed,
        end: state.run.game_over,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let config = RunnerConfig::load(args.config.as_deref())?;

    let mut scores = Vec::with_capacity(args.runs as usize);
    let mut total_time = Duration::ZERO;
    let mut ends: HashMap<&'static str, u64> = HashMap::new();
    let mut grades: HashMap<&'static str, u64> = HashMap::new();

    for i in 0..args.runs {
        let seed = args.seed + i;
        let summary = simulate(&config, seed, &args);
        let rank = evaluate_rank(args.scoring, summary.score);
        let end = summary.end.map_or("survived", |end| end.describe());

        if args.verbose {
            println!(
                "seed {:>6}  score {:>4}  rank {:<2}  {:>6.1}s  {}",
                seed,
                summary.score,
                rank.grade,
                summary.elapsed.as_secs_f64(),
                end
            );
        }

        *ends.entry(end).or_default() += 1;
        *grades.entry(rank.grade).or_default() += 1;
        total_time += summary.elapsed;
        scores.push(summary.score);
    }

    if scores.is_empty() {
        println!("no runs");
        return Ok(());
    }

    let runs = scores.len() as f64;
    let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / runs;
    let max = scores.iter().copied().max().unwrap_or(0);
    scores.sort_unstable();
    let median = scores[scores.len() / 2];

    println!("── {} runs ({} scoring) ──", scores.len(), args.scoring.unit());
    println!("score  mean {:.1}  median {}  max {}", mean, median, max);
    println!("time   mean {:.1}s", total_time.as_secs_f64() / runs);

    let mut ends: Vec<_> = ends.into_iter().collect();
    ends.sort_by(|a, b| b.1.cmp(&a.1));
    for (end, count) in ends {
        println!("  {:<28} {:>5} ({:.0}%)", end, count, count as f64 * 100.0 / runs);
    }

    let mut grades: Vec<_> = grades.into_iter().collect();
    grades.sort_by(|a, b| b.1.cmp(&a.1));
    let line: Vec<String> = grades
        .iter()
        .map(|(grade, count)| format!("{}:{}", grade, count))
        .collect();
    println!("grades {}", line.join("  "));
    Ok(())
}
