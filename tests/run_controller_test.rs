//! Integration test: run lifecycle
//!
//! Drives whole runs through the public simulation API and the run
//! controller with in-process leaderboards and profile stores.

use poop_runner::config::RunnerConfig;
use poop_runner::leaderboard::{
    InMemoryLeaderboard, Leaderboard, LeaderboardEntry, LeaderboardError, ScoreSubmission,
};
use poop_runner::profile::{MemoryProfileStore, Profile};
use poop_runner::runner::entities::{Altitude, Hazard};
use poop_runner::runner::{
    request_jump, tick, CollectibleKind, EffectKind, Entity, EntityKind, LeaderboardSource, Rect,
    RunController, RunEnd, SimulationState, TickEvent,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(33);
const WAIT: Duration = Duration::from_secs(5);

fn flat_config() -> RunnerConfig {
    let mut config = RunnerConfig::default();
    config.terrain.base_gap_probability = 0.0;
    config.terrain.max_extra_gap_probability = 0.0;
    config.terrain.flat_probability = 1.0;
    config
}

fn started() -> (SimulationState, ChaCha8Rng) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut state = SimulationState::new(flat_config(), &mut rng);
    state.run.waiting_to_start = false;
    (state, rng)
}

fn on_player(state: &SimulationState, kind: EntityKind) -> Entity {
    let hit = state.player.hitbox();
    Entity {
        bounds: Rect::new(hit.x, hit.y, hit.width, hit.height),
        speed: 0.0,
        kind,
    }
}

fn controller(board: Option<Arc<dyn Leaderboard>>, name: &str) -> RunController {
    let profile = MemoryProfileStore::new(Profile::new(name, ""), 10);
    RunController::new(flat_config(), Box::new(profile), board, Some(11))
}

// ── Simulation scenarios ─────────────────────────────────────────────

#[test]
fn test_three_jumps_then_rejected_until_landing() {
    let (mut state, mut rng) = started();
    assert!(state.player.grounded);
    assert_eq!(state.player.max_jumps, 3);

    assert!(request_jump(&mut state));
    assert!(request_jump(&mut state));
    assert!(request_jump(&mut state));
    assert!(!request_jump(&mut state));

    let mut landed = false;
    for _ in 0..200 {
        if tick(&mut state, FRAME, &mut rng).contains(&TickEvent::Landed) {
            landed = true;
            break;
        }
    }
    assert!(landed);
    assert!(request_jump(&mut state));
}

#[test]
fn test_decoy_costs_nothing_but_darkens_the_screen() {
    let (mut state, mut rng) = started();
    let decoy = on_player(&state, EntityKind::Collectible(CollectibleKind::Decoy));
    state.entities.push(decoy);

    let report = tick(&mut state, FRAME, &mut rng);

    assert!(report.contains(&TickEvent::DecoyPicked));
    assert_eq!(state.run.collected, 0);
    assert!(state.effects.is_active(EffectKind::VisibilityDebuff));
    assert_eq!(
        state.effects.remaining(EffectKind::VisibilityDebuff),
        state.config.effects.visibility_debuff
    );
    assert!(!state
        .entities
        .iter()
        .any(|e| e.kind == EntityKind::Collectible(CollectibleKind::Decoy)));
}

#[test]
fn test_hazard_ends_run_once_and_freezes_player() {
    let (mut state, mut rng) = started();
    let base_y = state.player.hitbox().y;
    let hazard = on_player(
        &state,
        EntityKind::Hazard(Hazard {
            altitude: Altitude::Ground,
            base_y,
            phase: 0.0,
            amplitude: 0.0,
        }),
    );
    state.entities.push(hazard);

    let report = tick(&mut state, FRAME, &mut rng);
    assert_eq!(report.died(), Some(RunEnd::HazardHit));
    assert_eq!(state.run.game_over, Some(RunEnd::HazardHit));

    let frozen = state.player.clone();
    for _ in 0..10 {
        let report = tick(&mut state, FRAME, &mut rng);
        assert!(report.events.is_empty());
    }
    assert_eq!(state.player.y, frozen.y);
    assert_eq!(state.player.vy, frozen.vy);
    assert!(!request_jump(&mut state));
}

// ── Controller lifecycle ─────────────────────────────────────────────

/// Counts calls and delegates to an in-memory board.
#[derive(Default)]
struct CountingBoard {
    inner: InMemoryLeaderboard,
    submits: AtomicUsize,
}

impl Leaderboard for CountingBoard {
    fn submit(&self, s: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.inner.submit(s)
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.inner.top(limit)
    }
}

/// Accepts submissions but can never list them.
struct ListingFails;

impl Leaderboard for ListingFails {
    fn submit(&self, _: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(Vec::new())
    }

    fn top(&self, _: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Err(LeaderboardError::Unavailable)
    }
}

/// The first submission blocks until the test releases it.
struct GatedBoard {
    inner: InMemoryLeaderboard,
    gate: Mutex<Option<Receiver<()>>>,
}

impl GatedBoard {
    fn new() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let board = Self {
            inner: InMemoryLeaderboard::default(),
            gate: Mutex::new(Some(rx)),
        };
        (board, tx)
    }
}

impl Leaderboard for GatedBoard {
    fn submit(&self, s: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let gate = self.gate.lock().map(|mut g| g.take()).unwrap_or(None);
        if let Some(gate) = gate {
            gate.recv().ok();
        }
        self.inner.submit(s)
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.inner.top(limit)
    }
}

#[test]
fn test_termination_submits_exactly_once() {
    let board = Arc::new(CountingBoard::default());
    let mut c = controller(Some(board.clone()), "kei");
    c.jump();

    assert!(c.terminate(RunEnd::Abandoned));
    assert!(!c.terminate(RunEnd::Abandoned));
    assert!(!c.terminate(RunEnd::HazardHit));
    c.frame(FRAME);

    let view = c.wait_for_leaderboard(WAIT).cloned().expect("ranking");
    assert_eq!(view.source, LeaderboardSource::Global);
    assert_eq!(board.submits.load(Ordering::SeqCst), 1);
    assert_eq!(c.result().map(|r| r.reason), Some(RunEnd::Abandoned));
}

#[test]
fn test_submitted_score_appears_in_global_view() {
    let board = Arc::new(InMemoryLeaderboard::default());
    board
        .submit(&ScoreSubmission {
            score: 42.0,
            rank: "B".to_string(),
            label: "Pretty Good".to_string(),
            name: "ann".to_string(),
            avatar_data_url: None,
        })
        .unwrap();

    let mut c = controller(Some(board), "kei");
    c.jump();
    c.terminate(RunEnd::Abandoned);

    let view = c.wait_for_leaderboard(WAIT).cloned().expect("ranking");
    assert_eq!(view.source, LeaderboardSource::Global);
    let names: Vec<&str> = view.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["ann", "kei"]);
}

#[test]
fn test_fetch_failure_falls_back_to_local_best() {
    let mut c = controller(Some(Arc::new(ListingFails)), "kei");
    c.jump();
    c.terminate(RunEnd::Abandoned);

    let view = c.wait_for_leaderboard(WAIT).cloned().expect("ranking");
    assert_eq!(view.source, LeaderboardSource::LocalCache);
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].name, "kei");
    assert!(!c.is_pending());
}

#[test]
fn test_reset_starts_a_fresh_run() {
    let mut c = controller(None, "kei");
    c.jump();
    for _ in 0..5 {
        c.frame(FRAME);
    }
    c.terminate(RunEnd::Abandoned);
    assert!(c.is_over());
    let first = c.run_id();

    c.reset();

    assert_eq!(c.run_id(), first + 1);
    assert!(!c.is_over());
    assert!(c.result().is_none());
    assert!(c.leaderboard_view().is_none());
    assert!(c.state().run.waiting_to_start);
    assert_eq!(c.state().run.elapsed, Duration::ZERO);
    // The local best list survives the reset
    assert_eq!(c.best_runs().len(), 1);
}

#[test]
fn test_late_result_of_previous_run_is_discarded() {
    let (board, release) = GatedBoard::new();
    let mut c = controller(Some(Arc::new(board)), "alpha");

    c.jump();
    c.terminate(RunEnd::Abandoned);
    assert!(c.is_pending());

    c.reset();
    c.save_profile(&Profile::new("beta", "")).unwrap();
    c.jump();
    c.terminate(RunEnd::Abandoned);

    let view = c.wait_for_leaderboard(WAIT).cloned().expect("ranking");
    let names: Vec<&str> = view.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["beta"]);

    release.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    let after = c.poll_leaderboard().cloned().expect("ranking");
    assert_eq!(after, view);
}

/// Takes a while to answer, like a distant server.
#[derive(Default)]
struct SlowBoard {
    inner: InMemoryLeaderboard,
    listed: AtomicUsize,
}

impl Leaderboard for SlowBoard {
    fn submit(&self, s: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        std::thread::sleep(Duration::from_millis(150));
        self.inner.submit(s)
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.listed.fetch_add(1, Ordering::SeqCst);
        self.inner.top(limit)
    }
}

#[test]
fn test_quitting_from_result_screen_waits_for_submission() {
    let board = Arc::new(SlowBoard::default());
    let mut c = controller(Some(board.clone()), "kei");
    c.jump();
    c.terminate(RunEnd::HazardHit);
    assert!(c.is_pending());

    let view = c.shutdown(WAIT).cloned().expect("ranking");

    assert!(!c.is_pending());
    assert_eq!(view.source, LeaderboardSource::Global);
    assert_eq!(board.inner.len(), 1);
    assert_eq!(board.listed.load(Ordering::SeqCst), 1);
    assert_eq!(c.result().map(|r| r.reason), Some(RunEnd::HazardHit));
}

#[test]
fn test_quitting_mid_run_abandons_and_submits() {
    let board = Arc::new(SlowBoard::default());
    let mut c = controller(Some(board.clone()), "kei");
    c.jump();
    c.frame(FRAME);

    let view = c.shutdown(WAIT).cloned().expect("ranking");

    assert_eq!(view.entries.len(), 1);
    assert_eq!(board.inner.len(), 1);
    assert_eq!(c.result().map(|r| r.reason), Some(RunEnd::Abandoned));
}
