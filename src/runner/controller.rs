//! Run lifecycle around the simulation: start, termination, scoring, the
//! local best list and the background leaderboard round trip.

use super::physics::{request_jump, tick, TickReport};
use super::score::RunResult;
use super::state::{RunEnd, SimulationState};
use crate::config::RunnerConfig;
use crate::leaderboard::{Leaderboard, LeaderboardEntry, ScoreSubmission};
use crate::profile::{Profile, ProfileError, ProfileStore, RunRecord};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardSource {
    Global,
    /// The global ranking could not be fetched (or there is no server).
    LocalCache,
}

/// Ranking shown on the result screen.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardView {
    pub entries: Vec<LeaderboardEntry>,
    pub source: LeaderboardSource,
}

impl LeaderboardView {
    fn local(runs: &[RunRecord]) -> Self {
        Self {
            entries: runs.iter().map(RunRecord::to_entry).collect(),
            source: LeaderboardSource::LocalCache,
        }
    }
}

/// A finished background round trip, tagged with the run it belongs to.
struct Outcome {
    run_id: u64,
    view: LeaderboardView,
}

pub struct RunController {
    config: RunnerConfig,
    state: SimulationState,
    rng: ChaCha8Rng,
    profile: Box<dyn ProfileStore>,
    leaderboard: Option<Arc<dyn Leaderboard>>,
    run_id: u64,
    result: Option<RunResult>,
    view: Option<LeaderboardView>,
    pending: bool,
    sender: Sender<Outcome>,
    receiver: Receiver<Outcome>,
}

impl RunController {
    /// `seed` makes the run sequence reproducible; `None` seeds from the OS.
    pub fn new(
        config: RunnerConfig,
        profile: Box<dyn ProfileStore>,
        leaderboard: Option<Arc<dyn Leaderboard>>,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let state = SimulationState::new(config.clone(), &mut rng);
        let (sender, receiver) = mpsc::channel();
        Self {
            config,
            state,
            rng,
            profile,
            leaderboard,
            run_id: 0,
            result: None,
            view: None,
            pending: false,
            sender,
            receiver,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.state.run.is_over()
    }

    /// True while a submission for the current run is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn profile(&self) -> Profile {
        self.profile.profile()
    }

    pub fn save_profile(&mut self, profile: &Profile) -> Result<(), ProfileError> {
        self.profile.save_profile(profile)
    }

    pub fn best_runs(&self) -> Vec<RunRecord> {
        self.profile.best_runs()
    }

    pub fn jump(&mut self) -> bool {
        request_jump(&mut self.state)
    }

    /// Advance one frame; a death in this frame finishes the run.
    pub fn frame(&mut self, dt: Duration) -> TickReport {
        let report = tick(&mut self.state, dt, &mut self.rng);
        if let Some(reason) = report.died() {
            self.finish_run(reason);
        }
        report
    }

    /// End the run from outside the simulation (e.g. the player quit).
    /// Only the first termination counts.
    pub fn terminate(&mut self, reason: RunEnd) -> bool {
        if !self.state.end_run(reason) {
            return false;
        }
        self.finish_run(reason);
        true
    }

    fn finish_run(&mut self, reason: RunEnd) {
        if self.result.is_some() {
            return;
        }
        let display_name = self.profile.profile().display_name();
        let result = RunResult::evaluate(self.config.scoring, &self.state.run, reason, &display_name);
        log::info!(
            "run {} over ({}): {} {} [{}] {}",
            self.run_id,
            reason.describe(),
            result.score,
            self.config.scoring.unit(),
            result.rank.grade,
            result.rank.label
        );

        let record = RunRecord {
            score: result.score,
            rank: result.rank.grade.to_string(),
            label: result.rank.label.to_string(),
            name: display_name.clone(),
        };
        let local = match self.profile.record_local_best(record) {
            Ok(runs) => runs,
            Err(e) => {
                log::warn!("could not save local best runs: {}", e);
                self.profile.best_runs()
            }
        };

        let submission = ScoreSubmission {
            score: f64::from(result.score),
            rank: result.rank.grade.to_string(),
            label: result.rank.label.to_string(),
            name: display_name,
            avatar_data_url: None,
        };
        self.result = Some(result);

        match self.leaderboard.clone() {
            Some(board) => self.spawn_submission(board, submission, local),
            None => self.view = Some(LeaderboardView::local(&local)),
        }
    }

    /// Submit then fetch on a background thread. The outcome comes back
    /// over the channel.
    fn spawn_submission(
        &mut self,
        board: Arc<dyn Leaderboard>,
        submission: ScoreSubmission,
        local: Vec<RunRecord>,
    ) {
        let sender = self.sender.clone();
        let run_id = self.run_id;
        let limit = self.config.leaderboard.fetch_limit;
        let spawned = thread::Builder::new()
            .name("leaderboard".to_string())
            .spawn(move || {
                if let Err(e) = board.submit(&submission) {
                    log::warn!("score submission failed: {}", e);
                }
                let view = match board.top(limit) {
                    Ok(entries) => LeaderboardView {
                        entries,
                        source: LeaderboardSource::Global,
                    },
                    Err(e) => {
                        log::warn!("ranking fetch failed, showing local best: {}", e);
                        LeaderboardView::local(&local)
                    }
                };
                // The controller may already be gone
                sender.send(Outcome { run_id, view }).ok();
            });

        match spawned {
            Ok(_) => self.pending = true,
            Err(e) => {
                log::warn!("could not start leaderboard thread: {}", e);
                self.view = Some(LeaderboardView::local(&self.profile.best_runs()));
            }
        }
    }

    fn accept(&mut self, outcome: Outcome) -> bool {
        if outcome.run_id != self.run_id {
            log::debug!("discarding leaderboard result of run {}", outcome.run_id);
            return false;
        }
        self.view = Some(outcome.view);
        self.pending = false;
        true
    }

    /// Pick up a finished round trip without blocking.
    pub fn poll_leaderboard(&mut self) -> Option<&LeaderboardView> {
        while let Ok(outcome) = self.receiver.try_recv() {
            self.accept(outcome);
        }
        self.view.as_ref()
    }

    /// Block up to `timeout` for the current run's ranking.
    pub fn wait_for_leaderboard(&mut self, timeout: Duration) -> Option<&LeaderboardView> {
        let deadline = Instant::now() + timeout;
        while self.pending {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.accept(outcome);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.view.as_ref()
    }

    /// Wind down before exit: a run still in progress ends as abandoned,
    /// then any round trip in flight gets up to `timeout` to land.
    pub fn shutdown(&mut self, timeout: Duration) -> Option<&LeaderboardView> {
        if self.state.run.is_running() {
            self.terminate(RunEnd::Abandoned);
        }
        if self.pending {
            self.wait_for_leaderboard(timeout);
        }
        self.view.as_ref()
    }

    pub fn leaderboard_view(&self) -> Option<&LeaderboardView> {
        self.view.as_ref()
    }

    /// Start over with a fresh world. Any result still in flight for the
    /// previous run is ignored when it arrives.
    pub fn reset(&mut self) {
        self.state = SimulationState::new(self.config.clone(), &mut self.rng);
        self.run_id += 1;
        self.result = None;
        self.view = None;
        self.pending = false;
    }
}
