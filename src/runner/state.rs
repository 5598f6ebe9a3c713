//! Everything one run owns, in one value.
//!
//! A reset builds a fresh `SimulationState` and replaces the old one, so
//! entities, timers and effects can never leak from one run into the next.

use super::effects::StatusEffects;
use super::entities::Entity;
use super::player::Player;
use super::spawner::Spawner;
use super::terrain::Terrain;
use crate::config::RunnerConfig;
use rand::Rng;
use std::time::Duration;

/// Why a run ended. These are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    HazardHit,
    FellInGap,
    /// The player quit before dying.
    Abandoned,
}

impl RunEnd {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::HazardHit => "Burned by a fireball",
            Self::FellInGap => "Fell into a gap",
            Self::Abandoned => "Run abandoned",
        }
    }
}

/// Progress counters of the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    /// Simulated time since the first jump.
    pub elapsed: Duration,
    /// Points from collected items.
    pub collected: u32,
    pub gap_probability: f64,
    /// True until the first jump.
    pub waiting_to_start: bool,
    pub game_over: Option<RunEnd>,
}

impl RunState {
    pub fn new(gap_probability: f64) -> Self {
        Self {
            elapsed: Duration::ZERO,
            collected: 0,
            gap_probability,
            waiting_to_start: true,
            game_over: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.game_over.is_some()
    }

    /// True while ticks advance the world.
    pub fn is_running(&self) -> bool {
        !self.waiting_to_start && self.game_over.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub config: RunnerConfig,
    pub player: Player,
    pub terrain: Terrain,
    pub entities: Vec<Entity>,
    pub spawner: Spawner,
    pub effects: StatusEffects,
    pub run: RunState,
}

impl SimulationState {
    /// A fresh run waiting for its first jump, with terrain already
    /// covering the viewport.
    pub fn new<R: Rng + ?Sized>(config: RunnerConfig, rng: &mut R) -> Self {
        let player = Player::new(&config.player, &config.viewport);
        let mut terrain = Terrain::new(
            config.terrain.clone(),
            config.viewport.ground_y(),
            player.base_height,
        );
        terrain.regenerate(config.viewport.width, rng);
        let spawner = Spawner::new(config.spawner.clone(), rng);
        let effects = StatusEffects::new(&config.effects);
        let run = RunState::new(terrain.gap_probability());
        Self {
            config,
            player,
            terrain,
            entities: Vec::new(),
            spawner,
            effects,
            run,
        }
    }

    /// Record the end of the run. Only the first call has any effect;
    /// returns whether this call ended it.
    pub fn end_run(&mut self, reason: RunEnd) -> bool {
        if self.run.game_over.is_some() {
            return false;
        }
        self.run.game_over = Some(reason);
        true
    }
}
