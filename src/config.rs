//! Runner tuning configuration.
//!
//! Every knob has a default matching the shipped game. A JSON file may
//! override any subset of them; missing sections fall back to defaults.

use crate::runner::score::ScoringMode;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating a [`RunnerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Durations are stored as integer milliseconds in config files.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A half-open `[min, max)` range of floats sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Sample a value; a degenerate span always yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// A half-open range of durations, in milliseconds on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalSpan {
    #[serde(with = "duration_ms")]
    pub min: Duration,
    #[serde(with = "duration_ms")]
    pub max: Duration,
}

impl IntervalSpan {
    pub const fn from_millis(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Play-field geometry in world units (canvas pixels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    /// Distance from the bottom edge up to the nominal ground line.
    pub ground_margin: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 450.0,
            ground_margin: 72.0,
        }
    }
}

impl ViewportConfig {
    /// Screen-space y of the nominal ground line.
    pub fn ground_y(&self) -> f64 {
        self.height - self.ground_margin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Sprite edge length as a fraction of the shorter viewport side.
    pub size_ratio: f64,
    /// Fixed horizontal position as a fraction of the viewport width.
    pub x_ratio: f64,
    pub gravity: f64,
    /// Vertical velocity set by a jump (negative is upward).
    pub jump_impulse: f64,
    pub max_jumps: u32,
    /// Collision box as fractions of the sprite, centred.
    pub hitbox_width: f64,
    pub hitbox_height: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            size_ratio: 0.22,
            x_ratio: 0.18,
            gravity: 1600.0,
            jump_impulse: -520.0,
            max_jumps: 3,
            hitbox_width: 0.5,
            hitbox_height: 0.7,
        }
    }
}

/// Terrain generation. Widths and slope steps are multiples of the
/// player's base height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub scroll_speed: f64,
    pub base_gap_probability: f64,
    pub max_extra_gap_probability: f64,
    #[serde(with = "duration_ms")]
    pub gap_ramp: Duration,
    pub flat_probability: f64,
    pub bonus_probability: f64,
    pub start_x: f64,
    /// Segments starting left of this x are always flat, so a fresh run
    /// starts on level ground.
    pub safe_start: f64,
    /// Generated coverage beyond the right viewport edge.
    pub lead: f64,
    /// Segments are evicted once this far past the left edge.
    pub trail: f64,
    pub flat_width: Span,
    pub slope_width: Span,
    pub gap_width: Span,
    pub slope_step: Span,
    pub slope_max: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            scroll_speed: 140.0,
            base_gap_probability: 0.3,
            max_extra_gap_probability: 0.3,
            gap_ramp: Duration::from_secs(40),
            flat_probability: 0.05,
            bonus_probability: 0.15,
            start_x: -50.0,
            safe_start: 300.0,
            lead: 200.0,
            trail: 200.0,
            flat_width: Span::new(1.0, 1.4),
            slope_width: Span::new(0.7, 1.0),
            gap_width: Span::new(0.8, 1.3),
            slope_step: Span::new(0.3, 0.6),
            slope_max: 0.6,
        }
    }
}

/// Entity spawning. Sizes and heights are multiples of the player's base
/// height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub hazard_interval: IntervalSpan,
    pub collectible_interval: IntervalSpan,
    pub special_interval: IntervalSpan,
    pub max_hazards: usize,
    pub max_collectibles: usize,
    pub max_power_ups: usize,
    /// Spawn x is this far beyond the right viewport edge.
    pub spawn_margin: f64,
    /// Entities are culled once their right edge passes this far left of 0.
    pub cull_margin: f64,

    pub hazard_width: Span,
    pub hazard_height: Span,
    pub hazard_speed: Span,
    pub elevated_probability: f64,
    pub elevation: f64,
    /// Vertical sway angular speed in radians per second.
    pub sway_speed: f64,
    /// Sway amplitude as a fraction of the hazard's height.
    pub sway_amplitude: f64,
    /// Hazard collision box as a centred fraction of its bounds.
    pub hazard_hitbox: f64,

    pub collectible_speed: f64,
    pub inverter_probability: f64,
    pub decoy_probability: f64,

    pub power_up_size: f64,
    pub power_up_float: f64,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            hazard_interval: IntervalSpan::from_millis(2200, 3800),
            collectible_interval: IntervalSpan::from_millis(1500, 2600),
            special_interval: IntervalSpan::from_millis(9000, 15000),
            max_hazards: 2,
            max_collectibles: 6,
            max_power_ups: 1,
            spawn_margin: 20.0,
            cull_margin: 80.0,

            hazard_width: Span::new(1.0, 1.4),
            hazard_height: Span::new(0.6, 0.9),
            hazard_speed: Span::new(198.0, 270.0),
            elevated_probability: 0.35,
            elevation: 1.2,
            sway_speed: 4.0,
            sway_amplitude: 0.15,
            hazard_hitbox: 0.55,

            collectible_speed: 160.0,
            inverter_probability: 0.15,
            decoy_probability: 0.17,

            power_up_size: 0.8,
            power_up_float: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    #[serde(with = "duration_ms")]
    pub size_boost: Duration,
    pub size_multiplier: f64,
    #[serde(with = "duration_ms")]
    pub jump_boost: Duration,
    pub jump_multiplier: f64,
    #[serde(with = "duration_ms")]
    pub inversion: Duration,
    #[serde(with = "duration_ms")]
    pub inversion_flash: Duration,
    #[serde(with = "duration_ms")]
    pub visibility_debuff: Duration,
    pub debuff_max_opacity: f64,
    /// Extending an active effect never pushes it past this many full
    /// durations.
    pub max_stack: u32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            size_boost: Duration::from_secs(6),
            size_multiplier: 1.5,
            jump_boost: Duration::from_secs(6),
            jump_multiplier: 1.3,
            inversion: Duration::from_secs(5),
            inversion_flash: Duration::from_millis(180),
            visibility_debuff: Duration::from_millis(2500),
            debuff_max_opacity: 0.8,
            max_stack: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    #[serde(with = "duration_ms")]
    pub frame_interval: Duration,
    #[serde(with = "duration_ms")]
    pub max_delta: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(33),
            max_delta: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Base URL of the leaderboard server; `None` plays offline.
    pub server_url: Option<String>,
    pub fetch_limit: usize,
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
    /// How many local best runs are kept on disk.
    pub local_best_limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            fetch_limit: 10,
            timeout: Duration::from_secs(3),
            local_best_limit: 10,
        }
    }
}

/// Complete runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub scoring: ScoringMode,
    pub viewport: ViewportConfig,
    pub player: PlayerConfig,
    pub terrain: TerrainConfig,
    pub spawner: SpawnerConfig,
    pub effects: EffectsConfig,
    #[serde(rename = "loop")]
    pub game_loop: LoopConfig,
    pub leaderboard: LeaderboardConfig,
}

impl RunnerConfig {
    /// Load from an optional JSON file. A path that does not exist yields
    /// the defaults; an unreadable or malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            None => Self::default(),
            Some(path) if !path.exists() => {
                log::info!("config {} not found, using defaults", path.display());
                Self::default()
            }
            Some(path) => {
                let display = path.display().to_string();
                let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: display.clone(),
                    source,
                })?;
                Self::from_json(&json).map_err(|source| ConfigError::Parse {
                    path: display,
                    source,
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return invalid("viewport dimensions must be positive");
        }
        if self.viewport.ground_margin < 0.0 || self.viewport.ground_margin >= self.viewport.height
        {
            return invalid("ground_margin must lie inside the viewport");
        }
        if self.player.max_jumps == 0 {
            return invalid("max_jumps must be at least 1");
        }
        if !(self.player.size_ratio > 0.0) {
            return invalid("player size_ratio must be positive");
        }
        let fractions = [self.player.hitbox_width, self.player.hitbox_height, self.spawner.hazard_hitbox];
        if fractions.iter().any(|f| !(*f > 0.0 && *f <= 1.0)) {
            return invalid("hitbox fractions must lie in (0, 1]");
        }
        let spans = [
            self.terrain.flat_width,
            self.terrain.slope_width,
            self.terrain.gap_width,
            self.terrain.slope_step,
            self.spawner.hazard_width,
            self.spawner.hazard_height,
            self.spawner.hazard_speed,
        ];
        if spans.iter().any(|s| !s.is_valid()) {
            return invalid("random ranges must be finite with min <= max");
        }
        if self.terrain.flat_width.min <= 0.0
            || self.terrain.slope_width.min <= 0.0
            || self.terrain.gap_width.min <= 0.0
        {
            return invalid("segment widths must be positive");
        }
        let intervals = [
            self.spawner.hazard_interval,
            self.spawner.collectible_interval,
            self.spawner.special_interval,
        ];
        if intervals.iter().any(|i| i.min > i.max) {
            return invalid("spawn intervals must have min <= max");
        }
        let probabilities = [
            self.terrain.base_gap_probability,
            self.terrain.max_extra_gap_probability,
            self.terrain.flat_probability,
            self.terrain.bonus_probability,
            self.spawner.elevated_probability,
            self.spawner.inverter_probability,
            self.spawner.decoy_probability,
        ];
        if probabilities.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return invalid("probabilities must lie in [0, 1]");
        }
        if self.spawner.inverter_probability + self.spawner.decoy_probability > 1.0 {
            return invalid("inverter and decoy probabilities must sum to at most 1");
        }
        if self.game_loop.max_delta.is_zero() {
            return invalid("max_delta must be positive");
        }
        if self.effects.max_stack == 0 {
            return invalid("max_stack must be at least 1");
        }
        Ok(())
    }

    /// Player sprite edge length for this viewport.
    pub fn player_size(&self) -> f64 {
        self.viewport.width.min(self.viewport.height) * self.player.size_ratio
    }
}
