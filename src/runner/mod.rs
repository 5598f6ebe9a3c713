//! The endless-runner simulation core.
//!
//! Everything here is deterministic given an RNG and a sequence of tick
//! durations; the only I/O happens behind the collaborators the
//! [`controller::RunController`] is handed.

pub mod clock;
pub mod controller;
pub mod effects;
pub mod entities;
pub mod geometry;
pub mod physics;
pub mod player;
pub mod score;
pub mod spawner;
pub mod state;
pub mod terrain;

pub use clock::LoopClock;
pub use controller::{LeaderboardSource, LeaderboardView, RunController};
pub use effects::{EffectKind, EffectTransition, InversionPhase, StatusEffects};
pub use entities::{CollectibleKind, Entity, EntityCategory, EntityKind, PowerUpKind};
pub use geometry::Rect;
pub use physics::{request_jump, tick, TickEvent, TickReport};
pub use player::Player;
pub use score::{evaluate_rank, final_score, Rank, RunResult, ScoringMode};
pub use spawner::Spawner;
pub use state::{RunEnd, RunState, SimulationState};
pub use terrain::{GroundInfo, Segment, SegmentKind, Terrain};
