//! Timed entity spawning.
//!
//! Each category runs its own randomized countdown. When a countdown
//! expires a spawn is attempted; if the category is at its population cap
//! the countdown stays expired and retries on the next tick. A successful
//! spawn draws a fresh interval.

use super::entities::{
    count_category, Altitude, CollectibleKind, Entity, EntityCategory, EntityKind, Hazard,
    PowerUpKind,
};
use super::geometry::Rect;
use super::terrain::Terrain;
use crate::config::{IntervalSpan, SpawnerConfig};
use rand::Rng;
use std::f64::consts::TAU;
use std::time::Duration;

/// A countdown that expires once its remaining time reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTimer {
    remaining: Duration,
}

impl SpawnTimer {
    pub fn new<R: Rng + ?Sized>(interval: &IntervalSpan, rng: &mut R) -> Self {
        Self {
            remaining: interval.sample(rng),
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Count down by `dt`; true once expired.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }

    pub fn rearm<R: Rng + ?Sized>(&mut self, interval: &IntervalSpan, rng: &mut R) {
        self.remaining = interval.sample(rng);
    }
}

/// What the spawner needs to know about the world.
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub terrain: &'a Terrain,
    pub viewport_width: f64,
    /// Player base height; entity sizes scale with it.
    pub unit: f64,
}

impl SpawnContext<'_> {
    fn spawn_x(&self, margin: f64) -> f64 {
        self.viewport_width + margin
    }
}

/// Pick a collectible kind from one uniform roll in `[0, 1)`.
///
/// Inverter and decoy share the roll, so a single spawn can never be both.
pub fn roll_collectible(roll: f64, config: &SpawnerConfig, bonus: bool) -> CollectibleKind {
    if roll < config.inverter_probability {
        CollectibleKind::Inverter
    } else if roll < config.inverter_probability + config.decoy_probability {
        CollectibleKind::Decoy
    } else {
        CollectibleKind::Normal { bonus }
    }
}

/// The three spawn countdowns.
#[derive(Debug, Clone)]
pub struct Spawner {
    config: SpawnerConfig,
    hazard: SpawnTimer,
    collectible: SpawnTimer,
    special: SpawnTimer,
}

impl Spawner {
    pub fn new<R: Rng + ?Sized>(config: SpawnerConfig, rng: &mut R) -> Self {
        let hazard = SpawnTimer::new(&config.hazard_interval, rng);
        let collectible = SpawnTimer::new(&config.collectible_interval, rng);
        let special = SpawnTimer::new(&config.special_interval, rng);
        Self {
            config,
            hazard,
            collectible,
            special,
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn timer(&self, category: EntityCategory) -> &SpawnTimer {
        match category {
            EntityCategory::Hazard => &self.hazard,
            EntityCategory::Collectible => &self.collectible,
            EntityCategory::PowerUp => &self.special,
        }
    }

    fn cap(&self, category: EntityCategory) -> usize {
        match category {
            EntityCategory::Hazard => self.config.max_hazards,
            EntityCategory::Collectible => self.config.max_collectibles,
            EntityCategory::PowerUp => self.config.max_power_ups,
        }
    }

    /// Advance all countdowns by `dt` and spawn whatever is due. Returns the
    /// categories that actually spawned this tick.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: Duration,
        ctx: SpawnContext<'_>,
        entities: &mut Vec<Entity>,
        rng: &mut R,
    ) -> Vec<EntityCategory> {
        let mut spawned = Vec::new();
        for category in [
            EntityCategory::Hazard,
            EntityCategory::Collectible,
            EntityCategory::PowerUp,
        ] {
            let expired = match category {
                EntityCategory::Hazard => self.hazard.tick(dt),
                EntityCategory::Collectible => self.collectible.tick(dt),
                EntityCategory::PowerUp => self.special.tick(dt),
            };
            if !expired || count_category(entities, category) >= self.cap(category) {
                continue;
            }

            let entity = match category {
                EntityCategory::Hazard => self.spawn_hazard(ctx, rng),
                EntityCategory::Collectible => self.spawn_collectible(ctx, rng),
                EntityCategory::PowerUp => self.spawn_power_up(ctx, rng),
            };
            entities.push(entity);
            spawned.push(category);

            let config = &self.config;
            match category {
                EntityCategory::Hazard => self.hazard.rearm(&config.hazard_interval, rng),
                EntityCategory::Collectible => {
                    self.collectible.rearm(&config.collectible_interval, rng)
                }
                EntityCategory::PowerUp => self.special.rearm(&config.special_interval, rng),
            }
        }
        spawned
    }

    /// A fireball resting on the local ground or hovering in the elevated
    /// band.
    pub fn spawn_hazard<R: Rng + ?Sized>(&self, ctx: SpawnContext<'_>, rng: &mut R) -> Entity {
        let config = &self.config;
        let width = ctx.unit * config.hazard_width.sample(rng);
        let height = ctx.unit * config.hazard_height.sample(rng);
        let x = ctx.spawn_x(config.spawn_margin);

        let resting_y = ctx.terrain.surface_at(x) - height;
        let (altitude, base_y) = if rng.gen::<f64>() < config.elevated_probability {
            (Altitude::Elevated, resting_y - ctx.unit * config.elevation)
        } else {
            (Altitude::Ground, resting_y)
        };

        let phase = rng.gen_range(0.0..TAU);
        let amplitude = height * config.sway_amplitude;
        Entity {
            bounds: Rect::new(x, base_y + phase.sin() * amplitude, width, height),
            speed: config.hazard_speed.sample(rng),
            kind: EntityKind::Hazard(Hazard {
                altitude,
                base_y,
                phase,
                amplitude,
            }),
        }
    }

    /// A collectible resting on the ground under the spawn point.
    pub fn spawn_collectible<R: Rng + ?Sized>(
        &self,
        ctx: SpawnContext<'_>,
        rng: &mut R,
    ) -> Entity {
        let config = &self.config;
        let size = ctx.unit;
        let x = ctx.spawn_x(config.spawn_margin);
        let ground = ctx.terrain.height_at(x);
        let y = ctx.terrain.surface_at(x) - size;

        let kind = roll_collectible(rng.gen(), config, ground.bonus);
        Entity {
            bounds: Rect::new(x, y, size, size),
            speed: config.collectible_speed,
            kind: EntityKind::Collectible(kind),
        }
    }

    /// A power-up floating above the ground.
    pub fn spawn_power_up<R: Rng + ?Sized>(&self, ctx: SpawnContext<'_>, rng: &mut R) -> Entity {
        let config = &self.config;
        let size = ctx.unit * config.power_up_size;
        let x = ctx.spawn_x(config.spawn_margin);
        let y = ctx.terrain.surface_at(x) - size - ctx.unit * config.power_up_float;

        let kind = if rng.gen::<bool>() {
            PowerUpKind::SizeBoost
        } else {
            PowerUpKind::JumpBoost
        };
        Entity {
            bounds: Rect::new(x, y, size, size),
            speed: config.collectible_speed,
            kind: EntityKind::PowerUp(kind),
        }
    }
}
