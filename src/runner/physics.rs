//! One simulation step: scrolling, gravity, ground contact, spawning and
//! collision resolution.

use super::effects::{EffectKind, EffectTransition};
use super::entities::{CollectibleKind, EntityCategory, EntityKind, PowerUpKind};
use super::spawner::SpawnContext;
use super::state::{RunEnd, SimulationState};
use super::terrain::gap_probability;
use rand::Rng;
use std::time::Duration;

/// Feet more than this share of the player's height below the surface
/// before a tick mean the player is inside a pit, not on a rising slope.
const PIT_WALL_RATIO: f64 = 0.25;

/// Something that happened during a tick, for the front end to react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickEvent {
    Landed,
    Collected { points: u32 },
    DecoyPicked,
    /// An inverter was picked up; `started` is false while an inversion is
    /// already running.
    InverterPicked { started: bool },
    PowerUp(PowerUpKind),
    Spawned(EntityCategory),
    Effect(EffectTransition),
    Died(RunEnd),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<TickEvent>,
}

impl TickReport {
    pub fn died(&self) -> Option<RunEnd> {
        self.events.iter().find_map(|event| match event {
            TickEvent::Died(reason) => Some(*reason),
            _ => None,
        })
    }

    pub fn points(&self) -> u32 {
        self.events
            .iter()
            .map(|event| match event {
                TickEvent::Collected { points } => *points,
                _ => 0,
            })
            .sum()
    }

    pub fn contains(&self, event: &TickEvent) -> bool {
        self.events.contains(event)
    }
}

/// Handle a jump request. The first jump of a run also starts it; no jump
/// is honoured after game over.
pub fn request_jump(state: &mut SimulationState) -> bool {
    if state.run.is_over() {
        return false;
    }
    state.run.waiting_to_start = false;
    state.player.try_jump()
}

/// Advance the simulation by `dt`, clamped to the configured maximum.
/// Does nothing while waiting to start or after game over.
pub fn tick<R: Rng + ?Sized>(
    state: &mut SimulationState,
    dt: Duration,
    rng: &mut R,
) -> TickReport {
    let mut report = TickReport::default();
    if !state.run.is_running() {
        return report;
    }
    let dt = dt.min(state.config.game_loop.max_delta);
    let secs = dt.as_secs_f64();

    scroll_world(state, dt, rng);

    for transition in state.effects.tick(dt) {
        report.events.push(TickEvent::Effect(transition));
    }
    let (size, jump) = (
        state.effects.size_multiplier(),
        state.effects.jump_multiplier(),
    );
    state.player.apply_multipliers(size, jump);

    if let Some(reason) = step_player(state, secs, &mut report) {
        finish(state, reason, &mut report);
        return report;
    }

    let ctx = SpawnContext {
        terrain: &state.terrain,
        viewport_width: state.config.viewport.width,
        unit: state.player.base_height,
    };
    for category in state.spawner.advance(dt, ctx, &mut state.entities, rng) {
        report.events.push(TickEvent::Spawned(category));
    }

    let sway_speed = state.config.spawner.sway_speed;
    let cull_margin = state.config.spawner.cull_margin;
    for entity in &mut state.entities {
        entity.advance(secs, sway_speed);
    }
    state.entities.retain(|entity| !entity.is_offscreen(cull_margin));

    if let Some(reason) = resolve_collisions(state, &mut report) {
        finish(state, reason, &mut report);
    }
    report
}

/// Elapsed time and gap ramp, then terrain scroll, eviction and streaming.
fn scroll_world<R: Rng + ?Sized>(state: &mut SimulationState, dt: Duration, rng: &mut R) {
    state.run.elapsed += dt;
    let probability = gap_probability(&state.config.terrain, state.run.elapsed);
    state.run.gap_probability = probability;
    state.terrain.set_gap_probability(probability);

    let dx = state.config.terrain.scroll_speed * dt.as_secs_f64();
    state.terrain.scroll(dx);
    state.terrain.evict_offscreen(0.0);
    state.terrain.ensure_generated(state.config.viewport.width, rng);
}

/// Gravity and ground contact. Returns the reason if the player fell out.
fn step_player(state: &mut SimulationState, secs: f64, report: &mut TickReport) -> Option<RunEnd> {
    let player = &mut state.player;
    let bottom_before = player.bottom();
    player.integrate(secs);

    let ground = state.terrain.height_at(player.center_x());
    if ground.is_gap {
        player.grounded = false;
        if player.y > state.config.viewport.height {
            return Some(RunEnd::FellInGap);
        }
        return None;
    }

    if bottom_before - ground.ground_y > player.height * PIT_WALL_RATIO {
        player.grounded = false;
        if player.y > state.config.viewport.height {
            return Some(RunEnd::FellInGap);
        }
        return None;
    }

    if player.land_on(ground.ground_y) {
        report.events.push(TickEvent::Landed);
    }
    None
}

/// Overlaps between the player and entities. Hazards end the run at once;
/// everything else is consumed.
fn resolve_collisions(state: &mut SimulationState, report: &mut TickReport) -> Option<RunEnd> {
    let hitbox = state.player.hitbox();
    let hazard_fraction = state.config.spawner.hazard_hitbox;

    if state
        .entities
        .iter()
        .filter(|entity| entity.is_hazard())
        .any(|entity| entity.hitbox(hazard_fraction).overlaps(&hitbox))
    {
        return Some(RunEnd::HazardHit);
    }

    let mut index = 0;
    while index < state.entities.len() {
        if !state.entities[index].hitbox(hazard_fraction).overlaps(&hitbox) {
            index += 1;
            continue;
        }
        let entity = state.entities.remove(index);
        match entity.kind {
            EntityKind::Hazard(_) => {}
            EntityKind::Collectible(CollectibleKind::Normal { bonus }) => {
                let points = if bonus { 2 } else { 1 };
                state.run.collected += points;
                report.events.push(TickEvent::Collected { points });
            }
            EntityKind::Collectible(CollectibleKind::Decoy) => {
                state.effects.trigger(EffectKind::VisibilityDebuff);
                report.events.push(TickEvent::DecoyPicked);
            }
            EntityKind::Collectible(CollectibleKind::Inverter) => {
                let started = state.effects.trigger(EffectKind::InvertWorld);
                report.events.push(TickEvent::InverterPicked { started });
            }
            EntityKind::PowerUp(kind) => {
                let effect = match kind {
                    PowerUpKind::SizeBoost => EffectKind::SizeBoost,
                    PowerUpKind::JumpBoost => EffectKind::JumpBoost,
                };
                state.effects.trigger(effect);
                report.events.push(TickEvent::PowerUp(kind));
            }
        }
    }
    None
}

fn finish(state: &mut SimulationState, reason: RunEnd, report: &mut TickReport) {
    if state.end_run(reason) {
        report.events.push(TickEvent::Died(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::runner::entities::{Altitude, Entity, Hazard};
    use crate::runner::geometry::Rect;
    use crate::runner::terrain::SegmentKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const FRAME: Duration = Duration::from_millis(33);

    fn flat_config() -> RunnerConfig {
        let mut config = RunnerConfig::default();
        config.terrain.base_gap_probability = 0.0;
        config.terrain.max_extra_gap_probability = 0.0;
        config.terrain.flat_probability = 1.0;
        config.terrain.bonus_probability = 0.0;
        config
    }

    fn new_state(config: RunnerConfig) -> (SimulationState, ChaCha8Rng) {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let state = SimulationState::new(config, &mut rng);
        (state, rng)
    }

    /// A flat-world run that has already started.
    fn started_state() -> (SimulationState, ChaCha8Rng) {
        let (mut state, rng) = new_state(flat_config());
        state.run.waiting_to_start = false;
        (state, rng)
    }

    fn entity_on_player(state: &SimulationState, kind: EntityKind) -> Entity {
        let hit = state.player.hitbox();
        Entity {
            bounds: Rect::new(hit.x, hit.y, hit.width, hit.height),
            speed: 0.0,
            kind,
        }
    }

    #[test]
    fn test_tick_skipped_while_waiting() {
        let (mut state, mut rng) = new_state(flat_config());
        let before = state.terrain.segments().front().map(|s| s.x);
        let report = tick(&mut state, FRAME, &mut rng);
        assert!(report.events.is_empty());
        assert_eq!(state.run.elapsed, Duration::ZERO);
        assert_eq!(state.terrain.segments().front().map(|s| s.x), before);
    }

    #[test]
    fn test_first_jump_starts_run() {
        let (mut state, _) = new_state(flat_config());
        assert!(request_jump(&mut state));
        assert!(!state.run.waiting_to_start);
        assert_eq!(state.player.used_jumps, 1);
    }

    #[test]
    fn test_no_jump_after_game_over() {
        let (mut state, _) = started_state();
        state.end_run(RunEnd::HazardHit);
        assert!(!request_jump(&mut state));
        assert_eq!(state.player.used_jumps, 0);
    }

    #[test]
    fn test_tick_skipped_after_game_over() {
        let (mut state, mut rng) = started_state();
        state.end_run(RunEnd::FellInGap);
        let elapsed = state.run.elapsed;
        tick(&mut state, FRAME, &mut rng);
        assert_eq!(state.run.elapsed, elapsed);
    }

    #[test]
    fn test_delta_is_clamped() {
        let (mut state, mut rng) = started_state();
        tick(&mut state, Duration::from_secs(2), &mut rng);
        assert_eq!(state.run.elapsed, Duration::from_millis(50));
    }

    #[test]
    fn test_triple_jump_and_landing_resets() {
        let (mut state, mut rng) = started_state();
        assert!(request_jump(&mut state));
        assert!(request_jump(&mut state));
        assert!(request_jump(&mut state));
        assert!(!request_jump(&mut state));
        assert_eq!(state.player.used_jumps, 3);

        let mut landed = false;
        for _ in 0..200 {
            let report = tick(&mut state, FRAME, &mut rng);
            state.entities.clear();
            if report.contains(&TickEvent::Landed) {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(state.player.used_jumps, 0);
        assert!(state.player.grounded);
    }

    #[test]
    fn test_grounded_player_stays_on_flat_ground() {
        let (mut state, mut rng) = started_state();
        let ground = state.config.viewport.ground_y();
        for _ in 0..60 {
            tick(&mut state, FRAME, &mut rng);
            state.entities.clear();
            assert!(state.player.grounded);
            assert!((state.player.bottom() - ground).abs() < 1e-6);
        }
    }

    #[test]
    fn test_terrain_scrolls_by_speed() {
        let (mut state, mut rng) = started_state();
        let before = state.terrain.segments()[0].x;
        tick(&mut state, Duration::from_millis(50), &mut rng);
        // 140 units/s for 50 ms
        assert!((state.terrain.segments()[0].x - (before - 7.0)).abs() < 1e-9);
    }

    #[test]
    fn test_gap_ramp_updates_with_elapsed() {
        let (mut state, mut rng) = new_state(RunnerConfig::default());
        state.run.waiting_to_start = false;
        state.run.elapsed = Duration::from_secs(20);
        tick(&mut state, Duration::from_millis(20), &mut rng);
        let expected = 0.3 + 0.3 * (20.02 / 40.0);
        assert!((state.run.gap_probability - expected).abs() < 1e-9);
        assert!((state.terrain.gap_probability() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_hazard_overlap_ends_run() {
        let (mut state, mut rng) = started_state();
        let fireball = EntityKind::Hazard(Hazard {
            altitude: Altitude::Ground,
            base_y: state.player.hitbox().y,
            phase: 0.0,
            amplitude: 0.0,
        });
        let e = entity_on_player(&state, fireball);
        state.entities.push(e);
        let report = tick(&mut state, FRAME, &mut rng);
        assert_eq!(report.died(), Some(RunEnd::HazardHit));
        assert_eq!(state.run.game_over, Some(RunEnd::HazardHit));
        assert!(!request_jump(&mut state));
    }

    #[test]
    fn test_collect_normal_and_bonus() {
        let (mut state, mut rng) = started_state();
        for bonus in [false, true] {
            let e = entity_on_player(&state, EntityKind::Collectible(CollectibleKind::Normal { bonus }));
            state.entities.push(e);
        }
        let report = tick(&mut state, FRAME, &mut rng);
        assert_eq!(report.points(), 3);
        assert_eq!(state.run.collected, 3);
        assert!(state.entities.iter().all(|e| e.bounds.x > 800.0));
    }

    #[test]
    fn test_decoy_scores_nothing_and_darkens() {
        let (mut state, mut rng) = started_state();
        let e = entity_on_player(&state, EntityKind::Collectible(CollectibleKind::Decoy));
        state.entities.push(e);
        let report = tick(&mut state, FRAME, &mut rng);
        assert!(report.contains(&TickEvent::DecoyPicked));
        assert_eq!(state.run.collected, 0);
        assert!(state.effects.is_active(EffectKind::VisibilityDebuff));
        assert!(state.effects.debuff_opacity() > 0.7);
    }

    #[test]
    fn test_inverter_ignored_while_inverting() {
        let (mut state, mut rng) = started_state();
        let e = entity_on_player(&state, EntityKind::Collectible(CollectibleKind::Inverter));
        state.entities.push(e);
        let report = tick(&mut state, FRAME, &mut rng);
        assert!(report.contains(&TickEvent::InverterPicked { started: true }));

        let e = entity_on_player(&state, EntityKind::Collectible(CollectibleKind::Inverter));
        state.entities.push(e);
        let report = tick(&mut state, FRAME, &mut rng);
        assert!(report.contains(&TickEvent::InverterPicked { started: false }));
    }

    #[test]
    fn test_size_boost_grows_player_then_reverts() {
        let (mut state, mut rng) = started_state();
        let base = state.player.base_height;
        let e = entity_on_player(&state, EntityKind::PowerUp(PowerUpKind::SizeBoost));
        state.entities.push(e);
        tick(&mut state, FRAME, &mut rng);
        // multipliers are applied at the start of the following tick
        tick(&mut state, FRAME, &mut rng);
        assert!((state.player.height - base * 1.5).abs() < 1e-9);

        for _ in 0..250 {
            tick(&mut state, Duration::from_millis(50), &mut rng);
            state.entities.clear();
            if state.run.is_over() {
                break;
            }
        }
        assert!(!state.run.is_over());
        assert!((state.player.height - base).abs() < 1e-9);
    }

    #[test]
    fn test_fall_into_gap_ends_run() {
        let (mut state, mut rng) = started_state();
        state.config.terrain.scroll_speed = 0.0;

        // Alternating gaps and flats, then move a gap under the player
        let gappy = crate::config::TerrainConfig {
            flat_probability: 0.0,
            ..state.config.terrain.clone()
        };
        let mut terrain = crate::runner::terrain::Terrain::new(
            gappy,
            state.config.viewport.ground_y(),
            state.player.base_height,
        );
        terrain.set_gap_probability(1.0);
        terrain.regenerate(state.config.viewport.width, &mut rng);
        let gap_center = terrain
            .segments()
            .iter()
            .find(|s| s.kind == SegmentKind::Gap)
            .map(|s| s.x + s.width / 2.0);
        let Some(gap_center) = gap_center else {
            panic!("expected a gap segment");
        };
        terrain.scroll(gap_center - state.player.center_x());
        state.terrain = terrain;
        assert!(state.terrain.height_at(state.player.center_x()).is_gap);

        let mut reason = None;
        for _ in 0..200 {
            let report = tick(&mut state, FRAME, &mut rng);
            state.entities.clear();
            if let Some(r) = report.died() {
                reason = Some(r);
                break;
            }
            assert!(!state.player.grounded);
        }
        assert_eq!(reason, Some(RunEnd::FellInGap));
        assert!(state.player.y > state.config.viewport.height);
    }
}
