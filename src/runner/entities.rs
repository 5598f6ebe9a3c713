//! Scrolling entities: hazards, collectibles and power-ups.
//!
//! The kind is a closed enum so collision resolution and rendering both
//! match every variant exhaustively.

use super::geometry::Rect;

/// Which altitude band a hazard was spawned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Altitude {
    Ground,
    Elevated,
}

/// A fireball. Its y sways around `base_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hazard {
    pub altitude: Altitude,
    pub base_y: f64,
    /// Current sway angle in radians.
    pub phase: f64,
    pub amplitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectibleKind {
    /// Worth one point, two when spawned over a bonus segment.
    Normal { bonus: bool },
    /// Looks like the real thing; scores nothing and darkens the screen.
    Decoy,
    /// Flips the world upside down for a while.
    Inverter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpKind {
    SizeBoost,
    JumpBoost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    Hazard(Hazard),
    Collectible(CollectibleKind),
    PowerUp(PowerUpKind),
}

/// Population category, each with its own spawn timer and cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Hazard,
    Collectible,
    PowerUp,
}

/// One live entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub bounds: Rect,
    /// Leftward speed in units per second.
    pub speed: f64,
    pub kind: EntityKind,
}

impl Entity {
    pub fn category(&self) -> EntityCategory {
        match self.kind {
            EntityKind::Hazard(_) => EntityCategory::Hazard,
            EntityKind::Collectible(_) => EntityCategory::Collectible,
            EntityKind::PowerUp(_) => EntityCategory::PowerUp,
        }
    }

    pub fn is_hazard(&self) -> bool {
        matches!(self.kind, EntityKind::Hazard(_))
    }

    /// Collision box. Hazards keep a centred `hazard_fraction` of their
    /// bounds; everything else collides with its full bounds.
    pub fn hitbox(&self, hazard_fraction: f64) -> Rect {
        match self.kind {
            EntityKind::Hazard(_) => self.bounds.centered_fraction(hazard_fraction, hazard_fraction),
            EntityKind::Collectible(_) | EntityKind::PowerUp(_) => self.bounds,
        }
    }

    /// Move left for `dt` seconds; hazards also advance their sway.
    pub fn advance(&mut self, dt: f64, sway_speed: f64) {
        self.bounds.x -= self.speed * dt;
        if let EntityKind::Hazard(ref mut hazard) = self.kind {
            hazard.phase += sway_speed * dt;
            self.bounds.y = hazard.base_y + hazard.phase.sin() * hazard.amplitude;
        }
    }

    /// True once the right edge has passed `cull_margin` left of the
    /// viewport.
    pub fn is_offscreen(&self, cull_margin: f64) -> bool {
        self.bounds.right() < -cull_margin
    }
}

/// Count live entities of one category.
pub fn count_category(entities: &[Entity], category: EntityCategory) -> usize {
    entities
        .iter()
        .filter(|entity| entity.category() == category)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fireball(x: f64) -> Entity {
        Entity {
            bounds: Rect::new(x, 100.0, 120.0, 80.0),
            speed: 240.0,
            kind: EntityKind::Hazard(Hazard {
                altitude: Altitude::Ground,
                base_y: 100.0,
                phase: 0.0,
                amplitude: 12.0,
            }),
        }
    }

    #[test]
    fn test_category() {
        assert_eq!(fireball(0.0).category(), EntityCategory::Hazard);
        let poop = Entity {
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            speed: 160.0,
            kind: EntityKind::Collectible(CollectibleKind::Decoy),
        };
        assert_eq!(poop.category(), EntityCategory::Collectible);
        assert!(!poop.is_hazard());
    }

    #[test]
    fn test_advance_moves_left_and_sways() {
        let mut e = fireball(500.0);
        e.advance(0.5, 4.0);
        assert!((e.bounds.x - 380.0).abs() < 1e-9);
        let expected_y = 100.0 + (2.0f64).sin() * 12.0;
        assert!((e.bounds.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn test_sway_stays_within_amplitude() {
        let mut e = fireball(500.0);
        for _ in 0..200 {
            e.advance(0.033, 4.0);
            assert!((e.bounds.y - 100.0).abs() <= 12.0 + 1e-9);
        }
    }

    #[test]
    fn test_hazard_hitbox_is_inset() {
        let e = fireball(0.0);
        let hit = e.hitbox(0.55);
        assert!((hit.width - 66.0).abs() < 1e-9);
        assert!((hit.height - 44.0).abs() < 1e-9);
        assert!(e.bounds.contains(&hit));
    }

    #[test]
    fn test_collectible_hitbox_is_full_bounds() {
        let e = Entity {
            bounds: Rect::new(5.0, 5.0, 99.0, 99.0),
            speed: 160.0,
            kind: EntityKind::PowerUp(PowerUpKind::JumpBoost),
        };
        assert_eq!(e.hitbox(0.55), e.bounds);
    }

    #[test]
    fn test_offscreen_uses_right_edge() {
        let mut e = fireball(-150.0);
        // right edge at -30
        assert!(!e.is_offscreen(80.0));
        e.bounds.x = -201.0;
        assert!(e.is_offscreen(80.0));
    }
}
