//! The runner's body: vertical motion, multi-jump and hitbox.

use super::geometry::Rect;
use crate::config::{PlayerConfig, ViewportConfig};

/// A grounded runner follows ground that drops away by up to this share of
/// its height per tick instead of briefly going airborne on down-slopes.
const GROUND_SNAP_RATIO: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub x: f64,
    /// Top edge in screen space.
    pub y: f64,
    pub vy: f64,
    pub base_width: f64,
    pub base_height: f64,
    pub width: f64,
    pub height: f64,
    pub gravity: f64,
    pub base_jump_impulse: f64,
    pub jump_impulse: f64,
    pub grounded: bool,
    pub used_jumps: u32,
    pub max_jumps: u32,
    hitbox_width: f64,
    hitbox_height: f64,
}

impl Player {
    /// A player standing on the nominal ground line.
    pub fn new(config: &PlayerConfig, viewport: &ViewportConfig) -> Self {
        let size = viewport.width.min(viewport.height) * config.size_ratio;
        Self {
            x: viewport.width * config.x_ratio,
            y: viewport.ground_y() - size,
            vy: 0.0,
            base_width: size,
            base_height: size,
            width: size,
            height: size,
            gravity: config.gravity,
            base_jump_impulse: config.jump_impulse,
            jump_impulse: config.jump_impulse,
            grounded: true,
            used_jumps: 0,
            max_jumps: config.max_jumps,
            hitbox_width: config.hitbox_width,
            hitbox_height: config.hitbox_height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Collision box: a centred sub-rectangle of the sprite.
    pub fn hitbox(&self) -> Rect {
        self.bounds()
            .centered_fraction(self.hitbox_width, self.hitbox_height)
    }

    pub fn can_jump(&self) -> bool {
        self.used_jumps < self.max_jumps
    }

    /// Jump if any jumps remain before the next landing.
    pub fn try_jump(&mut self) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.vy = self.jump_impulse;
        self.grounded = false;
        self.used_jumps += 1;
        true
    }

    /// Semi-implicit Euler step of `dt` seconds.
    pub fn integrate(&mut self, dt: f64) {
        self.vy += self.gravity * dt;
        self.y += self.vy * dt;
    }

    /// Snap feet onto `ground_y` if they reached it. Returns true on the
    /// airborne-to-grounded transition.
    pub fn land_on(&mut self, ground_y: f64) -> bool {
        let gap = ground_y - self.bottom();
        if gap > 0.0 {
            let follows_ground =
                self.grounded && self.vy >= 0.0 && gap <= self.height * GROUND_SNAP_RATIO;
            if !follows_ground {
                self.grounded = false;
                return false;
            }
        }
        let was_grounded = self.grounded;
        self.y = ground_y - self.height;
        self.vy = 0.0;
        self.grounded = true;
        self.used_jumps = 0;
        !was_grounded
    }

    /// Scale size and jump from their base values. Feet and horizontal
    /// centre stay where they are.
    pub fn apply_multipliers(&mut self, size: f64, jump: f64) {
        let width = self.base_width * size;
        let height = self.base_height * size;
        if (width - self.width).abs() > f64::EPSILON || (height - self.height).abs() > f64::EPSILON
        {
            let bottom = self.bottom();
            let center = self.center_x();
            self.width = width;
            self.height = height;
            self.y = bottom - height;
            self.x = center - width / 2.0;
        }
        self.jump_impulse = self.base_jump_impulse * jump;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(&PlayerConfig::default(), &ViewportConfig::default())
    }

    #[test]
    fn test_new_player_on_ground() {
        let p = player();
        assert!(p.grounded);
        assert_eq!(p.used_jumps, 0);
        assert_eq!(p.max_jumps, 3);
        assert!((p.bottom() - ViewportConfig::default().ground_y()).abs() < 1e-9);
        assert!((p.x - 144.0).abs() < 1e-9);
    }

    #[test]
    fn test_triple_jump_then_rejected() {
        let mut p = player();
        assert!(p.try_jump());
        assert!(p.try_jump());
        assert!(p.try_jump());
        assert!(!p.try_jump());
        assert_eq!(p.used_jumps, 3);
        assert!(!p.grounded);
    }

    #[test]
    fn test_jump_sets_impulse() {
        let mut p = player();
        p.try_jump();
        assert!((p.vy - -520.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_landing_resets_jumps() {
        let mut p = player();
        p.try_jump();
        p.try_jump();
        p.y += 50.0;
        let ground = p.bottom() - 10.0;
        assert!(p.land_on(ground));
        assert_eq!(p.used_jumps, 0);
        assert!(p.grounded);
        assert!((p.bottom() - ground).abs() < 1e-9);
        assert!(p.vy.abs() < f64::EPSILON);
    }

    #[test]
    fn test_airborne_above_ground_does_not_land() {
        let mut p = player();
        p.try_jump();
        let ground = p.bottom() + 30.0;
        assert!(!p.land_on(ground));
        assert_eq!(p.used_jumps, 1);
        assert!(!p.grounded);
    }

    #[test]
    fn test_staying_grounded_is_not_a_transition() {
        let mut p = player();
        let ground = p.bottom();
        assert!(!p.land_on(ground));
        assert!(p.grounded);
    }

    #[test]
    fn test_grounded_player_follows_down_slope() {
        let mut p = player();
        let ground = p.bottom() + 4.0;
        assert!(!p.land_on(ground));
        assert!(p.grounded);
        assert!((p.bottom() - ground).abs() < 1e-9);
    }

    #[test]
    fn test_grounded_player_leaves_cliff_edge() {
        let mut p = player();
        let ground = p.bottom() + p.height;
        assert!(!p.land_on(ground));
        assert!(!p.grounded);
    }

    #[test]
    fn test_integrate_under_gravity() {
        let mut p = player();
        p.try_jump();
        let y0 = p.y;
        p.integrate(0.05);
        assert!((p.vy - (-520.0 + 80.0)).abs() < 1e-9);
        assert!((p.y - (y0 + p.vy * 0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_hitbox_contained() {
        let p = player();
        assert!(p.bounds().contains(&p.hitbox()));
        assert!((p.hitbox().width - p.width * 0.5).abs() < 1e-9);
        assert!((p.hitbox().height - p.height * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_multipliers_keep_feet_planted() {
        let mut p = player();
        let bottom = p.bottom();
        let center = p.center_x();
        p.apply_multipliers(1.5, 1.3);
        assert!((p.height - p.base_height * 1.5).abs() < 1e-9);
        assert!((p.bottom() - bottom).abs() < 1e-9);
        assert!((p.center_x() - center).abs() < 1e-9);
        assert!((p.jump_impulse - -676.0).abs() < 1e-9);

        p.apply_multipliers(1.0, 1.0);
        assert!((p.height - p.base_height).abs() < 1e-9);
        assert!((p.jump_impulse - p.base_jump_impulse).abs() < 1e-9);
        assert!((p.bottom() - bottom).abs() < 1e-9);
    }
}
