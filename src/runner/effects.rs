//! Time-bounded player modifiers and screen effects.
//!
//! All timers are [`Duration`] countdowns advanced by the tick delta with
//! saturating subtraction, so a remaining duration can never go negative.

use crate::config::EffectsConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    SizeBoost,
    JumpBoost,
    InvertWorld,
    VisibilityDebuff,
}

/// A single-phase countdown effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining: Duration,
    full: Duration,
    cap: Duration,
}

impl Countdown {
    pub fn new(full: Duration, max_stack: u32) -> Self {
        Self {
            remaining: Duration::ZERO,
            full,
            cap: full * max_stack.max(1),
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        !self.remaining.is_zero()
    }

    /// Start from zero, or extend by one full duration (up to the cap) if
    /// already running.
    pub fn trigger(&mut self) {
        self.remaining = (self.remaining + self.full).min(self.cap);
    }

    /// Count down; true if the effect expired during this tick.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let was_active = self.is_active();
        self.remaining = self.remaining.saturating_sub(dt);
        was_active && !self.is_active()
    }

    /// Remaining share of one full duration, capped at 1.
    pub fn fraction(&self) -> f64 {
        if self.full.is_zero() {
            return 0.0;
        }
        (self.remaining.as_secs_f64() / self.full.as_secs_f64()).min(1.0)
    }
}

/// Phases of the world-inversion effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InversionPhase {
    Off,
    FlashIn,
    Active,
    FlashOut,
}

/// `Off -> FlashIn -> Active -> FlashOut -> Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inversion {
    phase: InversionPhase,
    remaining: Duration,
    flash: Duration,
    active: Duration,
}

impl Inversion {
    pub fn new(flash: Duration, active: Duration) -> Self {
        Self {
            phase: InversionPhase::Off,
            remaining: Duration::ZERO,
            flash,
            active,
        }
    }

    pub fn phase(&self) -> InversionPhase {
        self.phase
    }

    /// Time left in the current phase.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Start the flash-in. Ignored unless the effect is fully off.
    pub fn trigger(&mut self) -> bool {
        if self.phase != InversionPhase::Off {
            return false;
        }
        self.phase = InversionPhase::FlashIn;
        self.remaining = self.flash;
        true
    }

    /// Count down the current phase, moving to the next one when it runs
    /// out. Returns the new phase on a transition.
    pub fn tick(&mut self, dt: Duration) -> Option<InversionPhase> {
        if self.phase == InversionPhase::Off {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        if !self.remaining.is_zero() {
            return None;
        }

        let (next, duration) = match self.phase {
            InversionPhase::FlashIn => (InversionPhase::Active, self.active),
            InversionPhase::Active => (InversionPhase::FlashOut, self.flash),
            InversionPhase::FlashOut | InversionPhase::Off => (InversionPhase::Off, Duration::ZERO),
        };
        self.phase = next;
        self.remaining = duration;
        Some(next)
    }

    pub fn is_inverted(&self) -> bool {
        self.phase == InversionPhase::Active
    }

    /// Opacity of the full-screen white flash, 0 outside the flash phases.
    pub fn flash_alpha(&self) -> f64 {
        match self.phase {
            InversionPhase::FlashIn | InversionPhase::FlashOut if !self.flash.is_zero() => {
                (self.remaining.as_secs_f64() / self.flash.as_secs_f64()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// Something that changed while advancing effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTransition {
    Expired(EffectKind),
    Inversion(InversionPhase),
}

/// All status effects of one run.
#[derive(Debug, Clone)]
pub struct StatusEffects {
    size_boost: Countdown,
    jump_boost: Countdown,
    debuff: Countdown,
    inversion: Inversion,
    size_multiplier: f64,
    jump_multiplier: f64,
    debuff_max_opacity: f64,
}

impl StatusEffects {
    pub fn new(config: &EffectsConfig) -> Self {
        Self {
            size_boost: Countdown::new(config.size_boost, config.max_stack),
            jump_boost: Countdown::new(config.jump_boost, config.max_stack),
            debuff: Countdown::new(config.visibility_debuff, config.max_stack),
            inversion: Inversion::new(config.inversion_flash, config.inversion),
            size_multiplier: config.size_multiplier,
            jump_multiplier: config.jump_multiplier,
            debuff_max_opacity: config.debuff_max_opacity,
        }
    }

    /// Trigger an effect. Returns false when the trigger was ignored
    /// (an inversion already in progress).
    pub fn trigger(&mut self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::SizeBoost => self.size_boost.trigger(),
            EffectKind::JumpBoost => self.jump_boost.trigger(),
            EffectKind::VisibilityDebuff => self.debuff.trigger(),
            EffectKind::InvertWorld => return self.inversion.trigger(),
        }
        true
    }

    pub fn tick(&mut self, dt: Duration) -> Vec<EffectTransition> {
        let mut transitions = Vec::new();
        if self.size_boost.tick(dt) {
            transitions.push(EffectTransition::Expired(EffectKind::SizeBoost));
        }
        if self.jump_boost.tick(dt) {
            transitions.push(EffectTransition::Expired(EffectKind::JumpBoost));
        }
        if self.debuff.tick(dt) {
            transitions.push(EffectTransition::Expired(EffectKind::VisibilityDebuff));
        }
        if let Some(phase) = self.inversion.tick(dt) {
            transitions.push(EffectTransition::Inversion(phase));
        }
        transitions
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::SizeBoost => self.size_boost.is_active(),
            EffectKind::JumpBoost => self.jump_boost.is_active(),
            EffectKind::VisibilityDebuff => self.debuff.is_active(),
            EffectKind::InvertWorld => self.inversion.phase() != InversionPhase::Off,
        }
    }

    /// Remaining time of an effect (for inversion: of its current phase).
    pub fn remaining(&self, kind: EffectKind) -> Duration {
        match kind {
            EffectKind::SizeBoost => self.size_boost.remaining(),
            EffectKind::JumpBoost => self.jump_boost.remaining(),
            EffectKind::VisibilityDebuff => self.debuff.remaining(),
            EffectKind::InvertWorld => self.inversion.remaining(),
        }
    }

    pub fn inversion(&self) -> &Inversion {
        &self.inversion
    }

    pub fn size_multiplier(&self) -> f64 {
        if self.size_boost.is_active() {
            self.size_multiplier
        } else {
            1.0
        }
    }

    pub fn jump_multiplier(&self) -> f64 {
        if self.jump_boost.is_active() {
            self.jump_multiplier
        } else {
            1.0
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.inversion.is_inverted()
    }

    pub fn flash_alpha(&self) -> f64 {
        self.inversion.flash_alpha()
    }

    /// Opacity of the darkening overlay, fading with the debuff.
    pub fn debuff_opacity(&self) -> f64 {
        self.debuff_max_opacity * self.debuff.fraction()
    }
}
