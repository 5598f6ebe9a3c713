//! Procedural ground: a streamed sequence of flat, sloped and gap segments.
//!
//! Segments are appended at the right (streaming) edge as the viewport
//! advances and evicted from the left once fully scrolled past. Height
//! offsets are measured from the nominal ground line, negative meaning
//! higher on screen, and are clamped to `[-slope_max, 0]` so the ground can
//! rise but never sink below the baseline.

use crate::config::TerrainConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Depth reported below the baseline for a gap: far enough that nothing
/// ever lands on it.
pub const GAP_DEPTH: f64 = 9999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Flat,
    SlopeUp,
    SlopeDown,
    Gap,
}

impl SegmentKind {
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap)
    }
}

/// One contiguous span of ground of a single kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub x: f64,
    pub width: f64,
    pub kind: SegmentKind,
    pub start_offset: f64,
    pub end_offset: f64,
    /// Collectibles spawned over a bonus segment are worth more.
    pub bonus: bool,
}

impl Segment {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.x && x <= self.right()
    }

    /// Linearly interpolated offset at `x` (clamped to the segment).
    pub fn offset_at(&self, x: f64) -> f64 {
        let t = if self.width > 0.0 {
            ((x - self.x) / self.width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.start_offset + (self.end_offset - self.start_offset) * t
    }
}

/// Result of a ground query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundInfo {
    /// Screen-space y of the ground surface.
    pub ground_y: f64,
    pub is_gap: bool,
    pub bonus: bool,
}

/// Gap probability after `elapsed` run time: ramps linearly from the base
/// value to base + max extra over the ramp window, clamped at both ends.
pub fn gap_probability(config: &TerrainConfig, elapsed: Duration) -> f64 {
    let rate = if config.gap_ramp.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f64() / config.gap_ramp.as_secs_f64()).clamp(0.0, 1.0)
    };
    config.base_gap_probability + config.max_extra_gap_probability * rate
}

/// The streaming terrain generator.
#[derive(Debug, Clone)]
pub struct Terrain {
    config: TerrainConfig,
    segments: VecDeque<Segment>,
    /// Screen-space y of the nominal ground line.
    baseline: f64,
    /// Size unit (the player's base height) that widths scale with.
    unit: f64,
    gap_probability: f64,
}

impl Terrain {
    pub fn new(config: TerrainConfig, baseline: f64, unit: f64) -> Self {
        let gap_probability = config.base_gap_probability;
        Self {
            config,
            segments: VecDeque::new(),
            baseline,
            unit,
            gap_probability,
        }
    }

    pub fn segments(&self) -> &VecDeque<Segment> {
        &self.segments
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Highest the ground can rise above the baseline.
    pub fn slope_max(&self) -> f64 {
        self.unit * self.config.slope_max
    }

    pub fn gap_probability(&self) -> f64 {
        self.gap_probability
    }

    pub fn set_gap_probability(&mut self, probability: f64) {
        self.gap_probability = probability.clamp(0.0, 1.0);
    }

    /// Right end of generated coverage (or the start x when empty).
    pub fn coverage_end(&self) -> f64 {
        self.segments
            .back()
            .map(Segment::right)
            .unwrap_or(self.config.start_x)
    }

    /// Discard everything and generate fresh terrain out to `right_edge`
    /// plus the configured lead.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, right_edge: f64, rng: &mut R) {
        self.segments.clear();
        self.ensure_generated(right_edge, rng);
    }

    /// Shift every segment left by `dx`.
    pub fn scroll(&mut self, dx: f64) {
        for segment in &mut self.segments {
            segment.x -= dx;
        }
    }

    /// Drop segments whose right end lies more than the trail margin left
    /// of `left_edge`. Returns how many were dropped.
    pub fn evict_offscreen(&mut self, left_edge: f64) -> usize {
        let limit = left_edge - self.config.trail;
        let mut evicted = 0;
        while self
            .segments
            .front()
            .is_some_and(|segment| segment.right() < limit)
        {
            self.segments.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Append segments until coverage extends the lead margin past
    /// `right_edge`. Returns how many were appended.
    pub fn ensure_generated<R: Rng + ?Sized>(&mut self, right_edge: f64, rng: &mut R) -> usize {
        let target = right_edge + self.config.lead;
        let (mut x, mut offset, mut last_kind) = match self.segments.back() {
            Some(last) => (last.right(), last.end_offset, last.kind),
            None => (self.config.start_x, 0.0, SegmentKind::Flat),
        };

        let mut appended = 0;
        while x < target {
            let segment = self.next_segment(x, offset, last_kind, rng);
            x = segment.right();
            if !segment.kind.is_gap() {
                offset = segment.end_offset;
            }
            last_kind = segment.kind;
            self.segments.push_back(segment);
            appended += 1;
        }
        appended
    }

    /// Ground under `x`. Outside all live segments the baseline is
    /// reported; a gap reports an unreachable depth.
    pub fn height_at(&self, x: f64) -> GroundInfo {
        match self.segments.iter().find(|segment| segment.contains(x)) {
            Some(segment) if segment.kind.is_gap() => GroundInfo {
                ground_y: self.baseline + GAP_DEPTH,
                is_gap: true,
                bonus: false,
            },
            Some(segment) => GroundInfo {
                ground_y: self.baseline + segment.offset_at(x),
                is_gap: false,
                bonus: segment.bonus,
            },
            None => GroundInfo {
                ground_y: self.baseline,
                is_gap: false,
                bonus: false,
            },
        }
    }

    /// Walkable surface height at `x`. A gap reports the level carried
    /// across it, i.e. the height of the ground on either side.
    pub fn surface_at(&self, x: f64) -> f64 {
        match self.segments.iter().find(|segment| segment.contains(x)) {
            Some(segment) if segment.kind.is_gap() => self.baseline + segment.start_offset,
            _ => self.height_at(x).ground_y,
        }
    }

    #[cfg(test)]
    pub(crate) fn push_segment(&mut self, segment: Segment) {
        self.segments.push_back(segment);
    }

    /// Build one segment starting at `x` from the carried `offset`.
    fn next_segment<R: Rng + ?Sized>(
        &self,
        x: f64,
        offset: f64,
        last_kind: SegmentKind,
        rng: &mut R,
    ) -> Segment {
        let unit = self.unit;
        let slope_max = self.slope_max();

        let flat = self.config.flat_probability;
        let slope = (1.0 - flat - self.gap_probability).max(0.0);
        let up = slope / 2.0;
        let down = slope - up;

        let roll: f64 = rng.gen();
        let mut kind = if roll < flat {
            SegmentKind::Flat
        } else if roll < flat + up {
            SegmentKind::SlopeUp
        } else if roll < flat + up + down {
            SegmentKind::SlopeDown
        } else {
            SegmentKind::Gap
        };

        // Two gaps in a row could be unjumpable. The start stays level.
        if (kind.is_gap() && last_kind.is_gap()) || x < self.config.safe_start {
            kind = SegmentKind::Flat;
        }

        let (width, end_offset) = match kind {
            SegmentKind::Flat => (self.config.flat_width.sample(rng) * unit, offset),
            SegmentKind::SlopeUp => {
                let width = self.config.slope_width.sample(rng) * unit;
                let step = self.config.slope_step.sample(rng) * unit;
                (width, (offset - step).clamp(-slope_max, 0.0))
            }
            SegmentKind::SlopeDown => {
                let width = self.config.slope_width.sample(rng) * unit;
                let step = self.config.slope_step.sample(rng) * unit;
                (width, (offset + step).clamp(-slope_max, 0.0))
            }
            SegmentKind::Gap => (self.config.gap_width.sample(rng) * unit, offset),
        };

        let bonus = !kind.is_gap() && rng.gen::<f64>() < self.config.bonus_probability;

        Segment {
            x,
            width,
            kind,
            start_offset: offset,
            end_offset,
            bonus,
        }
    }
}
