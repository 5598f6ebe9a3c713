//! Bounded, sorted score pools.

use super::LeaderboardEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const SCORE_POOL_CAPACITY: usize = 100;
pub const TIME_POOL_CAPACITY: usize = 50;

/// Best score first; ties go to the earlier entry.
fn by_score_then_age(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.created_at.cmp(&b.created_at))
}

/// The poop score pool. Every submission is its own entry.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    entries: Vec<LeaderboardEntry>,
    capacity: usize,
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new(SCORE_POOL_CAPACITY)
    }
}

impl ScoreBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add an entry, keep the pool sorted and drop whatever falls past
    /// the capacity.
    pub fn insert(&mut self, entry: LeaderboardEntry) {
        self.entries.push(entry);
        self.entries.sort_by(by_score_then_age);
        self.entries.truncate(self.capacity);
    }

    /// The best `limit` entries.
    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}

/// An entry of the time-based ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub name: String,
    pub time: f64,
}

/// The time ranking pool: one personal best per name.
#[derive(Debug, Clone)]
pub struct TimeBoard {
    entries: Vec<TimeEntry>,
    capacity: usize,
}

impl Default for TimeBoard {
    fn default() -> Self {
        Self::new(TIME_POOL_CAPACITY)
    }
}

impl TimeBoard {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record `time` for `name` if it beats that name's best (or the name
    /// is new).
    pub fn record(&mut self, name: &str, time: f64) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => {
                if time > existing.time {
                    existing.time = time;
                }
            }
            None => self.entries.push(TimeEntry {
                name: name.to_string(),
                time,
            }),
        }
        self.entries.sort_by(|a, b| b.time.total_cmp(&a.time));
        self.entries.truncate(self.capacity);
    }

    pub fn top(&self, limit: usize) -> Vec<TimeEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}
