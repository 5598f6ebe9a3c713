//! High-score leaderboard: entry types, the bounded in-memory board and the
//! collaborators the game submits to.

pub mod board;
pub mod client;
pub mod local;
pub mod payload;

pub use board::{ScoreBoard, TimeBoard, TimeEntry};
pub use client::HttpLeaderboard;
pub use local::InMemoryLeaderboard;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One stored score, as served by `/api/poop-ranking`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: f64,
    pub rank: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_data_url: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
}

/// What the game sends after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub score: f64,
    pub rank: String,
    pub label: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_data_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("leaderboard unreachable: {0}")]
    Transport(String),
    #[error("malformed leaderboard response: {0}")]
    Decode(String),
    #[error("leaderboard unavailable")]
    Unavailable,
}

/// Remote (or in-process) score storage.
pub trait Leaderboard: Send + Sync {
    /// Store a score; returns the top entries after insertion.
    fn submit(&self, submission: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;

    /// The best `limit` entries, best first.
    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError>;
}
