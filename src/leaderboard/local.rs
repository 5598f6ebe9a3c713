//! In-process leaderboard, used for offline play and in tests.

use super::board::ScoreBoard;
use super::payload::{parse_score_submission, DEFAULT_LIMIT};
use super::{Leaderboard, LeaderboardEntry, LeaderboardError, ScoreSubmission};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryLeaderboard {
    board: Mutex<ScoreBoard>,
}

impl InMemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.board.lock().map(|board| board.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Leaderboard for InMemoryLeaderboard {
    fn submit(&self, submission: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        // Same validation as the HTTP route
        let body = serde_json::to_value(submission).map_err(|e| LeaderboardError::Decode(e.to_string()))?;
        let entry = parse_score_submission(&body, chrono::Utc::now().timestamp_millis()).map_err(|e| {
            LeaderboardError::Rejected {
                status: 400,
                message: e.to_string(),
            }
        })?;
        let mut board = self.board.lock().map_err(|_| LeaderboardError::Unavailable)?;
        board.insert(entry);
        Ok(board.top(DEFAULT_LIMIT))
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let board = self.board.lock().map_err(|_| LeaderboardError::Unavailable)?;
        Ok(board.top(limit))
    }
}
