//! Blocking HTTP client for the leaderboard server.

use super::{Leaderboard, LeaderboardEntry, LeaderboardError, ScoreSubmission};
use std::time::Duration;

const USER_AGENT: &str = "poop-runner";

pub struct HttpLeaderboard {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpLeaderboard {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn map_error(err: ureq::Error) -> LeaderboardError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            LeaderboardError::Rejected { status, message }
        }
        ureq::Error::Transport(transport) => LeaderboardError::Transport(transport.to_string()),
    }
}

fn decode(response: ureq::Response) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
    response
        .into_json()
        .map_err(|e| LeaderboardError::Decode(e.to_string()))
}

impl Leaderboard for HttpLeaderboard {
    fn submit(&self, submission: &ScoreSubmission) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let response = self
            .agent
            .post(&self.url("/api/poop-score"))
            .set("User-Agent", USER_AGENT)
            .send_json(submission)
            .map_err(map_error)?;
        decode(response)
    }

    fn top(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let response = self
            .agent
            .get(&self.url("/api/poop-ranking"))
            .query("limit", &limit.to_string())
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(map_error)?;
        decode(response)
    }
}
