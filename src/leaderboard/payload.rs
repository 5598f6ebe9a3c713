//! Validation of incoming leaderboard payloads. Pure functions over parsed
//! JSON so the server routes stay thin.

use super::LeaderboardEntry;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_NAME: &str = "Anonymous";
pub const DEFAULT_RANK: &str = "F";
pub const DEFAULT_LIMIT: usize = 10;
/// Longest avatar data URL accepted, in characters.
pub const MAX_AVATAR_LEN: usize = 200_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("score must be number")]
    ScoreNotNumber,
    #[error("invalid payload")]
    InvalidTimeScore,
}

fn string_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// Keep an avatar only if it is an image data URL of acceptable size.
pub fn sanitize_avatar(value: Option<&Value>) -> Option<String> {
    let trimmed = value.and_then(Value::as_str)?.trim();
    if trimmed.starts_with("data:image/") && trimmed.chars().count() <= MAX_AVATAR_LEN {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Turn a `/api/poop-score` body into a stored entry stamped `created_at`.
pub fn parse_score_submission(body: &Value, created_at: i64) -> Result<LeaderboardEntry, PayloadError> {
    let score = body
        .get("score")
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .ok_or(PayloadError::ScoreNotNumber)?;

    let name = string_field(body, "name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_NAME);

    Ok(LeaderboardEntry {
        name: name.to_string(),
        score,
        rank: string_field(body, "rank").unwrap_or(DEFAULT_RANK).to_string(),
        label: string_field(body, "label").unwrap_or_default().to_string(),
        avatar_data_url: sanitize_avatar(body.get("avatarDataUrl")),
        created_at,
    })
}

/// Validate a `/api/score` body: a non-blank name and a finite time.
pub fn parse_time_submission(body: &Value) -> Result<(String, f64), PayloadError> {
    let name = string_field(body, "name")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(PayloadError::InvalidTimeScore)?;
    let time = body
        .get("time")
        .and_then(Value::as_f64)
        .filter(|time| time.is_finite())
        .ok_or(PayloadError::InvalidTimeScore)?;
    Ok((name.to_string(), time))
}

/// `limit` query value; anything missing, negative or unparsable means the
/// default.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|limit| limit.is_finite() && *limit >= 0.0)
        .map(|limit| limit.floor() as usize)
        .unwrap_or(DEFAULT_LIMIT)
}
