//! Endpoint routing. Pure: a request and the boards in, a response out.

use super::http::{Request, Response};
use crate::leaderboard::board::{ScoreBoard, TimeBoard};
use crate::leaderboard::payload::{
    parse_limit, parse_score_submission, parse_time_submission, DEFAULT_LIMIT,
};
use serde_json::Value;

/// Entries returned after a time score submission and by `/api/ranking`.
pub const TIME_TOP: usize = 3;

/// Both ranking pools, guarded together by the server.
#[derive(Debug, Default)]
pub struct Boards {
    pub scores: ScoreBoard,
    pub times: TimeBoard,
}

/// An absent body counts as an empty object.
fn json_body(request: &Request) -> Result<Value, Response> {
    if request.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(&request.body).map_err(|_| Response::error(400, "invalid JSON"))
}

/// Dispatch one request. `now_ms` stamps new score entries.
pub fn route(request: &Request, boards: &mut Boards, now_ms: i64) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/api/poop-score") => submit_score(request, boards, now_ms),
        ("GET", "/api/poop-ranking") => {
            let limit = parse_limit(request.query_param("limit"));
            Response::json(200, &boards.scores.top(limit))
        }
        ("POST", "/api/score") => submit_time(request, boards),
        ("GET", "/api/ranking") => Response::json(200, &boards.times.top(TIME_TOP)),
        ("GET", "/") | ("GET", "/index.html") => Response::html(ranking_page(&boards.scores)),
        (_, "/api/poop-score" | "/api/poop-ranking" | "/api/score" | "/api/ranking") => {
            Response::error(405, "method not allowed")
        }
        _ => Response::error(404, "not found"),
    }
}

fn submit_score(request: &Request, boards: &mut Boards, now_ms: i64) -> Response {
    let body = match json_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };
    match parse_score_submission(&body, now_ms) {
        Ok(entry) => {
            log::info!("score {} from {}", entry.score, entry.name);
            boards.scores.insert(entry);
            Response::json(200, &boards.scores.top(DEFAULT_LIMIT))
        }
        Err(e) => Response::error(400, &e.to_string()),
    }
}

fn submit_time(request: &Request, boards: &mut Boards) -> Response {
    let body = match json_body(request) {
        Ok(body) => body,
        Err(response) => return response,
    };
    match parse_time_submission(&body) {
        Ok((name, time)) => {
            boards.times.record(&name, time);
            Response::json(200, &boards.times.top(TIME_TOP))
        }
        Err(e) => Response::error(400, &e.to_string()),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A plain page with the current top ten.
fn ranking_page(scores: &ScoreBoard) -> String {
    let rows: String = scores
        .top(DEFAULT_LIMIT)
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td></tr>\n",
                i + 1,
                escape_html(&entry.name),
                entry.score,
                escape_html(&entry.rank),
                escape_html(&entry.label)
            )
        })
        .collect();
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Poop Runner Ranking</title></head>\n\
         <body><h1>Poop Runner Ranking</h1>\n<table>\n<tr><th>#</th><th>Name</th><th>Score</th><th>Rank</th></tr>\n\
         {}</table></body></html>\n",
        rows
    )
}
