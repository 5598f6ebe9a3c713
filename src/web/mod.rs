//! Leaderboard HTTP server.
//!
//! Request parsing and routing are plain functions and always built; the
//! tokio listener needs the `web` feature:
//! ```sh
//! cargo run --features web -- serve --port 3000
//! ```

pub mod http;
pub mod routes;

#[cfg(feature = "web")]
mod server;

pub use http::{parse_request, Request, RequestError, Response};
pub use routes::{route, Boards};

#[cfg(feature = "web")]
pub use server::{serve, start_leaderboard_server, SharedBoards};
