//! Poop Runner - terminal endless runner and its leaderboard.
//!
//! The simulation core lives in [`runner`] and is free of terminal and
//! network code so it can be driven headless by tests and the simulator.

pub mod config;
pub mod leaderboard;
pub mod profile;
pub mod runner;
pub mod ui;
pub mod utils;
pub mod web;
