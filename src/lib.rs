//! Watches a folder of projects and keeps an append-only log of every file change, then turns the
//! log into a calendar page showing which project got attention on each day.
//!
//! Nothing runs in the background on its own, `watch` lives in the terminal it was started from.

pub mod cli;
pub mod fs;
pub mod utils;
pub mod watcher;
