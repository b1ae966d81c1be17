//! `deepguard-watch` library crate.
//!
//! The scan overlay as a terminal client: loads the website list, requests
//! one global scan, then polls and merges results until dismissed. The
//! binary entrypoint lives in `main.rs`.

pub mod client;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
