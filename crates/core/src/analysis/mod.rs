//! External analysis processes.
//!
//! Media classification happens outside this codebase. The server sees it
//! through two capabilities: [`MediaAnalyzer`] classifies one stored file
//! and [`MediaScanner`] launches a background scan of the website list.
//! [`script`] implements both by running configured scripts as
//! subprocesses; all process management is free of HTTP concerns.
//!
//! [`MediaAnalyzer`]: executor::MediaAnalyzer
//! [`MediaScanner`]: executor::MediaScanner

pub mod executor;
pub mod script;
pub mod subprocess;
