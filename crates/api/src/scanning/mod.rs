//! Background scan launching.
//!
//! The [`ScanLauncher`](launcher::ScanLauncher) starts the external scanner
//! detached from the request that triggered it and keeps a record of the
//! latest run so duplicate triggers can be detected.

pub mod launcher;
