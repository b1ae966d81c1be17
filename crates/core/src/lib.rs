//! DeepGuard domain logic.
//!
//! Everything here is free of HTTP concerns so the API server and the
//! terminal watch client can share it: website list parsing, the scan
//! results document, site-key normalization and merging, analyzer verdict
//! parsing, upload storage, and the external-process executors.

pub mod analysis;
pub mod error;
pub mod merge;
pub mod results;
pub mod scan_run;
pub mod site_key;
pub mod uploads;
pub mod verdict;
pub mod websites;
