//! Report renderers for scan results.
//!
//! - [`terminal`]: colored summary box and tables; respects `--verbose` / `--quiet`.
//! - JSON output is the serialized [`crate::models::ScanResult`] itself.

pub mod terminal;
