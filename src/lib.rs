//! `license-audit`: inventory the licenses of installed npm dependencies.
//!
//! # Flow
//! 1. Enumerate package directories under `node_modules` ([`scanner::walker`]).
//! 2. Read each manifest and license file ([`scanner::resolver`]).
//! 3. Reduce the declared license to a canonical expression ([`license::normalizer`]).
//! 4. Optionally look up `UNKNOWN` licenses in the npm registry ([`registry`]).
//! 5. Count licenses and flag problematic packages ([`scanner::aggregator`]).
//! 6. Render a report ([`report`]), write attribution notices ([`notices`]),
//!    or maintain the provenance disclaimer ([`disclaimer`]).

pub mod cache;
pub mod config;
pub mod disclaimer;
pub mod error;
pub mod license;
pub mod models;
pub mod notices;
pub mod registry;
pub mod report;
pub mod scanner;

pub use error::AuditError;
pub use license::normalize;
pub use models::{PackageRecord, ScanResult};
pub use scanner::{scan, ScanOptions};
