//! License expression normalization and risk classification.
//!
//! - [`normalizer`]: layered reduction of raw manifest values to a canonical
//!   expression ([`normalize`] is the entry point used by the scanner).
//! - [`grammar`]: optional SPDX correction / parsing / catalog services.
//! - [`expression`]: expression tree and parser.
//! - [`catalog`]: SPDX identifiers and names.
//! - [`corrector`]: free-text to identifier correction.
//! - [`classifier`]: risk level of a canonical expression.

pub mod catalog;
pub mod classifier;
pub mod corrector;
pub mod expression;
pub mod grammar;
pub mod normalizer;

pub use normalizer::{Normalizer, RawLicense};

/// Normalize `raw` with the process-wide grammar service.
pub fn normalize(raw: &RawLicense) -> String {
    Normalizer::global().normalize(raw)
}
