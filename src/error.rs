use std::path::PathBuf;

use thiserror::Error;

/// Failures that make a whole operation meaningless.
///
/// Per-package problems never end up here: a missing manifest or an
/// unreadable license file only shapes the resulting records.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Cannot read install directory: {path}\nDetails: {source}")]
    InstallRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid project path: {path}\nReason: {reason}")]
    ProjectRootInvalid { path: PathBuf, reason: String },

    #[error("Project manifest not found: {path}")]
    ProjectManifestMissing { path: PathBuf },

    #[error("Disclaimer not found: {path}")]
    DisclaimerNotFound { path: PathBuf },

    #[error("Failed to parse config file: {path}\nDetails: {details}")]
    Config { path: PathBuf, details: String },
}
