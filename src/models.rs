use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel expression for a package whose license could not be determined.
pub const UNKNOWN: &str = "UNKNOWN";

/// Scope holding type-declaration-only packages (`@types/node`, ...).
const TYPES_SCOPE: &str = "@types/";

/// One resolved dependency found under the install directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    /// Canonical license expression, or [`UNKNOWN`].
    pub license: String,
    pub repository_url: Option<String>,
    pub is_private: bool,
    pub license_file_path: Option<PathBuf>,
    pub license_file_text: Option<String>,
    /// Why the license file could not be read, when it could not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_file_error: Option<String>,
    pub directory_path: PathBuf,
}

impl PackageRecord {
    /// Packages that only ship type metadata for another package carry no
    /// runtime code and are left out of license accounting.
    pub fn is_type_declaration(&self) -> bool {
        self.name.starts_with(TYPES_SCOPE)
    }

    pub fn has_unknown_license(&self) -> bool {
        self.license == UNKNOWN
    }

    /// `name@version`, the key used by notices and reports.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Aggregate of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub generated_at: DateTime<Utc>,
    pub total_packages: usize,
    pub total_filtered: usize,
    pub license_counts: BTreeMap<String, usize>,
    pub packages: Vec<PackageRecord>,
    pub problematic: Vec<PackageRecord>,
}

impl ScanResult {
    /// Result of scanning a project with nothing installed.
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            total_packages: 0,
            total_filtered: 0,
            license_counts: BTreeMap::new(),
            packages: Vec::new(),
            problematic: Vec::new(),
        }
    }

    pub fn has_problems(&self) -> bool {
        !self.problematic.is_empty()
    }

    /// License counts ordered by descending count, ties by expression.
    pub fn top_licenses(&self) -> Vec<(&str, usize)> {
        let mut pairs: Vec<(&str, usize)> = self
            .license_counts
            .iter()
            .map(|(lic, cnt)| (lic.as_str(), *cnt))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Proprietary => write!(f, "Proprietary"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Ordered by severity: `Pass < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyVerdict {
    Pass,
    Warn,
    Error,
}

impl std::fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyVerdict::Pass => write!(f, "pass"),
            PolicyVerdict::Warn => write!(f, "warn"),
            PolicyVerdict::Error => write!(f, "error"),
        }
    }
}
