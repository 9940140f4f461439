use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::license::{Normalizer, RawLicense};
use crate::models::{PackageRecord, UNKNOWN};

const MANIFEST_FILE: &str = "package.json";
const DEFAULT_VERSION: &str = "0.0.0";

/// Probed in order; the first regular file wins.
pub const LICENSE_FILE_NAMES: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENSE-MIT",
    "LICENCE",
    "LICENCE.md",
    "LICENCE.txt",
    "license",
    "license.md",
    "license.txt",
    "License.md",
    "COPYING",
    "COPYING.md",
    "COPYING.txt",
];

/// The fields of a package manifest the resolver cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub license: RawLicense,
    pub repository: Option<String>,
    pub private: bool,
}

impl Manifest {
    pub fn from_json(json: &Value) -> Self {
        let non_empty_str = |key: &str| {
            json.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        // `license` wins when set; legacy manifests use `licenses`
        let license = match json.get("license") {
            Some(value) if truthy(value) => RawLicense::from(value),
            _ => json
                .get("licenses")
                .filter(|v| truthy(v))
                .map(RawLicense::from)
                .unwrap_or(RawLicense::Absent),
        };

        let repository = json.get("repository").and_then(|repo| match repo {
            Value::String(url) => Some(url.clone()),
            Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        });

        Manifest {
            name: non_empty_str("name"),
            version: non_empty_str("version"),
            license,
            repository,
            private: json.get("private").is_some_and(truthy),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub trait ManifestReader: Send + Sync {
    /// `None` when the directory has no manifest or it is malformed.
    fn read_manifest(&self, dir: &Path) -> Option<Manifest>;
}

/// Reads `package.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageJsonReader;

impl ManifestReader for PackageJsonReader {
    fn read_manifest(&self, dir: &Path) -> Option<Manifest> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Value>(&content) {
            Ok(json) if json.is_object() => Some(Manifest::from_json(&json)),
            Ok(_) => {
                debug!(path = %path.display(), "manifest is not an object");
                None
            }
            Err(err) => {
                debug!(path = %path.display(), %err, "malformed manifest");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LicenseFile {
    pub path: PathBuf,
    /// `None` when the file exists but could not be read.
    pub text: Option<String>,
    /// The read error, when `text` is `None`.
    pub error: Option<String>,
}

pub trait LicenseFileLocator: Send + Sync {
    fn locate(&self, dir: &Path) -> Option<LicenseFile>;
}

/// Probes [`LICENSE_FILE_NAMES`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ConventionalLicenseFiles;

impl LicenseFileLocator for ConventionalLicenseFiles {
    fn locate(&self, dir: &Path) -> Option<LicenseFile> {
        let path = LICENSE_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())?;

        let (text, error) = match std::fs::read(&path) {
            Ok(bytes) => (Some(String::from_utf8_lossy(&bytes).into_owned()), None),
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot read license file");
                (None, Some(err.to_string()))
            }
        };
        Some(LicenseFile { path, text, error })
    }
}

/// Builds a [`PackageRecord`] from one package directory.
#[derive(Clone)]
pub struct Resolver {
    manifests: Arc<dyn ManifestReader>,
    license_files: Arc<dyn LicenseFileLocator>,
    normalizer: Normalizer,
}

impl Resolver {
    pub fn new(normalizer: Normalizer) -> Self {
        Self::with_collaborators(
            Arc::new(PackageJsonReader),
            Arc::new(ConventionalLicenseFiles),
            normalizer,
        )
    }

    pub fn with_collaborators(
        manifests: Arc<dyn ManifestReader>,
        license_files: Arc<dyn LicenseFileLocator>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            manifests,
            license_files,
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// `None` when `dir` is not a package (no readable manifest).
    pub fn resolve(&self, dir: &Path) -> Option<PackageRecord> {
        let manifest = match self.manifests.read_manifest(dir) {
            Some(manifest) => manifest,
            None => {
                debug!(dir = %dir.display(), "no manifest; skipping");
                return None;
            }
        };

        let raw = match manifest.license {
            RawLicense::Absent => RawLicense::from(UNKNOWN),
            raw => raw,
        };
        let license = self.normalizer.normalize(&raw);
        let (license_file_path, license_file_text, license_file_error) =
            match self.license_files.locate(dir) {
                Some(file) => (Some(file.path), file.text, file.error),
                None => (None, None, None),
            };

        Some(PackageRecord {
            name: manifest.name.unwrap_or_else(|| fallback_name(dir)),
            version: manifest
                .version
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            license,
            repository_url: manifest.repository,
            is_private: manifest.private,
            license_file_path,
            license_file_text,
            license_file_error,
            directory_path: dir.to_path_buf(),
        })
    }
}

/// Directory name, prefixed with its `@scope` when nested in one.
fn fallback_name(dir: &Path) -> String {
    let base = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let scope = dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| n.starts_with('@'));
    match scope {
        Some(scope) => format!("{}/{}", scope, base),
        None => base,
    }
}
