//! Installed-dependency scan: walk `node_modules`, resolve each package, fold
//! the records into a [`ScanResult`].
//!
//! - [`walker`]: enumerates package directories (scoped namespaces included).
//! - [`resolver`]: manifest + license file → [`PackageRecord`].
//! - [`aggregator`]: counts and the problematic-package policy.

pub mod aggregator;
pub mod resolver;
pub mod walker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::AuditError;
use crate::license::Normalizer;
use crate::models::{PackageRecord, ScanResult};
use aggregator::{aggregate, ClassificationPolicy, UnknownLicensePolicy};
use resolver::Resolver;

pub const INSTALL_DIR: &str = "node_modules";

const DEFAULT_CONCURRENCY: usize = 64;

pub struct ScanOptions {
    pub normalizer: Normalizer,
    pub policy: Arc<dyn ClassificationPolicy>,
    /// Packages resolved concurrently per batch.
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            normalizer: Normalizer::global(),
            policy: Arc::new(UnknownLicensePolicy),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Check that `root` is an existing directory and return its install dir.
pub fn install_dir_of(root: &Path) -> Result<PathBuf, AuditError> {
    let meta = std::fs::metadata(root).map_err(|e| AuditError::ProjectRootInvalid {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(AuditError::ProjectRootInvalid {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(root.join(INSTALL_DIR))
}

/// Resolve every package under `install_dir`, in discovery order.
pub async fn collect(
    install_dir: &Path,
    options: &ScanOptions,
) -> Result<Vec<PackageRecord>, AuditError> {
    let dirs = walker::walk(install_dir)?;
    debug!(
        dir = %install_dir.display(),
        candidates = dirs.len(),
        grammar = options.normalizer.grammar_name(),
        "resolving packages"
    );

    let resolver = Resolver::new(options.normalizer.clone());
    let mut records = Vec::with_capacity(dirs.len());

    for batch in dirs.chunks(options.concurrency.max(1)) {
        let tasks: Vec<_> = batch
            .iter()
            .map(|dir| {
                let resolver = resolver.clone();
                let dir = dir.clone();
                tokio::task::spawn_blocking(move || resolver.resolve(&dir))
            })
            .collect();

        for (dir, outcome) in batch.iter().zip(join_all(tasks).await) {
            match outcome {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(err) => warn!(dir = %dir.display(), %err, "package resolution aborted"),
            }
        }
    }

    Ok(records)
}

/// Scan `install_dir` and aggregate the records.
pub async fn scan(install_dir: &Path, options: &ScanOptions) -> Result<ScanResult, AuditError> {
    let records = collect(install_dir, options).await?;
    Ok(aggregate(records, options.policy.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::grammar::{NullGrammar, SpdxGrammar};
    use tempfile::TempDir;

    fn write_package(nm: &Path, rel: &str, manifest: &str) {
        let dir = nm.join(rel);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("package.json"), manifest).unwrap();
    }

    fn options(normalizer: Normalizer) -> ScanOptions {
        ScanOptions {
            normalizer,
            policy: Arc::new(UnknownLicensePolicy),
            concurrency: 2,
        }
    }

    #[tokio::test]
    async fn test_scan_project_tree() {
        let tmp = TempDir::new().unwrap();
        let nm = tmp.path().join(INSTALL_DIR);
        write_package(&nm, "express", r#"{"name":"express","version":"4.18.2","license":"MIT"}"#);
        write_package(&nm, "dual", r#"{"name":"dual","version":"1.0.0","license":"Apache OR mit"}"#);
        write_package(&nm, "@babel/core", r#"{"name":"@babel/core","version":"7.0.0","license":"MIT"}"#);
        write_package(&nm, "@types/node", r#"{"name":"@types/node","version":"20.0.0","license":"MIT"}"#);
        write_package(&nm, "mystery", r#"{"name":"mystery","version":"0.1.0"}"#);
        std::fs::create_dir_all(nm.join(".bin")).unwrap();
        std::fs::create_dir_all(nm.join("not-a-package")).unwrap();

        let normalizer = Normalizer::new(Arc::new(SpdxGrammar::builtin()));
        let result = scan(&nm, &options(normalizer)).await.unwrap();

        let names: Vec<_> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["@babel/core", "@types/node", "dual", "express", "mystery"]
        );
        assert_eq!(result.total_packages, 5);
        assert_eq!(result.total_filtered, 4);
        assert_eq!(result.license_counts.get("MIT"), Some(&2));
        assert_eq!(result.license_counts.get("Apache-2.0 OR MIT"), Some(&1));
        assert_eq!(result.license_counts.get("UNKNOWN"), Some(&1));
        assert_eq!(result.problematic.len(), 1);
        assert_eq!(result.problematic[0].name, "mystery");
    }

    #[tokio::test]
    async fn test_scoped_children_are_independent_packages() {
        let tmp = TempDir::new().unwrap();
        let nm = tmp.path().join(INSTALL_DIR);
        write_package(&nm, "@scope/a", r#"{"name":"@scope/a","license":"ISC"}"#);
        write_package(&nm, "@scope/b", r#"{"name":"@scope/b","license":"MIT"}"#);
        std::fs::write(nm.join("@scope").join("package.json"), r#"{"name":"@scope"}"#).unwrap();

        let result = scan(&nm, &options(Normalizer::new(Arc::new(NullGrammar))))
            .await
            .unwrap();
        let names: Vec<_> = result.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["@scope/a", "@scope/b"]);
    }

    #[tokio::test]
    async fn test_missing_install_dir_is_empty_scan() {
        let tmp = TempDir::new().unwrap();
        let result = scan(&tmp.path().join(INSTALL_DIR), &ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(result.total_packages, 0);
        assert!(result.packages.is_empty());
        assert!(!result.has_problems());
    }

    #[tokio::test]
    async fn test_unreadable_install_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let nm = tmp.path().join(INSTALL_DIR);
        std::fs::write(&nm, "not a dir").unwrap();

        assert!(matches!(
            scan(&nm, &ScanOptions::default()).await,
            Err(AuditError::InstallRootUnreadable { .. })
        ));
    }

    #[test]
    fn test_install_dir_of_validates_root() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            install_dir_of(tmp.path()).unwrap(),
            tmp.path().join(INSTALL_DIR)
        );

        let missing = tmp.path().join("nope");
        assert!(matches!(
            install_dir_of(&missing),
            Err(AuditError::ProjectRootInvalid { .. })
        ));

        let file = tmp.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(
            install_dir_of(&file),
            Err(AuditError::ProjectRootInvalid { .. })
        ));
    }
}
