//! Online enrichment from the npm registry.
//!
//! Packages whose local manifest yielded no license are looked up by
//! `name@version`; a registry answer replaces the record, a failure leaves it
//! as it was.

pub mod npm;

use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::debug;

use crate::license::{Normalizer, RawLicense};
use crate::models::{PackageRecord, UNKNOWN};

const BATCH_SIZE: usize = 75;

/// Rebuild `record` with the license declared by the registry, if any.
pub fn with_registry_license(
    record: PackageRecord,
    declared: Option<&Value>,
    normalizer: &Normalizer,
) -> PackageRecord {
    let license = match declared {
        Some(value) => normalizer.normalize(&RawLicense::from(value)),
        None => return record,
    };
    if license == UNKNOWN {
        return record;
    }
    PackageRecord { license, ..record }
}

/// Look up every `UNKNOWN` record in the registry.
pub async fn enrich_unknown(
    records: Vec<PackageRecord>,
    normalizer: &Normalizer,
    quiet: bool,
) -> Result<Vec<PackageRecord>> {
    let pending = records.iter().filter(|r| r.has_unknown_license()).count();
    if pending == 0 {
        return Ok(records);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let pb = if !quiet {
        let pb = ProgressBar::new(pending as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let (unknown, mut known): (Vec<_>, Vec<_>) = records
        .into_iter()
        .enumerate()
        .partition(|(_, r)| r.has_unknown_license());

    for batch in unknown.chunks(BATCH_SIZE) {
        let lookups: Vec<_> = batch
            .iter()
            .map(|(_, record)| {
                let client = client.clone();
                let name = record.name.clone();
                let version = record.version.clone();
                async move { npm::fetch_license(&client, &name, &version).await }
            })
            .collect();

        let results = join_all(lookups).await;

        for ((idx, record), result) in batch.iter().cloned().zip(results) {
            let declared = match result {
                Ok(declared) => declared,
                Err(err) => {
                    debug!(package = %record.id(), "registry lookup failed: {:#}", err);
                    None
                }
            };
            known.push((idx, with_registry_license(record, declared.as_ref(), normalizer)));
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    known.sort_by_key(|(idx, _)| *idx);
    Ok(known.into_iter().map(|(_, record)| record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::grammar::SpdxGrammar;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn unknown_record() -> PackageRecord {
        PackageRecord {
            name: "legacy".to_string(),
            version: "0.1.0".to_string(),
            license: UNKNOWN.to_string(),
            repository_url: None,
            is_private: false,
            license_file_path: None,
            license_file_text: None,
            license_file_error: None,
            directory_path: PathBuf::from("node_modules/legacy"),
        }
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(SpdxGrammar::builtin()))
    }

    #[test]
    fn test_registry_license_replaces_unknown() {
        let declared = json!([{ "type": "MIT" }, { "type": "New BSD" }]);
        let record = with_registry_license(unknown_record(), Some(&declared), &normalizer());
        assert_eq!(record.license, "MIT OR BSD-3-Clause");
        assert_eq!(record.name, "legacy");
    }

    #[test]
    fn test_missing_registry_license_keeps_record() {
        let record = with_registry_license(unknown_record(), None, &normalizer());
        assert_eq!(record, unknown_record());

        let empty = json!([]);
        let record = with_registry_license(unknown_record(), Some(&empty), &normalizer());
        assert_eq!(record, unknown_record());
    }

    #[tokio::test]
    async fn test_nothing_to_enrich_skips_network() {
        let mut record = unknown_record();
        record.license = "MIT".to_string();
        let records = enrich_unknown(vec![record.clone()], &normalizer(), true)
            .await
            .unwrap();
        assert_eq!(records, vec![record]);
    }
}
