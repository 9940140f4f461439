use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::{apply_policy, PolicyConfig};
use crate::models::{PackageRecord, PolicyVerdict, ScanResult};

/// Decides which packages are reported as problematic.
pub trait ClassificationPolicy: Send + Sync {
    fn is_problematic(&self, record: &PackageRecord) -> bool;
}

/// Baseline: a package is problematic when its license is `UNKNOWN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownLicensePolicy;

impl ClassificationPolicy for UnknownLicensePolicy {
    fn is_problematic(&self, record: &PackageRecord) -> bool {
        record.has_unknown_license()
    }
}

/// Policy table from the `[policy]` config section, layered on the baseline.
#[derive(Debug, Clone)]
pub struct ConfiguredPolicy {
    policy: PolicyConfig,
}

impl ConfiguredPolicy {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    pub fn verdict(&self, record: &PackageRecord) -> PolicyVerdict {
        apply_policy(&self.policy, &record.license)
    }
}

impl ClassificationPolicy for ConfiguredPolicy {
    fn is_problematic(&self, record: &PackageRecord) -> bool {
        record.has_unknown_license() || self.verdict(record) >= self.policy.fail_on.to_verdict()
    }
}

/// Fold a completed set of records into a [`ScanResult`].
pub fn aggregate(records: Vec<PackageRecord>, policy: &dyn ClassificationPolicy) -> ScanResult {
    let mut license_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_filtered = 0;

    for record in records.iter().filter(|r| !r.is_type_declaration()) {
        total_filtered += 1;
        *license_counts.entry(record.license.clone()).or_insert(0) += 1;
    }

    let problematic = records
        .iter()
        .filter(|r| policy.is_problematic(r))
        .cloned()
        .collect();

    ScanResult {
        generated_at: Utc::now(),
        total_packages: records.len(),
        total_filtered,
        license_counts,
        packages: records,
        problematic,
    }
}
