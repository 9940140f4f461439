use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::AuditError;
use crate::license::expression::{self, Conjunction, LicenseExpr};
use crate::models::PolicyVerdict;

/// Root configuration structure, deserialized from `.license-audit/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// License policy rules. Without them only `UNKNOWN` licenses are flagged.
    #[serde(default)]
    pub policy: Option<PolicyConfig>,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub disclaimer: DisclaimerConfig,
}

/// Defines how canonical license expressions are evaluated.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Verdict applied to any license not explicitly listed in `licenses`.
    /// Defaults to `warn`.
    #[serde(default = "default_policy_action")]
    pub default: PolicyAction,
    /// Lowest verdict that marks a package as problematic. Defaults to `error`.
    #[serde(default = "default_fail_on")]
    pub fail_on: PolicyAction,
    /// Per-license overrides keyed by canonical identifier (e.g. `"MIT"`).
    #[serde(default)]
    pub licenses: HashMap<String, PolicyAction>,
}

fn default_policy_action() -> PolicyAction {
    PolicyAction::Warn
}

fn default_fail_on() -> PolicyAction {
    PolicyAction::Error
}

/// The action to take when a package's license matches a policy rule.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// Package is compliant; no action needed.
    Pass,
    /// Package warrants review.
    Warn,
    /// Package violates policy.
    Error,
}

impl PolicyAction {
    /// Convert to the corresponding [`PolicyVerdict`].
    pub fn to_verdict(self) -> PolicyVerdict {
        match self {
            PolicyAction::Pass => PolicyVerdict::Pass,
            PolicyAction::Warn => PolicyVerdict::Warn,
            PolicyAction::Error => PolicyVerdict::Error,
        }
    }
}

impl PolicyConfig {
    /// Built-in policy selected by `--strict` when no `[policy]` is configured.
    ///
    /// Permissive licenses pass, weak-copyleft licenses warn, and strong-copyleft
    /// licenses (GPL, AGPL) produce an error.
    pub fn recommended() -> Self {
        let mut licenses = HashMap::new();
        for id in ["MIT", "Apache-2.0", "BSD-2-Clause", "BSD-3-Clause", "ISC", "0BSD"] {
            licenses.insert(id.to_string(), PolicyAction::Pass);
        }
        for id in ["LGPL", "LGPL-2.1", "LGPL-3.0", "MPL-2.0"] {
            licenses.insert(id.to_string(), PolicyAction::Warn);
        }
        for id in ["GPL", "GPL-2.0", "GPL-3.0", "AGPL", "AGPL-3.0"] {
            licenses.insert(id.to_string(), PolicyAction::Error);
        }
        licenses.insert("UNKNOWN".to_string(), PolicyAction::Error);

        PolicyConfig {
            default: PolicyAction::Warn,
            fail_on: PolicyAction::Error,
            licenses,
        }
    }
}

/// Grammar services available to the normalizer.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizerConfig {
    /// Use the SPDX grammar service. When off, only heuristics apply.
    #[serde(default = "default_true")]
    pub grammar: bool,
    /// SPDX license-list JSON replacing the builtin catalog.
    #[serde(default)]
    pub license_list: Option<PathBuf>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            grammar: true,
            license_list: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Packages resolved concurrently per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Raw scan cache, relative to the project root.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".license-audit").join("licenses.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisclaimerConfig {
    /// Disclaimer partial, relative to the project root.
    #[serde(default = "default_disclaimer_path")]
    pub path: PathBuf,
    /// Regex looked for in the head of each markdown file.
    #[serde(default = "default_disclaimer_marker")]
    pub marker: String,
    /// Directory names never searched for markdown files.
    #[serde(default = "default_disclaimer_exclude")]
    pub exclude: Vec<String>,
}

impl Default for DisclaimerConfig {
    fn default() -> Self {
        Self {
            path: default_disclaimer_path(),
            marker: default_disclaimer_marker(),
            exclude: default_disclaimer_exclude(),
        }
    }
}

fn default_disclaimer_path() -> PathBuf {
    PathBuf::from("docs").join("partials").join("PROVENANCE.md")
}

fn default_disclaimer_marker() -> String {
    r"(?i)provenance and authorship|proveni[eê]ncia e autoria".to_string()
}

fn default_disclaimer_exclude() -> Vec<String> {
    ["node_modules", "dist", ".git", "coverage", ".license-audit"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Load the configuration, searching in order:
///
/// 1. `config_override`, from `--config`
/// 2. `<project_path>/.license-audit/config.toml`
/// 3. `~/.config/license-audit/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config, AuditError> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".license-audit").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-audit")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    debug!("no config file found; using defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config, AuditError> {
    let content = std::fs::read_to_string(path).map_err(|e| AuditError::Config {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    let config = toml::from_str(&content).map_err(|e| AuditError::Config {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Determine the policy verdict for a canonical license expression.
///
/// - `AND` binds tighter than `OR`; parentheses override precedence
/// - `OR` takes the most permissive verdict, `AND` the most restrictive
/// - `WITH` exception clauses are ignored; the base license is evaluated
/// - `/` is read as `OR` (`MIT/Apache-2.0`)
///
/// Expressions that do not parse are looked up as a whole.
pub fn apply_policy(policy: &PolicyConfig, license: &str) -> PolicyVerdict {
    // Exact match first (covers simple identifiers and the UNKNOWN sentinel)
    if let Some(action) = policy.licenses.get(license) {
        return action.to_verdict();
    }

    let normalized = license.replace('/', " OR ");

    match expression::parse(&normalized) {
        Ok(tree) => eval_tree(policy, &tree),
        Err(_) => apply_policy_single(policy, license),
    }
}

fn eval_tree(policy: &PolicyConfig, tree: &LicenseExpr) -> PolicyVerdict {
    match tree {
        LicenseExpr::License { id, or_later, .. } => {
            if *or_later {
                if let Some(action) = policy.licenses.get(&format!("{}+", id)) {
                    return action.to_verdict();
                }
            }
            apply_policy_single(policy, id)
        }
        LicenseExpr::Binary {
            conjunction,
            left,
            right,
        } => {
            let lhs = eval_tree(policy, left);
            let rhs = eval_tree(policy, right);
            match conjunction {
                Conjunction::Or => verdict_or(lhs, rhs),
                Conjunction::And => verdict_and(lhs, rhs),
            }
        }
    }
}

/// Look up a single (non-compound) identifier in the policy map.
fn apply_policy_single(policy: &PolicyConfig, id: &str) -> PolicyVerdict {
    if let Some(action) = policy.licenses.get(id) {
        return action.to_verdict();
    }
    policy.default.to_verdict()
}

/// `OR`: the less severe verdict.
fn verdict_or(a: PolicyVerdict, b: PolicyVerdict) -> PolicyVerdict {
    a.min(b)
}

/// `AND`: the more severe verdict.
fn verdict_and(a: PolicyVerdict, b: PolicyVerdict) -> PolicyVerdict {
    a.max(b)
}
