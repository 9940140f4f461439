//! Optional license-grammar services used by the normalizer.
//!
//! A service bundles three capabilities: spelling correction, expression
//! parsing and catalog lookup. Any of them may be absent; the normalizer
//! degrades to its heuristic path when they are. The active service is
//! process-wide, installed at most once and read-only afterwards.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use super::catalog::Catalog;
use super::corrector;
use super::expression::{self, ExpressionError, LicenseExpr};
use crate::config::NormalizerConfig;

pub trait LicenseGrammarService: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Best-effort correction of `raw` to a known identifier.
    fn correct(&self, raw: &str) -> Option<String>;

    /// Parse `expr` into a tree whose leaves are all known identifiers.
    fn parse(&self, expr: &str) -> Result<LicenseExpr, ExpressionError>;

    /// Canonical identifier for `token`: exact identifier match, then
    /// case-insensitive identifier match, then full license name.
    fn lookup(&self, token: &str) -> Option<String>;
}

/// Service used when no grammar data is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGrammar;

impl LicenseGrammarService for NullGrammar {
    fn name(&self) -> &'static str {
        "none"
    }

    fn correct(&self, _raw: &str) -> Option<String> {
        None
    }

    fn parse(&self, _expr: &str) -> Result<LicenseExpr, ExpressionError> {
        Err(ExpressionError::Unavailable)
    }

    fn lookup(&self, _token: &str) -> Option<String> {
        None
    }
}

/// SPDX-backed service over a [`Catalog`].
#[derive(Debug, Clone)]
pub struct SpdxGrammar {
    catalog: Catalog,
}

impl SpdxGrammar {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn builtin() -> Self {
        Self::new(Catalog::builtin())
    }

    fn is_known(&self, id: &str) -> bool {
        self.catalog.contains_id(id) || id.starts_with("LicenseRef-") || id.starts_with("DocumentRef-")
    }
}

impl LicenseGrammarService for SpdxGrammar {
    fn name(&self) -> &'static str {
        "spdx"
    }

    fn correct(&self, raw: &str) -> Option<String> {
        corrector::correct(&self.catalog, raw)
    }

    fn parse(&self, expr: &str) -> Result<LicenseExpr, ExpressionError> {
        let tree = expression::parse(expr)?;
        for (id, exception) in tree.leaves() {
            if !self.is_known(id) {
                return Err(ExpressionError::UnknownIdentifier(id.to_string()));
            }
            if let Some(exception) = exception {
                if self.catalog.exception(exception).is_none() {
                    return Err(ExpressionError::UnknownException(exception.to_string()));
                }
            }
        }
        Ok(tree)
    }

    fn lookup(&self, token: &str) -> Option<String> {
        let token = token.trim();
        self.catalog
            .id_exact(token)
            .or_else(|| self.catalog.id_ignore_case(token))
            .or_else(|| self.catalog.id_by_name(token))
            .map(str::to_string)
    }
}

/// Build the service described by `config`.
///
/// A license list that cannot be loaded is reported and replaced by the
/// builtin catalog.
pub fn from_config(config: &NormalizerConfig) -> Arc<dyn LicenseGrammarService> {
    if !config.grammar {
        debug!("license grammar disabled by configuration");
        return Arc::new(NullGrammar);
    }

    let catalog = match &config.license_list {
        Some(path) => match Catalog::from_json_file(path) {
            Ok(catalog) => {
                debug!(path = %path.display(), licenses = catalog.len(), "loaded license list");
                catalog
            }
            Err(err) => {
                warn!("{:#}; using builtin license catalog", err);
                Catalog::builtin()
            }
        },
        None => Catalog::builtin(),
    };

    Arc::new(SpdxGrammar::new(catalog))
}

static ACTIVE: OnceLock<Arc<dyn LicenseGrammarService>> = OnceLock::new();

/// Install the process-wide service. Returns `false` if one was already
/// installed (explicitly or by a previous call to [`global`]).
pub fn install(service: Arc<dyn LicenseGrammarService>) -> bool {
    let name = service.name();
    let installed = ACTIVE.set(service).is_ok();
    if installed {
        debug!(service = name, "installed license grammar service");
    } else {
        debug!(service = name, "license grammar service already installed; keeping it");
    }
    installed
}

/// The process-wide service, installing the builtin SPDX service on first use.
pub fn global() -> Arc<dyn LicenseGrammarService> {
    ACTIVE
        .get_or_init(|| {
            debug!("installing builtin license grammar service");
            Arc::new(SpdxGrammar::builtin())
        })
        .clone()
}
