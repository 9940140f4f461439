//! Catalog of SPDX license identifiers and their full names.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// `(identifier, full name)` pairs shipped with the binary.
const BUILTIN_LICENSES: &[(&str, &str)] = &[
    ("0BSD", "BSD Zero Clause License"),
    ("AFL-3.0", "Academic Free License v3.0"),
    ("AGPL-1.0", "Affero General Public License v1.0"),
    ("AGPL-3.0", "GNU Affero General Public License v3.0"),
    ("AGPL-3.0-only", "GNU Affero General Public License v3.0 only"),
    ("AGPL-3.0-or-later", "GNU Affero General Public License v3.0 or later"),
    ("APSL-2.0", "Apple Public Source License 2.0"),
    ("Apache-1.1", "Apache License 1.1"),
    ("Apache-2.0", "Apache License 2.0"),
    ("Artistic-1.0", "Artistic License 1.0"),
    ("Artistic-2.0", "Artistic License 2.0"),
    ("BlueOak-1.0.0", "Blue Oak Model License 1.0.0"),
    ("BSD-1-Clause", "BSD 1-Clause License"),
    ("BSD-2-Clause", "BSD 2-Clause \"Simplified\" License"),
    ("BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License"),
    ("BSD-3-Clause-Clear", "BSD 3-Clause Clear License"),
    ("BSD-4-Clause", "BSD 4-Clause \"Original\" or \"Old\" License"),
    ("BSL-1.0", "Boost Software License 1.0"),
    ("BUSL-1.1", "Business Source License 1.1"),
    ("CC-BY-3.0", "Creative Commons Attribution 3.0 Unported"),
    ("CC-BY-4.0", "Creative Commons Attribution 4.0 International"),
    ("CC-BY-SA-3.0", "Creative Commons Attribution Share Alike 3.0 Unported"),
    ("CC-BY-SA-4.0", "Creative Commons Attribution Share Alike 4.0 International"),
    ("CC-BY-NC-4.0", "Creative Commons Attribution Non Commercial 4.0 International"),
    ("CC0-1.0", "Creative Commons Zero v1.0 Universal"),
    ("CDDL-1.0", "Common Development and Distribution License 1.0"),
    ("CDDL-1.1", "Common Development and Distribution License 1.1"),
    ("CECILL-2.1", "CeCILL Free Software License Agreement v2.1"),
    ("CPAL-1.0", "Common Public Attribution License 1.0"),
    ("CPL-1.0", "Common Public License 1.0"),
    ("ECL-2.0", "Educational Community License v2.0"),
    ("EPL-1.0", "Eclipse Public License 1.0"),
    ("EPL-2.0", "Eclipse Public License 2.0"),
    ("EUPL-1.1", "European Union Public License 1.1"),
    ("EUPL-1.2", "European Union Public License 1.2"),
    ("GFDL-1.3", "GNU Free Documentation License v1.3"),
    ("GPL-1.0", "GNU General Public License v1.0 only"),
    ("GPL-2.0", "GNU General Public License v2.0"),
    ("GPL-2.0-only", "GNU General Public License v2.0 only"),
    ("GPL-2.0-or-later", "GNU General Public License v2.0 or later"),
    ("GPL-3.0", "GNU General Public License v3.0"),
    ("GPL-3.0-only", "GNU General Public License v3.0 only"),
    ("GPL-3.0-or-later", "GNU General Public License v3.0 or later"),
    ("Hippocratic-2.1", "Hippocratic License 2.1"),
    ("ISC", "ISC License"),
    ("LGPL-2.0", "GNU Library General Public License v2"),
    ("LGPL-2.0-only", "GNU Library General Public License v2 only"),
    ("LGPL-2.0-or-later", "GNU Library General Public License v2 or later"),
    ("LGPL-2.1", "GNU Lesser General Public License v2.1"),
    ("LGPL-2.1-only", "GNU Lesser General Public License v2.1 only"),
    ("LGPL-2.1-or-later", "GNU Lesser General Public License v2.1 or later"),
    ("LGPL-3.0", "GNU Lesser General Public License v3.0"),
    ("LGPL-3.0-only", "GNU Lesser General Public License v3.0 only"),
    ("LGPL-3.0-or-later", "GNU Lesser General Public License v3.0 or later"),
    ("MIT", "MIT License"),
    ("MIT-0", "MIT No Attribution"),
    ("MPL-1.1", "Mozilla Public License 1.1"),
    ("MPL-2.0", "Mozilla Public License 2.0"),
    ("MS-PL", "Microsoft Public License"),
    ("MS-RL", "Microsoft Reciprocal License"),
    ("NCSA", "University of Illinois/NCSA Open Source License"),
    ("ODbL-1.0", "Open Data Commons Open Database License v1.0"),
    ("OFL-1.1", "SIL Open Font License 1.1"),
    ("OpenSSL", "OpenSSL License"),
    ("OSL-3.0", "Open Software License 3.0"),
    ("PostgreSQL", "PostgreSQL License"),
    ("PSF-2.0", "Python Software Foundation License 2.0"),
    ("Python-2.0", "Python License 2.0"),
    ("Ruby", "Ruby License"),
    ("SSPL-1.0", "Server Side Public License, v 1"),
    ("Unicode-DFS-2016", "Unicode License Agreement - Data Files and Software (2016)"),
    ("Unlicense", "The Unlicense"),
    ("UPL-1.0", "Universal Permissive License v1.0"),
    ("W3C", "W3C Software Notice and License (2002-12-31)"),
    ("WTFPL", "Do What The F*ck You Want To Public License"),
    ("X11", "X11 License"),
    ("Zlib", "zlib License"),
    ("ZPL-2.1", "Zope Public License 2.1"),
];

const BUILTIN_EXCEPTIONS: &[&str] = &[
    "Autoconf-exception-3.0",
    "Bison-exception-2.2",
    "Classpath-exception-2.0",
    "Font-exception-2.0",
    "GCC-exception-3.1",
    "LLVM-exception",
    "Linux-syscall-note",
    "OpenJDK-assembly-exception-1.0",
    "Qt-LGPL-exception-1.1",
    "Swift-exception",
    "WxWindows-exception-3.1",
    "eCos-exception-2.0",
    "freertos-exception-2.0",
    "u-boot-exception-2.0",
];

/// One entry of an SPDX license-list JSON file
/// (`{"MIT": {"name": "MIT License", "url": ..., "osiApproved": true}}`).
#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
}

/// Identifier and name lookups over a fixed set of licenses.
///
/// Entries keep insertion order so that case-insensitive lookups that hit more
/// than one entry always resolve to the same identifier.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<(String, String)>,
    exact: HashMap<String, usize>,
    by_lower_id: HashMap<String, usize>,
    by_lower_name: HashMap<String, usize>,
    exceptions: HashMap<String, String>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_LICENSES
                .iter()
                .map(|(id, name)| (id.to_string(), name.to_string())),
        )
    }

    /// Load an SPDX license-list JSON file. Exceptions stay the builtin set.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read license list {}", path.display()))?;
        let list: BTreeMap<String, ListEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse license list {}", path.display()))?;
        Ok(Self::from_entries(
            list.into_iter().map(|(id, entry)| (id, entry.name)),
        ))
    }

    fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut catalog = Catalog {
            entries: Vec::new(),
            exact: HashMap::new(),
            by_lower_id: HashMap::new(),
            by_lower_name: HashMap::new(),
            exceptions: BUILTIN_EXCEPTIONS
                .iter()
                .map(|e| (e.to_lowercase(), e.to_string()))
                .collect(),
        };
        for (id, name) in entries {
            let idx = catalog.entries.len();
            catalog.exact.entry(id.clone()).or_insert(idx);
            catalog.by_lower_id.entry(id.to_lowercase()).or_insert(idx);
            catalog.by_lower_name.entry(name.to_lowercase()).or_insert(idx);
            catalog.entries.push((id, name));
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.exact.contains_key(id)
    }

    pub fn id_exact(&self, id: &str) -> Option<&str> {
        self.exact.get(id).map(|&i| self.entries[i].0.as_str())
    }

    pub fn id_ignore_case(&self, id: &str) -> Option<&str> {
        self.by_lower_id
            .get(&id.to_lowercase())
            .map(|&i| self.entries[i].0.as_str())
    }

    pub fn id_by_name(&self, name: &str) -> Option<&str> {
        self.by_lower_name
            .get(&name.to_lowercase())
            .map(|&i| self.entries[i].0.as_str())
    }

    pub fn exception(&self, exception: &str) -> Option<&str> {
        self.exceptions
            .get(&exception.to_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_lookups() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.id_exact("MIT"), Some("MIT"));
        assert_eq!(catalog.id_exact("mit"), None);
        assert_eq!(catalog.id_ignore_case("apache-2.0"), Some("Apache-2.0"));
        assert_eq!(catalog.id_by_name("the unlicense"), Some("Unlicense"));
        assert_eq!(catalog.id_by_name("ISC License"), Some("ISC"));
        assert_eq!(
            catalog.exception("classpath-exception-2.0"),
            Some("Classpath-exception-2.0")
        );
    }

    #[test]
    fn test_sentinel_is_not_a_license() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.id_ignore_case("UNKNOWN"), None);
        assert_eq!(catalog.id_by_name("UNKNOWN"), None);
    }

    #[test]
    fn test_load_license_list_json() {
        let json = r#"{
  "MIT": { "name": "MIT License", "url": "http://www.opensource.org/licenses/MIT", "osiApproved": true },
  "Beerware": { "name": "Beerware License", "url": "https://fedoraproject.org/wiki/Licensing/Beerware", "osiApproved": false }
}"#;
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", json).unwrap();
        let catalog = Catalog::from_json_file(f.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.id_by_name("beerware license"), Some("Beerware"));
        assert!(!catalog.contains_id("ISC"));
    }

    #[test]
    fn test_load_rejects_malformed_list() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "[1, 2, 3]").unwrap();
        assert!(Catalog::from_json_file(f.path()).is_err());
    }
}
