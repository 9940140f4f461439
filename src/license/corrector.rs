//! Best-effort spelling correction of free-text license names into catalog
//! identifiers.
//!
//! Correction only ever answers with an identifier present in the catalog,
//! and never guesses a version or variant that the input does not carry: a
//! bare `GPL` or `BSD` stays uncorrected, and `Public Domain` is not mapped
//! to any dedication license.

use super::catalog::Catalog;

/// Long-form names and common misspellings, matched case-insensitively.
fn known_alias(lower: &str) -> Option<&'static str> {
    let id = match lower {
        "apache 2" | "apache 2.0" | "apache2" | "apache v2" | "apache license 2.0"
        | "apache license, version 2.0" | "apache license version 2.0"
        | "apache software license" => "Apache-2.0",
        "mit license" | "the mit license" | "mit/x11" | "expat" => "MIT",
        "new bsd" | "modified bsd" | "bsd 3-clause" | "revised bsd" => "BSD-3-Clause",
        "bsd 2-clause" | "simplified bsd" | "freebsd" => "BSD-2-Clause",
        "gnu gpl v2" | "gnu general public license v2" | "gpl v2" | "gplv2" | "gpl2" => {
            "GPL-2.0"
        }
        "gnu gpl v3" | "gnu general public license v3" | "gpl v3" | "gplv3" | "gpl3" => {
            "GPL-3.0"
        }
        "gnu lgpl v2.1" | "lgpl v2.1" | "lgplv2.1" | "lgpl2.1" => "LGPL-2.1",
        "gnu lgpl v3" | "lgpl v3" | "lgplv3" | "lgpl3" => "LGPL-3.0",
        "agpl v3" | "agplv3" | "gnu agpl v3" | "agpl3" => "AGPL-3.0",
        "mozilla public license 2.0" | "mpl 2.0" | "mplv2" | "mpl2" => "MPL-2.0",
        "isc license" => "ISC",
        "cc0" => "CC0-1.0",
        "boost" | "boost software license" => "BSL-1.0",
        "unlicense" => "Unlicense",
        _ => return None,
    };
    Some(id)
}

/// Rewrites tried, in order, after exact and alias matching fail.
fn candidates(lower: &str) -> Vec<String> {
    let mut out = Vec::new();

    let mut base = lower.to_string();
    if let Some(rest) = base.strip_prefix("the ") {
        base = rest.to_string();
    }
    for suffix in [" license", " licence"] {
        if let Some(rest) = base.strip_suffix(suffix) {
            base = rest.to_string();
        }
    }
    out.push(base.clone());

    let versioned = base
        .replace(", version ", "-")
        .replace(" version ", "-")
        .replace(" v", "-");
    let hyphenated = versioned.split_whitespace().collect::<Vec<_>>().join("-");
    out.push(hyphenated.clone());

    // "apache-2" → "apache-2.0"
    if hyphenated.ends_with(|c: char| c.is_ascii_digit()) {
        let last_segment = hyphenated.rsplit('-').next().unwrap_or("");
        if !last_segment.contains('.') {
            out.push(format!("{}.0", hyphenated));
        }
    }

    out.dedup();
    out
}

/// Correct `raw` to a catalog identifier, if it plausibly names one.
pub fn correct(catalog: &Catalog, raw: &str) -> Option<String> {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.is_empty() {
        return None;
    }

    if let Some(id) = catalog.id_exact(&trimmed) {
        return Some(id.to_string());
    }

    let lower = trimmed.to_lowercase();
    if let Some(id) = known_alias(&lower) {
        if catalog.contains_id(id) {
            return Some(id.to_string());
        }
    }

    if let Some(id) = catalog.id_ignore_case(&lower) {
        return Some(id.to_string());
    }

    candidates(&lower).into_iter().find_map(|candidate| {
        catalog
            .id_ignore_case(&candidate)
            .or_else(|| catalog.id_by_name(&candidate))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(raw: &str) -> Option<String> {
        correct(&Catalog::builtin(), raw)
    }

    #[test]
    fn test_canonical_ids_are_fixed_points() {
        for id in ["MIT", "Apache-2.0", "GPL-3.0-or-later", "0BSD", "ISC"] {
            assert_eq!(fix(id).as_deref(), Some(id));
        }
    }

    #[test]
    fn test_long_form_names() {
        assert_eq!(fix("MIT License").as_deref(), Some("MIT"));
        assert_eq!(fix("Apache License, Version 2.0").as_deref(), Some("Apache-2.0"));
        assert_eq!(fix("The   MIT  License").as_deref(), Some("MIT"));
        assert_eq!(fix("GPLv3").as_deref(), Some("GPL-3.0"));
    }

    #[test]
    fn test_case_and_spacing_rewrites() {
        assert_eq!(fix("mit").as_deref(), Some("MIT"));
        assert_eq!(fix("mpl 2").as_deref(), Some("MPL-2.0"));
        assert_eq!(fix("Apache License 2.0").as_deref(), Some("Apache-2.0"));
        assert_eq!(fix("Zlib License").as_deref(), Some("Zlib"));
    }

    #[test]
    fn test_no_version_guessing() {
        assert_eq!(fix("gpl"), None);
        assert_eq!(fix("apache"), None);
        assert_eq!(fix("bsd"), None);
        assert_eq!(fix("BSD License"), None);
        assert_eq!(fix("Public Domain"), None);
        assert_eq!(fix("New BSD").as_deref(), Some("BSD-3-Clause"));
        assert_eq!(fix("UNKNOWN"), None);
        assert_eq!(fix("SEE LICENSE IN LICENSE.md"), None);
        assert_eq!(fix(""), None);
    }
}
