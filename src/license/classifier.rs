use crate::models::{LicenseRisk, UNKNOWN};

/// Classify a single canonical identifier into a risk level.
fn classify_id(id: &str) -> LicenseRisk {
    let id = id.trim().trim_end_matches('+');
    match id {
        // Permissive
        "MIT"
        | "MIT-0"
        | "Apache-2.0"
        | "BSD-2-Clause"
        | "BSD-3-Clause"
        | "BSD-4-Clause"
        | "0BSD"
        | "ISC"
        | "Unlicense"
        | "Zlib"
        | "CC0-1.0"
        | "WTFPL"
        | "CC-BY-4.0"
        | "CC-BY-3.0"
        | "PSF-2.0"
        | "Python-2.0"
        | "BlueOak-1.0.0"
        | "BSL-1.0"
        | "Artistic-2.0"
        | "Unicode-DFS-2016" => LicenseRisk::Permissive,

        // Weak copyleft
        "LGPL"
        | "LGPL-2.0"
        | "LGPL-2.0-only"
        | "LGPL-2.0-or-later"
        | "LGPL-2.1"
        | "LGPL-2.1-only"
        | "LGPL-2.1-or-later"
        | "LGPL-3.0"
        | "LGPL-3.0-only"
        | "LGPL-3.0-or-later"
        | "MPL-2.0"
        | "EUPL-1.2"
        | "CDDL-1.0"
        | "CDDL-1.1"
        | "EPL-1.0"
        | "EPL-2.0"
        | "CC-BY-SA-4.0"
        | "OSL-3.0" => LicenseRisk::WeakCopyleft,

        // Strong copyleft
        "GPL"
        | "GPL-2.0"
        | "GPL-2.0-only"
        | "GPL-2.0-or-later"
        | "GPL-3.0"
        | "GPL-3.0-only"
        | "GPL-3.0-or-later"
        | "AGPL"
        | "AGPL-3.0"
        | "AGPL-3.0-only"
        | "AGPL-3.0-or-later"
        | "EUPL-1.1"
        | "SSPL-1.0" => LicenseRisk::StrongCopyleft,

        _ => LicenseRisk::Unknown,
    }
}

/// Classify a canonical license expression into a risk level.
///
/// Handles:
/// - single identifiers (MIT, Apache-2.0, etc.)
/// - OR expressions (MIT OR Apache-2.0)  → most permissive wins
/// - AND expressions (MIT AND GPL-3.0)  → most restrictive wins
/// - proprietary markers (`UNLICENSED`, `LicenseRef-*`, "commercial")
/// - the `UNKNOWN` sentinel
pub fn classify(license: &str) -> LicenseRisk {
    let trimmed = license.trim();

    if trimmed.is_empty() || trimmed == UNKNOWN {
        return LicenseRisk::Unknown;
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("proprietary")
        || lower.contains("commercial")
        || trimmed == "UNLICENSED"
        || trimmed.starts_with("LicenseRef-")
    {
        return LicenseRisk::Proprietary;
    }

    let stripped: String = trimmed.chars().filter(|c| *c != '(' && *c != ')').collect();

    if stripped.contains(" OR ") {
        let risks: Vec<LicenseRisk> = stripped
            .split(" OR ")
            .map(|p| classify(p.trim()))
            .collect();
        return most_permissive(risks);
    }

    if stripped.contains(" AND ") {
        let risks: Vec<LicenseRisk> = stripped
            .split(" AND ")
            .map(|p| classify_single(p.trim()))
            .collect();
        return most_restrictive(risks);
    }

    classify_single(&stripped)
}

fn classify_single(id: &str) -> LicenseRisk {
    // "GPL-2.0 WITH Classpath-exception-2.0" is classified by its base license
    let base = id.split(" WITH ").next().unwrap_or(id).trim();
    classify_id(base)
}

fn most_permissive(risks: Vec<LicenseRisk>) -> LicenseRisk {
    if risks.contains(&LicenseRisk::Permissive) {
        return LicenseRisk::Permissive;
    }
    if risks.contains(&LicenseRisk::WeakCopyleft) {
        return LicenseRisk::WeakCopyleft;
    }
    if risks.contains(&LicenseRisk::StrongCopyleft) {
        return LicenseRisk::StrongCopyleft;
    }
    if risks.contains(&LicenseRisk::Proprietary) {
        return LicenseRisk::Proprietary;
    }
    LicenseRisk::Unknown
}

fn most_restrictive(risks: Vec<LicenseRisk>) -> LicenseRisk {
    if risks.contains(&LicenseRisk::Proprietary) {
        return LicenseRisk::Proprietary;
    }
    if risks.contains(&LicenseRisk::StrongCopyleft) {
        return LicenseRisk::StrongCopyleft;
    }
    if risks.contains(&LicenseRisk::WeakCopyleft) {
        return LicenseRisk::WeakCopyleft;
    }
    if risks.contains(&LicenseRisk::Permissive) {
        return LicenseRisk::Permissive;
    }
    LicenseRisk::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_identifiers() {
        assert_eq!(classify("MIT"), LicenseRisk::Permissive);
        assert_eq!(classify("MPL-2.0"), LicenseRisk::WeakCopyleft);
        assert_eq!(classify("GPL-3.0+"), LicenseRisk::StrongCopyleft);
        assert_eq!(classify("GPL"), LicenseRisk::StrongCopyleft);
    }

    #[test]
    fn test_or_expression() {
        assert_eq!(classify("MIT OR GPL-3.0"), LicenseRisk::Permissive);
        assert_eq!(classify("(GPL-3.0 OR LGPL-3.0)"), LicenseRisk::WeakCopyleft);
    }

    #[test]
    fn test_and_expression() {
        assert_eq!(classify("MIT AND GPL-3.0"), LicenseRisk::StrongCopyleft);
    }

    #[test]
    fn test_proprietary() {
        assert_eq!(classify("UNLICENSED"), LicenseRisk::Proprietary);
        assert_eq!(classify("LicenseRef-Acme"), LicenseRisk::Proprietary);
        assert_eq!(classify("commercial license"), LicenseRisk::Proprietary);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify(""), LicenseRisk::Unknown);
        assert_eq!(classify("UNKNOWN"), LicenseRisk::Unknown);
        assert_eq!(classify("SEE LICENSE IN LICENSE"), LicenseRisk::Unknown);
    }

    #[test]
    fn test_with_exception() {
        assert_eq!(
            classify("GPL-2.0 WITH Classpath-exception-2.0"),
            LicenseRisk::StrongCopyleft
        );
    }
}
