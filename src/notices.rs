//! Plain-text third-party attribution notices built from a [`ScanResult`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::AuditError;
use crate::license::{Normalizer, RawLicense};
use crate::models::{PackageRecord, ScanResult};
use crate::scanner::resolver::{ManifestReader, PackageJsonReader};

/// Probed in each package directory; the first regular file is included.
pub const NOTICE_FILE_NAMES: &[&str] = &[
    "NOTICE",
    "NOTICE.txt",
    "NOTICE.md",
    "Notice",
    "notice",
    "notice.txt",
];

const SEPARATOR: &str = "----------------------------------------------------------------";
const UNSPECIFIED: &str = "UNSPECIFIED";

#[derive(Debug, Clone, Default)]
pub struct NoticeOptions {
    /// Brazilian Portuguese labels and default file name.
    pub pt_br: bool,
    /// Output file, relative to the project root.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoticeSummary {
    pub output: PathBuf,
    pub packages: usize,
}

/// The project the notices are written for.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    pub license: String,
}

impl ProjectInfo {
    pub fn load(root: &Path, normalizer: &Normalizer) -> Result<Self, AuditError> {
        let manifest = PackageJsonReader
            .read_manifest(root)
            .ok_or_else(|| AuditError::ProjectManifestMissing {
                path: root.join("package.json"),
            })?;

        let license = match &manifest.license {
            RawLicense::Absent => UNSPECIFIED.to_string(),
            raw => normalizer.normalize(raw),
        };
        let name = manifest.name.unwrap_or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(Self {
            name,
            version: manifest.version.unwrap_or_else(|| "0.0.0".to_string()),
            license,
        })
    }
}

struct Labels {
    title: &'static str,
    project_license: &'static str,
    intro: &'static str,
    generated_at: &'static str,
    notes: &'static [&'static str],
    package: &'static str,
    license: &'static str,
    repository: &'static str,
    text_begin: &'static str,
    text_end: &'static str,
    notice_begin: &'static str,
    notice_end: &'static str,
    unreadable: &'static str,
}

const EN: Labels = Labels {
    title: "THIRD-PARTY NOTICES",
    project_license: "Project license",
    intro: "This file lists third-party components included and their notices/licenses.",
    generated_at: "Generated at",
    notes: &[
        "Notes:",
        "- This file is generated automatically; do not edit manually.",
        "- To update, run: license-audit notices",
        "- Third-party license texts are reproduced in their original language to preserve legal validity.",
    ],
    package: "Package",
    license: "License",
    repository: "Repository",
    text_begin: "--- License text begin ---",
    text_end: "--- License text end ---",
    notice_begin: "--- NOTICE begin ---",
    notice_end: "--- NOTICE end ---",
    unreadable: "(Warning) Could not read license file",
};

const PT_BR: Labels = Labels {
    title: "AVISOS DE TERCEIROS",
    project_license: "Licença do projeto",
    intro: "Este arquivo lista componentes de terceiros incluídos e seus respectivos avisos/licenças.",
    generated_at: "Gerado em",
    notes: &[
        "Observações:",
        "- Este arquivo é gerado automaticamente; não edite manualmente.",
        "- Para atualizar, execute: license-audit notices --pt-br",
        "- Os textos de licença de terceiros são reproduzidos no idioma original para preservar validade jurídica.",
    ],
    package: "Pacote",
    license: "Licença",
    repository: "Repositório",
    text_begin: "--- Início do texto de licença ---",
    text_end: "--- Fim do texto de licença ---",
    notice_begin: "--- Início do NOTICE ---",
    notice_end: "--- Fim do NOTICE ---",
    unreadable: "(Aviso) Não foi possível ler o arquivo de licença",
};

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn read_notice_file(dir: &Path) -> Option<String> {
    NOTICE_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .and_then(|path| match std::fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                debug!(path = %path.display(), %err, "cannot read NOTICE file");
                None
            }
        })
}

fn render_header(labels: &Labels, project: &ProjectInfo, generated_at: DateTime<Utc>) -> String {
    let title = labels.title;
    let mut lines = vec![
        title.to_string(),
        "=".repeat(20),
        String::new(),
        format!(
            "{}@{} - {}: {}",
            project.name, project.version, labels.project_license, project.license
        ),
        labels.intro.to_string(),
        format!(
            "{}: {}",
            labels.generated_at,
            generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        String::new(),
    ];
    lines.extend(labels.notes.iter().map(|s| s.to_string()));
    lines.push(String::new());
    lines.join("\n")
}

fn render_package(labels: &Labels, record: &PackageRecord) -> String {
    let mut lines = vec![
        SEPARATOR.to_string(),
        format!("{}: {}", labels.package, record.id()),
        format!("{}: {}", labels.license, record.license),
    ];
    if let Some(repo) = &record.repository_url {
        lines.push(format!("{}: {}", labels.repository, repo));
    }

    match (&record.license_file_path, &record.license_file_text) {
        (Some(_), Some(text)) => {
            let trimmed = normalize_newlines(text).trim().to_string();
            if !trimmed.is_empty() {
                lines.push(String::new());
                lines.push(labels.text_begin.to_string());
                lines.push(trimmed);
                lines.push(labels.text_end.to_string());
            }
        }
        (Some(path), None) => {
            lines.push(String::new());
            match &record.license_file_error {
                Some(err) => lines.push(format!("{}: {}: {}", labels.unreadable, path.display(), err)),
                None => lines.push(format!("{}: {}", labels.unreadable, path.display())),
            }
        }
        _ => {}
    }

    if let Some(notice) = read_notice_file(&record.directory_path) {
        let trimmed = normalize_newlines(&notice).trim().to_string();
        if !trimmed.is_empty() {
            lines.push(String::new());
            lines.push(labels.notice_begin.to_string());
            lines.push(trimmed);
            lines.push(labels.notice_end.to_string());
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Packages that get a notice block, sorted by `name@version`.
pub fn noticed_packages<'a>(project: &ProjectInfo, result: &'a ScanResult) -> Vec<&'a PackageRecord> {
    let mut packages: Vec<&PackageRecord> = result
        .packages
        .iter()
        .filter(|p| p.name != project.name && !p.is_type_declaration())
        .collect();
    packages.sort_by_key(|p| p.id());
    packages
}

/// Render the full notices document.
pub fn render(
    project: &ProjectInfo,
    result: &ScanResult,
    pt_br: bool,
    generated_at: DateTime<Utc>,
) -> String {
    let labels = if pt_br { &PT_BR } else { &EN };
    let mut parts = vec![render_header(labels, project, generated_at)];
    parts.extend(
        noticed_packages(project, result)
            .into_iter()
            .map(|record| render_package(labels, record)),
    );
    parts.join("\n")
}

pub fn default_output(pt_br: bool) -> &'static str {
    if pt_br {
        "AVISOS-DE-TERCEIROS.pt-BR.txt"
    } else {
        "THIRD-PARTY-NOTICES.txt"
    }
}

/// Write the notices file for the project at `root`.
pub fn generate(
    root: &Path,
    project: &ProjectInfo,
    result: &ScanResult,
    options: &NoticeOptions,
) -> Result<NoticeSummary> {
    let output = match &options.output {
        Some(path) => root.join(path),
        None => root.join(default_output(options.pt_br)),
    };

    let document = render(project, result, options.pt_br, Utc::now());
    std::fs::write(&output, document)
        .with_context(|| format!("Failed to write notices to {}", output.display()))?;

    Ok(NoticeSummary {
        output,
        packages: noticed_packages(project, result).len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::grammar::SpdxGrammar;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(dir: &Path, name: &str, license: &str) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            license: license.to_string(),
            repository_url: None,
            is_private: false,
            license_file_path: None,
            license_file_text: None,
            license_file_error: None,
            directory_path: dir.join(name),
        }
    }

    fn project() -> ProjectInfo {
        ProjectInfo {
            name: "my-app".to_string(),
            version: "2.0.0".to_string(),
            license: "MIT".to_string(),
        }
    }

    #[test]
    fn test_render_blocks() {
        let tmp = TempDir::new().unwrap();
        let zlib_dir = tmp.path().join("zlib-pkg");
        std::fs::create_dir_all(&zlib_dir).unwrap();
        std::fs::write(zlib_dir.join("NOTICE"), "Copyright Acme\r\n").unwrap();

        let mut zlib = record(tmp.path(), "zlib-pkg", "Zlib");
        zlib.repository_url = Some("https://example.com/zlib-pkg".to_string());
        zlib.license_file_path = Some(zlib_dir.join("LICENSE"));
        zlib.license_file_text = Some("\r\nzlib license text\r\n\r\n".to_string());

        let mut alpha = record(tmp.path(), "alpha", "MIT");
        alpha.license_file_path = Some(tmp.path().join("alpha").join("LICENSE"));
        alpha.license_file_error = Some("Permission denied (os error 13)".to_string());

        let mut result = ScanResult::empty();
        result.packages = vec![
            zlib,
            alpha,
            record(tmp.path(), "@types/node", "MIT"),
            record(tmp.path(), "my-app", "MIT"),
        ];

        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let text = render(&project(), &result, false, at);

        assert!(text.starts_with("THIRD-PARTY NOTICES\n"));
        assert!(text.contains("my-app@2.0.0 - Project license: MIT"));
        assert!(text.contains("Generated at: 2024-01-02T03:04:05.000Z"));
        assert!(text.contains("--- License text begin ---\nzlib license text\n--- License text end ---"));
        assert!(text.contains("--- NOTICE begin ---\nCopyright Acme\n--- NOTICE end ---"));
        assert!(text.contains("Repository: https://example.com/zlib-pkg"));
        assert!(text.contains(&format!(
            "(Warning) Could not read license file: {}: Permission denied (os error 13)",
            tmp.path().join("alpha").join("LICENSE").display()
        )));
        assert!(!text.contains("@types/node"));
        assert!(!text.contains("Package: my-app@"));

        let alpha_at = text.find("Package: alpha@1.0.0").unwrap();
        let zlib_at = text.find("Package: zlib-pkg@1.0.0").unwrap();
        assert!(alpha_at < zlib_at);
    }

    #[test]
    fn test_render_pt_br_labels() {
        let result = ScanResult::empty();
        let text = render(&project(), &result, true, Utc::now());
        assert!(text.starts_with("AVISOS DE TERCEIROS\n"));
        assert!(text.contains("Licença do projeto: MIT"));
    }

    #[test]
    fn test_generate_writes_default_file() {
        let tmp = TempDir::new().unwrap();
        let mut result = ScanResult::empty();
        result.packages = vec![record(tmp.path(), "ms", "MIT")];

        let summary = generate(tmp.path(), &project(), &result, &NoticeOptions::default()).unwrap();
        assert_eq!(summary.output, tmp.path().join("THIRD-PARTY-NOTICES.txt"));
        assert_eq!(summary.packages, 1);
        let written = std::fs::read_to_string(&summary.output).unwrap();
        assert!(written.contains("Package: ms@1.0.0"));
    }

    #[test]
    fn test_project_info_from_manifest() {
        let tmp = TempDir::new().unwrap();
        let normalizer = Normalizer::new(Arc::new(SpdxGrammar::builtin()));
        assert!(matches!(
            ProjectInfo::load(tmp.path(), &normalizer),
            Err(AuditError::ProjectManifestMissing { .. })
        ));

        std::fs::write(tmp.path().join("package.json"), r#"{"name":"app","version":"1.2.3"}"#).unwrap();
        let info = ProjectInfo::load(tmp.path(), &normalizer).unwrap();
        assert_eq!(info.license, "UNSPECIFIED");

        std::fs::write(
            tmp.path().join("package.json"),
            r#"{"name":"app","version":"1.2.3","license":"apache"}"#,
        )
        .unwrap();
        let info = ProjectInfo::load(tmp.path(), &normalizer).unwrap();
        assert_eq!(info.license, "Apache-2.0");
    }
}
