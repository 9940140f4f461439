use std::path::Path;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::license::classifier::classify;
use crate::models::{LicenseRisk, PackageRecord, PolicyVerdict, ScanResult};
use crate::scanner::aggregator::ConfiguredPolicy;

/// Render a colored terminal report.
///
/// `policy` adds a verdict column when a policy table is active.
pub fn render(
    result: &ScanResult,
    path: &Path,
    policy: Option<&ConfiguredPolicy>,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    if quiet {
        println!("{}", quiet_line(result));
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "license-audit".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Scanning: {}\n", path.display());

    let problematic = result.problematic.len();
    let mark = if problematic == 0 {
        "✓".green()
    } else {
        "✗".red()
    };

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Packages found     : {}", result.total_packages)
    );
    println!(
        " │  {:<48} │",
        format!("Counted (no @types): {}", result.total_filtered)
    );
    println!(
        " │  {:<48} │",
        format!("Distinct licenses  : {}", result.license_counts.len())
    );
    println!(
        " │  {:<48} │",
        format!("{}  Problematic     : {:>4}", mark, problematic)
    );
    println!(" │  {:<48} │", top_licenses_line(result));
    println!(" └────────────────────────────────────────────────────┘\n");

    if !result.license_counts.is_empty() {
        println!(" {} Licenses:\n", "[LICENSES]".cyan().bold());
        println!("{}", license_table(result));
        println!();
    }

    if problematic > 0 {
        println!(
            " {} Packages requiring attention:\n",
            "[ERROR]".red().bold()
        );
        println!("{}", package_table(&result.problematic, policy));
        println!();
    }

    if verbose && !result.packages.is_empty() {
        println!(" {} All packages:\n", "[ALL]".green().bold());
        println!("{}", package_table(&result.packages, policy));
        println!();
    }

    Ok(())
}

fn quiet_line(result: &ScanResult) -> String {
    format!(
        "Total: {}  Counted: {}  Licenses: {}  Problematic: {}",
        result.total_packages,
        result.total_filtered,
        result.license_counts.len(),
        if result.has_problems() {
            result.problematic.len().to_string().red()
        } else {
            "0".green()
        },
    )
}

fn top_licenses_line(result: &ScanResult) -> String {
    let top: Vec<String> = result
        .top_licenses()
        .into_iter()
        .take(3)
        .map(|(license, count)| format!("{} ({})", license, count))
        .collect();
    if top.is_empty() {
        "Top: -".to_string()
    } else {
        format!("Top: {}", top.join(", "))
    }
}

fn risk_color(risk: &LicenseRisk) -> Color {
    match risk {
        LicenseRisk::Permissive => Color::Green,
        LicenseRisk::WeakCopyleft => Color::Yellow,
        LicenseRisk::StrongCopyleft => Color::Red,
        LicenseRisk::Proprietary => Color::Magenta,
        LicenseRisk::Unknown => Color::DarkGrey,
    }
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

fn license_table(result: &ScanResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["License", "Packages", "Risk"]));

    for (license, count) in result.top_licenses() {
        let risk = classify(license);
        table.add_row(vec![
            Cell::new(license),
            Cell::new(count).set_alignment(CellAlignment::Right),
            Cell::new(risk.to_string()).fg(risk_color(&risk)),
        ]);
    }
    table
}

fn package_table(records: &[PackageRecord], policy: Option<&ConfiguredPolicy>) -> Table {
    let mut labels = vec!["Name", "Version", "License", "Risk"];
    if policy.is_some() {
        labels.push("Verdict");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&labels));

    for record in records {
        let risk = classify(&record.license);
        let mut row = vec![
            Cell::new(&record.name),
            Cell::new(&record.version),
            Cell::new(&record.license),
            Cell::new(risk.to_string()).fg(risk_color(&risk)),
        ];

        if let Some(policy) = policy {
            let (verdict_str, verdict_color) = match policy.verdict(record) {
                PolicyVerdict::Pass => ("✓ pass", Color::Green),
                PolicyVerdict::Warn => ("⚠ warn", Color::Yellow),
                PolicyVerdict::Error => ("✗ error", Color::Red),
            };
            row.push(
                Cell::new(verdict_str)
                    .fg(verdict_color)
                    .set_alignment(CellAlignment::Center),
            );
        }
        table.add_row(row);
    }
    table
}
