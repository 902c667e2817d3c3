use std::path::Path;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{ClasspathEntry, ClasspathReport};

/// What a classpath entry points at on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EntryKind {
    Directory,
    Archive,
    Missing,
}

impl EntryKind {
    fn of(entry: &ClasspathEntry) -> Self {
        let path = entry.normalized();
        if path.is_dir() {
            EntryKind::Directory
        } else if path.is_file() {
            EntryKind::Archive
        } else {
            EntryKind::Missing
        }
    }
}

/// Render a colored terminal report.
pub fn render(report: &ClasspathReport, path: &Path, verbose: bool, quiet: bool) -> Result<()> {
    let roots = report.requests.len() + report.skipped.len() + report.failed.len();
    let entries: usize = report.requests.iter().map(|r| r.classpath.len()).sum();
    let missing: usize = report
        .requests
        .iter()
        .flat_map(|r| r.classpath.iter())
        .filter(|e| EntryKind::of(e) == EntryKind::Missing)
        .count();

    if quiet {
        println!(
            "Roots: {}  Classpaths: {}  Skipped: {}  Failed: {}",
            roots,
            report.requests.len().to_string().green(),
            report.skipped.len().to_string().yellow(),
            report.failed.len().to_string().red(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "testability-classpath".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Project: {} ({})\n", report.project, path.display());

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Source roots       : {}", roots));
    println!(
        " │  {:<48} │",
        format!("{}  Classpaths      : {:>4}  ({} entries)", "✓".green(), report.requests.len(), entries)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Skipped         : {:>4}  {}", "⚠".yellow(), report.skipped.len(), missing_note(missing))
    );
    println!(
        " │  {:<48} │",
        format!("{}  Failed          : {:>4}", "✗".red(), report.failed.len())
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if !report.failed.is_empty() {
        println!(" {} Source roots without a classpath:\n", "[ERROR]".red().bold());
        let mut table = new_table(vec!["Source root", "Reason"]);
        for (root, reason) in &report.failed {
            table.add_row(vec![
                Cell::new(root.display().to_string()),
                Cell::new(reason).fg(Color::Red),
            ]);
        }
        println!("{}\n", table);
    }

    if !report.skipped.is_empty() {
        println!(" {} Source roots not found on disk:\n", "[WARN]".yellow().bold());
        for root in &report.skipped {
            println!("   {}", root.display());
        }
        println!();
    }

    for request in &report.requests {
        println!(
            " {} {} ({} entries)\n",
            "[ROOT]".green().bold(),
            request.root.display(),
            request.classpath.len()
        );
        // Without --verbose only entries that do not exist are listed.
        let shown: Vec<(usize, &ClasspathEntry)> = request
            .classpath
            .iter()
            .enumerate()
            .filter(|(_, e)| verbose || EntryKind::of(e) == EntryKind::Missing)
            .collect();
        if !shown.is_empty() {
            render_entries(&shown);
            println!();
        }
    }

    if let Some(coverage) = &report.coverage {
        println!(" {} Coverage classpath:\n", "[COVERAGE]".cyan().bold());
        let shown: Vec<(usize, &ClasspathEntry)> = coverage.iter().enumerate().collect();
        render_entries(&shown);
        println!();
    }

    Ok(())
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn render_entries(entries: &[(usize, &ClasspathEntry)]) {
    let mut table = new_table(vec!["#", "Entry", "Kind"]);
    for &(i, entry) in entries {
        let (kind, color) = match EntryKind::of(entry) {
            EntryKind::Directory => ("dir", Color::Green),
            EntryKind::Archive => ("jar", Color::Green),
            EntryKind::Missing => ("⚠ missing", Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(entry.as_str()),
            Cell::new(kind).fg(color).set_alignment(CellAlignment::Center),
        ]);
    }
    println!("{}", table);
}

fn missing_note(missing: usize) -> String {
    if missing == 0 {
        String::new()
    } else {
        format!("[{} classpath entries missing]", missing)
    }
}
