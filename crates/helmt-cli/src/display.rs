//! Console output for helmt runs

use console::style;
use helmt_core::Report;
use std::path::Path;

/// Announce the descriptor being processed
pub fn templating(descriptor: &Path) {
    println!("templating '{}'", descriptor.display());
}

/// Note which settings file was read
pub fn config_used(path: &Path) {
    println!("Using config file: {}", path.display());
}

/// Print a warning to stderr
pub fn warning(message: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), message);
}

/// Summarise a finished run
pub fn report(report: &Report) {
    let mut line = format!(
        "{} {} {} -> {}",
        style("✓").green().bold(),
        report.descriptor.chart,
        report.descriptor.version,
        report.target.display()
    );
    if report.kustomization {
        line.push_str(&format!(" {}", style("(kustomization.yaml)").dim()));
    }
    println!("{}", line);

    if report.metadata_warning.is_some() {
        println!(
            "  {} rendered without Chart.yaml",
            style("note:").blue()
        );
    }
}
