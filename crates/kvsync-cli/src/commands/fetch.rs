//! Fetch command implementation

use std::io::Write;

use colored::Colorize;

use kvsync_core::{FetchReport, Fetcher, Mapping};

use crate::cli::Target;
use crate::config::Settings;
use crate::error::Result;

/// Run the fetch command
///
/// Mirrors the store prefix into the local directory and prints a summary,
/// or the report itself when `json` is set.
pub fn run_fetch(settings: &Settings, target: &Target, dry_run: bool, json: bool) -> Result<()> {
    let mapping = Mapping::new(&target.local_path, &target.store_path);

    if !json {
        println!(
            "{} Fetching '{}' into {}...",
            "=>".blue().bold(),
            display_prefix(mapping.store_prefix()),
            mapping.local_root()
        );
    }

    let report = Fetcher::connect(&settings.store, mapping)?
        .dry_run(dry_run)
        .fetch()?;

    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        print_report(&mut out, &report)?;
    }
    Ok(())
}

/// Human-readable summary of a fetch.
pub fn print_report(out: &mut impl Write, report: &FetchReport) -> Result<()> {
    if report.fetched.is_empty() {
        writeln!(out, "{} No keys under prefix. Nothing fetched.", "OK".green().bold())?;
        return Ok(());
    }

    let verb = if report.dry_run { "Would write" } else { "Wrote" };
    for file in &report.fetched {
        writeln!(out, "   {} {} {} {}", "+".green(), file.key.cyan(), "->".dimmed(), file.path)?;
    }
    writeln!(
        out,
        "{} {verb} {} file(s).",
        "OK".green().bold(),
        report.fetched.len()
    )?;
    Ok(())
}

pub(crate) fn display_prefix(prefix: &str) -> &str {
    if prefix.is_empty() { "/" } else { prefix }
}
