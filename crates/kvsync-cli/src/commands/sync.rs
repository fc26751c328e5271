//! Sync command implementation

use std::io::Write;

use colored::Colorize;

use kvsync_core::{Mapping, SyncOptions, SyncReport, Syncer};

use super::fetch::display_prefix;
use crate::cli::Target;
use crate::config::Settings;
use crate::error::Result;

/// Run the sync command
///
/// Pushes the local directory into the store prefix, removes orphaned keys
/// and prints what changed.
pub fn run_sync(settings: &Settings, target: &Target, dry_run: bool, json: bool) -> Result<()> {
    let mapping = Mapping::new(&target.local_path, &target.store_path);
    let options = SyncOptions {
        cas_try: settings.cas_try,
        dry_run,
    };

    if !json {
        println!(
            "{} Synchronizing {} into '{}'...",
            "=>".blue().bold(),
            mapping.local_root(),
            display_prefix(mapping.store_prefix())
        );
    }

    let report = Syncer::connect(&settings.store, mapping, options)?.sync()?;

    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        print_report(&mut out, &report)?;
    }
    Ok(())
}

/// Human-readable summary of a sync.
pub fn print_report(out: &mut impl Write, report: &SyncReport) -> Result<()> {
    if report.is_noop() {
        writeln!(
            out,
            "{} Already synchronized. {} key(s) unchanged.",
            "OK".green().bold(),
            report.unchanged.len()
        )?;
        return Ok(());
    }

    for key in &report.created {
        writeln!(out, "   {} {} {}", "+".green(), key.cyan(), "created".dimmed())?;
    }
    for key in &report.updated {
        writeln!(out, "   {} {} {}", "~".yellow(), key.cyan(), "updated".dimmed())?;
    }
    for key in &report.deleted {
        writeln!(out, "   {} {} {}", "-".red(), key.cyan(), "deleted".dimmed())?;
    }

    let heading = if report.dry_run {
        "Dry run, no changes made:".yellow().bold()
    } else {
        "Synchronization complete:".green().bold()
    };
    writeln!(
        out,
        "{heading} {} created, {} updated, {} deleted, {} unchanged.",
        report.created.len(),
        report.updated.len(),
        report.deleted.len(),
        report.unchanged.len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &SyncReport) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        print_report(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn noop_sync_is_reported_as_synchronized() {
        let report = SyncReport {
            unchanged: vec!["svc/a.ini".into()],
            retained: vec!["svc/a.ini".into()],
            ..SyncReport::default()
        };

        let output = render(&report);

        assert!(output.contains("Already synchronized"), "got: {output}");
        assert!(output.contains("1 key(s) unchanged"), "got: {output}");
    }

    #[test]
    fn lists_each_change_with_its_outcome() {
        let report = SyncReport {
            created: vec!["svc/new.ini".into()],
            updated: vec!["svc/changed.ini".into()],
            deleted: vec!["svc/old.ini".into()],
            ..SyncReport::default()
        };

        let output = render(&report);

        assert!(output.contains("+ svc/new.ini created"), "got: {output}");
        assert!(output.contains("~ svc/changed.ini updated"), "got: {output}");
        assert!(output.contains("- svc/old.ini deleted"), "got: {output}");
        assert!(
            output.contains("1 created, 1 updated, 1 deleted, 0 unchanged"),
            "got: {output}"
        );
    }

    #[test]
    fn dry_run_is_flagged() {
        let report = SyncReport {
            dry_run: true,
            deleted: vec!["svc/old.ini".into()],
            ..SyncReport::default()
        };

        assert!(render(&report).contains("Dry run, no changes made"));
    }
}
