use crate::output::print_json;
use anyhow::Context;
use bootkit_core::kit::{self, CleanupAction, CleanupOptions};
use chrono::Utc;
use std::path::Path;

pub fn run(
    root: &Path,
    archive: bool,
    i_understand: bool,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let options = CleanupOptions {
        archive,
        acknowledged: i_understand,
        dry_run,
    };
    let report = kit::cleanup(root, options, Utc::now()).context("cleanup failed")?;

    if json {
        return print_json(&report);
    }

    let verb = match (report.action, report.dry_run) {
        (CleanupAction::Archive, true) => "Would archive",
        (CleanupAction::Archive, false) => "Archived",
        (CleanupAction::Remove, true) => "Would remove",
        (CleanupAction::Remove, false) => "Removed",
    };
    match &report.destination {
        Some(dest) => println!("{verb} {} to {}", report.kit_dir.display(), dest.display()),
        None => println!("{verb} {}", report.kit_dir.display()),
    }
    Ok(())
}
