//! The `.bootkit/` directory: creation on `start`, removal on `cleanup`.

use crate::config::Config;
use crate::error::{BootkitError, Result};
use crate::io;
use crate::paths;
use crate::state::{events, State};
use crate::types::Stage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

const MARKER_CONTENTS: &str =
    "This directory is managed by bootkit. 'bootkit cleanup --i-understand' removes it.\n";

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StartOutcome {
    /// False when the pipeline already existed and nothing was touched.
    pub created: bool,
    pub state: State,
}

/// Create state, default config and the kit marker. Re-running is a no-op.
pub fn start(root: &Path, language: Option<&str>) -> Result<StartOutcome> {
    if let Some(state) = State::load(root)? {
        tracing::debug!("state already present, start is a no-op");
        return Ok(StartOutcome {
            created: false,
            state,
        });
    }

    let mut state = State::new();
    if let Some(lang) = language.map(str::trim).filter(|l| !l.is_empty()) {
        state.language = Some(lang.to_string());
        state.record(events::LANGUAGE_SET, lang);
    }
    state.save(root)?;

    let config = serde_yaml::to_string(&Config::default())?;
    io::write_if_missing(&paths::config_path(root), config.as_bytes())?;
    io::write_if_missing(&paths::kit_marker_path(root), MARKER_CONTENTS.as_bytes())?;
    io::ensure_gitignore_entry(root, paths::STATE_FILE)?;

    tracing::info!("initialized {}", paths::kit_dir(root).display());
    Ok(StartOutcome {
        created: true,
        state,
    })
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    pub archive: bool,
    pub acknowledged: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    Remove,
    Archive,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub action: CleanupAction,
    pub kit_dir: PathBuf,
    /// Archive destination, when archiving.
    pub destination: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn archive_destination(root: &Path, now: DateTime<Utc>) -> PathBuf {
    paths::archive_dir(root).join(format!("bootkit-{}", now.format("%Y%m%dT%H%M%SZ")))
}

/// Remove or archive the kit directory.
///
/// Refused unless the kit marker exists, the caller acknowledged the action
/// and the pipeline is complete and not halted. Refusals touch nothing, dry run or not.
pub fn cleanup(root: &Path, options: CleanupOptions, now: DateTime<Utc>) -> Result<CleanupReport> {
    if !paths::kit_marker_path(root).is_file() {
        return Err(BootkitError::CleanupRefused(format!(
            "kit marker {} not found; this does not look like a bootkit directory",
            paths::KIT_MARKER
        )));
    }
    if !options.acknowledged {
        return Err(BootkitError::CleanupRefused(
            "pass --i-understand to confirm removal of the kit directory".to_string(),
        ));
    }
    let state = State::require(root)?;
    state.ensure_running()?;
    if state.stage != Stage::Complete {
        return Err(BootkitError::CleanupRefused(format!(
            "pipeline is at stage {}; approve stage C first",
            state.stage
        )));
    }

    let kit_dir = paths::kit_dir(root);
    let (action, destination) = if options.archive {
        let dest = archive_destination(root, now);
        if dest.exists() {
            return Err(BootkitError::PathExists(dest));
        }
        (CleanupAction::Archive, Some(dest))
    } else {
        (CleanupAction::Remove, None)
    };

    if !options.dry_run {
        match &destination {
            Some(dest) => {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::rename(&kit_dir, dest)?;
                tracing::info!("archived {} to {}", kit_dir.display(), dest.display());
            }
            None => {
                std::fs::remove_dir_all(&kit_dir)?;
                tracing::info!("removed {}", kit_dir.display());
            }
        }
    }

    Ok(CleanupReport {
        action,
        kit_dir,
        destination,
        dry_run: options.dry_run,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
