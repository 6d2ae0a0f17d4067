//! Skill manifest reconciliation.
//!
//! `includePrefixes` is derived from the blueprint's packs; every other
//! field belongs to the user and is carried through untouched.

use crate::blueprint::Blueprint;
use crate::error::Result;
use crate::fs::ProjectFs;
use crate::migrations;
use crate::packs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub include_prefixes: Vec<String>,
    #[serde(default)]
    pub include_skills: Vec<String>,
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
    #[serde(default)]
    pub exclude_skills: Vec<String>,
}

impl Manifest {
    /// Parse manifest JSON in either the flat or the legacy nested shape.
    /// The flag is true when the legacy shape was found.
    pub fn parse(text: &str) -> Result<(Self, bool)> {
        let raw: serde_json::Value = serde_json::from_str(text)?;
        let (flat, legacy) = migrations::normalize_manifest(raw);
        Ok((serde_json::from_value(flat)?, legacy))
    }

    /// Pretty JSON, fixed field order, trailing newline.
    pub fn to_canonical(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestStatus {
    Written,
    Unchanged,
    DryRun,
}

impl fmt::Display for ManifestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManifestStatus::Written => "written",
            ManifestStatus::Unchanged => "unchanged",
            ManifestStatus::DryRun => "dry-run",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestUpdate {
    pub status: ManifestStatus,
    pub path: PathBuf,
    pub include_prefixes: Vec<String>,
    /// The file on disk used the legacy nested shape.
    pub migrated_legacy: bool,
    pub warnings: Vec<String>,
}

/// Bring the manifest at `path` in line with the blueprint's packs.
///
/// Without `apply` nothing is written and a pending change reports
/// [`ManifestStatus::DryRun`]. The file is only rewritten when its canonical
/// bytes would differ.
pub fn reconcile(
    fs: &dyn ProjectFs,
    path: &Path,
    blueprint: &Blueprint,
    apply: bool,
) -> Result<ManifestUpdate> {
    let (prefixes, unknown) = packs::prefixes_for(&blueprint.skills.packs);
    let warnings: Vec<String> = unknown
        .iter()
        .map(|p| format!("pack '{p}' is not in the catalog; no prefixes added"))
        .collect();

    let existing = fs.read(path)?;
    let (mut manifest, migrated_legacy) = match existing.as_deref() {
        Some(text) => Manifest::parse(text)?,
        None => (Manifest::default(), false),
    };
    manifest.include_prefixes = prefixes;

    let canonical = manifest.to_canonical()?;
    let status = if existing.as_deref() == Some(canonical.as_str()) {
        ManifestStatus::Unchanged
    } else if apply {
        fs.write(path, &canonical)?;
        tracing::info!("wrote manifest {}", path.display());
        ManifestStatus::Written
    } else {
        ManifestStatus::DryRun
    };

    Ok(ManifestUpdate {
        status,
        path: path.to_path_buf(),
        include_prefixes: manifest.include_prefixes,
        migrated_legacy,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
