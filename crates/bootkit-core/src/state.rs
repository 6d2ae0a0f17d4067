use crate::error::{BootkitError, Result};
use crate::paths;
use crate::types::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Event names written to `history`.
pub mod events {
    pub const START: &str = "start";
    pub const LANGUAGE_SET: &str = "language_set";
    pub const STAGE_A_VALIDATED: &str = "stage_a_validated";
    pub const STAGE_A_INVALIDATED: &str = "stage_a_invalidated";
    pub const STAGE_B_VALIDATED: &str = "stage_b_validated";
    pub const STAGE_B_INVALIDATED: &str = "stage_b_invalidated";
    pub const PACKS_REVIEWED: &str = "packs_reviewed";
    pub const PACKS_ADDED: &str = "packs_added";
    pub const SCAFFOLD_APPLIED: &str = "scaffold_applied";
    pub const MANIFEST_UPDATED: &str = "manifest_updated";
    pub const WRAPPERS_SYNCED: &str = "wrappers_synced";
    pub const WRAPPER_SYNC_FAILED: &str = "wrapper_sync_failed";
    pub const STAGE_C_STALE: &str = "stage_c_stale";
    pub const SKILL_RETENTION_REVIEWED: &str = "skill_retention_reviewed";
    pub const STAGE_APPROVED: &str = "stage_approved";
    pub const EMERGENCY_STOP: &str = "emergency_stop";
    pub const RESUMED: &str = "resumed";
}

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub details: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementTracking {
    pub asked: bool,
    pub answered: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageAProgress {
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub user_approved: bool,
    /// Keyed by requirement id (`FR-1`, `NFR-3`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requirements: BTreeMap<String, RequirementTracking>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageBProgress {
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub packs_reviewed: bool,
    #[serde(default)]
    pub user_approved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageCProgress {
    #[serde(default)]
    pub scaffolded: bool,
    #[serde(default)]
    pub manifest_updated: bool,
    #[serde(default)]
    pub wrappers_synced: bool,
    #[serde(default)]
    pub skill_retention_reviewed: bool,
    #[serde(default)]
    pub user_approved: bool,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default = "default_version")]
    pub version: u32,
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub stage_a: StageAProgress,
    #[serde(default)]
    pub stage_b: StageBProgress,
    #[serde(default)]
    pub stage_c: StageCProgress,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl State {
    pub fn new() -> Self {
        let now = Utc::now();
        let state = Self {
            version: 1,
            stage: Stage::A,
            language: None,
            stage_a: StageAProgress::default(),
            stage_b: StageBProgress::default(),
            stage_c: StageCProgress::default(),
            history: Vec::new(),
            created_at: now,
            last_updated: now,
        };
        state.add_event(events::START, "")
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    /// `Ok(None)` when the pipeline was never started.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = paths::state_path(root);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        let state = serde_yaml::from_str(&data)
            .map_err(|source| BootkitError::CorruptState { path, source })?;
        Ok(Some(state))
    }

    pub fn require(root: &Path) -> Result<Self> {
        Self::load(root)?.ok_or(BootkitError::NotInitialized)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::state_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Save only when the state differs from `before`. Returns true if written.
    pub fn save_if_changed(&mut self, root: &Path, before: &State) -> Result<bool> {
        if self == before {
            return Ok(false);
        }
        self.last_updated = Utc::now();
        self.save(root)?;
        Ok(true)
    }

    // ---------------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------------

    /// Append an event and hand the state back.
    pub fn add_event(mut self, event: &str, details: impl Into<String>) -> Self {
        self.record(event, details);
        self
    }

    pub fn record(&mut self, event: &str, details: impl Into<String>) {
        let now = Utc::now();
        self.history.push(HistoryEntry {
            timestamp: now,
            event: event.to_string(),
            details: details.into(),
        });
        self.last_updated = now;
    }

    pub fn last_event(&self, event: &str) -> Option<&HistoryEntry> {
        self.history.iter().rev().find(|e| e.event == event)
    }

    /// The stop entry when an emergency stop has not been followed by a resume.
    pub fn halted(&self) -> Option<&HistoryEntry> {
        self.history
            .iter()
            .rev()
            .find(|e| e.event == events::EMERGENCY_STOP || e.event == events::RESUMED)
            .filter(|e| e.event == events::EMERGENCY_STOP)
    }

    /// `Halted` while an emergency stop is in effect.
    pub fn ensure_running(&self) -> Result<()> {
        match self.halted() {
            Some(stop) => Err(BootkitError::Halted {
                reason: if stop.details.is_empty() {
                    "emergency stop".to_string()
                } else {
                    stop.details.clone()
                },
            }),
            None => Ok(()),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
