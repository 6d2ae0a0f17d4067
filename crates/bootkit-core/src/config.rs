use crate::error::{BootkitError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Providers the wrapper-sync tool knows how to materialize.
pub const KNOWN_PROVIDERS: &[&str] = &["claude", "codex", "gemini", "copilot", "cursor"];

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// WrapperSyncConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Remove previously generated wrappers before writing.
    Reset,
    /// Overwrite generated wrappers in place.
    Overwrite,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::Reset => "reset",
            SyncMode::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperSyncConfig {
    #[serde(default = "default_sync_program")]
    pub program: String,
    #[serde(default = "default_sync_args")]
    pub args: Vec<String>,
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    #[serde(default = "default_sync_mode")]
    pub mode: SyncMode,
}

fn default_sync_program() -> String {
    "python3".to_string()
}

fn default_sync_args() -> Vec<String> {
    vec!["scripts/sync_wrappers.py".to_string()]
}

fn default_providers() -> Vec<String> {
    vec![
        "claude".to_string(),
        "codex".to_string(),
        "gemini".to_string(),
    ]
}

fn default_sync_mode() -> SyncMode {
    SyncMode::Reset
}

impl Default for WrapperSyncConfig {
    fn default() -> Self {
        Self {
            program: default_sync_program(),
            args: default_sync_args(),
            providers: default_providers(),
            mode: default_sync_mode(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_blueprint_path")]
    pub blueprint_path: PathBuf,
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Strictness applied by `check-docs` and the Stage A approval when no
    /// flag overrides it.
    #[serde(default)]
    pub strict_docs: bool,
    #[serde(default)]
    pub wrapper_sync: WrapperSyncConfig,
}

fn default_version() -> u32 {
    1
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DOCS_DIR)
}

fn default_blueprint_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_BLUEPRINT_FILE)
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_MANIFEST_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            docs_dir: default_docs_dir(),
            blueprint_path: default_blueprint_path(),
            manifest_path: default_manifest_path(),
            strict_docs: false,
            wrapper_sync: WrapperSyncConfig::default(),
        }
    }
}

impl Config {
    /// Load `.bootkit/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        serde_yaml::from_str(&data).map_err(|source| BootkitError::CorruptConfig { path, source })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (field, path) in [
            ("docs_dir", &self.docs_dir),
            ("blueprint_path", &self.blueprint_path),
            ("manifest_path", &self.manifest_path),
        ] {
            if path.as_os_str().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{field} is empty"),
                });
            } else if !paths::is_contained(path) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "{field} '{}' must stay inside the project root",
                        path.display()
                    ),
                });
            }
        }

        let sync = &self.wrapper_sync;
        if sync.program.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "wrapper_sync.program is empty".to_string(),
            });
        }

        if sync.providers.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "wrapper_sync.providers is empty; nothing would be synced".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for provider in &sync.providers {
            if !seen.insert(provider.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("provider '{provider}' is listed more than once"),
                });
            } else if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "unknown provider '{provider}' (known: {})",
                        KNOWN_PROVIDERS.join(", ")
                    ),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.docs_dir, PathBuf::from("docs/requirements"));
        assert_eq!(cfg.wrapper_sync.mode, SyncMode::Reset);
        assert!(!cfg.strict_docs);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let yaml = "version: 1\nstrict_docs: true\nwrapper_sync:\n  program: ./sync.sh\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.strict_docs);
        assert_eq!(cfg.wrapper_sync.program, "./sync.sh");
        assert_eq!(cfg.wrapper_sync.args, vec!["scripts/sync_wrappers.py"]);
        assert_eq!(cfg.wrapper_sync.providers.len(), 3);
        assert_eq!(
            cfg.manifest_path,
            PathBuf::from(".skills/manifest.json")
        );
    }

    #[test]
    fn config_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.wrapper_sync.mode = SyncMode::Overwrite;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.wrapper_sync.mode, SyncMode::Overwrite);
    }

    #[test]
    fn corrupt_config_is_reported_with_path() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".bootkit")).unwrap();
        std::fs::write(dir.path().join(".bootkit/config.yaml"), "version: [").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, BootkitError::CorruptConfig { .. }));
    }

    #[test]
    fn validate_default_config_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_escaping_paths_and_providers() {
        let mut cfg = Config::default();
        cfg.manifest_path = PathBuf::from("../elsewhere/manifest.json");
        cfg.wrapper_sync.providers = vec![
            "claude".to_string(),
            "claude".to_string(),
            "vim".to_string(),
        ];
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("manifest_path")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("'claude' is listed more than once")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("unknown provider 'vim'")));
    }

    #[test]
    fn validate_empty_program_is_error() {
        let mut cfg = Config::default();
        cfg.wrapper_sync.program = "  ".to_string();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("program is empty")));
    }
}
