//! Invocation of the external wrapper-sync tool.

use crate::config::{SyncMode, WrapperSyncConfig};
use crate::error::{BootkitError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct SyncRequest<'a> {
    pub root: &'a Path,
    pub providers: &'a [String],
    pub mode: SyncMode,
}

/// Materializes provider wrappers from the reconciled manifest.
pub trait WrapperSync {
    fn sync(&self, request: &SyncRequest<'_>) -> Result<()>;
}

/// Runs the configured program as a child process with inherited stdio.
#[derive(Debug, Clone)]
pub struct ProcessWrapperSync {
    program: String,
    args: Vec<String>,
}

impl ProcessWrapperSync {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(cfg: &WrapperSyncConfig) -> Self {
        Self::new(cfg.program.clone(), cfg.args.clone())
    }

    /// Arguments passed after the program name.
    pub fn arguments(&self, request: &SyncRequest<'_>) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--providers".to_string());
        args.push(request.providers.join(","));
        args.push("--mode".to_string());
        args.push(request.mode.as_str().to_string());
        args
    }

    /// Paths with a separator resolve against the project root, bare names
    /// against `PATH`.
    fn resolve(&self, root: &Path) -> Result<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            let path = if program.is_absolute() {
                program.to_path_buf()
            } else {
                root.join(program)
            };
            return if path.is_file() {
                Ok(path)
            } else {
                Err(BootkitError::WrapperSyncNotFound(self.program.clone()))
            };
        }
        which::which(&self.program).map_err(|_| BootkitError::WrapperSyncNotFound(self.program.clone()))
    }
}

impl WrapperSync for ProcessWrapperSync {
    fn sync(&self, request: &SyncRequest<'_>) -> Result<()> {
        let bin = self.resolve(request.root)?;
        let args = self.arguments(request);
        tracing::info!("running wrapper sync: {} {}", bin.display(), args.join(" "));

        let status = Command::new(&bin)
            .args(&args)
            .current_dir(request.root)
            .status()
            .map_err(|e| BootkitError::WrapperSyncFailed(format!("failed to spawn: {e}")))?;

        if !status.success() {
            let code = status
                .code()
                .map(|c| format!("exit code {c}"))
                .unwrap_or_else(|| "terminated by signal".to_string());
            return Err(BootkitError::WrapperSyncFailed(format!(
                "{} {code}",
                self.program
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn providers() -> Vec<String> {
        vec!["claude".to_string(), "codex".to_string()]
    }

    #[test]
    fn arguments_append_providers_and_mode() {
        let sync = ProcessWrapperSync::from_config(&WrapperSyncConfig::default());
        let providers = providers();
        let req = SyncRequest {
            root: Path::new("."),
            providers: &providers,
            mode: SyncMode::Overwrite,
        };
        assert_eq!(
            sync.arguments(&req),
            vec![
                "scripts/sync_wrappers.py",
                "--providers",
                "claude,codex",
                "--mode",
                "overwrite"
            ]
        );
    }

    #[test]
    fn missing_program_is_not_found() {
        let dir = TempDir::new().unwrap();
        let sync = ProcessWrapperSync::new("bootkit-no-such-sync-tool", Vec::new());
        let providers = providers();
        let req = SyncRequest {
            root: dir.path(),
            providers: &providers,
            mode: SyncMode::Reset,
        };
        let err = sync.sync(&req).unwrap_err();
        assert!(matches!(err, BootkitError::WrapperSyncNotFound(_)));
    }

    #[test]
    fn relative_program_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        let sync = ProcessWrapperSync::new("./tools/sync.sh", Vec::new());
        let providers = providers();
        let req = SyncRequest {
            root: dir.path(),
            providers: &providers,
            mode: SyncMode::Reset,
        };
        assert!(matches!(
            sync.sync(&req),
            Err(BootkitError::WrapperSyncNotFound(p)) if p == "./tools/sync.sh"
        ));
    }
}
