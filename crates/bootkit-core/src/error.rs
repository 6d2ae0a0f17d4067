use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootkitError {
    #[error("not initialized: run 'bootkit start'")]
    NotInitialized,

    #[error("state file {path} is unreadable ({source}); fix it or delete it and run 'bootkit start'")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file {path} is unreadable ({source}); fix it or delete it to use defaults")]
    CorruptConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("blueprint not found at {0}: write it before running Stage B commands")]
    BlueprintMissing(PathBuf),

    #[error("blueprint at {path} is invalid: {reason}")]
    BlueprintInvalid { path: PathBuf, reason: String },

    #[error("invalid stage '{0}': expected A, B, C or complete")]
    InvalidStage(String),

    #[error("'{command}' requires stage {required}, but the pipeline is at stage {current}")]
    WrongStage {
        command: String,
        current: String,
        required: String,
    },

    #[error("cannot {action}: {missing}")]
    PrerequisiteMissing { action: String, missing: String },

    #[error("stage {stage} failed re-validation: {summary}")]
    ValidationFailed { stage: String, summary: String },

    #[error("stage {stage} is stale: {reason}")]
    StaleStage { stage: String, reason: String },

    #[error("project language is not set: run 'bootkit set-language <language>' first")]
    LanguageUnset,

    #[error("project language is already set to '{current}'; refusing to change it to '{requested}'")]
    LanguageAlreadySet { current: String, requested: String },

    #[error("pipeline is halted ({reason}): run 'bootkit resume' to continue")]
    Halted { reason: String },

    #[error("wrapper-sync program '{0}' not found on PATH")]
    WrapperSyncNotFound(String),

    #[error("wrapper-sync failed: {0}")]
    WrapperSyncFailed(String),

    #[error("cleanup refused: {0}")]
    CleanupRefused(String),

    #[error("refusing to overwrite existing path: {0}")]
    PathExists(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BootkitError>;
