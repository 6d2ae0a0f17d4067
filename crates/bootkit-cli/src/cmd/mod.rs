pub mod apply;
pub mod approve;
pub mod blueprint;
pub mod cleanup;
pub mod config;
pub mod docs;
pub mod halt;
pub mod manifest;
pub mod scaffold;
pub mod start;
pub mod status;

use anyhow::Context;
use bootkit_core::config::Config;
use bootkit_core::fs::DiskFs;
use bootkit_core::gate::{Gate, Step};
use bootkit_core::state::State;
use std::path::{Path, PathBuf};

/// Loaded state and config for one command invocation.
pub struct Session {
    pub root: PathBuf,
    pub config: Config,
    pub fs: DiskFs,
    pub state: State,
}

impl Session {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let state = State::require(root)?;
        let config = Config::load(root).context("failed to load config")?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            fs: DiskFs::new(root),
            state,
        })
    }

    /// Run one gate transition, save the state if it changed, then return
    /// the outcome. State changes made on a failed outcome are saved too.
    pub fn step<T>(&mut self, op: impl FnOnce(&Gate<'_>, State) -> Step<T>) -> anyhow::Result<T> {
        let before = self.state.clone();
        let (next, result) = {
            let gate = Gate::new(&self.root, &self.fs, &self.config);
            op(&gate, before.clone()).into_parts()
        };
        self.state = next;
        self.state
            .save_if_changed(&self.root, &before)
            .context("failed to save state")?;
        Ok(result?)
    }
}
