pub mod blueprint;
pub mod config;
pub mod docs;
pub mod error;
pub mod fs;
pub mod gate;
pub mod io;
pub mod kit;
pub mod manifest;
pub mod migrations;
pub mod packs;
pub mod paths;
pub mod placeholder;
pub mod report;
pub mod scaffold;
pub mod state;
pub mod types;
pub mod wrapper_sync;

pub use error::{BootkitError, Result};
