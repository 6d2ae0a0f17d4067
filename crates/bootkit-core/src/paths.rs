use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const KIT_DIR: &str = ".bootkit";
pub const STATE_FILE: &str = ".bootkit/state.yaml";
pub const CONFIG_FILE: &str = ".bootkit/config.yaml";
pub const KIT_MARKER: &str = ".bootkit/.kit-marker";

pub const DEFAULT_DOCS_DIR: &str = "docs/requirements";
pub const DEFAULT_BLUEPRINT_FILE: &str = "docs/blueprint/blueprint.json";
pub const DEFAULT_MANIFEST_FILE: &str = ".skills/manifest.json";
pub const ARCHIVE_DIR: &str = "docs/archive";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn kit_dir(root: &Path) -> PathBuf {
    root.join(KIT_DIR)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn kit_marker_path(root: &Path) -> PathBuf {
    root.join(KIT_MARKER)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

/// True when `rel` is relative and never climbs above its base directory.
pub fn is_contained(rel: &Path) -> bool {
    let mut depth: i32 = 0;
    for component in rel.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            state_path(root),
            PathBuf::from("/tmp/proj/.bootkit/state.yaml")
        );
        assert_eq!(
            kit_marker_path(root),
            PathBuf::from("/tmp/proj/.bootkit/.kit-marker")
        );
    }

    #[test]
    fn containment() {
        assert!(is_contained(Path::new("docs/requirements")));
        assert!(is_contained(Path::new("a/../b")));
        assert!(!is_contained(Path::new("../outside")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }
}
