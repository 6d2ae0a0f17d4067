//! Stage C: additive, idempotent project skeleton.
//!
//! The planned tree is a pure function of the blueprint. Paths that already
//! exist are reported as skipped and never touched.

use crate::blueprint::Blueprint;
use crate::error::Result;
use crate::fs::ProjectFs;
use crate::types::{Capability, Layout};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpKind {
    #[serde(rename = "mkdir")]
    Mkdir,
    #[serde(rename = "write-if-missing")]
    WriteIfMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpStatus {
    #[serde(rename = "applied")]
    Applied,
    #[serde(rename = "dry-run")]
    DryRun,
    #[serde(rename = "skipped(exists)")]
    SkippedExists,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::Mkdir => "mkdir",
            OpKind::WriteIfMissing => "write-if-missing",
        })
    }
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpStatus::Applied => "applied",
            OpStatus::DryRun => "dry-run",
            OpStatus::SkippedExists => "skipped(exists)",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOp {
    pub op: OpKind,
    pub path: PathBuf,
    pub status: OpStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaffoldPlan {
    pub apply: bool,
    pub ops: Vec<PlannedOp>,
}

impl ScaffoldPlan {
    pub fn count(&self, status: OpStatus) -> usize {
        self.ops.iter().filter(|o| o.status == status).count()
    }

    pub fn is_noop(&self) -> bool {
        self.ops.iter().all(|o| o.status == OpStatus::SkippedExists)
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Leaf {
    dir: PathBuf,
    title: String,
    purpose: String,
}

fn leaf_dir(layout: Layout, cap: Capability) -> PathBuf {
    match (layout, cap) {
        (Layout::Single, cap) => PathBuf::from("src").join(cap.key()),
        (Layout::Monorepo, Capability::Frontend) => PathBuf::from("apps/web"),
        (Layout::Monorepo, Capability::Backend) => PathBuf::from("apps/server"),
        (Layout::Monorepo, Capability::Api) => PathBuf::from("packages/api"),
        (Layout::Monorepo, Capability::Database) => PathBuf::from("packages/database"),
    }
}

fn leaves(blueprint: &Blueprint) -> (Vec<PathBuf>, Vec<Leaf>) {
    let layout = blueprint.layout();
    let mut roots = Vec::new();
    let mut leaves = Vec::new();

    match layout {
        Layout::Single => roots.push(PathBuf::from("src")),
        Layout::Monorepo => {
            roots.push(PathBuf::from("apps"));
            roots.push(PathBuf::from("packages"));
            leaves.push(Leaf {
                dir: PathBuf::from("packages/shared"),
                title: "shared".to_string(),
                purpose: "Code shared between apps and packages.".to_string(),
            });
        }
    }

    for cap in blueprint.enabled_capabilities() {
        let tech = blueprint
            .capabilities
            .get(cap)
            .and_then(|spec| spec.detail(cap.detail_field()))
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        leaves.push(Leaf {
            dir: leaf_dir(layout, cap),
            title: cap.key().to_string(),
            purpose: format!("{} code{tech}.", capitalize(cap.key())),
        });
    }

    if blueprint.quality.testing {
        leaves.push(Leaf {
            dir: PathBuf::from("tests"),
            title: "tests".to_string(),
            purpose: "Automated tests.".to_string(),
        });
    }

    (roots, leaves)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn readme(leaf: &Leaf, blueprint: &Blueprint, language: &str) -> String {
    format!(
        "# {}\n\n{}\n\nPart of {} ({language}, {} layout).\n",
        leaf.title,
        leaf.purpose,
        blueprint.project.name,
        blueprint.layout()
    )
}

/// Ordered operations the blueprint asks for, before looking at the disk.
fn desired(blueprint: &Blueprint, language: &str) -> Vec<(OpKind, PathBuf, Option<String>)> {
    let (roots, leaves) = leaves(blueprint);
    let mut ops = Vec::new();
    for root in roots {
        ops.push((OpKind::Mkdir, root, None));
    }
    for leaf in &leaves {
        ops.push((OpKind::Mkdir, leaf.dir.clone(), None));
        ops.push((
            OpKind::WriteIfMissing,
            leaf.dir.join("README.md"),
            Some(readme(leaf, blueprint, language)),
        ));
    }
    ops
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Compute, and with `apply` carry out, the scaffold for `blueprint`.
pub fn plan(
    fs: &dyn ProjectFs,
    blueprint: &Blueprint,
    language: &str,
    apply: bool,
) -> Result<ScaffoldPlan> {
    let mut ops = Vec::new();
    for (op, path, contents) in desired(blueprint, language) {
        let status = if fs.exists(&path) {
            OpStatus::SkippedExists
        } else if !apply {
            OpStatus::DryRun
        } else {
            match op {
                OpKind::Mkdir => fs.create_dir_all(&path)?,
                OpKind::WriteIfMissing => {
                    fs.create_new(&path, contents.as_deref().unwrap_or(""))?
                }
            }
            tracing::info!("scaffold {op} {}", path.display());
            OpStatus::Applied
        };
        ops.push(PlannedOp { op, path, status });
    }
    Ok(ScaffoldPlan { apply, ops })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;

    fn blueprint(json: &str) -> Blueprint {
        serde_json::from_str(json).unwrap()
    }

    fn paths(plan: &ScaffoldPlan) -> Vec<String> {
        plan.ops
            .iter()
            .map(|o| o.path.display().to_string())
            .collect()
    }

    #[test]
    fn single_layout_tree() {
        let bp = blueprint(
            r#"{"project":{"name":"ledger"},"repo":{"layout":"single"},
                "capabilities":{"backend":{"enabled":true,"framework":"axum"},"api":true},
                "quality":{"testing":true}}"#,
        );
        let fs = MemFs::new();
        let plan = plan(&fs, &bp, "rust", false).unwrap();
        assert_eq!(
            paths(&plan),
            vec![
                "src",
                "src/backend",
                "src/backend/README.md",
                "src/api",
                "src/api/README.md",
                "tests",
                "tests/README.md",
            ]
        );
        assert_eq!(plan.count(OpStatus::DryRun), 7);
        assert!(!fs.exists(std::path::Path::new("src")));
    }

    #[test]
    fn monorepo_layout_tree() {
        let bp = blueprint(
            r#"{"repo":{"layout":"monorepo"},
                "capabilities":{"frontend":true,"database":{"enabled":true,"engine":"sqlite"}}}"#,
        );
        let plan = plan(&MemFs::new(), &bp, "ts", false).unwrap();
        assert_eq!(
            paths(&plan),
            vec![
                "apps",
                "packages",
                "packages/shared",
                "packages/shared/README.md",
                "apps/web",
                "apps/web/README.md",
                "packages/database",
                "packages/database/README.md",
            ]
        );
    }

    #[test]
    fn apply_twice_is_idempotent() {
        let bp = blueprint(
            r#"{"project":{"name":"ledger"},"repo":{"layout":"single"},
                "capabilities":{"frontend":{"enabled":true,"framework":"react"}}}"#,
        );
        let fs = MemFs::new();
        let first = plan(&fs, &bp, "rust", true).unwrap();
        assert_eq!(first.count(OpStatus::Applied), first.ops.len());
        let readme = fs.file("src/frontend/README.md").unwrap();
        assert!(readme.contains("Frontend code (react)."));
        assert!(readme.contains("Part of ledger (rust, single layout)."));

        let second = plan(&fs, &bp, "rust", true).unwrap();
        assert!(second.is_noop());
        assert_eq!(paths(&first), paths(&second));
    }

    #[test]
    fn existing_files_are_never_overwritten() {
        let bp = blueprint(r#"{"repo":{"layout":"single"},"capabilities":{"backend":true}}"#);
        let fs = MemFs::new().with_file("src/backend/README.md", "hand written");
        let plan = plan(&fs, &bp, "go", true).unwrap();
        let readme_op = plan
            .ops
            .iter()
            .find(|o| o.path.ends_with("README.md"))
            .unwrap();
        assert_eq!(readme_op.status, OpStatus::SkippedExists);
        assert_eq!(fs.file("src/backend/README.md").unwrap(), "hand written");
    }
}
