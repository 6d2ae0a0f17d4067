//! Skill pack catalog, recommendation and the pack→prefix table.

use crate::blueprint::Blueprint;
use crate::types::Capability;

pub const BASELINE_PACK: &str = "workflows";

#[derive(Debug, Clone, Copy)]
pub struct PackDef {
    pub name: &'static str,
    pub prefixes: &'static [&'static str],
}

/// Every known pack, in canonical order.
pub const CATALOG: &[PackDef] = &[
    PackDef {
        name: "workflows",
        prefixes: &["workflow-", "process-"],
    },
    PackDef {
        name: "frontend",
        prefixes: &["frontend-", "ui-"],
    },
    PackDef {
        name: "backend",
        prefixes: &["backend-"],
    },
    PackDef {
        name: "database",
        prefixes: &["db-"],
    },
    PackDef {
        name: "api",
        prefixes: &["api-"],
    },
    PackDef {
        name: "testing",
        prefixes: &["testing-", "qa-"],
    },
    PackDef {
        name: "security",
        prefixes: &["security-"],
    },
    PackDef {
        name: "devops",
        prefixes: &["devops-", "ci-"],
    },
    PackDef {
        name: "docs",
        prefixes: &["docs-"],
    },
];

pub fn lookup(name: &str) -> Option<&'static PackDef> {
    CATALOG.iter().find(|p| p.name == name)
}

pub fn is_known(name: &str) -> bool {
    lookup(name).is_some()
}

fn rank(name: &str) -> Option<usize> {
    CATALOG.iter().position(|p| p.name == name)
}

fn capability_pack(cap: Capability) -> &'static str {
    match cap {
        Capability::Frontend => "frontend",
        Capability::Backend => "backend",
        Capability::Database => "database",
        Capability::Api => "api",
    }
}

/// Packs a blueprint should carry: the baseline plus one per enabled
/// capability and `testing` when the blueprint asks for tests. Canonical
/// order, no duplicates.
pub fn recommend(blueprint: &Blueprint) -> Vec<String> {
    let mut wanted = vec![BASELINE_PACK];
    for &cap in Capability::all() {
        if blueprint.enabled(cap) {
            wanted.push(capability_pack(cap));
        }
    }
    if blueprint.quality.testing {
        wanted.push("testing");
    }
    CATALOG
        .iter()
        .filter(|p| wanted.contains(&p.name))
        .map(|p| p.name.to_string())
        .collect()
}

/// Recommended packs not yet present in `current`, canonical order.
pub fn missing(current: &[String], recommended: &[String]) -> Vec<String> {
    recommended
        .iter()
        .filter(|p| !current.contains(p))
        .cloned()
        .collect()
}

/// Add `additions` to `current` without removing or reordering existing
/// entries. Each new pack lands right after the last existing pack that
/// precedes it in catalog order, or at the front when none does.
pub fn safe_add(current: &[String], additions: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = current.to_vec();
    for pack in additions {
        if merged.contains(pack) {
            continue;
        }
        let Some(new_rank) = rank(pack) else {
            merged.push(pack.clone());
            continue;
        };
        let insert_at = merged
            .iter()
            .rposition(|existing| rank(existing).is_some_and(|r| r < new_rank))
            .map(|i| i + 1)
            .unwrap_or(0);
        merged.insert(insert_at, pack.clone());
    }
    merged
}

/// Include prefixes for the requested packs plus the names that matched
/// nothing in the catalog. Prefixes follow catalog priority and are unique.
pub fn prefixes_for(packs: &[String]) -> (Vec<String>, Vec<String>) {
    let unknown: Vec<String> = packs.iter().filter(|p| !is_known(p)).cloned().collect();
    let mut prefixes: Vec<String> = Vec::new();
    for def in CATALOG.iter().filter(|d| packs.iter().any(|p| p == d.name)) {
        for prefix in def.prefixes {
            if !prefixes.iter().any(|p| p == prefix) {
                prefixes.push(prefix.to_string());
            }
        }
    }
    (prefixes, unknown)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
