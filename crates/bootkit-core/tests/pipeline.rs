use bootkit_core::config::Config;
use bootkit_core::fs::DiskFs;
use bootkit_core::gate::{ApplyOptions, Gate, Step};
use bootkit_core::kit::{self, CleanupOptions};
use bootkit_core::report::Strictness;
use bootkit_core::state::{events, State};
use bootkit_core::types::Stage;
use bootkit_core::wrapper_sync::{SyncRequest, WrapperSync};
use bootkit_core::Result;
use std::cell::RefCell;
use std::path::Path;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingSync {
    requests: RefCell<Vec<String>>,
}

impl WrapperSync for RecordingSync {
    fn sync(&self, request: &SyncRequest<'_>) -> Result<()> {
        self.requests
            .borrow_mut()
            .push(format!("{} {}", request.providers.join(","), request.mode));
        Ok(())
    }
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn write_docs(root: &Path) {
    write(
        root,
        "docs/requirements/requirements.md",
        "# Requirements\n## Overview\nA ledger.\n## Users\nAccountants.\n\
         ## Functional Requirements\n- FR-1: record payments\n## Acceptance Criteria\nDemo.\n",
    );
    write(
        root,
        "docs/requirements/non-functional-requirements.md",
        "## Performance\nNFR-1: fast.\n## Security\nSSO.\n## Reliability\nBackups.\n## Observability\nLogs.\n",
    );
    write(root, "docs/requirements/domain-glossary.md", "## Terms\n- Ledger: a book.\n");
    write(
        root,
        "docs/requirements/risks-and-open-questions.md",
        "## Risks\nScope.\n## Open Questions\nNone.\n## Decisions\nSQLite.\n",
    );
}

const BLUEPRINT: &str = r#"{
  "version": 1,
  "project": {"name": "ledger", "description": "Small-business ledger"},
  "repo": {"layout": "monorepo", "language": "typescript"},
  "capabilities": {
    "frontend": {"enabled": true, "framework": "svelte"},
    "backend": {"enabled": true, "framework": "hono"},
    "database": false
  },
  "quality": {"testing": true},
  "skills": {"packs": ["workflows"]}
}
"#;

/// Save the step's state and surface its outcome, like the CLI does.
fn commit<T>(root: &Path, state: &mut State, op: impl FnOnce(State) -> Step<T>) -> Result<T> {
    let before = state.clone();
    let (next, result) = op(before.clone()).into_parts();
    *state = next;
    state.save_if_changed(root, &before)?;
    result
}

#[test]
fn full_pipeline_from_start_to_cleanup() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let fs = DiskFs::new(root);
    let sync = RecordingSync::default();

    let mut state = kit::start(root, None).unwrap().state;
    let config = Config::load(root).unwrap();
    let gate = Gate::new(root, &fs, &config);

    // Stage A
    let check = commit(root, &mut state, |s| gate.check_docs(s, Strictness::Lenient)).unwrap();
    assert!(!check.report.ok);
    write_docs(root);
    let check = commit(root, &mut state, |s| gate.check_docs(s, Strictness::Strict)).unwrap();
    assert!(check.report.ok, "{:?}", check.report.errors);
    assert_eq!(
        commit(root, &mut state, |s| gate.approve(s, Stage::A, Some("ops"))).unwrap(),
        Stage::B
    );

    // Stage B
    write(root, "docs/blueprint/blueprint.json", BLUEPRINT);
    commit(root, &mut state, |s| gate.set_language(s, "typescript")).unwrap();
    let check = commit(root, &mut state, |s| gate.validate_blueprint(s)).unwrap();
    assert!(check.report.errors.is_empty());
    assert!(!check.report.warnings.is_empty());

    let suggestion = commit(root, &mut state, |s| gate.suggest_packs(s, true)).unwrap();
    assert_eq!(
        suggestion.packs,
        vec!["workflows", "frontend", "backend", "testing"]
    );
    let check = commit(root, &mut state, |s| gate.validate_blueprint(s)).unwrap();
    assert!(check.report.warnings.is_empty(), "{:?}", check.report.warnings);
    assert_eq!(
        commit(root, &mut state, |s| gate.approve(s, Stage::B, None)).unwrap(),
        Stage::C
    );

    // Stage C
    let report = commit(
        root,
        &mut state,
        |s| gate.apply(s, &ApplyOptions::default(), &sync),
    )
    .unwrap();
    assert!(root.join("apps/web/README.md").is_file());
    assert!(root.join("apps/server/README.md").is_file());
    assert!(root.join("packages/shared/README.md").is_file());
    assert!(root.join("tests/README.md").is_file());
    assert!(!root.join("packages/database").exists());
    assert_eq!(report.providers, vec!["claude", "codex", "gemini"]);
    assert_eq!(sync.requests.borrow().as_slice(), ["claude,codex,gemini reset"]);

    let manifest = std::fs::read_to_string(root.join(".skills/manifest.json")).unwrap();
    assert!(manifest.contains("\"frontend-\""));
    assert!(manifest.ends_with("\n"));

    commit(root, &mut state, |s| gate.review_skill_retention(s)).unwrap();
    assert_eq!(
        commit(root, &mut state, |s| gate.approve(s, Stage::C, None)).unwrap(),
        Stage::Complete
    );

    let on_disk = State::require(root).unwrap();
    assert_eq!(on_disk.stage, Stage::Complete);
    assert!(on_disk.last_event(events::WRAPPERS_SYNCED).is_some());

    // Cleanup
    let options = CleanupOptions {
        archive: true,
        acknowledged: true,
        dry_run: false,
    };
    let report = kit::cleanup(root, options, chrono::Utc::now()).unwrap();
    assert!(report.destination.unwrap().join("state.yaml").is_file());
    assert!(!root.join(".bootkit").exists());
}

#[test]
fn rerunning_apply_is_idempotent_on_disk() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "docs/blueprint/blueprint.json", BLUEPRINT);
    let fs = DiskFs::new(root);
    let config = Config::default();
    let gate = Gate::new(root, &fs, &config);
    let sync = RecordingSync::default();

    let mut state = State::new();
    state.stage = Stage::C;
    state.language = Some("typescript".to_string());

    let first = gate
        .apply(state.clone(), &ApplyOptions::default(), &sync)
        .result
        .unwrap();
    let manifest_before = std::fs::read(root.join(".skills/manifest.json")).unwrap();

    let options = ApplyOptions {
        providers: Some(vec!["claude".to_string()]),
        ..ApplyOptions::default()
    };
    let second = gate.apply(state, &options, &sync).result.unwrap();
    assert!(second.scaffold.is_noop());
    assert_eq!(second.manifest.status.to_string(), "unchanged");
    assert_eq!(first.scaffold.ops.len(), second.scaffold.ops.len());
    assert_eq!(
        std::fs::read(root.join(".skills/manifest.json")).unwrap(),
        manifest_before
    );
    assert_eq!(sync.requests.borrow().last().unwrap(), "claude reset");
}
