//! Checkpoint and approval gate.
//!
//! Every operation takes the current [`State`] by value and hands back a
//! [`Step`] carrying the (possibly updated) state and the outcome. A failed
//! outcome may still carry a changed state, e.g. a stage whose re-validation
//! failed has its `validated` flag reset. Callers persist `step.state` before
//! looking at `step.result`.
//!
//! Guards run before any mutation, so a refused command (wrong stage, halted
//! pipeline, unset language) returns the state exactly as it came in.

use crate::blueprint::{self, Blueprint, BlueprintCheck};
use crate::config::Config;
use crate::docs::{self, DocCheck};
use crate::error::{BootkitError, Result};
use crate::fs::ProjectFs;
use crate::manifest::{self, ManifestStatus, ManifestUpdate};
use crate::packs;
use crate::report::Strictness;
use crate::scaffold::{self, OpStatus, ScaffoldPlan};
use crate::state::{events, RequirementTracking, State};
use crate::types::Stage;
use crate::wrapper_sync::{SyncRequest, WrapperSync};
use serde::Serialize;
use std::path::Path;

/// Result of one gate transition.
#[derive(Debug)]
pub struct Step<T> {
    pub state: State,
    pub result: Result<T>,
}

impl<T> Step<T> {
    /// Split into the state to persist and the outcome.
    pub fn into_parts(self) -> (State, Result<T>) {
        (self.state, self.result)
    }
}

fn run<T>(mut state: State, f: impl FnOnce(&mut State) -> Result<T>) -> Step<T> {
    let result = f(&mut state);
    Step { state, result }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PackSuggestion {
    pub current: Vec<String>,
    pub recommended: Vec<String>,
    pub missing: Vec<String>,
    /// Packs after the write; equal to `current` when nothing was written.
    pub packs: Vec<String>,
    pub written: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Overrides the configured provider list.
    pub providers: Option<Vec<String>>,
    /// Re-check the Stage A documents before touching anything.
    pub require_stage_a: Option<Strictness>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub scaffold: ScaffoldPlan,
    pub manifest: ManifestUpdate,
    pub providers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn require_stage(state: &State, command: &str, required: Stage) -> Result<()> {
    if state.stage == required {
        Ok(())
    } else {
        Err(BootkitError::WrongStage {
            command: command.to_string(),
            current: state.stage.to_string(),
            required: required.to_string(),
        })
    }
}

fn require_language(state: &State) -> Result<String> {
    state.language.clone().ok_or(BootkitError::LanguageUnset)
}

fn require_flags(action: &str, flags: &[(bool, &str)]) -> Result<()> {
    let missing: Vec<&str> = flags
        .iter()
        .filter(|(set, _)| !set)
        .map(|(_, name)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BootkitError::PrerequisiteMissing {
            action: action.to_string(),
            missing: missing.join(", "),
        })
    }
}

// ---------------------------------------------------------------------------
// Self-healing flags
// ---------------------------------------------------------------------------

fn heal_stage_a(state: &mut State, check: &DocCheck) {
    if check.report.ok {
        for id in &check.requirement_ids {
            state.stage_a.requirements.insert(
                id.clone(),
                RequirementTracking {
                    asked: true,
                    answered: true,
                },
            );
        }
        if !state.stage_a.validated {
            state.stage_a.validated = true;
            state.record(
                events::STAGE_A_VALIDATED,
                format!("{} requirement id(s)", check.requirement_ids.len()),
            );
        }
    } else if state.stage_a.validated {
        tracing::warn!("stage A documents no longer pass, resetting validated");
        state.stage_a.validated = false;
        state.record(events::STAGE_A_INVALIDATED, check.report.summary());
    }
}

fn heal_stage_b(state: &mut State, check: &BlueprintCheck) {
    if check.report.errors.is_empty() {
        if !state.stage_b.validated {
            state.stage_b.validated = true;
            state.record(events::STAGE_B_VALIDATED, "");
        }
    } else {
        reset_stage_b(state, &check.report.summary());
    }
}

fn reset_stage_b(state: &mut State, reason: &str) {
    if state.stage_b.validated || state.stage_b.packs_reviewed {
        tracing::warn!("blueprint no longer validates, resetting stage B flags");
        state.stage_b.validated = false;
        state.stage_b.packs_reviewed = false;
        state.record(events::STAGE_B_INVALIDATED, reason);
    }
}

fn mark_stale(state: &mut State, reason: &str) {
    if state.stage_c.manifest_updated || state.stage_c.wrappers_synced {
        tracing::warn!("stage C is stale: {reason}");
        state.stage_c.manifest_updated = false;
        state.stage_c.wrappers_synced = false;
        state.record(events::STAGE_C_STALE, reason);
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

pub struct Gate<'a> {
    root: &'a Path,
    fs: &'a dyn ProjectFs,
    config: &'a Config,
}

impl<'a> Gate<'a> {
    pub fn new(root: &'a Path, fs: &'a dyn ProjectFs, config: &'a Config) -> Self {
        Self { root, fs, config }
    }

    fn load_blueprint(&self) -> Result<Blueprint> {
        Blueprint::load(self.fs, &self.config.blueprint_path)
    }

    /// Set the project language once. Setting the same value again is a no-op.
    pub fn set_language(&self, state: State, language: &str) -> Step<()> {
        run(state, |s| {
            s.ensure_running()?;
            let language = language.trim();
            if language.is_empty() {
                return Err(BootkitError::PrerequisiteMissing {
                    action: "set language".to_string(),
                    missing: "a non-empty language name".to_string(),
                });
            }
            match s.language.as_deref() {
                Some(current) if current == language => Ok(()),
                Some(current) => Err(BootkitError::LanguageAlreadySet {
                    current: current.to_string(),
                    requested: language.to_string(),
                }),
                None => {
                    s.language = Some(language.to_string());
                    s.record(events::LANGUAGE_SET, language);
                    tracing::info!("language set to {language}");
                    Ok(())
                }
            }
        })
    }

    // -----------------------------------------------------------------------
    // Stage A
    // -----------------------------------------------------------------------

    /// Validate the document set. In stage A the result also drives
    /// `stage_a.validated`; a halted pipeline is only reported on.
    pub fn check_docs(&self, state: State, strictness: Strictness) -> Step<DocCheck> {
        run(state, |s| {
            let check = docs::check_docs(self.fs, &self.config.docs_dir, strictness);
            if s.stage == Stage::A && s.halted().is_none() {
                heal_stage_a(s, &check);
            }
            Ok(check)
        })
    }

    // -----------------------------------------------------------------------
    // Stage B
    // -----------------------------------------------------------------------

    pub fn validate_blueprint(&self, state: State) -> Step<BlueprintCheck> {
        run(state, |s| {
            let check = blueprint::check_blueprint(
                self.fs,
                &self.config.blueprint_path,
                s.language.as_deref(),
            )?;
            if s.stage == Stage::B && s.halted().is_none() {
                heal_stage_b(s, &check);
            }
            Ok(check)
        })
    }

    pub fn suggest_packs(&self, state: State, write: bool) -> Step<PackSuggestion> {
        run(state, |s| {
            if write {
                s.ensure_running()?;
                require_stage(s, "suggest-packs --write", Stage::B)?;
                require_language(s)?;
            }
            let path = &self.config.blueprint_path;
            let text = blueprint::read_blueprint(self.fs, path)?;
            let check = blueprint::validate_text(&text, s.language.as_deref());
            let Some(bp) = check.blueprint else {
                return Err(BootkitError::BlueprintInvalid {
                    path: path.clone(),
                    reason: check.report.summary(),
                });
            };

            let current = bp.skills.packs.clone();
            let recommended = packs::recommend(&bp);
            let missing = packs::missing(&current, &recommended);
            let mut suggestion = PackSuggestion {
                packs: current.clone(),
                current,
                recommended,
                missing,
                written: false,
            };

            if write && !suggestion.missing.is_empty() {
                let merged = packs::safe_add(&suggestion.current, &suggestion.missing);
                self.fs.write(path, &blueprint::with_packs(&text, &merged)?)?;
                tracing::info!("added packs to {}: {}", path.display(), suggestion.missing.join(", "));
                s.record(events::PACKS_ADDED, suggestion.missing.join(","));
                suggestion.packs = merged;
                suggestion.written = true;
            }

            if s.stage == Stage::B && s.halted().is_none() && !s.stage_b.packs_reviewed {
                s.stage_b.packs_reviewed = true;
                s.record(events::PACKS_REVIEWED, suggestion.packs.join(","));
            }
            Ok(suggestion)
        })
    }

    // -----------------------------------------------------------------------
    // Stage C
    // -----------------------------------------------------------------------

    fn apply_guards(&self, state: &State, command: &str) -> Result<String> {
        state.ensure_running()?;
        require_stage(state, command, Stage::C)?;
        require_language(state)
    }

    fn run_scaffold(
        &self,
        s: &mut State,
        bp: &Blueprint,
        language: &str,
        apply: bool,
    ) -> Result<ScaffoldPlan> {
        let plan = scaffold::plan(self.fs, bp, language, apply)?;
        if apply && !s.stage_c.scaffolded {
            s.stage_c.scaffolded = true;
            s.record(
                events::SCAFFOLD_APPLIED,
                format!("{} created", plan.count(OpStatus::Applied)),
            );
        }
        Ok(plan)
    }

    fn run_manifest(&self, s: &mut State, bp: &Blueprint, apply: bool) -> Result<ManifestUpdate> {
        let update = manifest::reconcile(self.fs, &self.config.manifest_path, bp, apply)?;
        if apply {
            if update.status == ManifestStatus::Written && s.stage_c.wrappers_synced {
                s.stage_c.wrappers_synced = false;
                s.record(events::STAGE_C_STALE, "manifest rewritten; wrappers need a re-sync");
            }
            if !s.stage_c.manifest_updated {
                s.stage_c.manifest_updated = true;
                s.record(events::MANIFEST_UPDATED, update.status.to_string());
            }
        }
        Ok(update)
    }

    /// Plan the skeleton; `apply` creates it. Dry runs work in any stage.
    pub fn scaffold(&self, state: State, apply: bool) -> Step<ScaffoldPlan> {
        run(state, |s| {
            let language = if apply {
                self.apply_guards(s, "scaffold --apply")?
            } else {
                String::new()
            };
            let bp = self.load_blueprint()?;
            let language = if apply {
                language
            } else {
                s.language.clone().unwrap_or_else(|| bp.repo.language.clone())
            };
            self.run_scaffold(s, &bp, &language, apply)
        })
    }

    pub fn manifest(&self, state: State, apply: bool) -> Step<ManifestUpdate> {
        run(state, |s| {
            if apply {
                self.apply_guards(s, "manifest --apply")?;
            }
            let bp = self.load_blueprint()?;
            self.run_manifest(s, &bp, apply)
        })
    }

    /// Scaffold, reconcile the manifest, then sync wrappers. A sync failure
    /// leaves the first two applied and records the failure.
    pub fn apply(
        &self,
        state: State,
        options: &ApplyOptions,
        sync: &dyn WrapperSync,
    ) -> Step<ApplyReport> {
        run(state, |s| {
            let language = self.apply_guards(s, "apply")?;

            if let Some(strictness) = options.require_stage_a {
                let check = docs::check_docs(self.fs, &self.config.docs_dir, strictness);
                if !check.report.ok {
                    return Err(BootkitError::PrerequisiteMissing {
                        action: "apply".to_string(),
                        missing: format!("stage A documents do not pass: {}", check.report.summary()),
                    });
                }
            }

            let providers = options
                .providers
                .clone()
                .unwrap_or_else(|| self.config.wrapper_sync.providers.clone());
            if providers.is_empty() {
                return Err(BootkitError::PrerequisiteMissing {
                    action: "apply".to_string(),
                    missing: "at least one wrapper provider".to_string(),
                });
            }

            let bp = self.load_blueprint()?;
            let scaffold = self.run_scaffold(s, &bp, &language, true)?;
            let manifest = self.run_manifest(s, &bp, true)?;

            let request = SyncRequest {
                root: self.root,
                providers: &providers,
                mode: self.config.wrapper_sync.mode,
            };
            if let Err(e) = sync.sync(&request) {
                tracing::warn!("wrapper sync failed: {e}");
                s.stage_c.wrappers_synced = false;
                s.record(events::WRAPPER_SYNC_FAILED, e.to_string());
                return Err(e);
            }
            s.stage_c.wrappers_synced = true;
            s.record(events::WRAPPERS_SYNCED, providers.join(","));

            Ok(ApplyReport {
                scaffold,
                manifest,
                providers,
            })
        })
    }

    pub fn review_skill_retention(&self, state: State) -> Step<()> {
        run(state, |s| {
            s.ensure_running()?;
            require_stage(s, "review-skill-retention", Stage::C)?;
            require_flags(
                "review skill retention",
                &[(s.stage_c.wrappers_synced, "wrappers_synced (run 'bootkit apply')")],
            )?;
            if !s.stage_c.skill_retention_reviewed {
                s.stage_c.skill_retention_reviewed = true;
                s.record(events::SKILL_RETENTION_REVIEWED, "");
            }
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Approval
    // -----------------------------------------------------------------------

    /// Approve `stage` and advance. Returns the new stage.
    pub fn approve(&self, state: State, stage: Stage, by: Option<&str>) -> Step<Stage> {
        run(state, |s| {
            s.ensure_running()?;
            let check: fn(&Self, &mut State) -> Result<()> = match stage {
                Stage::A => Self::approve_a,
                Stage::B => Self::approve_b,
                Stage::C => Self::approve_c,
                Stage::Complete => return Err(BootkitError::InvalidStage(stage.to_string())),
            };
            require_stage(s, &format!("approve --stage {stage}"), stage)?;
            check(self, s)?;

            let next = stage.next().unwrap_or(Stage::Complete);
            s.stage = next;
            let details = match by {
                Some(who) => format!("{stage} approved by {who}"),
                None => format!("{stage} approved"),
            };
            s.record(events::STAGE_APPROVED, details);
            tracing::info!("stage {stage} approved, now at {next}");
            Ok(next)
        })
    }

    fn approve_a(&self, s: &mut State) -> Result<()> {
        require_flags(
            "approve stage A",
            &[(s.stage_a.validated, "validated (run 'bootkit check-docs')")],
        )?;
        let strictness = Strictness::from_flag(self.config.strict_docs);
        let check = docs::check_docs(self.fs, &self.config.docs_dir, strictness);
        heal_stage_a(s, &check);
        if !check.report.ok {
            return Err(BootkitError::ValidationFailed {
                stage: "A".to_string(),
                summary: check.report.summary(),
            });
        }
        s.stage_a.user_approved = true;
        Ok(())
    }

    fn approve_b(&self, s: &mut State) -> Result<()> {
        require_flags(
            "approve stage B",
            &[
                (s.stage_b.validated, "validated (run 'bootkit validate')"),
                (s.stage_b.packs_reviewed, "packs_reviewed (run 'bootkit suggest-packs')"),
            ],
        )?;
        let check = match blueprint::check_blueprint(
            self.fs,
            &self.config.blueprint_path,
            s.language.as_deref(),
        ) {
            Ok(check) => check,
            Err(e) => {
                reset_stage_b(s, &e.to_string());
                return Err(e);
            }
        };
        heal_stage_b(s, &check);
        if !check.report.errors.is_empty() {
            return Err(BootkitError::ValidationFailed {
                stage: "B".to_string(),
                summary: check.report.summary(),
            });
        }
        s.stage_b.user_approved = true;
        Ok(())
    }

    fn approve_c(&self, s: &mut State) -> Result<()> {
        let c = &s.stage_c;
        require_flags(
            "approve stage C",
            &[
                (c.scaffolded, "scaffolded"),
                (c.manifest_updated, "manifest_updated"),
                (c.wrappers_synced, "wrappers_synced"),
                (
                    c.skill_retention_reviewed,
                    "skill_retention_reviewed (run 'bootkit review-skill-retention')",
                ),
            ],
        )?;
        let bp = self.load_blueprint()?;
        let update = manifest::reconcile(self.fs, &self.config.manifest_path, &bp, false)?;
        if update.status != ManifestStatus::Unchanged {
            let reason = "manifest no longer matches the blueprint packs; run 'bootkit apply'";
            mark_stale(s, reason);
            return Err(BootkitError::StaleStage {
                stage: "C".to_string(),
                reason: reason.to_string(),
            });
        }
        s.stage_c.user_approved = true;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Emergency stop
    // -----------------------------------------------------------------------

    /// Halt the pipeline. Returns false when it was already halted.
    pub fn stop(&self, state: State, reason: Option<&str>) -> Step<bool> {
        run(state, |s| {
            if s.halted().is_some() {
                return Ok(false);
            }
            let reason = reason.map(str::trim).filter(|r| !r.is_empty()).unwrap_or("emergency stop");
            s.record(events::EMERGENCY_STOP, reason);
            tracing::warn!("pipeline halted: {reason}");
            Ok(true)
        })
    }

    /// Lift a halt. Returns false when the pipeline was not halted.
    pub fn resume(&self, state: State) -> Step<bool> {
        run(state, |s| {
            if s.halted().is_none() {
                return Ok(false);
            }
            s.record(events::RESUMED, "");
            tracing::info!("pipeline resumed");
            Ok(true)
        })
    }
}

/// Human hint for what to do next from `state`.
pub fn next_action(state: &State) -> String {
    if let Some(stop) = state.halted() {
        return format!("halted ({}); run 'bootkit resume'", stop.details);
    }
    let hint = match state.stage {
        Stage::A if !state.stage_a.validated => "run 'bootkit check-docs' until it passes",
        Stage::A => "run 'bootkit approve --stage A'",
        Stage::B if state.language.is_none() => "run 'bootkit set-language <language>'",
        Stage::B if !state.stage_b.validated => "run 'bootkit validate' until it passes",
        Stage::B if !state.stage_b.packs_reviewed => "run 'bootkit suggest-packs'",
        Stage::B => "run 'bootkit approve --stage B'",
        Stage::C if !state.stage_c.wrappers_synced => "run 'bootkit apply'",
        Stage::C if !state.stage_c.skill_retention_reviewed => {
            "run 'bootkit review-skill-retention'"
        }
        Stage::C => "run 'bootkit approve --stage C'",
        Stage::Complete => "done; run 'bootkit cleanup --i-understand' to remove the kit",
    };
    hint.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::VALID_BLUEPRINT;
    use crate::docs::complete_doc_set;
    use crate::fs::MemFs;
    use std::cell::Cell;

    const BLUEPRINT: &str = "docs/blueprint/blueprint.json";
    const MANIFEST: &str = ".skills/manifest.json";

    struct StubSync {
        fail: bool,
        calls: Cell<usize>,
    }

    impl StubSync {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: Cell::new(0),
            }
        }
    }

    impl WrapperSync for StubSync {
        fn sync(&self, _request: &SyncRequest<'_>) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(BootkitError::WrapperSyncFailed("exit code 2".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn project() -> MemFs {
        complete_doc_set().with_file(BLUEPRINT, VALID_BLUEPRINT)
    }

    fn at_stage(stage: Stage) -> State {
        let mut state = State::new();
        state.stage = stage;
        state.language = Some("rust".to_string());
        state
    }

    fn events_of(state: &State) -> Vec<&str> {
        state.history.iter().map(|e| e.event.as_str()).collect()
    }

    #[test]
    fn wrong_stage_leaves_state_untouched() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let before = State::new();

        let step = gate.approve(before.clone(), Stage::B, None);
        assert!(matches!(step.result, Err(BootkitError::WrongStage { .. })));
        assert_eq!(step.state, before);

        let step = gate.scaffold(before.clone(), true);
        assert!(matches!(step.result, Err(BootkitError::WrongStage { .. })));
        assert_eq!(step.state, before);

        let sync = StubSync::ok();
        let step = gate.apply(before.clone(), &ApplyOptions::default(), &sync);
        match step.result {
            Err(BootkitError::WrongStage {
                command,
                current,
                required,
            }) => {
                assert_eq!(command, "apply");
                assert_eq!(current, "A");
                assert_eq!(required, "C");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(step.state, before);
        assert_eq!(sync.calls.get(), 0);
        assert!(!fs.exists(Path::new("src")));
    }

    #[test]
    fn deleting_a_heading_invalidates_stage_a() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.check_docs(State::new(), Strictness::Lenient).state;
        assert!(state.stage_a.validated);

        fs.insert_file(
            "docs/requirements/domain-glossary.md",
            "# Glossary\n- Invoice: a bill.\n",
        );
        let step = gate.check_docs(state, Strictness::Lenient);
        let check = step.result.unwrap();
        assert!(!step.state.stage_a.validated);
        assert!(check
            .report
            .errors
            .iter()
            .any(|e| e.contains("domain-glossary.md") && e.contains("Terms")));
    }

    #[test]
    fn check_docs_heals_stage_a_both_ways() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);

        let step = gate.check_docs(State::new(), Strictness::Lenient);
        assert!(step.result.unwrap().report.ok);
        let state = step.state;
        assert!(state.stage_a.validated);
        assert_eq!(state.stage_a.requirements.len(), 3);
        assert!(state.stage_a.requirements["FR-2"].answered);

        // A second passing run changes nothing.
        let again = gate.check_docs(state.clone(), Strictness::Lenient).state;
        assert_eq!(again, state);

        fs.remove("docs/requirements/domain-glossary.md");
        let broken = gate.check_docs(state, Strictness::Lenient).state;
        assert!(!broken.stage_a.validated);
        assert_eq!(
            events_of(&broken),
            vec![
                events::START,
                events::STAGE_A_VALIDATED,
                events::STAGE_A_INVALIDATED
            ]
        );
    }

    #[test]
    fn check_docs_never_heals_outside_stage_a() {
        let fs = MemFs::new();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let before = at_stage(Stage::B);
        let step = gate.check_docs(before.clone(), Strictness::Lenient);
        assert!(!step.result.unwrap().report.ok);
        assert_eq!(step.state, before);
    }

    #[test]
    fn approve_a_revalidates_and_resets() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.check_docs(State::new(), Strictness::Lenient).state;
        assert!(state.stage_a.validated);

        fs.insert_file(
            "docs/requirements/requirements.md",
            "## Overview\n<project summary>\n## Users\n## Functional Requirements\n## Acceptance Criteria\n",
        );
        let step = gate.approve(state, Stage::A, Some("dana"));
        assert!(matches!(
            step.result,
            Err(BootkitError::ValidationFailed { ref stage, .. }) if stage == "A"
        ));
        assert!(!step.state.stage_a.validated);
        assert_eq!(step.state.stage, Stage::A);
    }

    #[test]
    fn approve_a_strict_config_blocks_on_warnings() {
        let fs = project().with_file(
            "docs/requirements/risks-and-open-questions.md",
            "## Risks\nNone.\n## Open Questions\nHosting TBD\n## Decisions\nNone.\n",
        );
        let cfg = Config {
            strict_docs: true,
            ..Config::default()
        };
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.check_docs(State::new(), Strictness::Lenient).state;
        assert!(state.stage_a.validated);

        let step = gate.approve(state, Stage::A, None);
        assert!(step.result.is_err());
        assert!(!step.state.stage_a.validated);
    }

    #[test]
    fn approve_a_advances_to_b() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.check_docs(State::new(), Strictness::Lenient).state;
        let step = gate.approve(state, Stage::A, Some("dana"));
        assert_eq!(step.result.unwrap(), Stage::B);
        assert!(step.state.stage_a.user_approved);
        assert_eq!(
            step.state.last_event(events::STAGE_APPROVED).unwrap().details,
            "A approved by dana"
        );
    }

    #[test]
    fn approve_b_needs_packs_reviewed() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.validate_blueprint(at_stage(Stage::B)).state;
        assert!(state.stage_b.validated);

        let step = gate.approve(state, Stage::B, None);
        match step.result {
            Err(BootkitError::PrerequisiteMissing { missing, .. }) => {
                assert!(missing.contains("packs_reviewed"))
            }
            other => panic!("unexpected: {other:?}"),
        }

        let state = gate.suggest_packs(step.state, false).state;
        assert!(state.stage_b.packs_reviewed);
        let step = gate.approve(state, Stage::B, None);
        assert_eq!(step.result.unwrap(), Stage::C);
    }

    #[test]
    fn approve_b_revalidation_failure_resets_flags() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.validate_blueprint(at_stage(Stage::B)).state;
        let state = gate.suggest_packs(state, false).state;

        fs.insert_file(BLUEPRINT, "{\"version\": 1");
        let step = gate.approve(state, Stage::B, None);
        assert!(matches!(step.result, Err(BootkitError::ValidationFailed { .. })));
        assert!(!step.state.stage_b.validated);
        assert!(!step.state.stage_b.packs_reviewed);
        assert!(!step.state.stage_b.user_approved);
        assert_eq!(step.state.stage, Stage::B);
    }

    #[test]
    fn approve_b_with_missing_blueprint_resets_both_flags() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.validate_blueprint(at_stage(Stage::B)).state;
        let state = gate.suggest_packs(state, false).state;
        assert!(state.stage_b.packs_reviewed);

        fs.remove(BLUEPRINT);
        let step = gate.approve(state, Stage::B, None);
        assert!(matches!(step.result, Err(BootkitError::BlueprintMissing(_))));
        assert!(!step.state.stage_b.validated);
        assert!(!step.state.stage_b.packs_reviewed);
        assert!(step.state.last_event(events::STAGE_B_INVALIDATED).is_some());
    }

    #[test]
    fn suggest_packs_write_uses_safe_add() {
        let text = VALID_BLUEPRINT.replace(
            r#""packs": ["workflows", "backend", "database"]"#,
            r#""packs": ["workflows", "custom"]"#,
        );
        let fs = project().with_file(BLUEPRINT, text);
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);

        let step = gate.suggest_packs(at_stage(Stage::B), true);
        let suggestion = step.result.unwrap();
        assert!(suggestion.written);
        assert_eq!(suggestion.missing, vec!["backend", "database"]);
        assert_eq!(
            suggestion.packs,
            vec!["workflows", "backend", "database", "custom"]
        );
        let on_disk = Blueprint::load(&fs, Path::new(BLUEPRINT)).unwrap();
        assert_eq!(on_disk.skills.packs, suggestion.packs);
        assert_eq!(on_disk.project.name, "ledger");
        assert!(step.state.stage_b.packs_reviewed);
    }

    #[test]
    fn suggest_packs_write_needs_language() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let mut state = at_stage(Stage::B);
        state.language = None;
        let step = gate.suggest_packs(state, true);
        assert!(matches!(step.result, Err(BootkitError::LanguageUnset)));
    }

    #[test]
    fn artifacts_need_language() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let mut state = at_stage(Stage::C);
        state.language = None;

        let step = gate.scaffold(state.clone(), true);
        assert!(matches!(step.result, Err(BootkitError::LanguageUnset)));
        let step = gate.manifest(state.clone(), true);
        assert!(matches!(step.result, Err(BootkitError::LanguageUnset)));
        assert!(fs.file(MANIFEST).is_none());

        // Dry runs are still allowed.
        let plan = gate.scaffold(state, false).result.unwrap();
        assert_eq!(plan.count(OpStatus::DryRun), plan.ops.len());
    }

    #[test]
    fn language_is_set_once() {
        let fs = MemFs::new();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.set_language(State::new(), "rust").state;
        assert_eq!(state.language.as_deref(), Some("rust"));

        let same = gate.set_language(state.clone(), "rust");
        assert!(same.result.is_ok());
        assert_eq!(same.state, state);

        let other = gate.set_language(state, "go");
        assert!(matches!(
            other.result,
            Err(BootkitError::LanguageAlreadySet { .. })
        ));
    }

    #[test]
    fn halted_pipeline_refuses_mutations() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.stop(at_stage(Stage::C), Some("bad deploy")).state;

        let step = gate.apply(state.clone(), &ApplyOptions::default(), &StubSync::ok());
        match &step.result {
            Err(BootkitError::Halted { reason }) => assert_eq!(reason, "bad deploy"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(step.state, state);
        assert!(!fs.exists(Path::new("src")));

        let state = gate.resume(state).state;
        let step = gate.apply(state, &ApplyOptions::default(), &StubSync::ok());
        assert!(step.result.is_ok());
    }

    #[test]
    fn stop_twice_is_a_noop() {
        let fs = MemFs::new();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let state = gate.stop(State::new(), None).state;
        let step = gate.stop(state.clone(), Some("again"));
        assert!(!step.result.unwrap());
        assert_eq!(step.state, state);
    }

    #[test]
    fn apply_sync_failure_keeps_earlier_results() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let sync = StubSync::failing();

        let step = gate.apply(at_stage(Stage::C), &ApplyOptions::default(), &sync);
        assert!(matches!(step.result, Err(BootkitError::WrapperSyncFailed(_))));
        assert_eq!(sync.calls.get(), 1);
        assert!(step.state.stage_c.scaffolded);
        assert!(step.state.stage_c.manifest_updated);
        assert!(!step.state.stage_c.wrappers_synced);
        assert!(step.state.last_event(events::WRAPPER_SYNC_FAILED).is_some());
        assert!(fs.file("src/backend/README.md").is_some());
        assert!(fs.file(MANIFEST).is_some());
    }

    #[test]
    fn apply_require_stage_a_strict_blocks_on_warnings() {
        let fs = project().with_file(
            "docs/requirements/domain-glossary.md",
            "## Terms\n- Invoice: TODO\n",
        );
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let sync = StubSync::ok();

        let lenient = ApplyOptions {
            require_stage_a: Some(Strictness::Lenient),
            ..ApplyOptions::default()
        };
        assert!(gate.apply(at_stage(Stage::C), &lenient, &sync).result.is_ok());

        let strict = ApplyOptions {
            require_stage_a: Some(Strictness::Strict),
            ..ApplyOptions::default()
        };
        let before = at_stage(Stage::C);
        let step = gate.apply(before.clone(), &strict, &sync);
        assert!(matches!(
            step.result,
            Err(BootkitError::PrerequisiteMissing { .. })
        ));
        assert_eq!(step.state, before);
    }

    #[test]
    fn retention_review_requires_synced_wrappers() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let step = gate.review_skill_retention(at_stage(Stage::C));
        assert!(matches!(
            step.result,
            Err(BootkitError::PrerequisiteMissing { .. })
        ));
    }

    #[test]
    fn stage_c_approval_checks_manifest_is_current() {
        let fs = project();
        let cfg = Config::default();
        let gate = Gate::new(Path::new("."), &fs, &cfg);
        let sync = StubSync::ok();

        let state = gate
            .apply(at_stage(Stage::C), &ApplyOptions::default(), &sync)
            .state;
        let state = gate.review_skill_retention(state).state;

        fs.insert_file(
            BLUEPRINT,
            VALID_BLUEPRINT.replace(r#""database"]"#, r#""database", "api"]"#),
        );
        let step = gate.approve(state, Stage::C, None);
        assert!(matches!(step.result, Err(BootkitError::StaleStage { .. })));
        assert!(!step.state.stage_c.manifest_updated);
        assert!(!step.state.stage_c.wrappers_synced);
        assert!(step.state.stage_c.scaffolded);
        assert_eq!(step.state.stage, Stage::C);

        let state = gate
            .apply(step.state, &ApplyOptions::default(), &sync)
            .state;
        let step = gate.approve(state, Stage::C, Some("dana"));
        assert_eq!(step.result.unwrap(), Stage::Complete);
        assert!(step.state.stage_c.user_approved);
        assert_eq!(sync.calls.get(), 2);
    }

    #[test]
    fn next_action_follows_progress() {
        let mut state = State::new();
        assert!(next_action(&state).contains("check-docs"));
        state.stage = Stage::C;
        state.stage_c.wrappers_synced = true;
        assert!(next_action(&state).contains("review-skill-retention"));
        state.record(events::EMERGENCY_STOP, "paused");
        assert!(next_action(&state).contains("resume"));
    }
}
