use crate::output::{print_json, print_table, yes_no};
use anyhow::Context;
use bootkit_core::gate::next_action;
use bootkit_core::state::State;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = State::require(root).context("failed to load state")?;
    let next = next_action(&state);

    if json {
        #[derive(serde::Serialize)]
        struct StatusOutput<'a> {
            halted: bool,
            next: &'a str,
            #[serde(flatten)]
            state: &'a State,
        }

        return print_json(&StatusOutput {
            halted: state.halted().is_some(),
            next: &next,
            state: &state,
        });
    }

    println!("Stage:    {} ({})", state.stage, state.stage.title());
    println!(
        "Language: {}",
        state.language.as_deref().unwrap_or("(unset)")
    );
    if let Some(stop) = state.halted() {
        println!("Halted:   yes, since {} ({})", stop.timestamp.format("%Y-%m-%d %H:%M"), stop.details);
    }
    println!();

    let a = &state.stage_a;
    let b = &state.stage_b;
    let c = &state.stage_c;
    let answered = a.requirements.values().filter(|r| r.answered).count();
    let rows = vec![
        vec!["A".into(), "validated".into(), yes_no(a.validated)],
        vec![
            "A".into(),
            "requirements answered".into(),
            format!("{answered}/{}", a.requirements.len()),
        ],
        vec!["A".into(), "user_approved".into(), yes_no(a.user_approved)],
        vec!["B".into(), "validated".into(), yes_no(b.validated)],
        vec!["B".into(), "packs_reviewed".into(), yes_no(b.packs_reviewed)],
        vec!["B".into(), "user_approved".into(), yes_no(b.user_approved)],
        vec!["C".into(), "scaffolded".into(), yes_no(c.scaffolded)],
        vec!["C".into(), "manifest_updated".into(), yes_no(c.manifest_updated)],
        vec!["C".into(), "wrappers_synced".into(), yes_no(c.wrappers_synced)],
        vec![
            "C".into(),
            "skill_retention_reviewed".into(),
            yes_no(c.skill_retention_reviewed),
        ],
        vec!["C".into(), "user_approved".into(), yes_no(c.user_approved)],
    ];
    print_table(&["STAGE", "CHECKPOINT", "DONE"], rows);

    if let Some(last) = state.history.last() {
        println!();
        println!("Last event: {} ({})", last.event, last.timestamp.format("%Y-%m-%d %H:%M"));
    }
    println!("Next: {next}");
    Ok(())
}
