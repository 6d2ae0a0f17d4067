use crate::cmd::Session;
use crate::output::print_json;
use bootkit_core::types::Stage;
use std::path::Path;

pub fn run(root: &Path, stage: Stage, by: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let next = session.step(|gate, state| gate.approve(state, stage, by))?;

    if json {
        print_json(&serde_json::json!({ "approved": stage, "stage": next }))
    } else {
        println!("Stage {stage} approved. Now at stage {next} ({}).", next.title());
        Ok(())
    }
}

pub fn review_skill_retention(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    session.step(|gate, state| gate.review_skill_retention(state))?;

    if json {
        print_json(&serde_json::json!({ "skill_retention_reviewed": true }))
    } else {
        println!("Skill retention review recorded.");
        Ok(())
    }
}
