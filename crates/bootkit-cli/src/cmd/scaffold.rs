use crate::cmd::Session;
use crate::output::{print_json, print_table};
use bootkit_core::scaffold::{OpStatus, ScaffoldPlan};
use std::path::Path;

pub fn run(root: &Path, apply: bool, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let plan = session.step(|gate, state| gate.scaffold(state, apply))?;

    if json {
        return print_json(&plan);
    }
    print_plan(&plan);
    if !apply && plan.count(OpStatus::DryRun) > 0 {
        println!("Dry run. Re-run with --apply to create these paths.");
    }
    Ok(())
}

pub fn print_plan(plan: &ScaffoldPlan) {
    let rows = plan
        .ops
        .iter()
        .map(|op| {
            vec![
                op.op.to_string(),
                op.path.display().to_string(),
                op.status.to_string(),
            ]
        })
        .collect();
    print_table(&["OP", "PATH", "STATUS"], rows);
    println!(
        "{} applied, {} dry-run, {} skipped",
        plan.count(OpStatus::Applied),
        plan.count(OpStatus::DryRun),
        plan.count(OpStatus::SkippedExists)
    );
}
