use crate::cmd::Session;
use crate::output::{print_json, print_report};
use bootkit_core::report::Strictness;
use std::path::Path;

pub fn run(root: &Path, strict: bool, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let strictness = Strictness::from_flag(strict || session.config.strict_docs);
    let check = session.step(|gate, state| gate.check_docs(state, strictness))?;

    if json {
        print_json(&serde_json::json!({
            "ok": check.report.ok,
            "strictness": check.report.strictness,
            "errors": check.report.errors,
            "warnings": check.report.warnings,
            "requirement_ids": check.requirement_ids,
            "validated": session.state.stage_a.validated,
        }))?;
    } else {
        print_report("Stage A documents", &check.report);
        if !check.requirement_ids.is_empty() {
            let ids: Vec<&str> = check.requirement_ids.iter().map(String::as_str).collect();
            println!("Requirements: {}", ids.join(", "));
        }
    }

    if !check.report.ok {
        anyhow::bail!("stage A documents do not pass: {}", check.report.summary());
    }
    Ok(())
}
