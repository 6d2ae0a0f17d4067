use crate::cmd::Session;
use crate::output::{print_json, print_report};
use std::path::Path;

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let check = session.step(|gate, state| gate.validate_blueprint(state))?;

    if json {
        print_json(&serde_json::json!({
            "ok": check.report.ok,
            "errors": check.report.errors,
            "warnings": check.report.warnings,
            "validated": session.state.stage_b.validated,
        }))?;
    } else {
        print_report("Blueprint", &check.report);
    }

    if !check.report.ok {
        anyhow::bail!("blueprint does not pass: {}", check.report.summary());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// suggest-packs
// ---------------------------------------------------------------------------

pub fn suggest_packs(root: &Path, write: bool, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let suggestion = session.step(|gate, state| gate.suggest_packs(state, write))?;

    if json {
        return print_json(&suggestion);
    }

    println!("Current:     {}", list(&suggestion.current));
    println!("Recommended: {}", list(&suggestion.recommended));
    println!("Missing:     {}", list(&suggestion.missing));
    if suggestion.written {
        println!("Blueprint updated: {}", list(&suggestion.packs));
    } else if !suggestion.missing.is_empty() {
        println!("Run 'bootkit suggest-packs --write' to add the missing packs.");
    }
    Ok(())
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
