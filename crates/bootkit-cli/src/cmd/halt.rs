use crate::cmd::Session;
use crate::output::print_json;
use std::path::Path;

pub fn stop(root: &Path, reason: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let halted = session.step(|gate, state| gate.stop(state, reason))?;

    if json {
        return print_json(&serde_json::json!({ "halted": true, "changed": halted }));
    }
    if halted {
        println!("Pipeline halted. Run 'bootkit resume' to continue.");
    } else {
        println!("Pipeline is already halted.");
    }
    Ok(())
}

pub fn resume(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let resumed = session.step(|gate, state| gate.resume(state))?;

    if json {
        return print_json(&serde_json::json!({ "halted": false, "changed": resumed }));
    }
    if resumed {
        println!("Pipeline resumed at stage {}.", session.state.stage);
    } else {
        println!("Pipeline was not halted.");
    }
    Ok(())
}
