use crate::cmd::Session;
use crate::output::print_json;
use anyhow::Context;
use bootkit_core::kit;
use std::path::Path;

pub fn run(root: &Path, language: Option<&str>, json: bool) -> anyhow::Result<()> {
    let outcome = kit::start(root, language).context("failed to start pipeline")?;

    if json {
        return print_json(&serde_json::json!({
            "created": outcome.created,
            "stage": outcome.state.stage,
            "language": outcome.state.language,
        }));
    }

    if outcome.created {
        println!("Started bootkit in {}", root.display());
        println!("  created: .bootkit/state.yaml");
        println!("  created: .bootkit/config.yaml");
        println!("  created: .bootkit/.kit-marker");
    } else {
        println!("bootkit already started (stage {}).", outcome.state.stage);
        if let (Some(requested), Some(current)) = (language, outcome.state.language.as_deref()) {
            if requested != current {
                println!("  language stays '{current}'");
            }
        }
    }
    Ok(())
}

pub fn set_language(root: &Path, language: &str, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    session.step(|gate, state| gate.set_language(state, language))?;

    let current = session.state.language.clone().unwrap_or_default();
    if json {
        print_json(&serde_json::json!({ "language": current }))
    } else {
        println!("Language: {current}");
        Ok(())
    }
}
