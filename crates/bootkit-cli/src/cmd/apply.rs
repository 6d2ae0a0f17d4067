use crate::cmd::manifest::print_update;
use crate::cmd::scaffold::print_plan;
use crate::cmd::Session;
use crate::output::print_json;
use bootkit_core::gate::ApplyOptions;
use bootkit_core::report::Strictness;
use bootkit_core::wrapper_sync::ProcessWrapperSync;
use std::path::Path;

pub fn run(
    root: &Path,
    providers: Option<Vec<String>>,
    require_stage_a: bool,
    require_stage_a_strict: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let sync = ProcessWrapperSync::from_config(&session.config.wrapper_sync);

    let require_stage_a = if require_stage_a_strict {
        Some(Strictness::Strict)
    } else if require_stage_a {
        Some(Strictness::Lenient)
    } else {
        None
    };
    let options = ApplyOptions {
        providers: providers.map(|list| {
            list.into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        }),
        require_stage_a,
    };

    let report = session.step(|gate, state| gate.apply(state, &options, &sync))?;

    if json {
        return print_json(&report);
    }
    print_plan(&report.scaffold);
    println!();
    print_update(&report.manifest);
    println!();
    println!("Wrappers synced for: {}", report.providers.join(", "));
    println!("Next: review the synced skills, then run 'bootkit review-skill-retention'.");
    Ok(())
}
