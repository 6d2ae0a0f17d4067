use crate::cmd::Session;
use crate::output::print_json;
use bootkit_core::manifest::ManifestUpdate;
use std::path::Path;

pub fn run(root: &Path, apply: bool, json: bool) -> anyhow::Result<()> {
    let mut session = Session::open(root)?;
    let update = session.step(|gate, state| gate.manifest(state, apply))?;

    if json {
        return print_json(&update);
    }
    print_update(&update);
    Ok(())
}

pub fn print_update(update: &ManifestUpdate) {
    println!("Manifest {}: {}", update.path.display(), update.status);
    println!("  includePrefixes: {}", update.include_prefixes.join(", "));
    if update.migrated_legacy {
        println!("  converted legacy include/exclude layout");
    }
    for w in &update.warnings {
        println!("[warning] {w}");
    }
}
