mod cmd;
mod output;
mod root;

use bootkit_core::types::Stage;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bootkit",
    about = "Gated pipeline from requirements to blueprint to scaffolded project",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .bootkit/ or .git/)
    #[arg(long, global = true, env = "BOOTKIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pipeline in this project
    Start {
        /// Project language, if already decided
        #[arg(long)]
        language: Option<String>,
    },

    /// Set the project language (once)
    SetLanguage { language: String },

    /// Show pipeline progress and the next step
    Status,

    /// Check the Stage A requirement documents
    CheckDocs {
        /// Treat warnings (TODO, TBD, ...) as failures
        #[arg(long)]
        strict: bool,
    },

    /// Validate the Stage B blueprint
    Validate,

    /// Compare the blueprint's skill packs with the recommended set
    SuggestPacks {
        /// Add missing recommended packs to the blueprint
        #[arg(long)]
        write: bool,
    },

    /// Plan (or with --apply, create) the project skeleton
    Scaffold {
        #[arg(long)]
        apply: bool,
    },

    /// Reconcile the skill manifest with the blueprint's packs
    Manifest {
        #[arg(long)]
        apply: bool,
    },

    /// Scaffold, reconcile the manifest and sync provider wrappers
    Apply {
        /// Comma-separated providers (default: from config)
        #[arg(long, value_delimiter = ',')]
        providers: Option<Vec<String>>,

        /// Require the Stage A documents to pass first
        #[arg(long, conflicts_with = "require_stage_a_strict")]
        require_stage_a: bool,

        /// Require the Stage A documents to pass with zero warnings first
        #[arg(long)]
        require_stage_a_strict: bool,
    },

    /// Approve the current stage and advance
    Approve {
        /// Stage being approved: A, B or C
        #[arg(long)]
        stage: Stage,

        /// Who approved
        #[arg(long)]
        by: Option<String>,
    },

    /// Record that the synced skill set has been reviewed
    ReviewSkillRetention,

    /// Halt the pipeline; every mutating command is refused until resume
    Stop {
        #[arg(long)]
        reason: Option<String>,
    },

    /// Lift an emergency stop
    Resume,

    /// Remove (or archive) the .bootkit/ directory after completion
    Cleanup {
        /// Move to docs/archive/ instead of deleting
        #[arg(long)]
        archive: bool,

        /// Confirm the removal
        #[arg(long = "i-understand")]
        i_understand: bool,

        /// Report what would happen without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect the kit configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Start { language } => cmd::start::run(&root, language.as_deref(), json),
        Commands::SetLanguage { language } => cmd::start::set_language(&root, &language, json),
        Commands::Status => cmd::status::run(&root, json),
        Commands::CheckDocs { strict } => cmd::docs::run(&root, strict, json),
        Commands::Validate => cmd::blueprint::validate(&root, json),
        Commands::SuggestPacks { write } => cmd::blueprint::suggest_packs(&root, write, json),
        Commands::Scaffold { apply } => cmd::scaffold::run(&root, apply, json),
        Commands::Manifest { apply } => cmd::manifest::run(&root, apply, json),
        Commands::Apply {
            providers,
            require_stage_a,
            require_stage_a_strict,
        } => cmd::apply::run(
            &root,
            providers,
            require_stage_a,
            require_stage_a_strict,
            json,
        ),
        Commands::Approve { stage, by } => cmd::approve::run(&root, stage, by.as_deref(), json),
        Commands::ReviewSkillRetention => cmd::approve::review_skill_retention(&root, json),
        Commands::Stop { reason } => cmd::halt::stop(&root, reason.as_deref(), json),
        Commands::Resume => cmd::halt::resume(&root, json),
        Commands::Cleanup {
            archive,
            i_understand,
            dry_run,
        } => cmd::cleanup::run(&root, archive, i_understand, dry_run, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
