#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use arbor_core::error::ErrorCode;
use output::{CliError, OutputMode};
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "arbor: ordered work-item trees with drag-to-reorder",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides FORMAT and user config).
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Project to operate on (defaults to `board.default_project`).
    #[arg(long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// The explicitly requested output mode, if any. `--json` wins.
    fn output_flag(&self) -> Option<&'static str> {
        if self.json {
            Some(OutputMode::Json.as_str())
        } else {
            self.format.map(OutputMode::as_str)
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize an arbor board",
        long_about = "Create .arbor/board.json and a default .arbor/config.toml in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a board here\n    arbor init\n\n    # Start over with an empty board\n    arbor init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Add a work item",
        long_about = "Add a work item at the end of its sibling list.",
        after_help = "EXAMPLES:\n    # Add a top-level task\n    arbor add --title \"Write parser\"\n\n    # Add a work package and a member\n    arbor add --title \"Release 1\" --kind group-root\n    arbor add --title \"Tag build\" --group ar-1a2b3c\n\n    # Nest under another task\n    arbor add --title \"Lexer\" --parent ar-4d5e6f --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the ordered tree",
        long_about = "Print every node of the project in depth-first render order.",
        after_help = "EXAMPLES:\n    # Indented tree\n    arbor tree --format pretty\n\n    # Tab-separated rows\n    arbor tree --format text\n\n    # Emit machine-readable output\n    arbor tree --json"
    )]
    Tree(cmd::tree::TreeArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Move a node relative to another",
        long_about = "Drop DRAGGED before, after or inside TARGET, exactly as a drag gesture would.",
        after_help = "EXAMPLES:\n    # Reorder among siblings\n    arbor move ar-1a2b3c ar-4d5e6f --intent before\n\n    # Reparent under a node\n    arbor move ar-1a2b3c ar-4d5e6f --intent inside --json"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Read",
        about = "Classify a pointer position over a row",
        long_about = "Report the drop zone a pointer at POINTER_Y would select while dragging DRAGGED over TARGET.",
        after_help = "EXAMPLES:\n    # Middle of a 20px row starting at y=100\n    arbor classify ar-1a2b3c ar-4d5e6f --top 100 --height 20 --pointer-y 110"
    )]
    Classify(cmd::classify::ClassifyArgs),

    #[command(
        next_help_heading = "Read",
        about = "Check the board for structural problems",
        long_about = "Report cycles, dangling pointers, nested group roots, duplicate ids and duplicate sibling keys.",
        after_help = "EXAMPLES:\n    # Check the default project\n    arbor check\n\n    # Emit machine-readable output\n    arbor check --json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    arbor completions bash > ~/.local/share/bash-completion/completions/arbor"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ARBOR_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "arbor=debug,info"
        } else {
            "arbor=info,warn"
        })
    });

    let format = env::var("ARBOR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Output mode when the config files could not be read: flag, then env.
fn fallback_output(flag: Option<&str>, env_format: Option<&str>) -> OutputMode {
    flag.or(env_format)
        .map_or(OutputMode::Text, |name| OutputMode::from_name(&name.trim().to_ascii_lowercase()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let effective = match arbor_core::config::resolve_config(&project_root, cli.output_flag()) {
        Ok(effective) => effective,
        Err(err) => {
            let mode = fallback_output(cli.output_flag(), env::var("FORMAT").ok().as_deref());
            return output::fail(
                mode,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            );
        }
    };
    let output = OutputMode::from_name(&effective.resolved_output);
    debug!(output = output.as_str(), "resolved output mode");

    let project = cli
        .project
        .as_deref()
        .map_or_else(|| effective.project.board.project(), arbor_core::model::ProjectId::new);
    let ctx = cmd::Context {
        root: project_root,
        output,
        project,
        config: effective.project,
    };

    if cli.verbose {
        info!(project = %ctx.project, "verbose mode enabled");
    }

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, &ctx),
        Commands::Add(args) => cmd::add::run_add(&args, &ctx),
        Commands::Tree(args) => cmd::tree::run_tree(&args, &ctx),
        Commands::Move(args) => cmd::move_cmd::run_move(&args, &ctx),
        Commands::Classify(args) => cmd::classify::run_classify(&args, &ctx),
        Commands::Check(args) => cmd::check::run_check(&args, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}
