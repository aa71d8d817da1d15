use super::Context;
use anyhow::{Context as _, Result};
use arbor_core::config::{ARBOR_DIR, board_path, config_path};
use arbor_core::repo::JsonFileRepository;
use clap::Args;
use serde::Serialize;
use tracing::info;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing board with an empty one.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[ordering]\n\
    # Gap between keys when appending or respacing a sibling list.\n\
    spacing = 1000.0\n\
    \n\
    [board]\n\
    default_project = \"default\"\n";

#[derive(Debug, Serialize)]
struct InitReport {
    board: String,
    config: String,
    config_written: bool,
}

/// Execute `arbor init`:
///
/// ```text
/// .arbor/
///   board.json    (empty board, both collections)
///   config.toml   (default ordering and board settings)
/// ```
///
/// An existing `config.toml` is kept, even with `--force`.
///
/// # Errors
///
/// Returns an error if `.arbor/board.json` already exists and `--force` is
/// not set, or if any filesystem operation fails.
pub fn run_init(args: &InitArgs, ctx: &Context) -> Result<()> {
    let board = board_path(&ctx.root);
    if board.exists() && !args.force {
        anyhow::bail!("{ARBOR_DIR}/ already exists. Use `arbor init --force` to reinitialize.");
    }

    JsonFileRepository::create(&board)
        .with_context(|| format!("Failed to create board: {}", board.display()))?;

    let config = config_path(&ctx.root);
    let config_written = !config.exists();
    if config_written {
        std::fs::write(&config, CONFIG_TOML)
            .with_context(|| format!("Failed to write config: {}", config.display()))?;
    }
    info!(path = %board.display(), "initialized board");

    let report = InitReport {
        board: board.display().to_string(),
        config: config.display().to_string(),
        config_written,
    };
    crate::output::render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Initialized {ARBOR_DIR}/")?;
        writeln!(w, "  Board:  {}", r.board)?;
        writeln!(w, "  Config: {}", r.config)?;
        writeln!(w)?;
        writeln!(w, "Next: arbor add --title \"First task\"")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::context;
    use arbor_core::config::load_project_config;
    use arbor_core::repo::ItemRepository;

    #[test]
    fn creates_board_and_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        run_init(&InitArgs { force: false }, &ctx).unwrap();

        let repo = JsonFileRepository::open(board_path(dir.path())).unwrap();
        assert!(repo.snapshot(&ctx.project).unwrap().items.is_empty());

        let config = load_project_config(dir.path()).unwrap();
        assert!((config.ordering.spacing - 1000.0).abs() < f64::EPSILON);
        assert_eq!(config.board.default_project, "default");
    }

    #[test]
    fn refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(dir.path());
        run_init(&InitArgs { force: false }, &ctx).unwrap();
        assert!(run_init(&InitArgs { force: false }, &ctx).is_err());
        assert!(run_init(&InitArgs { force: true }, &ctx).is_ok());
    }
}
