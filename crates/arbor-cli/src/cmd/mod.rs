pub mod add;
pub mod check;
pub mod classify;
pub mod completions;
pub mod init;
pub mod move_cmd;
pub mod tree;

use crate::output::{CliError, OutputMode, fail};
use arbor_core::config::{ProjectConfig, board_path};
use arbor_core::error::ErrorCode;
use arbor_core::model::ProjectId;
use arbor_core::repo::JsonFileRepository;
use std::path::PathBuf;

/// Everything a command needs besides its own arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub output: OutputMode,
    pub project: ProjectId,
    pub config: ProjectConfig,
}

/// Open `.arbor/board.json`, rendering a not-initialized error if missing.
pub fn open_board(ctx: &Context) -> anyhow::Result<JsonFileRepository> {
    let path = board_path(&ctx.root);
    JsonFileRepository::open(&path).or_else(|_| {
        fail(
            ctx.output,
            &CliError::from_code(
                ErrorCode::NotInitialized,
                format!("no board at {}", path.display()),
            ),
        )
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A context rooted in `root` with default config and JSON output.
    pub fn context(root: &std::path::Path) -> Context {
        Context {
            root: root.to_path_buf(),
            output: OutputMode::Json,
            project: ProjectId::new("default"),
            config: ProjectConfig::default(),
        }
    }
}
