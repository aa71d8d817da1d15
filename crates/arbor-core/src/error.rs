use std::fmt;

use crate::model::ItemId;
use crate::repo::RepositoryError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ItemNotFound,
    InvalidMove,
    CycleDetected,
    RepositoryFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ItemNotFound => "E2001",
            Self::InvalidMove => "E2002",
            Self::CycleDetected => "E2003",
            Self::RepositoryFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Board not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ItemNotFound => "Item not found",
            Self::InvalidMove => "Move not allowed",
            Self::CycleDetected => "Cycle would be created",
            Self::RepositoryFailure => "Repository write failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `arbor init` to create a board here."),
            Self::ConfigParseError => Some("Fix syntax in .arbor/config.toml and retry."),
            Self::ItemNotFound => {
                Some("Check the id with `arbor tree`; items outside the project cannot move.")
            }
            Self::InvalidMove => {
                Some("Group roots only reorder among top-level nodes; drop beside, not inside.")
            }
            Self::CycleDetected => Some("Pick a target that is not inside the dragged subtree."),
            Self::RepositoryFailure => {
                Some("The move was not stored. Retry once the board is writable.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why a move was refused or failed.
///
/// Everything except [`MoveError::Repository`] is detected before any write
/// and is not worth retrying.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// A node, or the context a node sits in, is not in the project scope.
    #[error("item not found: '{id}'")]
    NotFound { id: ItemId },

    /// Self-move or structurally forbidden nesting.
    #[error("invalid move of '{id}': {reason}")]
    InvalidMove { id: ItemId, reason: &'static str },

    /// The target sits inside the dragged subtree.
    #[error("moving '{dragged}' into '{target}' would create a cycle")]
    CycleDetected { dragged: ItemId, target: ItemId },

    /// The commit failed; none of the move's writes were stored.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl MoveError {
    pub(crate) fn not_found(id: &ItemId) -> Self {
        Self::NotFound { id: id.clone() }
    }

    pub(crate) fn invalid(id: &ItemId, reason: &'static str) -> Self {
        Self::InvalidMove {
            id: id.clone(),
            reason,
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ItemNotFound,
            Self::InvalidMove { .. } => ErrorCode::InvalidMove,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::Repository(_) => ErrorCode::RepositoryFailure,
        }
    }

    /// `true` for gestures the engine refuses (as opposed to a failed write).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Repository(_))
    }
}
