//! Caller-visible error taxonomy (spec §6/§7).
//!
//! Posting-list iteration failure is modelled as `Option::None` / `false`
//! from the directional queries, not as an `EngineError` — only the
//! compression layer can hit true data corruption (§7). `EmptyList` and
//! `Exhausted` are normal iteration endings and never appear here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("shutting down")]
    ShuttingDown,

    #[error("access denied to user {user_id}: {reason}")]
    AccessDenied { user_id: u64, reason: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("read-only: {0}")]
    ReadOnly(String),

    #[error("concurrent update detected: {0}")]
    ConcurrentUpdate(String),

    #[error("query cancelled")]
    Cancelled,

    #[error("corrupted frame: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }

    pub fn corrupted(msg: impl Into<String>) -> Self {
        EngineError::Corrupted(msg.into())
    }

    /// Fatal-for-that-list errors (§7): unknown tag, truncated payload, a
    /// decoder that would have to read past the frame's declared length.
    pub fn is_fatal_for_list(&self) -> bool {
        matches!(self, EngineError::Corrupted(_) | EngineError::Internal(_))
    }
}
