use std::sync::Arc;

use async_graphql::{Error, ErrorExtensions};
use sea_orm::DbErr;
use thiserror::Error;

/// Shared engine result type.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("database error")]
    Db(Arc<DbErr>),
    #[error("internal error")]
    Internal(Arc<anyhow::Error>),
}

impl EngineError {
    fn code(&self) -> &'static str {
        match self {
            EngineError::Conflict(_) => "CONFLICT",
            EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::Db(_) => "INTERNAL",
            EngineError::Internal(_) => "INTERNAL",
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::Internal(Arc::new(err))
    }

    /// True for the 4xx-equivalent taxonomy surfaced to API callers.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Conflict(_)
                | EngineError::InvalidTransition { .. }
                | EngineError::NotFound(_)
        )
    }
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        Self::Db(Arc::new(value))
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(value: anyhow::Error) -> Self {
        Self::internal(value)
    }
}

impl ErrorExtensions for EngineError {
    fn extend(&self) -> Error {
        // Internal detail (db text included) stays in the logs, not the payload.
        if let EngineError::Db(err) = self {
            tracing::error!(error = %err, "engine database error");
        }
        let mut out = Error::new(self.to_string());
        out = out.extend_with(|_err, e| e.set("code", self.code()));
        out
    }
}
