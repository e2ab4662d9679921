//! Error types and handling for the session core
//!
//! Synchronous entry points only return precondition errors; every failure
//! of asynchronous origin is reported through `SessionListener::on_error`
//! and never returned across a callback boundary.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by session operations and event processing
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// An operation requiring a live channel was invoked before
    /// `register()` or after `unregister()`
    #[error("session is not registered with the transport")]
    NotRegistered,

    /// An asynchronous transport action reported failure; delivered to
    /// listeners via `on_error`, never returned to the caller
    #[error("{action} failed: {source}")]
    ActionFailed {
        action: &'static str,
        source: TransportError,
    },

    /// An incoming transport event could not be processed; the router
    /// stays operational for subsequent events
    #[error("event processing failed: {reason}")]
    EventProcessingFailed { reason: String },

    /// A malformed connect target or session setting
    #[error("invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// The builder was finalized without a required part
    #[error("missing required configuration: {field}")]
    MissingConfiguration { field: String },
}

impl SessionError {
    /// Create an action failure for a transport-reported error
    pub fn action_failed(action: &'static str, source: TransportError) -> Self {
        Self::ActionFailed { action, source }
    }

    /// Create an event processing failure
    pub fn event_processing(reason: impl Into<String>) -> Self {
        Self::EventProcessingFailed {
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        match self {
            SessionError::ActionFailed { source, .. } => source.is_recoverable(),
            SessionError::EventProcessingFailed { .. } => true,
            SessionError::NotRegistered
            | SessionError::InvalidConfiguration { .. }
            | SessionError::MissingConfiguration { .. } => false,
        }
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            SessionError::NotRegistered => "precondition",
            SessionError::ActionFailed { .. } => "transport",
            SessionError::EventProcessingFailed { .. } => "event",
            SessionError::InvalidConfiguration { .. }
            | SessionError::MissingConfiguration { .. } => "configuration",
        }
    }
}
