//! Error taxonomy for the carbon agent core
//!
//! The core never retries: meter-session misuse and unknown workloads are
//! surfaced to the caller as-is, and reliability concerns (flaky meters,
//! store backoff) belong to the collaborator implementations.

use thiserror::Error;

/// Errors surfaced by the reasoning core and its collaborator seams
#[derive(Debug, Error)]
pub enum AgentError {
    /// The workload id has never been registered
    #[error("workload {workload_id} not found")]
    WorkloadNotFound { workload_id: String },

    /// A measurement session is already active for this workload
    #[error("emissions tracking already active for workload {workload_id}")]
    AlreadyTracking { workload_id: String },

    /// No measurement session is active for this workload
    #[error("no active emissions tracking for workload {workload_id}")]
    NotTracking { workload_id: String },

    /// The workload context violates a documented invariant
    #[error("invalid workload context for {workload_id}: {reason}")]
    InvalidWorkload { workload_id: String, reason: String },

    /// Failure from a collaborator or a measured unit of work,
    /// passed through unchanged
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgentError {
    /// Error code used in API responses and log events
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::WorkloadNotFound { .. } => "not_found",
            AgentError::AlreadyTracking { .. } => "already_tracking",
            AgentError::NotTracking { .. } => "not_tracking",
            AgentError::InvalidWorkload { .. } => "invalid_workload",
            AgentError::Other(_) => "internal",
        }
    }
}

/// Convenience alias for fallible core operations
pub type Result<T> = std::result::Result<T, AgentError>;
