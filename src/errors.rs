//! Typed error hierarchy for the audit orchestrator.
//!
//! Worker, completion and summary errors are always recovered inside a run
//! and turned into data (zero confidence, fallback text). `SynthesisError` is
//! the only one that escapes `Coordinator::orchestrate`.

use std::time::Duration;

use thiserror::Error;

use crate::bus::CorrelationId;
use crate::coordinator::RunState;

/// Failure of a single worker's `analyze` call.
///
/// Caught per worker by the coordinator and converted into a degraded
/// findings record; never propagates out of a run.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0}")]
    Failed(String),

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("returned findings for '{actual}' instead of '{expected}'")]
    IdentityMismatch { expected: String, actual: String },

    #[error("reported a non-finite confidence")]
    InvalidConfidence,

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkerError {
    /// Convenience constructor for ad-hoc failures.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors from the text/vision completion collaborator.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API credential configured (set {env_var})")]
    MissingCredential { env_var: String },

    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion response did not contain any text")]
    EmptyResponse,

    #[error("completion response was malformed: {0}")]
    Malformed(String),

    #[error("completion unavailable: {0}")]
    Unavailable(String),
}

/// Failure to produce an AI-written executive summary.
///
/// Always replaced by the deterministic fallback summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("summary text was empty")]
    EmptySummary,
}

/// Invariant violation while synthesizing the report.
///
/// This indicates a bug in the orchestration core, not a worker failure.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("expected {expected} findings records but collected {actual}")]
    FindingsCountMismatch { expected: usize, actual: usize },

    #[error("findings at position {position} belong to '{actual}', expected '{expected}'")]
    UnexpectedWorker {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("confidence {confidence} for worker '{worker_id}' is outside [0, 1]")]
    InvalidConfidence { worker_id: String, confidence: f64 },

    #[error("illegal run state transition {from} -> {to}")]
    IllegalTransition { from: RunState, to: RunState },
}

/// Errors from the question/response broker.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no response to {correlation_id} within {}ms", .timeout.as_millis())]
    TimedOut {
        correlation_id: CorrelationId,
        timeout: Duration,
    },

    #[error("request {correlation_id} was dropped before a response arrived")]
    Closed { correlation_id: CorrelationId },
}

/// Errors raised while registering workers with a coordinator.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("a worker with id '{0}' is already registered")]
    DuplicateWorker(String),

    #[error("worker id '{0}' is reserved")]
    ReservedId(String),

    #[error("worker id must not be empty")]
    EmptyId,
}

/// Invalid page context input.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page URL must not be empty")]
    EmptyUrl,

    #[error("invalid viewport '{0}' (expected WIDTHxHEIGHT with non-zero dimensions)")]
    InvalidViewport(String),

    #[error("failed to read screenshot {path}: {source}")]
    ScreenshotRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_error_timed_out_reports_seconds() {
        let err = WorkerError::TimedOut(Duration::from_secs(120));
        assert_eq!(err.to_string(), "timed out after 120s");
    }

    #[test]
    fn worker_error_converts_from_completion_error() {
        let inner = CompletionError::MissingCredential {
            env_var: "PAGEAUDIT_API_KEY".to_string(),
        };
        let err: WorkerError = inner.into();
        match &err {
            WorkerError::Completion(CompletionError::MissingCredential { env_var }) => {
                assert_eq!(env_var, "PAGEAUDIT_API_KEY");
            }
            _ => panic!("Expected WorkerError::Completion(MissingCredential)"),
        }
        assert!(err.to_string().contains("PAGEAUDIT_API_KEY"));
    }

    #[test]
    fn synthesis_error_count_mismatch_carries_counts() {
        let err = SynthesisError::FindingsCountMismatch {
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn illegal_transition_names_both_states() {
        let err = SynthesisError::IllegalTransition {
            from: RunState::Idle,
            to: RunState::Complete,
        };
        let msg = err.to_string();
        assert!(msg.contains("IDLE"));
        assert!(msg.contains("COMPLETE"));
    }

    #[test]
    fn summary_error_wraps_completion_error() {
        let err: SummaryError = CompletionError::EmptyResponse.into();
        assert!(matches!(
            err,
            SummaryError::Completion(CompletionError::EmptyResponse)
        ));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&WorkerError::failed("x"));
        assert_std_error(&CompletionError::EmptyResponse);
        assert_std_error(&SummaryError::EmptySummary);
        assert_std_error(&RegistrationError::EmptyId);
        assert_std_error(&PageError::EmptyUrl);
        assert_std_error(&RequestError::Closed {
            correlation_id: CorrelationId::from("w-1"),
        });
    }
}
