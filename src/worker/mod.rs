//! Worker contract for page analysis units.
//!
//! A worker has an immutable [`WorkerIdentity`] and implements
//! [`AuditWorker::analyze`]. During a run it talks to the rest of the system
//! only through the [`WorkerReporter`] the coordinator hands it: progress
//! updates and questions go out on the shared bus, and the coordinator itself
//! publishes the final 100% update and the single FINDINGS message.
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use pageaudit::errors::WorkerError;
//! use pageaudit::page::PageContext;
//! use pageaudit::worker::{AuditWorker, Findings, Issue, Severity, WorkerIdentity, WorkerReporter};
//!
//! struct TitleCheck {
//!     identity: WorkerIdentity,
//! }
//!
//! #[async_trait]
//! impl AuditWorker for TitleCheck {
//!     fn identity(&self) -> &WorkerIdentity {
//!         &self.identity
//!     }
//!
//!     async fn analyze(
//!         &self,
//!         page: &PageContext,
//!         reporter: &WorkerReporter,
//!     ) -> Result<Findings, WorkerError> {
//!         reporter.progress(50, "checking title");
//!         let mut findings = Findings::new(&self.identity);
//!         if page.title().is_empty() {
//!             findings = findings.add_issue(Issue::new(Severity::High, "Page has no title"));
//!         }
//!         Ok(findings)
//!     }
//! }
//! ```

pub mod ai;
pub mod findings;
pub mod specialist;

pub use ai::SpecialistWorker;
pub use findings::{Findings, Issue, Severity};
pub use specialist::SpecialistKind;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::{EventBus, MessagePayload, OrchestrationMessage, RequestBroker};
use crate::coordinator::OverallProgress;
use crate::errors::{RequestError, WorkerError};
use crate::page::PageContext;

/// Default bound on how long a worker waits for an answer to a question.
pub const DEFAULT_QUESTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Immutable identity of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerIdentity {
    id: String,
    name: String,
    category: String,
}

impl WorkerIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
        }
    }

    /// Stable identifier, unique within a coordinator.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Audit category (accessibility, seo, ...).
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// An independently executing analysis unit.
///
/// Workers are stateless across runs. Errors returned from `analyze` are
/// caught by the coordinator and turned into degraded findings; a worker
/// calling an AI collaborator should recover from its failures locally and
/// report reduced confidence instead.
#[async_trait]
pub trait AuditWorker: Send + Sync {
    fn identity(&self) -> &WorkerIdentity;

    async fn analyze(
        &self,
        page: &PageContext,
        reporter: &WorkerReporter,
    ) -> Result<Findings, WorkerError>;
}

/// A worker's handle to the bus for one run.
///
/// Enforces the progress contract: published values never decrease, and
/// while the worker is running they stay below 100. Only the coordinator
/// reports 100, right before publishing the worker's findings.
pub struct WorkerReporter {
    identity: WorkerIdentity,
    bus: EventBus,
    broker: Arc<RequestBroker>,
    question_timeout: Duration,
    /// Highest value published; -1 until the first update.
    published: AtomicI16,
    overall: Option<(Arc<OverallProgress>, usize)>,
    run_id: Option<Uuid>,
}

impl WorkerReporter {
    /// Create a reporter publishing on `bus` as `identity`.
    pub fn new(identity: WorkerIdentity, bus: EventBus, broker: Arc<RequestBroker>) -> Self {
        Self {
            identity,
            bus,
            broker,
            question_timeout: DEFAULT_QUESTION_TIMEOUT,
            published: AtomicI16::new(-1),
            overall: None,
            run_id: None,
        }
    }

    pub fn with_question_timeout(mut self, timeout: Duration) -> Self {
        self.question_timeout = timeout;
        self
    }

    /// Feed this worker's progress into the run's blended progress as worker
    /// number `index`.
    pub(crate) fn with_overall(mut self, overall: Arc<OverallProgress>, index: usize) -> Self {
        self.overall = Some((overall, index));
        self
    }

    /// Stamp everything this reporter publishes with `run_id`.
    pub(crate) fn in_run(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    /// Highest progress value published so far.
    pub fn last_progress(&self) -> u8 {
        self.published.load(Ordering::Relaxed).max(0) as u8
    }

    /// Publish a PROGRESS_UPDATE. Values are clamped to 99; a value lower
    /// than one already published is ignored.
    ///
    /// Returns whether an update was published.
    pub fn progress(&self, percent: u8, message: impl Into<String>) -> bool {
        self.advance(percent.min(99), message.into())
    }

    /// Ask a question on the bus and wait for the answer.
    pub async fn ask(&self, topic: &str, body: &str) -> Result<String, RequestError> {
        self.broker
            .ask(self.identity.id(), topic, body, self.question_timeout)
            .await
    }

    /// Tell observers this worker has been handed `url`.
    pub(crate) fn assign(&self, url: &str) {
        self.publish(MessagePayload::TaskAssignment {
            worker_name: self.identity.name().to_string(),
            url: url.to_string(),
        });
    }

    /// Report success: progress 100, then the findings.
    pub(crate) fn complete(&self, findings: &Findings) {
        self.advance(100, "complete".to_string());
        self.publish(MessagePayload::Findings(Box::new(findings.clone())));
    }

    /// Report a downgraded worker: the findings only, progress stays below 100.
    pub(crate) fn fail(&self, findings: &Findings) {
        if let Some((overall, index)) = &self.overall {
            overall.record(*index, 100);
        }
        self.publish(MessagePayload::Findings(Box::new(findings.clone())));
    }

    fn advance(&self, percent: u8, message: String) -> bool {
        let previous = self.published.fetch_max(i16::from(percent), Ordering::Relaxed);
        if i16::from(percent) <= previous {
            return false;
        }
        self.publish(MessagePayload::ProgressUpdate {
            progress: percent,
            message,
        });
        if let Some((overall, index)) = &self.overall {
            overall.record(*index, percent);
        }
        true
    }

    fn publish(&self, payload: MessagePayload) {
        let worker_id = self.identity.id();
        let correlation_id = self.bus.next_correlation_id(worker_id);
        self.bus.publish(
            OrchestrationMessage::new(worker_id, correlation_id, payload).in_run(self.run_id),
        );
    }
}

impl fmt::Debug for WorkerReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerReporter")
            .field("worker", &self.identity.id())
            .field("last_progress", &self.last_progress())
            .finish()
    }
}
