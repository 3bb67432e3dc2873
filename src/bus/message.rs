//! Typed orchestration messages carried on the event bus.
//!
//! Every message has the same envelope (`worker_id`, `correlation_id`,
//! `timestamp`) and exactly one payload shape per message kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::worker::Findings;

/// Worker id used for messages the coordinator publishes itself.
pub const COORDINATOR_ID: &str = "coordinator";

/// Token pairing a QUESTION with its RESPONSE.
///
/// Generated as `<worker_id>-<counter>` from a per-bus monotonic counter, so
/// ids are unique for every run on that bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub(crate) fn generate(worker_id: &str, sequence: u64) -> Self {
        Self(format!("{}-{}", worker_id, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminant of an [`OrchestrationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    TaskAssignment,
    ProgressUpdate,
    Findings,
    Question,
    Response,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TaskAssignment => "TASK_ASSIGNMENT",
            Self::ProgressUpdate => "PROGRESS_UPDATE",
            Self::Findings => "FINDINGS",
            Self::Question => "QUESTION",
            Self::Response => "RESPONSE",
        };
        f.write_str(s)
    }
}

/// Variant-specific message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePayload {
    /// The coordinator handed a page to a worker.
    TaskAssignment { worker_name: String, url: String },
    /// Local progress of one worker, or blended progress of the whole run
    /// when published by [`COORDINATOR_ID`].
    ProgressUpdate { progress: u8, message: String },
    /// The single findings record a worker produced for this run.
    Findings(Box<Findings>),
    /// A question addressed to whoever serves `topic`.
    Question { topic: String, body: String },
    /// Answer to the question with the same correlation id.
    Response { answer: String },
}

impl MessagePayload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::TaskAssignment { .. } => MessageKind::TaskAssignment,
            Self::ProgressUpdate { .. } => MessageKind::ProgressUpdate,
            Self::Findings(_) => MessageKind::Findings,
            Self::Question { .. } => MessageKind::Question,
            Self::Response { .. } => MessageKind::Response,
        }
    }
}

/// A message published on the [`EventBus`](crate::bus::EventBus).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationMessage {
    pub worker_id: String,
    pub correlation_id: CorrelationId,
    pub timestamp: DateTime<Utc>,
    /// The run this message belongs to; `None` for unscoped traffic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub payload: MessagePayload,
}

impl OrchestrationMessage {
    /// Create a message stamped with the current time.
    pub fn new(
        worker_id: impl Into<String>,
        correlation_id: CorrelationId,
        payload: MessagePayload,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            correlation_id,
            timestamp: Utc::now(),
            run_id: None,
            payload,
        }
    }

    /// Scope the message to one run.
    pub fn in_run(mut self, run_id: Option<Uuid>) -> Self {
        self.run_id = run_id;
        self
    }

    /// Whether a handler scoped to `run_id` should see this message.
    /// Unscoped handlers see everything.
    pub fn belongs_to(&self, run_id: Option<Uuid>) -> bool {
        run_id.is_none() || self.run_id == run_id
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// Progress percentage if this is a PROGRESS_UPDATE.
    pub fn progress(&self) -> Option<u8> {
        match self.payload {
            MessagePayload::ProgressUpdate { progress, .. } => Some(progress),
            _ => None,
        }
    }

    /// Findings record if this is a FINDINGS message.
    pub fn findings(&self) -> Option<&Findings> {
        match &self.payload {
            MessagePayload::Findings(findings) => Some(findings),
            _ => None,
        }
    }

    /// Whether the coordinator (not a worker) published this message.
    pub fn is_from_coordinator(&self) -> bool {
        self.worker_id == COORDINATOR_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerIdentity;

    #[test]
    fn test_correlation_id_format() {
        let id = CorrelationId::generate("seo", 7);
        assert_eq!(id.as_str(), "seo-7");
        assert_eq!(id.to_string(), "seo-7");
    }

    #[test]
    fn test_payload_kind() {
        let payload = MessagePayload::ProgressUpdate {
            progress: 40,
            message: "halfway".to_string(),
        };
        assert_eq!(payload.kind(), MessageKind::ProgressUpdate);

        let payload = MessagePayload::Response {
            answer: "ok".to_string(),
        };
        assert_eq!(payload.kind(), MessageKind::Response);
    }

    #[test]
    fn test_message_accessors() {
        let msg = OrchestrationMessage::new(
            "seo",
            CorrelationId::from("seo-1"),
            MessagePayload::ProgressUpdate {
                progress: 55,
                message: String::new(),
            },
        );
        assert_eq!(msg.progress(), Some(55));
        assert!(msg.findings().is_none());
        assert!(!msg.is_from_coordinator());

        let identity = WorkerIdentity::new("seo", "SEO Analyst", "seo");
        let msg = OrchestrationMessage::new(
            COORDINATOR_ID,
            CorrelationId::from("coordinator-2"),
            MessagePayload::Findings(Box::new(Findings::new(&identity))),
        );
        assert_eq!(msg.findings().map(|f| f.worker_id()), Some("seo"));
        assert!(msg.progress().is_none());
        assert!(msg.is_from_coordinator());
    }

    #[test]
    fn test_message_serialization_is_tagged() {
        let msg = OrchestrationMessage::new(
            "a11y",
            CorrelationId::from("a11y-3"),
            MessagePayload::Question {
                topic: "peer_findings".to_string(),
                body: "seo".to_string(),
            },
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["kind"], "QUESTION");
        assert_eq!(json["payload"]["data"]["topic"], "peer_findings");
        assert_eq!(json["correlation_id"], "a11y-3");

        let parsed: OrchestrationMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_message_kind_display() {
        assert_eq!(MessageKind::TaskAssignment.to_string(), "TASK_ASSIGNMENT");
        assert_eq!(MessageKind::Findings.to_string(), "FINDINGS");
    }

    #[test]
    fn test_run_scope_filtering() {
        let run = Uuid::new_v4();
        let other = Uuid::new_v4();
        let msg = OrchestrationMessage::new(
            "seo",
            CorrelationId::from("seo-4"),
            MessagePayload::Response {
                answer: "ok".to_string(),
            },
        )
        .in_run(Some(run));

        assert!(msg.belongs_to(Some(run)));
        assert!(msg.belongs_to(None));
        assert!(!msg.belongs_to(Some(other)));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["run_id"], run.to_string());

        let unscoped = OrchestrationMessage::new(
            "seo",
            CorrelationId::from("seo-5"),
            MessagePayload::Response {
                answer: "ok".to_string(),
            },
        );
        assert!(!unscoped.belongs_to(Some(run)));
        assert!(serde_json::to_value(&unscoped).unwrap().get("run_id").is_none());
    }
}
