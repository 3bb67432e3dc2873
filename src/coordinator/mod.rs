//! Coordinator: dispatches workers, isolates their failures, joins results.
//!
//! One `orchestrate` call is one run:
//!
//! 1. Publish a TASK_ASSIGNMENT per worker and start them all concurrently
//! 2. Catch every rejection, panic or timeout and substitute degraded findings
//! 3. Once every worker has settled, synthesize the ranked report
//! 4. Ask for an executive summary (falling back to a template)
//!
//! Only a broken synthesis invariant fails a run. Every message a run
//! publishes carries its run id, so concurrent runs on one bus stay apart.

pub mod progress;
pub mod report;
pub mod state;

pub use progress::OverallProgress;
pub use report::AuditReport;
pub use state::RunState;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use crate::bus::{COORDINATOR_ID, EventBus, RequestBroker, serve_run_questions};
use crate::completion::CompletionClient;
use crate::errors::{RegistrationError, SynthesisError, WorkerError};
use crate::page::PageContext;
use crate::summary::{DEFAULT_TOP_K, SummaryGenerator};
use crate::synthesis::synthesize;
use crate::util::panic_message;
use crate::worker::ai::PEER_FINDINGS_TOPIC;
use crate::worker::{AuditWorker, DEFAULT_QUESTION_TIMEOUT, Findings, WorkerIdentity, WorkerReporter};
use state::RunTracker;

/// Default per-worker timeout.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(120);

/// Answer to a `peer_findings` question about a worker that has not settled.
pub const PEER_PENDING: &str = "pending";

/// Settings for the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Per-worker limit. `None` waits indefinitely.
    pub worker_timeout: Option<Duration>,
    /// Limit on each question a worker asks over the bus.
    pub question_timeout: Duration,
    /// Issues included in the summary prompt.
    pub summary_top_k: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            worker_timeout: Some(DEFAULT_WORKER_TIMEOUT),
            question_timeout: DEFAULT_QUESTION_TIMEOUT,
            summary_top_k: DEFAULT_TOP_K,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_worker_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.worker_timeout = timeout;
        self
    }

    pub fn with_question_timeout(mut self, timeout: Duration) -> Self {
        self.question_timeout = timeout;
        self
    }

    pub fn with_summary_top_k(mut self, top_k: usize) -> Self {
        self.summary_top_k = top_k;
        self
    }
}

type SettledFindings = Arc<Mutex<HashMap<String, Findings>>>;

/// Owns the registered workers and runs audits over them.
pub struct Coordinator {
    bus: EventBus,
    workers: Vec<Arc<dyn AuditWorker>>,
    summary_client: Option<Arc<dyn CompletionClient>>,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Create a coordinator publishing on `bus`.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            workers: Vec::new(),
            summary_client: None,
            config: CoordinatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Completion client used for the executive summary. Without one the
    /// fallback template is always used.
    pub fn with_summary_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.summary_client = Some(client);
        self
    }

    /// Register a worker. Registration order is the tie-break order for
    /// equal-severity issues.
    pub fn register(&mut self, worker: Arc<dyn AuditWorker>) -> Result<(), RegistrationError> {
        let id = worker.identity().id();
        if id.trim().is_empty() {
            return Err(RegistrationError::EmptyId);
        }
        if id == COORDINATOR_ID {
            return Err(RegistrationError::ReservedId(id.to_string()));
        }
        if self.workers.iter().any(|w| w.identity().id() == id) {
            return Err(RegistrationError::DuplicateWorker(id.to_string()));
        }
        tracing::debug!(worker = %id, "registered worker");
        self.workers.push(worker);
        Ok(())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Identities of registered workers, in registration order.
    pub fn worker_identities(&self) -> Vec<WorkerIdentity> {
        self.workers.iter().map(|w| w.identity().clone()).collect()
    }

    /// Run every registered worker against `page` and build the report.
    pub async fn orchestrate(&self, page: Arc<PageContext>) -> Result<AuditReport, SynthesisError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("audit_run", %run_id, url = %page.url());
        self.run(run_id, page).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, page: Arc<PageContext>) -> Result<AuditReport, SynthesisError> {
        let started = Instant::now();
        let identities = self.worker_identities();
        let mut tracker = RunTracker::default();

        tracker.advance(RunState::Dispatching)?;
        tracing::info!(workers = identities.len(), "starting audit");
        let overall = Arc::new(OverallProgress::new(self.bus.clone(), self.workers.len()).for_run(run_id));
        overall.advance(progress::DISPATCH_START, "dispatching workers");

        let settled: SettledFindings = Arc::new(Mutex::new(HashMap::new()));
        let responder = {
            let settled = Arc::clone(&settled);
            serve_run_questions(&self.bus, COORDINATOR_ID, Some(run_id), move |topic, body| {
                if topic != PEER_FINDINGS_TOPIC {
                    return None;
                }
                let settled = settled.lock().unwrap_or_else(PoisonError::into_inner);
                Some(match settled.get(body.trim()) {
                    Some(findings) => serde_json::to_string(findings).ok()?,
                    None => PEER_PENDING.to_string(),
                })
            })
        };
        let broker = Arc::new(RequestBroker::attach(&self.bus).scoped_to(run_id));

        let reporters: Vec<WorkerReporter> = identities
            .iter()
            .enumerate()
            .map(|(index, identity)| {
                WorkerReporter::new(identity.clone(), self.bus.clone(), Arc::clone(&broker))
                    .with_question_timeout(self.config.question_timeout)
                    .with_overall(Arc::clone(&overall), index)
                    .in_run(run_id)
            })
            .collect();
        for reporter in &reporters {
            reporter.assign(page.url());
        }
        overall.advance(progress::WORKERS_START, "workers dispatched");

        tracker.advance(RunState::AwaitingWorkers)?;
        let futures: Vec<_> = self
            .workers
            .iter()
            .zip(&reporters)
            .map(|(worker, reporter)| self.run_worker(worker.as_ref(), &page, reporter, &settled))
            .collect();
        let findings = join_all(futures).await;

        responder.unsubscribe();
        drop(reporters);
        drop(broker);

        tracker.advance(RunState::Synthesizing)?;
        overall.advance(progress::SYNTHESIS_START, "synthesizing report");
        let synthesized_report = synthesize(findings, &identities)?;

        tracker.advance(RunState::Summarizing)?;
        overall.advance(progress::SUMMARY_START, "writing executive summary");
        let executive_summary = SummaryGenerator::new(self.summary_client.clone())
            .with_top_k(self.config.summary_top_k)
            .generate_executive_summary(&synthesized_report)
            .await;

        tracker.advance(RunState::Complete)?;
        overall.advance(progress::COMPLETE, "audit complete");

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            issues = synthesized_report.summary_stats().total_issues,
            health = synthesized_report.summary_stats().health_score,
            summary = %executive_summary.source,
            duration_ms,
            "audit complete"
        );

        Ok(AuditReport {
            run_id,
            url: page.url().to_string(),
            duration_ms,
            executive_summary,
            synthesized_report,
        })
    }

    /// Run one worker to completion. Always yields exactly one findings
    /// record for it.
    async fn run_worker(
        &self,
        worker: &dyn AuditWorker,
        page: &PageContext,
        reporter: &WorkerReporter,
        settled: &SettledFindings,
    ) -> Findings {
        let identity = worker.identity();
        let started = Instant::now();

        let analysis = AssertUnwindSafe(worker.analyze(page, reporter)).catch_unwind();
        let outcome = match self.config.worker_timeout {
            Some(limit) => match tokio::time::timeout(limit, analysis).await {
                Ok(result) => flatten_panic(result),
                Err(_) => Err(WorkerError::TimedOut(limit)),
            },
            None => flatten_panic(analysis.await),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let findings = match outcome.and_then(|f| validate(identity, f)) {
            Ok(findings) => {
                let findings = findings.with_analysis_time_ms(elapsed_ms);
                tracing::info!(
                    worker = %identity.id(),
                    issues = findings.issues().len(),
                    confidence = findings.confidence(),
                    elapsed_ms,
                    "worker finished"
                );
                reporter.complete(&findings);
                findings
            }
            Err(e) => {
                tracing::warn!(worker = %identity.id(), elapsed_ms, "worker failed: {}", e);
                let findings = Findings::degraded(identity, &e.to_string()).with_analysis_time_ms(elapsed_ms);
                reporter.fail(&findings);
                findings
            }
        };

        settled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.id().to_string(), findings.clone());
        findings
    }
}

fn flatten_panic(
    result: Result<Result<Findings, WorkerError>, Box<dyn std::any::Any + Send>>,
) -> Result<Findings, WorkerError> {
    result.unwrap_or_else(|payload| Err(WorkerError::Panicked(panic_message(payload.as_ref()))))
}

/// Reject findings that claim another worker's identity or carry a
/// non-finite confidence; clamp finite confidence into range.
fn validate(identity: &WorkerIdentity, findings: Findings) -> Result<Findings, WorkerError> {
    if findings.worker_id() != identity.id() {
        return Err(WorkerError::IdentityMismatch {
            expected: identity.id().to_string(),
            actual: findings.worker_id().to_string(),
        });
    }
    let confidence = findings.confidence();
    if !confidence.is_finite() {
        return Err(WorkerError::InvalidConfidence);
    }
    Ok(findings.with_confidence(confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{MessageKind, MessagePayload, OrchestrationMessage};
    use crate::errors::CompletionError;
    use crate::completion::CompletionRequest;
    use crate::summary::SummarySource;
    use crate::worker::{Issue, Severity};
    use async_trait::async_trait;

    enum Behavior {
        Succeed(Vec<Severity>),
        Fail(&'static str),
        Panic(&'static str),
        Hang,
        WrongId,
        NanConfidence,
        AskPeer(&'static str),
        EchoUrl,
        Rendezvous(Arc<tokio::sync::Barrier>),
    }

    struct MockWorker {
        identity: WorkerIdentity,
        behavior: Behavior,
    }

    impl MockWorker {
        fn new(id: &str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                identity: WorkerIdentity::new(id, format!("{} worker", id), "test"),
                behavior,
            })
        }
    }

    #[async_trait]
    impl AuditWorker for MockWorker {
        fn identity(&self) -> &WorkerIdentity {
            &self.identity
        }

        async fn analyze(
            &self,
            page: &PageContext,
            reporter: &WorkerReporter,
        ) -> Result<Findings, WorkerError> {
            reporter.progress(25, "started");
            let findings = Findings::new(&self.identity);
            match &self.behavior {
                Behavior::Succeed(severities) => {
                    tokio::task::yield_now().await;
                    reporter.progress(60, "checking");
                    Ok(severities.iter().fold(findings, |f, s| {
                        f.add_issue(Issue::new(*s, format!("{}.{}", self.identity.id(), s)))
                    }))
                }
                Behavior::Fail(reason) => Err(WorkerError::failed(*reason)),
                Behavior::Panic(message) => panic!("{}", message),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(findings)
                }
                Behavior::WrongId => Ok(Findings::new(&WorkerIdentity::new("impostor", "x", "x"))),
                Behavior::NanConfidence => Ok(findings.with_confidence(f64::NAN)),
                Behavior::AskPeer(peer) => {
                    // Give faster peers a chance to settle first.
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let answer = reporter
                        .ask(PEER_FINDINGS_TOPIC, peer)
                        .await
                        .map_err(|e| WorkerError::Other(e.into()))?;
                    Ok(findings.with_metadata("peer_answer", serde_json::Value::String(answer)))
                }
                Behavior::EchoUrl => Ok(findings.add_issue(Issue::new(Severity::Medium, page.url()))),
                Behavior::Rendezvous(barrier) => {
                    // Only returns once every party is inside analyze at the same time.
                    barrier.wait().await;
                    Ok(findings)
                }
            }
        }
    }

    struct NoCompletion;

    #[async_trait]
    impl CompletionClient for NoCompletion {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Err(CompletionError::MissingCredential {
                env_var: "PAGEAUDIT_API_KEY".to_string(),
            })
        }

        fn describe(&self) -> String {
            "none".to_string()
        }
    }

    fn page() -> Arc<PageContext> {
        page_at("https://example.com")
    }

    fn page_at(url: &str) -> Arc<PageContext> {
        Arc::new(PageContext::builder(url).title("Example").build().unwrap())
    }

    fn coordinator(workers: Vec<Arc<MockWorker>>) -> Coordinator {
        let mut coordinator = Coordinator::new(EventBus::new()).with_config(
            CoordinatorConfig::default()
                .with_worker_timeout(Some(Duration::from_millis(200)))
                .with_question_timeout(Duration::from_millis(50)),
        );
        for worker in workers {
            coordinator.register(worker).unwrap();
        }
        coordinator
    }

    fn record(bus: &EventBus) -> Arc<Mutex<Vec<OrchestrationMessage>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        bus.subscribe(move |msg| {
            sink.lock().unwrap().push(msg.clone());
            Ok(())
        });
        log
    }

    fn titles(report: &AuditReport) -> Vec<String> {
        report
            .synthesized_report
            .prioritized_issues()
            .iter()
            .map(|r| r.issue.title().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_all_workers_succeed() {
        let c = coordinator(vec![
            MockWorker::new("a", Behavior::Succeed(vec![Severity::Critical, Severity::High, Severity::Low])),
            MockWorker::new("b", Behavior::Succeed(vec![Severity::Critical, Severity::Medium])),
        ]);

        let report = c.orchestrate(page()).await.unwrap();

        assert_eq!(report.all_findings().len(), 2);
        assert_eq!(report.synthesized_report.prioritized_issues().len(), 5);
        assert_eq!(
            titles(&report),
            vec!["a.critical", "b.critical", "a.high", "b.medium", "a.low"]
        );
        assert_eq!(report.url, "https://example.com");
        assert!(!report.has_degraded_workers());
    }

    #[tokio::test]
    async fn test_failing_worker_is_isolated() {
        let c = coordinator(vec![
            MockWorker::new("a", Behavior::Succeed(vec![Severity::High])),
            MockWorker::new("b", Behavior::Fail("selector engine crashed")),
            MockWorker::new("c", Behavior::Succeed(vec![Severity::Low])),
        ]);

        let report = c.orchestrate(page()).await.unwrap();
        let findings = report.all_findings();

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[1].worker_id(), "b");
        assert_eq!(findings[1].confidence(), 0.0);
        assert!(findings[1].issues().is_empty());
        assert_eq!(findings[1].suggestions(), ["Worker failed: selector engine crashed"]);
        assert_eq!(titles(&report), vec!["a.high", "c.low"]);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_isolated() {
        let c = coordinator(vec![
            MockWorker::new("a", Behavior::Panic("index out of bounds")),
            MockWorker::new("b", Behavior::Succeed(vec![Severity::Medium])),
        ]);

        let report = c.orchestrate(page()).await.unwrap();
        let failed = &report.all_findings()[0];

        assert!(failed.is_degraded());
        assert!(failed.suggestions()[0].contains("index out of bounds"));
        assert_eq!(report.stats().total_issues, 1);
    }

    #[tokio::test]
    async fn test_hanging_worker_times_out() {
        let c = coordinator(vec![
            MockWorker::new("slow", Behavior::Hang),
            MockWorker::new("fast", Behavior::Succeed(vec![])),
        ]);

        let report = c.orchestrate(page()).await.unwrap();
        let slow = &report.all_findings()[0];

        assert!(slow.is_degraded());
        assert!(slow.suggestions()[0].contains("timed out after"));
        assert!(!report.all_findings()[1].is_degraded());
    }

    #[tokio::test]
    async fn test_identity_and_confidence_checks() {
        let c = coordinator(vec![
            MockWorker::new("a", Behavior::WrongId),
            MockWorker::new("b", Behavior::NanConfidence),
            MockWorker::new("c", Behavior::Succeed(vec![])),
        ]);

        let report = c.orchestrate(page()).await.unwrap();
        let findings = report.all_findings();

        assert_eq!(findings[0].worker_id(), "a");
        assert!(findings[0].suggestions()[0].contains("impostor"));
        assert!(findings[1].is_degraded());
        assert!(findings[1].suggestions()[0].contains("non-finite confidence"));
        assert_eq!(findings[2].confidence(), 1.0);
        assert!(!findings[2].is_degraded());
    }

    #[tokio::test]
    async fn test_zero_workers() {
        let c = coordinator(Vec::new());
        let report = c.orchestrate(page()).await.unwrap();

        assert!(report.all_findings().is_empty());
        assert!(report.synthesized_report.prioritized_issues().is_empty());
        assert_eq!(report.executive_summary.source, SummarySource::Fallback);
        assert!(report.executive_summary.text.contains("0 issues"));
    }

    #[tokio::test]
    async fn test_summary_falls_back_when_completion_fails() {
        let c = coordinator(vec![MockWorker::new(
            "a",
            Behavior::Succeed(vec![Severity::High, Severity::Low]),
        )])
        .with_summary_client(Arc::new(NoCompletion));

        let report = c.orchestrate(page()).await.unwrap();

        assert!(report.executive_summary.is_fallback());
        assert!(report.executive_summary.text.contains("2 issues"));
        assert!(
            report
                .executive_summary
                .error
                .as_deref()
                .unwrap()
                .contains("PAGEAUDIT_API_KEY")
        );
    }

    #[tokio::test]
    async fn test_worker_progress_contract() {
        let c = coordinator(vec![
            MockWorker::new("ok", Behavior::Succeed(vec![Severity::Low])),
            MockWorker::new("bad", Behavior::Fail("nope")),
        ]);
        let log = record(c.bus());

        c.orchestrate(page()).await.unwrap();

        let log = log.lock().unwrap();
        let progress_of = |worker: &str| -> Vec<u8> {
            log.iter()
                .filter(|m| m.worker_id == worker)
                .filter_map(|m| m.progress())
                .collect()
        };

        let ok = progress_of("ok");
        assert!(ok.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ok.last(), Some(&100));

        let bad = progress_of("bad");
        assert!(bad.windows(2).all(|w| w[0] <= w[1]));
        assert!(!bad.contains(&100));

        let overall = progress_of(COORDINATOR_ID);
        assert!(overall.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(overall.first(), Some(&0));
        assert_eq!(overall.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_message_sequence_per_worker() {
        let c = coordinator(vec![
            MockWorker::new("a", Behavior::Succeed(vec![])),
            MockWorker::new("b", Behavior::Fail("x")),
        ]);
        let log = record(c.bus());

        c.orchestrate(page()).await.unwrap();

        let log = log.lock().unwrap();
        for worker in ["a", "b"] {
            let kinds: Vec<MessageKind> = log
                .iter()
                .filter(|m| m.worker_id == worker)
                .map(|m| m.kind())
                .collect();
            assert_eq!(kinds.first(), Some(&MessageKind::TaskAssignment));
            assert_eq!(kinds.last(), Some(&MessageKind::Findings));
            assert_eq!(kinds.iter().filter(|k| **k == MessageKind::Findings).count(), 1);
        }
        let assigned = log.iter().find_map(|m| match &m.payload {
            MessagePayload::TaskAssignment { url, .. } => Some(url.clone()),
            _ => None,
        });
        assert_eq!(assigned.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn test_peer_findings_question() {
        let c = coordinator(vec![
            MockWorker::new("first", Behavior::Succeed(vec![Severity::High])),
            MockWorker::new("asker", Behavior::AskPeer("first")),
            MockWorker::new("early", Behavior::AskPeer("never-settles")),
        ]);

        let report = c.orchestrate(page()).await.unwrap();
        let findings = report.all_findings();

        let answer = findings[1].metadata()["peer_answer"].as_str().unwrap();
        let peer: Findings = serde_json::from_str(answer).unwrap();
        assert_eq!(peer.worker_id(), "first");
        assert_eq!(peer.issues().len(), 1);

        assert_eq!(findings[2].metadata()["peer_answer"], PEER_PENDING);
    }

    #[tokio::test]
    async fn test_workers_run_concurrently() {
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let c = coordinator(vec![
            MockWorker::new("a", Behavior::Rendezvous(Arc::clone(&barrier))),
            MockWorker::new("b", Behavior::Rendezvous(barrier)),
        ]);

        let report = tokio::time::timeout(Duration::from_millis(200), c.orchestrate(page()))
            .await
            .expect("run did not finish")
            .unwrap();

        assert_eq!(report.all_findings().len(), 2);
        assert!(!report.has_degraded_workers());
    }

    #[tokio::test]
    async fn test_concurrent_runs_stay_isolated() {
        let c = coordinator(vec![
            MockWorker::new("first", Behavior::EchoUrl),
            MockWorker::new("asker", Behavior::AskPeer("first")),
        ]);
        let log = record(c.bus());

        let (a, b) = tokio::join!(
            c.orchestrate(page_at("https://run-a.example")),
            c.orchestrate(page_at("https://run-b.example")),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.run_id, b.run_id);

        for report in [&a, &b] {
            let answer = report.all_findings()[1].metadata()["peer_answer"].as_str().unwrap();
            let peer: Findings = serde_json::from_str(answer).unwrap();
            assert_eq!(peer.issues().len(), 1);
            assert_eq!(peer.issues()[0].title(), report.url);
        }

        let log = log.lock().unwrap();
        for report in [&a, &b] {
            let overall: Vec<u8> = log
                .iter()
                .filter(|m| m.worker_id == COORDINATOR_ID && m.run_id == Some(report.run_id))
                .filter_map(|m| m.progress())
                .collect();
            assert!(overall.windows(2).all(|w| w[0] < w[1]), "{:?}", overall);
            assert_eq!(overall.last(), Some(&100));

            let questions = log
                .iter()
                .filter(|m| m.kind() == MessageKind::Question && m.run_id == Some(report.run_id))
                .count();
            assert_eq!(questions, 1);
        }
        assert!(log.iter().all(|m| m.run_id.is_some()));
    }

    #[tokio::test]
    async fn test_run_leaves_no_subscribers_behind() {
        let c = coordinator(vec![MockWorker::new("a", Behavior::Succeed(vec![]))]);
        c.orchestrate(page()).await.unwrap();
        assert_eq!(c.bus().subscriber_count(), 0);
    }

    #[test]
    fn test_registration_rules() {
        let mut c = coordinator(vec![MockWorker::new("a", Behavior::Succeed(vec![]))]);

        assert!(matches!(
            c.register(MockWorker::new("a", Behavior::Hang)),
            Err(RegistrationError::DuplicateWorker(_))
        ));
        assert!(matches!(
            c.register(MockWorker::new(COORDINATOR_ID, Behavior::Hang)),
            Err(RegistrationError::ReservedId(_))
        ));
        assert!(matches!(
            c.register(MockWorker::new(" ", Behavior::Hang)),
            Err(RegistrationError::EmptyId)
        ));
        assert_eq!(c.worker_count(), 1);
        assert_eq!(c.worker_identities()[0].id(), "a");
    }

    #[test]
    fn test_config_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.worker_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.summary_top_k, 5);
    }
}
