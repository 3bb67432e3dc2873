use crate::bus::{EventBus, MessagePayload, OrchestrationMessage, Subscription};
use crate::ui::icons::{CHECK, CROSS, QUESTION, SEARCH};
use crate::worker::WorkerIdentity;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Terminal view of one audit run, driven entirely by bus messages.
///
/// One overall bar fed by the coordinator's blended PROGRESS_UPDATE, plus
/// one bar per registered worker fed by that worker's own updates.
pub struct AuditProgressView {
    bars: Arc<Bars>,
    subscription: Option<Subscription>,
}

struct Bars {
    multi: MultiProgress,
    overall: ProgressBar,
    workers: HashMap<String, ProgressBar>,
    verbose: bool,
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

impl AuditProgressView {
    /// Create the view drawing to stderr.
    pub fn new(workers: &[WorkerIdentity], verbose: bool) -> Self {
        Self::with_multi(MultiProgress::new(), workers, verbose)
    }

    /// Create a view that tracks state without drawing anything.
    pub fn hidden(workers: &[WorkerIdentity]) -> Self {
        Self::with_multi(
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            workers,
            false,
        )
    }

    fn with_multi(multi: MultiProgress, workers: &[WorkerIdentity], verbose: bool) -> Self {
        let overall = multi.add(ProgressBar::new(100));
        overall.set_style(bar_style(
            "{prefix:.bold} [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        ));
        overall.set_prefix(format!("{:<24}", "Audit"));

        let worker_style = bar_style("{prefix:.dim} [{bar:40.green/white}] {pos:>3}% {msg}");
        let workers = workers
            .iter()
            .map(|identity| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(worker_style.clone());
                bar.set_prefix(format!("{:<24}", identity.name()));
                bar.set_message(style("waiting").dim().to_string());
                (identity.id().to_string(), bar)
            })
            .collect();

        Self {
            bars: Arc::new(Bars {
                multi,
                overall,
                workers,
                verbose,
            }),
            subscription: None,
        }
    }

    /// Subscribe to `bus`. Call [`Self::finish`] to detach.
    pub fn attach(&mut self, bus: &EventBus) {
        if self.subscription.is_some() {
            return;
        }
        self.bars.overall.enable_steady_tick(Duration::from_millis(120));
        let bars = Arc::clone(&self.bars);
        self.subscription = Some(bus.subscribe(move |msg| {
            bars.handle(msg);
            Ok(())
        }));
    }

    /// Apply one message to the bars.
    pub fn handle(&self, msg: &OrchestrationMessage) {
        self.bars.handle(msg);
    }

    pub fn overall_position(&self) -> u64 {
        self.bars.overall.position()
    }

    pub fn worker_position(&self, worker_id: &str) -> Option<u64> {
        self.bars.workers.get(worker_id).map(ProgressBar::position)
    }

    /// Detach from the bus and clear the bars.
    pub fn finish(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.bars.overall.finish_and_clear();
        for bar in self.bars.workers.values() {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
        let _ = self.bars.multi.clear();
    }
}

impl Bars {
    fn print_line(&self, line: String) {
        if self.multi.println(&line).is_err() {
            eprintln!("{}", line);
        }
    }

    fn handle(&self, msg: &OrchestrationMessage) {
        if msg.is_from_coordinator() {
            if let MessagePayload::ProgressUpdate { progress, message } = &msg.payload {
                self.overall.set_position(u64::from(*progress));
                self.overall.set_message(message.clone());
            }
            return;
        }

        let Some(bar) = self.workers.get(&msg.worker_id) else {
            return;
        };
        match &msg.payload {
            MessagePayload::TaskAssignment { url, .. } => {
                bar.set_message(format!("{}{}", SEARCH, style(url).dim()));
            }
            MessagePayload::ProgressUpdate { progress, message } => {
                bar.set_position(u64::from(*progress));
                bar.set_message(message.clone());
            }
            MessagePayload::Findings(findings) => {
                if findings.is_degraded() {
                    bar.abandon_with_message(format!("{}{}", CROSS, style("failed").red()));
                } else {
                    bar.set_position(100);
                    bar.finish_with_message(format!(
                        "{}{}",
                        CHECK,
                        crate::util::pluralize(findings.issues().len(), "issue", "issues")
                    ));
                }
            }
            MessagePayload::Question { topic, body } => {
                if self.verbose {
                    self.print_line(format!(
                        "    {}{} asks {}: {}",
                        QUESTION,
                        style(&msg.worker_id).cyan(),
                        style(topic).yellow(),
                        style(body).dim()
                    ));
                }
            }
            MessagePayload::Response { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{COORDINATOR_ID, CorrelationId};
    use crate::worker::Findings;

    fn identities() -> Vec<WorkerIdentity> {
        vec![
            WorkerIdentity::new("seo", "SEO Analyst", "seo"),
            WorkerIdentity::new("content", "Content Reviewer", "content"),
        ]
    }

    fn message(from: &str, payload: MessagePayload) -> OrchestrationMessage {
        OrchestrationMessage::new(from, CorrelationId::generate(from, 0), payload)
    }

    fn progress(from: &str, value: u8) -> OrchestrationMessage {
        message(
            from,
            MessagePayload::ProgressUpdate {
                progress: value,
                message: "working".to_string(),
            },
        )
    }

    #[test]
    fn test_routes_progress_to_bars() {
        let view = AuditProgressView::hidden(&identities());

        view.handle(&progress(COORDINATOR_ID, 42));
        view.handle(&progress("seo", 60));

        assert_eq!(view.overall_position(), 42);
        assert_eq!(view.worker_position("seo"), Some(60));
        assert_eq!(view.worker_position("content"), Some(0));
    }

    #[test]
    fn test_unknown_worker_ignored() {
        let view = AuditProgressView::hidden(&identities());
        view.handle(&progress("ghost", 80));
        assert_eq!(view.worker_position("ghost"), None);
        assert_eq!(view.overall_position(), 0);
    }

    #[test]
    fn test_findings_complete_worker_bar() {
        let ids = identities();
        let view = AuditProgressView::hidden(&ids);
        let findings = Findings::new(&ids[1]);
        view.handle(&message(
            "content",
            MessagePayload::Findings(Box::new(findings)),
        ));
        assert_eq!(view.worker_position("content"), Some(100));
    }

    #[test]
    fn test_attached_view_follows_bus() {
        let bus = EventBus::new();
        let mut view = AuditProgressView::hidden(&identities());
        view.attach(&bus);
        view.attach(&bus);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(progress(COORDINATOR_ID, 75));
        assert_eq!(view.overall_position(), 75);

        view.finish();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
