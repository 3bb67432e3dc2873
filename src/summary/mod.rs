//! Executive summary generation with a deterministic fallback.
//!
//! The generator asks the completion collaborator for a short prose summary
//! of the synthesized report. Any failure (no client, missing credential,
//! HTTP error, empty reply) falls back to a template built from the health
//! score and severity counts, so summary generation never fails a run.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::completion::{CompletionClient, CompletionRequest};
use crate::errors::SummaryError;
use crate::synthesis::{SummaryStats, SynthesizedReport};
use crate::util::pluralize;

/// Number of top issues included in the summary prompt.
pub const DEFAULT_TOP_K: usize = 5;

/// Where the summary text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Ai,
    Fallback,
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ai => write!(f, "AI"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub text: String,
    pub source: SummarySource,
    /// Why the fallback was used, if it was.
    pub error: Option<String>,
}

impl ExecutiveSummary {
    pub fn ai(text: String) -> Self {
        Self {
            text,
            source: SummarySource::Ai,
            error: None,
        }
    }

    pub fn fallback(text: String, error: &str) -> Self {
        Self {
            text,
            source: SummarySource::Fallback,
            error: Some(error.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SummarySource::Fallback
    }
}

impl fmt::Display for ExecutiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub struct SummaryGenerator {
    client: Option<Arc<dyn CompletionClient>>,
    top_k: usize,
}

impl SummaryGenerator {
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self {
            client,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Generator that always uses the fallback template.
    pub fn fallback_only() -> Self {
        Self::new(None)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Produce the summary. Never fails: every error path yields the
    /// fallback template with the error recorded.
    pub async fn generate_executive_summary(&self, report: &SynthesizedReport) -> ExecutiveSummary {
        let stats = report.summary_stats();

        let Some(client) = &self.client else {
            return ExecutiveSummary::fallback(fallback_summary(stats), "no completion client configured");
        };
        if report.all_findings().is_empty() {
            return ExecutiveSummary::fallback(fallback_summary(stats), "no workers ran");
        }

        match self.request_summary(client.as_ref(), report).await {
            Ok(text) => ExecutiveSummary::ai(text),
            Err(e) => {
                tracing::warn!(client = %client.describe(), "summary generation failed, using fallback: {}", e);
                ExecutiveSummary::fallback(fallback_summary(stats), &e.to_string())
            }
        }
    }

    async fn request_summary(
        &self,
        client: &dyn CompletionClient,
        report: &SynthesizedReport,
    ) -> Result<String, SummaryError> {
        let prompt = build_summary_prompt(report, self.top_k);
        let text = client.complete(CompletionRequest::text(prompt)).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SummaryError::EmptySummary);
        }
        Ok(text.to_string())
    }
}

/// Structured prompt built from aggregate stats and the top `k` issues.
pub fn build_summary_prompt(report: &SynthesizedReport, top_k: usize) -> String {
    let stats = report.summary_stats();

    let workers = stats
        .workers
        .iter()
        .map(|w| {
            format!(
                "- {}: {} ({:.0}% confidence{})",
                w.worker_name,
                pluralize(w.issues_found, "issue", "issues"),
                w.confidence * 100.0,
                if w.degraded { ", failed" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let top = report.top_issues(top_k);
    let top_section = if top.is_empty() {
        "(none)".to_string()
    } else {
        top.iter()
            .enumerate()
            .map(|(i, r)| {
                let mut line = format!("{}. [{}] {}", i + 1, r.issue.severity(), r.issue.title());
                if !r.issue.location().is_empty() {
                    line.push_str(&format!(" at {}", r.issue.location()));
                }
                line.push_str(&format!(" (found by {})", r.source_worker));
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"# Webpage Audit Summary

Write a concise executive summary (3 to 5 sentences) of this webpage audit for
a product owner. Lead with overall health, then the most important fixes.
Plain text only, no markdown.

## Totals
- Issues: {total} (critical {critical}, high {high}, medium {medium}, low {low})
- Health score: {score}/100 ({band})

## Auditors
{workers}

## Top Issues
{top_section}
"#,
        total = stats.total_issues,
        critical = stats.critical,
        high = stats.high,
        medium = stats.medium,
        low = stats.low,
        score = stats.health_score,
        band = stats.health_band(),
        workers = if workers.is_empty() { "(none)".to_string() } else { workers },
        top_section = top_section,
    )
}

/// Deterministic summary derived from the health score and issue counts.
///
/// # Examples
///
/// ```
/// use pageaudit::summary::fallback_summary;
/// use pageaudit::synthesis::SummaryStats;
///
/// let text = fallback_summary(&SummaryStats::from_findings(&[]));
/// assert!(text.contains("0 issues"));
/// ```
pub fn fallback_summary(stats: &SummaryStats) -> String {
    let mut text = format!(
        "The audit found {} across {}. Overall health is {} with a score of {}/100.",
        pluralize(stats.total_issues, "issue", "issues"),
        pluralize(stats.workers.len(), "auditor", "auditors"),
        stats.health_band(),
        stats.health_score,
    );

    if stats.distinct_issues != stats.total_issues {
        text.push_str(&format!(
            " {} distinct after merging duplicates.",
            pluralize(stats.distinct_issues, "issue is", "issues are")
        ));
    }

    if stats.critical > 0 || stats.high > 0 {
        text.push_str(&format!(
            " Fix the {} critical and {} high severity {} first.",
            stats.critical,
            stats.high,
            if stats.critical + stats.high == 1 { "issue" } else { "issues" }
        ));
    } else if stats.total_issues > 0 {
        text.push_str(" No critical or high severity problems were reported.");
    }

    let degraded = stats.degraded_workers();
    if degraded > 0 {
        text.push_str(&format!(
            " {} did not complete, so coverage is partial.",
            pluralize(degraded, "auditor", "auditors")
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CompletionError;
    use crate::synthesis::synthesize;
    use crate::worker::{Findings, Issue, Severity, WorkerIdentity};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedCompletion(Result<&'static str, &'static str>, Mutex<Vec<String>>);

    #[async_trait]
    impl CompletionClient for FixedCompletion {
        async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            self.1.lock().unwrap().push(request.prompt);
            self.0
                .map(String::from)
                .map_err(|e| CompletionError::Unavailable(e.to_string()))
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn client(reply: Result<&'static str, &'static str>) -> Arc<FixedCompletion> {
        Arc::new(FixedCompletion(reply, Mutex::new(Vec::new())))
    }

    fn report() -> SynthesizedReport {
        let a = WorkerIdentity::new("a11y", "Accessibility Auditor", "accessibility");
        let b = WorkerIdentity::new("seo", "SEO Analyst", "seo");
        let fa = Findings::new(&a)
            .add_issue(Issue::new(Severity::Critical, "Keyboard trap").with_location("#modal"))
            .add_issue(Issue::new(Severity::Low, "Redundant title attribute"));
        let fb = Findings::degraded(&b, "timed out after 120s");
        synthesize(vec![fa, fb], &[a, b]).unwrap()
    }

    #[tokio::test]
    async fn test_ai_summary_used_when_available() {
        let c = client(Ok("  The page is mostly healthy.  "));
        let generator = SummaryGenerator::new(Some(c.clone() as Arc<dyn CompletionClient>));

        let summary = generator.generate_executive_summary(&report()).await;

        assert_eq!(summary.source, SummarySource::Ai);
        assert_eq!(summary.text, "The page is mostly healthy.");
        assert!(summary.error.is_none());
        assert!(c.1.lock().unwrap()[0].contains("Keyboard trap at #modal"));
    }

    #[tokio::test]
    async fn test_fallback_when_completion_fails() {
        let generator = SummaryGenerator::new(Some(client(Err("no key")) as Arc<dyn CompletionClient>));

        let summary = generator.generate_executive_summary(&report()).await;

        assert!(summary.is_fallback());
        assert!(!summary.text.is_empty());
        assert!(summary.text.contains("2 issues"));
        assert!(summary.error.unwrap().contains("no key"));
    }

    #[tokio::test]
    async fn test_fallback_on_empty_reply() {
        let generator = SummaryGenerator::new(Some(client(Ok("   ")) as Arc<dyn CompletionClient>));
        let summary = generator.generate_executive_summary(&report()).await;
        assert!(summary.is_fallback());
        assert_eq!(summary.error.as_deref(), Some("summary text was empty"));
    }

    #[tokio::test]
    async fn test_zero_workers_uses_fallback_without_calling_client() {
        let c = client(Ok("should not be used"));
        let generator = SummaryGenerator::new(Some(c.clone() as Arc<dyn CompletionClient>));
        let empty = synthesize(Vec::new(), &[]).unwrap();

        let summary = generator.generate_executive_summary(&empty).await;

        assert!(summary.is_fallback());
        assert!(summary.text.contains("0 issues"));
        assert!(c.1.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_client_uses_fallback() {
        let summary = SummaryGenerator::fallback_only()
            .generate_executive_summary(&report())
            .await;
        assert!(summary.is_fallback());
    }

    #[test]
    fn test_summary_prompt_respects_top_k() {
        let prompt = build_summary_prompt(&report(), 1);
        assert!(prompt.contains("1. [critical] Keyboard trap"));
        assert!(!prompt.contains("Redundant title attribute"));
        assert!(prompt.contains("SEO Analyst: 0 issues (0% confidence, failed)"));
        assert!(prompt.contains("Health score: 84/100 (good)"));
    }

    #[test]
    fn test_fallback_summary_content() {
        let text = fallback_summary(report().summary_stats());
        assert!(text.contains("2 issues across 2 auditors"));
        assert!(text.contains("score of 84/100"));
        assert!(text.contains("1 critical and 0 high"));
        assert!(text.contains("1 auditor did not complete"));
    }

    #[test]
    fn test_fallback_summary_mentions_duplicates() {
        let id = WorkerIdentity::new("a", "A", "x");
        let f = Findings::new(&id)
            .add_issue(Issue::new(Severity::Medium, "Same"))
            .add_issue(Issue::new(Severity::Medium, "same"));
        let report = synthesize(vec![f], &[id]).unwrap();
        let text = fallback_summary(report.summary_stats());
        assert!(text.contains("1 issue is distinct"));
        assert!(text.contains("No critical or high severity"));
    }
}
