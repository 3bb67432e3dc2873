//! Pure synthesis of collected findings into one ranked report.
//!
//! [`rank_issues`] is the single ranking function: it flattens every issue in
//! worker-registration order and stable-sorts by severity rank, so
//! equal-severity issues keep the order their workers were registered in.
//! [`synthesize`] adds aggregate stats and checks the run invariants.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SynthesisError;
use crate::worker::{Findings, Issue, Severity, WorkerIdentity};

/// An issue in the prioritized list, tagged with the worker that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedIssue {
    pub issue: Issue,
    pub source_worker: String,
}

/// Flatten and rank issues from findings given in registration order.
///
/// Never places a strictly higher severity after a strictly lower one.
///
/// # Examples
///
/// ```
/// use pageaudit::synthesis::rank_issues;
/// use pageaudit::worker::{Findings, Issue, Severity, WorkerIdentity};
///
/// let a = Findings::new(&WorkerIdentity::new("a", "A", "x"))
///     .add_issue(Issue::new(Severity::Low, "a-low"))
///     .add_issue(Issue::new(Severity::Critical, "a-critical"));
/// let b = Findings::new(&WorkerIdentity::new("b", "B", "x"))
///     .add_issue(Issue::new(Severity::Critical, "b-critical"));
///
/// let titles: Vec<String> = rank_issues(&[a, b])
///     .into_iter()
///     .map(|r| r.issue.title().to_string())
///     .collect();
/// assert_eq!(titles, ["a-critical", "b-critical", "a-low"]);
/// ```
pub fn rank_issues(findings: &[Findings]) -> Vec<RankedIssue> {
    let mut ranked: Vec<RankedIssue> = findings
        .iter()
        .flat_map(|f| {
            f.issues().iter().map(move |issue| RankedIssue {
                issue: issue.clone(),
                source_worker: f.worker_id().to_string(),
            })
        })
        .collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.issue.severity().rank().cmp(&a.issue.severity().rank()));
    ranked
}

/// Per-worker line of the aggregate stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker: String,
    pub worker_name: String,
    pub issues_found: usize,
    pub confidence: f64,
    pub analysis_time_ms: u64,
    pub degraded: bool,
}

/// Qualitative band of the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Excellent,
    Good,
    NeedsAttention,
    Poor,
}

impl HealthBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::NeedsAttention,
            _ => Self::Poor,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Excellent => "🟢",
            Self::Good => "🟡",
            Self::NeedsAttention => "🟠",
            Self::Poor => "🔴",
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::NeedsAttention => "needs attention",
            Self::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// Aggregate counts over all findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_issues: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
    /// Issues left after collapsing identical (severity, title, location).
    pub distinct_issues: usize,
    pub health_score: u8,
    pub workers: Vec<WorkerStats>,
}

impl SummaryStats {
    /// Compute stats over findings in registration order.
    pub fn from_findings(findings: &[Findings]) -> Self {
        let count = |severity: Severity| -> usize {
            findings.iter().map(|f| f.count_by_severity(severity)).sum()
        };
        let critical = count(Severity::Critical);
        let high = count(Severity::High);
        let medium = count(Severity::Medium);
        let low = count(Severity::Low);
        let unknown = count(Severity::Unknown);

        let distinct_issues = findings
            .iter()
            .flat_map(|f| f.issues())
            .map(Issue::dedup_key)
            .collect::<HashSet<_>>()
            .len();

        let workers = findings
            .iter()
            .map(|f| WorkerStats {
                worker: f.worker_id().to_string(),
                worker_name: f.worker_name().to_string(),
                issues_found: f.issues().len(),
                confidence: f.confidence(),
                analysis_time_ms: f.analysis_time_ms(),
                degraded: f.is_degraded(),
            })
            .collect();

        Self {
            total_issues: critical + high + medium + low + unknown,
            critical,
            high,
            medium,
            low,
            unknown,
            distinct_issues,
            health_score: health_score(critical, high, medium, low),
            workers,
        }
    }

    pub fn health_band(&self) -> HealthBand {
        HealthBand::from_score(self.health_score)
    }

    pub fn degraded_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.degraded).count()
    }
}

/// `100 - (15*critical + 8*high + 3*medium + 1*low)`, floored at 0.
///
/// # Examples
///
/// ```
/// use pageaudit::synthesis::health_score;
///
/// assert_eq!(health_score(0, 0, 0, 0), 100);
/// assert_eq!(health_score(1, 2, 3, 4), 100 - (15 + 16 + 9 + 4));
/// assert_eq!(health_score(10, 0, 0, 0), 0);
/// ```
pub fn health_score(critical: usize, high: usize, medium: usize, low: usize) -> u8 {
    let penalty = critical
        .saturating_mul(15)
        .saturating_add(high.saturating_mul(8))
        .saturating_add(medium.saturating_mul(3))
        .saturating_add(low);
    100usize.saturating_sub(penalty) as u8
}

/// The derived, immutable report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedReport {
    summary_stats: SummaryStats,
    prioritized_issues: Vec<RankedIssue>,
    all_findings: Vec<Findings>,
}

impl SynthesizedReport {
    pub fn summary_stats(&self) -> &SummaryStats {
        &self.summary_stats
    }

    pub fn prioritized_issues(&self) -> &[RankedIssue] {
        &self.prioritized_issues
    }

    /// The top `k` issues by severity.
    pub fn top_issues(&self, k: usize) -> &[RankedIssue] {
        &self.prioritized_issues[..k.min(self.prioritized_issues.len())]
    }

    pub fn all_findings(&self) -> &[Findings] {
        &self.all_findings
    }
}

/// Build the report from findings collected for `workers` (both in
/// registration order).
///
/// Fails only on a broken invariant: a missing or extra findings record, a
/// record out of position, or a confidence outside `[0, 1]`.
pub fn synthesize(
    findings: Vec<Findings>,
    workers: &[WorkerIdentity],
) -> Result<SynthesizedReport, SynthesisError> {
    if findings.len() != workers.len() {
        return Err(SynthesisError::FindingsCountMismatch {
            expected: workers.len(),
            actual: findings.len(),
        });
    }

    for (position, (f, identity)) in findings.iter().zip(workers).enumerate() {
        if f.worker_id() != identity.id() {
            return Err(SynthesisError::UnexpectedWorker {
                position,
                expected: identity.id().to_string(),
                actual: f.worker_id().to_string(),
            });
        }
        if !(0.0..=1.0).contains(&f.confidence()) {
            return Err(SynthesisError::InvalidConfidence {
                worker_id: f.worker_id().to_string(),
                confidence: f.confidence(),
            });
        }
    }

    let prioritized_issues = rank_issues(&findings);
    let summary_stats = SummaryStats::from_findings(&findings);

    Ok(SynthesizedReport {
        summary_stats,
        prioritized_issues,
        all_findings: findings,
    })
}
