//! The consumer-facing result of a run.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::summary::ExecutiveSummary;
use crate::synthesis::{SummaryStats, SynthesizedReport};
use crate::worker::Findings;

/// Executive summary, all findings and the synthesized report of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub url: String,
    pub duration_ms: u64,
    pub executive_summary: ExecutiveSummary,
    pub synthesized_report: SynthesizedReport,
}

impl AuditReport {
    /// One findings record per registered worker, in registration order.
    pub fn all_findings(&self) -> &[Findings] {
        self.synthesized_report.all_findings()
    }

    pub fn stats(&self) -> &SummaryStats {
        self.synthesized_report.summary_stats()
    }

    /// Whether any worker was downgraded during the run.
    pub fn has_degraded_workers(&self) -> bool {
        self.all_findings().iter().any(Findings::is_degraded)
    }
}
