//! Rendering of a finished [`AuditReport`] for the terminal or as JSON.

use std::fmt::Write as _;
use std::str::FromStr;

use anyhow::{Context, Result};
use console::style;

use crate::coordinator::AuditReport;
use crate::ui::icons::{ARROW, CHECK, CROSS, PROGRESS, SPARKLE};
use crate::util::pluralize;
use crate::worker::Severity;

/// How `pageaudit audit` prints its report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("Unknown output format '{}': expected text or json", other),
        }
    }
}

pub fn render_json(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize audit report")
}

fn format_duration(ms: u64) -> String {
    if ms >= 60_000 {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    } else if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

fn severity_label(severity: Severity) -> String {
    let label = severity.to_string().to_uppercase();
    match severity {
        Severity::Critical => style(label).red().bold().to_string(),
        Severity::High => style(label).red().to_string(),
        Severity::Medium => style(label).yellow().to_string(),
        Severity::Low => style(label).blue().to_string(),
        Severity::Unknown => style(label).dim().to_string(),
    }
}

/// Render the report as terminal text.
///
/// Shows the top `top_k` issues; `detailed` adds every issue and each
/// worker's suggestions.
pub fn render_text(report: &AuditReport, top_k: usize, detailed: bool) -> String {
    let mut out = String::new();
    let stats = report.stats();

    let _ = writeln!(out);
    let _ = writeln!(out, "{}{}", PROGRESS, style(format!("Page audit: {}", report.url)).bold());
    let _ = writeln!(
        out,
        "   {}",
        style(format!(
            "run {} in {}",
            report.run_id,
            format_duration(report.duration_ms)
        ))
        .dim()
    );
    let _ = writeln!(out);

    let summary = &report.executive_summary;
    let source = if summary.is_fallback() {
        style("(rule-based)").yellow().to_string()
    } else {
        style("(AI)").green().to_string()
    };
    let _ = writeln!(out, "{}{} {}", SPARKLE, style("Executive summary").bold(), source);
    for line in summary.text.lines() {
        let _ = writeln!(out, "  {}", line);
    }
    if let Some(reason) = &summary.error {
        let _ = writeln!(out, "  {}", style(format!("AI summary unavailable: {}", reason)).dim());
    }
    let _ = writeln!(out);

    let band = stats.health_band();
    let _ = writeln!(
        out,
        "Health: {} {}/100 ({})",
        band.emoji(),
        style(stats.health_score).bold(),
        band
    );
    let _ = writeln!(
        out,
        "Issues: {} total, {} distinct | {} {} critical  {} {} high  {} {} medium  {} {} low",
        stats.total_issues,
        stats.distinct_issues,
        Severity::Critical.emoji(),
        stats.critical,
        Severity::High.emoji(),
        stats.high,
        Severity::Medium.emoji(),
        stats.medium,
        Severity::Low.emoji(),
        stats.low,
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", style("Auditors").bold());
    for findings in report.all_findings() {
        let status = if findings.is_degraded() { CROSS } else { CHECK };
        let detail = if findings.is_degraded() {
            let reason = findings
                .metadata()
                .get("reason")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            style(format!("degraded: {}", reason)).red().to_string()
        } else {
            format!(
                "{}, confidence {:.2}, {}",
                pluralize(findings.issues().len(), "issue", "issues"),
                findings.confidence(),
                format_duration(findings.analysis_time_ms())
            )
        };
        let _ = writeln!(out, "  {}{:<24} {}", status, findings.worker_name(), detail);
    }
    let _ = writeln!(out);

    let issues = if detailed {
        report.synthesized_report.prioritized_issues()
    } else {
        report.synthesized_report.top_issues(top_k)
    };
    if issues.is_empty() {
        let _ = writeln!(out, "{}", style("No issues reported.").green());
    } else {
        let heading = if detailed { "All issues" } else { "Top issues" };
        let _ = writeln!(out, "{}", style(heading).bold());
        for (i, ranked) in issues.iter().enumerate() {
            let issue = &ranked.issue;
            let _ = write!(
                out,
                "  {}. [{}] {}",
                i + 1,
                severity_label(issue.severity()),
                issue.title()
            );
            if !issue.location().is_empty() {
                let _ = write!(out, " {}", style(format!("@ {}", issue.location())).dim());
            }
            let _ = writeln!(out, " {}", style(format!("({})", ranked.source_worker)).dim());
            if detailed && !issue.description().is_empty() {
                let _ = writeln!(out, "     {}", issue.description());
            }
            if !issue.suggestion().is_empty() {
                let _ = writeln!(out, "     {}{}", ARROW, issue.suggestion());
            }
        }
        let hidden = report.synthesized_report.prioritized_issues().len() - issues.len();
        if hidden > 0 {
            let _ = writeln!(
                out,
                "  {}",
                style(format!("... and {} more (use --detailed)", hidden)).dim()
            );
        }
    }

    if detailed {
        for findings in report.all_findings() {
            if findings.suggestions().is_empty() {
                continue;
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", style(format!("{} suggestions", findings.worker_name())).bold());
            for suggestion in findings.suggestions() {
                let _ = writeln!(out, "  {}{}", ARROW, suggestion);
            }
        }
    }

    out
}
