//! The `pageaudit audit` command.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pageaudit::bus::EventBus;
use pageaudit::completion::{CompletionClient, HttpCompletionClient, UnavailableCompletion};
use pageaudit::config::{AuditConfig, WorkerEntry};
use pageaudit::coordinator::{AuditReport, Coordinator};
use pageaudit::page::{DomSnapshot, PageContext, Screenshot};
use pageaudit::ui::{AuditProgressView, OutputFormat, render_json, render_text};
use pageaudit::worker::{SpecialistKind, SpecialistWorker};

use super::super::{AuditArgs, Cli};

/// Resolve the worker list: `--only` picks kinds (using their config entry
/// when there is one), otherwise every enabled entry in registration order.
/// A name that matches neither a built-in nor a config entry still runs, as
/// a custom specialist, but is warned about since it is usually a typo.
fn select_workers(config: &AuditConfig, only: &[String]) -> Vec<WorkerEntry> {
    if only.is_empty() {
        return config.toml.enabled_workers().cloned().collect();
    }
    let mut selected: Vec<WorkerEntry> = Vec::new();
    for name in only.iter().filter(|n| !n.trim().is_empty()) {
        let kind: SpecialistKind = match name.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        };
        let id = kind.worker_id();
        if selected.iter().any(|e| e.kind.worker_id() == id) {
            continue;
        }
        let configured = config.toml.workers.iter().find(|e| e.kind.worker_id() == id);
        let entry = match configured {
            Some(entry) => entry.clone(),
            None => {
                if !kind.is_builtin() {
                    tracing::warn!(
                        "'{}' is not a built-in specialist or a configured worker; running it as a custom specialist",
                        name.trim()
                    );
                }
                WorkerEntry::new(kind)
            }
        };
        selected.push(entry);
    }
    selected
}

fn load_page(args: &AuditArgs) -> Result<PageContext> {
    let mut builder = PageContext::builder(&args.url).viewport(args.viewport);
    if let Some(title) = &args.title {
        builder = builder.title(title);
    }
    if let Some(path) = &args.dom {
        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read DOM snapshot: {}", path.display()))?;
        builder = builder.dom_snapshot(DomSnapshot::new(html));
    }
    for path in &args.screenshots {
        builder = builder.screenshot(Screenshot::from_file(path)?);
    }
    Ok(builder.build()?)
}

/// Completion client for workers, plus the client for the summary (if any).
fn completion_clients(
    config: &AuditConfig,
    args: &AuditArgs,
) -> Result<(Arc<dyn CompletionClient>, Option<Arc<dyn CompletionClient>>)> {
    if args.no_ai {
        let client: Arc<dyn CompletionClient> =
            Arc::new(UnavailableCompletion::new("disabled with --no-ai"));
        return Ok((client, None));
    }

    let mut http = config.completion();
    if let Some(model) = &args.model {
        http.model = model.clone();
    }
    let api_key_env = http.api_key_env.clone();
    let client = HttpCompletionClient::from_env(http).context("Failed to build completion client")?;
    if !client.has_credential() {
        tracing::warn!(
            env_var = %api_key_env,
            "no API key configured; specialists and summary will fall back to rule-based results"
        );
    }
    tracing::debug!(client = %client.describe(), "completion client ready");
    let client: Arc<dyn CompletionClient> = Arc::new(client);
    Ok((Arc::clone(&client), Some(client)))
}

pub async fn cmd_audit(cli: &Cli, project_dir: &Path, args: &AuditArgs) -> Result<()> {
    let config = AuditConfig::new(project_dir.to_path_buf())?;
    for warning in config.validate() {
        tracing::warn!("config: {}", warning);
    }

    let page = load_page(args)?;
    let (worker_client, summary_client) = completion_clients(&config, args)?;

    let mut coordinator_config = config.coordinator();
    if let Some(secs) = args.worker_timeout {
        coordinator_config =
            coordinator_config.with_worker_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    if let Some(top) = args.top {
        coordinator_config = coordinator_config.with_summary_top_k(top);
    }
    let top_k = coordinator_config.summary_top_k;

    let bus = EventBus::new();
    let mut coordinator = Coordinator::new(bus.clone()).with_config(coordinator_config);
    if let Some(client) = summary_client {
        coordinator = coordinator.with_summary_client(client);
    }
    for entry in select_workers(&config, &args.only) {
        let worker = SpecialistWorker::new(entry.kind, Arc::clone(&worker_client))
            .with_focus_areas(entry.focus_areas)
            .with_peers(entry.peers);
        coordinator.register(Arc::new(worker))?;
    }
    if coordinator.worker_count() == 0 {
        tracing::warn!("no workers selected; the report will be empty");
    }

    let show_progress = args.format == OutputFormat::Text && !args.quiet;
    let mut view = show_progress.then(|| {
        let mut view = AuditProgressView::new(&coordinator.worker_identities(), cli.verbose);
        view.attach(&bus);
        view
    });

    let result = coordinator.orchestrate(Arc::new(page)).await;
    if let Some(view) = view.take() {
        view.finish();
    }
    bus.clear();
    let report: AuditReport = result.context("Audit run failed")?;

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&report, top_k, args.detailed)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if let Some(threshold) = args.fail_on {
        let failing = report
            .synthesized_report
            .prioritized_issues()
            .iter()
            .filter(|r| r.issue.severity().rank() >= threshold.rank())
            .count();
        if failing > 0 {
            anyhow::bail!(
                "{} issue(s) at or above '{}' severity",
                failing,
                threshold
            );
        }
    }

    Ok(())
}
