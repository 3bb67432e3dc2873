//! Specialist listing - `pageaudit workers`.

use anyhow::Result;
use console::style;
use std::path::Path;

use pageaudit::config::AuditConfig;
use pageaudit::worker::SpecialistKind;

pub fn cmd_workers(project_dir: &Path) -> Result<()> {
    let config = AuditConfig::new(project_dir.to_path_buf())?;

    println!();
    println!("{}", style("Built-in specialists").bold());
    for kind in SpecialistKind::all_builtins() {
        let id = kind.worker_id();
        let enabled = config
            .toml
            .enabled_workers()
            .any(|e| e.kind.worker_id() == id);
        let vision = if kind.uses_vision() { " [vision]" } else { "" };
        let marker = if enabled {
            style("enabled").green()
        } else {
            style("disabled").dim()
        };
        println!(
            "  {:<14} {:<24} {}{}",
            style(&id).cyan(),
            kind.display_name(),
            marker,
            style(vision).dim()
        );
        println!("  {:<14} {}", "", style(kind.focus_areas().join(", ")).dim());
    }

    let custom: Vec<_> = config
        .toml
        .workers
        .iter()
        .filter(|e| !e.kind.is_builtin())
        .collect();
    if !custom.is_empty() {
        println!();
        println!("{}", style("Custom specialists (pageaudit.toml)").bold());
        for entry in custom {
            let marker = if entry.enabled {
                style("enabled").green()
            } else {
                style("disabled").dim()
            };
            println!(
                "  {:<14} {:<24} {}",
                style(entry.kind.worker_id()).cyan(),
                entry.kind.display_name(),
                marker
            );
            if !entry.focus_areas.is_empty() {
                println!("  {:<14} {}", "", style(entry.focus_areas.join(", ")).dim());
            }
        }
    }
    println!();

    Ok(())
}
