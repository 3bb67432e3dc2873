//! Configuration view and validation commands - `pageaudit config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use pageaudit::config::{AuditConfig, CONFIG_DIR, CONFIG_FILE, PageAuditToml};

    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("PageAudit Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE, config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let config = AuditConfig::new(project_dir.to_path_buf())?;
            let toml = &config.toml;

            println!("[completion]");
            println!("  endpoint = \"{}\"", toml.completion.endpoint);
            println!("  model = \"{}\"", toml.completion.model);
            println!("  api_key_env = \"{}\"", toml.completion.api_key_env);
            println!("  timeout_secs = {}", toml.completion.timeout_secs);
            println!("  max_tokens = {}", toml.completion.max_tokens);
            println!();

            println!("[coordinator]");
            println!(
                "  worker_timeout_secs = {}",
                toml.coordinator.worker_timeout_secs
            );
            println!(
                "  question_timeout_secs = {}",
                toml.coordinator.question_timeout_secs
            );
            println!("  summary_top_k = {}", toml.coordinator.summary_top_k);
            println!();

            println!("[workers]");
            for entry in &toml.workers {
                let state = if entry.enabled { "" } else { " (disabled)" };
                println!("  {}{}", entry.kind.worker_id(), state);
                if !entry.focus_areas.is_empty() {
                    println!("    focus_areas = {:?}", entry.focus_areas);
                }
                if !entry.peers.is_empty() {
                    println!("    peers = {:?}", entry.peers);
                }
            }
            println!();

            let key_set = std::env::var(&toml.completion.api_key_env)
                .is_ok_and(|v| !v.trim().is_empty());
            println!("Effective values (with env overrides):");
            println!(
                "  {} is {}",
                toml.completion.api_key_env,
                if key_set { "set" } else { "not set" }
            );
            println!();

            if !config_path.exists() {
                println!("Run 'pageaudit config init' to create a {} file.", CONFIG_FILE);
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Using defaults (valid).", CONFIG_FILE);
                return Ok(());
            }

            let toml = PageAuditToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("{} already exists at {}", CONFIG_FILE, config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)?;
            }

            let toml = PageAuditToml::default();
            toml.save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [completion] endpoint, model, api_key_env");
            println!("  - [coordinator] worker_timeout_secs, summary_top_k");
            println!("  - [[workers]] kind, enabled, focus_areas, peers");
            println!();
        }
    }

    Ok(())
}
