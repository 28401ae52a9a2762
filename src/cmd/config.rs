//! Configuration view and validation commands: `shipyard config`.

use anyhow::Result;
use shipyard::config::ShipyardToml;
use std::path::Path;

use super::super::ConfigCommands;

pub fn cmd_config(
    config_path: &Path,
    effective: &ShipyardToml,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Shipyard Configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No shipyard.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            println!("[pipeline]");
            println!("  name = \"{}\"", effective.pipeline.name);
            println!("  strategy = \"{}\"", effective.pipeline.strategy);
            println!("  steps = [{}]", quoted(&effective.pipeline.steps));
            println!();

            println!("[notifications]");
            println!("  channels = [{}]", quoted(&effective.notifications.channels));
            println!();

            println!("[logging]");
            println!("  level = \"{}\"", effective.logging.level);
            println!("  json = {}", effective.logging.json);
            if let Some(dir) = &effective.logging.dir {
                println!("  dir = \"{}\"", dir.display());
            }
            println!();
            println!("Values include SHIPYARD_STRATEGY / SHIPYARD_LOG overrides.");
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No shipyard.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = ShipyardToml::load(config_path)?;
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
                println!("shipyard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent)?;
            }

            ShipyardToml::default().save(config_path)?;

            println!("Created shipyard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [pipeline] name, strategy, steps");
            println!("  - [notifications] channels");
            println!("  - [logging] level, json, dir");
            println!();
        }
    }

    Ok(())
}

fn quoted(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
