use std::path::Path;

use alertsync_newrelic::{DEFAULT_API_URL, DEFAULT_INFRA_API_URL};
use anyhow::Result;
use colored::Colorize;

use crate::cli::{ConfigCommands, OutputFormat};
use crate::config;
use crate::output::print_success;

pub fn run(dir: &Path, profile: &str, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let cfg = config::load_profile(dir, profile)?;
            println!("{}: {}", "Profile".cyan(), profile);
            println!(
                "{}: {}",
                "API URL".cyan(),
                cfg.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
            );
            println!(
                "{}: {}",
                "Infrastructure API URL".cyan(),
                cfg.infra_api_url.as_deref().unwrap_or(DEFAULT_INFRA_API_URL)
            );
            let format = cfg.format.unwrap_or_default();
            println!("{}: {}", "Format".cyan(), format_name(format));
        }
        ConfigCommands::Set(args) => {
            let mut cfg = config::load_profile(dir, profile)?;
            cfg.set(&args.key, &args.value)?;
            config::save_profile(dir, profile, &cfg)?;
            print_success(&format!("Set {} = {}", args.key, args.value));
        }
    }
    Ok(())
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Table => "table",
        OutputFormat::Json => "json",
        OutputFormat::Yaml => "yaml",
    }
}
