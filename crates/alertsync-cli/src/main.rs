mod auth;
mod cli;
mod commands;
mod config;
mod observability;
mod output;

use std::path::Path;

use alertsync_core::ConditionAdapters;
use alertsync_newrelic::{NewRelicClient, PolicyApi, condition_adapters};
use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dir = config::config_dir()?;
    let profile = &cli.profile;
    let api_key = cli.api_key.as_deref();

    match &cli.command {
        Commands::Login => commands::auth::login(&dir, api_key, profile)?,
        Commands::Logout => commands::auth::logout(&dir, profile)?,
        Commands::Whoami => commands::auth::whoami(&dir, api_key, profile)?,
        Commands::Config(args) => commands::config::run(&dir, profile, &args.command)?,
        Commands::Upload(args) => {
            let (client, format) = make_client(&dir, api_key, profile, cli.format)?;
            let (directory, adapters) = collaborators(&client);
            commands::upload::upload(&directory, &adapters, args, format).await?;
        }
        Commands::Download(args) => {
            let (client, _) = make_client(&dir, api_key, profile, cli.format)?;
            let (directory, adapters) = collaborators(&client);
            commands::download::download(&directory, &adapters, args).await?;
        }
        Commands::Clear(args) => {
            let (client, format) = make_client(&dir, api_key, profile, cli.format)?;
            let (directory, adapters) = collaborators(&client);
            commands::clear::clear(&directory, &adapters, args, format).await?;
        }
    }

    Ok(())
}

/// Builds the API client from the resolved key and the profile's endpoints.
fn make_client(
    dir: &Path,
    api_key: Option<&str>,
    profile: &str,
    format: Option<cli::OutputFormat>,
) -> Result<(NewRelicClient, cli::OutputFormat)> {
    let cfg = config::load_profile(dir, profile)?;
    let (key, source) = auth::resolve_api_key(api_key, dir, profile)?;
    let endpoints = cfg.endpoints()?;
    tracing::debug!(
        profile,
        ?source,
        api = %endpoints.api,
        infra = %endpoints.infra,
        "resolved client settings"
    );
    let client = NewRelicClient::new(reqwest::Client::new(), key, endpoints);
    Ok((client, format.or(cfg.format).unwrap_or_default()))
}

fn collaborators(client: &NewRelicClient) -> (PolicyApi, ConditionAdapters) {
    (PolicyApi::new(client.clone()), condition_adapters(client))
}
