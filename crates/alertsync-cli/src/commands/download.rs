use std::fs;

use alertsync_core::{
    ConditionAdapters, DesiredDocument, PolicyDescriptor, PolicyDirectory, fetch_conditions,
};
use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::DownloadArgs;
use crate::output::print_success;

pub async fn download(
    directory: &dyn PolicyDirectory,
    adapters: &ConditionAdapters,
    args: &DownloadArgs,
) -> Result<()> {
    let policy = super::resolve_policy(directory, &args.policy).await?;
    let conditions = fetch_conditions(&policy.id, adapters).await?;

    let mut document = DesiredDocument::new(PolicyDescriptor::from(&policy));
    for (kind, list) in conditions {
        document.set_conditions(kind, list);
    }
    let yaml = document.to_yaml()?;

    match &args.output {
        Some(path) => {
            fs::write(path, yaml).with_context(|| format!("Failed to write {path}"))?;
            print_success(&format!(
                "Wrote policy {} ({} conditions) to {}",
                policy.name.cyan(),
                document.condition_count(),
                path.cyan()
            ));
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
