use alertsync_core::{ConditionAdapters, PolicyDirectory, clear_conditions};
use anyhow::Result;
use colored::Colorize;

use crate::cli::{ClearArgs, OutputFormat};
use crate::output::{print_report, print_success_status};

pub async fn clear(
    directory: &dyn PolicyDirectory,
    adapters: &ConditionAdapters,
    args: &ClearArgs,
    format: OutputFormat,
) -> Result<()> {
    let policy = super::resolve_policy(directory, &args.policy).await?;
    let report = clear_conditions(&policy.id, adapters).await?;
    print_report(&report, format)?;
    print_success_status(
        format,
        &format!(
            "Removed {} conditions from {}",
            report.total().deleted,
            policy.name.cyan()
        ),
    );
    Ok(())
}
