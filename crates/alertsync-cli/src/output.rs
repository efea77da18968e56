use alertsync_core::{Change, KindPlan, SyncReport};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Prints any serializable value as JSON or YAML. Table format falls back
/// to YAML for values with no tabular shape.
pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml | OutputFormat::Table => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Stream that human-readable status lines go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStream {
    Stdout,
    Stderr,
}

impl StatusStream {
    /// Stdout is reserved for the document when it carries JSON or YAML.
    pub fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => StatusStream::Stdout,
            OutputFormat::Json | OutputFormat::Yaml => StatusStream::Stderr,
        }
    }
}

/// Prints a status line next to structured output without corrupting it.
pub fn print_status(format: OutputFormat, msg: &str) {
    match StatusStream::for_format(format) {
        StatusStream::Stdout => println!("{msg}"),
        StatusStream::Stderr => eprintln!("{msg}"),
    }
}

/// `print_success` for commands that also emit structured output.
pub fn print_success_status(format: OutputFormat, msg: &str) {
    print_status(format, &format!("{} {}", "✓".green(), msg));
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Prints the changes a dry run would make.
pub fn print_plans(plans: &[KindPlan], format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Table {
        return print_value(&plans, format);
    }

    let changes: Vec<_> = plans
        .iter()
        .flat_map(|plan| plan.changes.iter().map(move |c| (plan.kind, c)))
        .collect();
    if changes.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Kind", "Action", "ID", "Name"]);
    for (kind, change) in changes {
        let id = change
            .target_id()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            kind.plural().to_string(),
            colored_action(change),
            id,
            change.name().to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    Ok(())
}

fn colored_action(change: &Change) -> String {
    let action = change.action().to_string();
    match change {
        Change::Create { .. } => action.green().to_string(),
        Change::Update { .. } => action.yellow().to_string(),
        Change::Delete { .. } => action.red().to_string(),
    }
}

/// Prints per-kind counts of a finished sync.
pub fn print_report(report: &SyncReport, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Table {
        return print_value(report, format);
    }

    let mut builder = Builder::default();
    builder.push_record(["Kind", "Created", "Updated", "Deleted"]);
    for (kind, counts) in &report.kinds {
        builder.push_record([
            kind.plural().to_string(),
            counts.created.to_string(),
            counts.updated.to_string(),
            counts.deleted.to_string(),
        ]);
    }
    let total = report.total();
    builder.push_record([
        "total".bold().to_string(),
        total.created.to_string(),
        total.updated.to_string(),
        total.deleted.to_string(),
    ]);
    println!("{}", builder.build().with(Style::rounded()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines_leave_structured_stdout_alone() {
        assert_eq!(
            StatusStream::for_format(OutputFormat::Table),
            StatusStream::Stdout
        );
        assert_eq!(
            StatusStream::for_format(OutputFormat::Json),
            StatusStream::Stderr
        );
        assert_eq!(
            StatusStream::for_format(OutputFormat::Yaml),
            StatusStream::Stderr
        );
    }
}
