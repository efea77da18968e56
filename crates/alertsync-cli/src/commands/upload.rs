use std::fs;

use alertsync_core::{
    ConditionAdapters, DesiredDocument, ParseOptions, PolicyDirectory, PolicyId, UpsertOutcome,
    apply_desired_state, lookup_policy, plan_desired_state, upsert_policy,
};
use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::{OutputFormat, UploadArgs};
use crate::output::{print_plans, print_report, print_status, print_success_status};

pub fn read_document(args: &UploadArgs) -> Result<DesiredDocument> {
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read file: {}", args.file))?;
    let options = ParseOptions {
        vars: args.vars.iter().cloned().collect(),
        ignore_condition_ids: args.ignore_ids,
    };
    DesiredDocument::parse(&source, &options)
        .with_context(|| format!("Invalid policy file {}", args.file))
}

pub async fn upload(
    directory: &dyn PolicyDirectory,
    adapters: &ConditionAdapters,
    args: &UploadArgs,
    format: OutputFormat,
) -> Result<()> {
    let document = read_document(args)?;
    let explicit_id = args
        .policy_id
        .as_deref()
        .map(str::parse::<PolicyId>)
        .transpose()?;

    if args.dry_run {
        let existing =
            lookup_policy(directory, &document.policy.name, explicit_id.as_ref()).await?;
        match &existing {
            Some(policy) => print_status(
                format,
                &format!("Would update policy {} ({})", policy.name.cyan(), policy.id),
            ),
            None => print_status(
                format,
                &format!("Would create policy {}", document.policy.name.cyan()),
            ),
        }
        let plans =
            plan_desired_state(existing.as_ref().map(|p| &p.id), &document, adapters).await?;
        return print_plans(&plans, format);
    }

    let upserted = upsert_policy(directory, &document.policy, explicit_id.as_ref()).await?;
    let verb = match upserted.outcome {
        UpsertOutcome::Created => "Created",
        UpsertOutcome::Updated => "Updated",
    };
    print_success_status(
        format,
        &format!(
            "{verb} policy {} ({})",
            upserted.policy.name.cyan(),
            upserted.policy.id
        ),
    );

    let report = apply_desired_state(&upserted.policy.id, &document, adapters).await?;
    print_report(&report, format)?;
    print_success_status(
        format,
        &format!("Synced {} conditions", document.condition_count()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertsync_core::ConditionKind;
    use std::io::Write;

    fn args_for(file: &tempfile::NamedTempFile) -> UploadArgs {
        UploadArgs {
            file: file.path().display().to_string(),
            policy_id: None,
            vars: vec![("env".to_string(), "prod".to_string())],
            ignore_ids: false,
            dry_run: true,
        }
    }

    #[test]
    fn test_read_document_expands_vars() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name: web-{{{{ env }}}}\nincident_preference: PER_POLICY\nnrql_conditions:\n  - name: errors-{{{{ env }}}}\n"
        )
        .unwrap();

        let document = read_document(&args_for(&file)).unwrap();
        assert_eq!(document.policy.name, "web-prod");
        assert_eq!(
            document.conditions_for(ConditionKind::Nrql)[0].name,
            "errors-prod"
        );
    }

    #[test]
    fn test_read_document_missing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut args = args_for(&file);
        args.file = format!("{}.missing", args.file);
        let err = read_document(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
