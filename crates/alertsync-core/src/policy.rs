//! Policy resolution: find, look up, create or update.

use crate::error::{SyncError, SyncResult};
use crate::id::PolicyId;
use crate::model::{Policy, PolicyDescriptor};
use crate::traits::PolicyDirectory;

/// Whether an upsert created a new policy or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// The policy a run will reconcile against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertedPolicy {
    pub policy: Policy,
    pub outcome: UpsertOutcome,
}

/// Finds the single policy named exactly `name`.
///
/// The directory may match names loosely, so results are narrowed to exact
/// matches here.
///
/// # Errors
///
/// `PolicyNotFound` when nothing matches, `AmbiguousPolicyName` when more
/// than one policy does.
pub async fn find_policy(directory: &dyn PolicyDirectory, name: &str) -> SyncResult<Policy> {
    let mut matches: Vec<Policy> = directory
        .find_by_name(name)
        .await?
        .into_iter()
        .filter(|p| p.name == name)
        .collect();

    match matches.len() {
        0 => Err(SyncError::policy_name_not_found(name)),
        1 => Ok(matches.remove(0)),
        n => Err(SyncError::AmbiguousPolicyName {
            name: name.to_string(),
            matches: n,
        }),
    }
}

/// Fetches a policy by id, reporting a missing one as a stale identifier.
pub async fn get_policy(directory: &dyn PolicyDirectory, id: &PolicyId) -> SyncResult<Policy> {
    directory.get_by_id(id).await.map_err(|e| stale_if_missing(e, id))
}

/// Creates the policy described by `descriptor`, or updates the one it
/// already refers to.
///
/// With an explicit id the policy is updated unconditionally. Otherwise the
/// name is looked up: no match creates, one match updates, several matches
/// fail with `AmbiguousPolicyName` before anything is written.
pub async fn upsert_policy(
    directory: &dyn PolicyDirectory,
    descriptor: &PolicyDescriptor,
    explicit_id: Option<&PolicyId>,
) -> SyncResult<UpsertedPolicy> {
    let PolicyDescriptor {
        name,
        incident_preference,
    } = descriptor;

    if let Some(id) = explicit_id {
        let policy = directory
            .update(id, name, *incident_preference)
            .await
            .map_err(|e| stale_if_missing(e, id))?;
        tracing::info!(%id, %name, "updated policy by explicit id");
        return Ok(UpsertedPolicy {
            policy,
            outcome: UpsertOutcome::Updated,
        });
    }

    match find_policy(directory, name).await {
        Ok(existing) => {
            let policy = directory
                .update(&existing.id, name, *incident_preference)
                .await?;
            tracing::info!(id = %policy.id, %name, "updated policy");
            Ok(UpsertedPolicy {
                policy,
                outcome: UpsertOutcome::Updated,
            })
        }
        Err(e) if e.is_policy_not_found() => {
            let policy = directory.create(name, *incident_preference).await?;
            tracing::info!(id = %policy.id, %name, "created policy");
            Ok(UpsertedPolicy {
                policy,
                outcome: UpsertOutcome::Created,
            })
        }
        Err(e) => Err(e),
    }
}

/// Resolves the policy a dry run would target, without writing anything.
///
/// Returns `None` when the policy would be created.
pub async fn lookup_policy(
    directory: &dyn PolicyDirectory,
    name: &str,
    explicit_id: Option<&PolicyId>,
) -> SyncResult<Option<Policy>> {
    if let Some(id) = explicit_id {
        return get_policy(directory, id).await.map(Some);
    }
    match find_policy(directory, name).await {
        Ok(policy) => Ok(Some(policy)),
        Err(e) if e.is_policy_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn stale_if_missing(error: SyncError, id: &PolicyId) -> SyncError {
    if error.is_policy_not_found() || error.is_remote_not_found() {
        SyncError::StalePolicyIdentifier { id: id.clone() }
    } else {
        error
    }
}
