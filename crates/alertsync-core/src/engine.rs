//! Document-level driver: fetch, reconcile and apply, one kind at a time.

use indexmap::IndexMap;
use serde::Serialize;

use crate::document::DesiredDocument;
use crate::error::{SyncError, SyncResult};
use crate::id::PolicyId;
use crate::kind::ConditionKind;
use crate::model::{Change, ChangeAction, Condition};
use crate::reconcile::reconcile;
use crate::traits::{ConditionAdapters, ResourceAdapter};

/// Changes computed for one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindPlan {
    pub kind: ConditionKind,
    pub changes: Vec<Change>,
}

impl KindPlan {
    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes.iter().filter(|c| c.action() == action).count()
    }
}

/// What a sync run did to one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl KindReport {
    fn record(&mut self, action: ChangeAction) {
        match action {
            ChangeAction::Create => self.created += 1,
            ChangeAction::Update => self.updated += 1,
            ChangeAction::Delete => self.deleted += 1,
        }
    }
}

/// Per-kind outcome of a sync run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub kinds: IndexMap<ConditionKind, KindReport>,
}

impl SyncReport {
    pub fn for_kind(&self, kind: ConditionKind) -> KindReport {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }

    pub fn total(&self) -> KindReport {
        self.kinds
            .values()
            .fold(KindReport::default(), |acc, r| KindReport {
                created: acc.created + r.created,
                updated: acc.updated + r.updated,
                deleted: acc.deleted + r.deleted,
            })
    }
}

/// Converges every condition kind of `policy_id` onto `document`.
///
/// Kinds are processed in [`ConditionKind::ALL`] order. For each kind the
/// current conditions are fetched, reconciled against the desired ones and
/// the resulting changes applied one by one. The first failing call aborts
/// the run; changes applied before it stay applied.
pub async fn apply_desired_state(
    policy_id: &PolicyId,
    document: &DesiredDocument,
    adapters: &ConditionAdapters,
) -> SyncResult<SyncReport> {
    apply_each_kind(policy_id, adapters, |kind| document.conditions_for(kind)).await
}

/// Deletes every condition of every kind attached to `policy_id`.
pub async fn clear_conditions(
    policy_id: &PolicyId,
    adapters: &ConditionAdapters,
) -> SyncResult<SyncReport> {
    const NOTHING: &[Condition] = &[];
    apply_each_kind(policy_id, adapters, |_| NOTHING).await
}

async fn apply_each_kind<'d, F>(
    policy_id: &PolicyId,
    adapters: &ConditionAdapters,
    desired_for: F,
) -> SyncResult<SyncReport>
where
    F: Fn(ConditionKind) -> &'d [Condition],
{
    let mut report = SyncReport::default();

    for kind in ConditionKind::ALL {
        let adapter = adapters.get(kind)?;
        let current = adapter.list(policy_id).await?;
        let changes = reconcile(&current, desired_for(kind));
        tracing::debug!(
            %kind,
            current = current.len(),
            changes = changes.len(),
            "reconciled condition kind"
        );

        let entry = report.kinds.entry(kind).or_default();
        for change in &changes {
            apply_change(adapter, kind, policy_id, change).await?;
            entry.record(change.action());
        }
    }

    Ok(report)
}

/// Sends one change to the adapter for its kind.
pub async fn apply_change(
    adapter: &dyn ResourceAdapter,
    kind: ConditionKind,
    policy_id: &PolicyId,
    change: &Change,
) -> SyncResult<()> {
    match change {
        Change::Delete { current } => {
            let id = current.id.as_ref().ok_or_else(|| {
                SyncError::decode(format!("delete {kind}"), "current condition has no id")
            })?;
            adapter.delete(id).await?;
            tracing::info!(%kind, %id, name = %current.name, "deleted condition");
        }
        Change::Create { desired } => {
            let created = adapter.create(policy_id, desired).await?;
            match &created.id {
                Some(id) => tracing::info!(%kind, %id, name = %desired.name, "created condition"),
                None => tracing::info!(%kind, name = %desired.name, "created condition"),
            }
        }
        Change::Update { current, desired } => {
            let id = current.id.as_ref().ok_or_else(|| {
                SyncError::decode(format!("update {kind}"), "current condition has no id")
            })?;
            adapter.update(id, desired).await?;
            tracing::info!(%kind, %id, name = %desired.name, "updated condition");
        }
    }
    Ok(())
}

/// Computes the changes a sync would make without applying any of them.
///
/// Without a policy id (the policy does not exist yet) every kind starts
/// from an empty current set.
pub async fn plan_desired_state(
    policy_id: Option<&PolicyId>,
    document: &DesiredDocument,
    adapters: &ConditionAdapters,
) -> SyncResult<Vec<KindPlan>> {
    let mut plans = Vec::with_capacity(ConditionKind::ALL.len());

    for kind in ConditionKind::ALL {
        let current = match policy_id {
            Some(id) => adapters.get(kind)?.list(id).await?,
            None => Vec::new(),
        };
        let changes = reconcile(&current, document.conditions_for(kind));
        plans.push(KindPlan { kind, changes });
    }

    Ok(plans)
}

/// Fetches the current conditions of every kind, keyed in processing order.
pub async fn fetch_conditions(
    policy_id: &PolicyId,
    adapters: &ConditionAdapters,
) -> SyncResult<IndexMap<ConditionKind, Vec<Condition>>> {
    let mut all = IndexMap::new();
    for kind in ConditionKind::ALL {
        let conditions = adapters.get(kind)?.list(policy_id).await?;
        tracing::debug!(%kind, count = conditions.len(), "fetched conditions");
        all.insert(kind, conditions);
    }
    Ok(all)
}
