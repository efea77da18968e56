//! Capabilities the engine needs from the monitoring service.
//!
//! The engine never talks HTTP. It is handed one [`ResourceAdapter`] per
//! condition kind and a [`PolicyDirectory`], and drives them strictly one
//! call at a time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{SyncError, SyncResult};
use crate::id::{ConditionId, PolicyId};
use crate::kind::ConditionKind;
use crate::model::{Condition, IncidentPreference, Policy};

/// Remote CRUD for exactly one condition kind.
///
/// Implementations must turn any non-success response into an error.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Lists every condition of this kind attached to a policy.
    async fn list(&self, policy_id: &PolicyId) -> SyncResult<Vec<Condition>>;

    /// Creates a condition on a policy and returns it as stored.
    async fn create(&self, policy_id: &PolicyId, condition: &Condition) -> SyncResult<Condition>;

    /// Replaces the condition with the given id.
    async fn update(&self, condition_id: &ConditionId, condition: &Condition) -> SyncResult<()>;

    /// Deletes the condition with the given id.
    async fn delete(&self, condition_id: &ConditionId) -> SyncResult<()>;
}

/// Remote lookup and mutation of alert policies.
#[async_trait]
pub trait PolicyDirectory: Send + Sync {
    /// Returns every policy whose name is exactly `name`. May be empty.
    async fn find_by_name(&self, name: &str) -> SyncResult<Vec<Policy>>;

    /// Returns the policy with the given id.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::PolicyNotFound` if no policy has this id.
    async fn get_by_id(&self, id: &PolicyId) -> SyncResult<Policy>;

    async fn create(&self, name: &str, incident_preference: IncidentPreference)
    -> SyncResult<Policy>;

    async fn update(
        &self,
        id: &PolicyId,
        name: &str,
        incident_preference: IncidentPreference,
    ) -> SyncResult<Policy>;
}

/// Shared handle to a resource adapter.
pub type DynResourceAdapter = Arc<dyn ResourceAdapter>;

/// The adapter registered for each condition kind.
#[derive(Clone, Default)]
pub struct ConditionAdapters {
    adapters: HashMap<ConditionKind, DynResourceAdapter>,
}

impl ConditionAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the adapter for `kind`.
    pub fn with(mut self, kind: ConditionKind, adapter: DynResourceAdapter) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    pub fn insert(&mut self, kind: ConditionKind, adapter: DynResourceAdapter) {
        self.adapters.insert(kind, adapter);
    }

    /// Returns the adapter for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingAdapter` if none was registered.
    pub fn get(&self, kind: ConditionKind) -> SyncResult<&dyn ResourceAdapter> {
        self.adapters
            .get(&kind)
            .map(|a| a.as_ref())
            .ok_or(SyncError::MissingAdapter(kind))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
