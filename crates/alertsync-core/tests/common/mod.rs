//! In-memory stand-ins for the remote service.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use alertsync_core::{
    Condition, ConditionAdapters, ConditionId, ConditionKind, IncidentPreference, Policy,
    PolicyDirectory, PolicyId, ResourceAdapter, SyncError, SyncResult,
};
use async_trait::async_trait;
use std::sync::Arc;

/// A recorded adapter call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(PolicyId),
    Create(PolicyId, Condition),
    Update(ConditionId, Condition),
    Delete(ConditionId),
}

/// Condition store for one kind. Every call is recorded.
pub struct MemoryAdapter {
    kind: ConditionKind,
    conditions: Mutex<Vec<Condition>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    fail_on_call: Option<usize>,
}

impl MemoryAdapter {
    pub fn new(kind: ConditionKind, conditions: Vec<Condition>) -> Self {
        Self {
            kind,
            conditions: Mutex::new(conditions),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            fail_on_call: None,
        }
    }

    /// Makes the n-th mutating call (0-based) fail with HTTP 500.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List(_)))
            .collect()
    }

    pub fn conditions(&self) -> Vec<Condition> {
        self.conditions.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> SyncResult<()> {
        let mut calls = self.calls.lock().unwrap();
        let mutation_index = calls.iter().filter(|c| !matches!(c, Call::List(_))).count();
        let is_mutation = !matches!(call, Call::List(_));
        calls.push(call);
        if is_mutation && self.fail_on_call == Some(mutation_index) {
            return Err(SyncError::Transport {
                operation: format!("write {}", self.kind),
                method: "POST".into(),
                url: "memory://".into(),
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceAdapter for MemoryAdapter {
    async fn list(&self, policy_id: &PolicyId) -> SyncResult<Vec<Condition>> {
        self.record(Call::List(policy_id.clone()))?;
        Ok(self.conditions())
    }

    async fn create(&self, policy_id: &PolicyId, condition: &Condition) -> SyncResult<Condition> {
        self.record(Call::Create(policy_id.clone(), condition.clone()))?;
        let mut created = condition.clone();
        created.id = Some(ConditionId::Number(
            self.next_id.fetch_add(1, Ordering::SeqCst),
        ));
        self.conditions.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, condition_id: &ConditionId, condition: &Condition) -> SyncResult<()> {
        self.record(Call::Update(condition_id.clone(), condition.clone()))?;
        let mut conditions = self.conditions.lock().unwrap();
        if let Some(slot) = conditions
            .iter_mut()
            .find(|c| c.id.as_ref() == Some(condition_id))
        {
            *slot = condition.clone();
            slot.id = Some(condition_id.clone());
        }
        Ok(())
    }

    async fn delete(&self, condition_id: &ConditionId) -> SyncResult<()> {
        self.record(Call::Delete(condition_id.clone()))?;
        self.conditions
            .lock()
            .unwrap()
            .retain(|c| c.id.as_ref() != Some(condition_id));
        Ok(())
    }
}

/// One empty adapter per kind, with overrides.
pub fn adapters_with(overrides: Vec<(ConditionKind, Arc<MemoryAdapter>)>) -> ConditionAdapters {
    let mut adapters = ConditionAdapters::new();
    for kind in ConditionKind::ALL {
        adapters.insert(kind, Arc::new(MemoryAdapter::new(kind, Vec::new())));
    }
    for (kind, adapter) in overrides {
        adapters.insert(kind, adapter);
    }
    adapters
}

/// A recorded directory call.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryCall {
    FindByName(String),
    GetById(PolicyId),
    Create(String, IncidentPreference),
    Update(PolicyId, String, IncidentPreference),
}

/// Policy store. `find_by_name` matches by substring, like the real API.
pub struct MemoryDirectory {
    policies: Mutex<Vec<Policy>>,
    calls: Mutex<Vec<DirectoryCall>>,
    next_id: AtomicU64,
}

impl MemoryDirectory {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self {
            policies: Mutex::new(policies),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(500),
        }
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn policies(&self) -> Vec<Policy> {
        self.policies.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyDirectory for MemoryDirectory {
    async fn find_by_name(&self, name: &str) -> SyncResult<Vec<Policy>> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::FindByName(name.to_string()));
        Ok(self
            .policies()
            .into_iter()
            .filter(|p| p.name.contains(name))
            .collect())
    }

    async fn get_by_id(&self, id: &PolicyId) -> SyncResult<Policy> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::GetById(id.clone()));
        self.policies()
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| SyncError::policy_id_not_found(id))
    }

    async fn create(
        &self,
        name: &str,
        incident_preference: IncidentPreference,
    ) -> SyncResult<Policy> {
        self.calls
            .lock()
            .unwrap()
            .push(DirectoryCall::Create(name.to_string(), incident_preference));
        let policy = Policy {
            id: PolicyId::Number(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: name.to_string(),
            incident_preference,
        };
        self.policies.lock().unwrap().push(policy.clone());
        Ok(policy)
    }

    async fn update(
        &self,
        id: &PolicyId,
        name: &str,
        incident_preference: IncidentPreference,
    ) -> SyncResult<Policy> {
        self.calls.lock().unwrap().push(DirectoryCall::Update(
            id.clone(),
            name.to_string(),
            incident_preference,
        ));
        let mut policies = self.policies.lock().unwrap();
        match policies.iter_mut().find(|p| &p.id == id) {
            Some(policy) => {
                policy.name = name.to_string();
                policy.incident_preference = incident_preference;
                Ok(policy.clone())
            }
            None => Err(SyncError::Transport {
                operation: "update policy".into(),
                method: "PUT".into(),
                url: format!("memory://policies/{id}"),
                status: 404,
                body: "not found".into(),
            }),
        }
    }
}

pub fn policy(id: u64, name: &str) -> Policy {
    Policy {
        id: PolicyId::Number(id),
        name: name.to_string(),
        incident_preference: IncidentPreference::PerPolicy,
    }
}
