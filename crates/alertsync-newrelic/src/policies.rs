//! Alert policy lookup and mutation over the REST API v2.

use alertsync_core::{IncidentPreference, Policy, PolicyDirectory, PolicyId, SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::NewRelicClient;

const POLICIES_PATH: &str = "alerts_policies.json";

#[derive(Debug, Deserialize)]
struct PolicyPage {
    #[serde(default)]
    policies: Vec<Policy>,
}

#[derive(Debug, Deserialize)]
struct PolicyEnvelope {
    policy: Policy,
}

/// Walks `alerts_policies.json` one page at a time.
///
/// Pages are requested lazily starting at 1; the first empty page ends the
/// walk. An optional name filter is passed through as `filter[name]`.
pub struct PolicyPager<'a> {
    client: &'a NewRelicClient,
    name_filter: Option<String>,
    page: u32,
    done: bool,
}

impl<'a> PolicyPager<'a> {
    pub fn new(client: &'a NewRelicClient) -> Self {
        Self {
            client,
            name_filter: None,
            page: 1,
            done: false,
        }
    }

    pub fn with_name_filter(mut self, name: impl Into<String>) -> Self {
        self.name_filter = Some(name.into());
        self
    }

    /// Fetches the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> SyncResult<Option<Vec<Policy>>> {
        if self.done {
            return Ok(None);
        }

        let mut query = vec![("page", self.page.to_string())];
        if let Some(name) = &self.name_filter {
            query.push(("filter[name]", name.clone()));
        }

        let operation = "list policies";
        let body = self
            .client
            .send(
                operation,
                Method::GET,
                self.client.api_url(POLICIES_PATH)?,
                &query,
                None,
            )
            .await?;
        let page: PolicyPage = serde_json::from_value(body)
            .map_err(|e| SyncError::decode(operation, e.to_string()))?;

        tracing::debug!(page = self.page, count = page.policies.len(), "fetched policy page");
        if page.policies.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.page += 1;
        Ok(Some(page.policies))
    }

    /// Drains every remaining page.
    pub async fn collect_all(mut self) -> SyncResult<Vec<Policy>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }
}

/// `PolicyDirectory` backed by the REST API.
#[derive(Clone)]
pub struct PolicyApi {
    client: NewRelicClient,
}

impl PolicyApi {
    pub fn new(client: NewRelicClient) -> Self {
        Self { client }
    }

    pub fn pager(&self) -> PolicyPager<'_> {
        PolicyPager::new(&self.client)
    }

    async fn write(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        name: &str,
        incident_preference: IncidentPreference,
    ) -> SyncResult<Value> {
        let body = json!({
            "policy": {
                "name": name,
                "incident_preference": incident_preference,
            }
        });
        self.client
            .send(operation, method, self.client.api_url(path)?, &[], Some(&body))
            .await
    }
}

fn parse_policy(operation: &str, body: Value) -> SyncResult<Policy> {
    serde_json::from_value::<PolicyEnvelope>(body)
        .map(|envelope| envelope.policy)
        .map_err(|e| SyncError::decode(operation, e.to_string()))
}

#[async_trait]
impl PolicyDirectory for PolicyApi {
    async fn find_by_name(&self, name: &str) -> SyncResult<Vec<Policy>> {
        let matches = self.pager().with_name_filter(name).collect_all().await?;
        Ok(matches.into_iter().filter(|p| p.name == name).collect())
    }

    async fn get_by_id(&self, id: &PolicyId) -> SyncResult<Policy> {
        let mut pager = self.pager();
        while let Some(page) = pager.next_page().await? {
            if let Some(policy) = page.into_iter().find(|p| &p.id == id) {
                return Ok(policy);
            }
        }
        Err(SyncError::policy_id_not_found(id))
    }

    async fn create(
        &self,
        name: &str,
        incident_preference: IncidentPreference,
    ) -> SyncResult<Policy> {
        let operation = "create policy";
        let body = self
            .write(operation, Method::POST, POLICIES_PATH, name, incident_preference)
            .await?;
        let policy = parse_policy(operation, body)?;
        tracing::info!(id = %policy.id, name, "created policy");
        Ok(policy)
    }

    async fn update(
        &self,
        id: &PolicyId,
        name: &str,
        incident_preference: IncidentPreference,
    ) -> SyncResult<Policy> {
        let operation = "update policy";
        let body = self
            .write(
                operation,
                Method::PUT,
                &format!("alerts_policies/{id}.json"),
                name,
                incident_preference,
            )
            .await?;

        if body.is_null() {
            return Ok(Policy {
                id: id.clone(),
                name: name.to_string(),
                incident_preference,
            });
        }
        parse_policy(operation, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_page_tolerates_missing_key() {
        let page: PolicyPage = serde_json::from_value(json!({})).unwrap();
        assert!(page.policies.is_empty());
    }

    #[test]
    fn test_parse_policy_ignores_extra_fields() {
        let policy = parse_policy(
            "create policy",
            json!({"policy": {
                "id": 12,
                "name": "web",
                "incident_preference": "PER_POLICY",
                "created_at": 1500000000000u64
            }}),
        )
        .unwrap();
        assert_eq!(policy.id, PolicyId::Number(12));
        assert_eq!(policy.incident_preference, IncidentPreference::PerPolicy);
    }

    #[test]
    fn test_parse_policy_without_envelope_fails() {
        let err = parse_policy("create policy", json!({"id": 1})).unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
    }
}
