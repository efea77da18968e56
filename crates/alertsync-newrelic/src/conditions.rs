//! Condition CRUD for every kind, REST API v2 and Infrastructure API alike.

use alertsync_core::{
    Condition, ConditionAdapters, ConditionId, ConditionKind, PolicyId, ResourceAdapter,
    SyncError, SyncResult,
};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

use crate::client::NewRelicClient;

/// Envelope key used by the Infrastructure API for both single and list bodies.
const INFRA_ENVELOPE: &str = "data";

/// Page size requested from the Infrastructure API.
const INFRA_PAGE_LIMIT: usize = 50;

/// `ResourceAdapter` for one condition kind.
#[derive(Clone)]
pub struct ConditionApi {
    client: NewRelicClient,
    kind: ConditionKind,
}

impl ConditionApi {
    pub fn new(client: NewRelicClient, kind: ConditionKind) -> Self {
        Self { client, kind }
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    fn is_infra(&self) -> bool {
        self.kind == ConditionKind::Infrastructure
    }

    /// Key wrapping a single condition in request and response bodies.
    fn single_key(&self) -> &'static str {
        if self.is_infra() {
            INFRA_ENVELOPE
        } else {
            self.kind.singular()
        }
    }

    /// Key wrapping the condition array in list responses.
    fn list_key(&self) -> &'static str {
        if self.is_infra() {
            INFRA_ENVELOPE
        } else {
            self.kind.plural()
        }
    }

    fn list_url(&self) -> SyncResult<Url> {
        if self.is_infra() {
            self.client.infra_url("alerts/conditions")
        } else {
            self.client
                .api_url(&format!("alerts_{}.json", self.kind.plural()))
        }
    }

    fn create_url(&self, policy_id: &PolicyId) -> SyncResult<Url> {
        if self.is_infra() {
            self.client.infra_url("alerts/conditions")
        } else {
            self.client.api_url(&format!(
                "alerts_{}/policies/{policy_id}.json",
                self.kind.plural()
            ))
        }
    }

    fn item_url(&self, condition_id: &ConditionId) -> SyncResult<Url> {
        if self.is_infra() {
            self.client
                .infra_url(&format!("alerts/conditions/{condition_id}"))
        } else {
            self.client
                .api_url(&format!("alerts_{}/{condition_id}.json", self.kind.plural()))
        }
    }

    fn operation(&self, verb: &str) -> String {
        format!("{verb} {}", self.kind)
    }

    /// Wraps a condition in this kind's envelope.
    fn envelope(&self, payload: Value) -> Value {
        let mut body = Map::new();
        body.insert(self.single_key().to_string(), payload);
        Value::Object(body)
    }

    fn to_payload(&self, operation: &str, condition: &Condition) -> SyncResult<Value> {
        serde_json::to_value(condition).map_err(|e| SyncError::decode(operation, e.to_string()))
    }

    /// Fetches one listing page and returns its conditions along with
    /// `meta.total` when the response carries it.
    async fn list_page(
        &self,
        operation: &str,
        query: &[(&str, String)],
    ) -> SyncResult<(Vec<Condition>, Option<u64>)> {
        let body = self
            .client
            .send(operation, Method::GET, self.list_url()?, query, None)
            .await?;
        let total = body
            .get("meta")
            .and_then(|meta| meta.get("total"))
            .and_then(Value::as_u64);

        let items = match take_envelope(operation, body, self.list_key())? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(SyncError::decode(
                    operation,
                    format!("'{}' is not an array: {other}", self.list_key()),
                ));
            }
        };
        let conditions = items
            .into_iter()
            .map(|raw| parse_condition(operation, raw))
            .collect::<SyncResult<Vec<_>>>()?;
        Ok((conditions, total))
    }

    /// REST v2 listing: `page=1, 2, ...` until a page comes back empty.
    async fn list_by_page(
        &self,
        operation: &str,
        policy_id: &PolicyId,
    ) -> SyncResult<Vec<Condition>> {
        let mut all: Vec<Condition> = Vec::new();
        for page in 1u32.. {
            let query = [("policy_id", policy_id.to_string()), ("page", page.to_string())];
            let (conditions, _) = self.list_page(operation, &query).await?;
            if conditions.is_empty() {
                break;
            }
            all.extend(conditions);
        }
        Ok(all)
    }

    /// Infrastructure listing: advances `offset` until `meta.total`
    /// conditions have been read.
    async fn list_by_offset(
        &self,
        operation: &str,
        policy_id: &PolicyId,
    ) -> SyncResult<Vec<Condition>> {
        let mut all: Vec<Condition> = Vec::new();
        loop {
            let query = [
                ("policy_id", policy_id.to_string()),
                ("offset", all.len().to_string()),
                ("limit", INFRA_PAGE_LIMIT.to_string()),
            ];
            let (conditions, total) = self.list_page(operation, &query).await?;
            let received = conditions.len();
            all.extend(conditions);

            match total {
                Some(total) if received > 0 && (all.len() as u64) < total => continue,
                _ => break,
            }
        }
        Ok(all)
    }
}

/// Reads one condition record, which must carry an id.
fn parse_condition(operation: &str, raw: Value) -> SyncResult<Condition> {
    let condition: Condition =
        serde_json::from_value(raw).map_err(|e| SyncError::decode(operation, e.to_string()))?;
    if condition.id.is_none() {
        return Err(SyncError::decode(
            operation,
            format!("condition '{}' has no id", condition.name),
        ));
    }
    Ok(condition)
}

/// Takes the value stored under `key` out of a JSON object body.
fn take_envelope(operation: &str, body: Value, key: &str) -> SyncResult<Value> {
    match body {
        Value::Object(mut map) => map
            .remove(key)
            .ok_or_else(|| SyncError::decode(operation, format!("response has no '{key}' field"))),
        other => Err(SyncError::decode(
            operation,
            format!("expected a JSON object, got {other}"),
        )),
    }
}

#[async_trait]
impl ResourceAdapter for ConditionApi {
    async fn list(&self, policy_id: &PolicyId) -> SyncResult<Vec<Condition>> {
        let operation = self.operation("list");
        let conditions = if self.is_infra() {
            self.list_by_offset(&operation, policy_id).await?
        } else {
            self.list_by_page(&operation, policy_id).await?
        };
        tracing::debug!(kind = %self.kind, %policy_id, count = conditions.len(), "listed conditions");
        Ok(conditions)
    }

    async fn create(&self, policy_id: &PolicyId, condition: &Condition) -> SyncResult<Condition> {
        let operation = self.operation("create");
        let mut payload = self.to_payload(&operation, condition)?;
        if let Value::Object(fields) = &mut payload {
            fields.remove("id");
            if self.is_infra() {
                fields.insert(
                    alertsync_core::POLICY_ASSOCIATION_FIELD.to_string(),
                    serde_json::to_value(policy_id)
                        .map_err(|e| SyncError::decode(&operation, e.to_string()))?,
                );
            }
        }

        let body = self
            .client
            .send(
                &operation,
                Method::POST,
                self.create_url(policy_id)?,
                &[],
                Some(&self.envelope(payload)),
            )
            .await?;

        let created = parse_condition(&operation, take_envelope(&operation, body, self.single_key())?)?;
        tracing::debug!(kind = %self.kind, id = ?created.id, "created condition");
        Ok(created)
    }

    async fn update(&self, condition_id: &ConditionId, condition: &Condition) -> SyncResult<()> {
        let operation = self.operation("update");
        let payload = self.to_payload(&operation, condition)?;
        self.client
            .send(
                &operation,
                Method::PUT,
                self.item_url(condition_id)?,
                &[],
                Some(&self.envelope(payload)),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, condition_id: &ConditionId) -> SyncResult<()> {
        let operation = self.operation("delete");
        self.client
            .send(
                &operation,
                Method::DELETE,
                self.item_url(condition_id)?,
                &[],
                None,
            )
            .await?;
        Ok(())
    }
}

/// Builds one adapter per condition kind, all sharing `client`.
pub fn condition_adapters(client: &NewRelicClient) -> ConditionAdapters {
    ConditionKind::ALL
        .into_iter()
        .fold(ConditionAdapters::new(), |adapters, kind| {
            adapters.with(kind, Arc::new(ConditionApi::new(client.clone(), kind)))
        })
}
