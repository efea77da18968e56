//! Shared wiremock setup.

#![allow(dead_code)]

use alertsync_newrelic::{Endpoints, NewRelicClient};
use serde_json::Value;
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

/// Client pointing both APIs at `server`, under `/v2/` and `/infra/v2/`.
pub fn client_for(server: &MockServer) -> NewRelicClient {
    let endpoints = Endpoints::new(
        &format!("{}/v2", server.uri()),
        &format!("{}/infra/v2", server.uri()),
    )
    .unwrap();
    NewRelicClient::new(reqwest::Client::new(), API_KEY, endpoints)
}

/// JSON bodies of every request the server received, in order.
pub async fn received_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| !r.body.is_empty())
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}
