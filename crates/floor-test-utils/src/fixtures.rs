//! Roster fixtures.

use crate::client::FloorClient;
use crate::server_harness::TestFloorServer;
use serde_json::{json, Value};

/// Register each identity and seat it, returning one client per member.
///
/// The president is seated as well so president-side votes and presence
/// checks behave as in a live session.
pub async fn seat_members(
    server: &TestFloorServer,
    identities: &[&str],
) -> Result<Vec<FloorClient>, anyhow::Error> {
    server
        .president()
        .post("/api/v1/seat/join", None)
        .await?
        .assert_status(200);

    let mut clients = Vec::with_capacity(identities.len());
    for identity in identities {
        let client = server.client(identity);
        client
            .post("/api/v1/register", None)
            .await?
            .assert_status(201);
        client
            .post("/api/v1/seat/join", None)
            .await?
            .assert_status(200);
        clients.push(client);
    }
    Ok(clients)
}

/// Create a proposal as president and return its id.
pub async fn create_proposal(
    president: &FloorClient,
    spec: Value,
) -> Result<u64, anyhow::Error> {
    let response = president.post("/api/v1/proposals", Some(spec)).await?;
    response.assert_status(201);
    response.body["events"]
        .as_array()
        .and_then(|events| {
            events
                .iter()
                .find(|e| e["event"]["type"] == "proposalUpdate")
        })
        .and_then(|e| e["event"]["proposal"]["id"].as_u64())
        .ok_or_else(|| anyhow::anyhow!("no proposalUpdate in {}", response.body))
}

/// Minimal proposal body.
pub fn proposal_spec(title: &str, category: &str) -> Value {
    json!({ "title": title, "category": category })
}
