//! End-to-end floor scenarios over HTTP.
//!
//! Each test drives a real server through `TestFloorServer` with one client
//! per participant, the way observers interact with a live session.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use floor_service::floor::{FloorEvent, QueueChange, QueueItemStatus, SeatStatus, SessionMode};
use floor_test_utils::{
    create_proposal, proposal_spec, seat_members, ApiResponse, TestFloorServer,
};
use serde_json::json;

fn queue_item_id(response: &ApiResponse) -> u64 {
    response.body["events"]
        .as_array()
        .and_then(|events| events.iter().find(|e| e["event"]["type"] == "queueUpdate"))
        .and_then(|e| e["event"]["item"]["id"].as_u64())
        .expect("response should contain a queueUpdate event")
}

/// Speaker request, recognition through the queue, then completion.
#[tokio::test]
async fn test_speaker_request_lifecycle() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice"]).await?;
    let alice = &members[0];
    let president = server.president();

    let response = alice.post("/api/v1/seat/request-speak", None).await?;
    response.assert_status(200);
    assert_eq!(response.event_types(), vec!["seatUpdate", "queueUpdate"]);
    let item_id = queue_item_id(&response);

    let snapshot = alice.snapshot().await?;
    let participant = snapshot.participants.iter().find(|p| p.id.as_str() == "alice").unwrap();
    assert_eq!(participant.seat_status, SeatStatus::RequestingToSpeak);
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.queue[0].status, QueueItemStatus::Pending);

    president
        .post(&format!("/api/v1/queue/{item_id}/activate"), None)
        .await?
        .assert_status(200);

    let snapshot = alice.snapshot().await?;
    let participant = snapshot.participants.iter().find(|p| p.id.as_str() == "alice").unwrap();
    assert_eq!(participant.seat_status, SeatStatus::Speaking);
    assert_eq!(snapshot.queue[0].status, QueueItemStatus::Active);

    let response = president.post("/api/v1/queue/active/complete", None).await?;
    response.assert_status(200);
    assert_eq!(response.event_types(), vec!["seatUpdate", "queueUpdate"]);
    assert_eq!(response.events().len(), 2);

    let snapshot = alice.snapshot().await?;
    let participant = snapshot.participants.iter().find(|p| p.id.as_str() == "alice").unwrap();
    assert_eq!(participant.seat_status, SeatStatus::Neutral);
    assert!(snapshot.queue.is_empty());

    Ok(())
}

/// Completing a speaker request or objection that was never recognized.
#[tokio::test]
async fn test_complete_pending_item_by_id() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice", "bob"]).await?;
    let president = server.president();

    let request = members[0].post("/api/v1/seat/request-speak", None).await?;
    request.assert_status(200);
    let objection = members[1].post("/api/v1/seat/object", None).await?;
    objection.assert_status(200);

    for (who, response) in [("alice", &request), ("bob", &objection)] {
        let item_id = queue_item_id(response);
        let completed = president
            .post(&format!("/api/v1/queue/{item_id}/complete"), None)
            .await?;
        completed.assert_status(200);
        assert_eq!(completed.event_types(), vec!["seatUpdate", "queueUpdate"]);

        let events = completed.events();
        assert!(matches!(
            &events[0].event,
            FloorEvent::SeatUpdate { participant_id, new_status: SeatStatus::Neutral, .. }
                if participant_id.as_str() == who
        ));
        assert!(matches!(
            &events[1].event,
            FloorEvent::QueueUpdate { item, change: QueueChange::Completed }
                if item.id.0 == item_id && item.status == QueueItemStatus::Completed
        ));

        let snapshot = president.snapshot().await?;
        let participant = snapshot.participants.iter().find(|p| p.id.as_str() == who).unwrap();
        assert_eq!(participant.seat_status, SeatStatus::Neutral);
        assert!(snapshot.queue.iter().all(|i| i.id.0 != item_id));
    }

    assert!(president.snapshot().await?.queue.is_empty());
    Ok(())
}

/// Weighted relative-majority vote that fails.
#[tokio::test]
async fn test_weighted_vote_fails_relative_majority() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["x", "y"]).await?;
    let president = server.president();

    president
        .patch("/api/v1/participants/y", json!({ "electoral_strength": 2 }))
        .await?
        .assert_status(200);

    let proposal_id = create_proposal(&president, proposal_spec("Budget", "NORMAL")).await?;

    members[0]
        .post(
            &format!("/api/v1/proposals/{proposal_id}/votes"),
            Some(json!({ "choice": "For" })),
        )
        .await?
        .assert_status(200);
    members[1]
        .post(
            &format!("/api/v1/proposals/{proposal_id}/votes"),
            Some(json!({ "choice": "Against" })),
        )
        .await?
        .assert_status(200);

    let response = president
        .post("/api/v1/voting/end", Some(json!({ "category": "NORMAL" })))
        .await?;
    response.assert_status(200);
    assert_eq!(response.event_types(), vec!["proposalsClosed"]);

    let closed = &response.body["events"][0]["event"]["proposals"][0];
    assert_eq!(closed["id"], proposal_id);
    assert_eq!(closed["voting_ended"], true);
    assert_eq!(closed["passed"], false);
    assert_eq!(closed["final_tally"]["total_for"], 1);
    assert_eq!(closed["final_tally"]["total_against"], 2);

    // Frozen: further votes are rejected.
    members[0]
        .post(
            &format!("/api/v1/proposals/{proposal_id}/votes"),
            Some(json!({ "choice": "Against" })),
        )
        .await?
        .assert_error(409, "VOTING_CLOSED");

    Ok(())
}

/// A member cannot activate a queue item; nothing changes.
#[tokio::test]
async fn test_member_activation_is_forbidden() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["a", "b"]).await?;

    let response = members[0].post("/api/v1/seat/request-speak", None).await?;
    let item_id = queue_item_id(&response);
    let before = members[1].snapshot().await?;

    members[1]
        .post(&format!("/api/v1/queue/{item_id}/activate"), None)
        .await?
        .assert_error(403, "FORBIDDEN");

    let after = members[1].snapshot().await?;
    assert_eq!(before, after);

    Ok(())
}

/// Break blocks members until the president lifts it.
#[tokio::test]
async fn test_break_blocks_members() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice"]).await?;
    let president = server.president();

    let response = president.post("/api/v1/break", None).await?;
    response.assert_status(200);
    assert_eq!(response.event_types(), vec!["break"]);

    members[0]
        .post("/api/v1/seat/request-speak", None)
        .await?
        .assert_error(423, "ON_BREAK");

    president.post("/api/v1/break/end", None).await?.assert_status(200);

    members[0]
        .post("/api/v1/seat/request-speak", None)
        .await?
        .assert_status(200);
    assert_eq!(members[0].snapshot().await?.session_mode, SessionMode::Active);

    Ok(())
}

/// Two members raced to the floor: one recognition wins the single slot.
#[tokio::test]
async fn test_concurrent_recognition_single_active_slot() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice", "bob"]).await?;
    let president = server.president();

    for member in &members {
        member
            .post("/api/v1/seat/request-speak", None)
            .await?
            .assert_status(200);
    }

    let (first, second) = tokio::join!(
        president.post(
            "/api/v1/seat/status",
            Some(json!({ "participant_id": "alice", "status": "SPEAKING" })),
        ),
        president.post(
            "/api/v1/seat/status",
            Some(json!({ "participant_id": "bob", "status": "SPEAKING" })),
        ),
    );
    let mut statuses = vec![first?.status, second?.status];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![200, 409]);

    let snapshot = president.snapshot().await?;
    let speaking = snapshot
        .participants
        .iter()
        .filter(|p| p.seat_status == SeatStatus::Speaking)
        .count();
    let active = snapshot
        .queue
        .iter()
        .filter(|item| item.status == QueueItemStatus::Active)
        .count();
    assert_eq!(speaking, 1);
    assert_eq!(active, 1);

    Ok(())
}

/// Members may not recognize themselves or cancel someone else's objection.
#[tokio::test]
async fn test_seat_status_authority() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice", "bob"]).await?;

    members[0]
        .post("/api/v1/seat/object", None)
        .await?
        .assert_status(200);

    members[0]
        .post(
            "/api/v1/seat/status",
            Some(json!({ "participant_id": "alice", "status": "SPEAKING" })),
        )
        .await?
        .assert_error(403, "FORBIDDEN");

    members[1]
        .post(
            "/api/v1/seat/status",
            Some(json!({ "participant_id": "alice", "status": "NEUTRAL" })),
        )
        .await?
        .assert_error(403, "FORBIDDEN");

    // OBJECTING -> REQUESTING_TO_SPEAK is not an edge.
    members[0]
        .post(
            "/api/v1/seat/status",
            Some(json!({ "participant_id": "alice", "status": "REQUESTING_TO_SPEAK" })),
        )
        .await?
        .assert_error(409, "INVALID_TRANSITION");

    server
        .president()
        .post(
            "/api/v1/seat/status",
            Some(json!({ "participant_id": "alice", "status": "NEUTRAL" })),
        )
        .await?
        .assert_status(200);

    Ok(())
}

/// Proposals queue by category band and can be edited, excluded and removed.
#[tokio::test]
async fn test_proposal_management() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice"]).await?;
    let president = server.president();

    let normal = create_proposal(&president, proposal_spec("Parks", "NORMAL")).await?;
    let constitutional =
        create_proposal(&president, proposal_spec("Charter", "CONSTITUTIONAL")).await?;
    let amendment = create_proposal(
        &president,
        json!({
            "title": "Parks, amended",
            "party": "Greens",
            "category": "PRIORITY",
            "association": { "kind": "additive", "proposal_id": normal }
        }),
    )
    .await?;

    let snapshot = president.snapshot().await?;
    let order: Vec<u64> = snapshot
        .queue
        .iter()
        .filter_map(|item| item.proposal().map(|id| id.0))
        .collect();
    assert_eq!(order, vec![constitutional, amendment, normal]);

    let labels: Vec<&str> = snapshot.proposals.iter().map(|p| p.proposal.label.as_str()).collect();
    assert!(labels.contains(&"C1"));
    assert!(labels.contains(&"P1 → 1"));

    members[0]
        .post(&format!("/api/v1/proposals/{normal}/stupid"), Some(json!({ "stupid": true })))
        .await?
        .assert_error(403, "FORBIDDEN");

    president
        .post(&format!("/api/v1/proposals/{normal}/stupid"), Some(json!({ "stupid": true })))
        .await?
        .assert_status(200);
    members[0]
        .post(
            &format!("/api/v1/proposals/{normal}/votes"),
            Some(json!({ "choice": "For" })),
        )
        .await?
        .assert_error(409, "STUPID");

    president
        .put(&format!("/api/v1/proposals/{amendment}"), json!({ "title": "" }))
        .await?
        .assert_error(400, "VALIDATION_ERROR");
    president
        .put(&format!("/api/v1/proposals/{amendment}"), json!({ "title": "Parks v2" }))
        .await?
        .assert_status(200);

    let response = president.delete(&format!("/api/v1/proposals/{amendment}")).await?;
    response.assert_status(200);
    assert!(response.event_types().contains(&"proposalDelete".to_string()));

    president
        .post("/api/v1/voting/end", Some(json!({ "category": "CONSTITUTIONAL" })))
        .await?
        .assert_status(200);
    president
        .delete(&format!("/api/v1/proposals/{constitutional}"))
        .await?
        .assert_error(409, "IMMUTABLE");

    // Normal proposals were untouched by closing the constitutional category.
    let snapshot = president.snapshot().await?;
    let parks = snapshot.proposals.iter().find(|p| p.proposal.id.0 == normal).unwrap();
    assert!(!parks.proposal.voting_ended);

    Ok(())
}

/// Fines accumulate on the participant and land in the fine book.
#[tokio::test]
async fn test_fines() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice"]).await?;
    let president = server.president();

    let response = president
        .post(
            "/api/v1/participants/alice/fines",
            Some(json!({ "amount": 5, "reason": "Heckling" })),
        )
        .await?;
    response.assert_status(200);
    assert_eq!(response.event_types(), vec!["fineImposed"]);
    assert_eq!(response.body["events"][0]["event"]["total"], 5);

    president
        .post(
            "/api/v1/participants/alice/fines",
            Some(json!({ "amount": 0, "reason": "Nothing" })),
        )
        .await?
        .assert_error(400, "VALIDATION_ERROR");

    members[0]
        .post(
            "/api/v1/participants/alice/fines",
            Some(json!({ "amount": 1, "reason": "Self-report" })),
        )
        .await?
        .assert_error(403, "FORBIDDEN");

    let fines = members[0].fines().await?;
    assert_eq!(fines.len(), 1);
    assert_eq!(fines[0].amount, 5);
    assert_eq!(fines[0].issued_by.as_str(), "speaker");

    let snapshot = members[0].snapshot().await?;
    let alice = snapshot.participants.iter().find(|p| p.id.as_str() == "alice").unwrap();
    assert_eq!(alice.fines, 5);

    Ok(())
}

/// Promoting a member moves the presidency atomically.
#[tokio::test]
async fn test_presidency_handover() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let members = seat_members(&server, &["alice"]).await?;
    let president = server.president();

    president
        .patch("/api/v1/participants/speaker", json!({ "role": "MEMBER" }))
        .await?
        .assert_error(409, "CONFLICT");

    president
        .patch("/api/v1/participants/alice", json!({ "role": "PRESIDENT" }))
        .await?
        .assert_status(200);

    let snapshot = members[0].snapshot().await?;
    let presidents: Vec<&str> = snapshot
        .participants
        .iter()
        .filter(|p| p.is_president())
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(presidents, vec!["alice"]);

    // The former president is now an ordinary member.
    president
        .post("/api/v1/break", None)
        .await?
        .assert_error(403, "FORBIDDEN");
    members[0].post("/api/v1/break", None).await?.assert_status(200);

    Ok(())
}

/// Registration rules.
#[tokio::test]
async fn test_registration() -> Result<(), anyhow::Error> {
    let server = TestFloorServer::spawn().await?;
    let alice = server.client("alice");

    alice.post("/api/v1/register", None).await?.assert_status(201);
    alice
        .post("/api/v1/register", None)
        .await?
        .assert_error(409, "DUPLICATE_IDENTITY");

    let too_long = "x".repeat(65);
    server
        .client(&too_long)
        .post("/api/v1/register", None)
        .await?
        .assert_error(400, "VALIDATION_ERROR");

    alice.post("/api/v1/seat/join", None).await?.assert_status(200);
    alice
        .post("/api/v1/seat/join", None)
        .await?
        .assert_error(409, "CONFLICT");

    // Leaving withdraws live requests and returns the seat to neutral.
    alice.post("/api/v1/seat/request-speak", None).await?.assert_status(200);
    alice.post("/api/v1/seat/leave", None).await?.assert_status(200);
    let snapshot = alice.snapshot().await?;
    assert!(snapshot.queue.is_empty());
    let participant = snapshot.participants.iter().find(|p| p.id.as_str() == "alice").unwrap();
    assert!(!participant.present);
    assert_eq!(participant.seat_status, SeatStatus::Neutral);

    Ok(())
}
