//! Bid endpoint tests

use serde_json::json;

use crate::common::{Marketplace, TestApp};

#[tokio::test]
async fn test_create_organization_and_user_bids() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;

    let response = app.post_json("/api/bids/new", market.bid_body(&tender_id)).await;
    response.assert_created();
    let bid: serde_json::Value = response.json();
    assert_eq!(bid["status"], "Created");
    assert_eq!(bid["version"], 1);
    assert_eq!(bid["tenderId"], tender_id.as_str());
    assert_eq!(bid["authorType"], "Organization");
    assert_eq!(bid["authorId"], market.builders.id.to_string());

    let response = app
        .post_json(
            "/api/bids/new",
            json!({
                "name": "Solo",
                "description": "I pave it myself",
                "tenderId": tender_id,
                "creatorUsername": "carol",
            }),
        )
        .await;
    response.assert_created();
    let bid: serde_json::Value = response.json();
    assert_eq!(bid["authorType"], "User");
    assert_eq!(bid["authorId"], "carol");
}

#[tokio::test]
async fn test_create_bid_on_unknown_tender() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;

    app.post_json(
        "/api/bids/new",
        market.bid_body(&uuid::Uuid::new_v4().to_string()),
    )
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_bid_listings() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;
    market.create_bid(&app, &tender_id).await;

    let mine: Vec<serde_json::Value> = app.get("/api/bids/my?username=bob").await.json();
    assert_eq!(mine.len(), 1);

    let response = app
        .get(&format!("/api/bids/{tender_id}/list?username=alice"))
        .await;
    response.assert_ok();
    let on_tender: Vec<serde_json::Value> = response.json();
    assert_eq!(on_tender.len(), 1);

    app.get(&format!(
        "/api/bids/{}/list?username=alice",
        uuid::Uuid::new_v4()
    ))
    .await
    .assert_not_found();
}

#[tokio::test]
async fn test_bid_status_rules() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;
    let bid_id = market.create_bid(&app, &tender_id).await;

    app.put(&format!("/api/bids/{bid_id}/status?status=Published&username=carol"))
        .await
        .assert_forbidden();
    app.put(&format!("/api/bids/{bid_id}/status?status=Approved&username=bob"))
        .await
        .assert_bad_request();

    let response = app
        .put(&format!("/api/bids/{bid_id}/status?status=Published&username=bob"))
        .await;
    response.assert_ok();

    let status: String = app
        .get(&format!("/api/bids/{bid_id}/status?username=carol"))
        .await
        .json();
    assert_eq!(status, "Published");
}

#[tokio::test]
async fn test_edit_and_rollback_bid() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;
    let bid_id = market.create_bid(&app, &tender_id).await;

    let response = app
        .patch_json(
            &format!("/api/bids/{bid_id}/edit?username=bob"),
            json!({ "name": "Better offer" }),
        )
        .await;
    response.assert_ok();
    let edited: serde_json::Value = response.json();
    assert_eq!(edited["name"], "Better offer");
    assert_eq!(edited["version"], 2);

    app.put(&format!("/api/bids/{bid_id}/rollback/1?username=alice"))
        .await
        .assert_forbidden();

    let response = app
        .put(&format!("/api/bids/{bid_id}/rollback/1?username=bob"))
        .await;
    response.assert_ok();
    let restored: serde_json::Value = response.json();
    assert_eq!(restored["name"], "Offer");
    assert_eq!(restored["version"], 3);
}

#[tokio::test]
async fn test_feedback_round_trip() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;
    let bid_id = market.create_bid(&app, &tender_id).await;

    app.put(&format!(
        "/api/bids/{bid_id}/feedback?bidFeedback=Nice&username=bob"
    ))
    .await
    .assert_forbidden();
    app.put(&format!("/api/bids/{bid_id}/feedback?bidFeedback=&username=alice"))
        .await
        .assert_bad_request();

    let response = app
        .put(&format!(
            "/api/bids/{bid_id}/feedback?bidFeedback=Too%20expensive&username=alice"
        ))
        .await;
    response.assert_ok();
    let bid: serde_json::Value = response.json();
    assert_eq!(bid["version"], 2);
    assert_eq!(bid["name"], "Offer");

    let response = app
        .get(&format!("/api/bids/{bid_id}/feedback?username=bob"))
        .await;
    response.assert_ok();
    let feedback: Vec<serde_json::Value> = response.json();
    assert_eq!(feedback.len(), 1);
    assert_eq!(feedback[0]["review"], "Too expensive");
    assert_eq!(feedback[0]["username"], "alice");
    assert_eq!(feedback[0]["bidId"], bid_id.as_str());
}

#[tokio::test]
async fn test_approval_closes_tender() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;
    let bid_id = market.create_bid(&app, &tender_id).await;

    app.put(&format!(
        "/api/bids/{bid_id}/submit_decision?decision=Approved&username=bob"
    ))
    .await
    .assert_forbidden();

    let response = app
        .put(&format!(
            "/api/bids/{bid_id}/submit_decision?decision=Approved&username=alice"
        ))
        .await;
    response.assert_ok();
    let bid: serde_json::Value = response.json();
    assert_eq!(bid["status"], "Approved");
    assert_eq!(bid["version"], 2);

    let status: String = app
        .get(&format!("/api/tenders/{tender_id}/status"))
        .await
        .json();
    assert_eq!(status, "Closed");

    // A decided bid stays decided
    let response = app
        .put(&format!(
            "/api/bids/{bid_id}/submit_decision?decision=Rejected&username=alice"
        ))
        .await;
    response.assert_bad_request();
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], "bad_request");

    // And the closed tender takes no more bids
    app.post_json("/api/bids/new", market.bid_body(&tender_id))
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_invalid_decision_label() {
    let app = TestApp::new().await;
    let market = Marketplace::seed(&app).await;
    let tender_id = market.published_tender(&app, "Road").await;
    let bid_id = market.create_bid(&app, &tender_id).await;

    app.put(&format!(
        "/api/bids/{bid_id}/submit_decision?decision=approved&username=alice"
    ))
    .await
    .assert_bad_request();
}
