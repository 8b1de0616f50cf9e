//! Bid API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::parse_id;
use crate::{
    models::{Bid, BidFeedback, BidStatus, CreateBidRequest, EditBidRequest, PageQuery},
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/new", post(create_bid))
        .route("/my", get(list_my_bids))
        // The list segment is a tender ID; the name matches the sibling routes
        .route("/{id}/list", get(list_tender_bids))
        .route("/{id}/status", get(get_bid_status).put(update_bid_status))
        .route("/{id}/edit", patch(edit_bid))
        .route("/{id}/submit_decision", put(submit_decision))
        .route("/{id}/feedback", put(add_feedback).get(list_feedback))
        .route("/{id}/rollback/{version}", put(rollback_bid))
}

#[derive(Debug, Default, Deserialize)]
struct UserPageQuery {
    #[serde(default)]
    username: String,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl UserPageQuery {
    fn page(&self) -> PageQuery {
        PageQuery {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UsernameQuery {
    #[serde(default)]
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct StatusQuery {
    #[serde(default)]
    status: String,
    #[serde(default)]
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct DecisionQuery {
    #[serde(default)]
    decision: String,
    #[serde(default)]
    username: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackQuery {
    #[serde(default)]
    bid_feedback: String,
    #[serde(default)]
    username: String,
}

async fn create_bid(
    State(state): State<AppState>,
    Json(payload): Json<CreateBidRequest>,
) -> AppResult<(StatusCode, Json<Bid>)> {
    let bid = state.bids.create_bid(payload).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

async fn list_my_bids(
    State(state): State<AppState>,
    Query(query): Query<UserPageQuery>,
) -> AppResult<Json<Vec<Bid>>> {
    let bids = state
        .bids
        .list_user_bids(query.page(), &query.username)
        .await?;
    Ok(Json(bids))
}

async fn list_tender_bids(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
    Query(query): Query<UserPageQuery>,
) -> AppResult<Json<Vec<Bid>>> {
    let tender_id = parse_id(&tender_id, "tender")?;
    let bids = state
        .bids
        .list_tender_bids(tender_id, &query.username, query.page())
        .await?;
    Ok(Json(bids))
}

async fn get_bid_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
) -> AppResult<Json<BidStatus>> {
    let id = parse_id(&id, "bid")?;
    Ok(Json(state.bids.bid_status(id, &query.username).await?))
}

async fn update_bid_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<Bid>> {
    let id = parse_id(&id, "bid")?;
    let bid = state
        .bids
        .update_bid_status(id, &query.username, &query.status)
        .await?;
    Ok(Json(bid))
}

async fn edit_bid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
    Json(payload): Json<EditBidRequest>,
) -> AppResult<Json<Bid>> {
    let id = parse_id(&id, "bid")?;
    let bid = state.bids.edit_bid(id, &query.username, payload).await?;
    Ok(Json(bid))
}

async fn submit_decision(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DecisionQuery>,
) -> AppResult<Json<Bid>> {
    let id = parse_id(&id, "bid")?;
    let bid = state
        .bids
        .submit_decision(id, &query.username, &query.decision)
        .await?;
    Ok(Json(bid))
}

async fn add_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<FeedbackQuery>,
) -> AppResult<Json<Bid>> {
    let id = parse_id(&id, "bid")?;
    let bid = state
        .bids
        .add_feedback(id, &query.username, &query.bid_feedback)
        .await?;
    Ok(Json(bid))
}

async fn list_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UserPageQuery>,
) -> AppResult<Json<Vec<BidFeedback>>> {
    let id = parse_id(&id, "bid")?;
    let feedback = state
        .bids
        .list_feedback(id, &query.username, query.page())
        .await?;
    Ok(Json(feedback))
}

async fn rollback_bid(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, i64)>,
    Query(query): Query<UsernameQuery>,
) -> AppResult<Json<Bid>> {
    let id = parse_id(&id, "bid")?;
    let bid = state.bids.rollback_bid(id, &query.username, version).await?;
    Ok(Json(bid))
}
