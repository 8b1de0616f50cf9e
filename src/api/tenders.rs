//! Tender API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use axum_extra::extract::Query as MultiQuery;
use serde::Deserialize;

use super::parse_id;
use crate::{
    models::{CreateTenderRequest, EditTenderRequest, PageQuery, Tender, TenderStatus},
    utils::AppResult,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tenders))
        .route("/new", post(create_tender))
        .route("/my", get(list_my_tenders))
        .route(
            "/{id}/status",
            get(get_tender_status).put(update_tender_status),
        )
        .route("/{id}/edit", patch(edit_tender))
        .route("/{id}/rollback/{version}", put(rollback_tender))
}

/// `service_type` may repeat
#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
    #[serde(default)]
    service_type: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UserPageQuery {
    #[serde(default)]
    username: String,
    limit: Option<i64>,
    offset: Option<i64>,
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

async fn list_tenders(
    State(state): State<AppState>,
    MultiQuery(query): MultiQuery<ListQuery>,
) -> AppResult<Json<Vec<Tender>>> {
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let tenders = state
        .tenders
        .list_tenders(page, &query.service_type)
        .await?;
    Ok(Json(tenders))
}

async fn create_tender(
    State(state): State<AppState>,
    Json(payload): Json<CreateTenderRequest>,
) -> AppResult<(StatusCode, Json<Tender>)> {
    let tender = state.tenders.create_tender(payload).await?;
    Ok((StatusCode::CREATED, Json(tender)))
}

async fn list_my_tenders(
    State(state): State<AppState>,
    Query(query): Query<UserPageQuery>,
) -> AppResult<Json<Vec<Tender>>> {
    let page = PageQuery {
        limit: query.limit,
        offset: query.offset,
    };
    let tenders = state
        .tenders
        .list_user_tenders(page, &query.username)
        .await?;
    Ok(Json(tenders))
}

async fn get_tender_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<TenderStatus>> {
    let id = parse_id(&id, "tender")?;
    Ok(Json(state.tenders.tender_status(id).await?))
}

async fn update_tender_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<Tender>> {
    let id = parse_id(&id, "tender")?;
    let tender = state
        .tenders
        .update_tender_status(id, &query.username, &query.status)
        .await?;
    Ok(Json(tender))
}

async fn edit_tender(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UsernameQuery>,
    Json(payload): Json<EditTenderRequest>,
) -> AppResult<Json<Tender>> {
    let id = parse_id(&id, "tender")?;
    let tender = state
        .tenders
        .edit_tender(id, &query.username, payload)
        .await?;
    Ok(Json(tender))
}

async fn rollback_tender(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, i64)>,
) -> AppResult<Json<Tender>> {
    let id = parse_id(&id, "tender")?;
    let tender = state.tenders.rollback_tender(id, version).await?;
    Ok(Json(tender))
}
