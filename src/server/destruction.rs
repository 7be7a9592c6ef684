use crate::db::destruction::{
    DateRange, DestructionFilter, DestructionInput, create_record, delete_record, get_record, list_records,
    stats_by_tech, stats_summary, update_record,
};
use crate::models::role::Role;
use crate::server::auth::{AuthUser, require_role};
use crate::server::error::{ApiError, ApiResult, OrFail};
use crate::server::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

const RECORDERS: &[Role] = &[Role::Coordinator, Role::Supervisor, Role::Manager];
const NOT_FOUND: &str = "Destruction record not found";

async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<DestructionFilter>,
) -> ApiResult<Json<Vec<Value>>> {
    let rows = state
        .with_db(|conn| list_records(conn, &filter))
        .or_fail("Failed to fetch destruction records")?;
    Ok(Json(rows))
}

async fn show(State(state): State<AppState>, _user: AuthUser, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    state
        .with_db(|conn| get_record(conn, id))
        .or_fail("Failed to fetch destruction record")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<DestructionInput>,
) -> ApiResult<Json<Value>> {
    require_role(&user, RECORDERS)?;

    let created = state
        .with_db(|conn| create_record(conn, &body, &user.username))
        .or_fail("Failed to create destruction record")?;
    Ok(Json(created))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<DestructionInput>,
) -> ApiResult<Json<Value>> {
    require_role(&user, RECORDERS)?;

    state
        .with_db(|conn| update_record(conn, id, &body, &user.username))
        .or_fail("Failed to update destruction record")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

async fn remove(State(state): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    require_role(&user, &[Role::Admin])?;

    let deleted = state
        .with_db(|conn| delete_record(conn, id))
        .or_fail("Failed to delete destruction record")?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(json!({
        "message": "Destruction record deleted successfully",
        "deleted": deleted,
    })))
}

async fn summary(State(state): State<AppState>, _user: AuthUser, Query(range): Query<DateRange>) -> ApiResult<Json<Value>> {
    let stats = state
        .with_db(|conn| stats_summary(conn, &range))
        .or_fail("Failed to fetch statistics")?;
    Ok(Json(stats))
}

async fn by_tech(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Value>>> {
    let rows = state
        .with_db(|conn| stats_by_tech(conn))
        .or_fail("Failed to fetch tech statistics")?;
    Ok(Json(rows))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/hard-drive-destruction", get(list).post(create))
        .route("/api/hard-drive-destruction/stats/summary", get(summary))
        .route("/api/hard-drive-destruction/stats/by-tech", get(by_tech))
        .route("/api/hard-drive-destruction/:id", get(show).put(update).delete(remove))
}
