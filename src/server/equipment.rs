use crate::db::equipment::{
    BatchDestroy, CheckinRequest, EquipmentFilter, EquipmentInput, batch_destroy, create_checkin, delete_equipment,
    drive_stats, get_equipment, list_equipment, mark_ready, past_hold, ready_drives, stats_summary, update_equipment,
};
use crate::models::role::Role;
use crate::server::auth::{AuthUser, require_role};
use crate::server::error::{ApiError, ApiResult, OrFail};
use crate::server::state::AppState;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

const HANDLERS: &[Role] = &[Role::Coordinator, Role::Supervisor, Role::Manager];

async fn checkin(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CheckinRequest>,
) -> ApiResult<Json<Value>> {
    let hold_days = state.settings.hold_days;
    let created = state
        .with_db(|conn| create_checkin(conn, &body, hold_days))
        .or_fail("Failed to create equipment check-in")?;
    tracing::info!(
        ticket = ?body.equipment.ticket_number,
        drives = body.drives.len(),
        by = %user.username,
        "equipment checked in"
    );
    Ok(Json(created))
}

async fn list(State(state): State<AppState>, _user: AuthUser, Query(filter): Query<EquipmentFilter>) -> ApiResult<Json<Vec<Value>>> {
    let rows = state
        .with_db(|conn| list_equipment(conn, &filter))
        .or_fail("Failed to fetch equipment")?;
    Ok(Json(rows))
}

async fn show(State(state): State<AppState>, _user: AuthUser, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    state
        .with_db(|conn| get_equipment(conn, id))
        .or_fail("Failed to fetch equipment")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Equipment not found"))
}

async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<EquipmentInput>,
) -> ApiResult<Json<Value>> {
    state
        .with_db(|conn| update_equipment(conn, id, &body))
        .or_fail("Failed to update equipment")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Equipment not found"))
}

async fn remove(State(state): State<AppState>, AuthUser(user): AuthUser, Path(id): Path<i64>) -> ApiResult<Json<Value>> {
    require_role(&user, &[Role::Admin])?;

    let deleted = state
        .with_db(|conn| delete_equipment(conn, id))
        .or_fail("Failed to delete equipment")?;
    if !deleted {
        return Err(ApiError::not_found("Equipment not found"));
    }
    Ok(Json(json!({ "message": "Equipment and associated drives deleted successfully" })))
}

async fn summary(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Value>> {
    let stats = state.with_db(|conn| stats_summary(conn)).or_fail("Failed to fetch statistics")?;
    Ok(Json(stats))
}

async fn held_too_long(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Value>>> {
    let rows = state
        .with_db(|conn| past_hold(conn))
        .or_fail("Failed to fetch past hold equipment")?;
    Ok(Json(rows))
}

async fn ready_for_destruction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    require_role(&user, HANDLERS)?;

    state
        .with_db(|conn| mark_ready(conn, id))
        .or_fail("Failed to mark equipment ready")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Equipment not found"))
}

async fn destroy_batch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<BatchDestroy>,
) -> ApiResult<Json<Value>> {
    require_role(&user, HANDLERS)?;

    let destroyed = state
        .with_db(|conn| batch_destroy(conn, &body))
        .or_fail("Failed to destroy drives")?;
    tracing::info!(destroyed, batch = ?body.batch_number, by = %user.username, "drives destroyed");

    Ok(Json(json!({
        "message": "Drives destroyed successfully",
        "drives_destroyed": destroyed,
        "batch_number": body.batch_number,
    })))
}

async fn drives_ready(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Vec<Value>>> {
    let rows = state
        .with_db(|conn| ready_drives(conn))
        .or_fail("Failed to fetch ready drives")?;
    Ok(Json(rows))
}

async fn drives_summary(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Json<Value>> {
    let stats = state
        .with_db(|conn| drive_stats(conn))
        .or_fail("Failed to fetch drive statistics")?;
    Ok(Json(stats))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/equipment-checkin", get(list).post(checkin))
        .route("/api/equipment-checkin/stats/summary", get(summary))
        .route("/api/equipment-checkin/past-hold", get(held_too_long))
        .route("/api/equipment-checkin/:id", get(show).put(update).delete(remove))
        .route("/api/equipment-checkin/:id/ready-for-destruction", post(ready_for_destruction))
        .route("/api/hard-drives/batch-destroy", post(destroy_batch))
        .route("/api/hard-drives/ready-for-destruction", get(drives_ready))
        .route("/api/hard-drives/stats", get(drives_summary))
}
