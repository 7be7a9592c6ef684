use crate::db::projects::{ProjectInput, delete_project, get_project, is_visible, list_projects, upsert_project};
use crate::db::users::visible_tech_ids;
use crate::models::role::Role;
use crate::server::auth::{AuthUser, require_role};
use crate::server::error::{ApiError, ApiResult, OrFail};
use crate::server::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

async fn list(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<Vec<Value>>> {
    let projects = state
        .with_db(|conn| {
            let visible = visible_tech_ids(conn, &user)?;
            list_projects(conn, visible.as_deref())
        })
        .or_fail("Failed to fetch projects")?;
    Ok(Json(projects))
}

async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(pid): Path<String>,
) -> ApiResult<Json<Value>> {
    let (project, visible) = state
        .with_db(|conn| Ok((get_project(conn, &pid)?, visible_tech_ids(conn, &user)?)))
        .or_fail("Failed to fetch project")?;

    let project = project.ok_or_else(|| ApiError::not_found("Project not found"))?;
    if !is_visible(&project, visible.as_deref()) {
        return Err(ApiError::forbidden());
    }
    Ok(Json(project))
}

async fn upsert(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ProjectInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_role(&user, &[Role::Admin, Role::Coordinator])?;

    let saved = state
        .with_db(|conn| upsert_project(conn, &body))
        .or_fail("Failed to create project")?;
    tracing::info!(pid = ?body.pid, by = %user.username, "project saved");
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(pid): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&user, &[Role::Admin])?;

    if pid.trim().is_empty() {
        return Err(ApiError::bad_request("PID is required"));
    }
    let deleted = state
        .with_db(|conn| delete_project(conn, &pid))
        .or_fail("Failed to delete project")?;
    if !deleted {
        return Err(ApiError::not_found("Project not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list).post(upsert))
        .route("/api/projects/:pid", get(show).delete(remove))
}
