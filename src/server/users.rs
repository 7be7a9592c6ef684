use crate::core::password::hash_password;
use crate::db::log::audit;
use crate::db::users::{
    create_user, list_users, relations, replace_manager_supervisors, replace_supervisor_techs,
    set_password, update_user,
};
use crate::models::role::Role;
use crate::models::user::{NewUser, User, UserPatch, UserRelations};
use crate::server::auth::{AuthUser, require_role};
use crate::server::error::{ApiError, ApiResult, OrFail};
use crate::server::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

const ADMIN: &[Role] = &[Role::Admin];

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleQuery {
    pub role: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<RoleQuery>,
) -> ApiResult<Json<Vec<User>>> {
    require_role(&user, ADMIN)?;

    let role = match non_empty(&q.role) {
        None => None,
        Some(raw) => match Role::from_db_str(raw) {
            Some(r) => Some(r),
            // no stored user can carry an unknown role
            None => return Ok(Json(Vec::new())),
        },
    };

    let users = state
        .with_db(|conn| list_users(conn, role))
        .or_fail("Failed to fetch users")?;
    Ok(Json(users))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_role(&user, ADMIN)?;

    let (Some(username), Some(display_name), Some(role), Some(password)) = (
        non_empty(&body.username),
        non_empty(&body.display_name),
        non_empty(&body.role),
        body.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("username, display_name, role, password required"));
    };
    let role = Role::from_db_str(role).ok_or_else(|| ApiError::bad_request(format!("Invalid role: {role}")))?;

    let hash = hash_password(password).or_fail("Failed to create user")?;
    let created = state
        .with_db(|conn| {
            let created = create_user(conn, username, display_name, non_empty(&body.email), role, &hash)?;
            audit(conn, "user_add", &created.username, &format!("created by {}", user.username))?;
            Ok(created)
        })
        .or_fail("Failed to create user")?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UserPatch>,
) -> ApiResult<Json<User>> {
    require_role(&user, ADMIN)?;

    state
        .with_db(|conn| update_user(conn, id, &body))
        .or_fail("Failed to update user")?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[derive(Debug, Default, Deserialize)]
pub struct PasswordBody {
    pub password: Option<String>,
}

async fn reset_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<PasswordBody>,
) -> ApiResult<Json<Value>> {
    require_role(&user, ADMIN)?;

    let Some(password) = body.password.as_deref().filter(|p| !p.is_empty()) else {
        return Err(ApiError::bad_request("Password required"));
    };
    let hash = hash_password(password).or_fail("Failed to reset password")?;

    let found = state
        .with_db(|conn| set_password(conn, id, &hash))
        .or_fail("Failed to reset password")?;
    if !found {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(json!({ "ok": true })))
}

async fn user_relations(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Json<UserRelations>> {
    require_role(&user, ADMIN)?;
    let rel = state.with_db(|conn| relations(conn)).or_fail("Failed to fetch relations")?;
    Ok(Json(rel))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechIds {
    #[serde(default)]
    pub tech_ids: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorIds {
    #[serde(default)]
    pub supervisor_ids: Vec<i64>,
}

async fn set_supervisor_techs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(supervisor_id): Path<i64>,
    Json(body): Json<TechIds>,
) -> ApiResult<Json<Value>> {
    require_role(&user, ADMIN)?;
    state
        .with_db(|conn| replace_supervisor_techs(conn, supervisor_id, &body.tech_ids))
        .or_fail("Failed to update supervisor/tech mapping")?;
    Ok(Json(json!({ "ok": true })))
}

async fn set_manager_supervisors(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(manager_id): Path<i64>,
    Json(body): Json<SupervisorIds>,
) -> ApiResult<Json<Value>> {
    require_role(&user, ADMIN)?;
    state
        .with_db(|conn| replace_manager_supervisors(conn, manager_id, &body.supervisor_ids))
        .or_fail("Failed to update manager/supervisor mapping")?;
    Ok(Json(json!({ "ok": true })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/:id", patch(update))
        .route("/api/users/:id/reset-password", post(reset_password))
        .route("/api/user-relations", get(user_relations))
        .route("/api/supervisor-techs/:supervisor_id", post(set_supervisor_techs))
        .route("/api/manager-supervisors/:manager_id", post(set_manager_supervisors))
}
