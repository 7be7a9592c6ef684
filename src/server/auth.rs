//! Cookie sessions, the dev stub identity and the role guards.

use crate::core::password::verify_password;
use crate::db::users::find_for_login;
use crate::models::role::Role;
use crate::models::user::SessionUser;
use crate::server::error::{ApiError, ApiResult, OrFail};
use crate::server::state::AppState;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router, async_trait};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "wg_session";

struct Session {
    user: SessionUser,
    expires_at: Instant,
}

/// In-memory session table. Entries expire `ttl` after login.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, user: SessionUser) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        map.retain(|_, s| s.expires_at > now);
        map.insert(
            id.clone(),
            Session {
                user,
                expires_at: now + self.ttl,
            },
        );
        id
    }

    pub fn get(&self, id: &str) -> Option<SessionUser> {
        let map = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user.clone())
    }

    pub fn remove(&self, id: &str) {
        let mut map = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(id);
    }
}

/// The caller, if any: session first, then the dev stub.
pub struct MaybeUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = jar
            .get(SESSION_COOKIE)
            .and_then(|c| state.sessions.get(c.value()))
            .or_else(|| state.settings.dev_auth_stub.then(SessionUser::dev_admin));
        Ok(MaybeUser(user))
    }
}

/// Rejects with 401 when nobody is logged in.
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = match MaybeUser::from_request_parts(parts, state).await {
            Ok(found) => found,
            Err(never) => match never {},
        };
        user.map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Auth required"))
    }
}

pub fn require_role(user: &SessionUser, allowed: &[Role]) -> ApiResult<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<LoginRequest>>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    let Json(req) = body.unwrap_or_default();
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password required"));
    }

    let found = state
        .with_db(|conn| find_for_login(conn, &req.username))
        .or_fail("Login failed")?;
    let Some((user, hash)) = found else {
        return Err(ApiError::unauthorized("Invalid credentials"));
    };
    if !user.is_enabled() {
        return Err(ApiError::new(axum::http::StatusCode::FORBIDDEN, "Account disabled"));
    }
    let verified = hash.is_some_and(|h| verify_password(&req.password, &h));
    if !verified {
        tracing::warn!(username = %req.username, "rejected login");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let session_id = state.sessions.create(SessionUser::from(&user));
    tracing::info!(username = %user.username, role = %user.role, "login");

    Ok((
        jar.add(session_cookie(session_id)),
        Json(json!({ "ok": true, "role": user.role })),
    ))
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    if let Some(c) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(c.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(json!({ "ok": true })))
}

async fn me(MaybeUser(user): MaybeUser) -> ApiResult<Json<SessionUser>> {
    user.map(Json)
        .ok_or_else(|| ApiError::unauthorized("Not logged in"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
