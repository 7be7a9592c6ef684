use crate::server::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn db_health(State(state): State<AppState>) -> Response {
    let now = state.with_db(|conn| {
        Ok(conn.query_row("SELECT datetime('now')", [], |r| r.get::<_, String>(0))?)
    });
    match now {
        Ok(time) => Json(json!({ "status": "ok", "time": time })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/db-health", get(db_health))
}
