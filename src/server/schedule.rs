use crate::db::schedule::{ensure_week_csv, list_weeks, save_week_csv};
use crate::errors::AppError;
use crate::schedule::intent::{GridState, StatusIntent, collect};
use crate::schedule::merge::{MergeOutcome, merge};
use crate::schedule::payload::SavePayload;
use crate::server::error::{ApiResult, OrFail};
use crate::server::pages::static_or_not_found;
use crate::server::state::AppState;
use crate::utils::date::is_iso_date;
use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

const FILE_PREFIX: &str = "cantina-schedule-";
const FILE_SUFFIX: &str = ".csv";

/// `cantina-schedule-2025-09-29.csv` -> `2025-09-29`
pub fn week_from_file_name(file: &str) -> Option<&str> {
    file.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)
}

pub fn file_url(week_start: &str) -> String {
    format!("/weekly-grind/{FILE_PREFIX}{week_start}{FILE_SUFFIX}")
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveQuery {
    #[serde(rename = "mondayISO")]
    pub monday_iso: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveObject {
    #[serde(rename = "mondayISO")]
    monday_iso: String,
    csv: String,
    #[serde(default)]
    statuses: Option<Vec<StatusIntent>>,
    #[serde(default)]
    grid: Option<GridState>,
}

/// What a save request resolves to once its shape is known.
#[derive(Debug, PartialEq, Eq)]
pub struct SaveRequest {
    pub week_start: String,
    pub csv: String,
    pub intents: Vec<StatusIntent>,
}

impl SaveRequest {
    /// Accepts `{mondayISO, csv, statuses?, grid?}`, or a raw or JSON string
    /// CSV body with the week in the query string.
    pub fn parse(body: &str, query_week: Option<String>) -> Option<Self> {
        let req = match serde_json::from_str::<Value>(body) {
            Ok(v @ Value::Object(_)) => {
                let obj: SaveObject = serde_json::from_value(v).ok()?;
                let mut intents = obj.statuses.unwrap_or_default();
                if let Some(grid) = obj.grid {
                    intents.extend(collect(&grid));
                }
                SaveRequest {
                    week_start: obj.monday_iso,
                    csv: obj.csv,
                    intents,
                }
            }
            _ => SaveRequest {
                week_start: query_week?,
                csv: SavePayload::detect(body).text().to_string(),
                intents: Vec::new(),
            },
        };

        is_iso_date(&req.week_start).then_some(req)
    }
}

fn save_failed(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "ok": false, "error": message.into() }))).into_response()
}

async fn week_csv(State(state): State<AppState>, Path(file): Path<String>, req: Request) -> Response {
    let Some(week_start) = week_from_file_name(&file) else {
        return static_or_not_found(&state, req).await;
    };
    if !is_iso_date(week_start) {
        return (StatusCode::BAD_REQUEST, "Bad date").into_response();
    }

    match state.with_db(|conn| ensure_week_csv(conn, week_start)) {
        Ok(csv) => ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv).into_response(),
        Err(AppError::InvalidDate(_)) => (StatusCode::BAD_REQUEST, "Bad date").into_response(),
        Err(e) => {
            tracing::error!(error = %e, week_start, "loading week failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

async fn save(State(state): State<AppState>, Query(query): Query<SaveQuery>, body: String) -> Response {
    let Some(req) = SaveRequest::parse(&body, query.monday_iso) else {
        return save_failed(StatusCode::BAD_REQUEST, "Invalid payload");
    };

    let csv = if req.intents.is_empty() {
        req.csv
    } else {
        let report = merge(&req.csv, &req.intents);
        match &report.outcome {
            MergeOutcome::Rewritten { matched, dropped } => {
                tracing::info!(week_start = %req.week_start, matched, dropped, "statuses merged");
            }
            MergeOutcome::Unchanged(reason) => {
                tracing::warn!(week_start = %req.week_start, %reason, "statuses not merged");
            }
        }
        report.text
    };

    match state.with_db(|conn| save_week_csv(conn, &req.week_start, &csv)) {
        Ok(()) => {
            tracing::info!(week_start = %req.week_start, bytes = csv.len(), "week saved");
            Json(json!({ "ok": true, "file": file_url(&req.week_start) })).into_response()
        }
        Err(AppError::InvalidDate(_)) => save_failed(StatusCode::BAD_REQUEST, "Invalid payload"),
        Err(e) => {
            tracing::error!(error = %e, week_start = %req.week_start, "save failed");
            save_failed(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn weeks(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let weeks = state.with_db(|conn| list_weeks(conn)).or_fail("Failed to list weeks")?;
    Ok(Json(weeks))
}

async fn auth_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/weekly-grind/:file", get(week_csv))
        .route("/weekly-grind/api/save", post(save))
        .route("/weekly-grind/api/weeks", get(weeks))
        .route("/weekly-grind/api/auth-check", get(auth_check))
}
