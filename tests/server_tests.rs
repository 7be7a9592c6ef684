use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use weeklygrind::core::password::hash_password;
use weeklygrind::db::initialize::init_db;
use weeklygrind::db::pool::DbPool;
use weeklygrind::db::projects::{ProjectInput, upsert_project};
use weeklygrind::db::users::create_user;
use weeklygrind::models::role::Role;
use weeklygrind::server::{AppState, Settings, build_router};

const WEEK: &str = "week_start,tech,day,slot,type,details,notes,status\r\n\
                    2025-09-29,jsmith,2025-09-29,1,IMG,Laptop,,\r\n";
const WEEK_URL: &str = "/weekly-grind/cantina-schedule-2025-09-29.csv";

fn state(dev_auth_stub: bool) -> AppState {
    let pool = DbPool::in_memory().unwrap();
    init_db(&pool.conn).unwrap();
    AppState::new(
        pool.into_inner(),
        Settings {
            dev_auth_stub,
            hold_days: 30,
            session_ttl: Duration::from_secs(600),
            max_body_bytes: 1024 * 1024,
            static_dir: None,
        },
    )
}

fn add_user(state: &AppState, username: &str, role: Role) -> i64 {
    state
        .with_db(|conn| {
            let hash = hash_password("pw")?;
            create_user(conn, username, username, None, role, &hash)
        })
        .unwrap()
        .id
}

fn add_project(state: &AppState, pid: &str, tech_id: i64) {
    let input: ProjectInput = serde_json::from_value(json!({
        "pid": pid,
        "project_name": format!("Project {pid}"),
        "date_project_opened": "2025-09-01",
        "assigned_tech_id": tech_id,
    }))
    .unwrap();
    state.with_db(|conn| upsert_project(conn, &input)).unwrap();
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_raw(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_raw(uri, "application/json", body.to_string())
}

async fn text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&text(resp).await).unwrap()
}

async fn login(app: &Router, username: &str) -> String {
    let resp = send(app, post_json("/auth/login", json!({ "username": username, "password": "pw" }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn health_endpoints() {
    let app = build_router(state(true));

    let resp = send(&app, get("/health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "ok": true }));

    let resp = send(&app, get("/api/db-health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn root_redirects_to_the_view_page() {
    let app = build_router(state(true));
    let resp = send(&app, get("/")).await;
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()[header::LOCATION], "/weekly-grind/view");
}

#[tokio::test]
async fn unsaved_week_is_header_only() {
    let app = build_router(state(true));

    let resp = send(&app, get(WEEK_URL)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert_eq!(text(resp).await, "week_start,tech,day,slot,type,details,notes,status\n");

    let resp = send(&app, get("/weekly-grind/cantina-schedule-2025-9-1.csv")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, get("/weekly-grind/cantina_view.html")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn raw_save_round_trips() {
    let app = build_router(state(true));

    let resp = send(
        &app,
        post_raw("/weekly-grind/api/save?mondayISO=2025-09-29", "text/csv; charset=utf-8", WEEK),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "ok": true, "file": WEEK_URL }));

    assert_eq!(text(send(&app, get(WEEK_URL)).await).await, WEEK);

    let weeks = body_json(send(&app, get("/weekly-grind/api/weeks")).await).await;
    assert_eq!(weeks, json!(["2025-09-29"]));
}

#[tokio::test]
async fn json_string_body_is_stored_unwrapped() {
    let app = build_router(state(true));
    let wrapped = serde_json::to_string(WEEK).unwrap();

    let resp = send(
        &app,
        post_raw("/weekly-grind/api/save?mondayISO=2025-09-29", "application/json", wrapped),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(send(&app, get(WEEK_URL)).await).await, WEEK);
}

#[tokio::test]
async fn object_save_merges_statuses() {
    let app = build_router(state(true));
    let body = json!({
        "mondayISO": "2025-09-29",
        "csv": WEEK,
        "statuses": [
            { "tech": "jsmith", "dayOffset": 0, "slot": 1, "status": "done" },
            { "tech": "jdoe", "dayOffset": 0, "slot": 1, "status": "done" },
        ],
    });

    let resp = send(&app, post_json("/weekly-grind/api/save", body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = text(send(&app, get(WEEK_URL)).await).await;
    assert!(stored.contains("2025-09-29,jsmith,2025-09-29,1,IMG,Laptop,,done"));
    assert!(!stored.contains("jdoe"));
}

#[tokio::test]
async fn object_save_collects_grid_toggles() {
    let app = build_router(state(true));
    let body = json!({
        "mondayISO": "2025-09-29",
        "csv": WEEK,
        "grid": { "rows": [{ "tech": "jsmith", "cells": [{ "entries": [
            { "index": "0", "complete": true, "statusField": "" }
        ]}]}]},
    });

    let resp = send(&app, post_json("/weekly-grind/api/save", body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text(send(&app, get(WEEK_URL)).await).await.ends_with(",done\r\n"));
}

#[tokio::test]
async fn foreign_header_is_not_stored() {
    let app = build_router(state(true));
    let foreign = "week_start,tech,day,slot,type,details,status\n2025-09-29,jsmith,2025-09-29,1,IMG,Laptop,\n";

    let resp = send(
        &app,
        post_raw("/weekly-grind/api/save?mondayISO=2025-09-29", "text/csv", foreign),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await, json!({ "ok": false, "error": "header mismatch" }));

    let weeks = body_json(send(&app, get("/weekly-grind/api/weeks")).await).await;
    assert_eq!(weeks, json!([]));
}

#[tokio::test]
async fn save_without_a_week_is_invalid() {
    let app = build_router(state(true));

    let resp = send(&app, post_raw("/weekly-grind/api/save", "text/csv", WEEK)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({ "ok": false, "error": "Invalid payload" }));

    let resp = send(&app, post_json("/weekly-grind/api/save", json!({ "mondayISO": "2025-09-29" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_me_logout() {
    let st = state(false);
    add_user(&st, "coord", Role::Coordinator);
    let app = build_router(st);

    let resp = send(&app, get("/auth/me")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&app, post_json("/auth/login", json!({ "username": "coord", "password": "nope" }))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "Invalid credentials");

    let resp = send(&app, post_json("/auth/login", json!({ "username": "coord" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let cookie = login(&app, "coord").await;
    assert!(cookie.starts_with("wg_session="));

    let me = body_json(send(&app, get_with_cookie("/auth/me", &cookie)).await).await;
    assert_eq!(me["username"], "coord");
    assert_eq!(me["role"], "coordinator");

    let logout = Request::builder()
        .method("POST")
        .uri("/auth/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, logout).await.status(), StatusCode::OK);

    let resp = send(&app, get_with_cookie("/auth/me", &cookie)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_requires_a_session_without_the_dev_stub() {
    let app = build_router(state(false));
    let resp = send(&app, get("/api/projects")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await, json!({ "error": "Auth required" }));
}

#[tokio::test]
async fn techs_only_see_their_projects() {
    let st = state(false);
    let amy = add_user(&st, "amy", Role::Tech);
    let bob = add_user(&st, "bob", Role::Tech);
    add_project(&st, "P1", amy);
    add_project(&st, "P2", bob);
    let app = build_router(st);

    let cookie = login(&app, "amy").await;

    let list = body_json(send(&app, get_with_cookie("/api/projects", &cookie)).await).await;
    let pids: Vec<&str> = list.as_array().unwrap().iter().map(|p| p["pid"].as_str().unwrap()).collect();
    assert_eq!(pids, vec!["P1"]);

    let resp = send(&app, get_with_cookie("/api/projects/P2", &cookie)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = send(&app, get_with_cookie("/api/projects/P9", &cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Project not found");

    let create = Request::builder()
        .method("POST")
        .uri("/api/projects")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "pid": "P3", "project_name": "X", "date_project_opened": "2025-09-01" }).to_string(),
        ))
        .unwrap();
    assert_eq!(send(&app, create).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn checkin_sets_the_hold_date() {
    let app = build_router(state(true));
    let body = json!({
        "equipment": {
            "ticket_number": "T-100",
            "equipment_name": "Dell desktop",
            "checkin_date": "2025-09-01",
        },
        "drives": [{ "drive_serial_number": "S1" }, { "drive_serial_number": "S2" }],
    });

    let resp = send(&app, post_json("/api/equipment-checkin", body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    assert_eq!(created["equipment"]["hold_until_date"], "2025-10-01");
    assert_eq!(created["equipment"]["status"], "checked_in");
    assert_eq!(created["drives"].as_array().unwrap().len(), 2);

    let resp = send(&app, get("/api/equipment-checkin/999")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Equipment not found");
}

#[tokio::test]
async fn admin_cannot_mark_equipment_ready() {
    // the dev stub acts as an admin; destruction steps belong to handlers
    let app = build_router(state(true));
    let resp = send(&app, post_json("/api/equipment-checkin/1/ready-for-destruction", json!({}))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn users_endpoints_are_admin_only() {
    let st = state(false);
    add_user(&st, "sup", Role::Supervisor);
    let app = build_router(st);
    let cookie = login(&app, "sup").await;

    let resp = send(&app, get_with_cookie("/api/users", &cookie)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // dev admin
    let app = build_router(state(true));
    let resp = send(&app, get("/api/users?role=tech")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));
}
