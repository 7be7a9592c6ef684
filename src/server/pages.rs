use crate::server::state::AppState;
use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

pub const LANDING: &str = "/weekly-grind/view";

/// Page routes and the HTML file each one serves, relative to `static_dir`.
const PAGES: &[(&str, &str)] = &[
    ("/weekly-grind/admin", "weekly-grind/cantina_admin.html"),
    ("/weekly-grind/view", "weekly-grind/cantina_view.html"),
    ("/weekly-grind/projects", "weekly-grind/cantina_projects.html"),
    ("/weekly-grind/projects/new", "weekly-grind/cantina_projects_new.html"),
    ("/weekly-grind/projects/:pid/edit", "weekly-grind/cantina_projects_edit.html"),
    ("/weekly-grind/users", "weekly-grind/weekly-grind-users.html"),
    ("/weekly-grind/initiatives", "weekly-grind/cantina_initiatives.html"),
];

fn static_files(dir: &str) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(false)
}

async fn landing() -> Redirect {
    Redirect::to(LANDING)
}

pub fn routes(static_dir: Option<&str>) -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(landing))
        .route("/weekly-grind", get(landing))
        .route("/weekly-grind/", get(landing));

    if let Some(dir) = static_dir {
        for (route, file) in PAGES {
            let page = Path::new(dir).join(file);
            router = router
                .route_service(route, ServeFile::new(&page))
                .route_service(&format!("{route}/"), ServeFile::new(&page));
        }
        router = router.fallback_service(static_files(dir));
    }
    router
}

/// Serve `req` from the static directory, or 404 when none is configured.
pub async fn static_or_not_found(state: &AppState, req: Request) -> Response {
    let Some(dir) = state.settings.static_dir.as_deref() else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };
    match static_files(dir).oneshot(req).await {
        Ok(resp) => resp.into_response(),
        Err(never) => match never {},
    }
}
