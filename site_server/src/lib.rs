// course_site/site_server/src/lib.rs

pub mod links;
pub mod workbench;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info};
use workbench_core::{ErrorBody, LinkResponse};

pub use workbench::AppState;

#[derive(Debug, Deserialize)]
pub struct LinkQuery {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

async fn handle_link(Query(query): Query<LinkQuery>) -> Response {
    match links::lookup(query.id.as_deref(), query.kind.as_deref()) {
        Ok(url) => (
            StatusCode::OK,
            Json(LinkResponse {
                url: url.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            debug!(?query, error = %e, "link lookup rejected");
            (
                e.status(),
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/links", get(handle_link))
        .route("/api/rsa/state", get(workbench::get_state))
        .route("/api/rsa/keys/generate", post(workbench::generate_keys))
        .route("/api/rsa/keys/import", post(workbench::import_keys))
        .route("/api/rsa/encrypt", post(workbench::encrypt))
        .route("/api/rsa/verify", post(workbench::verify))
        .route("/api/rsa/log", delete(workbench::clear_log))
        .route("/api/rsa/reset", post(workbench::reset))
        .with_state(state)
}

/// Serves the site on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("site server listening on http://{addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
