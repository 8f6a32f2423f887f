/// Trigger endpoint.
///
/// An external scheduler (cron, Cloud Scheduler) calls `GET /`; each call
/// runs one sync and answers `200 Done` or `500`. Which stage failed is
/// only visible in the server log.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use crate::logging::{self, Component};
use crate::model::SyncError;
use crate::sync::SyncSummary;

pub const DONE: &str = "Done";
pub const SERVER_ERROR: &str = "Application Server Error";

/// Unit of work run on every trigger. Runs on a blocking thread.
pub type SyncJob = Arc<dyn Fn() -> Result<SyncSummary, SyncError> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    job: SyncJob,
}

impl AppState {
    pub fn new(job: SyncJob) -> Self {
        Self { job }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(trigger)).with_state(state)
}

async fn trigger(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let job = state.job.clone();
    match tokio::task::spawn_blocking(move || job()).await {
        Ok(Ok(summary)) => {
            logging::info(
                Component::Http,
                None,
                &format!("GET / -> 200 ({} lakes)", summary.lakes.len()),
            );
            (StatusCode::OK, DONE)
        }
        Ok(Err(e)) => {
            logging::error(Component::Http, None, &format!("GET / -> 500 ({} failed)", e.stage()));
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
        Err(e) => {
            logging::error(Component::Http, None, &format!("GET / -> 500 (sync task aborted: {})", e));
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}

/// Serves the trigger endpoint until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    logging::info(Component::Http, None, &format!("Listening on http://{}", addr));
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}
