//! Liveness and status page
//!
//! Read-only view of the watcher's last announcement. Handlers only borrow the
//! `watch` receiver, so a slow client never blocks the watcher.

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::watch;
use tzone_core::ZoneStatus;

#[derive(Clone)]
struct AppState {
    status: watch::Receiver<Option<ZoneStatus>>,
}

#[derive(Serialize)]
pub struct Health {
    pub status: String,
}

/// Last announcement page
#[derive(Template)]
#[template(path = "status.html")]
pub struct StatusTemplate {
    pub current_title: &'static str,
    pub current_name: String,
    pub next_title: &'static str,
    pub next_name: String,
    pub announced_at: Option<String>,
}

impl From<ZoneStatus> for StatusTemplate {
    fn from(status: ZoneStatus) -> Self {
        Self {
            current_title: status.current.role.title(),
            current_name: status.current.name,
            next_title: status.next.role.title(),
            next_name: status.next.name,
            announced_at: status
                .announced_at
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
        }
    }
}

/// Build the router with all routes
pub fn router(status: watch::Receiver<Option<ZoneStatus>>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .with_state(AppState { status })
}

/// Health check endpoint
async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn index(State(state): State<AppState>) -> Response {
    let status = state.status.borrow().clone();
    match status {
        Some(status) => StatusTemplate::from(status).into_response(),
        None => Html("Server is running.").into_response(),
    }
}
