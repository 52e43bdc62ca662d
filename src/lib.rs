pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod format;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod resilience;
pub mod security;
pub mod services;
pub mod validation;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;

use crate::health::DependencyChecker;
use crate::services::TransactionPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TransactionPipeline>,
    pub health_checks: Arc<Vec<Arc<dyn DependencyChecker>>>,
    pub callback_secret: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(pipeline: Arc<TransactionPipeline>) -> Self {
        Self {
            pipeline,
            health_checks: Arc::new(Vec::new()),
            callback_secret: None,
            start_time: Instant::now(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/deposit", post(handlers::transactions::deposit))
        .route("/withdrawal", post(handlers::transactions::withdrawal))
        .route("/callback", post(handlers::webhook::callback))
        .route(
            "/transactions/:id/status",
            get(handlers::transactions::get_status),
        )
        .layer(from_fn(middleware::request_logger::request_logger))
        .with_state(state)
}
