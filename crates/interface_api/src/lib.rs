//! HTTP API Layer
//!
//! This crate exposes the bank ledger over REST using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: accounts, movements, statements and health checks
//! - **Middleware**: JWT authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: ledger errors mapped to consistent status codes
//!
//! The router is generic over the ledger store, so tests drive it against the
//! in-memory store and the server binary against PostgreSQL.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(Arc::new(engine), config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_ledger::{LedgerEngine, LedgerStore};

use crate::config::ApiConfig;
use crate::handlers::{accounts, health, movements, statements};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
pub struct AppState<S: LedgerStore> {
    pub engine: Arc<LedgerEngine<S>>,
    pub config: ApiConfig,
}

impl<S: LedgerStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
        }
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `engine` - Ledger engine over any store
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router<S: LedgerStore>(engine: Arc<LedgerEngine<S>>, config: ApiConfig) -> Router {
    let state = AppState { engine, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check::<S>));

    let account_routes = Router::new()
        .route("/", post(accounts::open_account::<S>))
        .route("/:id", get(accounts::get_account::<S>))
        .route("/:id/state", put(accounts::change_state::<S>))
        .route(
            "/:id/movements",
            post(movements::apply_movement::<S>).get(movements::list_movements::<S>),
        );

    // Protected API routes
    let api_routes = Router::new()
        .nest("/accounts", account_routes)
        .route("/statements", get(statements::get_statement::<S>))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware::<S>))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware::<S>));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
