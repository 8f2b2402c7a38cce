//! Web API and static file hosting.
//!
//! `GET /api/articles` runs a pipeline cycle per request; every other path is
//! served from the static directory when one is configured.

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::pipeline::Pipeline;

mod error;
mod handlers;

pub use error::{ApiError, ApiResult};
pub use handlers::ArticleRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
}

impl ApiState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

pub fn create_router(state: ApiState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route(
            "/api/articles",
            get(handlers::list_articles).options(handlers::options),
        )
        .layer(cors)
        .with_state(state);

    let router = match static_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}
