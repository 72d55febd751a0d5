//! Route table for the pipeline HTTP edge.

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::PipelineAppState;

pub fn pipeline_routes() -> Router<PipelineAppState> {
    Router::new()
        .route("/regenerate/sections", post(handlers::regenerate_sections))
        .route("/regenerate/full", post(handlers::regenerate_full))
        .route("/regenerate/template-update", post(handlers::regenerate_template_update))
        .route("/regeneration-history", get(handlers::regeneration_history))
        .route("/render", post(handlers::render))
        .route("/demo/seed", post(handlers::demo_seed))
        .route("/demo/ids", get(handlers::demo_ids))
        .route("/demo/validate", post(handlers::demo_validate))
}
