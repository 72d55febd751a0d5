//! Pipeline HTTP edge (§6, §10.3) — the descriptive, non-core surface over
//! the Pipeline Coordinator (C9), Regeneration Planner (C7), Audit Log
//! (C10) and Demo Seeder (C11): `POST /regenerate/{sections,full,
//! template-update}`, `GET /regeneration-history`, `POST /render`, and
//! `POST|GET /demo/*`.

mod dto;
mod handlers;
mod routes;

use std::sync::Arc;

use crate::application::handlers::{DemoSeeder, PipelineCoordinator};
use crate::ports::{AuditLogRepository, JobHandler};

pub use routes::pipeline_routes;

/// Shared dependencies for the pipeline HTTP edge.
#[derive(Clone)]
pub struct PipelineAppState {
    pub coordinator: Arc<PipelineCoordinator>,
    pub regenerate: Arc<dyn JobHandler>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    pub demo_seeder: Arc<DemoSeeder>,
}
