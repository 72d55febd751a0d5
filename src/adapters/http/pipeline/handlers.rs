//! Axum handler functions for the pipeline HTTP edge (§6).

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::domain::audit::EntityType;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::job::JobType;
use crate::domain::regeneration::RegenerationScope;
use crate::ports::JobHandler;

use super::dto::{
    DemoValidateResponse, ErrorResponse, RegenerateFullRequest, RegenerateSectionsRequest,
    RegenerateTemplateUpdateRequest, RegenerationHistoryQuery, RegenerationHistoryResponse,
    RegenerationResponse, RenderRequest, RenderResponse,
};
use super::PipelineAppState;

/// Errors surfaced by the pipeline HTTP edge, mapped to an HTTP status and
/// an `ErrorResponse` body.
#[derive(Debug)]
pub enum PipelineApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<DomainError> for PipelineApiError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::NotFound => PipelineApiError::NotFound(err.message),
            ErrorCode::AlreadyRendered => PipelineApiError::Conflict(err.message),
            ErrorCode::ValidationFailed
            | ErrorCode::MissingValidatedContent
            | ErrorCode::StaticSectionError
            | ErrorCode::TemplateVersionMismatch => PipelineApiError::BadRequest(err.message),
            _ => PipelineApiError::Internal(err.message),
        }
    }
}

impl IntoResponse for PipelineApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            PipelineApiError::BadRequest(message) => (axum::http::StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message)),
            PipelineApiError::NotFound(message) => (axum::http::StatusCode::NOT_FOUND, ErrorResponse::not_found(message)),
            PipelineApiError::Conflict(message) => {
                (axum::http::StatusCode::CONFLICT, ErrorResponse { code: "CONFLICT".to_string(), message, details: None })
            }
            PipelineApiError::Internal(message) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::internal(message)),
        };
        (status, Json(body)).into_response()
    }
}

fn regeneration_response_from(value: serde_json::Value) -> Result<RegenerationResponse, PipelineApiError> {
    serde_json::from_value(value).map_err(|e| PipelineApiError::Internal(format!("malformed regeneration result: {e}")))
}

pub async fn regenerate_sections(
    State(state): State<PipelineAppState>,
    Json(req): Json<RegenerateSectionsRequest>,
) -> Result<impl IntoResponse, PipelineApiError> {
    let scope = RegenerationScope::Section { target_sections: req.target_sections.into_iter().map(Into::into).collect() };
    let payload = json!({
        "document_id": req.document_id,
        "client_data": req.client_data,
        "scope": scope,
        "strategy": req.strategy,
        "force": req.force,
        "section_overrides": req.section_overrides,
        "correlation_id": req.correlation_id,
    });
    let result = state.regenerate.handle(JobType::Regenerate, payload).await?;
    Ok(Json(regeneration_response_from(result)?))
}

pub async fn regenerate_full(
    State(state): State<PipelineAppState>,
    Json(req): Json<RegenerateFullRequest>,
) -> Result<impl IntoResponse, PipelineApiError> {
    let payload = json!({
        "document_id": req.document_id,
        "client_data": req.client_data,
        "scope": RegenerationScope::Full,
        "strategy": req.strategy,
        "force": req.force,
        "section_overrides": req.section_overrides,
        "correlation_id": req.correlation_id,
    });
    let result = state.regenerate.handle(JobType::Regenerate, payload).await?;
    Ok(Json(regeneration_response_from(result)?))
}

pub async fn regenerate_template_update(
    State(state): State<PipelineAppState>,
    Json(req): Json<RegenerateTemplateUpdateRequest>,
) -> Result<impl IntoResponse, PipelineApiError> {
    let new_template_version_id = req
        .new_template_version_id
        .parse()
        .map_err(|_| PipelineApiError::BadRequest("new_template_version_id is not a valid id".to_string()))?;
    let payload = json!({
        "document_id": req.document_id,
        "client_data": req.client_data,
        "scope": RegenerationScope::TemplateUpdate { new_template_version_id },
        "strategy": req.strategy,
        "force": req.force,
        "section_overrides": req.section_overrides,
        "correlation_id": req.correlation_id,
    });
    let result = state.regenerate.handle(JobType::Regenerate, payload).await?;
    Ok(Json(regeneration_response_from(result)?))
}

pub async fn regeneration_history(
    State(state): State<PipelineAppState>,
    Query(query): Query<RegenerationHistoryQuery>,
) -> Result<impl IntoResponse, PipelineApiError> {
    let entries = state.audit_log.find_by_entity(EntityType::Document, &query.document_id).await?;
    Ok(Json(RegenerationHistoryResponse { entries }))
}

pub async fn render(State(state): State<PipelineAppState>, Json(req): Json<RenderRequest>) -> Result<impl IntoResponse, PipelineApiError> {
    let document_id = req
        .document_id
        .parse()
        .map_err(|_| PipelineApiError::BadRequest("document_id is not a valid id".to_string()))?;
    let rendered = state
        .coordinator
        .render_standalone(document_id, req.version_intent, req.force_rerender, req.correlation_id)
        .await?;
    Ok(Json(RenderResponse {
        rendered_document_id: rendered.id.to_string(),
        version: rendered.version,
        output_blob_key: rendered.output_blob_key.unwrap_or_default(),
        content_hash: rendered.content_hash.unwrap_or_default(),
    }))
}

pub async fn demo_seed(State(state): State<PipelineAppState>) -> Result<impl IntoResponse, PipelineApiError> {
    state.demo_seeder.seed().await?;
    Ok(Json(state.demo_seeder.ids()))
}

pub async fn demo_ids(State(state): State<PipelineAppState>) -> impl IntoResponse {
    Json(state.demo_seeder.ids())
}

pub async fn demo_validate(State(state): State<PipelineAppState>) -> impl IntoResponse {
    match state.demo_seeder.validate().await {
        Ok(()) => Json(DemoValidateResponse { valid: true, message: None }),
        Err(e) => Json(DemoValidateResponse { valid: false, message: Some(e.message) }),
    }
}
