use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicationId, CandidateId, EmployeeId, InterviewMeta, PositionId, StepId};
use super::repository::PipelineRepository;
use super::service::{ErrorKind, PipelineService, PipelineServiceError};

/// Body of a transition request addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub target_step_id: StepId,
    pub employee_id: EmployeeId,
    pub interview_date: NaiveDate,
}

impl TransitionRequest {
    fn meta(&self) -> InterviewMeta {
        InterviewMeta {
            employee_id: self.employee_id,
            interview_date: self.interview_date,
        }
    }
}

/// Body of a transition request that names the application in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTransitionRequest {
    pub application_id: ApplicationId,
    #[serde(flatten)]
    pub transition: TransitionRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    #[serde(rename = "targetStepId")]
    pub target_step_id: StepId,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(rename = "positionId")]
    position_id: Option<String>,
}

/// Router builder exposing the stage transition and reporting endpoints.
pub fn pipeline_router<R>(service: Arc<PipelineService<R>>) -> Router
where
    R: PipelineRepository + 'static,
{
    Router::new()
        .route("/api/v1/transition", post(transition_handler::<R>))
        .route(
            "/api/v1/applications/:application_id/transition",
            post(application_transition_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/transition/check",
            post(check_handler::<R>),
        )
        .route("/api/v1/report", get(report_handler::<R>))
        .route(
            "/api/v1/positions/:position_id/candidates",
            get(position_candidates_handler::<R>),
        )
        .route("/api/v1/candidates/:candidate_id", get(candidate_handler::<R>))
        .route(
            "/api/v1/candidates/:candidate_id/stage",
            put(candidate_stage_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn transition_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    payload: Result<axum::Json<ApplicationTransitionRequest>, JsonRejection>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };

    respond(service.execute_transition(
        request.application_id,
        request.transition.target_step_id,
        request.transition.meta(),
    ))
}

pub(crate) async fn application_transition_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(application_id): Path<String>,
    payload: Result<axum::Json<TransitionRequest>, JsonRejection>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let application_id = match application_id.parse::<ApplicationId>() {
        Ok(id) => id,
        Err(err) => return error_response(err.into()),
    };
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };

    respond(service.execute_transition(application_id, request.target_step_id, request.meta()))
}

pub(crate) async fn check_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(application_id): Path<String>,
    payload: Result<axum::Json<CheckRequest>, JsonRejection>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let application_id = match application_id.parse::<ApplicationId>() {
        Ok(id) => id,
        Err(err) => return error_response(err.into()),
    };
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };

    respond(service.check_transition(application_id, request.target_step_id))
}

pub(crate) async fn report_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let raw = query.position_id.unwrap_or_default();
    match raw.parse::<PositionId>() {
        Ok(position_id) => respond(service.candidates_for_position(position_id)),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn position_candidates_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(position_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    match position_id.parse::<PositionId>() {
        Ok(position_id) => respond(service.candidates_for_position(position_id)),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn candidate_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    match candidate_id.parse::<CandidateId>() {
        Ok(candidate_id) => respond(service.candidate_profile(candidate_id)),
        Err(err) => error_response(err.into()),
    }
}

pub(crate) async fn candidate_stage_handler<R>(
    State(service): State<Arc<PipelineService<R>>>,
    Path(candidate_id): Path<String>,
    payload: Result<axum::Json<ApplicationTransitionRequest>, JsonRejection>,
) -> Response
where
    R: PipelineRepository + 'static,
{
    let candidate_id = match candidate_id.parse::<CandidateId>() {
        Ok(id) => id,
        Err(err) => return error_response(err.into()),
    };
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };

    respond(service.move_candidate_stage(
        candidate_id,
        request.application_id,
        request.transition.target_step_id,
        request.transition.meta(),
    ))
}

fn respond<T: Serialize>(result: Result<T, PipelineServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: PipelineServiceError) -> Response {
    let kind = err.kind();
    let payload = json!({
        "error": err.to_string(),
        "kind": kind.label(),
    });
    (kind.status_code(), axum::Json(payload)).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
        "kind": ErrorKind::InputInvalid.label(),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}
