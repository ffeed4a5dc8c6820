use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{
    ApplicationId, CandidateId, InterviewMeta, InvalidIdentifier, NewInterview, PositionId,
    StepId,
};
use super::report::{CandidateProfileView, CandidateSummary, ReportAssembler};
use super::repository::{PipelineRepository, RepositoryError, StageUpdate};
use super::transition::{
    TransitionDecision, TransitionDirection, TransitionError, TransitionValidator,
};

/// Application state after an executed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedApplicationView {
    pub application_id: ApplicationId,
    pub candidate_id: CandidateId,
    pub position_id: PositionId,
    pub candidate_name: String,
    pub current_interview_step_id: StepId,
    pub current_interview_step: String,
    pub direction: TransitionDirection,
    pub interview_created: bool,
}

/// Service composing the transition validator, report assembler, and repository.
pub struct PipelineService<R> {
    repository: Arc<R>,
    validator: TransitionValidator<R>,
    reports: ReportAssembler<R>,
}

impl<R> PipelineService<R>
where
    R: PipelineRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            validator: TransitionValidator::new(repository.clone()),
            reports: ReportAssembler::new(repository.clone()),
            repository,
        }
    }

    /// Dry-run validation of a move. Missing records still surface as errors.
    pub fn check_transition(
        &self,
        application_id: ApplicationId,
        target: StepId,
    ) -> Result<TransitionDecision, PipelineServiceError> {
        let application = self
            .repository
            .application(application_id)?
            .ok_or(PipelineServiceError::ApplicationNotFound(application_id))?;
        self.repository
            .step(target)?
            .ok_or(PipelineServiceError::StepNotFound(target))?;

        match self.validator.validate(&application, target) {
            Ok(direction) => Ok(TransitionDecision::allowed(direction)),
            Err(TransitionError::Rejected(rejection)) => {
                Ok(TransitionDecision::rejected(&rejection))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Validate and apply a move. On any failure the application and its interviews are
    /// left exactly as they were.
    pub fn execute_transition(
        &self,
        application_id: ApplicationId,
        target: StepId,
        meta: InterviewMeta,
    ) -> Result<UpdatedApplicationView, PipelineServiceError> {
        let application = self
            .repository
            .application(application_id)?
            .ok_or(PipelineServiceError::ApplicationNotFound(application_id))?;
        let target_step = self
            .repository
            .step(target)?
            .ok_or(PipelineServiceError::StepNotFound(target))?;

        let direction = self
            .validator
            .validate(&application, target)
            .map_err(|err| log_rejection(application_id, target, err))?;

        let interview = match direction {
            TransitionDirection::Advance => {
                Some(NewInterview::scheduled(application_id, target, meta))
            }
            TransitionDirection::Retreat => None,
        };
        let interview_created = interview.is_some();

        let updated = self
            .repository
            .save_application_stage(StageUpdate {
                application_id,
                expected_version: application.version,
                new_step: target,
                interview,
            })
            .map_err(|err| {
                if err == RepositoryError::Conflict {
                    warn!(%application_id, "stage update lost a concurrent race");
                }
                PipelineServiceError::from(err)
            })?;

        let candidate = self
            .repository
            .candidate(updated.candidate_id)?
            .ok_or_else(|| {
                PipelineServiceError::integrity(format!(
                    "application {} references missing candidate {}",
                    updated.id, updated.candidate_id
                ))
            })?;

        info!(
            %application_id,
            from = %application.current_interview_step,
            to = %target,
            direction = direction.label(),
            "application moved to {}",
            target_step.name
        );

        Ok(UpdatedApplicationView {
            application_id: updated.id,
            candidate_id: updated.candidate_id,
            position_id: updated.position_id,
            candidate_name: candidate.full_name(),
            current_interview_step_id: updated.current_interview_step,
            current_interview_step: target_step.name,
            direction,
            interview_created,
        })
    }

    /// Candidate-scoped variant: the application must belong to the candidate.
    pub fn move_candidate_stage(
        &self,
        candidate_id: CandidateId,
        application_id: ApplicationId,
        target: StepId,
        meta: InterviewMeta,
    ) -> Result<UpdatedApplicationView, PipelineServiceError> {
        self.repository
            .candidate(candidate_id)?
            .ok_or(PipelineServiceError::CandidateNotFound(candidate_id))?;
        let owned = self
            .repository
            .application(application_id)?
            .is_some_and(|application| application.candidate_id == candidate_id);
        if !owned {
            return Err(PipelineServiceError::ApplicationNotFound(application_id));
        }

        self.execute_transition(application_id, target, meta)
    }

    pub fn candidates_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Vec<CandidateSummary>, PipelineServiceError> {
        let summaries = self.reports.list_for_position(position_id)?;
        info!(%position_id, candidates = summaries.len(), "assembled position report");
        Ok(summaries)
    }

    pub fn candidate_profile(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CandidateProfileView, PipelineServiceError> {
        self.reports.candidate_profile(candidate_id)
    }
}

fn log_rejection(
    application_id: ApplicationId,
    target: StepId,
    err: TransitionError,
) -> TransitionError {
    match &err {
        TransitionError::Rejected(rejection) => {
            warn!(%application_id, %target, %rejection, "transition rejected");
        }
        TransitionError::StepNotInFlow { .. } => {
            error!(%application_id, error = %err, "application state is inconsistent");
        }
        _ => {}
    }
    err
}

/// Broad failure classes, each with a fixed HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    RuleViolation,
    InputInvalid,
    Integrity,
    Persistence,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::RuleViolation => "rule_violation",
            ErrorKind::InputInvalid => "input_invalid",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Persistence => "persistence",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::RuleViolation => StatusCode::CONFLICT,
            ErrorKind::InputInvalid => StatusCode::BAD_REQUEST,
            ErrorKind::Integrity | ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error raised by the pipeline service.
#[derive(Debug, thiserror::Error)]
pub enum PipelineServiceError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidIdentifier),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),
    #[error("position {0} not found")]
    PositionNotFound(PositionId),
    #[error("interview step {0} not found")]
    StepNotFound(StepId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("inconsistent pipeline data: {0}")]
    Integrity(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PipelineServiceError {
    pub(crate) fn integrity(detail: String) -> Self {
        error!(%detail, "pipeline integrity violation");
        Self::Integrity(detail)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineServiceError::InvalidInput(_) => ErrorKind::InputInvalid,
            PipelineServiceError::ApplicationNotFound(_)
            | PipelineServiceError::CandidateNotFound(_)
            | PipelineServiceError::PositionNotFound(_)
            | PipelineServiceError::StepNotFound(_) => ErrorKind::NotFound,
            PipelineServiceError::Transition(err) => match err {
                TransitionError::FlowNotFound(_) => ErrorKind::NotFound,
                TransitionError::StepNotInFlow { .. } => ErrorKind::Integrity,
                TransitionError::TargetStepNotInFlow { .. } | TransitionError::Rejected(_) => {
                    ErrorKind::RuleViolation
                }
                TransitionError::Repository(err) => repository_kind(err),
            },
            PipelineServiceError::Integrity(_) => ErrorKind::Integrity,
            PipelineServiceError::Repository(err) => repository_kind(err),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

fn repository_kind(err: &RepositoryError) -> ErrorKind {
    match err {
        RepositoryError::Conflict => ErrorKind::RuleViolation,
        RepositoryError::NotFound => ErrorKind::NotFound,
        RepositoryError::Unavailable(_) => ErrorKind::Persistence,
    }
}
