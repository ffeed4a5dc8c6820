use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, Candidate, CandidateId, Interview, InterviewFlow, InterviewStep,
    NewInterview, Position, PositionId, StepId,
};

/// Atomic stage move: the pointer update and the optional interview append land together
/// or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUpdate {
    pub application_id: ApplicationId,
    /// Version the caller validated against. A mismatch means another writer got there first.
    pub expected_version: u64,
    pub new_step: StepId,
    pub interview: Option<NewInterview>,
}

/// Storage abstraction so the pipeline logic can be exercised without a database.
pub trait PipelineRepository: Send + Sync {
    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError>;
    fn flow_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Option<InterviewFlow>, RepositoryError>;
    fn step(&self, id: StepId) -> Result<Option<InterviewStep>, RepositoryError>;

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn applications_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn applications_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Application>, RepositoryError>;

    fn interviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError>;
    fn interviews_for_application_at_step(
        &self,
        application_id: ApplicationId,
        step_id: StepId,
    ) -> Result<Vec<Interview>, RepositoryError>;

    /// Apply a stage move as one unit of work, returning the stored application.
    fn save_application_stage(&self, update: StageUpdate) -> Result<Application, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
