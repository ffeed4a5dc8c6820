//! Interview pipeline: stage transitions gated by recorded results, and per-position
//! candidate reports with aggregate scores.

pub mod domain;
pub mod flow;
pub mod report;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;
pub mod transition;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, Candidate, CandidateId, EmployeeId, FlowId, Interview,
    InterviewFlow, InterviewId, InterviewMeta, InterviewStep, InvalidIdentifier, NewInterview,
    Position, PositionId, StepId,
};
pub use flow::StepSequence;
pub use report::{ApplicationSummaryView, CandidateProfileView, CandidateSummary, ReportAssembler};
pub use repository::{PipelineRepository, RepositoryError, StageUpdate};
pub use router::{pipeline_router, ApplicationTransitionRequest, TransitionRequest};
pub use scoring::{aggregate_scores, AggregateScore};
pub use service::{ErrorKind, PipelineService, PipelineServiceError, UpdatedApplicationView};
pub use store::InMemoryPipelineStore;
pub use transition::{
    TransitionDecision, TransitionDirection, TransitionError, TransitionRejection,
    TransitionValidator,
};
