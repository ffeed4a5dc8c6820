use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::pipeline::domain::{
    Application, ApplicationId, Candidate, CandidateId, EmployeeId, FlowId, Interview,
    InterviewFlow, InterviewMeta, InterviewStep, NewInterview, Position, PositionId, StepId,
};
use crate::workflows::pipeline::repository::{PipelineRepository, RepositoryError, StageUpdate};
use crate::workflows::pipeline::store::InMemoryPipelineStore;
use crate::workflows::pipeline::{pipeline_router, PipelineService};

pub(super) const POSITION: PositionId = PositionId(1);
pub(super) const FLOW: FlowId = FlowId(1);
pub(super) const SCREENING: StepId = StepId(11);
pub(super) const TECHNICAL: StepId = StepId(12);
pub(super) const OFFER: StepId = StepId(13);
pub(super) const JOHN: CandidateId = CandidateId(1);
pub(super) const JANE: CandidateId = CandidateId(2);
pub(super) const JOHN_APPLICATION: ApplicationId = ApplicationId(100);
pub(super) const JANE_APPLICATION: ApplicationId = ApplicationId(200);
pub(super) const INTERVIEWER: EmployeeId = EmployeeId(7);

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn meta() -> InterviewMeta {
    InterviewMeta {
        employee_id: INTERVIEWER,
        interview_date: date(2025, 3, 10),
    }
}

pub(super) fn step(id: StepId, name: &str, order_index: i32) -> InterviewStep {
    InterviewStep {
        id,
        interview_flow_id: FLOW,
        name: name.to_string(),
        order_index,
    }
}

/// Screening(0) -> Technical(1) -> Offer(2), stored out of order.
pub(super) fn engineering_flow() -> InterviewFlow {
    InterviewFlow {
        id: FLOW,
        name: "Engineering".to_string(),
        steps: vec![
            step(OFFER, "Offer", 2),
            step(SCREENING, "Screening", 0),
            step(TECHNICAL, "Technical", 1),
        ],
    }
}

pub(super) fn candidate(id: CandidateId, first: &str, last: &str) -> Candidate {
    Candidate {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        phone: Some("+34 600 000 000".to_string()),
        address: None,
    }
}

pub(super) fn application(
    id: ApplicationId,
    candidate_id: CandidateId,
    current: StepId,
) -> Application {
    Application {
        id,
        candidate_id,
        position_id: POSITION,
        current_interview_step: current,
        application_date: date(2025, 3, 1),
        notes: None,
        version: 0,
    }
}

/// John applies at Screening, Jane is already at Technical. No interviews recorded.
pub(super) fn seeded_store() -> Arc<InMemoryPipelineStore> {
    let store = InMemoryPipelineStore::default();
    store
        .insert_position(
            Position {
                id: POSITION,
                title: "Senior Backend Engineer".to_string(),
                interview_flow_id: FLOW,
            },
            engineering_flow(),
        )
        .expect("position inserted");
    store
        .insert_candidate(candidate(JOHN, "John", "Doe"))
        .expect("john inserted");
    store
        .insert_candidate(candidate(JANE, "Jane", "Smith"))
        .expect("jane inserted");
    store
        .insert_application(application(JOHN_APPLICATION, JOHN, SCREENING))
        .expect("john applies");
    store
        .insert_application(application(JANE_APPLICATION, JANE, TECHNICAL))
        .expect("jane applies");
    Arc::new(store)
}

pub(super) fn record(
    store: &InMemoryPipelineStore,
    application_id: ApplicationId,
    step: StepId,
    score: Option<f64>,
) -> Interview {
    store
        .record_interview(
            NewInterview {
                application_id,
                interview_step_id: step,
                employee_id: INTERVIEWER,
                interview_date: date(2025, 3, 5),
            },
            score,
        )
        .expect("interview recorded")
}

pub(super) fn build_service() -> (
    PipelineService<InMemoryPipelineStore>,
    Arc<InMemoryPipelineStore>,
) {
    let store = seeded_store();
    (PipelineService::new(store.clone()), store)
}

pub(super) fn pipeline_router_with_store(store: Arc<InMemoryPipelineStore>) -> axum::Router {
    pipeline_router(Arc::new(PipelineService::new(store)))
}

pub(super) fn scored(score: Option<f64>) -> Interview {
    Interview {
        id: crate::workflows::pipeline::domain::InterviewId(1),
        application_id: JOHN_APPLICATION,
        interview_step_id: SCREENING,
        employee_id: INTERVIEWER,
        interview_date: date(2025, 3, 5),
        score,
        notes: None,
    }
}

/// Repository whose every call fails as if the database were offline.
pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PipelineRepository for UnavailableRepository {
    fn candidate(&self, _id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        offline()
    }

    fn position(&self, _id: PositionId) -> Result<Option<Position>, RepositoryError> {
        offline()
    }

    fn flow_for_position(
        &self,
        _position_id: PositionId,
    ) -> Result<Option<InterviewFlow>, RepositoryError> {
        offline()
    }

    fn step(&self, _id: StepId) -> Result<Option<InterviewStep>, RepositoryError> {
        offline()
    }

    fn application(&self, _id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn applications_for_position(
        &self,
        _position_id: PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn applications_for_candidate(
        &self,
        _candidate_id: CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn interviews_for_application(
        &self,
        _application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        offline()
    }

    fn interviews_for_application_at_step(
        &self,
        _application_id: ApplicationId,
        _step_id: StepId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        offline()
    }

    fn save_application_stage(&self, _update: StageUpdate) -> Result<Application, RepositoryError> {
        offline()
    }
}

/// What a concurrent request does between validation and the stage save.
pub(super) enum Race {
    /// Another request already moved the application.
    StaleVersion,
    /// An interviewer submitted a result at the application's current step.
    LateResult,
}

/// Reads from a real store but interleaves a competing write into every stage save.
pub(super) struct RacingRepository {
    pub(super) inner: Arc<InMemoryPipelineStore>,
    pub(super) race: Race,
}

impl RacingRepository {
    pub(super) fn stale_version(inner: Arc<InMemoryPipelineStore>) -> Self {
        Self {
            inner,
            race: Race::StaleVersion,
        }
    }

    pub(super) fn late_result(inner: Arc<InMemoryPipelineStore>) -> Self {
        Self {
            inner,
            race: Race::LateResult,
        }
    }
}

impl PipelineRepository for RacingRepository {
    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        self.inner.candidate(id)
    }

    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError> {
        self.inner.position(id)
    }

    fn flow_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Option<InterviewFlow>, RepositoryError> {
        self.inner.flow_for_position(position_id)
    }

    fn step(&self, id: StepId) -> Result<Option<InterviewStep>, RepositoryError> {
        self.inner.step(id)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.application(id)
    }

    fn applications_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_position(position_id)
    }

    fn applications_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_candidate(candidate_id)
    }

    fn interviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        self.inner.interviews_for_application(application_id)
    }

    fn interviews_for_application_at_step(
        &self,
        application_id: ApplicationId,
        step_id: StepId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        self.inner
            .interviews_for_application_at_step(application_id, step_id)
    }

    fn save_application_stage(&self, update: StageUpdate) -> Result<Application, RepositoryError> {
        match self.race {
            Race::StaleVersion => self.inner.save_application_stage(StageUpdate {
                expected_version: update.expected_version + 1,
                ..update
            }),
            Race::LateResult => {
                if let Some(application) = self.inner.application(update.application_id)? {
                    record(
                        &self.inner,
                        application.id,
                        application.current_interview_step,
                        Some(5.0),
                    );
                }
                self.inner.save_application_stage(update)
            }
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
