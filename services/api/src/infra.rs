use chrono::NaiveDate;
use hiring_pipeline::workflows::pipeline::{
    Application, ApplicationId, Candidate, CandidateId, EmployeeId, FlowId, InMemoryPipelineStore,
    InterviewFlow, InterviewStep, NewInterview, Position, PositionId, RepositoryError, StepId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_POSITION: PositionId = PositionId(1);
pub(crate) const SCREENING: StepId = StepId(1);
pub(crate) const TECHNICAL: StepId = StepId(2);
pub(crate) const OFFER: StepId = StepId(3);
pub(crate) const JOHN_APPLICATION: ApplicationId = ApplicationId(1);
pub(crate) const JANE_APPLICATION: ApplicationId = ApplicationId(2);
pub(crate) const CARLOS_APPLICATION: ApplicationId = ApplicationId(3);
pub(crate) const DEMO_INTERVIEWER: EmployeeId = EmployeeId(1);

const DEMO_FLOW: FlowId = FlowId(1);

fn demo_date(day: u32) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .ok_or_else(|| RepositoryError::Unavailable(format!("invalid fixture day {day}")))
}

fn demo_flow() -> InterviewFlow {
    let step = |id, name: &str, order_index| InterviewStep {
        id,
        interview_flow_id: DEMO_FLOW,
        name: name.to_string(),
        order_index,
    };

    InterviewFlow {
        id: DEMO_FLOW,
        name: "Standard engineering loop".to_string(),
        steps: vec![
            step(SCREENING, "Screening", 0),
            step(TECHNICAL, "Technical", 1),
            step(OFFER, "Offer", 2),
        ],
    }
}

fn demo_candidate(id: u64, first_name: &str, last_name: &str, email: &str) -> Candidate {
    Candidate {
        id: CandidateId(id),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        phone: None,
        address: None,
    }
}

/// In-memory store holding one position and three applicants:
/// John at Screening with nothing recorded, Jane at Technical with scores at both
/// Screening and Technical, and Carlos at Technical with a Screening score only.
pub(crate) fn seed_demo_store() -> Result<InMemoryPipelineStore, RepositoryError> {
    let store = InMemoryPipelineStore::default();
    store.insert_position(
        Position {
            id: DEMO_POSITION,
            title: "Senior Backend Engineer".to_string(),
            interview_flow_id: DEMO_FLOW,
        },
        demo_flow(),
    )?;

    store.insert_candidate(demo_candidate(1, "John", "Doe", "john.doe@example.com"))?;
    store.insert_candidate(demo_candidate(2, "Jane", "Smith", "jane.smith@example.com"))?;
    store.insert_candidate(demo_candidate(
        3,
        "Carlos",
        "García",
        "carlos.garcia@example.com",
    ))?;

    let applications = [
        (JOHN_APPLICATION, CandidateId(1), SCREENING),
        (JANE_APPLICATION, CandidateId(2), TECHNICAL),
        (CARLOS_APPLICATION, CandidateId(3), TECHNICAL),
    ];
    for (id, candidate_id, current_interview_step) in applications {
        store.insert_application(Application {
            id,
            candidate_id,
            position_id: DEMO_POSITION,
            current_interview_step,
            application_date: demo_date(1)?,
            notes: None,
            version: 0,
        })?;
    }

    let interviews = [
        (JANE_APPLICATION, SCREENING, 4.0, 3),
        (JANE_APPLICATION, TECHNICAL, 5.0, 6),
        (CARLOS_APPLICATION, SCREENING, 5.0, 4),
    ];
    for (application_id, interview_step_id, score, day) in interviews {
        store.record_interview(
            NewInterview {
                application_id,
                interview_step_id,
                employee_id: DEMO_INTERVIEWER,
                interview_date: demo_date(day)?,
            },
            Some(score),
        )?;
    }

    Ok(store)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_position_id(raw: &str) -> Result<PositionId, String> {
    raw.parse::<PositionId>().map_err(|err| err.to_string())
}
