use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, Candidate, CandidateId, FlowId, Interview, InterviewFlow,
    InterviewId, InterviewStep, NewInterview, Position, PositionId, StepId,
};
use super::repository::{PipelineRepository, RepositoryError, StageUpdate};

/// Process-local repository. Every write holds the single store lock, which serializes
/// stage updates per application and keeps the pointer move and interview append atomic.
/// Any write touching an application, including a recorded interview, bumps its version.
#[derive(Default, Clone)]
pub struct InMemoryPipelineStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Default)]
struct StoreState {
    candidates: HashMap<CandidateId, Candidate>,
    positions: HashMap<PositionId, Position>,
    flows: HashMap<FlowId, InterviewFlow>,
    applications: BTreeMap<ApplicationId, Application>,
    interviews: Vec<Interview>,
    next_interview_id: u64,
}

impl StoreState {
    fn step(&self, id: StepId) -> Option<&InterviewStep> {
        self.flows
            .values()
            .flat_map(|flow| flow.steps.iter())
            .find(|step| step.id == id)
    }

    fn push_interview(&mut self, interview: NewInterview, score: Option<f64>) -> Interview {
        self.next_interview_id += 1;
        let stored = Interview {
            id: InterviewId(self.next_interview_id),
            application_id: interview.application_id,
            interview_step_id: interview.interview_step_id,
            employee_id: interview.employee_id,
            interview_date: interview.interview_date,
            score,
            notes: None,
        };
        self.interviews.push(stored.clone());
        stored
    }
}

impl InMemoryPipelineStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    pub fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        let mut state = self.lock()?;
        if state.candidates.contains_key(&candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        state.candidates.insert(candidate.id, candidate.clone());
        Ok(candidate)
    }

    /// Register a position together with the flow it points at. Positions may share a
    /// flow, but only when they supply the same flow; step ids are unique across flows.
    pub fn insert_position(
        &self,
        position: Position,
        flow: InterviewFlow,
    ) -> Result<Position, RepositoryError> {
        let mut state = self.lock()?;
        if state.positions.contains_key(&position.id) || position.interview_flow_id != flow.id {
            return Err(RepositoryError::Conflict);
        }

        match state.flows.get(&flow.id).map(|stored| *stored == flow) {
            Some(false) => return Err(RepositoryError::Conflict),
            Some(true) => {}
            None => {
                let mut ids = HashSet::new();
                let reused = flow
                    .steps
                    .iter()
                    .any(|step| !ids.insert(step.id) || state.step(step.id).is_some());
                if reused {
                    return Err(RepositoryError::Conflict);
                }
                state.flows.insert(flow.id, flow);
            }
        }

        state.positions.insert(position.id, position.clone());
        Ok(position)
    }

    /// Create an application. Its current step must belong to the position's flow.
    pub fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if state.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        if !state.candidates.contains_key(&application.candidate_id) {
            return Err(RepositoryError::NotFound);
        }
        let flow_id = state
            .positions
            .get(&application.position_id)
            .map(|position| position.interview_flow_id)
            .ok_or(RepositoryError::NotFound)?;
        match state.step(application.current_interview_step) {
            Some(step) if step.interview_flow_id == flow_id => {}
            _ => return Err(RepositoryError::NotFound),
        }

        state.applications.insert(application.id, application.clone());
        Ok(application)
    }

    /// Record an interview that already took place, optionally scored. Bumps the owning
    /// application's version, so a stage save validated before this write is rejected.
    pub fn record_interview(
        &self,
        interview: NewInterview,
        score: Option<f64>,
    ) -> Result<Interview, RepositoryError> {
        let mut state = self.lock()?;
        let application = state
            .applications
            .get_mut(&interview.application_id)
            .ok_or(RepositoryError::NotFound)?;
        application.version += 1;
        Ok(state.push_interview(interview, score))
    }
}

impl PipelineRepository for InMemoryPipelineStore {
    fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Ok(self.lock()?.candidates.get(&id).cloned())
    }

    fn position(&self, id: PositionId) -> Result<Option<Position>, RepositoryError> {
        Ok(self.lock()?.positions.get(&id).cloned())
    }

    fn flow_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Option<InterviewFlow>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .positions
            .get(&position_id)
            .and_then(|position| state.flows.get(&position.interview_flow_id))
            .cloned())
    }

    fn step(&self, id: StepId) -> Result<Option<InterviewStep>, RepositoryError> {
        Ok(self.lock()?.step(id).cloned())
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn applications_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| application.position_id == position_id)
            .cloned()
            .collect())
    }

    fn applications_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| application.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    fn interviews_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .iter()
            .filter(|interview| interview.application_id == application_id)
            .cloned()
            .collect())
    }

    fn interviews_for_application_at_step(
        &self,
        application_id: ApplicationId,
        step_id: StepId,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .iter()
            .filter(|interview| {
                interview.application_id == application_id && interview.interview_step_id == step_id
            })
            .cloned()
            .collect())
    }

    fn save_application_stage(&self, update: StageUpdate) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if state.step(update.new_step).is_none() {
            return Err(RepositoryError::NotFound);
        }

        let application = state
            .applications
            .get_mut(&update.application_id)
            .ok_or(RepositoryError::NotFound)?;
        if application.version != update.expected_version {
            return Err(RepositoryError::Conflict);
        }

        application.current_interview_step = update.new_step;
        application.version += 1;
        let stored = application.clone();

        if let Some(interview) = update.interview {
            state.push_interview(interview, None);
        }

        Ok(stored)
    }
}
