use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Application, ApplicationId, CandidateId, PositionId, StepId};
use super::repository::PipelineRepository;
use super::scoring::aggregate_scores;
use super::service::PipelineServiceError;

/// One row of the per-position candidate report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub full_name: String,
    pub current_interview_step: String,
    /// Rounded to two decimals; `null` until at least one interview is scored.
    pub average_score: Option<f64>,
}

/// Candidate contact details with every application they hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfileView {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub applications: Vec<ApplicationSummaryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummaryView {
    pub application_id: ApplicationId,
    pub position_id: PositionId,
    pub position_title: String,
    pub application_date: NaiveDate,
    pub current_interview_step_id: StepId,
    pub current_interview_step: String,
    pub interview_count: usize,
    pub average_score: Option<f64>,
}

/// Read-only composition of report views from raw repository records.
pub struct ReportAssembler<R> {
    repository: Arc<R>,
}

impl<R> ReportAssembler<R>
where
    R: PipelineRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Summaries for every application to the position, in repository iteration order.
    pub fn list_for_position(
        &self,
        position_id: PositionId,
    ) -> Result<Vec<CandidateSummary>, PipelineServiceError> {
        self.repository
            .position(position_id)?
            .ok_or(PipelineServiceError::PositionNotFound(position_id))?;

        self.repository
            .applications_for_position(position_id)?
            .iter()
            .map(|application| self.summarize(application))
            .collect()
    }

    pub fn candidate_profile(
        &self,
        candidate_id: CandidateId,
    ) -> Result<CandidateProfileView, PipelineServiceError> {
        let candidate = self
            .repository
            .candidate(candidate_id)?
            .ok_or(PipelineServiceError::CandidateNotFound(candidate_id))?;

        let applications = self
            .repository
            .applications_for_candidate(candidate_id)?
            .iter()
            .map(|application| self.application_view(application))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CandidateProfileView {
            candidate_id,
            full_name: candidate.full_name(),
            email: candidate.email,
            phone: candidate.phone,
            address: candidate.address,
            applications,
        })
    }

    fn summarize(
        &self,
        application: &Application,
    ) -> Result<CandidateSummary, PipelineServiceError> {
        let candidate = self
            .repository
            .candidate(application.candidate_id)?
            .ok_or_else(|| {
                PipelineServiceError::integrity(format!(
                    "application {} references missing candidate {}",
                    application.id, application.candidate_id
                ))
            })?;
        let step_name = self.step_name(application)?;
        let interviews = self.repository.interviews_for_application(application.id)?;

        Ok(CandidateSummary {
            full_name: candidate.full_name(),
            current_interview_step: step_name,
            average_score: aggregate_scores(&interviews).map(|score| score.rounded()),
        })
    }

    fn application_view(
        &self,
        application: &Application,
    ) -> Result<ApplicationSummaryView, PipelineServiceError> {
        let position = self
            .repository
            .position(application.position_id)?
            .ok_or_else(|| {
                PipelineServiceError::integrity(format!(
                    "application {} references missing position {}",
                    application.id, application.position_id
                ))
            })?;
        let interviews = self.repository.interviews_for_application(application.id)?;

        Ok(ApplicationSummaryView {
            application_id: application.id,
            position_id: position.id,
            position_title: position.title,
            application_date: application.application_date,
            current_interview_step_id: application.current_interview_step,
            current_interview_step: self.step_name(application)?,
            interview_count: interviews.len(),
            average_score: aggregate_scores(&interviews).map(|score| score.rounded()),
        })
    }

    fn step_name(&self, application: &Application) -> Result<String, PipelineServiceError> {
        self.repository
            .step(application.current_interview_step)?
            .map(|step| step.name)
            .ok_or_else(|| {
                PipelineServiceError::integrity(format!(
                    "application {} points at missing step {}",
                    application.id, application.current_interview_step
                ))
            })
    }
}
