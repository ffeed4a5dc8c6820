//! Stage transition rules for a single interview flow.
//!
//! Steps form a line ordered by `order_index`. An application may move exactly one
//! step in either direction, and recorded results at the current step gate the move:
//! advancing needs at least one interview there, retreating needs none.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, PositionId, StepId};
use super::flow::StepSequence;
use super::repository::{PipelineRepository, RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    Advance,
    Retreat,
}

impl TransitionDirection {
    pub const fn label(self) -> &'static str {
        match self {
            TransitionDirection::Advance => "advance",
            TransitionDirection::Retreat => "retreat",
        }
    }
}

/// Business-rule rejections. Deterministic: retrying with the same input never succeeds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionRejection {
    #[error("invalid transition from step position {from} to {to}: only single-step moves are allowed")]
    InvalidTransition { from: usize, to: usize },
    #[error("cannot advance past step {step}: no interview results recorded there")]
    CannotAdvanceWithoutResults { step: StepId },
    #[error("cannot retreat from step {step}: {recorded} interview result(s) already recorded")]
    CannotRetreatWithResults { step: StepId, recorded: usize },
}

/// Why a requested move could not be validated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no interview flow configured for position {0}")]
    FlowNotFound(PositionId),
    #[error("application {application_id} points at step {step}, which is not ranked in its flow")]
    StepNotInFlow {
        application_id: ApplicationId,
        step: StepId,
    },
    #[error("step {step} does not belong to the interview flow of position {position_id}")]
    TargetStepNotInFlow {
        position_id: PositionId,
        step: StepId,
    },
    #[error(transparent)]
    Rejected(#[from] TransitionRejection),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Current and target positions of a requested move within a ranked flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMove {
    pub current_index: usize,
    pub target_index: usize,
}

impl StepMove {
    pub fn delta(&self) -> i64 {
        self.target_index as i64 - self.current_index as i64
    }

    pub fn direction(&self) -> Result<TransitionDirection, TransitionRejection> {
        match self.delta() {
            1 => Ok(TransitionDirection::Advance),
            -1 => Ok(TransitionDirection::Retreat),
            _ => Err(TransitionRejection::InvalidTransition {
                from: self.current_index,
                to: self.target_index,
            }),
        }
    }
}

/// Resolve both ends of a move by step id within the ranked sequence.
pub fn locate_move(
    sequence: &StepSequence,
    application: &Application,
    target: StepId,
) -> Result<StepMove, TransitionError> {
    let current_index = sequence
        .position_of(application.current_interview_step)
        .ok_or(TransitionError::StepNotInFlow {
            application_id: application.id,
            step: application.current_interview_step,
        })?;
    let target_index = sequence
        .position_of(target)
        .ok_or(TransitionError::TargetStepNotInFlow {
            position_id: application.position_id,
            step: target,
        })?;

    Ok(StepMove {
        current_index,
        target_index,
    })
}

/// Apply result gating to an adjacent move.
pub fn gate(
    direction: TransitionDirection,
    current_step: StepId,
    results_at_current: usize,
) -> Result<(), TransitionRejection> {
    match direction {
        TransitionDirection::Advance if results_at_current == 0 => {
            Err(TransitionRejection::CannotAdvanceWithoutResults { step: current_step })
        }
        TransitionDirection::Retreat if results_at_current > 0 => {
            Err(TransitionRejection::CannotRetreatWithResults {
                step: current_step,
                recorded: results_at_current,
            })
        }
        _ => Ok(()),
    }
}

/// Outcome of a dry-run check, shaped for API consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<TransitionDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionDecision {
    pub fn allowed(direction: TransitionDirection) -> Self {
        Self {
            allowed: true,
            direction: Some(direction),
            reason: None,
        }
    }

    pub fn rejected(rejection: &TransitionRejection) -> Self {
        Self {
            allowed: false,
            direction: None,
            reason: Some(rejection.to_string()),
        }
    }
}

/// Validates moves against the flow and recorded interviews held by the repository.
pub struct TransitionValidator<R> {
    repository: Arc<R>,
}

impl<R> TransitionValidator<R>
where
    R: PipelineRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn validate(
        &self,
        application: &Application,
        target: StepId,
    ) -> Result<TransitionDirection, TransitionError> {
        let flow = self
            .repository
            .flow_for_position(application.position_id)?
            .ok_or(TransitionError::FlowNotFound(application.position_id))?;
        let sequence = StepSequence::from_flow(&flow);

        let direction = locate_move(&sequence, application, target)?.direction()?;

        let recorded = self
            .repository
            .interviews_for_application_at_step(application.id, application.current_interview_step)?
            .len();
        gate(direction, application.current_interview_step, recorded)?;

        Ok(direction)
    }
}
