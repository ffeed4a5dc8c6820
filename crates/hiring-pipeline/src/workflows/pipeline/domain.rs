use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raised when a path or query identifier is not a positive integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} identifier '{raw}'")]
pub struct InvalidIdentifier {
    pub kind: &'static str,
    pub raw: String,
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdentifier;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().parse::<u64>() {
                    Ok(value) if value > 0 => Ok(Self(value)),
                    _ => Err(InvalidIdentifier {
                        kind: $kind,
                        raw: raw.to_string(),
                    }),
                }
            }
        }
    };
}

identifier!(
    /// Identifier of a candidate taking part in one or more hiring pipelines.
    CandidateId,
    "candidate"
);
identifier!(
    /// Identifier of an open position.
    PositionId,
    "position"
);
identifier!(FlowId, "interview flow");
identifier!(StepId, "interview step");
identifier!(
    /// Identifier of a candidate's application to a position.
    ApplicationId,
    "application"
);
identifier!(InterviewId, "interview");
identifier!(
    /// Identifier of the employee conducting an interview.
    EmployeeId,
    "employee"
);

/// Contact details for a person in the pipeline. Immutable once intake is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl Candidate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A job opening and the interview flow its candidates pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub title: String,
    pub interview_flow_id: FlowId,
}

/// One stage of an interview flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewStep {
    pub id: StepId,
    pub interview_flow_id: FlowId,
    pub name: String,
    pub order_index: i32,
}

/// The steps a position's candidates move through. Storage order carries no meaning;
/// sequence is defined by `order_index` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewFlow {
    pub id: FlowId,
    pub name: String,
    pub steps: Vec<InterviewStep>,
}

/// A candidate enrolled in a position's flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub position_id: PositionId,
    pub current_interview_step: StepId,
    pub application_date: NaiveDate,
    pub notes: Option<String>,
    /// Bumped on every stage save; used for optimistic concurrency checks.
    pub version: u64,
}

/// Append-only record of an evaluation at a given step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub interview_step_id: StepId,
    pub employee_id: EmployeeId,
    pub interview_date: NaiveDate,
    pub score: Option<f64>,
    pub notes: Option<String>,
}

/// Who runs the interview scheduled by an advance, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewMeta {
    pub employee_id: EmployeeId,
    pub interview_date: NaiveDate,
}

/// Interview row appended together with a stage move. Scores are attached later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInterview {
    pub application_id: ApplicationId,
    pub interview_step_id: StepId,
    pub employee_id: EmployeeId,
    pub interview_date: NaiveDate,
}

impl NewInterview {
    pub fn scheduled(application_id: ApplicationId, step: StepId, meta: InterviewMeta) -> Self {
        Self {
            application_id,
            interview_step_id: step,
            employee_id: meta.employee_id,
            interview_date: meta.interview_date,
        }
    }
}
