use super::domain::{FlowId, InterviewFlow, InterviewStep, StepId};

/// Steps of one flow ranked by `order_index`.
///
/// Steps that belong to another flow are left out. A flow in which two steps share an
/// `order_index` cannot be ranked at all: the sequence comes back empty, so every lookup
/// reports "not in flow" instead of guessing which steps are adjacent.
#[derive(Debug, Clone)]
pub struct StepSequence {
    flow_id: FlowId,
    steps: Vec<InterviewStep>,
}

impl StepSequence {
    pub fn from_flow(flow: &InterviewFlow) -> Self {
        let mut steps: Vec<InterviewStep> = flow
            .steps
            .iter()
            .filter(|step| step.interview_flow_id == flow.id)
            .cloned()
            .collect();
        steps.sort_by_key(|step| step.order_index);

        let ambiguous = steps
            .windows(2)
            .any(|pair| pair[0].order_index == pair[1].order_index);
        if ambiguous {
            steps.clear();
        }

        Self {
            flow_id: flow.id,
            steps,
        }
    }

    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    pub fn position_of(&self, step: StepId) -> Option<usize> {
        self.steps.iter().position(|candidate| candidate.id == step)
    }

    pub fn step_at(&self, index: usize) -> Option<&InterviewStep> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[InterviewStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
