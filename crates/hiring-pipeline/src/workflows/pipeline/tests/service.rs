use super::common::*;
use std::sync::Arc;

use crate::workflows::pipeline::domain::{
    ApplicationId, CandidateId, FlowId, InterviewFlow, InterviewStep, Position, PositionId, StepId,
};
use crate::workflows::pipeline::repository::{PipelineRepository, RepositoryError, StageUpdate};
use crate::workflows::pipeline::service::{ErrorKind, PipelineService, PipelineServiceError};
use crate::workflows::pipeline::transition::{
    TransitionDirection, TransitionError, TransitionRejection,
};

fn assert_rejected(
    result: Result<impl std::fmt::Debug, PipelineServiceError>,
) -> TransitionRejection {
    match result {
        Err(PipelineServiceError::Transition(TransitionError::Rejected(rejection))) => rejection,
        other => panic!("expected rule rejection, got {other:?}"),
    }
}

#[test]
fn advance_without_results_is_rejected() {
    let (service, store) = build_service();

    let rejection =
        assert_rejected(service.execute_transition(JOHN_APPLICATION, TECHNICAL, meta()));

    assert_eq!(
        rejection,
        TransitionRejection::CannotAdvanceWithoutResults { step: SCREENING }
    );
    let stored = store
        .application(JOHN_APPLICATION)
        .expect("fetch succeeds")
        .expect("application present");
    assert_eq!(stored.current_interview_step, SCREENING);
    assert_eq!(stored.version, 0);
}

#[test]
fn advance_with_results_moves_and_schedules_an_interview() {
    let (service, store) = build_service();
    record(&store, JOHN_APPLICATION, SCREENING, Some(3.0));

    let view = service
        .execute_transition(JOHN_APPLICATION, TECHNICAL, meta())
        .expect("advance accepted");

    assert_eq!(view.direction, TransitionDirection::Advance);
    assert!(view.interview_created);
    assert_eq!(view.candidate_name, "John Doe");
    assert_eq!(view.current_interview_step, "Technical");
    assert_eq!(view.current_interview_step_id, TECHNICAL);

    let stored = store
        .application(JOHN_APPLICATION)
        .expect("fetch succeeds")
        .expect("application present");
    assert_eq!(stored.current_interview_step, TECHNICAL);
    // One bump for the recorded screening result, one for the stage save.
    assert_eq!(stored.version, 2);

    let scheduled = store
        .interviews_for_application_at_step(JOHN_APPLICATION, TECHNICAL)
        .expect("fetch succeeds");
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].score, None);
    assert_eq!(scheduled[0].employee_id, INTERVIEWER);
    assert_eq!(scheduled[0].interview_date, meta().interview_date);
}

#[test]
fn retreat_with_results_is_rejected() {
    let (service, store) = build_service();
    record(&store, JANE_APPLICATION, TECHNICAL, Some(4.0));

    let rejection =
        assert_rejected(service.execute_transition(JANE_APPLICATION, SCREENING, meta()));

    assert_eq!(
        rejection,
        TransitionRejection::CannotRetreatWithResults {
            step: TECHNICAL,
            recorded: 1,
        }
    );
}

#[test]
fn retreat_without_results_creates_no_interview() {
    let (service, store) = build_service();

    let view = service
        .execute_transition(JANE_APPLICATION, SCREENING, meta())
        .expect("retreat accepted");

    assert_eq!(view.direction, TransitionDirection::Retreat);
    assert!(!view.interview_created);
    assert_eq!(view.current_interview_step, "Screening");
    assert!(store
        .interviews_for_application(JANE_APPLICATION)
        .expect("fetch succeeds")
        .is_empty());
}

#[test]
fn skipping_a_step_is_invalid_regardless_of_results() {
    let (service, store) = build_service();

    let rejection = assert_rejected(service.execute_transition(JOHN_APPLICATION, OFFER, meta()));
    assert_eq!(
        rejection,
        TransitionRejection::InvalidTransition { from: 0, to: 2 }
    );

    record(&store, JOHN_APPLICATION, SCREENING, Some(5.0));
    let rejection = assert_rejected(service.execute_transition(JOHN_APPLICATION, OFFER, meta()));
    assert!(matches!(
        rejection,
        TransitionRejection::InvalidTransition { .. }
    ));
}

#[test]
fn moving_to_the_current_step_is_invalid() {
    let (service, _) = build_service();

    let rejection =
        assert_rejected(service.execute_transition(JOHN_APPLICATION, SCREENING, meta()));
    assert_eq!(
        rejection,
        TransitionRejection::InvalidTransition { from: 0, to: 0 }
    );
}

#[test]
fn missing_application_and_step_are_not_found() {
    let (service, _) = build_service();

    let err = service
        .execute_transition(ApplicationId(999), TECHNICAL, meta())
        .expect_err("application missing");
    assert!(matches!(err, PipelineServiceError::ApplicationNotFound(ApplicationId(999))));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .execute_transition(JOHN_APPLICATION, StepId(999), meta())
        .expect_err("step missing");
    assert!(matches!(err, PipelineServiceError::StepNotFound(StepId(999))));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn lost_race_leaves_state_untouched() {
    let store = seeded_store();
    record(&store, JOHN_APPLICATION, SCREENING, Some(3.0));
    let service = PipelineService::new(Arc::new(RacingRepository::stale_version(store.clone())));

    let err = service
        .execute_transition(JOHN_APPLICATION, TECHNICAL, meta())
        .expect_err("stale version");

    assert!(matches!(
        err,
        PipelineServiceError::Repository(RepositoryError::Conflict)
    ));
    assert_eq!(err.kind(), ErrorKind::RuleViolation);
    let stored = store
        .application(JOHN_APPLICATION)
        .expect("fetch succeeds")
        .expect("application present");
    assert_eq!(stored.current_interview_step, SCREENING);
    assert!(store
        .interviews_for_application_at_step(JOHN_APPLICATION, TECHNICAL)
        .expect("fetch succeeds")
        .is_empty());
}

#[test]
fn second_advance_on_a_stale_read_cannot_double_advance() {
    let (service, store) = build_service();
    record(&store, JOHN_APPLICATION, SCREENING, Some(3.0));
    let stale = store
        .application(JOHN_APPLICATION)
        .expect("fetch succeeds")
        .expect("application present");

    service
        .execute_transition(JOHN_APPLICATION, TECHNICAL, meta())
        .expect("first advance wins");

    let err = store
        .save_application_stage(StageUpdate {
            application_id: JOHN_APPLICATION,
            expected_version: stale.version,
            new_step: TECHNICAL,
            interview: None,
        })
        .expect_err("stale writer rejected");
    assert_eq!(err, RepositoryError::Conflict);
}

#[test]
fn persistence_failures_are_reported_as_such() {
    let service = PipelineService::new(Arc::new(UnavailableRepository));

    let err = service
        .execute_transition(JOHN_APPLICATION, TECHNICAL, meta())
        .expect_err("repository offline");
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn target_outside_the_flow_is_a_rule_violation() {
    let (service, store) = build_service();
    store
        .insert_position(
            Position {
                id: PositionId(2),
                title: "Designer".to_string(),
                interview_flow_id: FlowId(2),
            },
            InterviewFlow {
                id: FlowId(2),
                name: "Design".to_string(),
                steps: vec![InterviewStep {
                    id: StepId(21),
                    interview_flow_id: FlowId(2),
                    name: "Portfolio".to_string(),
                    order_index: 0,
                }],
            },
        )
        .expect("second position inserted");

    let err = service
        .execute_transition(JOHN_APPLICATION, StepId(21), meta())
        .expect_err("foreign step");
    assert!(matches!(
        err,
        PipelineServiceError::Transition(TransitionError::TargetStepNotInFlow { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::RuleViolation);
}

#[test]
fn check_transition_reports_decisions_without_writing() {
    let (service, store) = build_service();

    let denied = service
        .check_transition(JOHN_APPLICATION, TECHNICAL)
        .expect("check runs");
    assert!(!denied.allowed);
    assert!(denied.direction.is_none());
    assert!(denied
        .reason
        .as_deref()
        .unwrap_or_default()
        .contains("no interview results"));

    let allowed = service
        .check_transition(JANE_APPLICATION, SCREENING)
        .expect("check runs");
    assert!(allowed.allowed);
    assert_eq!(allowed.direction, Some(TransitionDirection::Retreat));

    let stored = store
        .application(JANE_APPLICATION)
        .expect("fetch succeeds")
        .expect("application present");
    assert_eq!(stored.current_interview_step, TECHNICAL);
}

#[test]
fn check_transition_still_reports_missing_records() {
    let (service, _) = build_service();

    assert!(matches!(
        service.check_transition(ApplicationId(5), TECHNICAL),
        Err(PipelineServiceError::ApplicationNotFound(_))
    ));
}

#[test]
fn candidate_scoped_moves_require_ownership() {
    let (service, store) = build_service();
    record(&store, JOHN_APPLICATION, SCREENING, Some(3.0));

    let err = service
        .move_candidate_stage(JANE, JOHN_APPLICATION, TECHNICAL, meta())
        .expect_err("jane does not own john's application");
    assert!(matches!(err, PipelineServiceError::ApplicationNotFound(_)));

    let err = service
        .move_candidate_stage(CandidateId(77), JOHN_APPLICATION, TECHNICAL, meta())
        .expect_err("unknown candidate");
    assert!(matches!(err, PipelineServiceError::CandidateNotFound(CandidateId(77))));

    let view = service
        .move_candidate_stage(JOHN, JOHN_APPLICATION, TECHNICAL, meta())
        .expect("owner may advance");
    assert_eq!(view.current_interview_step, "Technical");
}

#[test]
fn result_recorded_mid_retreat_blocks_the_save() {
    let store = seeded_store();
    let service = PipelineService::new(Arc::new(RacingRepository::late_result(store.clone())));

    let err = service
        .execute_transition(JANE_APPLICATION, SCREENING, meta())
        .expect_err("result arrived after validation");

    assert!(matches!(
        err,
        PipelineServiceError::Repository(RepositoryError::Conflict)
    ));
    assert_eq!(err.kind(), ErrorKind::RuleViolation);
    let stored = store
        .application(JANE_APPLICATION)
        .expect("fetch succeeds")
        .expect("application present");
    assert_eq!(stored.current_interview_step, TECHNICAL);

    let direct = PipelineService::new(store);
    let rejection =
        assert_rejected(direct.execute_transition(JANE_APPLICATION, SCREENING, meta()));
    assert_eq!(
        rejection,
        TransitionRejection::CannotRetreatWithResults {
            step: TECHNICAL,
            recorded: 1,
        }
    );
}

#[test]
fn flow_with_shared_order_index_cannot_be_traversed() {
    let flow_id = FlowId(3);
    let step = |id, name: &str, order_index| InterviewStep {
        id: StepId(id),
        interview_flow_id: flow_id,
        name: name.to_string(),
        order_index,
    };
    let store = seeded_store();
    store
        .insert_position(
            Position {
                id: PositionId(3),
                title: "Data Engineer".to_string(),
                interview_flow_id: flow_id,
            },
            InterviewFlow {
                id: flow_id,
                name: "Ambiguous".to_string(),
                steps: vec![
                    step(31, "Screening", 0),
                    step(32, "Technical", 1),
                    step(33, "Culture", 1),
                    step(34, "Offer", 2),
                ],
            },
        )
        .expect("position inserted");
    let mut john = application(ApplicationId(300), JOHN, StepId(31));
    john.position_id = PositionId(3);
    store.insert_application(john).expect("john applies");
    record(&store, ApplicationId(300), StepId(31), Some(4.0));
    let service = PipelineService::new(store.clone());

    for target in [StepId(32), StepId(34)] {
        let err = service
            .execute_transition(ApplicationId(300), target, meta())
            .expect_err("flow cannot be ranked");
        assert!(matches!(
            err,
            PipelineServiceError::Transition(TransitionError::StepNotInFlow { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Integrity);
    }

    let stored = store
        .application(ApplicationId(300))
        .expect("fetch succeeds")
        .expect("application present");
    assert_eq!(stored.current_interview_step, StepId(31));
    assert!(store
        .interviews_for_application_at_step(ApplicationId(300), StepId(34))
        .expect("fetch succeeds")
        .is_empty());
}
