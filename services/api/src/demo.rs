use crate::infra::{
    parse_date, parse_position_id, seed_demo_store, CARLOS_APPLICATION, DEMO_INTERVIEWER,
    DEMO_POSITION, JANE_APPLICATION, JOHN_APPLICATION, OFFER, SCREENING, TECHNICAL,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use hiring_pipeline::error::AppError;
use hiring_pipeline::workflows::pipeline::{
    ApplicationId, CandidateSummary, InMemoryPipelineStore, InterviewMeta, NewInterview,
    PipelineService, PipelineServiceError, PositionId, StepId,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date stamped on interviews created by the demo (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) interview_date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Position whose candidates should be listed
    #[arg(long, value_parser = parse_position_id)]
    pub(crate) position_id: PositionId,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let store = seed_demo_store().map_err(PipelineServiceError::from)?;
    let service = PipelineService::new(Arc::new(store));
    let summaries = service.candidates_for_position(args.position_id)?;

    if args.json {
        match serde_json::to_string_pretty(&summaries) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Report payload unavailable: {err}"),
        }
    } else {
        println!("Candidates for position {}", args.position_id);
        render_report(&summaries);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let interview_date = args
        .interview_date
        .unwrap_or_else(|| Local::now().date_naive());
    let meta = InterviewMeta {
        employee_id: DEMO_INTERVIEWER,
        interview_date,
    };

    let store = Arc::new(seed_demo_store().map_err(PipelineServiceError::from)?);
    let service = PipelineService::new(store.clone());

    println!("Hiring pipeline demo");
    println!("Flow: Screening -> Technical -> Offer");
    println!("\nStarting report");
    render_report(&service.candidates_for_position(DEMO_POSITION)?);

    println!("\nTransitions");
    attempt(
        &service,
        "John advances without a screening result",
        JOHN_APPLICATION,
        TECHNICAL,
        meta,
    );
    attempt(
        &service,
        "John jumps from Screening straight to Offer",
        JOHN_APPLICATION,
        OFFER,
        meta,
    );

    store
        .record_interview(
            NewInterview::scheduled(JOHN_APPLICATION, SCREENING, meta),
            Some(3.0),
        )
        .map_err(PipelineServiceError::from)?;
    println!("  (recorded a screening score of 3 for John)");
    attempt(
        &service,
        "John advances after screening",
        JOHN_APPLICATION,
        TECHNICAL,
        meta,
    );

    attempt(
        &service,
        "Jane retreats with a technical result on file",
        JANE_APPLICATION,
        SCREENING,
        meta,
    );
    attempt(
        &service,
        "Carlos retreats with nothing recorded at Technical",
        CARLOS_APPLICATION,
        SCREENING,
        meta,
    );

    println!("\nFinal report");
    render_report(&service.candidates_for_position(DEMO_POSITION)?);

    Ok(())
}

fn attempt(
    service: &PipelineService<InMemoryPipelineStore>,
    label: &str,
    application_id: ApplicationId,
    target: StepId,
    meta: InterviewMeta,
) {
    println!("- {label}");
    match service.execute_transition(application_id, target, meta) {
        Ok(view) => {
            let scheduled = if view.interview_created {
                "; interview scheduled"
            } else {
                ""
            };
            println!(
                "    accepted ({}): {} is now at {}{}",
                view.direction.label(),
                view.candidate_name,
                view.current_interview_step,
                scheduled
            );
        }
        Err(err) => println!("    rejected [{}]: {}", err.kind().label(), err),
    }
}

fn render_report(summaries: &[CandidateSummary]) {
    if summaries.is_empty() {
        println!("  No applications yet");
        return;
    }
    for summary in summaries {
        println!(
            "  - {:<20} {:<12} {}",
            summary.full_name,
            summary.current_interview_step,
            format_average(summary.average_score)
        );
    }
}

pub(crate) fn format_average(average: Option<f64>) -> String {
    match average {
        Some(score) => format!("{score:.2}"),
        None => "no score yet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_averages_are_not_rendered_as_zero() {
        assert_eq!(format_average(None), "no score yet");
        assert_eq!(format_average(Some(4.5)), "4.50");
        assert_eq!(format_average(Some(0.0)), "0.00");
    }

    #[test]
    fn demo_runs_against_the_seeded_pipeline() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date");
        run_demo(DemoArgs {
            interview_date: Some(date),
        })
        .expect("demo completes");
    }

    #[test]
    fn report_for_unknown_position_fails() {
        let err = run_report(ReportArgs {
            position_id: PositionId(99),
            json: false,
        })
        .expect_err("position missing");
        assert!(matches!(
            err,
            AppError::Pipeline(PipelineServiceError::PositionNotFound(_))
        ));
    }
}
