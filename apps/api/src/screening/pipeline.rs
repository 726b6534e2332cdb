//! The submission pipeline: validate → store → extract → evaluate → decide →
//! persist → notify. One pass per request, no retries.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{cap_field, ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::JobRow;
use crate::notify::{dispatch_approval, NotificationOutcome};
use crate::screening::decision::{resolve_status, Decision};
use crate::screening::evaluation::{EvaluationRequest, EvaluationResult};
use crate::screening::extract::extract_text;
use crate::screening::ingest::{discard_resume, store_resume, validate_upload};
use crate::state::AppState;

/// A candidate's application as received from the client.
#[derive(Debug, Clone)]
pub struct Submission {
    pub job_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub resume_filename: String,
    pub resume: Bytes,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub application: ApplicationRow,
    pub decision: Decision,
    /// Absent when the candidate was not eligible and no draft was attempted.
    pub notification: Option<NotificationOutcome>,
}

/// Runs one submission through the whole pipeline.
///
/// Nothing is written before the candidate fields, upload and job id check out.
/// A failure between storing the resume and inserting the row removes the file.
pub async fn submit_application(
    state: &AppState,
    submission: Submission,
) -> Result<SubmissionResponse, AppError> {
    let candidate_name = cap_field(&submission.candidate_name);
    let candidate_email = cap_field(&submission.candidate_email);
    validate_candidate(&candidate_name, &candidate_email)?;

    validate_upload(
        &state.upload_policy,
        &submission.resume_filename,
        &submission.resume,
    )?;

    let job = state
        .repo
        .find_job(submission.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", submission.job_id)))?;

    let resume_path = store_resume(
        &state.upload_policy,
        &submission.resume_filename,
        &submission.resume,
    )
    .await?;

    let stored = evaluate_and_insert(
        state,
        &job,
        &resume_path,
        candidate_name,
        candidate_email,
    )
    .await;
    let (application, evaluation) = match stored {
        Ok(stored) => stored,
        Err(e) => {
            warn!(job_id = %job.id, "Submission aborted after storing resume: {e}");
            discard_resume(&resume_path).await;
            return Err(e);
        }
    };

    let decision = Decision::from_evaluation(&evaluation, job.threshold_score);

    let notification = if decision.is_eligible() {
        Some(
            dispatch_approval(
                state.mailer.as_ref(),
                &application.candidate_name,
                &application.candidate_email,
                &job.title,
            )
            .await,
        )
    } else {
        None
    };

    let status = resolve_status(&decision, notification.as_ref());
    let application = if status == ApplicationStatus::Pending {
        application
    } else {
        state.repo.set_application_status(application.id, status).await?
    };

    info!(
        application_id = %application.id,
        job_id = %job.id,
        status = %status,
        total_score = decision.total_score,
        threshold_score = decision.threshold_score,
        "Application screened"
    );

    Ok(SubmissionResponse {
        application,
        decision,
        notification,
    })
}

async fn evaluate_and_insert(
    state: &AppState,
    job: &JobRow,
    resume_path: &Path,
    candidate_name: String,
    candidate_email: String,
) -> Result<(ApplicationRow, EvaluationResult), AppError> {
    let resume_text = extract_text(resume_path).await?;

    let request = EvaluationRequest {
        resume_text,
        role: job.title.clone(),
        description: job.description.clone(),
        requirements: job.requirements.0.clone(),
        questions: job.evaluation_questions.clone(),
    };
    let evaluation = state.evaluator.evaluate(&request).await?;

    let decision = Decision::from_evaluation(&evaluation, job.threshold_score);
    let application = state
        .repo
        .insert_application(NewApplication {
            job_id: job.id,
            candidate_name,
            candidate_email,
            resume_path: resume_path.to_string_lossy().into_owned(),
            evaluation_scores: evaluation.question_scores.clone(),
            requirements_met: evaluation.requirements_met.clone(),
            total_score: decision.total_score,
            summary: evaluation.summary.clone(),
        })
        .await?;

    Ok((application, evaluation))
}

fn validate_candidate(name: &str, email: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(AppError::Validation("candidate_name is required".to_string()));
    }
    if email.is_empty() {
        return Err(AppError::Validation("candidate_email is required".to_string()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}
