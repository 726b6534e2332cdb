use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::screening::ingest::IngestError;
use crate::screening::pipeline::{submit_application, Submission, SubmissionResponse};
use crate::state::AppState;

/// POST /api/applications/
///
/// Multipart fields: `candidate_name`, `candidate_email`, `job_id`, `resume`.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let mut candidate_name = None;
    let mut candidate_email = None;
    let mut job_id = None;
    let mut resume = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "candidate_name" => candidate_name = Some(field.text().await?),
            "candidate_email" => candidate_email = Some(field.text().await?),
            "job_id" => job_id = Some(field.text().await?),
            "resume" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = read_capped(field, state.upload_policy.max_bytes).await?;
                resume = Some((filename, bytes));
            }
            // Unknown parts are drained and ignored.
            _ => {
                field.bytes().await?;
            }
        }
    }

    let job_id = required(job_id, "job_id")?;
    let job_id = Uuid::parse_str(job_id.trim())
        .map_err(|_| AppError::Validation(format!("'{job_id}' is not a valid job id")))?;
    let (resume_filename, resume) = required(resume, "resume")?;

    let submission = Submission {
        job_id,
        candidate_name: required(candidate_name, "candidate_name")?,
        candidate_email: required(candidate_email, "candidate_email")?,
        resume_filename,
        resume,
    };

    let response = submit_application(&state, submission).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/applications/
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    Ok(Json(state.repo.list_applications().await?))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = state
        .repo
        .find_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    Ok(Json(application))
}

/// Buffers a file part, bailing out as soon as it grows past `limit`.
async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Bytes, AppError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(IngestError::Oversized { limit }.into());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Missing multipart field '{field}'")))
}
