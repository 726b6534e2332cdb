use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::report::{build_report, JobReport};
use crate::jobs::CreateJobRequest;
use crate::models::job::JobRow;
use crate::state::AppState;

/// POST /api/jobs/
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let job = state.repo.create_job(req.validate()?).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs/
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(state.repo.list_jobs().await?))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    Ok(Json(find_job(&state, id).await?))
}

/// GET /api/jobs/:id/test
pub async fn handle_job_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobReport>, AppError> {
    let job = find_job(&state, id).await?;
    let applications = state.repo.applications_for_job(id).await?;
    Ok(Json(build_report(job, &applications)))
}

async fn find_job(state: &AppState, id: Uuid) -> Result<JobRow, AppError> {
    state
        .repo
        .find_job(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}
