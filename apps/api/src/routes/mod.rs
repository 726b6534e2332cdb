pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::screening::handlers as applications;
use crate::state::AppState;

/// Headroom for the text fields and multipart framing around the resume.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.upload_policy.max_bytes + MULTIPART_OVERHEAD_BYTES;

    let submit = post(applications::handle_submit_application)
        .get(applications::handle_list_applications)
        .layer(DefaultBodyLimit::max(body_limit));
    let job_collection = post(jobs::handle_create_job).get(jobs::handle_list_jobs);

    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route("/api/jobs", job_collection.clone())
        .route("/api/jobs/", job_collection)
        .route("/api/jobs/:id", get(jobs::handle_get_job))
        .route("/api/jobs/:id/test", get(jobs::handle_job_report))
        // Applications
        .route("/api/applications", submit.clone())
        .route("/api/applications/", submit)
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application),
        )
        .with_state(state)
}
