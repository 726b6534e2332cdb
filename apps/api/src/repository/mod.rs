//! Persistence for jobs and applications.
//!
//! Handlers and the screening pipeline only see the `Repository` trait; `main`
//! wires in `PgRepository`, tests use `MemoryRepository`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::{JobRow, NewJob};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn create_job(&self, job: NewJob) -> Result<JobRow, sqlx::Error>;

    async fn list_jobs(&self) -> Result<Vec<JobRow>, sqlx::Error>;

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRow>, sqlx::Error>;

    /// Inserts the application with status `pending`.
    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRow, sqlx::Error>;

    /// Moves an application to its resolved status. Returns `RowNotFound` for unknown ids.
    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, sqlx::Error>;

    async fn list_applications(&self) -> Result<Vec<ApplicationRow>, sqlx::Error>;

    async fn find_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, sqlx::Error>;

    async fn applications_for_job(&self, job_id: Uuid)
        -> Result<Vec<ApplicationRow>, sqlx::Error>;
}
