use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::Repository;
use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::{JobRow, NewJob};

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_job(&self, job: NewJob) -> Result<JobRow, sqlx::Error> {
        let threshold_score = job.threshold_score();
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, title, description, requirements, evaluation_questions, threshold_score)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.description)
        .bind(Json(&job.requirements))
        .bind(&job.evaluation_questions)
        .bind(threshold_score)
        .fetch_one(&self.pool)
        .await?;

        info!("Created job {} (threshold {})", row.id, row.threshold_score);
        Ok(row)
    }

    async fn list_jobs(&self) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRow, sqlx::Error> {
        sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications
                (id, job_id, candidate_name, candidate_email, resume_path,
                 evaluation_scores, requirements_met, total_score, status, summary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(application.job_id)
        .bind(&application.candidate_name)
        .bind(&application.candidate_email)
        .bind(&application.resume_path)
        .bind(Json(&application.evaluation_scores))
        .bind(Json(&application.requirements_met))
        .bind(application.total_score)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(&application.summary)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, sqlx::Error> {
        sqlx::query_as::<_, ApplicationRow>(
            "UPDATE applications SET status = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn applications_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, sqlx::Error> {
        sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY total_score DESC, created_at ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }
}
