use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use uuid::Uuid;

use super::Repository;
use crate::models::application::{ApplicationRow, ApplicationStatus, NewApplication};
use crate::models::job::{JobRow, NewJob};

/// In-process repository for tests. Rows keep insertion order.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    jobs: Arc<Mutex<Vec<JobRow>>>,
    applications: Arc<Mutex<Vec<ApplicationRow>>>,
}

impl MemoryRepository {
    pub fn application_count(&self) -> usize {
        self.applications.lock().unwrap().len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_job(&self, job: NewJob) -> Result<JobRow, sqlx::Error> {
        let now = Utc::now();
        let row = JobRow {
            id: Uuid::new_v4(),
            threshold_score: job.threshold_score(),
            title: job.title,
            description: job.description,
            requirements: Json(job.requirements),
            evaluation_questions: job.evaluation_questions,
            created_at: now,
            updated_at: now,
        };
        self.jobs.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_jobs(&self) -> Result<Vec<JobRow>, sqlx::Error> {
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRow, sqlx::Error> {
        let now = Utc::now();
        let row = ApplicationRow {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            candidate_name: application.candidate_name,
            candidate_email: application.candidate_email,
            resume_path: application.resume_path,
            evaluation_scores: Json(application.evaluation_scores),
            requirements_met: Json(application.requirements_met),
            total_score: application.total_score,
            status: ApplicationStatus::Pending.as_str().to_string(),
            summary: application.summary,
            created_at: now,
            updated_at: now,
        };
        self.applications.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, sqlx::Error> {
        let mut applications = self.applications.lock().unwrap();
        let row = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;
        row.status = status.as_str().to_string();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list_applications(&self) -> Result<Vec<ApplicationRow>, sqlx::Error> {
        Ok(self.applications.lock().unwrap().clone())
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, sqlx::Error> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn applications_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, sqlx::Error> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }
}
