//! Per-job screening report served by `GET /api/jobs/:id/test`.

use serde::Serialize;
use uuid::Uuid;

use crate::models::application::ApplicationRow;
use crate::models::job::{JobRow, Requirements};
use crate::screening::decision::Decision;

#[derive(Debug, Serialize)]
pub struct JobReport {
    pub job: JobSummary,
    pub applications: Vec<ApplicationSummary>,
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub requirements: Requirements,
    pub threshold_score: f64,
    pub total_applications: usize,
}

#[derive(Debug, Serialize)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub applicant_name: String,
    pub score: f64,
    pub status: String,
    pub feedback: String,
    /// Whether the screening criteria were met, regardless of the draft outcome.
    pub passed: bool,
}

pub fn build_report(job: JobRow, applications: &[ApplicationRow]) -> JobReport {
    let applications: Vec<ApplicationSummary> = applications
        .iter()
        .map(|application| summarize(application, job.threshold_score))
        .collect();

    JobReport {
        job: JobSummary {
            id: job.id,
            title: job.title,
            requirements: job.requirements.0,
            threshold_score: job.threshold_score,
            total_applications: applications.len(),
        },
        applications,
    }
}

fn summarize(application: &ApplicationRow, threshold_score: f64) -> ApplicationSummary {
    let decision = Decision::new(
        &application.evaluation_scores.0,
        &application.requirements_met.0,
        threshold_score,
    );

    ApplicationSummary {
        id: application.id,
        applicant_name: application.candidate_name.clone(),
        score: application.total_score,
        status: application.status.clone(),
        feedback: feedback(application, &decision),
        passed: decision.is_eligible(),
    }
}

/// The model's summary when there is one, otherwise a line built from the scores.
fn feedback(application: &ApplicationRow, decision: &Decision) -> String {
    if let Some(summary) = application.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        return summary.trim().to_string();
    }

    let met = application.requirements_met.0.values().filter(|m| **m).count();
    let total = application.requirements_met.0.len();
    format!(
        "{met}/{total} requirements met; score {:.1} against threshold {:.1}",
        decision.total_score, decision.threshold_score
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sqlx::types::Json;

    use super::*;
    use crate::models::job::RequirementCategory;

    fn job(threshold_score: f64) -> JobRow {
        let mut requirements = Requirements::default();
        requirements.push(RequirementCategory::Skills, "Rust");
        JobRow {
            id: Uuid::new_v4(),
            title: "Systems Engineer".to_string(),
            description: String::new(),
            requirements: Json(requirements),
            evaluation_questions: vec!["Q1".to_string()],
            threshold_score,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn application(job_id: Uuid, score: f64, met: bool, summary: Option<&str>) -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            job_id,
            candidate_name: "Jane Doe".to_string(),
            candidate_email: "jane@example.com".to_string(),
            resume_path: "uploads/x.pdf".to_string(),
            evaluation_scores: Json(BTreeMap::from([("Q1".to_string(), score)])),
            requirements_met: Json(BTreeMap::from([("Rust".to_string(), met)])),
            total_score: score,
            status: "pending".to_string(),
            summary: summary.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_report_counts_and_pass_flags() {
        let job = job(10.0);
        let apps = vec![
            application(job.id, 10.0, true, Some("Strong systems background")),
            application(job.id, 10.0, false, None),
            application(job.id, 6.0, true, None),
        ];

        let report = build_report(job, &apps);

        assert_eq!(report.job.total_applications, 3);
        let passed: Vec<bool> = report.applications.iter().map(|a| a.passed).collect();
        assert_eq!(passed, vec![true, false, false]);
        assert_eq!(report.applications[0].feedback, "Strong systems background");
        assert_eq!(
            report.applications[2].feedback,
            "1/1 requirements met; score 6.0 against threshold 10.0"
        );
    }

    #[test]
    fn test_report_serializes_expected_shape() {
        let job = job(10.0);
        let apps = vec![application(job.id, 9.0, true, None)];
        let json = serde_json::to_value(build_report(job, &apps)).unwrap();

        assert_eq!(json["job"]["threshold_score"], 10.0);
        assert_eq!(json["job"]["requirements"]["skills"][0], "Rust");
        assert_eq!(json["applications"][0]["applicant_name"], "Jane Doe");
        assert_eq!(json["applications"][0]["passed"], false);
    }
}
