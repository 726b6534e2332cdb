//! Job postings: creation, lookup and the per-job screening report.

pub mod handlers;
pub mod report;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::job::{NewJob, Requirements, RequirementsInput};

pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Option<RequirementsInput>,
    #[serde(default, alias = "evaluation_questions")]
    pub questions: Vec<String>,
}

impl CreateJobRequest {
    /// Trims every field and drops blank questions and requirements.
    pub fn validate(self) -> Result<NewJob, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }

        let evaluation_questions: Vec<String> = self
            .questions
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect();

        Ok(NewJob {
            title,
            description: self.description.trim().to_string(),
            requirements: self.requirements.map(Requirements::from).unwrap_or_default(),
            evaluation_questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CreateJobRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_request_becomes_new_job() {
        let job = parse(
            r#"{
                "title": " Data Engineer ",
                "description": "Pipelines",
                "requirements": {"education": ["BS CS"], "skills": ["Python"]},
                "questions": ["Q1", "  ", "Q2", "Q3"]
            }"#,
        )
        .validate()
        .unwrap();

        assert_eq!(job.title, "Data Engineer");
        assert_eq!(job.evaluation_questions, vec!["Q1", "Q2", "Q3"]);
        assert_eq!(job.threshold_score(), 30.0);
        assert_eq!(job.requirements.skills, vec!["Python"]);
    }

    #[test]
    fn test_evaluation_questions_alias_and_flat_requirements() {
        let job = parse(
            r#"{
                "title": "Analyst",
                "requirements": [{"type": "experience", "details": "2 years SQL"}],
                "evaluation_questions": ["Q1"]
            }"#,
        )
        .validate()
        .unwrap();

        assert_eq!(job.requirements.experience, vec!["2 years SQL"]);
        assert_eq!(job.threshold_score(), 10.0);
    }

    #[test]
    fn test_blank_title_rejected() {
        let err = parse(r#"{"title": "   "}"#).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_overlong_title_rejected() {
        let request = CreateJobRequest {
            title: "x".repeat(MAX_TITLE_CHARS + 1),
            description: String::new(),
            requirements: None,
            questions: Vec::new(),
        };
        assert!(request.validate().is_err());
    }
}
