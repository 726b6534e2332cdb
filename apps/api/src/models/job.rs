use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Points a single evaluation question is worth. A job's threshold is this
/// multiplied by its question count.
pub const POINTS_PER_QUESTION: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementCategory {
    Education,
    Experience,
    Skills,
}

impl RequirementCategory {
    /// Fixed ordering used for prompts and reports.
    pub const ALL: [RequirementCategory; 3] = [
        RequirementCategory::Education,
        RequirementCategory::Experience,
        RequirementCategory::Skills,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RequirementCategory::Education => "Education",
            RequirementCategory::Experience => "Experience",
            RequirementCategory::Skills => "Skills",
        }
    }
}

/// Job requirements grouped by qualification category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Requirements {
    pub fn category(&self, category: RequirementCategory) -> &[String] {
        match category {
            RequirementCategory::Education => &self.education,
            RequirementCategory::Experience => &self.experience,
            RequirementCategory::Skills => &self.skills,
        }
    }

    fn category_mut(&mut self, category: RequirementCategory) -> &mut Vec<String> {
        match category {
            RequirementCategory::Education => &mut self.education,
            RequirementCategory::Experience => &mut self.experience,
            RequirementCategory::Skills => &mut self.skills,
        }
    }

    /// Adds a requirement, ignoring blanks and exact duplicates within the category.
    pub fn push(&mut self, category: RequirementCategory, detail: &str) {
        let detail = detail.trim();
        if detail.is_empty() {
            return;
        }
        let bucket = self.category_mut(category);
        if !bucket.iter().any(|existing| existing == detail) {
            bucket.push(detail.to_string());
        }
    }

    /// Every requirement in category order.
    pub fn iter(&self) -> impl Iterator<Item = (RequirementCategory, &str)> + '_ {
        RequirementCategory::ALL.into_iter().flat_map(move |category| {
            self.category(category)
                .iter()
                .map(move |detail| (category, detail.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.education.len() + self.experience.len() + self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A requirement as posted in flat form: `{"type": "skills", "details": "Rust"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementItem {
    #[serde(rename = "type")]
    pub category: RequirementCategory,
    pub details: String,
}

/// Requirements accepted on job creation, either already grouped or as a flat list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RequirementsInput {
    Grouped(Requirements),
    Flat(Vec<RequirementItem>),
}

impl From<RequirementsInput> for Requirements {
    fn from(input: RequirementsInput) -> Self {
        let mut requirements = Requirements::default();
        match input {
            RequirementsInput::Grouped(grouped) => {
                for (category, detail) in grouped.iter() {
                    requirements.push(category, detail);
                }
            }
            RequirementsInput::Flat(items) => {
                for item in items {
                    requirements.push(item.category, &item.details);
                }
            }
        }
        requirements
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Json<Requirements>,
    pub evaluation_questions: Vec<String>,
    pub threshold_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated job ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub requirements: Requirements,
    pub evaluation_questions: Vec<String>,
}

impl NewJob {
    pub fn threshold_score(&self) -> f64 {
        threshold_for(&self.evaluation_questions)
    }
}

pub fn threshold_for(questions: &[String]) -> f64 {
    questions.len() as f64 * POINTS_PER_QUESTION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_questions_yield_thirty_points() {
        let job = NewJob {
            title: "Backend Engineer".to_string(),
            description: "APIs".to_string(),
            requirements: Requirements::default(),
            evaluation_questions: vec!["Q1".into(), "Q2".into(), "Q3".into()],
        };
        assert_eq!(job.threshold_score(), 30.0);
    }

    #[test]
    fn test_no_questions_yield_zero_threshold() {
        assert_eq!(threshold_for(&[]), 0.0);
    }

    #[test]
    fn test_grouped_requirements_deserialize() {
        let json = r#"{"education": ["BS CS"], "experience": [], "skills": ["Python"]}"#;
        let input: RequirementsInput = serde_json::from_str(json).unwrap();
        let requirements = Requirements::from(input);
        assert_eq!(requirements.education, vec!["BS CS"]);
        assert!(requirements.experience.is_empty());
        assert_eq!(requirements.skills, vec!["Python"]);
    }

    #[test]
    fn test_flat_requirements_are_grouped() {
        let json = r#"[
            {"type": "skills", "details": " Rust "},
            {"type": "education", "details": "BS CS"},
            {"type": "skills", "details": "Rust"},
            {"type": "experience", "details": "   "}
        ]"#;
        let input: RequirementsInput = serde_json::from_str(json).unwrap();
        let requirements = Requirements::from(input);
        assert_eq!(requirements.skills, vec!["Rust"]);
        assert_eq!(requirements.education, vec!["BS CS"]);
        assert!(requirements.experience.is_empty());
        assert_eq!(requirements.len(), 2);
    }

    #[test]
    fn test_iter_follows_category_order() {
        let mut requirements = Requirements::default();
        requirements.push(RequirementCategory::Skills, "Python");
        requirements.push(RequirementCategory::Education, "BS CS");
        requirements.push(RequirementCategory::Experience, "3 years backend");

        let order: Vec<_> = requirements.iter().map(|(_, detail)| detail).collect();
        assert_eq!(order, vec!["BS CS", "3 years backend", "Python"]);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let json = r#"[{"type": "hobbies", "details": "chess"}]"#;
        assert!(serde_json::from_str::<RequirementsInput>(json).is_err());
    }
}
