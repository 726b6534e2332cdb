//! Evaluation engine. Scores a resume against a job's requirements and questions.
//!
//! `AppState` holds an `Arc<dyn Evaluator>`; production uses `LlmEvaluator`,
//! tests substitute deterministic fakes.
//!
//! Canonical reply contract (older `layer1` replies are read through an alias):
//! `{ candidate_name?, summary?, requirements_met: {req: bool},
//!    question_scores: {question: number | {score, ..}}, justification? }`

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::job::Requirements;
use crate::screening::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM_TEMPLATE};

pub const MIN_QUESTION_SCORE: f64 = 0.0;
pub const MAX_QUESTION_SCORE: f64 = 10.0;

/// Everything the engine needs to judge one resume.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub resume_text: String,
    pub role: String,
    pub description: String,
    pub requirements: Requirements,
    pub questions: Vec<String>,
}

/// Normalised evaluation, keyed by the job's own requirement and question text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub candidate_name: Option<String>,
    pub summary: Option<String>,
    pub requirements_met: BTreeMap<String, bool>,
    pub question_scores: BTreeMap<String, f64>,
    pub justification: Option<String>,
}

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Scoring model call failed: {0}")]
    Upstream(#[source] LlmError),

    #[error("Scoring model returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl From<LlmError> for EvaluationError {
    fn from(e: LlmError) -> Self {
        if e.is_parse() {
            EvaluationError::MalformedResponse(e.to_string())
        } else {
            EvaluationError::Upstream(e)
        }
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError>;
}

/// Evaluator backed by a single low-temperature Claude call per resume.
pub struct LlmEvaluator {
    llm: LlmClient,
    company_name: String,
}

impl LlmEvaluator {
    pub fn new(llm: LlmClient, company_name: String) -> Self {
        Self { llm, company_name }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResult, EvaluationError> {
        let system = build_system_prompt(&self.company_name, request);
        let prompt = build_evaluation_prompt(request);

        let raw: RawEvaluation = self.llm.call_json(&prompt, &system).await?;
        let result = normalize(raw, request)?;

        info!(
            "Evaluated resume for '{}': {}/{} requirements met, {} questions scored",
            request.role,
            result.requirements_met.values().filter(|met| **met).count(),
            result.requirements_met.len(),
            result.question_scores.len()
        );
        Ok(result)
    }
}

pub fn build_system_prompt(company_name: &str, request: &EvaluationRequest) -> String {
    let system = EVALUATION_SYSTEM_TEMPLATE
        .replace("{company_name}", company_name.trim())
        .replace("{role}", request.role.trim())
        .replace("{description}", request.description.trim());
    format!("{system} {JSON_ONLY_SYSTEM}")
}

/// Builds the user prompt. Output depends only on the request, so identical
/// jobs and resumes always produce identical prompts.
pub fn build_evaluation_prompt(request: &EvaluationRequest) -> String {
    let requirements = if request.requirements.is_empty() {
        "- (none)".to_string()
    } else {
        request
            .requirements
            .iter()
            .map(|(category, detail)| format!("- [{}] {detail}", category.label()))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let questions = if request.questions.is_empty() {
        "- (none)".to_string()
    } else {
        request
            .questions
            .iter()
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    // Resume text goes in last so its contents are never re-scanned for placeholders.
    EVALUATION_PROMPT_TEMPLATE
        .replace("{requirements}", &requirements)
        .replace("{questions}", &questions)
        .replace("{resume_text}", request.resume_text.trim())
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default, alias = "name")]
    candidate_name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(alias = "layer1")]
    requirements_met: BTreeMap<String, bool>,
    question_scores: BTreeMap<String, RawScore>,
    #[serde(default)]
    justification: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Detailed { score: f64 },
}

impl RawScore {
    fn value(&self) -> f64 {
        match self {
            RawScore::Number(score) | RawScore::Detailed { score } => *score,
        }
    }
}

/// Parses a raw model reply. Exposed for callers holding reply text directly.
pub fn parse_evaluation(
    text: &str,
    request: &EvaluationRequest,
) -> Result<EvaluationResult, EvaluationError> {
    let raw: RawEvaluation = serde_json::from_str(strip_json_fences(text))
        .map_err(|e| EvaluationError::MalformedResponse(e.to_string()))?;
    normalize(raw, request)
}

/// Maps reply keys onto the job's requirement and question text.
///
/// Keys match case-insensitively after trimming. Requirements the model skipped
/// count as unmet; keys naming nothing in the job are dropped.
fn normalize(
    raw: RawEvaluation,
    request: &EvaluationRequest,
) -> Result<EvaluationResult, EvaluationError> {
    let mut requirements_met = BTreeMap::new();
    for (_, requirement) in request.requirements.iter() {
        let met = lookup(&raw.requirements_met, requirement).copied();
        if met.is_none() {
            debug!("Model omitted requirement '{requirement}'; recording as unmet");
        }
        requirements_met.insert(requirement.to_string(), met.unwrap_or(false));
    }

    let mut question_scores = BTreeMap::new();
    for question in &request.questions {
        let Some(raw_score) = lookup(&raw.question_scores, question) else {
            debug!("Model omitted question '{question}'");
            continue;
        };
        let score = raw_score.value();
        if !score.is_finite() || !(MIN_QUESTION_SCORE..=MAX_QUESTION_SCORE).contains(&score) {
            return Err(EvaluationError::MalformedResponse(format!(
                "score {score} for '{question}' is outside {MIN_QUESTION_SCORE}-{MAX_QUESTION_SCORE}"
            )));
        }
        question_scores.insert(question.clone(), score);
    }

    if !request.questions.is_empty() && question_scores.is_empty() {
        return Err(EvaluationError::MalformedResponse(
            "reply scored none of the job's evaluation questions".to_string(),
        ));
    }

    Ok(EvaluationResult {
        candidate_name: non_blank(raw.candidate_name),
        summary: non_blank(raw.summary),
        requirements_met,
        question_scores,
        justification: non_blank(raw.justification),
    })
}

fn lookup<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
    map.get(key).or_else(|| {
        let key = key.trim();
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::RequirementCategory;

    fn request() -> EvaluationRequest {
        let mut requirements = Requirements::default();
        requirements.push(RequirementCategory::Education, "BS CS");
        requirements.push(RequirementCategory::Skills, "Python");
        EvaluationRequest {
            resume_text: "Jane Doe\nBS CS, 5 years Python".to_string(),
            role: "Backend Engineer".to_string(),
            description: "Build APIs".to_string(),
            requirements,
            questions: vec!["Q1".to_string(), "Q2".to_string()],
        }
    }

    #[test]
    fn test_canonical_reply_parses() {
        let reply = r#"{
            "candidate_name": "Jane Doe",
            "summary": "Strong Python background.",
            "requirements_met": {"BS CS": true, "Python": true},
            "question_scores": {
                "Q1": {"score": 8, "justification": "solid"},
                "Q2": 9
            },
            "justification": "Meets everything."
        }"#;
        let result = parse_evaluation(reply, &request()).unwrap();
        assert_eq!(result.candidate_name.as_deref(), Some("Jane Doe"));
        assert_eq!(result.question_scores["Q1"], 8.0);
        assert_eq!(result.question_scores["Q2"], 9.0);
        assert!(result.requirements_met.values().all(|met| *met));
    }

    #[test]
    fn test_fenced_reply_parses() {
        let reply = "```json\n{\"requirements_met\": {\"BS CS\": true, \"Python\": false}, \"question_scores\": {\"Q1\": 3}}\n```";
        let result = parse_evaluation(reply, &request()).unwrap();
        assert_eq!(result.requirements_met["Python"], false);
        assert_eq!(result.question_scores.len(), 1);
    }

    #[test]
    fn test_layer1_alias_accepted() {
        let reply = r#"{
            "name": "Jane",
            "layer1": {"BS CS": true, "Python": true},
            "question_scores": {"Q1": 5, "Q2": 6},
            "score_layer2": 11,
            "decision": "Proceed"
        }"#;
        let result = parse_evaluation(reply, &request()).unwrap();
        assert_eq!(result.candidate_name.as_deref(), Some("Jane"));
        assert_eq!(result.requirements_met.len(), 2);
    }

    #[test]
    fn test_omitted_requirement_counts_as_unmet() {
        let reply = r#"{"requirements_met": {"BS CS": true}, "question_scores": {"Q1": 7, "Q2": 7}}"#;
        let result = parse_evaluation(reply, &request()).unwrap();
        assert_eq!(result.requirements_met["Python"], false);
    }

    #[test]
    fn test_keys_match_case_insensitively_and_strays_dropped() {
        let reply = r#"{
            "requirements_met": {"bs cs": true, " PYTHON ": true, "Haskell": false},
            "question_scores": {"q1": 4, "Q2": 6, "Q3": 10}
        }"#;
        let result = parse_evaluation(reply, &request()).unwrap();
        assert_eq!(
            result.requirements_met.keys().collect::<Vec<_>>(),
            vec!["BS CS", "Python"]
        );
        assert!(result.requirements_met.values().all(|met| *met));
        assert_eq!(result.question_scores.keys().collect::<Vec<_>>(), vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_non_json_reply_is_malformed() {
        let err = parse_evaluation("The candidate looks great!", &request()).unwrap_err();
        assert!(matches!(err, EvaluationError::MalformedResponse(_)));
    }

    #[test]
    fn test_python_literal_reply_is_malformed() {
        // Single quotes and True/False are not JSON; the reply is never evaluated as code.
        let reply = "{'requirements_met': {'BS CS': True}, 'question_scores': {'Q1': 5}}";
        assert!(matches!(
            parse_evaluation(reply, &request()),
            Err(EvaluationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_out_of_range_score_is_malformed() {
        let reply = r#"{"requirements_met": {}, "question_scores": {"Q1": 42}}"#;
        assert!(matches!(
            parse_evaluation(reply, &request()),
            Err(EvaluationError::MalformedResponse(msg)) if msg.contains("Q1")
        ));
    }

    #[test]
    fn test_reply_scoring_no_known_question_is_malformed() {
        let reply = r#"{"requirements_met": {}, "question_scores": {"Leadership": 8}}"#;
        assert!(matches!(
            parse_evaluation(reply, &request()),
            Err(EvaluationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_llm_errors_split_into_upstream_and_malformed() {
        let parse = LlmError::from(serde_json::from_str::<u8>("x").unwrap_err());
        assert!(matches!(
            EvaluationError::from(parse),
            EvaluationError::MalformedResponse(_)
        ));

        let api = LlmError::Api {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert!(matches!(
            EvaluationError::from(api),
            EvaluationError::Upstream(LlmError::Api { status: 429, .. })
        ));
        assert!(matches!(
            EvaluationError::from(LlmError::EmptyContent),
            EvaluationError::Upstream(_)
        ));
    }

    #[test]
    fn test_prompt_is_deterministic_and_ordered() {
        let req = request();
        let first = build_evaluation_prompt(&req);
        assert_eq!(first, build_evaluation_prompt(&req));

        let education = first.find("- [Education] BS CS").unwrap();
        let skills = first.find("- [Skills] Python").unwrap();
        assert!(education < skills);
        assert!(first.contains("- Q1\n- Q2"));
        assert!(first.contains("Jane Doe\nBS CS, 5 years Python"));
    }

    #[test]
    fn test_resume_placeholders_are_not_expanded() {
        let mut req = request();
        req.resume_text = "I list {questions} and {requirements} literally".to_string();
        let prompt = build_evaluation_prompt(&req);
        assert!(prompt.contains("I list {questions} and {requirements} literally"));
    }

    #[test]
    fn test_system_prompt_names_company_and_role() {
        let system = build_system_prompt("Acme", &request());
        assert!(system.contains("recruiter at Acme"));
        assert!(system.contains("role: Backend Engineer"));
        assert!(system.contains("valid JSON only"));
    }

    #[test]
    fn test_empty_job_lists_render_placeholder() {
        let mut req = request();
        req.requirements = Requirements::default();
        req.questions.clear();
        let prompt = build_evaluation_prompt(&req);
        assert_eq!(prompt.matches("- (none)").count(), 2);
    }
}
