//! Decision step: aggregates scores and resolves the application status.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::application::ApplicationStatus;
use crate::notify::NotificationOutcome;
use crate::screening::evaluation::EvaluationResult;

/// Arithmetic mean of the recorded question scores; 0 when nothing was scored.
pub fn mean_score(scores: &BTreeMap<String, f64>) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().sum::<f64>() / scores.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub total_score: f64,
    pub threshold_score: f64,
    pub all_requirements_met: bool,
    pub meets_threshold: bool,
}

impl Decision {
    pub fn from_evaluation(result: &EvaluationResult, threshold_score: f64) -> Self {
        Self::new(
            &result.question_scores,
            &result.requirements_met,
            threshold_score,
        )
    }

    pub fn new(
        question_scores: &BTreeMap<String, f64>,
        requirements_met: &BTreeMap<String, bool>,
        threshold_score: f64,
    ) -> Self {
        let total_score = mean_score(question_scores);
        Self {
            total_score,
            threshold_score,
            all_requirements_met: requirements_met.values().all(|met| *met),
            meets_threshold: total_score >= threshold_score,
        }
    }

    /// Eligible for approval, pending a successful notification draft.
    pub fn is_eligible(&self) -> bool {
        self.all_requirements_met && self.meets_threshold
    }
}

/// Final status for a freshly inserted (pending) application.
///
/// `notification` is `None` when no draft was attempted.
pub fn resolve_status(
    decision: &Decision,
    notification: Option<&NotificationOutcome>,
) -> ApplicationStatus {
    if !decision.is_eligible() {
        return ApplicationStatus::Rejected;
    }
    match notification {
        Some(outcome) if outcome.is_drafted() => ApplicationStatus::Approved,
        _ => ApplicationStatus::Pending,
    }
}
