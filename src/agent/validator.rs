//! Advisory quality checks over a finished [`AgentResponse`].
//!
//! Nothing here fails a request: the report is logged by the service and
//! exposed through the `validate-response` endpoint.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::types::AgentResponse;
use crate::core::config::Thresholds;

/// Confidence assigned when nothing was retrieved.
pub const NO_CONTEXT_CONFIDENCE: f64 = 0.3;

const SCORE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub confidence_score: f64,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseValidator {
    min_confidence_score: f64,
    min_similarity_score: f64,
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::from_thresholds(&Thresholds::default())
    }
}

impl ResponseValidator {
    pub fn new(min_confidence_score: f64, min_similarity_score: f64) -> Self {
        Self {
            min_confidence_score,
            min_similarity_score,
        }
    }

    pub fn from_thresholds(thresholds: &Thresholds) -> Self {
        Self::new(
            thresholds.min_confidence_score,
            thresholds.min_similarity_score,
        )
    }

    pub fn validate(&self, response: &AgentResponse) -> ValidationReport {
        let mut issues = Vec::new();
        let chunks = &response.retrieved_chunks;
        let confidence = response.confidence_score;

        if response.response.trim().is_empty() {
            issues.push("Response text is empty".to_string());
        }

        if !(0.0..=1.0).contains(&confidence) {
            issues.push(format!("Confidence score {:.3} is outside [0, 1]", confidence));
        }

        if chunks.is_empty() {
            if confidence > NO_CONTEXT_CONFIDENCE + SCORE_TOLERANCE {
                issues.push(format!(
                    "Confidence score {:.3} is high although no context was retrieved",
                    confidence
                ));
            }
        } else {
            let (min_sim, max_sim) = chunks.iter().fold((f64::MAX, f64::MIN), |(lo, hi), c| {
                (lo.min(c.similarity_score), hi.max(c.similarity_score))
            });
            if confidence < min_sim - SCORE_TOLERANCE || confidence > max_sim + SCORE_TOLERANCE {
                issues.push(format!(
                    "Confidence score {:.3} is outside the retrieved similarity range [{:.3}, {:.3}]",
                    confidence, min_sim, max_sim
                ));
            }

            if confidence < self.min_confidence_score {
                issues.push(format!(
                    "Confidence score {:.3} is below the minimum of {:.3}",
                    confidence, self.min_confidence_score
                ));
            }

            for chunk in chunks {
                if chunk.similarity_score < self.min_similarity_score {
                    issues.push(format!(
                        "Chunk {} has similarity {:.3} below the minimum of {:.3}",
                        chunk.id, chunk.similarity_score, self.min_similarity_score
                    ));
                }
            }
        }

        let sources: BTreeSet<&str> = chunks.iter().map(|c| c.source_url.as_str()).collect();
        let attributed: BTreeSet<&str> = response
            .source_attribution
            .iter()
            .map(String::as_str)
            .collect();
        if sources != attributed {
            issues.push("Source attribution does not match the retrieved chunk sources".to_string());
        }

        ValidationReport {
            is_valid: issues.is_empty(),
            issues,
            confidence_score: confidence,
            chunk_count: chunks.len(),
        }
    }
}
