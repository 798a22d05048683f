//! Retrieval-augmented-generation quality metrics.
//!
//! Each metric asks the judge model for structured verdicts (and, for the
//! similarity-based ones, embeddings) and folds them into a score in `[0, 1]`.
//! A metric that cannot produce a score returns `score = None` with the reason
//! recorded in `detail`; it never aborts the caller.
//!
//! # Metrics
//! - `faithfulness`: share of answer statements supported by the context
//! - `answer_relevancy`: similarity between the question and questions
//!   reverse-engineered from the answer
//! - `context_precision`: average precision of useful contexts
//! - `context_recall`: share of ground-truth statements attributable to the context
//! - `answer_correctness`: statement F1 against the ground truth, blended with
//!   answer similarity
//! - `answer_similarity`: embedding cosine of answer and ground truth

mod correctness;
mod faithfulness;
mod precision;
mod recall;
mod relevancy;

pub use correctness::{answer_correctness, answer_similarity, statement_f1};
pub use faithfulness::{faithfulness, faithfulness_score, normalize_verdicts};
pub use precision::{average_precision, context_precision};
pub use recall::context_recall;
pub use relevancy::answer_relevancy;

use crate::json_repair::parse_llm_json;
use protoqa_core::{AppError, AppResult, EvaluationConfig};
use protoqa_llm::{EmbeddingProvider, LlmClient, LlmRequest};
use protoqa_prompt::PromptCatalog;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// One question-answer pair as the metrics see it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalSample {
    pub question: String,
    pub answer: String,
    pub contexts: Vec<String>,
    pub ground_truth: Option<String>,
}

impl EvalSample {
    pub(crate) fn require_ground_truth(&self, metric: Metric) -> AppResult<&str> {
        self.ground_truth
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .ok_or_else(|| AppError::Metric(format!("{} requires a ground truth", metric)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOutcome {
    pub score: Option<f64>,
    pub detail: Value,
}

impl MetricOutcome {
    pub fn scored(score: f64, detail: Value) -> Self {
        Self {
            score: Some(score),
            detail,
        }
    }

    pub fn unscored(detail: Value) -> Self {
        Self {
            score: None,
            detail,
        }
    }

    pub fn failed(error: &AppError) -> Self {
        Self::unscored(json!({ "error": error.to_string() }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Faithfulness,
    AnswerRelevancy,
    ContextPrecision,
    ContextRecall,
    AnswerCorrectness,
    AnswerSimilarity,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Faithfulness,
        Metric::AnswerRelevancy,
        Metric::ContextPrecision,
        Metric::ContextRecall,
        Metric::AnswerCorrectness,
        Metric::AnswerSimilarity,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "faithfulness" => Some(Metric::Faithfulness),
            "answer_relevancy" | "answer_relevance" => Some(Metric::AnswerRelevancy),
            "context_precision" => Some(Metric::ContextPrecision),
            "context_recall" => Some(Metric::ContextRecall),
            "answer_correctness" => Some(Metric::AnswerCorrectness),
            "answer_similarity" => Some(Metric::AnswerSimilarity),
            _ => None,
        }
    }

    /// Parse a list of names, failing on the first unknown one.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> AppResult<Vec<Metric>> {
        names
            .iter()
            .map(|n| {
                Metric::parse(n.as_ref()).ok_or_else(|| {
                    AppError::Config(format!(
                        "Unknown metric '{}'. Available: {}",
                        n.as_ref(),
                        Metric::ALL.map(|m| m.as_str()).join(", ")
                    ))
                })
            })
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Faithfulness => "faithfulness",
            Metric::AnswerRelevancy => "answer_relevancy",
            Metric::ContextPrecision => "context_precision",
            Metric::ContextRecall => "context_recall",
            Metric::AnswerCorrectness => "answer_correctness",
            Metric::AnswerSimilarity => "answer_similarity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Judge model, embedder and prompts shared by all metrics.
pub struct MetricJudge {
    client: Arc<dyn LlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    prompts: Arc<PromptCatalog>,
    model: String,
    config: EvaluationConfig,
}

impl MetricJudge {
    pub fn new(
        client: Arc<dyn LlmClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        prompts: Arc<PromptCatalog>,
        model: impl Into<String>,
        config: EvaluationConfig,
    ) -> Self {
        Self {
            client,
            embedder,
            prompts,
            model: model.into(),
            config,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub(crate) fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    /// Render `prompt_id`, ask the judge model and parse its reply as JSON.
    pub(crate) async fn ask_json(
        &self,
        prompt_id: &str,
        vars: &[(&str, &str)],
    ) -> AppResult<Value> {
        let prompt = self.prompts.render(prompt_id, vars)?;
        let request = LlmRequest::new(prompt, &self.model).with_temperature(0.0);
        let response = self.client.complete(&request).await?;
        tracing::trace!(prompt = prompt_id, "Judge reply: {}", response.content);
        parse_llm_json(&response.content)
    }

    /// Score one sample; failures become an unscored outcome.
    pub async fn score(&self, metric: Metric, sample: &EvalSample) -> MetricOutcome {
        let result = match metric {
            Metric::Faithfulness => faithfulness(self, sample).await,
            Metric::AnswerRelevancy => answer_relevancy(self, sample).await,
            Metric::ContextPrecision => context_precision(self, sample).await,
            Metric::ContextRecall => context_recall(self, sample).await,
            Metric::AnswerCorrectness => answer_correctness(self, sample).await,
            Metric::AnswerSimilarity => answer_similarity(self, sample).await,
        };
        result.unwrap_or_else(|e| {
            tracing::warn!(metric = %metric, "Metric failed: {}", e);
            MetricOutcome::failed(&e)
        })
    }
}

/// `"1"`, `1`, `true` and friends.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True" | "yes" | "Yes"),
        _ => false,
    }
}

/// A verdict field as trimmed text; `None` when absent or empty.
pub(crate) fn verdict_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
