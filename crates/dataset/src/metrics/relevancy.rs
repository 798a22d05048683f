use super::{truthy, EvalSample, MetricJudge, MetricOutcome};
use crate::json_repair::as_list;
use protoqa_core::AppResult;
use protoqa_llm::cosine_similarity;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
struct GeneratedQuestion {
    question: String,
    noncommittal: bool,
}

/// Accepts `{"questions": ["..."], "noncommittal": n}`,
/// `{"questions": [{"question", "noncommittal"}]}` and bare
/// `{"question", "noncommittal"}` objects, alone or in a list.
fn generated_questions(value: Value) -> Vec<GeneratedQuestion> {
    let mut out = Vec::new();
    for item in as_list(value) {
        let shared = item.get("noncommittal").map(truthy).unwrap_or(false);
        if let Some(questions) = item.get("questions").and_then(Value::as_array) {
            for q in questions {
                match q {
                    Value::String(text) => out.push(GeneratedQuestion {
                        question: text.clone(),
                        noncommittal: shared,
                    }),
                    Value::Object(_) => out.push(GeneratedQuestion {
                        question: q
                            .get("question")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        noncommittal: q.get("noncommittal").map(truthy).unwrap_or(shared),
                    }),
                    _ => {}
                }
            }
        } else if let Some(question) = item.get("question").and_then(Value::as_str) {
            out.push(GeneratedQuestion {
                question: question.to_string(),
                noncommittal: shared,
            });
        }
    }
    out
}

/// Mean cosine similarity between the question and questions generated from
/// the answer; 0 when the answer is noncommittal.
pub async fn answer_relevancy(
    judge: &MetricJudge,
    sample: &EvalSample,
) -> AppResult<MetricOutcome> {
    let context = sample.contexts.join("\n");
    let raw = judge
        .ask_json(
            "metric.question_gen",
            &[("answer", sample.answer.as_str()), ("context", context.as_str())],
        )
        .await?;

    let generated = generated_questions(raw);
    let detail = Value::Array(
        generated
            .iter()
            .map(|g| json!({"question": g.question, "noncommittal": u8::from(g.noncommittal)}))
            .collect(),
    );

    let questions: Vec<String> = generated
        .iter()
        .map(|g| g.question.clone())
        .filter(|q| !q.trim().is_empty())
        .collect();
    if questions.is_empty() {
        return Ok(MetricOutcome::unscored(detail));
    }
    if generated.iter().any(|g| g.noncommittal) {
        return Ok(MetricOutcome::scored(0.0, detail));
    }

    let embedder = judge.embedder();
    let question = embedder.embed(&sample.question).await?;
    let vectors = embedder.embed_batch(&questions).await?;
    let mean = vectors
        .iter()
        .map(|v| cosine_similarity(&question, v))
        .sum::<f64>()
        / vectors.len() as f64;

    Ok(MetricOutcome::scored(mean, detail))
}
