use super::{EvalSample, Metric, MetricJudge, MetricOutcome};
use crate::json_repair::as_list;
use protoqa_core::AppResult;
use protoqa_llm::cosine_similarity;
use serde_json::{json, Value};

/// `tp / (tp + 0.5 * (fp + fn))`, 0 without true positives.
pub fn statement_f1(tp: usize, fp: usize, fn_: usize) -> f64 {
    if tp == 0 {
        return 0.0;
    }
    tp as f64 / (tp as f64 + 0.5 * (fp + fn_) as f64)
}

/// TP/FP/FN list lengths from the judge's reply.
fn statement_counts(value: &Value) -> Option<(usize, usize, usize)> {
    let items = as_list(value.clone());
    let first = items.first()?;
    let holder = first.get("Extracted statements").unwrap_or(first);
    let count = |key: &str| holder.get(key).and_then(Value::as_array).map(Vec::len);
    Some((count("TP")?, count("FP")?, count("FN")?))
}

/// Cosine similarity of the ground-truth and answer embeddings.
pub async fn answer_similarity(
    judge: &MetricJudge,
    sample: &EvalSample,
) -> AppResult<MetricOutcome> {
    let ground_truth = sample.require_ground_truth(Metric::AnswerSimilarity)?;
    let similarity = similarity_of(judge, ground_truth, &sample.answer).await?;
    Ok(MetricOutcome::scored(similarity, json!({ "similarity": similarity })))
}

async fn similarity_of(judge: &MetricJudge, ground_truth: &str, answer: &str) -> AppResult<f64> {
    let vectors = judge
        .embedder()
        .embed_batch(&[ground_truth.to_string(), answer.to_string()])
        .await?;
    match vectors.as_slice() {
        [truth, answer] => Ok(cosine_similarity(truth, answer)),
        _ => Ok(0.0),
    }
}

/// Statement-level F1 against the ground truth, blended with answer
/// similarity by `correctness_weights`.
pub async fn answer_correctness(
    judge: &MetricJudge,
    sample: &EvalSample,
) -> AppResult<MetricOutcome> {
    let ground_truth = sample.require_ground_truth(Metric::AnswerCorrectness)?;
    let raw = judge
        .ask_json(
            "metric.correctness",
            &[
                ("question", sample.question.as_str()),
                ("answer", sample.answer.as_str()),
                ("ground_truth", ground_truth),
            ],
        )
        .await?;

    let Some((tp, fp, fn_)) = statement_counts(&raw) else {
        return Ok(MetricOutcome::unscored(raw));
    };
    let f1 = statement_f1(tp, fp, fn_);

    let [w_f1, w_sim] = judge.config().correctness_weights;
    let similarity = if w_sim != 0.0 {
        similarity_of(judge, ground_truth, &sample.answer).await?
    } else {
        0.0
    };

    let total = w_f1 + w_sim;
    let score = if total > 0.0 {
        (w_f1 * f1 + w_sim * similarity) / total
    } else {
        f1
    };

    Ok(MetricOutcome::scored(
        score,
        json!({ "statements": raw, "f1": f1, "similarity": similarity }),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{judge, judge_with, sample};
    use super::*;
    use protoqa_core::EvaluationConfig;
    use protoqa_llm::ScriptedClient;

    #[test]
    fn test_statement_f1() {
        assert_eq!(statement_f1(0, 3, 2), 0.0);
        assert_eq!(statement_f1(2, 0, 0), 1.0);
        assert_eq!(statement_f1(1, 1, 1), 0.5);
    }

    #[test]
    fn test_counts_accept_wrapper() {
        let wrapped = json!({"Extracted statements": {"TP": ["a"], "FP": [], "FN": ["b", "c"]}});
        assert_eq!(statement_counts(&wrapped), Some((1, 0, 2)));
        assert_eq!(statement_counts(&json!({"TP": ["a"], "FP": "none", "FN": []})), None);
    }

    #[tokio::test]
    async fn test_f1_only_when_similarity_weight_is_zero() {
        let reply = r#"{"TP": ["MRI for red flags"], "FP": ["Bed rest"], "FN": []}"#;
        let config = EvaluationConfig {
            correctness_weights: [1.0, 0.0],
            ..EvaluationConfig::default()
        };
        let judge = judge_with(ScriptedClient::new([reply]), config);
        let outcome = answer_correctness(&judge, &sample(Some("MRI for red flags.")))
            .await
            .unwrap();
        let score = outcome.score.unwrap();
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_blends_similarity() {
        let reply = r#"{"TP": ["MRI for red flags"], "FP": [], "FN": []}"#;
        let config = EvaluationConfig {
            correctness_weights: [0.75, 0.25],
            ..EvaluationConfig::default()
        };
        let judge = judge_with(ScriptedClient::new([reply]), config);
        let mut s = sample(None);
        s.ground_truth = Some(s.answer.clone());

        let outcome = answer_correctness(&judge, &s).await.unwrap();
        assert!((outcome.score.unwrap() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_malformed_lists_are_unscored() {
        let judge = judge(ScriptedClient::new([r#"{"TP": "MRI"}"#]));
        let outcome = answer_correctness(&judge, &sample(Some("MRI for red flags.")))
            .await
            .unwrap();
        assert_eq!(outcome.score, None);
    }

    #[tokio::test]
    async fn test_answer_similarity() {
        let judge = judge(ScriptedClient::default());
        let same = sample(Some(
            "MRI should be ordered when red flags such as cauda equina are present.",
        ));
        let outcome = answer_similarity(&judge, &same).await.unwrap();
        assert!((outcome.score.unwrap() - 1.0).abs() < 1e-6);

        let different = sample(Some("Prescribe inhaled corticosteroids for asthma control."));
        let lower = answer_similarity(&judge, &different).await.unwrap();
        assert!(lower.score.unwrap() < 0.5);
    }
}
