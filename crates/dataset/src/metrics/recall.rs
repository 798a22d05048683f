use super::{verdict_text, EvalSample, Metric, MetricJudge, MetricOutcome};
use crate::json_repair::as_list;
use protoqa_core::AppResult;
use serde_json::Value;

fn classifications(value: Value) -> Vec<Value> {
    as_list(value)
        .into_iter()
        .flat_map(|item| match item {
            Value::Object(mut obj) if obj.contains_key("classification") => obj
                .remove("classification")
                .map(as_list)
                .unwrap_or_default(),
            other => vec![other],
        })
        .collect()
}

/// Attributed share of ground-truth sentences; undefined when any sentence
/// lacks an `Attributed` field.
fn recall_score(items: &[Value]) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let mut attributed = 0usize;
    for item in items {
        if verdict_text(item.get("Attributed"))? == "1" {
            attributed += 1;
        }
    }
    Some(attributed as f64 / items.len() as f64)
}

pub async fn context_recall(judge: &MetricJudge, sample: &EvalSample) -> AppResult<MetricOutcome> {
    let ground_truth = sample.require_ground_truth(Metric::ContextRecall)?;
    let context = sample.contexts.join("\n");
    let raw = judge
        .ask_json(
            "metric.recall",
            &[
                ("question", sample.question.as_str()),
                ("context", context.as_str()),
                ("answer", ground_truth),
            ],
        )
        .await?;

    let items = classifications(raw);
    Ok(MetricOutcome {
        score: recall_score(&items),
        detail: Value::Array(items),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{judge, sample};
    use super::*;
    use protoqa_llm::ScriptedClient;
    use serde_json::json;

    #[test]
    fn test_wrapped_classification() {
        let items = classifications(json!({"classification": [
            {"statement_1": "a", "Attributed": "1"},
            {"statement_2": "b", "Attributed": 0}
        ]}));
        assert_eq!(items.len(), 2);
        assert_eq!(recall_score(&items), Some(0.5));
    }

    #[test]
    fn test_missing_attribution_is_undefined() {
        let items = vec![
            json!({"statement_1": "a", "Attributed": "1"}),
            json!({"statement_2": "b", "reason": "unclear"}),
        ];
        assert_eq!(recall_score(&items), None);
        assert_eq!(recall_score(&[]), None);
    }

    #[tokio::test]
    async fn test_context_recall() {
        let reply = r#"[
            {"statement_1": "MRI for red flags.", "reason": "stated", "Attributed": "1"},
            {"statement_2": "Refer to surgery.", "reason": "absent", "Attributed": "0"},
            {"statement_3": "Cauda equina is a red flag.", "reason": "stated", "Attributed": "1"},
            {"statement_4": "Avoid imaging early.", "reason": "stated", "Attributed": "1"}
        ]"#;
        let judge = judge(ScriptedClient::new([reply]));
        let outcome = context_recall(&judge, &sample(Some("MRI for red flags."))).await.unwrap();
        assert_eq!(outcome.score, Some(0.75));
    }

    #[tokio::test]
    async fn test_requires_ground_truth() {
        let judge = judge(ScriptedClient::default());
        let err = context_recall(&judge, &sample(None)).await.unwrap_err();
        assert!(err.to_string().contains("context_recall requires a ground truth"));
    }
}
