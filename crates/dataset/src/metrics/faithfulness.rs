use super::{verdict_text, EvalSample, MetricJudge, MetricOutcome};
use crate::json_repair::as_list;
use protoqa_core::AppResult;
use serde_json::{json, Map, Value};

/// Share of answer statements the context supports.
///
/// Statements are extracted from the answer first, then judged against the
/// context in batches of `nli_batch_size`, numbered across batches.
pub async fn faithfulness(judge: &MetricJudge, sample: &EvalSample) -> AppResult<MetricOutcome> {
    if sample.answer.trim().is_empty() {
        return Ok(MetricOutcome::scored(0.0, json!([])));
    }

    let question = sample.question.replace('"', "'");
    let answer = sample.answer.replace('"', "'");
    let raw = judge
        .ask_json(
            "metric.statements",
            &[("question", question.as_str()), ("answer", answer.as_str())],
        )
        .await?;
    let statements = extract_statements(raw);
    if statements.is_empty() {
        tracing::debug!("No statements extracted from answer");
        return Ok(MetricOutcome::unscored(json!({ "statements": [] })));
    }

    let context = sample.contexts.join("\n");
    let batch_size = judge.config().nli_batch_size.max(1);
    let mut verdicts = Vec::new();

    for (batch, group) in statements.chunks(batch_size).enumerate() {
        let offset = batch * batch_size;
        let listing = group
            .iter()
            .enumerate()
            .map(|(i, s)| format!("statement_{}: {}", offset + i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");
        let raw = judge
            .ask_json(
                "metric.nli",
                &[("context", context.as_str()), ("statements", listing.as_str())],
            )
            .await?;
        verdicts.extend(as_list(raw));
    }

    let verdicts = normalize_verdicts(verdicts);
    Ok(MetricOutcome {
        score: faithfulness_score(&verdicts),
        detail: Value::Array(verdicts),
    })
}

fn extract_statements(value: Value) -> Vec<String> {
    let mut statements = Vec::new();
    for item in as_list(value) {
        match item {
            Value::String(s) => statements.push(s),
            Value::Object(mut obj) => {
                if let Some(list) = obj.remove("statements") {
                    statements.extend(as_list(list).into_iter().filter_map(|s| match s {
                        Value::String(s) => Some(s),
                        _ => None,
                    }));
                }
            }
            _ => {}
        }
    }
    statements.retain(|s| !s.trim().is_empty());
    statements
}

/// Bring verdict objects into one flat shape, renumbered in order:
/// `{"statement_k": text, "reason": ..., "verdict": ...}`.
///
/// Accepts the flat form `{"statement_1": "text", "reason", "verdict"}` and
/// the nested form `{"statement_1": {"text", "reason", "verdict"}}`.
pub fn normalize_verdicts(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = match item {
                Value::Object(obj) => obj,
                _ => Map::new(),
            };
            let statement = obj
                .iter()
                .find(|(k, _)| k.starts_with("statement"))
                .map(|(_, v)| v.clone());

            let (text, holder) = match statement {
                Some(Value::Object(nested)) => {
                    let text = nested
                        .get("text")
                        .or_else(|| nested.get("statement"))
                        .cloned()
                        .unwrap_or_default();
                    (text, nested)
                }
                Some(text) => (text, obj),
                None => (Value::String(String::new()), obj),
            };

            let mut flat = Map::new();
            flat.insert(format!("statement_{}", i + 1), text);
            flat.insert(
                "reason".to_string(),
                holder.get("reason").cloned().unwrap_or_default(),
            );
            flat.insert(
                "verdict".to_string(),
                verdict_text(holder.get("verdict")).map_or(Value::Null, Value::String),
            );
            Value::Object(flat)
        })
        .collect()
}

/// Faithful share of normalized verdicts. Any verdict other than `"1"` or
/// `"0"` makes the score undefined, as does an empty list.
pub fn faithfulness_score(verdicts: &[Value]) -> Option<f64> {
    if verdicts.is_empty() {
        return None;
    }
    let mut faithful = 0usize;
    for verdict in verdicts {
        match verdict.get("verdict").and_then(Value::as_str) {
            Some("1") => faithful += 1,
            Some("0") => {}
            _ => return None,
        }
    }
    Some(faithful as f64 / verdicts.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{judge, judge_with, sample};
    use super::*;
    use protoqa_core::EvaluationConfig;
    use protoqa_llm::ScriptedClient;

    #[test]
    fn test_normalize_flat_and_nested() {
        let items = vec![
            json!({"statement_7": "MRI for red flags", "reason": "stated", "verdict": "1"}),
            json!({"statement_2": {"text": "Bed rest", "reason": "absent", "verdict": 0}}),
            json!("garbage"),
        ];
        let verdicts = normalize_verdicts(items);
        assert_eq!(
            verdicts[0],
            json!({"statement_1": "MRI for red flags", "reason": "stated", "verdict": "1"})
        );
        assert_eq!(
            verdicts[1],
            json!({"statement_2": "Bed rest", "reason": "absent", "verdict": "0"})
        );
        assert_eq!(verdicts[2]["verdict"], Value::Null);
    }

    #[test]
    fn test_score() {
        let ok = normalize_verdicts(vec![
            json!({"statement_1": "a", "verdict": "1"}),
            json!({"statement_2": "b", "verdict": "0"}),
            json!({"statement_3": "c", "verdict": "1"}),
            json!({"statement_4": "d", "verdict": "1"}),
        ]);
        assert_eq!(faithfulness_score(&ok), Some(0.75));

        let bad = normalize_verdicts(vec![json!({"statement_1": "a", "verdict": "maybe"})]);
        assert_eq!(faithfulness_score(&bad), None);
        assert_eq!(faithfulness_score(&[]), None);
    }

    #[tokio::test]
    async fn test_empty_answer_scores_zero() {
        let judge = judge(ScriptedClient::default());
        let mut s = sample(None);
        s.answer = "  ".to_string();
        assert_eq!(faithfulness(&judge, &s).await.unwrap().score, Some(0.0));
    }

    #[tokio::test]
    async fn test_no_statements_is_unscored() {
        let judge = judge(ScriptedClient::new([r#"{"statements": []}"#]));
        assert_eq!(faithfulness(&judge, &sample(None)).await.unwrap().score, None);
    }

    #[tokio::test]
    async fn test_batches_are_numbered_globally() {
        let statements = json!({"statements": ["s1", "s2", "s3", "s4", "s5", "s6", "s7"]});
        let first = json!([
            {"statement_1": "s1", "reason": "", "verdict": "1"},
            {"statement_2": "s2", "reason": "", "verdict": "1"},
            {"statement_3": "s3", "reason": "", "verdict": "0"}
        ]);
        let second = "```json\n{\"statement_4\": \"s4\", \"verdict\": \"1\"}\n```";
        let third = r#"[{"statement_1": "s7", "verdict": "0"}]"#;
        let client = ScriptedClient::new([statements.to_string(), first.to_string()])
            .then_reply(second)
            .then_reply(third);
        let config = EvaluationConfig {
            nli_batch_size: 3,
            ..EvaluationConfig::default()
        };
        let judge = judge_with(client, config);

        let outcome = faithfulness(&judge, &sample(None)).await.unwrap();
        assert_eq!(outcome.score, Some(0.6));
        let verdicts = outcome.detail.as_array().unwrap();
        assert_eq!(verdicts.len(), 5);
        assert_eq!(verdicts[4]["statement_5"], "s7");
    }
}
