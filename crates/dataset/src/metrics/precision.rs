use super::{verdict_text, EvalSample, MetricJudge, MetricOutcome};
use crate::json_repair::as_list;
use protoqa_core::AppResult;
use serde_json::Value;

/// The first `verdict` in a reply, looking inside a `verification` wrapper.
fn find_verdict(value: &Value) -> Option<String> {
    as_list(value.clone()).iter().find_map(|item| {
        verdict_text(item.get("verdict"))
            .or_else(|| item.get("verification").and_then(|v| verdict_text(v.get("verdict"))))
    })
}

/// `Σ (precision@i · v_i) / (Σ v + 1e-10)` over per-context verdicts in
/// context order. Undefined when any verdict is missing or there are none.
pub fn average_precision(verdicts: &[Option<bool>]) -> Option<f64> {
    if verdicts.is_empty() {
        return None;
    }
    let flags: Vec<f64> = verdicts
        .iter()
        .map(|v| v.map(|useful| if useful { 1.0 } else { 0.0 }))
        .collect::<Option<_>>()?;

    let denominator = flags.iter().sum::<f64>() + 1e-10;
    let mut running = 0.0;
    let mut numerator = 0.0;
    for (i, flag) in flags.iter().enumerate() {
        running += flag;
        numerator += (running / (i + 1) as f64) * flag;
    }
    Some(numerator / denominator)
}

/// Whether each context was useful for reaching the reference answer (the
/// ground truth when present, else the answer).
pub async fn context_precision(
    judge: &MetricJudge,
    sample: &EvalSample,
) -> AppResult<MetricOutcome> {
    let question = sample.question.replace('"', "'");
    let reference = sample
        .ground_truth
        .as_deref()
        .filter(|g| !g.trim().is_empty())
        .unwrap_or(&sample.answer)
        .replace('"', "'");

    let mut replies = Vec::new();
    let mut verdicts = Vec::new();
    for context in &sample.contexts {
        let context = context.replace('"', "'");
        let reply = judge
            .ask_json(
                "metric.precision",
                &[
                    ("question", question.as_str()),
                    ("context", context.as_str()),
                    ("answer", reference.as_str()),
                ],
            )
            .await?;
        verdicts.push(find_verdict(&reply).map(|v| v == "1"));
        replies.push(reply);
    }

    Ok(MetricOutcome {
        score: average_precision(&verdicts),
        detail: Value::Array(replies),
    })
}
