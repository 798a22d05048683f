//! Evaluation runner: scores QA records with the selected metrics.

use crate::metrics::{EvalSample, Metric, MetricJudge, MetricOutcome};
use crate::records::{create_parent, QaRecord, RECORD_HEADERS};
use protoqa_core::AppResult;
use std::path::Path;
use std::time::Duration;

impl From<&QaRecord> for EvalSample {
    fn from(record: &QaRecord) -> Self {
        EvalSample {
            question: record.question.clone(),
            answer: record.answer.clone(),
            contexts: vec![record.doc_chunk.replace('"', "'")],
            ground_truth: record.ground_truth.clone(),
        }
    }
}

/// A record with one outcome per selected metric, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalRow {
    pub record: QaRecord,
    pub outcomes: Vec<(Metric, MetricOutcome)>,
}

impl EvalRow {
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.outcomes
            .iter()
            .find(|(m, _)| *m == metric)
            .and_then(|(_, outcome)| outcome.score)
    }
}

pub struct Evaluator {
    judge: MetricJudge,
}

impl Evaluator {
    pub fn new(judge: MetricJudge) -> Self {
        Self { judge }
    }

    /// Evaluate `records[start..]`.
    ///
    /// Records flagged as referring to their source are kept with empty
    /// scores. When `checkpoint` is given, the rows evaluated so far are
    /// written there after every record.
    pub async fn run(
        &self,
        records: &[QaRecord],
        metrics: &[Metric],
        start: usize,
        checkpoint: Option<&Path>,
    ) -> AppResult<Vec<EvalRow>> {
        let delay = Duration::from_secs(self.judge.config().request_delay_secs);
        let mut rows = Vec::new();
        let pending = records.get(start..).unwrap_or_default();

        for (offset, record) in pending.iter().enumerate() {
            let outcomes = if record.flag_source {
                tracing::info!(id = record.id, "Skipping record flagged as source reference");
                metrics
                    .iter()
                    .map(|m| (*m, MetricOutcome::unscored(serde_json::Value::Null)))
                    .collect()
            } else {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let sample = EvalSample::from(record);
                let mut outcomes = Vec::with_capacity(metrics.len());
                for metric in metrics {
                    let outcome = self.judge.score(*metric, &sample).await;
                    tracing::debug!(
                        id = record.id,
                        metric = %metric,
                        score = ?outcome.score,
                        "Scored"
                    );
                    outcomes.push((*metric, outcome));
                }
                outcomes
            };

            rows.push(EvalRow {
                record: record.clone(),
                outcomes,
            });
            tracing::info!(
                record = start + offset + 1,
                of = records.len(),
                "Evaluated record {}",
                record.id
            );

            if let Some(path) = checkpoint {
                write_rows(path, metrics, &rows)?;
            }
        }

        Ok(rows)
    }
}

/// Record columns followed by `<metric>` and `<metric>_reasons` per metric.
pub fn write_rows(path: &Path, metrics: &[Metric], rows: &[EvalRow]) -> AppResult<()> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    let mut headers: Vec<String> = RECORD_HEADERS.iter().map(|h| h.to_string()).collect();
    for metric in metrics {
        headers.push(metric.to_string());
        headers.push(format!("{}_reasons", metric));
    }
    writer.write_record(&headers)?;

    for row in rows {
        let mut fields = row.record.to_fields();
        for metric in metrics {
            match row.outcomes.iter().find(|(m, _)| m == metric) {
                Some((_, outcome)) => {
                    fields.push(outcome.score.map(|s| s.to_string()).unwrap_or_default());
                    fields.push(match &outcome.detail {
                        serde_json::Value::Null => String::new(),
                        detail => serde_json::to_string(detail)?,
                    });
                }
                None => fields.extend([String::new(), String::new()]),
            }
        }
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::judge_with;
    use protoqa_core::EvaluationConfig;
    use protoqa_llm::ScriptedClient;
    use tempfile::TempDir;

    fn evaluator(client: ScriptedClient) -> Evaluator {
        let config = EvaluationConfig {
            request_delay_secs: 0,
            ..EvaluationConfig::default()
        };
        Evaluator::new(judge_with(client, config))
    }

    fn record(id: usize, flagged: bool) -> QaRecord {
        QaRecord {
            id,
            question: "When should MRI be ordered?".to_string(),
            answer: "When red flags are present.".to_string(),
            doc_chunk: "Order MRI when \"red flags\" are present.".to_string(),
            flag_source: flagged,
            ..QaRecord::default()
        }
    }

    #[test]
    fn test_sample_from_record() {
        let sample = EvalSample::from(&record(1, false));
        assert_eq!(sample.contexts, vec!["Order MRI when 'red flags' are present."]);
        assert_eq!(sample.ground_truth, None);
    }

    #[tokio::test]
    async fn test_run_skips_flagged_and_checkpoints() {
        let dir = TempDir::new().unwrap();
        let checkpoint = dir.path().join("eval.csv");
        let client = ScriptedClient::new([
            r#"{"statements": ["MRI is ordered for red flags."]}"#,
            r#"[{"statement_1": "MRI is ordered for red flags.", "reason": "stated", "verdict": "1"}]"#,
        ]);
        let evaluator = evaluator(client);
        let records = vec![record(1, true), record(2, false)];

        let rows = evaluator
            .run(&records, &[Metric::Faithfulness], 0, Some(&checkpoint))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].score(Metric::Faithfulness), None);
        assert_eq!(rows[1].score(Metric::Faithfulness), Some(1.0));

        let mut reader = csv::Reader::from_path(&checkpoint).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(11), Some("faithfulness"));
        assert_eq!(headers.get(12), Some("faithfulness_reasons"));
        let written: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].get(11), Some(""));
        assert_eq!(written[1].get(11), Some("1"));
        assert!(written[1].get(12).unwrap().contains("statement_1"));
    }

    #[tokio::test]
    async fn test_run_resumes_from_start() {
        let client = ScriptedClient::new([r#"{"questions": []}"#]);
        let evaluator = evaluator(client);
        let records = vec![record(1, false), record(2, false)];

        let rows = evaluator
            .run(&records, &[Metric::AnswerRelevancy], 1, None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.id, 2);

        let past_end = evaluator.run(&records, &[Metric::AnswerRelevancy], 5, None).await.unwrap();
        assert!(past_end.is_empty());
    }
}
