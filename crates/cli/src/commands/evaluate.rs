//! Evaluate command handler.

use super::{embedding_provider, llm_client, prompt_catalog};
use clap::Args;
use protoqa_core::{config::AppConfig, AppResult};
use protoqa_dataset::{read_records, EvalRow, Evaluator, Metric, MetricJudge};
use std::path::PathBuf;

/// Score QA pairs with RAG metrics
#[derive(Args, Debug)]
pub struct EvaluateCommand {
    /// QA CSV written by `generate`
    pub records: PathBuf,

    /// Scored CSV to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Comma-separated metrics (default: evaluation.metrics from config)
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Index of the first record to evaluate
    #[arg(long, default_value_t = 0)]
    pub start: usize,
}

impl EvaluateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing evaluate command");
        tracing::debug!("Evaluate options: {:?}", self);

        let names = if self.metrics.is_empty() {
            &config.evaluation.metrics
        } else {
            &self.metrics
        };
        let metrics = Metric::parse_list(names)?;
        let records = read_records(&self.records)?;

        let judge = MetricJudge::new(
            llm_client(config)?,
            embedding_provider(config)?,
            prompt_catalog(config)?,
            &config.model,
            config.evaluation.clone(),
        );
        let rows = Evaluator::new(judge)
            .run(&records, &metrics, self.start, Some(self.output.as_path()))
            .await?;

        for metric in &metrics {
            match mean_score(&rows, *metric) {
                Some((mean, scored)) => {
                    println!("{:<20} {:.4} ({} scored)", metric.as_str(), mean, scored)
                }
                None => println!("{:<20} n/a", metric.as_str()),
            }
        }
        println!("{} records -> {:?}", rows.len(), self.output);
        Ok(())
    }
}

/// Mean over the rows that produced a score, with their count.
fn mean_score(rows: &[EvalRow], metric: Metric) -> Option<(f64, usize)> {
    let scores: Vec<f64> = rows.iter().filter_map(|r| r.score(metric)).collect();
    if scores.is_empty() {
        return None;
    }
    Some((scores.iter().sum::<f64>() / scores.len() as f64, scores.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use protoqa_dataset::{MetricOutcome, QaRecord};
    use serde_json::Value;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        cmd: EvaluateCommand,
    }

    #[test]
    fn test_metrics_flag_splits_on_commas() {
        let parsed = Wrapper::parse_from([
            "evaluate",
            "qa.csv",
            "--output",
            "scored.csv",
            "--metrics",
            "faithfulness,context_recall",
        ]);
        assert_eq!(parsed.cmd.metrics, vec!["faithfulness", "context_recall"]);
        assert_eq!(parsed.cmd.start, 0);
    }

    #[test]
    fn test_mean_score_ignores_unscored_rows() {
        let row = |score: Option<f64>| EvalRow {
            record: QaRecord::default(),
            outcomes: vec![(
                Metric::Faithfulness,
                MetricOutcome {
                    score,
                    detail: Value::Null,
                },
            )],
        };
        let rows = vec![row(Some(1.0)), row(None), row(Some(0.5))];
        assert_eq!(mean_score(&rows, Metric::Faithfulness), Some((0.75, 2)));
        assert_eq!(mean_score(&rows, Metric::ContextRecall), None);
    }
}
