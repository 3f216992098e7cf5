use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::SampleRequest;
use crate::domain::{DatasetKind, JsonStyle, KeyRule, SAMPLING_RATE};
use crate::error::SampleError;
use crate::sampler::sample_document;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct SampleOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleResult {
    pub items: Vec<SampleReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleReport {
    pub dataset: DatasetKind,
    pub input: String,
    pub output: String,
    pub rule: KeyRule,
    pub style: JsonStyle,
    pub entries_in: usize,
    pub entries_out: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_in: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_out: Option<usize>,
    pub action: String,
    pub elapsed_ms: u128,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub data_root: String,
    pub datasets: Vec<ListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub dataset: DatasetKind,
    pub rule: KeyRule,
    pub style: JsonStyle,
    pub input: String,
    pub output: String,
    pub input_exists: bool,
    pub output_exists: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub dataset: DatasetKind,
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App {
    store: Store,
}

impl App {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Samples each request in order. The first failure aborts the run.
    pub fn sample(
        &self,
        requests: &[SampleRequest],
        options: &SampleOptions,
        sink: &dyn ProgressSink,
    ) -> Result<SampleResult, SampleError> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            items.push(self.sample_single(request, options, sink)?);
        }
        Ok(SampleResult { items })
    }

    pub fn list(&self) -> ListResult {
        let datasets = DatasetKind::ALL
            .into_iter()
            .map(|dataset| {
                let input = self.store.input_path(dataset);
                let output = self.store.output_path(dataset);
                ListEntry {
                    dataset,
                    rule: dataset.rule(),
                    style: dataset.style(),
                    input_exists: input.as_std_path().is_file(),
                    output_exists: output.as_std_path().is_file(),
                    input: input.into_string(),
                    output: output.into_string(),
                }
            })
            .collect();
        ListResult {
            data_root: self.store.data_root().to_string(),
            datasets,
        }
    }

    fn sample_single(
        &self,
        request: &SampleRequest,
        options: &SampleOptions,
        sink: &dyn ProgressSink,
    ) -> Result<SampleReport, SampleError> {
        let dataset = request.dataset;
        let rule = dataset.rule();
        let style = dataset.style();
        let input = self.store.resolve(&request.input);
        let output = self.store.resolve(&request.output);
        let start = Instant::now();

        sink.event(ProgressEvent {
            dataset,
            message: format!("phase=Read; loading {input}"),
            elapsed: None,
        });
        let document = Store::read_document(&input)?;
        debug!(
            %dataset,
            %input,
            read_ms = start.elapsed().as_millis() as u64,
            "document loaded"
        );

        sink.event(ProgressEvent {
            dataset,
            message: format!("phase=Filter; rule={rule} rate=1/{SAMPLING_RATE}"),
            elapsed: Some(start.elapsed()),
        });
        let sampled = sample_document(rule, document, &input)?;

        let action = if options.dry_run {
            "dry-run"
        } else {
            sink.event(ProgressEvent {
                dataset,
                message: format!("phase=Write; {output} style={style}"),
                elapsed: Some(start.elapsed()),
            });
            Store::write_document(&output, &sampled.data, style)?;
            "written"
        };

        let elapsed = start.elapsed();
        let stats = sampled.stats;
        info!(
            %dataset,
            entries_in = stats.entries_in,
            entries_out = stats.entries_out,
            records_in = ?stats.records_in,
            records_out = ?stats.records_out,
            action,
            elapsed_ms = elapsed.as_millis() as u64,
            "dataset sampled"
        );
        sink.event(ProgressEvent {
            dataset,
            message: format!(
                "phase=Done; kept {} of {} entries",
                stats.entries_out, stats.entries_in
            ),
            elapsed: Some(elapsed),
        });

        Ok(SampleReport {
            dataset,
            input: input.into_string(),
            output: output.into_string(),
            rule,
            style,
            entries_in: stats.entries_in,
            entries_out: stats.entries_out,
            records_in: stats.records_in,
            records_out: stats.records_out,
            action: action.to_string(),
            elapsed_ms: elapsed.as_millis(),
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
