// Async record pipeline with a bounded channel for backpressure
//
// record -> enrich -> filter -> (kept) batch -> format -> sink

mod format;

pub use format::{Formatter, JsonLinesFormatter};

use crate::config::{parse_duration, PipelineConfig};
use crate::error::{NetmetaError, Result};
use crate::filtering::{AttributeMap, FilterDecision, MetricTable, Record, RecordFilter};
use crate::sink::Sink;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// One record entering the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEvent {
    #[serde(default)]
    pub record: Record,
    /// Attributes already known for the record; enrichment adds to these
    #[serde(default)]
    pub attrs: AttributeMap,
    #[serde(default)]
    pub metrics: MetricTable,
}

impl RecordEvent {
    pub fn new(record: Record, attrs: AttributeMap) -> Self {
        Self {
            record,
            attrs,
            metrics: MetricTable::new(),
        }
    }
}

/// Tuning knobs for the pipeline worker
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub buffer_size: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let flush_interval = parse_duration(&config.flush_interval)
            .filter(|d| !d.is_zero())
            .ok_or_else(|| NetmetaError::InvalidConfigValue {
                path: "pipeline.flush_interval".to_string(),
                message: format!("Invalid duration format: {}", config.flush_interval),
            })?;

        Ok(Self {
            buffer_size: config.buffer_size,
            batch_size: config.batch_size,
            flush_interval,
        })
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            buffer_size: 10000,
            batch_size: 100,
            flush_interval: Duration::from_secs(5),
        }
    }
}

/// Processing pipeline that filters records and hands kept ones to a sink
pub struct Pipeline {
    /// Channel for receiving records
    record_tx: mpsc::Sender<RecordEvent>,
    /// Handle to the worker task
    worker_handle: Option<tokio::task::JoinHandle<WorkerStats>>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Create a new pipeline; must be called inside a tokio runtime
    pub fn new(
        filter: Arc<RecordFilter>,
        formatter: Arc<dyn Formatter>,
        sink: Arc<dyn Sink>,
        settings: PipelineSettings,
    ) -> Self {
        let (record_tx, record_rx) = mpsc::channel(settings.buffer_size.max(1));

        let worker_handle = Some(tokio::spawn(async move {
            record_worker(record_rx, filter, formatter, sink, settings).await
        }));

        Self {
            record_tx,
            worker_handle,
            settings,
        }
    }

    /// Send a record through the pipeline
    /// Returns an error if the channel is closed
    pub async fn send(&self, event: RecordEvent) -> Result<()> {
        self.record_tx
            .send(event)
            .await
            .map_err(|_| NetmetaError::Pipeline("Pipeline channel closed".to_string()))?;
        Ok(())
    }

    /// Get a sender that can be moved to producer tasks
    pub fn clone_sender(&self) -> mpsc::Sender<RecordEvent> {
        self.record_tx.clone()
    }

    /// Shutdown the pipeline gracefully, draining pending records
    pub async fn shutdown(mut self) -> WorkerStats {
        // Close the sender so worker knows to finish
        drop(self.record_tx);

        match self.worker_handle.take() {
            Some(handle) => {
                tracing::info!("Waiting for pipeline to drain...");
                match handle.await {
                    Ok(stats) => {
                        tracing::info!("Pipeline drained successfully");
                        stats
                    }
                    Err(e) => {
                        tracing::error!("Pipeline worker failed: {}", e);
                        WorkerStats::default()
                    }
                }
            }
            None => WorkerStats::default(),
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }
}

/// Worker that filters records and flushes kept ones in batches
async fn record_worker(
    mut record_rx: mpsc::Receiver<RecordEvent>,
    filter: Arc<RecordFilter>,
    formatter: Arc<dyn Formatter>,
    sink: Arc<dyn Sink>,
    settings: PipelineSettings,
) -> WorkerStats {
    let mut flush_timer = time::interval(settings.flush_interval);
    let mut pending: Vec<AttributeMap> = Vec::new();
    let mut stats = WorkerStats::default();

    loop {
        tokio::select! {
            received = record_rx.recv() => {
                let Some(event) = received else {
                    break;
                };

                if let Some(attrs) = process_record(event, &filter, &mut stats) {
                    pending.push(attrs);
                }

                if pending.len() >= settings.batch_size {
                    flush_batch(&mut pending, formatter.as_ref(), sink.as_ref(), &mut stats);
                }
            }

            // Time-based flush
            _ = flush_timer.tick() => {
                if !pending.is_empty() {
                    flush_batch(&mut pending, formatter.as_ref(), sink.as_ref(), &mut stats);
                }
            }
        }
    }

    // Channel closed, drain remaining
    if !pending.is_empty() {
        tracing::info!("Draining {} pending records", pending.len());
        flush_batch(&mut pending, formatter.as_ref(), sink.as_ref(), &mut stats);
    }
    tracing::info!(
        "Record worker finished: {} kept, {} dropped, {} batches, {} errors",
        stats.kept,
        stats.dropped,
        stats.batches,
        stats.errors
    );

    stats
}

fn process_record(
    event: RecordEvent,
    filter: &RecordFilter,
    stats: &mut WorkerStats,
) -> Option<AttributeMap> {
    let RecordEvent {
        record,
        mut attrs,
        metrics,
    } = event;

    match filter.process(&record, &mut attrs, &metrics) {
        FilterDecision::Keep => {
            stats.kept += 1;
            Some(attrs)
        }
        FilterDecision::Drop => {
            stats.dropped += 1;
            tracing::trace!("Dropped record for interface {:?}", record.interface());
            None
        }
    }
}

/// Format a batch and hand it to the sink
fn flush_batch(
    pending: &mut Vec<AttributeMap>,
    formatter: &dyn Formatter,
    sink: &dyn Sink,
    stats: &mut WorkerStats,
) {
    tracing::debug!("Flushing {} records to {}", pending.len(), sink.name());

    match formatter.format(pending) {
        Ok(payload) => {
            sink.send(payload);
            stats.batches += 1;
        }
        Err(e) => {
            tracing::error!("Failed to format batch: {}", e);
            stats.errors += 1;
        }
    }
    pending.clear();
}

/// Statistics for the record worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub kept: u64,
    pub dropped: u64,
    pub batches: u64,
    pub errors: u64,
}
