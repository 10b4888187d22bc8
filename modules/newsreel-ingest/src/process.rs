// Process stage: read a snapshot back, validate each record, assign
// identity and ordering keys, and enqueue for enrichment. Invalid records
// are counted and dropped, never fatal for the batch.

use std::sync::Arc;

use tracing::{info, warn};

use newsreel_common::{NewsItem, RawItem, Validated};

use crate::error::{PipelineError, Result};
use crate::identity;
use crate::queue::ItemQueue;
use crate::snapshot::ObjectStore;

pub struct ProcessStage {
    snapshots: Arc<dyn ObjectStore>,
    queue: Arc<dyn ItemQueue<NewsItem>>,
    retention_days: i64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessReport {
    pub enqueued: usize,
    pub invalid: usize,
}

impl ProcessStage {
    pub fn new(
        snapshots: Arc<dyn ObjectStore>,
        queue: Arc<dyn ItemQueue<NewsItem>>,
        retention_days: i64,
    ) -> Self {
        Self {
            snapshots,
            queue,
            retention_days,
        }
    }

    pub async fn run(&self, snapshot_key: &str) -> Result<ProcessReport> {
        let body = self
            .snapshots
            .get(snapshot_key)
            .await?
            .ok_or_else(|| PipelineError::Snapshot(format!("no snapshot at {snapshot_key}")))?;
        let batch: Vec<RawItem> = serde_json::from_slice(&body)
            .map_err(|e| PipelineError::Snapshot(format!("decode snapshot {snapshot_key}: {e}")))?;

        let mut report = ProcessReport::default();
        for raw in batch {
            match raw.validate() {
                Validated::Valid(raw) => {
                    let item = identity::assemble(raw, self.retention_days);
                    self.queue.send(item).await?;
                    report.enqueued += 1;
                }
                Validated::Invalid { item, reason } => {
                    warn!(
                        source = %item.source_id,
                        url = %item.canonical_url,
                        reason,
                        "Dropping invalid feed item"
                    );
                    report.invalid += 1;
                }
            }
        }

        info!(
            key = snapshot_key,
            enqueued = report.enqueued,
            invalid = report.invalid,
            "Processed snapshot"
        );
        Ok(report)
    }
}
