// Wires the stages together and drains the enrichment queue. Each queued
// item is handled in its own task under a concurrency cap; a failing item
// goes back on the queue and blocks only itself.

use std::sync::Arc;
use std::sync::Mutex;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use newsreel_common::NewsItem;
use newsreel_store::NewsStore;

use crate::enrich::Summarizer;
use crate::error::Result;
use crate::merge::{MergeOutcome, Merger};
use crate::process::ProcessStage;
use crate::queue::{Delivery, ItemQueue, MAX_DELIVERIES};
use crate::reader::Reader;
use crate::stats::RunStats;

#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerReport {
    pub inserted: usize,
    pub duplicates_merged: usize,
    pub summaries_generated: usize,
    pub failures: usize,
    pub dropped: usize,
}

enum Handled {
    Inserted,
    DuplicateMerged,
}

/// Consumes the enrichment queue: dedup check, summarise fresh items, merge.
pub struct EnrichmentWorker {
    store: Arc<dyn NewsStore>,
    summarizer: Arc<Summarizer>,
    merger: Merger,
    queue: Arc<dyn ItemQueue<NewsItem>>,
    concurrency: usize,
}

impl EnrichmentWorker {
    pub fn new(
        store: Arc<dyn NewsStore>,
        summarizer: Arc<Summarizer>,
        queue: Arc<dyn ItemQueue<NewsItem>>,
        concurrency: usize,
    ) -> Self {
        let merger = Merger::new(store.clone());
        Self {
            store,
            summarizer,
            merger,
            queue,
            concurrency: concurrency.max(1),
        }
    }

    /// Run until the queue is empty, redeliveries included.
    pub async fn drain(&self) -> Result<WorkerReport> {
        let report = Mutex::new(WorkerReport::default());

        loop {
            let mut wave = Vec::new();
            while let Some(delivery) = self.queue.receive().await? {
                wave.push(delivery);
            }
            if wave.is_empty() {
                break;
            }

            stream::iter(wave)
                .for_each_concurrent(self.concurrency, |delivery| {
                    let report = &report;
                    async move {
                        let url = delivery.message.canonical_url.clone();
                        match self.handle(delivery.message.clone()).await {
                            Ok(Handled::Inserted) => {
                                let mut r = report.lock().unwrap();
                                r.inserted += 1;
                                r.summaries_generated += 1;
                            }
                            Ok(Handled::DuplicateMerged) => {
                                report.lock().unwrap().duplicates_merged += 1;
                            }
                            Err(e) if delivery.attempt < MAX_DELIVERIES => {
                                warn!(url, attempt = delivery.attempt, error = %e, "Item failed, requeueing");
                                report.lock().unwrap().failures += 1;
                                let redelivery = Delivery {
                                    message: delivery.message,
                                    attempt: delivery.attempt + 1,
                                };
                                if let Err(e) = self.queue.requeue(redelivery).await {
                                    error!(url, error = %e, "Requeue failed, item lost");
                                    report.lock().unwrap().dropped += 1;
                                }
                            }
                            Err(e) => {
                                error!(url, attempt = delivery.attempt, error = %e, "Item failed on final delivery, dropping");
                                report.lock().unwrap().dropped += 1;
                            }
                        }
                    }
                })
                .await;
        }

        Ok(report.into_inner().unwrap())
    }

    async fn handle(&self, mut item: NewsItem) -> Result<Handled> {
        // Dedup gate: an already-stored story skips enrichment entirely and
        // only contributes its category tags.
        if let Some(existing) = self
            .store
            .find_by_hash(&item.scope, &item.identity_hash)
            .await?
        {
            self.store
                .merge_categories(&item.scope, existing.time_ordered_id, &item.categories)
                .await?;
            return Ok(Handled::DuplicateMerged);
        }

        item.summary = self.summarizer.summarise(&item).await?;
        match self.merger.merge(&item).await? {
            MergeOutcome::Inserted => Ok(Handled::Inserted),
            // Lost a race with a concurrent worker on the same story.
            MergeOutcome::CategoriesMerged => Ok(Handled::DuplicateMerged),
        }
    }
}

/// One full ingestion cycle over every registered source.
pub struct Pipeline {
    reader: Reader,
    process: ProcessStage,
    worker: EnrichmentWorker,
    store: Arc<dyn NewsStore>,
    source_ids: Vec<String>,
}

impl Pipeline {
    pub fn new(
        reader: Reader,
        process: ProcessStage,
        worker: EnrichmentWorker,
        store: Arc<dyn NewsStore>,
        source_ids: Vec<String>,
    ) -> Self {
        Self {
            reader,
            process,
            worker,
            store,
            source_ids,
        }
    }

    pub async fn run_cycle(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        for source_id in &self.source_ids {
            match self.reader.read_source(source_id).await {
                Ok(key) => match self.process.run(&key).await {
                    Ok(report) => {
                        stats.feeds_read += 1;
                        stats.items_enqueued += report.enqueued;
                        stats.items_invalid += report.invalid;
                    }
                    Err(e) => {
                        warn!(source = %source_id, error = %e, "Process stage failed for source");
                        stats.failures += 1;
                    }
                },
                Err(e) => {
                    warn!(source = %source_id, error = %e, "Reader stage failed for source");
                    stats.failures += 1;
                }
            }
        }

        let report = self.worker.drain().await?;
        stats.inserted = report.inserted;
        stats.duplicates_merged = report.duplicates_merged;
        stats.summaries_generated = report.summaries_generated;
        stats.failures += report.failures;
        stats.dropped = report.dropped;

        stats.purged = self.store.purge_expired(Utc::now()).await?;

        info!(%stats, "Ingestion cycle complete");
        Ok(stats)
    }
}
