use std::fmt;

/// Counters for one ingestion cycle, logged at the end of the run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub feeds_read: usize,
    pub items_enqueued: usize,
    pub items_invalid: usize,
    pub inserted: usize,
    pub duplicates_merged: usize,
    pub summaries_generated: usize,
    pub failures: usize,
    pub dropped: usize,
    pub purged: u64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "feeds={} enqueued={} invalid={} inserted={} merged={} summarized={} failures={} dropped={} purged={}",
            self.feeds_read,
            self.items_enqueued,
            self.items_invalid,
            self.inserted,
            self.duplicates_merged,
            self.summaries_generated,
            self.failures,
            self.dropped,
            self.purged,
        )
    }
}
