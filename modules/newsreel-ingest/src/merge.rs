// Final write stage. The insert is conditional on the identity hash, so
// concurrent workers racing on the same story converge: one wins the row,
// the rest fold their category tags into it.

use std::sync::Arc;

use tracing::debug;

use newsreel_common::NewsItem;
use newsreel_store::{InsertOutcome, NewsStore};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    CategoriesMerged,
}

pub struct Merger {
    store: Arc<dyn NewsStore>,
}

impl Merger {
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self { store }
    }

    /// Insert a new item, or union categories into the already-stored copy.
    /// The stored item's id, summary, and metrics are never touched on the
    /// merge path.
    pub async fn merge(&self, item: &NewsItem) -> Result<MergeOutcome> {
        match self.store.insert_new(item).await? {
            InsertOutcome::Inserted => {
                debug!(url = %item.canonical_url, id = %item.time_ordered_id, "Inserted new item");
                Ok(MergeOutcome::Inserted)
            }
            InsertOutcome::AlreadyExists(existing) => {
                self.store
                    .merge_categories(&item.scope, existing.time_ordered_id, &item.categories)
                    .await?;
                debug!(
                    url = %item.canonical_url,
                    id = %existing.time_ordered_id,
                    "Item already stored, merged categories"
                );
                Ok(MergeOutcome::CategoriesMerged)
            }
        }
    }
}
