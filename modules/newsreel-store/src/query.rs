use std::sync::Arc;

use serde::{Deserialize, Serialize};

use newsreel_common::{NewsItem, Scope};

use crate::cursor::{decode_popularity_cursor, decode_time_cursor, encode_cursor};
use crate::error::Result;
use crate::store::NewsStore;

/// Which of the two store orderings a feed read walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedOrdering {
    Time,
    Popularity,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<NewsItem>,
    pub next_cursor: Option<String>,
}

/// Paginated reads against either ordering, consumed by the thin API layer.
pub struct QueryService {
    store: Arc<dyn NewsStore>,
    max_page_size: u32,
}

impl QueryService {
    pub fn new(store: Arc<dyn NewsStore>, max_page_size: u32) -> Self {
        Self {
            store,
            max_page_size,
        }
    }

    /// Read one page. A missing, malformed, or foreign-scope cursor starts
    /// from the top of the ordering; it never fails the request.
    pub async fn query_feed(
        &self,
        scope: &Scope,
        ordering: FeedOrdering,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<FeedPage> {
        let limit = limit.clamp(1, self.max_page_size);

        let items = match ordering {
            FeedOrdering::Time => {
                let after = cursor.and_then(decode_time_cursor);
                self.store.query_by_time(scope, limit, after).await?
            }
            FeedOrdering::Popularity => {
                let after = cursor.and_then(|raw| decode_popularity_cursor(raw, scope));
                self.store
                    .query_by_popularity(scope, limit, after.as_ref().map(|c| c.popularity_key.as_str()))
                    .await?
            }
        };

        // A short page means the ordering is exhausted; no cursor to hand out.
        let next_cursor = if items.len() == limit as usize {
            items
                .last()
                .map(|item| encode_cursor(item, ordering == FeedOrdering::Popularity))
        } else {
            None
        };

        Ok(FeedPage { items, next_cursor })
    }
}
