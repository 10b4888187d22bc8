pub mod cursor;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use cursor::{decode_popularity_cursor, decode_time_cursor, encode_cursor, PopularityCursor};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use query::{FeedOrdering, FeedPage, QueryService};
pub use store::{InsertOutcome, NewsStore};
