pub mod enrich;
pub mod error;
pub mod identity;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod process;
pub mod queue;
pub mod reader;
pub mod scraper;
pub mod snapshot;
pub mod sources;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;


pub use error::PipelineError;
