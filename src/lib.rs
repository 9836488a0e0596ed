//! Crawl a paginated product listing and save one JSON file per item.

pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod pipeline;

pub use config::CrawlConfig;
pub use crawler::{CrawlState, CrawlSummary, Crawler};
pub use error::{CrawlError, Field, ItemError};
pub use matcher::{MarkupNode, MatchError};
pub use pipeline::{ItemPipeline, ItemRecord};
