// src/models/mod.rs

//! Domain models for the harvester application.

mod config;
mod record;
mod search;
mod source;

// Re-export all public types
pub use config::{Config, ExtractionConfig, HarvesterConfig, KeywordGroup, OutputConfig};
pub use record::{ContentRecord, SourceType};
pub use search::{SearchQuery, SearchResultItem};
pub use source::{
    DetailSelectors, ExtractionRule, FrameRule, RatingRule, ResultSelectors, SearchSourceConfig,
    SourceConfig,
};
