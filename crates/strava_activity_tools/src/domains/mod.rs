//! Domain modules for the deterministic part of the pipeline.
//!
//! # Modules
//!
//! - [`normalize`]: Field stripping and metric → display unit conversion
//! - [`export`]: CSV rendering of cleaned activities
//! - [`summary`]: Monday–Sunday week bucketing and statistics

pub mod export;
pub mod normalize;
pub mod summary;

pub use export::to_csv;
pub use normalize::{NormalizedActivity, normalize, normalize_all};
pub use summary::{
    ActivityStats, Summary, SummaryError, SummaryOptions, WeekBucket, Window, WindowBasis,
    group_by_week, summarize,
};
