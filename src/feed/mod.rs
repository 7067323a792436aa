pub mod models;
pub mod parse;

pub use models::{SourceCategory, SourceImage, SourceProduct, SourceVariant};
pub use parse::{FeedError, fetch_feed, parse_feed};
