// Remote data sources: MLB Stats API, the daily weather page, and the
// Google Drive CSV mirror.

pub mod drive;
pub mod error;
pub mod http;
pub mod statsapi;
pub mod weather;

pub use error::FeedError;
