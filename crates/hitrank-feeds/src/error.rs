// Error type shared by every feed.

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {origin}: {source}")]
    Decode {
        origin: String,
        source: serde_json::Error,
    },

    #[error("{url} returned an empty body")]
    Empty { url: String },

    #[error("{url} returned an HTML page instead of CSV data")]
    NotCsv { url: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid CSS selector `{0}`")]
    Selector(String),
}
