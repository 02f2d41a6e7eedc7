// Shared reqwest client construction and GET helper.

use std::time::Duration;

use tracing::debug;

use crate::FeedError;

pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, FeedError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| FeedError::Http {
            url: String::from("<client builder>"),
            source: e,
        })
}

/// GET `url` and return the response if the status is 2xx.
pub async fn get_ok(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, FeedError> {
    debug!("GET {url}");
    let resp = client.get(url).send().await.map_err(|e| FeedError::Http {
        url: url.to_string(),
        source: e,
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

/// GET `url` and return the body as text.
pub async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FeedError> {
    get_ok(client, url)
        .await?
        .text()
        .await
        .map_err(|e| FeedError::Http {
            url: url.to_string(),
            source: e,
        })
}
