// Google Drive mirror of the stat CSVs, refreshed by `hitrank update`.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use hitrank_core::config::{Config, DataPaths};

use crate::http;
use crate::FeedError;

pub fn download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={file_id}")
}

/// Drive answers large or private files with an HTML interstitial page
/// and a 200 status.
pub fn looks_like_html(content_type: Option<&str>, body: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().starts_with("text/html")) {
        return true;
    }
    let head = String::from_utf8_lossy(&body[..body.len().min(512)]);
    let head = head.trim_start().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

async fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), FeedError> {
    let write_err = |source| FeedError::Write {
        path: dest.display().to_string(),
        source,
    };
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let mut tmp = dest.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, dest).await.map_err(write_err)?;
    Ok(())
}

/// Accept only a 200 with a non-empty, non-HTML body.
fn check_download(url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Result<(), FeedError> {
    if status != 200 {
        return Err(FeedError::Status {
            url: url.to_string(),
            status,
        });
    }
    if body.is_empty() {
        return Err(FeedError::Empty { url: url.to_string() });
    }
    if looks_like_html(content_type, body) {
        return Err(FeedError::NotCsv { url: url.to_string() });
    }
    Ok(())
}

/// Download one Drive file to `dest` and return the number of bytes written.
pub async fn download_csv(client: &reqwest::Client, file_id: &str, dest: &Path) -> Result<usize, FeedError> {
    let url = download_url(file_id);
    let resp = http::get_ok(client, &url).await?;
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp.bytes().await.map_err(|e| FeedError::Http {
        url: url.clone(),
        source: e,
    })?;

    check_download(&url, status, content_type.as_deref(), &body)?;

    write_atomic(dest, &body).await?;
    Ok(body.len())
}

/// Result of refreshing one table.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub table: String,
    pub dest: PathBuf,
    pub result: Result<usize, FeedError>,
}

/// Run `download(file_id, dest)` for every configured table, recording each
/// result. A failure never stops the remaining downloads.
async fn update_each<F, Fut>(
    files: &BTreeMap<String, String>,
    paths: &DataPaths,
    mut download: F,
) -> Vec<UpdateOutcome>
where
    F: FnMut(String, PathBuf) -> Fut,
    Fut: Future<Output = Result<usize, FeedError>>,
{
    let mut outcomes = Vec::new();
    for (table, file_id) in files {
        // Keys are checked against the known tables when the config loads.
        let Some(dest) = paths.path_for(table) else {
            continue;
        };
        let dest = PathBuf::from(dest);
        let result = download(file_id.clone(), dest.clone()).await;
        match &result {
            Ok(bytes) => info!("updated {table}: {bytes} bytes -> {}", dest.display()),
            Err(e) => warn!("failed to update {table}: {e}"),
        }
        outcomes.push(UpdateOutcome {
            table: table.clone(),
            dest,
            result,
        });
    }
    outcomes
}

/// Refresh every table that has a Drive file id configured.
pub async fn update_all(config: &Config) -> Result<Vec<UpdateOutcome>, FeedError> {
    let api = &config.sources.statsapi;
    let client = http::build_client(&api.user_agent, Duration::from_secs(api.timeout_secs))?;
    let client = &client;

    let outcomes = update_each(
        &config.sources.drive.files,
        &config.sources.data_paths,
        |file_id, dest| async move { download_csv(client, &file_id, &dest).await },
    )
    .await;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_uses_export_endpoint() {
        assert_eq!(
            download_url("abc123"),
            "https://drive.google.com/uc?export=download&id=abc123"
        );
    }

    #[test]
    fn html_is_detected_by_header_or_body() {
        assert!(looks_like_html(Some("text/html; charset=utf-8"), b"anything"));
        assert!(looks_like_html(None, b"  <!DOCTYPE html><html></html>"));
        assert!(looks_like_html(Some("application/octet-stream"), b"<html><body>quota</body></html>"));
        assert!(!looks_like_html(Some("text/csv"), b"last_name, first_name,avg_hit_speed\n"));
        assert!(!looks_like_html(None, b""));
    }

    #[test]
    fn only_a_200_with_csv_body_is_accepted() {
        let url = "https://drive.google.com/uc?export=download&id=x";
        assert!(check_download(url, 200, Some("text/csv"), b"a,b\n1,2\n").is_ok());
        assert!(matches!(
            check_download(url, 204, None, b""),
            Err(FeedError::Status { status: 204, .. })
        ));
        assert!(matches!(
            check_download(url, 200, Some("text/csv"), b""),
            Err(FeedError::Empty { .. })
        ));
        assert!(matches!(
            check_download(url, 200, Some("text/html"), b"<html></html>"),
            Err(FeedError::NotCsv { .. })
        ));
    }

    #[tokio::test]
    async fn one_failed_download_does_not_stop_the_rest() {
        let files: BTreeMap<String, String> = [
            ("batted_ball".to_string(), "bad-id".to_string()),
            ("exit_batters".to_string(), "good-id".to_string()),
        ]
        .into_iter()
        .collect();
        let paths = DataPaths {
            expected_batters: "data/expected_batters.csv".into(),
            exit_batters: "data/exit_batters.csv".into(),
            expected_pitchers: "data/expected_pitchers.csv".into(),
            exit_pitchers: "data/exit_pitchers.csv".into(),
            batted_ball: "data/batted_ball.csv".into(),
            handedness: "data/handedness.csv".into(),
        };

        let mut requested = Vec::new();
        let outcomes = update_each(&files, &paths, |file_id, _dest| {
            requested.push(file_id.clone());
            async move {
                if file_id == "bad-id" {
                    Err(FeedError::NotCsv { url: download_url(&file_id) })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(requested, vec!["bad-id", "good-id"]);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].table, "batted_ball");
        assert!(matches!(outcomes[0].result, Err(FeedError::NotCsv { .. })));
        assert_eq!(outcomes[1].table, "exit_batters");
        assert_eq!(outcomes[1].dest, PathBuf::from("data/exit_batters.csv"));
        assert!(matches!(outcomes[1].result, Ok(42)));
    }

    #[tokio::test]
    async fn atomic_write_replaces_destination() {
        let dir = std::env::temp_dir().join(format!("hitrank-drive-{}", std::process::id()));
        let dest = dir.join("nested").join("table.csv");
        write_atomic(&dest, b"a,b\n1,2\n").await.unwrap();
        write_atomic(&dest, b"a,b\n3,4\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "a,b\n3,4\n");
        assert!(!dest.with_extension("csv.part").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
