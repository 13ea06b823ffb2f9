use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::config::ClientConfig;
use crate::extractors::VideoId;
use crate::pipeline::VideoInfo;

/// Talks to a running transcript-api server, the way the desktop viewer does
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(api_url).with_context(|| format!("Invalid API URL: {}", api_url))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))
    }

    /// Fetch `/video-info/{id}`; ids are checked locally before any request
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo> {
        let video_id = VideoId::parse(video_id)?;
        let url = self
            .base_url
            .join(&format!("video-info/{}", urlencoding::encode(video_id.as_str())))
            .context("Failed to build request URL")?;

        tracing::debug!("Requesting {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Network Error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("detail").and_then(|d| d.as_str()).map(str::to_string))
                .unwrap_or_else(|| "Unknown error".to_string());
            anyhow::bail!("API Error: {} - {}", status.as_u16(), detail);
        }

        response
            .json::<VideoInfo>()
            .await
            .context("Failed to decode API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn fake_api() -> String {
        let app = Router::new()
            .route(
                "/video-info/dQw4w9WgXcQ",
                get(|| async {
                    Json(json!({
                        "video_id": "dQw4w9WgXcQ",
                        "video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                        "title": "Remote Video",
                        "duration": 10.0,
                        "uploader": null,
                        "upload_date": null,
                        "view_count": null,
                        "description": null,
                        "has_captions": true,
                        "available_languages": ["en"],
                        "caption_type": "manual",
                        "captions": [{"start": "00:00", "end": "00:02", "text": "hi", "start_ms": 0, "end_ms": 2000}],
                        "success": true,
                        "message": "Found 1 caption segments"
                    }))
                }),
            )
            .route(
                "/video-info/xxxxxxxxxxx",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"detail": "boom"}))) }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_video_info_round_trip() {
        let client = ApiClient::new(&fake_api().await, Duration::from_secs(5)).unwrap();
        let info = client.video_info("dQw4w9WgXcQ").await.unwrap();
        assert_eq!(info.title.as_deref(), Some("Remote Video"));
        assert_eq!(info.captions.len(), 1);
        assert_eq!(info.captions[0].text, "hi");
    }

    #[tokio::test]
    async fn test_api_error_detail_surfaces() {
        let client = ApiClient::new(&fake_api().await, Duration::from_secs(5)).unwrap();
        let err = client.video_info("xxxxxxxxxxx").await.unwrap_err();
        assert_eq!(err.to_string(), "API Error: 500 - boom");
    }

    #[tokio::test]
    async fn test_short_id_rejected_locally() {
        let client = ApiClient::new("http://127.0.0.1:9/", Duration::from_secs(1)).unwrap();
        let err = client.video_info("abc").await.unwrap_err();
        assert!(err.to_string().contains("Must be 11 characters"));
    }
}
