//! Shared caption payloads and an in-process caption host for tests.

use axum::http::header;
use axum::routing::get;
use axum::Router;
use std::collections::BTreeMap;
use tokio::net::TcpListener;

use crate::extractors::{CaptionTrackRef, RawMetadata};

pub const JSON3_SAMPLE: &str = r#"{
  "wireMagic": "pb3",
  "events": [
    {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello"}, {"utf8": " there"}]},
    {"tStartMs": 1500, "dDurationMs": 2000, "aAppend": 1, "segs": [{"utf8": "\n"}]},
    {"tStartMs": 61000, "segs": [{"utf8": "general\nKenobi"}]},
    {"tStartMs": 70000, "dDurationMs": 500}
  ]
}"#;

pub const VTT_SAMPLE: &str = "WEBVTT\n\
Kind: captions\n\
Language: en\n\
\n\
1\n\
00:00:01.000 --> 00:00:03.500 align:start position:0%\n\
<c.colorE5E5E5>Hello</c> <00:00:02.000><c>world</c>\n\
\n\
00:01:02.500 --> 00:01:04.000\n\
Tom &amp; Jerry\n\
second line\n\
\n\
03:00.000 --> 03:01.000\n\
42\n\
\n\
00:03:05.000 --> 00:03:06.000\n\
the end\n";

pub fn track(url: &str, ext: &str) -> CaptionTrackRef {
    CaptionTrackRef {
        url: url.to_string(),
        ext: ext.to_string(),
        name: None,
    }
}

/// Metadata with the given English manual and automatic track lists
pub fn metadata_with(manual: Vec<CaptionTrackRef>, auto: Vec<CaptionTrackRef>) -> RawMetadata {
    RawMetadata {
        id: Some("dQw4w9WgXcQ".to_string()),
        title: Some("Test Video".to_string()),
        duration: Some(212.0),
        uploader: Some("Uploader".to_string()),
        upload_date: Some("20091025".to_string()),
        view_count: Some(42),
        description: Some("A description".to_string()),
        subtitles: BTreeMap::from([("en".to_string(), manual)]),
        automatic_captions: BTreeMap::from([("en".to_string(), auto)]),
    }
}

/// Serve the sample payloads on a random local port and return its base URL.
///
/// Routes: `/captions.json3`, `/captions.vtt`, `/broken.json3`, `/empty.vtt`; everything else is 404.
pub async fn serve_captions() -> String {
    let app = Router::new()
        .route(
            "/captions.json3",
            get(|| async { ([(header::CONTENT_TYPE, "application/json; charset=UTF-8")], JSON3_SAMPLE) }),
        )
        .route(
            "/captions.vtt",
            get(|| async { ([(header::CONTENT_TYPE, "text/vtt; charset=utf-8")], VTT_SAMPLE) }),
        )
        .route(
            "/broken.json3",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "{\"events\": [") }),
        )
        .route(
            "/empty.vtt",
            get(|| async { ([(header::CONTENT_TYPE, "text/vtt")], "WEBVTT\nKind: captions\n\n") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
