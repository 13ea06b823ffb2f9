//! json3 caption payloads: `{"events": [{"tStartMs", "dDurationMs", "segs": [{"utf8"}]}]}`

use serde::Deserialize;

use super::CaptionSegment;
use crate::PipelineError;

#[derive(Debug, Deserialize)]
struct Json3Payload {
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,

    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,

    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a json3 payload into segments in event order.
///
/// Events with no text are dropped. A body that is not JSON or has no
/// `events` list fails as a whole.
pub fn parse(payload: &str) -> Result<Vec<CaptionSegment>, PipelineError> {
    let parsed: Json3Payload =
        serde_json::from_str(payload).map_err(|e| PipelineError::MalformedCaptionPayload(e.to_string()))?;

    let segments = parsed
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .unwrap_or_default()
                .iter()
                .map(|seg| seg.utf8.replace('\n', " ").trim().to_string())
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            let end_ms = event.start_ms.saturating_add(event.duration_ms);
            CaptionSegment::new(event.start_ms, end_ms, &text)
        })
        .collect();

    Ok(segments)
}
