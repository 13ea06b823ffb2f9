use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod json3;
pub mod vtt;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::extractors::{CaptionTrackRef, RawMetadata};
use crate::utils::{collapse_whitespace, format_timestamp};
use crate::PipelineError;

/// The only caption language this service consults
pub const CAPTION_LANGUAGE: &str = "en";

/// Format tags carrying event/segment JSON
const JSON_FORMATS: &[&str] = &["json3", "srv3"];

/// Whether a caption track was written by a human or generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionTrackKind {
    Manual,
    Auto,
}

impl fmt::Display for CaptionTrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptionTrackKind::Manual => write!(f, "manual"),
            CaptionTrackKind::Auto => write!(f, "auto"),
        }
    }
}

/// Wire format of a downloaded caption payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    /// Event/segment JSON (json3 and friends)
    Json,
    /// Line oriented subtitle markup (WebVTT, SRT)
    Markup,
}

impl CaptionFormat {
    /// Pick the parser from the track's format tag, falling back to the response content type
    pub fn detect(ext: &str, content_type: Option<&str>) -> Self {
        let json_tag = JSON_FORMATS.iter().any(|tag| ext.eq_ignore_ascii_case(tag));
        let json_body = content_type.is_some_and(|ct| ct.starts_with("application/json"));

        if json_tag || json_body {
            CaptionFormat::Json
        } else {
            CaptionFormat::Markup
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptionFormat::Json => "JSON",
            CaptionFormat::Markup => "text",
        }
    }
}

/// One normalized caption cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Start as `mm:ss`
    pub start: String,

    /// End as `mm:ss`
    pub end: String,

    /// Whitespace-collapsed, markup-free, never empty
    pub text: String,

    pub start_ms: u64,
    pub end_ms: u64,
}

impl CaptionSegment {
    /// Build a segment, clamping `end_ms` so it never precedes `start_ms`.
    /// Returns `None` when the text is empty after whitespace collapsing.
    pub fn new(start_ms: u64, end_ms: u64, text: &str) -> Option<Self> {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return None;
        }

        let end_ms = end_ms.max(start_ms);
        Some(Self {
            start: format_timestamp(start_ms),
            end: format_timestamp(end_ms),
            text,
            start_ms,
            end_ms,
        })
    }
}

/// Raw caption body as downloaded
#[derive(Debug, Clone)]
pub struct CaptionPayload {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// The track chosen for a video
#[derive(Debug, Clone, Copy)]
pub struct TrackSelection<'a> {
    pub track: &'a CaptionTrackRef,
    pub kind: CaptionTrackKind,
}

/// Outcome of normalizing a video's captions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedCaptions {
    pub segments: Vec<CaptionSegment>,

    /// `None` when no track exists for the caption language
    pub kind: Option<CaptionTrackKind>,

    /// Format the segments were parsed from
    pub format: Option<CaptionFormat>,
}

impl NormalizedCaptions {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn transcript(&self) -> String {
        flatten(&self.segments)
    }
}

/// Choose the caption track to use: manual beats automatic, JSON beats markup.
///
/// Within a track list the first JSON-tagged entry wins, otherwise the first
/// entry in the order the platform listed them.
pub fn select_track<'a>(metadata: &'a RawMetadata, language: &str) -> Option<TrackSelection<'a>> {
    let candidates = [
        (&metadata.subtitles, CaptionTrackKind::Manual),
        (&metadata.automatic_captions, CaptionTrackKind::Auto),
    ];

    let (tracks, kind) = candidates.into_iter().find_map(|(tracks, kind)| {
        tracks
            .get(language)
            .filter(|list| !list.is_empty())
            .map(|list| (list, kind))
    })?;

    let track = tracks
        .iter()
        .find(|track| JSON_FORMATS.iter().any(|tag| track.ext.eq_ignore_ascii_case(tag)))
        .or_else(|| tracks.first())?;

    Some(TrackSelection { track, kind })
}

/// Parse a payload into segments with the algorithm for `format`
pub fn parse_payload(payload: &str, format: CaptionFormat) -> Result<Vec<CaptionSegment>, PipelineError> {
    match format {
        CaptionFormat::Json => json3::parse(payload),
        CaptionFormat::Markup => Ok(vtt::parse(payload)),
    }
}

/// Space-join every segment's text into a single whitespace-normalized transcript
pub fn flatten(segments: &[CaptionSegment]) -> String {
    let joined = segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

/// Selects, downloads and parses caption tracks
pub struct CaptionNormalizer {
    client: Client,
    language: String,
}

impl CaptionNormalizer {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            language: CAPTION_LANGUAGE.to_string(),
        }
    }

    /// Resolve the captions for `metadata`.
    ///
    /// A missing English track is an `Ok` result with `kind: None`, not an error.
    pub async fn normalize(&self, metadata: &RawMetadata) -> Result<NormalizedCaptions, PipelineError> {
        let Some(selection) = select_track(metadata, &self.language) else {
            tracing::debug!("No '{}' caption track listed", self.language);
            return Ok(NormalizedCaptions::default());
        };

        tracing::debug!(
            "Using {} caption track ({}): {}",
            selection.kind,
            selection.track.ext,
            selection.track.url
        );

        let payload = self.download(selection.track).await?;
        let format = CaptionFormat::detect(&selection.track.ext, payload.content_type.as_deref());
        let segments = parse_payload(&payload.body, format)?;

        tracing::debug!("Parsed {} caption segments from {} payload", segments.len(), format.label());

        Ok(NormalizedCaptions {
            segments,
            kind: Some(selection.kind),
            format: Some(format),
        })
    }

    /// Plain GET of the track URL. Anything but 200 is a terminal failure.
    pub async fn download(&self, track: &CaptionTrackRef) -> Result<CaptionPayload, PipelineError> {
        let response = self
            .client
            .get(&track.url)
            .send()
            .await
            .map_err(|e| PipelineError::Unknown(format!("Failed to download captions: {}", e)))?;

        let status = response.status().as_u16();
        if status != 200 {
            tracing::warn!("Caption download returned HTTP {}", status);
            return Err(PipelineError::DownloadFailed { status });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::Unknown(format!("Failed to read caption data: {}", e)))?;

        Ok(CaptionPayload {
            status,
            content_type,
            body,
        })
    }
}

impl Default for CaptionNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{metadata_with, serve_captions, track, JSON3_SAMPLE, VTT_SAMPLE};
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_manual_track_preferred_over_auto() {
        let meta = metadata_with(
            vec![track("https://x/manual.vtt", "vtt")],
            vec![track("https://x/auto.json3", "json3")],
        );

        let selection = select_track(&meta, "en").unwrap();
        assert_eq!(selection.kind, CaptionTrackKind::Manual);
        assert_eq!(selection.track.url, "https://x/manual.vtt");
    }

    #[test]
    fn test_auto_track_used_when_manual_missing_or_empty() {
        let meta = metadata_with(vec![], vec![track("https://x/auto.vtt", "vtt")]);
        let selection = select_track(&meta, "en").unwrap();
        assert_eq!(selection.kind, CaptionTrackKind::Auto);
    }

    #[test]
    fn test_json_track_preferred_within_list() {
        let meta = metadata_with(
            vec![
                track("https://x/a.vtt", "vtt"),
                track("https://x/a.srv3", "srv3"),
                track("https://x/a.json3", "json3"),
            ],
            vec![],
        );
        assert_eq!(select_track(&meta, "en").unwrap().track.ext, "srv3");
    }

    #[test]
    fn test_first_track_when_no_json_format() {
        let meta = metadata_with(
            vec![track("https://x/a.ttml", "ttml"), track("https://x/a.vtt", "vtt")],
            vec![],
        );
        assert_eq!(select_track(&meta, "en").unwrap().track.ext, "ttml");
    }

    #[test]
    fn test_no_english_track_selects_nothing() {
        let mut meta = RawMetadata::default();
        meta.subtitles = BTreeMap::from([("de".to_string(), vec![track("https://x/de.vtt", "vtt")])]);
        meta.automatic_captions = BTreeMap::from([("fr".to_string(), vec![track("https://x/fr.vtt", "vtt")])]);
        assert!(select_track(&meta, "en").is_none());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(CaptionFormat::detect("json3", None), CaptionFormat::Json);
        assert_eq!(CaptionFormat::detect("SRV3", None), CaptionFormat::Json);
        assert_eq!(CaptionFormat::detect("vtt", None), CaptionFormat::Markup);
        assert_eq!(
            CaptionFormat::detect("", Some("application/json; charset=UTF-8")),
            CaptionFormat::Json
        );
        assert_eq!(CaptionFormat::detect("vtt", Some("text/vtt")), CaptionFormat::Markup);
    }

    #[test]
    fn test_segment_clamps_and_rejects_empty() {
        let segment = CaptionSegment::new(5_000, 1_000, " hi \n there ").unwrap();
        assert_eq!(segment.end_ms, 5_000);
        assert_eq!(segment.text, "hi there");
        assert!(CaptionSegment::new(0, 10, " \n ").is_none());
    }

    #[test]
    fn test_flatten_ignores_timestamps() {
        let a = vec![
            CaptionSegment::new(0, 1_000, "hello").unwrap(),
            CaptionSegment::new(1_000, 2_000, "big  world").unwrap(),
        ];
        let b = vec![
            CaptionSegment::new(90_000, 91_000, "hello").unwrap(),
            CaptionSegment::new(95_000, 99_000, "big world").unwrap(),
        ];
        assert_eq!(flatten(&a), "hello big world");
        assert_eq!(flatten(&a), flatten(&b));
        assert_eq!(flatten(&[]), "");
    }

    #[tokio::test]
    async fn test_normalize_json3_track() {
        let base = serve_captions().await;
        let meta = metadata_with(
            vec![],
            vec![
                track(&format!("{}/captions.vtt", base), "vtt"),
                track(&format!("{}/captions.json3", base), "json3"),
            ],
        );

        let result = CaptionNormalizer::new().normalize(&meta).await.unwrap();
        assert_eq!(result.kind, Some(CaptionTrackKind::Auto));
        assert_eq!(result.format, Some(CaptionFormat::Json));
        assert_eq!(result.segments, json3::parse(JSON3_SAMPLE).unwrap());
        assert_eq!(result.transcript(), "Hello there general Kenobi");
    }

    #[tokio::test]
    async fn test_normalize_vtt_track() {
        let base = serve_captions().await;
        let meta = metadata_with(vec![track(&format!("{}/captions.vtt", base), "vtt")], vec![]);

        let result = CaptionNormalizer::new().normalize(&meta).await.unwrap();
        assert_eq!(result.kind, Some(CaptionTrackKind::Manual));
        assert_eq!(result.format, Some(CaptionFormat::Markup));
        assert_eq!(result.segments, vtt::parse(VTT_SAMPLE));
    }

    #[tokio::test]
    async fn test_normalize_is_deterministic() {
        let base = serve_captions().await;
        let meta = metadata_with(vec![track(&format!("{}/captions.json3", base), "json3")], vec![]);

        let normalizer = CaptionNormalizer::new();
        let first = normalizer.normalize(&meta).await.unwrap();
        let second = normalizer.normalize(&meta).await.unwrap();
        assert_eq!(
            serde_json::to_vec(&first.segments).unwrap(),
            serde_json::to_vec(&second.segments).unwrap()
        );
    }

    #[tokio::test]
    async fn test_download_failure_reports_status() {
        let base = serve_captions().await;
        let meta = metadata_with(vec![track(&format!("{}/missing.json3", base), "json3")], vec![]);

        let err = CaptionNormalizer::new().normalize(&meta).await.unwrap_err();
        assert_eq!(err, PipelineError::DownloadFailed { status: 404 });
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_terminal() {
        let base = serve_captions().await;
        let meta = metadata_with(vec![track(&format!("{}/broken.json3", base), "json3")], vec![]);

        let err = CaptionNormalizer::new().normalize(&meta).await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedCaptionPayload(_)));
    }

    #[tokio::test]
    async fn test_no_english_is_empty_result() {
        let result = CaptionNormalizer::new().normalize(&RawMetadata::default()).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(result.kind, None);
        assert_eq!(result.format, None);
    }
}
