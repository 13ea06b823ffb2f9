use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub mod youtube;

use crate::config::FetcherConfig;
use crate::PipelineError;

/// Length every YouTube video identifier has
pub const VIDEO_ID_LEN: usize = 11;

/// A validated YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts exactly 11 characters, nothing else is checked
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        if raw.chars().count() != VIDEO_ID_LEN {
            return Err(PipelineError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One retrievable caption resource as listed by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrackRef {
    /// Fetch URL for the caption payload
    pub url: String,

    /// Format tag (json3, srv3, vtt, ttml, ...)
    #[serde(default)]
    pub ext: String,

    /// Display name of the track, when the platform provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Metadata reported by the extraction tool for a single video.
///
/// Field names follow yt-dlp's `--dump-json` output so the struct can be
/// deserialized directly from it; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetadata {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub uploader: Option<String>,

    /// Upload date as reported, `YYYYMMDD`
    #[serde(default)]
    pub upload_date: Option<String>,

    #[serde(default)]
    pub view_count: Option<u64>,

    #[serde(default)]
    pub description: Option<String>,

    /// Human-authored tracks keyed by language code
    #[serde(default, deserialize_with = "nullable_map")]
    pub subtitles: BTreeMap<String, Vec<CaptionTrackRef>>,

    /// Machine-generated tracks keyed by language code
    #[serde(default, deserialize_with = "nullable_map")]
    pub automatic_captions: BTreeMap<String, Vec<CaptionTrackRef>>,
}

// yt-dlp emits `null` instead of `{}` for some extractors
fn nullable_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<CaptionTrackRef>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

impl RawMetadata {
    /// Every caption language code across both track kinds, sorted and de-duplicated
    pub fn caption_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .subtitles
            .keys()
            .chain(self.automatic_captions.keys())
            .cloned()
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }
}

/// An extra request header passed to the extraction tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

/// Request shaping options for a metadata fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Caption languages to request from the platform
    pub preferred_languages: Vec<String>,

    /// Never true for this service; kept explicit so the tool is told to skip media
    pub download_media: bool,

    /// Netscape cookie jar presented as session credentials when the file exists
    pub cookies_file: Option<PathBuf>,

    /// Browser impersonation headers
    pub impersonation_headers: Vec<HttpHeader>,

    /// Suppress tool warnings and progress output
    pub quiet: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            preferred_languages: vec!["en".to_string()],
            download_media: false,
            cookies_file: None,
            impersonation_headers: Vec::new(),
            quiet: true,
        }
    }
}

impl FetchOptions {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            preferred_languages: config.preferred_languages.clone(),
            download_media: false,
            cookies_file: config.cookies_file.clone(),
            impersonation_headers: config.impersonation_headers.clone(),
            quiet: true,
        }
    }

    /// Option set used for the single recovery attempt after a format failure:
    /// no caption request and no extra headers, cookies kept.
    pub fn minimal(&self) -> Self {
        Self {
            preferred_languages: Vec::new(),
            download_media: false,
            cookies_file: self.cookies_file.clone(),
            impersonation_headers: Vec::new(),
            quiet: true,
        }
    }

    /// Cookie jar path, only when the file is actually there
    pub fn existing_cookies_file(&self) -> Option<&PathBuf> {
        self.cookies_file.as_ref().filter(|path| path.is_file())
    }
}

/// Classified failure of a metadata fetch
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("authentication required: {0}")]
    AuthRequired(String),

    #[error("cookies file rejected: {0}")]
    AuthArtifactInvalid(String),

    #[error("requested format unavailable: {0}")]
    FormatUnavailable(String),

    #[error("format recovery failed: {0}")]
    FormatError(String),

    #[error("{0}")]
    Unknown(String),
}

impl From<FetchFailure> for PipelineError {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::AuthRequired(raw) => PipelineError::AuthRequired(raw),
            FetchFailure::AuthArtifactInvalid(raw) => PipelineError::AuthArtifactInvalid(raw),
            FetchFailure::FormatUnavailable(raw) | FetchFailure::FormatError(raw) => {
                PipelineError::FormatError(raw)
            }
            FetchFailure::Unknown(raw) => PipelineError::Unknown(raw),
        }
    }
}

/// Source of raw video metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch platform metadata for a video
    async fn fetch(&self, video_id: &VideoId, options: &FetchOptions) -> Result<RawMetadata, FetchFailure>;

    /// Name of the backing tool, for logs
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_requires_eleven_chars() {
        assert!(VideoId::parse("dQw4w9WgXcQ").is_ok());
        assert_eq!(
            VideoId::parse("short"),
            Err(PipelineError::InvalidIdentifier("short".to_string()))
        );
        assert!(VideoId::parse("").is_err());
        assert!(VideoId::parse("dQw4w9WgXcQx").is_err());
    }

    #[test]
    fn test_watch_url() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_raw_metadata_from_dump_json() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "duration": 212.0,
            "uploader": "Rick Astley",
            "upload_date": "20091025",
            "view_count": 1500000000,
            "formats": [{"format_id": "18"}],
            "subtitles": {"en": [{"ext": "vtt", "url": "https://example.com/en.vtt", "name": "English"}]},
            "automatic_captions": {"de": [{"ext": "json3", "url": "https://example.com/de.json3"}]}
        }"#;

        let meta: RawMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.title.as_deref(), Some("Never Gonna Give You Up"));
        assert_eq!(meta.view_count, Some(1_500_000_000));
        assert_eq!(meta.subtitles["en"][0].ext, "vtt");
        assert_eq!(meta.caption_languages(), vec!["de", "en"]);
        assert!(meta.description.is_none());
    }

    #[test]
    fn test_null_caption_maps_deserialize_empty() {
        let meta: RawMetadata =
            serde_json::from_str(r#"{"title": "x", "subtitles": null, "automatic_captions": null}"#).unwrap();
        assert!(meta.subtitles.is_empty());
        assert!(meta.automatic_captions.is_empty());
    }

    #[test]
    fn test_minimal_options_drop_caption_request() {
        let options = FetchOptions {
            cookies_file: Some(PathBuf::from("cookies.txt")),
            impersonation_headers: vec![HttpHeader {
                name: "User-Agent".to_string(),
                value: "Mozilla/5.0".to_string(),
            }],
            ..FetchOptions::default()
        };

        let minimal = options.minimal();
        assert!(minimal.preferred_languages.is_empty());
        assert!(minimal.impersonation_headers.is_empty());
        assert_eq!(minimal.cookies_file, options.cookies_file);
    }

    #[test]
    fn test_missing_cookies_file_is_ignored() {
        let options = FetchOptions {
            cookies_file: Some(PathBuf::from("/definitely/not/here/cookies.txt")),
            ..FetchOptions::default()
        };
        assert!(options.existing_cookies_file().is_none());
    }

    #[test]
    fn test_format_failures_map_to_format_error() {
        let err: PipelineError = FetchFailure::FormatError("boom".to_string()).into();
        assert_eq!(err, PipelineError::FormatError("boom".to_string()));
    }
}
