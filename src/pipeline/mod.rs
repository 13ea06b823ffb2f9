use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::captions::{CaptionNormalizer, CaptionSegment, CaptionTrackKind, NormalizedCaptions};
use crate::config::Config;
use crate::extractors::youtube::YtDlpProvider;
use crate::extractors::{FetchOptions, MetadataProvider, RawMetadata, VideoId};
use crate::utils::truncate_chars;
use crate::PipelineError;

/// Descriptions in [`VideoInfo`] are cut to this many characters
pub const DESCRIPTION_LIMIT: usize = 500;

const NO_ENGLISH_MESSAGE: &str = "No English captions available for this video";

/// Transcript lookup outcome, one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
    pub video_url: String,
    pub video_name: String,
    pub transcript: String,
    pub success: bool,
    pub message: Option<String>,
    pub caption_type: Option<CaptionTrackKind>,
}

/// Metadata probe with timestamped captions; succeeds without captions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub video_url: String,
    pub title: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub upload_date: Option<String>,
    pub view_count: Option<u64>,
    pub description: Option<String>,
    pub has_captions: bool,
    pub available_languages: Vec<String>,
    pub caption_type: Option<CaptionTrackKind>,
    pub captions: Vec<CaptionSegment>,
    pub success: bool,
    pub message: Option<String>,
}

/// Identifier → metadata → captions
pub struct TranscriptPipeline {
    provider: Arc<dyn MetadataProvider>,
    normalizer: CaptionNormalizer,
    options: FetchOptions,
}

impl TranscriptPipeline {
    /// Pipeline backed by yt-dlp, configured once from `config`
    pub fn new(config: &Config) -> Self {
        Self::with_provider(
            Arc::new(YtDlpProvider::with_path(config.fetcher.yt_dlp_path.clone())),
            CaptionNormalizer::new(),
            FetchOptions::from_config(&config.fetcher),
        )
    }

    pub fn with_provider(
        provider: Arc<dyn MetadataProvider>,
        normalizer: CaptionNormalizer,
        options: FetchOptions,
    ) -> Self {
        Self {
            provider,
            normalizer,
            options,
        }
    }

    /// Flattened transcript for a raw identifier.
    ///
    /// The only `Err` is [`PipelineError::InvalidIdentifier`], raised before any
    /// network access; every other condition is a `success: false` result.
    pub async fn transcript(&self, video_id: &str) -> Result<VideoResult, PipelineError> {
        let video_id = VideoId::parse(video_id)?;
        Ok(self.transcript_for(&video_id).await)
    }

    /// Metadata probe for a raw identifier. Same error contract as [`Self::transcript`].
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo, PipelineError> {
        let video_id = VideoId::parse(video_id)?;
        Ok(self.video_info_for(&video_id).await)
    }

    pub async fn transcript_for(&self, video_id: &VideoId) -> VideoResult {
        let video_url = video_id.watch_url();

        let metadata = match self.fetch_metadata(video_id).await {
            Ok(metadata) => metadata,
            Err(err) => {
                return VideoResult {
                    video_url,
                    video_name: "Error occurred".to_string(),
                    transcript: "Error processing video".to_string(),
                    success: false,
                    message: Some(err.user_message()),
                    caption_type: None,
                }
            }
        };

        let video_name = metadata.title.clone().unwrap_or_else(|| "Unknown Title".to_string());
        let failed = |transcript: &str, message: String| VideoResult {
            video_url: video_url.clone(),
            video_name: video_name.clone(),
            transcript: transcript.to_string(),
            success: false,
            message: Some(message),
            caption_type: None,
        };

        match self.normalizer.normalize(&metadata).await {
            Ok(NormalizedCaptions { kind: None, .. }) => {
                failed("No English transcripts found", NO_ENGLISH_MESSAGE.to_string())
            }
            Ok(captions) if captions.is_empty() => {
                failed("No caption text found", "No text content found in captions".to_string())
            }
            Ok(captions) => {
                let source = captions.format.map(|f| f.label()).unwrap_or("text");
                tracing::info!("Extracted {} caption segments for {}", captions.segments.len(), video_id);
                VideoResult {
                    transcript: captions.transcript(),
                    success: true,
                    message: Some(format!("Transcript extracted successfully from {} captions", source)),
                    caption_type: captions.kind,
                    video_url: video_url.clone(),
                    video_name: video_name.clone(),
                }
            }
            Err(err) => {
                tracing::warn!("Caption resolution failed for {}: {}", video_id, err);
                let transcript = match err {
                    PipelineError::DownloadFailed { .. } => "Failed to download caption data",
                    PipelineError::MalformedCaptionPayload(_) => "Failed to parse JSON captions",
                    _ => "Error processing video",
                };
                failed(transcript, err.user_message())
            }
        }
    }

    pub async fn video_info_for(&self, video_id: &VideoId) -> VideoInfo {
        let mut info = VideoInfo {
            video_id: video_id.to_string(),
            video_url: video_id.watch_url(),
            title: None,
            duration: None,
            uploader: None,
            upload_date: None,
            view_count: None,
            description: None,
            has_captions: false,
            available_languages: Vec::new(),
            caption_type: None,
            captions: Vec::new(),
            success: false,
            message: None,
        };

        let metadata = match self.fetch_metadata(video_id).await {
            Ok(metadata) => metadata,
            Err(err) => {
                info.message = Some(err.user_message());
                return info;
            }
        };

        info.available_languages = metadata.caption_languages();
        info.has_captions = !info.available_languages.is_empty();
        info.success = true;

        match self.normalizer.normalize(&metadata).await {
            Ok(NormalizedCaptions { kind: None, .. }) => {
                info.message = Some(NO_ENGLISH_MESSAGE.to_string());
            }
            Ok(captions) => {
                info.message = Some(format!("Found {} caption segments", captions.segments.len()));
                info.caption_type = captions.kind;
                info.captions = captions.segments;
            }
            Err(err) => {
                tracing::warn!("Caption resolution failed for {}: {}", video_id, err);
                info.message = Some(err.user_message());
            }
        }

        info.title = metadata.title;
        info.duration = metadata.duration;
        info.uploader = metadata.uploader;
        info.upload_date = metadata.upload_date;
        info.view_count = metadata.view_count;
        info.description = metadata
            .description
            .map(|description| truncate_chars(&description, DESCRIPTION_LIMIT));

        info
    }

    async fn fetch_metadata(&self, video_id: &VideoId) -> Result<RawMetadata, PipelineError> {
        tracing::info!("Fetching metadata for {} via {}", video_id, self.provider.provider_name());

        self.provider.fetch(video_id, &self.options).await.map_err(|failure| {
            tracing::warn!("Metadata fetch failed for {}: {}", video_id, failure);
            PipelineError::from(failure)
        })
    }
}
