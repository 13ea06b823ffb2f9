//! Transcript API - metadata and caption transcripts for YouTube videos
//!
//! This library resolves a video identifier into platform metadata (via yt-dlp),
//! picks an English caption track, downloads it and normalizes it into timestamped
//! segments regardless of whether the platform served json3 or WebVTT captions.

pub mod captions;
pub mod cli;
pub mod client;
pub mod config;
pub mod cookies;
pub mod extractors;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod utils;

pub use captions::{CaptionNormalizer, CaptionSegment, CaptionTrackKind, NormalizedCaptions};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extractors::{FetchFailure, FetchOptions, MetadataProvider, RawMetadata, VideoId};
pub use pipeline::{TranscriptPipeline, VideoInfo, VideoResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error conditions the pipeline can run into.
///
/// None of these ever escape [`TranscriptPipeline`]; each one is folded into a
/// `success: false` result carrying [`PipelineError::user_message`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Invalid video ID '{0}'. Must be 11 characters.")]
    InvalidIdentifier(String),

    #[error("HTTP {status}: Failed to download captions")]
    DownloadFailed { status: u16 },

    #[error("Invalid JSON format in captions: {0}")]
    MalformedCaptionPayload(String),

    #[error("YouTube requires authentication: {0}")]
    AuthRequired(String),

    #[error("Cookies file rejected: {0}")]
    AuthArtifactInvalid(String),

    #[error("Requested format is not available: {0}")]
    FormatError(String),

    #[error("{0}")]
    Unknown(String),
}

impl PipelineError {
    /// Human readable message handed back to API callers
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::AuthRequired(_) => {
                "YouTube is asking to sign in to confirm this is not a bot. \
                 Refresh cookies.txt (transcript-api cookies refresh --browser <name>) and retry."
                    .to_string()
            }
            PipelineError::AuthArtifactInvalid(_) => {
                "The cookies file is invalid or expired. \
                 Regenerate cookies.txt from a logged-in browser session and retry."
                    .to_string()
            }
            PipelineError::FormatError(raw) => {
                format!("Requested format is not available and metadata recovery failed: {}", raw)
            }
            PipelineError::Unknown(raw) => format!("Exception: {}", raw),
            other => other.to_string(),
        }
    }
}
