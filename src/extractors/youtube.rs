use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{FetchFailure, FetchOptions, MetadataProvider, RawMetadata, VideoId};

/// YouTube metadata provider backed by yt-dlp
pub struct YtDlpProvider {
    yt_dlp_path: String,
}

impl YtDlpProvider {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    pub fn with_path(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Command line for a metadata dump with the given options
    pub fn build_args(&self, url: &str, options: &FetchOptions) -> Vec<String> {
        let mut args: Vec<String> = vec!["--dump-json".into(), "--no-playlist".into()];

        if !options.download_media {
            args.push("--skip-download".into());
        }

        if options.quiet {
            args.push("--quiet".into());
            args.push("--no-warnings".into());
        }

        if !options.preferred_languages.is_empty() {
            args.push("--write-subs".into());
            args.push("--write-auto-subs".into());
            args.push("--sub-langs".into());
            args.push(options.preferred_languages.join(","));
        }

        if let Some(cookies) = options.existing_cookies_file() {
            args.push("--cookies".into());
            args.push(cookies.to_string_lossy().into_owned());
        }

        for header in &options.impersonation_headers {
            args.push("--add-header".into());
            args.push(format!("{}:{}", header.name, header.value));
        }

        args.push(url.to_string());
        args
    }

    /// Run yt-dlp once and classify any failure
    async fn dump_metadata(&self, url: &str, options: &FetchOptions) -> Result<RawMetadata, FetchFailure> {
        let args = self.build_args(url, options);
        tracing::debug!("Running {} {}", self.yt_dlp_path, args.join(" "));

        let output = Command::new(&self.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FetchFailure::Unknown(format!("Failed to run {}: {}", self.yt_dlp_path, e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(error.trim()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchFailure::Unknown(format!("Unreadable yt-dlp output: {}", e)))
    }
}

#[async_trait]
impl MetadataProvider for YtDlpProvider {
    async fn fetch(&self, video_id: &VideoId, options: &FetchOptions) -> Result<RawMetadata, FetchFailure> {
        let url = video_id.watch_url();

        if options.cookies_file.is_some() && options.existing_cookies_file().is_none() {
            tracing::debug!("Cookies file not found, fetching {} unauthenticated", video_id);
        }

        match self.dump_metadata(&url, options).await {
            Err(FetchFailure::FormatUnavailable(raw)) => {
                tracing::warn!("Format negotiation failed for {}, retrying with minimal options: {}", video_id, raw);
                self.dump_metadata(&url, &options.minimal())
                    .await
                    .map_err(|failure| FetchFailure::FormatError(failure.to_string()))
            }
            other => other,
        }
    }

    fn provider_name(&self) -> &'static str {
        "yt-dlp"
    }
}

impl Default for YtDlpProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Map yt-dlp's free-text failure output onto a [`FetchFailure`].
///
/// Best effort only: upstream wording changes land in `Unknown`. The bot
/// challenge mentions `--cookies` in its hint, so it is checked before the
/// cookie-file case.
pub fn classify_failure(stderr: &str) -> FetchFailure {
    let lower = stderr.to_lowercase();
    let raw = stderr.to_string();

    const AUTH_MARKERS: &[&str] = &[
        "sign in to confirm",
        "not a bot",
        "login required",
        "use --cookies-from-browser or --cookies for the authentication",
    ];
    const FORMAT_MARKERS: &[&str] = &["requested format is not available", "no video formats found"];

    if AUTH_MARKERS.iter().any(|marker| lower.contains(marker)) {
        FetchFailure::AuthRequired(raw)
    } else if lower.contains("cookie") {
        FetchFailure::AuthArtifactInvalid(raw)
    } else if FORMAT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        FetchFailure::FormatUnavailable(raw)
    } else {
        FetchFailure::Unknown(raw)
    }
}
