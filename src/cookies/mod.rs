//! Netscape cookie jar helpers.
//!
//! The pipeline only ever checks whether the jar exists. Everything here serves
//! the `cookies` subcommand and the `/cookies/status` endpoint.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;
use tokio::process::Command;

use crate::utils::check_command_available;

/// Zero-based column holding the expiry epoch in a Netscape cookie line
pub const EXPIRY_COLUMN: usize = 4;

/// Video used to make yt-dlp touch YouTube while exporting cookies
const PROBE_VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// One data line of a cookie jar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub domain: String,
    pub name: String,
    /// Expiry as epoch seconds, 0 for session cookies
    pub expires: i64,
}

impl CookieRecord {
    pub fn is_session(&self) -> bool {
        self.expires == 0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_session() && self.expires <= now.timestamp()
    }
}

/// Parse the tab-separated records of a Netscape cookie file.
///
/// Comment lines are skipped except curl's `#HttpOnly_` prefix, which marks a
/// real cookie. Lines with too few fields or a non-numeric expiry are ignored.
pub fn parse_cookie_jar(content: &str) -> Vec<CookieRecord> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_end_matches(['\r', '\n']);
            let line = match line.strip_prefix("#HttpOnly_") {
                Some(rest) => rest,
                None if line.starts_with('#') || line.trim().is_empty() => return None,
                None => line,
            };

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }

            Some(CookieRecord {
                domain: fields[0].to_string(),
                name: fields[5].to_string(),
                expires: fields[EXPIRY_COLUMN].trim().parse().ok()?,
            })
        })
        .collect()
}

/// Snapshot of the cookie jar's health
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieJarStatus {
    pub path: String,
    pub exists: bool,
    pub cookie_count: usize,
    pub youtube_cookie_count: usize,
    pub expired_count: usize,
    pub session_count: usize,
    pub earliest_expiry: Option<DateTime<Utc>>,
    pub message: String,
}

impl CookieJarStatus {
    /// Inspect the jar at `path` as of `now`
    pub fn inspect(path: &Path, now: DateTime<Utc>) -> Self {
        let mut status = Self {
            path: path.display().to_string(),
            exists: path.is_file(),
            cookie_count: 0,
            youtube_cookie_count: 0,
            expired_count: 0,
            session_count: 0,
            earliest_expiry: None,
            message: String::new(),
        };

        if !status.exists {
            status.message = "Cookies file not found; requests run unauthenticated".to_string();
            return status;
        }

        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                status.message = format!("Could not read cookies file: {}", e);
                return status;
            }
        };

        let records = parse_cookie_jar(&content);
        status.cookie_count = records.len();
        status.youtube_cookie_count = records.iter().filter(|r| r.domain.contains("youtube.com")).count();
        status.session_count = records.iter().filter(|r| r.is_session()).count();
        status.expired_count = records.iter().filter(|r| r.is_expired(now)).count();
        status.earliest_expiry = records
            .iter()
            .filter(|r| !r.is_session() && !r.is_expired(now))
            .map(|r| r.expires)
            .min()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        status.message = if status.cookie_count == 0 {
            "No cookies found. Make sure you are logged into YouTube before exporting.".to_string()
        } else if status.expired_count == status.cookie_count {
            "All cookies have expired. Regenerate cookies.txt.".to_string()
        } else if status.expired_count > 0 {
            format!("{} of {} cookies have expired", status.expired_count, status.cookie_count)
        } else {
            format!("{} cookies loaded", status.cookie_count)
        };

        status
    }
}

/// Browsers yt-dlp can read cookies from
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Browser {
    /// Chrome (may need to be fully closed)
    Chrome,
    Firefox,
    Edge,
    Safari,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "edge",
            Browser::Safari => "safari",
        }
    }
}

/// Export the browser's cookies into `output` with yt-dlp; returns the cookie count.
///
/// The jar is written to a temporary file next to `output` and only moved into
/// place once yt-dlp succeeds, so a failed export never clobbers a working jar.
pub async fn refresh_from_browser(yt_dlp_path: &str, browser: Browser, output: &Path) -> Result<usize> {
    if !check_command_available(yt_dlp_path).await {
        anyhow::bail!("{} not found. Please install it first: pip install yt-dlp", yt_dlp_path);
    }

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    let staging = tempfile::Builder::new()
        .prefix(".cookies")
        .suffix(".txt")
        .tempfile_in(&dir)
        .context("Failed to create temporary cookies file")?;

    tracing::info!("Extracting cookies from {}", browser.as_str());

    let result = Command::new(yt_dlp_path)
        .args(["--cookies-from-browser", browser.as_str(), "--cookies"])
        .arg(staging.path())
        .args(["--skip-download", "--quiet", "--no-warnings", PROBE_VIDEO_URL])
        .output()
        .await
        .with_context(|| format!("Failed to run {}", yt_dlp_path))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        if browser == Browser::Chrome && stderr.contains("Permission denied") {
            anyhow::bail!(
                "Chrome is locking its cookie database. Close all Chrome windows and retry, \
                 or export from Firefox or Edge instead.\n{}",
                stderr.trim()
            );
        }
        anyhow::bail!("Failed to extract cookies: {}", stderr.trim());
    }

    let content = fs_err::read_to_string(staging.path())?;
    let count = parse_cookie_jar(&content).len();

    staging
        .persist(output)
        .with_context(|| format!("Failed to save cookies to {}", output.display()))?;

    Ok(count)
}
