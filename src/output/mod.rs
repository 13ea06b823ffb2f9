use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::cookies::CookieJarStatus;
use crate::pipeline::{VideoInfo, VideoResult};
use crate::utils::format_duration;

/// Render a transcript result
pub fn format_video_result(result: &VideoResult, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "Title: {}", result.video_name)?;
            writeln!(out, "URL: {}", result.video_url)?;
            writeln!(out, "Caption Type: {}", caption_label(result.caption_type))?;
            if let Some(message) = &result.message {
                writeln!(out, "Message: {}", message)?;
            }
            writeln!(out, "{}", "=".repeat(80))?;
            writeln!(out)?;
            writeln!(out, "{}", result.transcript)?;
            Ok(out)
        }
    }
}

/// Render a metadata probe as a header followed by `[idx] start - end: text` lines
pub fn format_video_info(info: &VideoInfo, format: &OutputFormat) -> Result<String> {
    if let OutputFormat::Json = format {
        return Ok(serde_json::to_string_pretty(info)?);
    }

    let mut out = String::new();
    writeln!(out, "Video ID: {}", info.video_id)?;
    writeln!(out, "Title: {}", info.title.as_deref().unwrap_or("N/A"))?;
    match info.duration {
        Some(seconds) => writeln!(out, "Duration: {} ({} seconds)", format_duration(seconds), seconds as u64)?,
        None => writeln!(out, "Duration: N/A")?,
    }
    writeln!(out, "Uploader: {}", info.uploader.as_deref().unwrap_or("N/A"))?;
    writeln!(out, "Caption Type: {}", caption_label(info.caption_type))?;
    writeln!(out, "Success: {}", info.success)?;
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out)?;

    if info.captions.is_empty() {
        writeln!(out, "No captions found for this video.")?;
        writeln!(out, "Message: {}", info.message.as_deref().unwrap_or("No message"))?;
        return Ok(out);
    }

    for (index, caption) in info.captions.iter().enumerate() {
        writeln!(out, "[{:3}] {} - {}: {}", index + 1, caption.start, caption.end, caption.text)?;
    }

    Ok(out)
}

pub fn format_cookie_status(status: &CookieJarStatus) -> String {
    let mut lines = vec![format!("Cookies file: {}", status.path)];
    if status.exists {
        lines.push(format!("  Cookies: {} ({} for youtube.com)", status.cookie_count, status.youtube_cookie_count));
        lines.push(format!("  Session cookies: {}", status.session_count));
        lines.push(format!("  Expired: {}", status.expired_count));
        if let Some(expiry) = status.earliest_expiry {
            lines.push(format!("  Next expiry: {}", expiry.format("%Y-%m-%d %H:%M:%S UTC")));
        }
    }
    lines.push(format!("  {}", status.message));
    lines.join("\n")
}

fn caption_label(kind: Option<crate::captions::CaptionTrackKind>) -> String {
    kind.map(|k| k.to_string()).unwrap_or_else(|| "None".to_string())
}

/// Save rendered output to file
pub fn save_to_file(content: &str, path: &Path) -> Result<()> {
    fs_err::write(path, content)?;
    Ok(())
}

/// Print rendered output to console
pub fn print_to_console(content: &str) {
    println!("{}", content.trim_end());
}
