use regex::Regex;
use std::sync::LazyLock;

static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// Format milliseconds as `mm:ss`. Minutes are not capped at 59.
pub fn format_timestamp(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parse a cue timestamp (`hh:mm:ss.mmm` or `mm:ss.mmm`) into milliseconds.
///
/// A comma is accepted as the fraction separator so SRT cues parse too.
pub fn parse_cue_timestamp(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (clock, fraction) = match raw.rsplit_once(['.', ',']) {
        Some((clock, fraction)) => (clock, fraction),
        None => (raw, "0"),
    };

    if fraction.is_empty() || fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "5" after the dot means 500ms
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    let parts: Vec<u64> = clock
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                part.parse().ok()
            }
        })
        .collect::<Option<Vec<_>>>()?;

    // Oversized fields reject the cue instead of wrapping
    let seconds = match parts.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s)?,
        [m, s] if *s < 60 => m.checked_mul(60)?.checked_add(*s)?,
        _ => return None,
    };

    seconds.checked_mul(1000)?.checked_add(millis)
}

/// Collapse every whitespace run (newlines included) into a single space and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `<...>` markup and decode HTML entities such as `&nbsp;` and `&amp;`.
///
/// Escaped tags (`&lt;i&gt;`) are treated as markup and removed once decoded.
pub fn strip_markup(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, "");
    let decoded = html_escape::decode_html_entities(&without_tags);
    MARKUP_TAG.replace_all(&decoded, "").into_owned()
}

/// True for lines made only of ASCII digits (cue indices)
pub fn is_numeric_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

/// Truncate to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!("{} - required for YouTube metadata and captions", yt_dlp_path));
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
