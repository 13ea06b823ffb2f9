//! Subtitle markup (WebVTT / SRT) payloads.
//!
//! A `<start> --> <end>[ settings]` line opens a cue block; the block's
//! non-blank lines are joined into one segment until a blank line, the next
//! time range, or end of input. Lines outside any block (the `WEBVTT` header,
//! `Kind:`/`Language:` metadata, cue indices) are ignored.

use super::CaptionSegment;
use crate::utils::{collapse_whitespace, is_numeric_line, parse_cue_timestamp, strip_markup};

struct OpenCue {
    start_ms: u64,
    end_ms: u64,
    lines: Vec<String>,
}

impl OpenCue {
    fn close(self, segments: &mut Vec<CaptionSegment>) {
        if let Some(segment) = CaptionSegment::new(self.start_ms, self.end_ms, &self.lines.join(" ")) {
            segments.push(segment);
        }
    }
}

/// Parse `start --> end cue-settings` into milliseconds
pub fn parse_time_range(line: &str) -> Option<(u64, u64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_cue_timestamp(start)?, parse_cue_timestamp(end)?))
}

/// Parse markup captions into segments in cue order
pub fn parse(payload: &str) -> Vec<CaptionSegment> {
    let mut segments = Vec::new();
    let mut cue: Option<OpenCue> = None;

    for raw_line in payload.lines() {
        let line = raw_line.trim();

        if line.is_empty() {
            if let Some(open) = cue.take() {
                open.close(&mut segments);
            }
            continue;
        }

        if line.contains("-->") {
            if let Some(open) = cue.take() {
                open.close(&mut segments);
            }
            cue = parse_time_range(line).map(|(start_ms, end_ms)| OpenCue {
                start_ms,
                end_ms,
                lines: Vec::new(),
            });
            if cue.is_none() {
                tracing::debug!("Skipping unparseable cue timing: {}", line);
            }
            continue;
        }

        let Some(open) = cue.as_mut() else {
            continue;
        };

        let text = collapse_whitespace(&strip_markup(line));
        if !text.is_empty() && !is_numeric_line(&text) {
            open.lines.push(text);
        }
    }

    if let Some(open) = cue.take() {
        open.close(&mut segments);
    }

    segments
}
