use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cookies::Browser;

#[derive(Parser)]
#[command(
    name = "transcript-api",
    about = "YouTube Transcript API - video metadata and normalized captions via yt-dlp",
    version,
    long_about = "Serves YouTube video metadata and English caption transcripts over HTTP. Picks manual captions over automatic ones, prefers json3 over WebVTT, and normalizes either into timestamped segments."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long, env = "TRANSCRIPT_API_HOST")]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long, env = "TRANSCRIPT_API_PORT")]
        port: Option<u16>,
    },

    /// Print the flattened transcript of a video
    Transcript {
        /// 11-character YouTube video ID
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print video metadata with timestamped captions
    Info {
        /// 11-character YouTube video ID
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Query a running server and show its captions
    Remote {
        /// 11-character YouTube video ID
        #[arg(value_name = "VIDEO_ID")]
        video_id: String,

        /// Server base URL (overrides config)
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },

    /// Inspect or refresh the cookies file
    Cookies {
        #[command(subcommand)]
        action: CookieAction,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum CookieAction {
    /// Report cookie count and expiry
    Status {
        /// Cookies file (defaults to the configured one)
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Export cookies from a logged-in browser session
    Refresh {
        /// Browser to read cookies from
        #[arg(short, long, value_enum)]
        browser: Browser,

        /// Cookies file to write (defaults to the configured one)
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cookie_refresh() {
        let cli = Cli::try_parse_from(["transcript-api", "cookies", "refresh", "--browser", "firefox"]).unwrap();
        match cli.command {
            Commands::Cookies {
                action: CookieAction::Refresh { browser, file },
            } => {
                assert_eq!(browser, Browser::Firefox);
                assert!(file.is_none());
            }
            _ => panic!("expected cookies refresh"),
        }
    }

    #[test]
    fn test_parse_info_json() {
        let cli = Cli::try_parse_from(["transcript-api", "info", "dQw4w9WgXcQ", "-f", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Info {
                format: OutputFormat::Json,
                ..
            }
        ));
    }
}
