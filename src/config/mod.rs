use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::extractors::HttpHeader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Metadata fetch settings
    pub fetcher: FetcherConfig,

    /// Settings for the `remote` viewer
    pub client: ClientConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Netscape cookie jar handed to yt-dlp when present
    pub cookies_file: Option<PathBuf>,

    /// Caption languages requested from YouTube
    pub preferred_languages: Vec<String>,

    /// Extra headers sent by yt-dlp to look like a regular browser
    #[serde(default)]
    pub impersonation_headers: Vec<HttpHeader>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running transcript-api server
    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            fetcher: FetcherConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                cookies_file: Some(PathBuf::from("cookies.txt")),
                preferred_languages: vec!["en".to_string()],
                impersonation_headers: Vec::new(),
            },
            client: ClientConfig {
                api_url: "http://127.0.0.1:8000".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                tracing::warn!("Could not write default config to {}: {:#}", config_path.display(), e);
            }
            Ok(config)
        }
    }

    /// Read and validate a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-api").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be non-zero");
        }

        if self.fetcher.preferred_languages.is_empty() {
            anyhow::bail!("At least one preferred caption language must be configured");
        }

        if self.fetcher.yt_dlp_path.trim().is_empty() {
            anyhow::bail!("yt-dlp path must not be empty");
        }

        url::Url::parse(&self.client.api_url)
            .with_context(|| format!("Invalid client api_url: {}", self.client.api_url))?;

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Server: {}:{}", self.server.host, self.server.port);
        println!("  yt-dlp: {}", self.fetcher.yt_dlp_path);
        match &self.fetcher.cookies_file {
            Some(path) => println!("  Cookies File: {}", path.display()),
            None => println!("  Cookies File: (disabled)"),
        }
        println!("  Caption Languages: {}", self.fetcher.preferred_languages.join(", "));
        println!("  Impersonation Headers: {}", self.fetcher.impersonation_headers.len());
        println!("  Client API URL: {}", self.client.api_url);
    }

    /// Tell the user where the config file lives
    pub fn print_location(&self) -> Result<()> {
        println!("Edit the config file to change settings:");
        println!("  {}", Self::config_path()?.display());
        Ok(())
    }
}
