use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcript_api::cli::{Cli, CookieAction, Commands};
use transcript_api::client::ApiClient;
use transcript_api::config::Config;
use transcript_api::cookies::{self, CookieJarStatus};
use transcript_api::extractors::VideoId;
use transcript_api::server::{self, AppState};
use transcript_api::{output, utils, TranscriptPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "transcript_api=debug,tower_http=debug"
    } else {
        "transcript_api=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Reject malformed ids before touching config or the network
    if let Commands::Transcript { video_id, .. } | Commands::Info { video_id, .. } | Commands::Remote { video_id, .. } =
        &cli.command
    {
        VideoId::parse(video_id)?;
    }

    let config = Config::load().await?;

    match cli.command {
        Commands::Serve { host, port } => {
            warn_missing_dependencies(&config).await;

            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let state = AppState {
                pipeline: Arc::new(TranscriptPipeline::new(&config)),
                cookies_file: config.fetcher.cookies_file.clone(),
            };
            server::start_server(&server_config, state).await?;
        }
        Commands::Transcript {
            video_id,
            format,
            output,
        } => {
            warn_missing_dependencies(&config).await;
            let pipeline = TranscriptPipeline::new(&config);

            let progress = spinner(cli.quiet, "Fetching transcript...");
            let result = pipeline.transcript(&video_id).await?;
            progress.finish_and_clear();

            let content = output::format_video_result(&result, &format)?;
            emit(&content, output.as_deref())?;
        }
        Commands::Info {
            video_id,
            format,
            output,
        } => {
            warn_missing_dependencies(&config).await;
            let pipeline = TranscriptPipeline::new(&config);

            let progress = spinner(cli.quiet, "Fetching video info...");
            let info = pipeline.video_info(&video_id).await?;
            progress.finish_and_clear();

            let content = output::format_video_info(&info, &format)?;
            emit(&content, output.as_deref())?;
        }
        Commands::Remote { video_id, api_url } => {
            let client = match api_url {
                Some(url) => ApiClient::new(&url, Duration::from_secs(config.client.timeout_secs))?,
                None => ApiClient::from_config(&config.client)?,
            };

            let progress = spinner(cli.quiet, "Extracting transcript...");
            let info = client.video_info(&video_id).await;
            progress.finish_and_clear();

            let info = info?;
            output::print_to_console(&output::format_video_info(&info, &transcript_api::OutputFormat::Text)?);
            if info.captions.is_empty() {
                println!("No captions available");
            } else {
                println!("Success! Found {} caption segments", info.captions.len());
            }
        }
        Commands::Cookies { action } => match action {
            CookieAction::Status { file } => {
                let path = file
                    .or_else(|| config.fetcher.cookies_file.clone())
                    .ok_or_else(|| anyhow::anyhow!("No cookies file configured; pass --file"))?;
                let status = CookieJarStatus::inspect(&path, chrono::Utc::now());
                println!("{}", output::format_cookie_status(&status));
            }
            CookieAction::Refresh { browser, file } => {
                let path = file
                    .or_else(|| config.fetcher.cookies_file.clone())
                    .ok_or_else(|| anyhow::anyhow!("No cookies file configured; pass --file"))?;

                let progress = spinner(cli.quiet, &format!("Extracting cookies from {}...", browser.as_str()));
                let count = cookies::refresh_from_browser(&config.fetcher.yt_dlp_path, browser, &path).await;
                progress.finish_and_clear();

                let count = count?;
                println!("Cookies extracted successfully");
                println!("Saved to: {}", path.display());
                println!("Found {} cookies", count);
                if count == 0 {
                    println!("No cookies found. Make sure you are logged into YouTube in your browser!");
                }
            }
        },
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                config.print_location()?;
            }
        }
    }

    Ok(())
}

async fn warn_missing_dependencies(config: &Config) {
    let missing = utils::check_dependencies(&config.fetcher.yt_dlp_path).await;
    if !missing.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }
}

fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(style);
    }
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn emit(content: &str, path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(path) => {
            output::save_to_file(content, path)?;
            println!("Saved to: {}", console::style(path.display()).green());
        }
        None => output::print_to_console(content),
    }
    Ok(())
}
