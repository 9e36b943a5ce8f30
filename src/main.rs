use ai_mood_reels::config::Config;
use ai_mood_reels::workspace::Workspace;
use ai_mood_reels::{ffmpeg, pipeline};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ai-mood-reels", about = "AI mood-reel content pipeline")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate image prompts and narration for a topic, then fetch the
    /// images and synthesize the audio.
    Generate {
        #[arg(long)]
        topic: String,
    },
    /// Derive a hashtag for a topic, scrape matching posts, and archive
    /// them locally or republish them upstream.
    Scrape {
        #[arg(long)]
        topic: String,

        /// Re-upload each post through the upload platform instead of
        /// archiving it locally.
        #[arg(long)]
        republish: bool,
    },
    /// Render one clip per image against a single audio track.
    Clips {
        #[arg(long, default_value = "local_media")]
        images: PathBuf,

        #[arg(long, default_value = "audio.mp3")]
        audio: PathBuf,

        #[arg(long, default_value = "output_videos")]
        out: PathBuf,
    },
    /// Render a single slideshow video from all images and one narration
    /// track.
    Slideshow {
        #[arg(long, default_value = "local_media")]
        images: PathBuf,

        #[arg(long, default_value = "local_media/output_audio_1.mp3")]
        audio: PathBuf,

        #[arg(long, default_value = "output_videos/slideshow_video.mp4")]
        out: PathBuf,

        /// Seconds each image stays on screen.
        #[arg(long, default_value_t = 4.5)]
        per_image_secs: f64,

        /// Hard cap on the output duration in seconds.
        #[arg(long, default_value_t = 21.0)]
        max_secs: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if !ffmpeg::check_ffmpeg().await {
        warn!("ffmpeg not found in PATH; video assembly will fail");
    }

    let ws = Workspace::create(".").await?;

    match cli.command {
        Command::Generate { topic } => {
            let cfg = Config::load(&cli.config).await?;
            let client = reqwest::Client::new();
            pipeline::run_generation(&cfg, &client, &topic, &ws).await?;
        }
        Command::Scrape { topic, republish } => {
            let cfg = Config::load(&cli.config).await?;
            let client = reqwest::Client::builder().cookie_store(true).build()?;
            pipeline::run_scrape(&cfg, &client, &topic, republish, &ws).await?;
        }
        Command::Clips { images, audio, out } => {
            pipeline::run_clips(&images, &audio, &out).await?;
        }
        Command::Slideshow {
            images,
            audio,
            out,
            per_image_secs,
            max_secs,
        } => {
            pipeline::run_slideshow(&images, &audio, &out, per_image_secs, max_secs).await?;
        }
    }

    Ok(())
}
