use crate::api::{elevenlabs, gemini, pollinations};
use crate::config::Config;
use crate::ffmpeg;
use crate::prompts;
use crate::publish;
use crate::scrape::{HttpPostSource, PostSource};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tracing::{info, warn};

/// The speech endpoint rejects long bodies, so narration goes over in
/// fixed 600-character windows.
pub const NARRATION_CHUNK_CHARS: usize = 600;

/// Cap on post links collected from one tag page.
pub const POST_LIMIT: usize = 20;

/// Fixed audio track picked up by the clip step after a scrape run.
const SCRAPE_AUDIO_FILE: &str = "audio.mp3";

/// Indexed name for a synthesized narration chunk (1-based).
pub fn audio_chunk_filename(index: usize) -> String {
    format!("output_audio_{index}.mp3")
}

/// Topic -> prompts -> images -> narration audio. Sequential, one external
/// call in flight at a time; a failed image or audio chunk is logged and
/// its siblings continue.
pub async fn run_generation(
    cfg: &Config,
    client: &Client,
    topic: &str,
    ws: &Workspace,
) -> Result<()> {
    info!(topic, "requesting image and audio prompts");
    let response = gemini::generate_prompts(client, cfg, topic)
        .await
        .context("Prompt generation request failed")?;

    let set = prompts::parse_prompt_set(&response);
    if set.is_empty() {
        warn!("no image or audio prompts found in the model response");
        return Ok(());
    }
    info!(
        prompts = set.image_prompts.len(),
        narration_chars = set.narration.chars().count(),
        "prompt set parsed"
    );

    let mut fetched = 0usize;
    for (i, prompt) in set.image_prompts.iter().enumerate() {
        let out = ws.local_media.join(pollinations::image_filename(prompt));
        info!(n = i + 1, prompt = prompt.as_str(), "fetching image");
        match pollinations::fetch_image(client, cfg, prompt, &out).await {
            Ok(()) => {
                info!(file = %out.display(), "image saved");
                fetched += 1;
            }
            Err(err) => warn!(prompt = prompt.as_str(), error = %err, "image fetch failed"),
        }
    }

    let chunks = prompts::chunk_text(&set.narration, NARRATION_CHUNK_CHARS);
    info!(chunks = chunks.len(), "synthesizing narration");

    let mut synthesized = 0usize;
    for (i, chunk) in chunks.iter().enumerate() {
        let out = ws.local_media.join(audio_chunk_filename(i + 1));
        match elevenlabs::synthesize_chunk(client, cfg, chunk, &out).await {
            Ok(()) => {
                info!(file = %out.display(), "audio chunk saved");
                synthesized += 1;
            }
            Err(err) => warn!(chunk = i + 1, error = %err, "speech synthesis failed"),
        }
    }

    info!(
        images = fetched,
        audio_chunks = synthesized,
        "generation run finished"
    );
    Ok(())
}

/// Topic -> hashtag -> tag search -> per-post republish or archive.
/// One bad post never halts the batch; each failure is logged with its
/// phase and remote status and the loop moves on.
pub async fn run_scrape(
    cfg: &Config,
    client: &Client,
    topic: &str,
    republish: bool,
    ws: &Workspace,
) -> Result<()> {
    if republish {
        // Fail before scraping anything rather than on the first upload.
        cfg.require_flic_token()?;
    }

    let hashtag = gemini::generate_hashtag(client, cfg, topic)
        .await
        .context("Hashtag generation request failed")?;
    if hashtag.is_empty() {
        anyhow::bail!("hashtag generation returned nothing usable for topic '{topic}'");
    }
    info!(hashtag = %hashtag, "searching tag");

    let source = HttpPostSource::new(client.clone());
    let posts = source.search_tag(&hashtag, POST_LIMIT).await?;
    if posts.is_empty() {
        warn!(hashtag = %hashtag, "no posts found");
        return Ok(());
    }
    info!(count = posts.len(), "post links collected");

    let mut processed = 0usize;
    for post in &posts {
        let scratch = ws.scratch()?;
        let result = if republish {
            publish::republish(client, cfg, post, scratch.path()).await
        } else {
            publish::archive(client, post, scratch.path(), ws).await
        };
        match result {
            Ok(()) => processed += 1,
            Err(err) => warn!(url = %post.url, error = %err, "post processing failed"),
        }
        // Scratch dir and any leftovers are deleted when `scratch` drops.
    }
    info!(processed, total = posts.len(), "scrape run finished");

    if Path::new(SCRAPE_AUDIO_FILE).exists() {
        info!("audio track present; rendering per-image clips");
        run_clips(&ws.local_media, Path::new(SCRAPE_AUDIO_FILE), &ws.output_videos).await?;
    }

    Ok(())
}

/// One clip per image in `image_dir`, all against the same audio file.
pub async fn run_clips(image_dir: &Path, audio: &Path, out_dir: &Path) -> Result<()> {
    if !audio.is_file() {
        anyhow::bail!("audio file not found: {}", audio.display());
    }
    let produced = ffmpeg::clips_from_dir(image_dir, audio, out_dir).await?;
    info!(clips = produced.len(), out = %out_dir.display(), "clip run finished");
    Ok(())
}

/// Single slideshow video: every image held for a fixed duration against
/// one narration track.
pub async fn run_slideshow(
    image_dir: &Path,
    audio: &Path,
    out: &Path,
    per_image_secs: f64,
    max_secs: f64,
) -> Result<()> {
    if !audio.is_file() {
        anyhow::bail!("audio file not found: {}", audio.display());
    }
    ffmpeg::make_slideshow(image_dir, audio, out, per_image_secs, max_secs).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mocked_response_drives_expected_fetch_plan() {
        // The shape a well-behaved model reply takes for a topic like
        // "overcoming fear": five quoted image prompts, one narration.
        let narration = "Fear shrinks the moment you face it. ".repeat(40);
        let response = format!(
            "image_prompts = [\"a dark doorway\", \"a first step forward\", \
             \"hands gripping a rope\", \"a face in the wind\", \"open sky\"]\n\
             audio_prompt = \"{}\"",
            narration.trim_end()
        );

        let set = crate::prompts::parse_prompt_set(&response);
        assert_eq!(set.image_prompts.len(), 5);

        let chunks = crate::prompts::chunk_text(&set.narration, NARRATION_CHUNK_CHARS);
        let expected = set.narration.chars().count().div_ceil(NARRATION_CHUNK_CHARS);
        assert_eq!(chunks.len(), expected);

        let names: Vec<String> = (1..=chunks.len()).map(audio_chunk_filename).collect();
        assert_eq!(names[0], "output_audio_1.mp3");
        assert_eq!(names.last().unwrap(), &format!("output_audio_{}.mp3", chunks.len()));
    }
}
