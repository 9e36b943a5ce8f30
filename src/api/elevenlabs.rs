use crate::config::Config;
use crate::error::{Phase, PipelineError, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Synthesizes one narration chunk to `out_path`.
///
/// Mirrors the image fetcher's write discipline: the audio bytes are fully
/// received before the file is created, so a non-2xx response leaves no
/// partial file behind.
pub async fn synthesize_chunk(
    client: &Client,
    cfg: &Config,
    text: &str,
    out_path: &Path,
) -> Result<()> {
    let url = format!("{}/{}", TTS_URL, cfg.eleven_voice_id);

    let body = serde_json::json!({
        "text": text,
        "voice_settings": {
            "stability": 0.5,
            "similarity_boost": 0.75,
        },
    });

    let resp = client
        .post(url)
        .header("Content-Type", "application/json")
        .header("xi-api-key", &cfg.elevenlabs_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(300))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::SpeechSynthesis, resp).await);
    }

    let bytes = resp.bytes().await?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(out_path, &bytes).await?;

    Ok(())
}
