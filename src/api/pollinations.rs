use crate::config::Config;
use crate::error::{Phase, PipelineError, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;

pub const IMAGE_WIDTH: u32 = 1280;
pub const IMAGE_HEIGHT: u32 = 720;
pub const IMAGE_SEED: u32 = 42;

fn url_encode_component(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            out.push(ch);
        } else if ch == ' ' {
            out.push_str("%20");
        } else {
            let mut buf = [0u8; 4];
            let bytes = ch.encode_utf8(&mut buf).as_bytes();
            for b in bytes {
                out.push('%');
                out.push_str(&format!("{:02X}", b));
            }
        }
    }
    out
}

/// Fetches one synthesized image for the prompt and writes it to `out_path`.
///
/// The body is read in full before the file is created, so a failed fetch
/// leaves nothing on disk under that name.
pub async fn fetch_image(
    client: &Client,
    cfg: &Config,
    prompt: &str,
    out_path: &Path,
) -> Result<()> {
    let url = format!(
        "{}/prompt/{}",
        cfg.image_endpoint.trim_end_matches('/'),
        url_encode_component(prompt)
    );

    let resp = client
        .get(url)
        .query(&[
            ("width", IMAGE_WIDTH.to_string()),
            ("height", IMAGE_HEIGHT.to_string()),
            ("model", cfg.image_model.clone()),
            ("seed", IMAGE_SEED.to_string()),
        ])
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::ImageFetch, resp).await);
    }

    let bytes = resp.bytes().await?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(out_path, &bytes).await?;

    Ok(())
}

/// Builds a per-run-unique image filename: timestamp plus the sanitized
/// first 30 characters of the prompt.
pub fn image_filename(prompt: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.png", timestamp, sanitize_prompt(prompt))
}

pub fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .take(30)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}
