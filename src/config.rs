use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "gemini_api_key")]
    pub gemini_key: String,
    #[serde(rename = "elevenlabs_api_key")]
    pub elevenlabs_key: String,
    #[serde(rename = "eleven_voice_id")]
    #[serde(default = "default_voice_id")]
    pub eleven_voice_id: String,
    #[serde(rename = "image_endpoint")]
    #[serde(default = "default_image_endpoint")]
    pub image_endpoint: String,
    #[serde(rename = "image_model")]
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Upload platform token. Falls back to the FLIC_TOKEN environment
    /// variable when absent from the config file.
    #[serde(rename = "flic_token")]
    #[serde(default)]
    pub flic_token: String,
}

fn default_voice_id() -> String {
    "IKne3meq5aSn9XLyUdCD".to_string()
}

fn default_image_endpoint() -> String {
    "https://image.pollinations.ai".to_string()
}

fn default_image_model() -> String {
    "flux".to_string()
}

impl Config {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        let mut config: Config = serde_json::from_str(&content)?;

        if config.gemini_key.is_empty() {
            anyhow::bail!("config.json: gemini_api_key missing");
        }
        if config.elevenlabs_key.is_empty() {
            anyhow::bail!("config.json: elevenlabs_api_key missing");
        }
        if config.flic_token.is_empty() {
            if let Ok(token) = std::env::var("FLIC_TOKEN") {
                config.flic_token = token;
            }
        }

        Ok(config)
    }

    /// The republish branch needs the upload token; generation does not, so
    /// absence only becomes an error once an upload is requested.
    pub fn require_flic_token(&self) -> Result<&str> {
        if self.flic_token.is_empty() {
            anyhow::bail!(
                "FLIC_TOKEN is not set. Add flic_token to config.json or set the environment variable."
            );
        }
        Ok(&self.flic_token)
    }
}
