use crate::error::{Phase, PipelineError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

const API_BASE: &str = "https://api.socialverseapp.com";
const CATEGORY_ID: u32 = 69;

/// Ephemeral signed-upload pair issued by the platform. Valid for one
/// upload; never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTicket {
    pub url: String,
    pub hash: String,
}

/// Step 1 of 3: request a pre-signed upload URL.
pub async fn generate_upload_url(client: &Client, token: &str) -> Result<UploadTicket> {
    let resp = client
        .get(format!("{API_BASE}/posts/generate-upload-url"))
        .header("Flic-Token", token)
        .header("Content-Type", "application/json")
        .timeout(std::time::Duration::from_secs(60))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::UploadUrl, resp).await);
    }

    Ok(resp.json().await?)
}

/// Step 2 of 3: PUT the raw media bytes to the signed URL.
pub async fn upload_media(client: &Client, upload_url: &str, file_path: &Path) -> Result<()> {
    let bytes = fs::read(file_path).await?;

    let resp = client
        .put(upload_url)
        .body(bytes)
        .timeout(std::time::Duration::from_secs(600))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::MediaUpload, resp).await);
    }

    Ok(())
}

/// Step 3 of 3: POST the creation request carrying the content hash and the
/// scraped caption as title.
pub async fn create_post(client: &Client, token: &str, hash: &str, title: &str) -> Result<()> {
    let body = serde_json::json!({
        "title": title,
        "hash": hash,
        "is_available_in_public_feed": false,
        "category_id": CATEGORY_ID,
    });

    let resp = client
        .post(format!("{API_BASE}/posts"))
        .header("Flic-Token", token)
        .header("Content-Type", "application/json")
        .json(&body)
        .timeout(std::time::Duration::from_secs(60))
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(PipelineError::from_response(Phase::PostCreate, resp).await);
    }

    Ok(())
}
