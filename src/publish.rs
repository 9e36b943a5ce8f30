use crate::api::socialverse;
use crate::config::Config;
use crate::error::PipelineError;
use crate::scrape::{self, PostRef};
use crate::workspace::{self, Workspace};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Sidecar written next to an archived asset. Overwritten per run, not
/// versioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub media_file: PathBuf,
    pub source_url: String,
}

/// Download one post and re-upload it through the three-step protocol:
/// signed URL, PUT bytes, POST metadata. Each non-2xx step surfaces its
/// own phase and HTTP status.
pub async fn republish(
    client: &Client,
    cfg: &Config,
    post: &PostRef,
    scratch_dir: &Path,
) -> Result<()> {
    let token = cfg.require_flic_token()?;

    let downloaded = scrape::download_post(client, post, scratch_dir).await?;

    let media = workspace::first_media_file(scratch_dir)
        .await?
        .ok_or_else(|| PipelineError::NoMedia(post.shortcode.clone()))?;

    let ticket = socialverse::generate_upload_url(client, token).await?;
    socialverse::upload_media(client, &ticket.url, &media).await?;
    socialverse::create_post(client, token, &ticket.hash, &downloaded.caption).await?;

    info!(url = %post.url, "media uploaded and post created");
    Ok(())
}

/// Download one post and keep it locally: move the asset into the archive
/// directory and write a JSON sidecar next to it.
pub async fn archive(
    client: &Client,
    post: &PostRef,
    scratch_dir: &Path,
    ws: &Workspace,
) -> Result<()> {
    let downloaded = scrape::download_post(client, post, scratch_dir).await?;

    let saved = workspace::move_into(&downloaded.media_path, &ws.local_media).await?;
    let metadata = Metadata {
        title: downloaded.caption,
        media_file: saved.clone(),
        source_url: post.url.clone(),
    };
    write_sidecar(&ws.local_media, &metadata).await?;

    info!(media = %saved.display(), "media and metadata archived");
    Ok(())
}

async fn write_sidecar(dir: &Path, metadata: &Metadata) -> Result<()> {
    let path = dir.join("metadata.json");
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write sidecar {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sidecar_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = Metadata {
            title: "Untitled Post".to_string(),
            media_file: dir.path().join("ABC.jpg"),
            source_url: "https://www.instagram.com/p/ABC/".to_string(),
        };

        write_sidecar(dir.path(), &metadata).await.unwrap();

        let raw = fs::read_to_string(dir.path().join("metadata.json"))
            .await
            .unwrap();
        let read: Metadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(read.title, "Untitled Post");
        assert_eq!(read.source_url, metadata.source_url);
    }

    #[tokio::test]
    async fn sidecar_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        for title in ["first", "second"] {
            let metadata = Metadata {
                title: title.to_string(),
                media_file: dir.path().join("x.mp4"),
                source_url: "https://www.instagram.com/p/X/".to_string(),
            };
            write_sidecar(dir.path(), &metadata).await.unwrap();
        }

        let raw = fs::read_to_string(dir.path().join("metadata.json"))
            .await
            .unwrap();
        let read: Metadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(read.title, "second");
    }
}
