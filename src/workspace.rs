use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

/// Filesystem layout for one run.
///
/// The persistent directories (`local_media/`, `output_videos/`) are the
/// index; there is no database. Each scraped post gets its own scratch
/// directory so concurrent runs no longer race on a shared `media/` dir,
/// and cleanup happens on drop instead of a wholesale delete.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    pub local_media: PathBuf,
    pub output_videos: PathBuf,
}

impl Workspace {
    pub async fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let ws = Self {
            root: root.to_path_buf(),
            local_media: root.join("local_media"),
            output_videos: root.join("output_videos"),
        };
        for dir in [&ws.local_media, &ws.output_videos] {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(ws)
    }

    /// A fresh scratch directory inside the workspace root for a single
    /// post's downloads. Deleted when the returned handle drops.
    pub fn scratch(&self) -> Result<TempDir> {
        tempfile::Builder::new()
            .prefix("media-")
            .tempdir_in(&self.root)
            .context("Failed to create scratch directory")
    }
}

/// Returns the first video or image file in `dir`, videos preferred,
/// ties broken by name for determinism.
pub async fn first_media_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut videos = Vec::new();
    let mut images = Vec::new();

    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mp4") => videos.push(path),
            Some(ext) if ext.eq_ignore_ascii_case("jpg") => images.push(path),
            _ => {}
        }
    }

    videos.sort();
    images.sort();
    Ok(videos.into_iter().next().or_else(|| images.into_iter().next()))
}

/// Moves `src` into `dest_dir`, falling back to copy+remove when the
/// rename crosses filesystems.
pub async fn move_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = src
        .file_name()
        .with_context(|| format!("{} has no file name", src.display()))?;
    let dest = dest_dir.join(file_name);

    if fs::rename(src, &dest).await.is_err() {
        fs::copy(src, &dest)
            .await
            .with_context(|| format!("Failed to copy {} -> {}", src.display(), dest.display()))?;
        fs::remove_file(src).await?;
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_makes_persistent_dirs() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        assert!(ws.local_media.is_dir());
        assert!(ws.output_videos.is_dir());
    }

    #[tokio::test]
    async fn scratch_lives_inside_workspace_root() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        let scratch = ws.scratch().unwrap();
        assert!(scratch.path().starts_with(root.path()));
    }

    #[tokio::test]
    async fn first_media_prefers_video() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.jpg"), b"img").await.unwrap();
        fs::write(dir.path().join("z.mp4"), b"vid").await.unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").await.unwrap();

        let found = first_media_file(dir.path()).await.unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "z.mp4");
    }

    #[tokio::test]
    async fn first_media_falls_back_to_image() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("only.jpg"), b"img").await.unwrap();

        let found = first_media_file(dir.path()).await.unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "only.jpg");
    }

    #[tokio::test]
    async fn first_media_empty_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(first_media_file(dir.path()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn move_into_lands_in_dest() {
        let src_dir = tempfile::tempdir().unwrap();
        let dest_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("clip.mp4");
        fs::write(&src, b"vid").await.unwrap();

        let dest = move_into(&src, dest_dir.path()).await.unwrap();
        assert!(dest.is_file());
        assert!(!src.exists());
    }
}
