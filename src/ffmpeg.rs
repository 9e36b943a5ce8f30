use crate::error::{PipelineError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{info, warn};

pub async fn check_ffmpeg() -> bool {
    match Command::new("ffmpeg").arg("-version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

async fn run_ffmpeg(args: &[String]) -> Result<()> {
    let output = Command::new("ffmpeg").args(args).output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(PipelineError::Ffmpeg { stderr });
    }
    Ok(())
}

/// One still image looped against one audio track; `-shortest` ends the
/// clip when the audio runs out, since the looped image never does.
pub async fn make_image_clip(image: &Path, audio: &Path, out: &Path) -> Result<()> {
    let args = vec![
        "-y".to_string(),
        "-loop".to_string(),
        "1".to_string(),
        "-i".to_string(),
        image.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-tune".to_string(),
        "stillimage".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-shortest".to_string(),
        out.display().to_string(),
    ];
    run_ffmpeg(&args).await
}

pub async fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension().and_then(OsStr::to_str) {
            if matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png") {
                images.push(path);
            }
        }
    }
    images.sort();
    Ok(images)
}

pub fn clip_output_name(image: &Path) -> String {
    let stem = image
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("clip");
    format!("{stem}_video.mp4")
}

/// One clip per image in `image_dir`, each against the same audio track.
/// A failed clip is logged and its siblings still render.
pub async fn clips_from_dir(image_dir: &Path, audio: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let images = list_image_files(image_dir).await?;
    if images.is_empty() {
        return Err(PipelineError::NoImages(image_dir.display().to_string()));
    }

    fs::create_dir_all(out_dir).await?;

    let mut produced = Vec::new();
    for image in &images {
        let out = out_dir.join(clip_output_name(image));
        match make_image_clip(image, audio, &out).await {
            Ok(()) => {
                info!(clip = %out.display(), "created video clip");
                produced.push(out);
            }
            Err(err) => warn!(image = %image.display(), error = %err, "clip render failed"),
        }
    }

    Ok(produced)
}

/// Concat-demuxer manifest: every image with a fixed display duration,
/// except the last entry, whose duration must be omitted.
pub fn build_concat_manifest(images: &[PathBuf], per_image_secs: f64) -> String {
    let mut manifest = String::new();
    for (i, image) in images.iter().enumerate() {
        let path = image.display().to_string().replace('\\', "/");
        manifest.push_str(&format!("file '{}'\n", path));
        if i + 1 < images.len() {
            manifest.push_str(&format!("duration {}\n", per_image_secs));
        }
    }
    manifest
}

/// Every image in `image_dir` held for `per_image_secs` against one
/// narration track, capped at `max_secs` total. The manifest is written to
/// `image_list.txt`, consumed, then deleted.
pub async fn make_slideshow(
    image_dir: &Path,
    audio: &Path,
    out: &Path,
    per_image_secs: f64,
    max_secs: f64,
) -> Result<()> {
    let images = list_image_files(image_dir).await?;
    if images.is_empty() {
        return Err(PipelineError::NoImages(image_dir.display().to_string()));
    }

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent).await?;
    }

    let list_path = PathBuf::from("image_list.txt");
    fs::write(&list_path, build_concat_manifest(&images, per_image_secs)).await?;

    let args = vec![
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_path.display().to_string(),
        "-i".to_string(),
        audio.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-tune".to_string(),
        "stillimage".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-t".to_string(),
        format!("{}", max_secs),
        out.display().to_string(),
    ];

    let result = run_ffmpeg(&args).await;
    let _ = fs::remove_file(&list_path).await;
    result?;

    info!(video = %out.display(), "slideshow video created");
    Ok(())
}
