use std::fmt;

/// Pipeline phase attached to API failures so a log line or error chain
/// identifies which external call went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PromptGeneration,
    ImageFetch,
    SpeechSynthesis,
    TagSearch,
    PostDownload,
    UploadUrl,
    MediaUpload,
    PostCreate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PromptGeneration => "prompt generation",
            Phase::ImageFetch => "image fetch",
            Phase::SpeechSynthesis => "speech synthesis",
            Phase::TagSearch => "tag search",
            Phase::PostDownload => "post download",
            Phase::UploadUrl => "upload url issuance",
            Phase::MediaUpload => "media upload",
            Phase::PostCreate => "post creation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{phase} failed: HTTP {status} - {body}")]
    Api {
        phase: Phase,
        status: u16,
        body: String,
    },
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    ResponseShape(&'static str),
    #[error("unrecognized post URL: {0}")]
    BadPostUrl(String),
    #[error("no media file found for post {0}")]
    NoMedia(String),
    #[error("no image files found in {0}")]
    NoImages(String),
    #[error("ffmpeg exited with an error: {stderr}")]
    Ffmpeg { stderr: String },
}

impl PipelineError {
    /// Builds an `Api` error from a non-2xx response, consuming the body.
    pub async fn from_response(phase: Phase, resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        PipelineError::Api { phase, status, body }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
