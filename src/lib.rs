pub mod api;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod pipeline;
pub mod prompts;
pub mod publish;
pub mod scrape;
pub mod workspace;

pub use config::Config;
pub use error::{Phase, PipelineError};
pub use prompts::PromptSet;
pub use workspace::Workspace;
