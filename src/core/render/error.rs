use thiserror::Error;

use crate::core::frame_list::FrameListError;
use crate::core::video::VideoError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Video error: {0}")]
    Video(#[from] VideoError),
    #[error("Frame list error: {0}")]
    FrameList(#[from] FrameListError),
    #[error("Export cancelled after {frames_written} frames")]
    Cancelled { frames_written: usize },
    #[error("Failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("{stage} stage panicked")]
    StagePanicked { stage: &'static str },
}
