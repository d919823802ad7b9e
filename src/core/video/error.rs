use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Frame {index} out of range (video has {frame_count} frames)")]
    FrameOutOfRange { index: usize, frame_count: usize },
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u8),
    #[error("Frame buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },
    #[error("Frame size mismatch: expected {expected:?}, got {actual:?}")]
    FrameSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("No frames found in {0}")]
    Empty(String),
}
