use std::path::{Path, PathBuf};

use log::{debug, info};

use super::error::VideoError;
use super::frame::Frame;

/// 只读视频句柄：帧数、尺寸、通道数，以及按索引随机访问帧
pub trait Video: Send + Sync {
    /// Identity used by label stores to look up frames of this video.
    fn name(&self) -> &str;

    fn frame_count(&self) -> usize;

    fn height(&self) -> u32;

    fn width(&self) -> u32;

    fn channels(&self) -> u8;

    fn get_frame(&self, index: usize) -> Result<Frame, VideoError>;

    /// Fetch several frames, returned in the order of `indices`.
    fn get_frames(&self, indices: &[usize]) -> Result<Vec<Frame>, VideoError> {
        indices.iter().map(|&i| self.get_frame(i)).collect()
    }

    fn check_index(&self, index: usize) -> Result<(), VideoError> {
        if index >= self.frame_count() {
            return Err(VideoError::FrameOutOfRange {
                index,
                frame_count: self.frame_count(),
            });
        }
        Ok(())
    }
}

/// 内存中的帧序列（测试与小视频）
#[derive(Debug, Clone)]
pub struct InMemoryVideo {
    name: String,
    frames: Vec<Frame>,
    width: u32,
    height: u32,
    channels: u8,
}

impl InMemoryVideo {
    /// All frames must share the size and channel count of the first one.
    pub fn new(name: impl Into<String>, frames: Vec<Frame>) -> Result<Self, VideoError> {
        let name = name.into();
        let first = frames.first().ok_or_else(|| VideoError::Empty(name.clone()))?;
        let (width, height, channels) = (first.width, first.height, first.channels);

        for frame in &frames {
            if (frame.width, frame.height) != (width, height) {
                return Err(VideoError::FrameSize {
                    expected: (width, height),
                    actual: (frame.width, frame.height),
                });
            }
            if frame.channels != channels {
                return Err(VideoError::UnsupportedChannels(frame.channels));
            }
        }

        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(i, mut f)| {
                f.frame_index = i;
                f
            })
            .collect();

        Ok(Self {
            name,
            frames,
            width,
            height,
            channels,
        })
    }
}

impl Video for InMemoryVideo {
    fn name(&self) -> &str {
        &self.name
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn get_frame(&self, index: usize) -> Result<Frame, VideoError> {
        self.check_index(index)?;
        Ok(self.frames[index].clone())
    }
}

/// 图片目录视频源：按文件名排序，每个文件一帧，访问时才解码
#[derive(Debug, Clone)]
pub struct ImageSequenceVideo {
    name: String,
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
    channels: u8,
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

impl ImageSequenceVideo {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, VideoError> {
        let dir = dir.as_ref();
        info!("📂 Opening image sequence: {}", dir.display());

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();

        let name = dir.to_string_lossy().into_owned();
        let first = paths.first().ok_or_else(|| VideoError::Empty(name.clone()))?;

        // 只解码第一帧来确定尺寸和通道
        let first_image = image::open(first)?;
        let channels = if first_image.color().channel_count() == 1 { 1 } else { 3 };

        info!(
            "✅ Image sequence: {} frames, {}x{}, {} channel(s)",
            paths.len(),
            first_image.width(),
            first_image.height(),
            channels
        );

        Ok(Self {
            name,
            paths,
            width: first_image.width(),
            height: first_image.height(),
            channels,
        })
    }
}

impl Video for ImageSequenceVideo {
    fn name(&self) -> &str {
        &self.name
    }

    fn frame_count(&self) -> usize {
        self.paths.len()
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn get_frame(&self, index: usize) -> Result<Frame, VideoError> {
        self.check_index(index)?;
        let path = &self.paths[index];
        debug!("Decoding frame {} from {}", index, path.display());

        let decoded = image::open(path)?;
        let frame = if self.channels == 1 {
            Frame::from_gray(decoded.into_luma8(), index)
        } else {
            Frame::from_rgb(decoded.into_rgb8(), index)
        };

        if (frame.width, frame.height) != (self.width, self.height) {
            return Err(VideoError::FrameSize {
                expected: (self.width, self.height),
                actual: (frame.width, frame.height),
            });
        }
        Ok(frame)
    }
}
