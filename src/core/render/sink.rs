use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageOutputFormat, RgbImage};
use log::{debug, info, warn};

use super::error::RenderError;

/// 输出流：只由写线程持有和修改
pub trait VideoSink: Send {
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), RenderError>;

    /// Finalize the output after the last frame.
    ///
    /// The sink stays alive after a failed `finish`; the caller then calls
    /// [`VideoSink::abort`] to discard the incomplete output.
    fn finish(&mut self) -> Result<(), RenderError>;

    /// Discard partial output after a failure or cancellation.
    fn abort(self: Box<Self>);
}

/// 逐帧写出编号的 JPEG 文件（frame_000000.jpg, ...），交给外部工具封装成视频
pub struct JpegSequenceSink {
    dir: PathBuf,
    quality: u8,
    written: Vec<PathBuf>,
}

impl JpegSequenceSink {
    pub fn create(dir: impl AsRef<Path>, quality: u8) -> Result<Self, RenderError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("📁 Writing JPEG frames to {}", dir.display());
        Ok(Self {
            dir,
            quality: quality.clamp(1, 100),
            written: Vec::new(),
        })
    }

    fn frame_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("frame_{:06}.jpg", n))
    }
}

impl VideoSink for JpegSequenceSink {
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), RenderError> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageOutputFormat::Jpeg(self.quality))?;

        let path = self.frame_path(self.written.len());
        fs::write(&path, buffer.into_inner())?;
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        info!(
            "✓ {} frames written to {}",
            self.written.len(),
            self.dir.display()
        );
        Ok(())
    }

    fn abort(self: Box<Self>) {
        warn!(
            "🧹 Export aborted, removing {} partial frames",
            self.written.len()
        );
        for path in &self.written {
            if let Err(e) = fs::remove_file(path) {
                debug!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}
