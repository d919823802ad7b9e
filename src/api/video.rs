//! 标注视频导出器

use std::ops::ControlFlow;
use std::path::Path;

use crate::core::frame_list::parse_frame_list;
use crate::core::labels::Labels;
use crate::core::render::{
    save_labeled_video, ExportConfig, ExportProgress, ExportSummary, JpegSequenceSink,
    RenderError, VideoSink,
};
use crate::core::video::Video;
use log::info;

/// 标注视频导出器 - 把实例骨架画到帧上，按顺序写出 JPEG 帧序列
///
/// ```ignore
/// let exporter = LabeledVideoExporter::create();
/// let summary = exporter.export_frame_list(&video, &labels, "0-99", "out/frames")?;
/// ```
pub struct LabeledVideoExporter {
    config: ExportConfig,
}

impl LabeledVideoExporter {
    pub fn create() -> Self {
        Self::with_config(ExportConfig::default())
    }

    pub fn with_config(config: ExportConfig) -> Self {
        crate::init_logging();
        info!(
            "🎞️ LabeledVideoExporter: created (chunk size {}, quality {})",
            config.chunk_size, config.jpeg_quality
        );
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// 导出指定帧；`frames` 为 None 时导出所有带实例的帧
    pub fn export_to_dir(
        &self,
        video: &dyn Video,
        labels: &Labels,
        frames: Option<&[usize]>,
        out_dir: impl AsRef<Path>,
    ) -> Result<ExportSummary, RenderError> {
        let sink = JpegSequenceSink::create(out_dir, self.config.jpeg_quality)?;
        let default_frames;
        let frames = match frames {
            Some(frames) => frames,
            None => {
                default_frames = labels.frames_with_instances(video);
                &default_frames
            }
        };
        self.export_with_progress(video, labels, frames, Box::new(sink), |_| {
            ControlFlow::Continue(())
        })
    }

    /// 帧列表字符串："1,2,3"、"1-3"，空字符串表示所有带实例的帧
    pub fn export_frame_list(
        &self,
        video: &dyn Video,
        labels: &Labels,
        frame_list: &str,
        out_dir: impl AsRef<Path>,
    ) -> Result<ExportSummary, RenderError> {
        let frames = parse_frame_list(frame_list)?;
        self.export_to_dir(video, labels, frames.as_deref(), out_dir)
    }

    /// 写到任意输出；回调返回 `ControlFlow::Break` 可中途取消
    pub fn export_with_progress<F>(
        &self,
        video: &dyn Video,
        labels: &Labels,
        frames: &[usize],
        sink: Box<dyn VideoSink>,
        on_progress: F,
    ) -> Result<ExportSummary, RenderError>
    where
        F: FnMut(&ExportProgress) -> ControlFlow<()>,
    {
        save_labeled_video(video, labels, frames, sink, &self.config, on_progress)
    }
}

impl Default for LabeledVideoExporter {
    fn default() -> Self {
        Self::create()
    }
}

impl Drop for LabeledVideoExporter {
    fn drop(&mut self) {
        info!("🗑️ LabeledVideoExporter: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::labels::{Instance, LabeledFrame, Point};
    use crate::core::video::{Frame, InMemoryVideo};

    fn video() -> InMemoryVideo {
        let frames = (0..10)
            .map(|i| Frame::new(8, 8, 3, vec![(i * 20) as u8; 192], i).unwrap())
            .collect();
        InMemoryVideo::new("clip", frames).unwrap()
    }

    fn labels() -> Labels {
        let mut labels = Labels::default();
        let instance = Instance::new(vec![("nose".to_string(), Point::new(4.0, 4.0))]);
        labels.push_frame("clip", LabeledFrame::new(6, vec![instance.clone()]));
        labels.push_frame("clip", LabeledFrame::new(2, vec![instance]));
        labels.push_frame("clip", LabeledFrame::new(8, vec![]));
        labels
    }

    fn jpg_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.path().extension().is_some_and(|x| x == "jpg"))
                    .unwrap_or(false)
            })
            .count()
    }

    #[test]
    fn test_default_frames_are_labeled_frames() {
        let dir = tempfile::tempdir().unwrap();
        let summary = LabeledVideoExporter::create()
            .export_to_dir(&video(), &labels(), None, dir.path())
            .unwrap();
        // 帧 2 和 6 有实例，帧 8 没有
        assert_eq!(summary.frames_written, 2);
        assert_eq!(jpg_count(dir.path()), 2);
    }

    #[test]
    fn test_export_frame_list() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = LabeledVideoExporter::with_config(ExportConfig::for_preview());
        let summary = exporter
            .export_frame_list(&video(), &labels(), "0-4,9", dir.path())
            .unwrap();
        assert_eq!(summary.frames_written, 6);
        assert_eq!(jpg_count(dir.path()), 6);

        assert!(matches!(
            exporter.export_frame_list(&video(), &labels(), "3-x", dir.path()),
            Err(RenderError::FrameList(_))
        ));
    }
}
