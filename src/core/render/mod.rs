//! 标注视频导出
//!
//! 把标注实例（关键点 + 骨架连线，按轨迹着色）画到视频帧上并按顺序写出。
//! 封装成视频文件由外部完成，这里只负责输出逐帧图像。

pub mod draw;
pub mod error;
pub mod marker;
pub mod pipeline;
pub mod progress;
pub mod sink;

pub use error::RenderError;
pub use marker::FrameMarker;
pub use pipeline::{save_labeled_video, ExportConfig, ExportSummary};
pub use progress::ExportProgress;
pub use sink::{JpegSequenceSink, VideoSink};
