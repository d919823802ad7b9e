//! 视频帧与视频源
//!
//! 视频解码本身由外部提供；这里只定义只读的帧访问接口 [`Video`]，
//! 以及两个实现：内存帧序列和图片目录。

pub mod error;
pub mod frame;
pub mod source;

pub use error::VideoError;
pub use frame::Frame;
pub use source::{ImageSequenceVideo, InMemoryVideo, Video};
