use image::{imageops, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

use super::error::VideoError;

/// 帧数据结构（行优先，通道交错存储）
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub channels: u8, // 1 = 灰度, 3 = RGB
    pub data: Vec<u8>,
    pub frame_index: usize,
}

impl Frame {
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
        frame_index: usize,
    ) -> Result<Self, VideoError> {
        if channels != 1 && channels != 3 {
            return Err(VideoError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(VideoError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
            frame_index,
        })
    }

    pub fn from_rgb(image: RgbImage, frame_index: usize) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 3,
            data: image.into_raw(),
            frame_index,
        }
    }

    pub fn from_gray(image: GrayImage, frame_index: usize) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: 1,
            data: image.into_raw(),
            frame_index,
        }
    }

    pub fn largest_dim(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn to_gray(&self) -> GrayImage {
        let gray: Vec<u8> = if self.channels == 1 {
            self.data.clone()
        } else {
            self.data
                .chunks_exact(3)
                .map(|rgb| {
                    ((rgb[0] as u32 * 299 + rgb[1] as u32 * 587 + rgb[2] as u32 * 114) / 1000) as u8
                })
                .collect()
        };
        ImageBuffer::<Luma<u8>, _>::from_raw(self.width, self.height, gray)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let rgb: Vec<u8> = if self.channels == 3 {
            self.data.clone()
        } else {
            self.data.iter().flat_map(|&g| [g, g, g]).collect()
        };
        ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, rgb)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// 抗锯齿缩放（三角滤波）
    pub fn resize_to(&self, target_width: u32, target_height: u32) -> Frame {
        let target_width = target_width.max(1);
        let target_height = target_height.max(1);
        if self.channels == 1 {
            let resized = imageops::resize(
                &self.to_gray(),
                target_width,
                target_height,
                imageops::FilterType::Triangle,
            );
            Frame::from_gray(resized, self.frame_index)
        } else {
            let resized = imageops::resize(
                &self.to_rgb_image(),
                target_width,
                target_height,
                imageops::FilterType::Triangle,
            );
            Frame::from_rgb(resized, self.frame_index)
        }
    }

    /// 按整数倍缩小: w / factor, h / factor
    pub fn shrink_by(&self, factor: u32) -> Frame {
        if factor <= 1 {
            return self.clone();
        }
        self.resize_to(self.width / factor, self.height / factor)
    }

    /// 展平为 [0, 1] 区间的特征行
    pub fn flatten_normalized(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v as f32 / 255.0).collect()
    }
}
