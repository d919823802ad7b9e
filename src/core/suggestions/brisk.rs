//! OpenCV BRISK 关键点（`opencv` 特性）

use image::GrayImage;
use log::warn;
use opencv::core::{KeyPoint, Mat, Vector};
use opencv::features2d::BRISK;
use opencv::prelude::*;

use super::keypoints::{Descriptor, Keypoint, KeypointDescriptor, DESCRIPTOR_BYTES};

/// BRISK 检测 + 描述子，参数与 OpenCV 默认值相同
pub struct OpenCvBriskDetector {
    threshold: i32,
    octaves: i32,
    pattern_scale: f32,
}

impl OpenCvBriskDetector {
    pub fn new() -> Self {
        Self {
            threshold: 30,
            octaves: 3,
            pattern_scale: 1.0,
        }
    }

    fn try_detect(&self, image: &GrayImage) -> opencv::Result<Vec<(Keypoint, Descriptor)>> {
        let (width, height) = image.dimensions();
        let mat = Mat::new_rows_cols_with_data(height as i32, width as i32, image.as_raw())?
            .try_clone()?;

        // BRISK 的 detect_and_compute 需要 &mut，每次调用单独创建
        let mut brisk = BRISK::create(self.threshold, self.octaves, self.pattern_scale)?;
        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        brisk.detect_and_compute(
            &mat,
            &Mat::default(),
            &mut keypoints,
            &mut descriptors,
            false,
        )?;

        let mut features = Vec::with_capacity(keypoints.len());
        for (row, kp) in keypoints.iter().enumerate() {
            let bytes = descriptors.at_row::<u8>(row as i32)?;
            if bytes.len() != DESCRIPTOR_BYTES {
                continue;
            }
            let mut descriptor = [0u8; DESCRIPTOR_BYTES];
            descriptor.copy_from_slice(bytes);

            let pt = kp.pt();
            // OpenCV 角度单位是度，-1 表示未计算
            let angle = if kp.angle() < 0.0 {
                0.0
            } else {
                kp.angle().to_radians()
            };
            features.push((
                Keypoint {
                    x: pt.x,
                    y: pt.y,
                    scale: 2f32.powi(kp.octave().max(0)),
                    angle,
                    response: kp.response(),
                },
                descriptor,
            ));
        }
        Ok(features)
    }
}

impl Default for OpenCvBriskDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeypointDescriptor for OpenCvBriskDetector {
    fn detect_and_compute(&self, image: &GrayImage) -> Vec<(Keypoint, Descriptor)> {
        self.try_detect(image).unwrap_or_else(|e| {
            warn!("⚠️ OpenCV BRISK failed: {}", e);
            Vec::new()
        })
    }
}
