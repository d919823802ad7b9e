//! 特征矩阵构建：稠密像素特征 / 二值关键点描述子
//!
//! 矩阵的行不一定和帧一一对应（一帧可能产生 0 或多个描述子），
//! `frame_map[row]` 记录每一行来自哪一帧。

use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;

use super::config::SuggestionConfig;
use super::error::SuggestionError;
use super::keypoints::{KeypointDescriptor, DESCRIPTOR_BYTES};
use crate::core::video::{Frame, Video};

#[derive(Debug, Clone)]
pub struct FeatureStack {
    pub matrix: Array2<f32>,
    pub frame_map: Vec<usize>,
}

impl FeatureStack {
    pub fn new(matrix: Array2<f32>, frame_map: Vec<usize>) -> Result<Self, SuggestionError> {
        if matrix.nrows() != frame_map.len() {
            return Err(SuggestionError::invalid(
                "frame_map",
                format!(
                    "{} rows but {} frame indices",
                    matrix.nrows(),
                    frame_map.len()
                ),
            ));
        }
        Ok(Self { matrix, frame_map })
    }

    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    fn from_rows(rows: Vec<Vec<f32>>, frame_map: Vec<usize>) -> Result<Self, SuggestionError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let height = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((height, width), flat)?;
        Self::new(matrix, frame_map)
    }
}

/// 缩小倍数：最大边 / factor 不超过 rescale_below
pub fn scale_factor(height: u32, width: u32, config: &SuggestionConfig) -> u32 {
    let mut factor = 1;
    if config.rescale {
        let largest_dim = height.max(width) as f64;
        let limit = config.rescale_below as f64;
        while largest_dim / factor as f64 > limit {
            factor += 1;
        }
    }
    factor
}

/// `frame_count / initial_samples`, rejecting a zero step.
pub fn sample_step(video: &dyn Video, initial_samples: usize) -> Result<usize, SuggestionError> {
    let frame_count = video.frame_count();
    match frame_count.checked_div(initial_samples) {
        Some(step) if step > 0 => Ok(step),
        _ => Err(SuggestionError::DegenerateStride {
            frame_count,
            divisor: initial_samples,
        }),
    }
}

fn dense_row(frame: &Frame, config: &SuggestionConfig) -> Vec<f32> {
    if config.rescale && frame.largest_dim() > config.rescale_below {
        frame
            .resize_to(frame.width / 2, frame.height / 2)
            .flatten_normalized()
    } else {
        frame.flatten_normalized()
    }
}

/// 稠密特征：每 sample_step 帧取一帧，展平像素作为一行
pub fn dense_feature_stack(
    video: &dyn Video,
    sample_step: usize,
    config: &SuggestionConfig,
) -> Result<FeatureStack, SuggestionError> {
    if sample_step == 0 {
        return Err(SuggestionError::DegenerateStride {
            frame_count: video.frame_count(),
            divisor: 0,
        });
    }
    let sample_count = video.frame_count() / sample_step;
    let frame_map: Vec<usize> = (0..sample_count).map(|i| i * sample_step).collect();

    info!(
        "🧮 Dense features: {} frames (step {})",
        frame_map.len(),
        sample_step
    );

    let rows: Vec<Vec<f32>> = frame_map
        .par_iter()
        .map(|&idx| -> Result<Vec<f32>, SuggestionError> {
            let frame = video.get_frame(idx)?;
            Ok(dense_row(&frame, config))
        })
        .collect::<Result<_, _>>()?;

    if rows.is_empty() {
        return Err(SuggestionError::EmptyFeatureStack);
    }
    debug!("Dense feature width: {}", rows[0].len());

    FeatureStack::from_rows(rows, frame_map)
}

/// 关键点特征：每个描述子一行，无检测结果的帧跳过
pub fn keypoint_feature_stack(
    video: &dyn Video,
    sample_step: usize,
    config: &SuggestionConfig,
    detector: &dyn KeypointDescriptor,
) -> Result<FeatureStack, SuggestionError> {
    if sample_step == 0 {
        return Err(SuggestionError::DegenerateStride {
            frame_count: video.frame_count(),
            divisor: 0,
        });
    }
    let factor = scale_factor(video.height(), video.width(), config);
    let sampled: Vec<usize> = (0..video.frame_count()).step_by(sample_step).collect();

    info!(
        "🔑 Keypoint features: {} frames (step {}, shrink x{})",
        sampled.len(),
        sample_step,
        factor
    );

    let per_frame: Vec<(usize, Vec<Vec<f32>>)> = sampled
        .par_iter()
        .map(|&idx| -> Result<(usize, Vec<Vec<f32>>), SuggestionError> {
            let frame = video.get_frame(idx)?.shrink_by(factor);
            let descriptors = detector
                .detect_and_compute(&frame.to_gray())
                .into_iter()
                .map(|(_, desc)| desc.iter().map(|&b| b as f32).collect())
                .collect();
            Ok((idx, descriptors))
        })
        .collect::<Result<_, _>>()?;

    let mut rows = Vec::new();
    let mut frame_map = Vec::new();
    for (idx, descriptors) in per_frame {
        if descriptors.is_empty() {
            debug!("Frame {} has no keypoints", idx);
            continue;
        }
        frame_map.extend(std::iter::repeat(idx).take(descriptors.len()));
        rows.extend(descriptors);
    }

    if rows.is_empty() {
        return Err(SuggestionError::EmptyFeatureStack);
    }
    info!(
        "✓ {} descriptors ({} columns) from {} frames",
        rows.len(),
        DESCRIPTOR_BYTES,
        sampled.len()
    );

    FeatureStack::from_rows(rows, frame_map)
}
