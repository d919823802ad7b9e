use log::{debug, info};
use rand::Rng;

use super::error::SuggestionError;
use crate::core::labels::LabelStore;
use crate::core::video::Video;

/// 等间隔抽帧：0, step, 2*step, ...，截断为 per_video 个
pub fn strides(video: &dyn Video, per_video: usize) -> Result<Vec<usize>, SuggestionError> {
    let frame_count = video.frame_count();
    let step = frame_count.checked_div(per_video).unwrap_or(0);
    if step == 0 {
        return Err(SuggestionError::DegenerateStride {
            frame_count,
            divisor: per_video,
        });
    }

    let suggestions: Vec<usize> = (0..frame_count).step_by(step).take(per_video).collect();
    debug!("strides: step {} -> {} frames", step, suggestions.len());
    Ok(suggestions)
}

/// 无放回随机抽帧
pub fn random<R: Rng + ?Sized>(
    video: &dyn Video,
    per_video: usize,
    rng: &mut R,
) -> Result<Vec<usize>, SuggestionError> {
    let frame_count = video.frame_count();
    if per_video > frame_count {
        return Err(SuggestionError::InsufficientFrames {
            requested: per_video,
            available: frame_count,
        });
    }

    Ok(rand::seq::index::sample(rng, frame_count, per_video).into_vec())
}

/// 校对建议：找出低分实例数达到 instance_limit 的帧（按数据集存储顺序返回）
pub fn proofreading(
    video: &dyn Video,
    labels: &dyn LabelStore,
    score_limit: f32,
    instance_limit: usize,
) -> Vec<usize> {
    let labeled_frames = labels.find(video);
    let total = labeled_frames.len();

    let result: Vec<usize> = labeled_frames
        .into_iter()
        .filter(|lf| {
            // 没有分数的实例不算低分
            let low = lf.scores().filter(|&s| s < score_limit).count();
            low >= instance_limit
        })
        .map(|lf| lf.frame_index)
        .collect();

    info!(
        "🔎 Proofreading: {}/{} labeled frames below score {} (limit {})",
        result.len(),
        total,
        score_limit,
        instance_limit
    );
    result
}
