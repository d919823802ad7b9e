//! 建议入口：按方法分发到具体策略

use std::time::Instant;

use log::info;
use rand::Rng;

use super::config::SuggestionConfig;
use super::error::SuggestionError;
use super::features::{dense_feature_stack, keypoint_feature_stack, sample_step, FeatureStack};
use super::keypoints::{default_detector, KeypointDescriptor};
use super::params::{ClusterParams, SuggestionMethod};
use super::sampler::{clusters_to_list, feature_stack_to_clusters};
use super::strategies;
use crate::core::labels::LabelStore;
use crate::core::video::Video;

/// Suggest frame indices of `video` to label with the given method.
///
/// `labels` is only consulted by `proofreading`. `brisk` runs with
/// [`default_detector`]; see [`suggest_with_detector`] to plug in another one.
pub fn suggest(
    video: &dyn Video,
    method: &SuggestionMethod,
    labels: Option<&dyn LabelStore>,
    config: &SuggestionConfig,
) -> Result<Vec<usize>, SuggestionError> {
    suggest_with_detector(video, method, labels, config, default_detector().as_ref())
}

pub fn suggest_with_detector(
    video: &dyn Video,
    method: &SuggestionMethod,
    labels: Option<&dyn LabelStore>,
    config: &SuggestionConfig,
    detector: &dyn KeypointDescriptor,
) -> Result<Vec<usize>, SuggestionError> {
    let start = Instant::now();
    info!(
        "🎯 Suggesting frames for {} ({} frames) with {}",
        video.name(),
        video.frame_count(),
        method.name()
    );

    let mut rng = config.rng();
    let suggestions = match method {
        SuggestionMethod::Strides(p) => strategies::strides(video, p.per_video)?,
        SuggestionMethod::Random(p) => strategies::random(video, p.per_video, &mut rng)?,
        SuggestionMethod::Pca(p) => {
            let stack = build_stack(video, method, p, config, detector)?;
            cluster_and_merge(&stack, p, &mut rng)?
        }
        SuggestionMethod::Brisk(p) => {
            let stack = build_stack(video, method, p, config, detector)?;
            cluster_and_merge(&stack, p, &mut rng)?
        }
        SuggestionMethod::Proofreading(p) => {
            let labels = labels.ok_or(SuggestionError::MissingLabels)?;
            strategies::proofreading(video, labels, p.score_limit, p.instance_limit)
        }
    };

    info!(
        "✅ {} suggestions in {:.2}s",
        suggestions.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(suggestions)
}

/// 调试视图：返回每个簇各自选中的帧，而不是合并后的列表。
/// 只对 `pca` / `brisk` 有意义。
pub fn cluster_suggestions(
    video: &dyn Video,
    method: &SuggestionMethod,
    config: &SuggestionConfig,
) -> Result<Vec<Vec<usize>>, SuggestionError> {
    cluster_suggestions_with_detector(video, method, config, default_detector().as_ref())
}

pub fn cluster_suggestions_with_detector(
    video: &dyn Video,
    method: &SuggestionMethod,
    config: &SuggestionConfig,
    detector: &dyn KeypointDescriptor,
) -> Result<Vec<Vec<usize>>, SuggestionError> {
    let params = match method {
        SuggestionMethod::Pca(p) | SuggestionMethod::Brisk(p) => p,
        other => {
            return Err(SuggestionError::invalid(
                "method",
                format!("{} does not produce clusters", other.name()),
            ))
        }
    };

    let stack = build_stack(video, method, params, config, detector)?;
    feature_stack_to_clusters(&stack, params, &mut config.rng())
}

fn build_stack(
    video: &dyn Video,
    method: &SuggestionMethod,
    params: &ClusterParams,
    config: &SuggestionConfig,
    detector: &dyn KeypointDescriptor,
) -> Result<FeatureStack, SuggestionError> {
    let step = sample_step(video, params.initial_samples)?;
    match method {
        SuggestionMethod::Brisk(_) => keypoint_feature_stack(video, step, config, detector),
        _ => dense_feature_stack(video, step, config),
    }
}

fn cluster_and_merge<R: Rng + ?Sized>(
    stack: &FeatureStack,
    params: &ClusterParams,
    rng: &mut R,
) -> Result<Vec<usize>, SuggestionError> {
    let selected = feature_stack_to_clusters(stack, params, rng)?;
    Ok(clusters_to_list(&selected, params.interleave))
}
