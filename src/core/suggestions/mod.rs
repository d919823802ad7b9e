//! 标注帧建议
//!
//! 给定视频，挑出值得人工标注的帧：等间隔、随机、按图像特征聚类（pca / brisk）
//! 或者按已有预测的置信度挑出需要校对的帧。入口是 [`suggest`]。

#[cfg(feature = "opencv")]
pub mod brisk;
pub mod cluster;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod features;
pub mod keypoints;
pub mod params;
pub mod reduce;
pub mod sampler;
pub mod strategies;

pub use cluster::KMeans;
pub use config::SuggestionConfig;
pub use dispatcher::{
    cluster_suggestions, cluster_suggestions_with_detector, suggest, suggest_with_detector,
};
pub use error::SuggestionError;
pub use features::FeatureStack;
#[cfg(feature = "opencv")]
pub use brisk::OpenCvBriskDetector;
pub use keypoints::{
    default_detector, BinaryKeypointDetector, Descriptor, Keypoint, KeypointDescriptor,
};
pub use params::{
    ClusterParams, MethodName, ProofreadingParams, RandomParams, StrideParams, SuggestionMethod,
};
pub use reduce::Pca;
pub use sampler::{clusters_to_list, feature_stack_to_clusters};
