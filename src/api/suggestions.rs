//! 标注帧建议器

use crate::core::labels::LabelStore;
use crate::core::suggestions::{
    cluster_suggestions_with_detector, default_detector, suggest_with_detector,
    KeypointDescriptor, SuggestionConfig, SuggestionError, SuggestionMethod,
};
use crate::core::video::Video;
use log::{error, info};

/// 标注帧建议器 - 等间隔 / 随机 / 图像聚类 / 校对
///
/// ```ignore
/// let suggester = FrameSuggester::create();
/// let options = r#"{"method": "pca", "initial_samples": 200}"#;
/// let frames = suggester.suggest_from_json(&video, options, None)?;
/// ```
pub struct FrameSuggester {
    config: SuggestionConfig,
    detector: Box<dyn KeypointDescriptor>,
}

impl FrameSuggester {
    /// 默认配置（大帧先缩小，随机种子取自系统）
    pub fn create() -> Self {
        Self::with_config(SuggestionConfig::default())
    }

    pub fn with_config(config: SuggestionConfig) -> Self {
        crate::init_logging();
        info!(
            "🧭 FrameSuggester: created (rescale: {}, seed: {:?})",
            config.rescale, config.seed
        );
        Self {
            config,
            detector: default_detector(),
        }
    }

    /// 替换 `brisk` 方法使用的关键点检测器
    pub fn with_detector(mut self, detector: Box<dyn KeypointDescriptor>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// 生成建议帧列表
    pub fn suggest(
        &self,
        video: &dyn Video,
        method: &SuggestionMethod,
        labels: Option<&dyn LabelStore>,
    ) -> Result<Vec<usize>, SuggestionError> {
        suggest_with_detector(video, method, labels, &self.config, self.detector.as_ref())
            .inspect_err(|e| error!("❌ Suggestion failed: {}", e))
    }

    /// 从 JSON 选项生成建议，例如 `{"method": "strides", "per_video": 20}`
    pub fn suggest_from_json(
        &self,
        video: &dyn Video,
        options_json: &str,
        labels: Option<&dyn LabelStore>,
    ) -> Result<Vec<usize>, SuggestionError> {
        let method = SuggestionMethod::from_json_str(options_json)?;
        self.suggest(video, &method, labels)
    }

    /// 每个簇各自的选帧结果（仅 pca / brisk）
    pub fn clusters(
        &self,
        video: &dyn Video,
        method: &SuggestionMethod,
    ) -> Result<Vec<Vec<usize>>, SuggestionError> {
        cluster_suggestions_with_detector(video, method, &self.config, self.detector.as_ref())
    }
}

impl Default for FrameSuggester {
    fn default() -> Self {
        Self::create()
    }
}

impl Drop for FrameSuggester {
    fn drop(&mut self) {
        info!("🗑️ FrameSuggester: released");
    }
}
