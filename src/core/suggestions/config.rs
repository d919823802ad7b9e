use rand::rngs::StdRng;
use rand::SeedableRng;

/// 建议生成的全局配置（替代类级别的可变状态，每次调用显式传入）
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionConfig {
    /// Shrink large frames before feature extraction.
    pub rescale: bool,
    /// Largest frame dimension (px) kept without shrinking.
    pub rescale_below: u32,
    /// Seed for sampling, PCA and k-means; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            rescale: true,
            rescale_below: 512,
            seed: None,
        }
    }
}

impl SuggestionConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn without_rescale() -> Self {
        Self {
            rescale: false,
            ..Default::default()
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
