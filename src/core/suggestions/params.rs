//! 建议方法及其参数
//!
//! 动态输入（例如界面或命令行传来的 JSON 字典）通过
//! [`SuggestionMethod::from_options`] 解析为强类型枚举；
//! 未知方法名和缺少必填参数分别报 `UnknownStrategy` / `MissingParameter`，
//! 多余的键会被忽略。

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::error::SuggestionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodName {
    Strides,
    Random,
    Pca,
    Brisk,
    Proofreading,
}

impl MethodName {
    pub const ALL: [MethodName; 5] = [
        MethodName::Strides,
        MethodName::Random,
        MethodName::Pca,
        MethodName::Brisk,
        MethodName::Proofreading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodName::Strides => "strides",
            MethodName::Random => "random",
            MethodName::Pca => "pca",
            MethodName::Brisk => "brisk",
            MethodName::Proofreading => "proofreading",
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodName {
    type Err = SuggestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| SuggestionError::UnknownStrategy(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrideParams {
    #[serde(default = "default_per_video")]
    pub per_video: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RandomParams {
    #[serde(default = "default_per_video")]
    pub per_video: usize,
}

/// Parameters shared by the clustering methods (`pca`, `brisk`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterParams {
    /// Roughly how many frames to sample from the video for feature extraction.
    pub initial_samples: usize,
    #[serde(default = "default_clusters")]
    pub clusters: usize,
    #[serde(default = "default_per_cluster")]
    pub per_cluster: usize,
    #[serde(default = "default_pca_components")]
    pub pca_components: usize,
    #[serde(default = "default_interleave")]
    pub interleave: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProofreadingParams {
    #[serde(deserialize_with = "number_or_string")]
    pub score_limit: f32,
    #[serde(deserialize_with = "number_or_string")]
    pub instance_limit: usize,
}

fn default_per_video() -> usize {
    20
}

fn default_clusters() -> usize {
    5
}

fn default_per_cluster() -> usize {
    5
}

fn default_pca_components() -> usize {
    50
}

fn default_interleave() -> bool {
    true
}

impl ClusterParams {
    pub fn new(initial_samples: usize) -> Self {
        Self {
            initial_samples,
            clusters: default_clusters(),
            per_cluster: default_per_cluster(),
            pca_components: default_pca_components(),
            interleave: default_interleave(),
        }
    }
}

impl Default for StrideParams {
    fn default() -> Self {
        Self {
            per_video: default_per_video(),
        }
    }
}

impl Default for RandomParams {
    fn default() -> Self {
        Self {
            per_video: default_per_video(),
        }
    }
}

// 界面里的数值参数有时以字符串形式传入
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + DeserializeOwned,
    T::Err: fmt::Display,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse::<T>().map_err(serde::de::Error::custom),
        other => T::deserialize(other).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionMethod {
    Strides(StrideParams),
    Random(RandomParams),
    Pca(ClusterParams),
    Brisk(ClusterParams),
    Proofreading(ProofreadingParams),
}

impl SuggestionMethod {
    pub fn name(&self) -> MethodName {
        match self {
            SuggestionMethod::Strides(_) => MethodName::Strides,
            SuggestionMethod::Random(_) => MethodName::Random,
            SuggestionMethod::Pca(_) => MethodName::Pca,
            SuggestionMethod::Brisk(_) => MethodName::Brisk,
            SuggestionMethod::Proofreading(_) => MethodName::Proofreading,
        }
    }

    /// Parse `{"method": "...", <options>...}`.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, SuggestionError> {
        let method = options
            .get("method")
            .ok_or_else(|| SuggestionError::MissingParameter("method".to_string()))?;
        let method = method
            .as_str()
            .ok_or_else(|| SuggestionError::invalid("method", "expected a string"))?;

        match method.parse::<MethodName>()? {
            MethodName::Strides => Ok(SuggestionMethod::Strides(parse_params(options, &[])?)),
            MethodName::Random => Ok(SuggestionMethod::Random(parse_params(options, &[])?)),
            MethodName::Pca => Ok(SuggestionMethod::Pca(parse_params(
                options,
                &["initial_samples"],
            )?)),
            MethodName::Brisk => Ok(SuggestionMethod::Brisk(parse_params(
                options,
                &["initial_samples"],
            )?)),
            MethodName::Proofreading => Ok(SuggestionMethod::Proofreading(parse_params(
                options,
                &["score_limit", "instance_limit"],
            )?)),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SuggestionError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SuggestionError::invalid("options", e.to_string()))?;
        match value {
            Value::Object(map) => Self::from_options(&map),
            _ => Err(SuggestionError::invalid("options", "expected a JSON object")),
        }
    }
}

fn parse_params<T: DeserializeOwned>(
    options: &Map<String, Value>,
    required: &[&str],
) -> Result<T, SuggestionError> {
    if let Some(missing) = required.iter().find(|key| !options.contains_key(**key)) {
        return Err(SuggestionError::MissingParameter(missing.to_string()));
    }
    serde_json::from_value(Value::Object(options.clone()))
        .map_err(|e| SuggestionError::invalid("options", e.to_string()))
}
