use serde::{Deserialize, Deserializer, Serialize};

/// 关键点坐标；缺失点用 NaN 表示
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(deserialize_with = "nan_if_null")]
    pub x: f32,
    #[serde(deserialize_with = "nan_if_null")]
    pub y: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

// serde_json 把 NaN 写成 null，读回时还原
fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, visible: true }
    }

    pub fn hidden(x: f32, y: f32) -> Self {
        Self { x, y, visible: false }
    }

    pub fn missing() -> Self {
        Self {
            x: f32::NAN,
            y: f32::NAN,
            visible: false,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    /// Visible and not missing, i.e. drawable.
    pub fn is_drawable(&self) -> bool {
        self.visible && !self.is_missing()
    }

    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

impl Skeleton {
    pub fn new(nodes: &[&str], edges: &[(&str, &str)]) -> Self {
        Self {
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            edges: edges
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Named keypoints in skeleton node order.
    pub points: Vec<(String, Point)>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub track: Option<Track>,
}

impl Instance {
    pub fn new(points: Vec<(String, Point)>) -> Self {
        Self {
            points,
            score: None,
            track: None,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.track = Some(track);
        self
    }

    pub fn point(&self, node: &str) -> Option<&Point> {
        self.points.iter().find(|(n, _)| n == node).map(|(_, p)| p)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledFrame {
    pub frame_index: usize,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl LabeledFrame {
    pub fn new(frame_index: usize, instances: Vec<Instance>) -> Self {
        Self {
            frame_index,
            instances,
        }
    }

    pub fn scores(&self) -> impl Iterator<Item = f32> + '_ {
        self.instances.iter().filter_map(|inst| inst.score)
    }
}
