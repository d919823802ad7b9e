use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::error::LabelsError;
use super::model::{LabeledFrame, Skeleton, Track};
use crate::core::video::Video;

/// 只读的标注数据接口
pub trait LabelStore: Send + Sync {
    /// Labeled frames of `video` in stored order.
    fn find(&self, video: &dyn Video) -> Vec<&LabeledFrame>;

    fn find_frame(&self, video: &dyn Video, frame_index: usize) -> Option<&LabeledFrame>;

    /// Every track known to the dataset, in dataset order.
    fn tracks(&self) -> &[Track];

    fn skeleton(&self) -> &Skeleton;
}

/// In-memory dataset keyed by video name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Labels {
    #[serde(default)]
    pub skeleton: Skeleton,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub videos: HashMap<String, Vec<LabeledFrame>>,
}

impl Labels {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LabelsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LabelsError> {
        let path = path.as_ref();
        info!("📖 Reading labels: {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        let labels = Self::from_json_str(&raw)?;
        info!(
            "✓ Loaded labels: {} video(s), {} track(s)",
            labels.videos.len(),
            labels.tracks.len()
        );
        Ok(labels)
    }

    pub fn add_track(&mut self, track: Track) {
        if !self.tracks.contains(&track) {
            self.tracks.push(track);
        }
    }

    pub fn push_frame(&mut self, video_name: &str, frame: LabeledFrame) {
        self.videos
            .entry(video_name.to_string())
            .or_default()
            .push(frame);
    }

    /// 有实例的帧索引（升序），导出视频时的默认帧列表
    pub fn frames_with_instances(&self, video: &dyn Video) -> Vec<usize> {
        let mut frames: Vec<usize> = self
            .find(video)
            .into_iter()
            .filter(|lf| !lf.instances.is_empty())
            .map(|lf| lf.frame_index)
            .collect();
        frames.sort_unstable();
        frames.dedup();
        frames
    }
}

impl LabelStore for Labels {
    fn find(&self, video: &dyn Video) -> Vec<&LabeledFrame> {
        self.videos
            .get(video.name())
            .map(|frames| frames.iter().collect())
            .unwrap_or_default()
    }

    fn find_frame(&self, video: &dyn Video, frame_index: usize) -> Option<&LabeledFrame> {
        self.videos
            .get(video.name())?
            .iter()
            .find(|lf| lf.frame_index == frame_index)
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::labels::model::{Instance, Point};
    use crate::core::video::{Frame, InMemoryVideo};

    fn video(name: &str) -> InMemoryVideo {
        let frame = Frame::new(2, 2, 1, vec![0; 4], 0).unwrap();
        InMemoryVideo::new(name, vec![frame; 10]).unwrap()
    }

    fn instance() -> Instance {
        Instance::new(vec![("a".into(), Point::new(0.0, 0.0))])
    }

    #[test]
    fn test_find_keeps_stored_order() {
        let mut labels = Labels::default();
        labels.push_frame("v", LabeledFrame::new(7, vec![instance()]));
        labels.push_frame("v", LabeledFrame::new(2, vec![]));
        labels.push_frame("other", LabeledFrame::new(1, vec![instance()]));

        let v = video("v");
        let found: Vec<usize> = labels.find(&v).iter().map(|lf| lf.frame_index).collect();
        assert_eq!(found, vec![7, 2]);

        assert!(labels.find_frame(&v, 2).is_some());
        assert!(labels.find_frame(&v, 1).is_none());
        assert!(labels.find(&video("missing")).is_empty());
    }

    #[test]
    fn test_frames_with_instances_sorted() {
        let mut labels = Labels::default();
        labels.push_frame("v", LabeledFrame::new(9, vec![instance()]));
        labels.push_frame("v", LabeledFrame::new(4, vec![]));
        labels.push_frame("v", LabeledFrame::new(3, vec![instance()]));

        assert_eq!(labels.frames_with_instances(&video("v")), vec![3, 9]);
    }

    #[test]
    fn test_add_track_dedups() {
        let mut labels = Labels::default();
        labels.add_track(Track::new("mouse-1"));
        labels.add_track(Track::new("mouse-1"));
        labels.add_track(Track::new("mouse-2"));
        assert_eq!(labels.tracks().len(), 2);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "skeleton": {"nodes": ["head", "tail"], "edges": [["head", "tail"]]},
            "tracks": [{"name": "t0"}],
            "videos": {
                "v": [
                    {"frame_index": 5, "instances": [
                        {"points": [["head", {"x": 1.0, "y": 2.0}],
                                    ["tail", {"x": null, "y": null, "visible": false}]],
                         "score": 0.25, "track": {"name": "t0"}}
                    ]}
                ]
            }
        }"#;
        let labels = Labels::from_json_str(json).unwrap();
        assert_eq!(labels.skeleton().edges.len(), 1);

        let lf = labels.find_frame(&video("v"), 5).unwrap();
        let inst = &lf.instances[0];
        assert_eq!(inst.score, Some(0.25));
        assert!(inst.point("tail").unwrap().is_missing());
        assert_eq!(inst.track.as_ref().unwrap().name, "t0");
    }
}
