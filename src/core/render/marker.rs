use image::{Rgb, RgbImage};

use super::draw::{draw_line, fill_circle, palette_color};
use crate::core::labels::{Instance, LabelStore};
use crate::core::video::{Frame, Video};

/// 在帧上叠加实例骨架
pub struct FrameMarker<'a> {
    labels: &'a dyn LabelStore,
    video: &'a dyn Video,
    marker_radius: u32,
}

impl<'a> FrameMarker<'a> {
    pub fn new(labels: &'a dyn LabelStore, video: &'a dyn Video, marker_radius: u32) -> Self {
        Self {
            labels,
            video,
            marker_radius,
        }
    }

    /// RGB copy of `frame` with every instance labeled at `frame_index` drawn on it.
    pub fn annotate(&self, frame_index: usize, frame: &Frame) -> RgbImage {
        let mut img = frame.to_rgb_image();
        let Some(labeled) = self.labels.find_frame(self.video, frame_index) else {
            return img;
        };

        let tracks = self.labels.tracks();
        let mut untracked = 0;
        for instance in &labeled.instances {
            // 无轨迹的实例排在所有已知轨迹之后
            let track_index = match instance
                .track
                .as_ref()
                .and_then(|t| tracks.iter().position(|known| known == t))
            {
                Some(index) => index,
                None => {
                    untracked += 1;
                    tracks.len() + untracked - 1
                }
            };
            self.draw_instance(&mut img, instance, palette_color(track_index));
        }
        img
    }

    fn draw_instance(&self, img: &mut RgbImage, instance: &Instance, color: Rgb<u8>) {
        for (_, point) in &instance.points {
            if point.is_drawable() {
                fill_circle(img, point.to_pixel(), self.marker_radius, color);
            }
        }

        for (src, dst) in &self.labels.skeleton().edges {
            if let (Some(a), Some(b)) = (instance.point(src), instance.point(dst)) {
                if a.is_drawable() && b.is_drawable() {
                    draw_line(img, a.to_pixel(), b.to_pixel(), color);
                }
            }
        }
    }
}
