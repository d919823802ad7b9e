//! 二值局部特征：多尺度 FAST-9 角点 + 旋转归一的二值描述子
//!
//! 每个关键点在所在金字塔层上计算灰度质心方向，按该方向旋转固定的采样点对，
//! 比较平滑后图像上的亮度得到 512 bit 描述子，因此对尺度和旋转都不敏感。

use image::{imageops, GrayImage};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DESCRIPTOR_BYTES: usize = 64;
const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// Sampling pattern radius (px, at the keypoint's pyramid level).
const PATTERN_RADIUS: i32 = 12;
/// Rotated pattern plus FAST circle must stay inside the image.
const BORDER: u32 = 18;

pub type Descriptor = [u8; DESCRIPTOR_BYTES];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Position in full-resolution image coordinates.
    pub x: f32,
    pub y: f32,
    /// Pyramid scale (1, 2, 4, ...).
    pub scale: f32,
    /// Orientation in radians.
    pub angle: f32,
    pub response: f32,
}

pub trait KeypointDescriptor: Send + Sync {
    fn detect_and_compute(&self, image: &GrayImage) -> Vec<(Keypoint, Descriptor)>;
}

/// `brisk` 默认的检测器：启用 `opencv` 特性时用 OpenCV BRISK，否则用 [`BinaryKeypointDetector`]
pub fn default_detector() -> Box<dyn KeypointDescriptor> {
    #[cfg(feature = "opencv")]
    {
        Box::new(super::brisk::OpenCvBriskDetector::new())
    }
    #[cfg(not(feature = "opencv"))]
    {
        Box::new(BinaryKeypointDetector::new())
    }
}

// Bresenham 圆，半径 3，16 个点
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

static SAMPLING_PAIRS: Lazy<Vec<[(f32, f32); 2]>> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(0x5EED_B15C);
    let r = PATTERN_RADIUS as f32;
    (0..DESCRIPTOR_BITS)
        .map(|_| {
            let a = (rng.random_range(-r..=r), rng.random_range(-r..=r));
            let b = (rng.random_range(-r..=r), rng.random_range(-r..=r));
            [a, b]
        })
        .collect()
});

pub struct BinaryKeypointDetector {
    threshold: u8,
    octaves: u32,
    max_keypoints: usize,
}

impl BinaryKeypointDetector {
    pub fn new() -> Self {
        Self {
            threshold: 30,
            octaves: 3,
            max_keypoints: 500,
        }
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves.max(1);
        self
    }

    pub fn with_max_keypoints(mut self, max_keypoints: usize) -> Self {
        self.max_keypoints = max_keypoints;
        self
    }

    /// FAST-9 分段测试；返回角点响应（非角点为 0）
    fn corner_score(&self, img: &GrayImage, x: u32, y: u32) -> f32 {
        let center = img.get_pixel(x, y)[0] as i32;
        let t = self.threshold as i32;

        let mut states = [0i8; 16];
        let mut diffs = [0i32; 16];
        for (i, (dx, dy)) in CIRCLE.iter().enumerate() {
            let p = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i32;
            diffs[i] = p - center;
            states[i] = if p > center + t {
                1
            } else if p < center - t {
                -1
            } else {
                0
            };
        }

        // 9 个连续点至少覆盖 4 个方位点中的 2 个
        let compass = [states[0], states[4], states[8], states[12]];
        let bright = compass.iter().filter(|&&s| s == 1).count();
        let dark = compass.iter().filter(|&&s| s == -1).count();
        if bright < 2 && dark < 2 {
            return 0.0;
        }

        for target in [1i8, -1i8] {
            let mut run = 0;
            for i in 0..(16 + 9) {
                if states[i % 16] == target {
                    run += 1;
                    if run >= 9 {
                        let score: i32 = diffs
                            .iter()
                            .zip(states.iter())
                            .filter(|(_, s)| **s == target)
                            .map(|(d, _)| d.abs() - t)
                            .sum();
                        return score as f32;
                    }
                } else {
                    run = 0;
                }
            }
        }
        0.0
    }

    fn detect_level(&self, img: &GrayImage) -> Vec<(u32, u32, f32)> {
        let (w, h) = img.dimensions();
        if w <= 2 * BORDER || h <= 2 * BORDER {
            return Vec::new();
        }

        let mut scores = vec![0.0f32; (w * h) as usize];
        for y in BORDER..(h - BORDER) {
            for x in BORDER..(w - BORDER) {
                scores[(y * w + x) as usize] = self.corner_score(img, x, y);
            }
        }

        // 3x3 非极大值抑制
        let mut corners = Vec::new();
        for y in BORDER..(h - BORDER) {
            for x in BORDER..(w - BORDER) {
                let s = scores[(y * w + x) as usize];
                if s <= 0.0 {
                    continue;
                }
                let is_max = (-1i32..=1).all(|dy| {
                    (-1i32..=1).all(|dx| {
                        let idx = ((y as i32 + dy) as u32 * w + (x as i32 + dx) as u32) as usize;
                        scores[idx] <= s
                    })
                });
                if is_max {
                    corners.push((x, y, s));
                }
            }
        }
        corners
    }

    /// 灰度质心方向
    fn orientation(img: &GrayImage, x: u32, y: u32) -> f32 {
        let mut m01 = 0.0f32;
        let mut m10 = 0.0f32;
        let r2 = PATTERN_RADIUS * PATTERN_RADIUS;
        for dy in -PATTERN_RADIUS..=PATTERN_RADIUS {
            for dx in -PATTERN_RADIUS..=PATTERN_RADIUS {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let v = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as f32;
                m10 += dx as f32 * v;
                m01 += dy as f32 * v;
            }
        }
        m01.atan2(m10)
    }

    fn describe(smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let (w, h) = smoothed.dimensions();
        let sample = |(px, py): (f32, f32)| -> u8 {
            let sx = (x as f32 + px * cos - py * sin).round() as i64;
            let sy = (y as f32 + px * sin + py * cos).round() as i64;
            let sx = sx.clamp(0, w as i64 - 1) as u32;
            let sy = sy.clamp(0, h as i64 - 1) as u32;
            smoothed.get_pixel(sx, sy)[0]
        };

        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        for (bit, [a, b]) in SAMPLING_PAIRS.iter().enumerate() {
            if sample(*a) < sample(*b) {
                descriptor[bit / 8] |= 1 << (bit % 8);
            }
        }
        descriptor
    }
}

impl Default for BinaryKeypointDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeypointDescriptor for BinaryKeypointDetector {
    fn detect_and_compute(&self, image: &GrayImage) -> Vec<(Keypoint, Descriptor)> {
        let mut features = Vec::new();
        let mut level = image.clone();
        let mut scale = 1.0f32;

        for octave in 0..self.octaves {
            if octave > 0 {
                let (w, h) = level.dimensions();
                if w / 2 <= 2 * BORDER || h / 2 <= 2 * BORDER {
                    break;
                }
                level = imageops::resize(&level, w / 2, h / 2, imageops::FilterType::Triangle);
                scale *= 2.0;
            }

            let smoothed = imageops::blur(&level, 1.2);
            for (x, y, response) in self.detect_level(&level) {
                let angle = Self::orientation(&level, x, y);
                let descriptor = Self::describe(&smoothed, x, y, angle);
                features.push((
                    Keypoint {
                        x: x as f32 * scale,
                        y: y as f32 * scale,
                        scale,
                        angle,
                        response,
                    },
                    descriptor,
                ));
            }
        }

        if features.len() > self.max_keypoints {
            features.sort_by(|a, b| b.0.response.total_cmp(&a.0.response));
            features.truncate(self.max_keypoints);
        }
        features
    }
}
