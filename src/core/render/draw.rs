//! 基础绘制：实心圆点 + Bresenham 直线（越界部分裁掉）

use image::{Rgb, RgbImage};

/// 轨迹配色，按轨迹序号循环使用
pub const PALETTE: [[u8; 3]; 7] = [
    [0, 114, 189],
    [217, 83, 25],
    [237, 177, 32],
    [126, 47, 142],
    [119, 172, 48],
    [77, 190, 238],
    [162, 20, 47],
];

pub fn palette_color(track_index: usize) -> Rgb<u8> {
    Rgb(PALETTE[track_index % PALETTE.len()])
}

fn put_clipped(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u64) < img.width() as u64 && (y as u64) < img.height() as u64 {
        img.put_pixel(x as u32, y as u32, color);
    }
}

pub fn fill_circle(img: &mut RgbImage, center: (i32, i32), radius: u32, color: Rgb<u8>) {
    let r = radius as i64;
    let (cx, cy) = (center.0 as i64, center.1 as i64);
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put_clipped(img, cx + dx, cy + dy, color);
            }
        }
    }
}

pub fn draw_line(img: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    let (mut x, mut y) = (from.0 as i64, from.1 as i64);
    let (x1, y1) = (to.0 as i64, to.1 as i64);
    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_clipped(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), Rgb([0, 114, 189]));
        assert_eq!(palette_color(7), palette_color(0));
        assert_eq!(palette_color(9), Rgb([237, 177, 32]));
    }

    #[test]
    fn test_fill_circle() {
        let mut img = RgbImage::new(20, 20);
        fill_circle(&mut img, (10, 10), 3, RED);
        assert_eq!(*img.get_pixel(10, 10), RED);
        assert_eq!(*img.get_pixel(13, 10), RED);
        assert_eq!(*img.get_pixel(10, 7), RED);
        assert_eq!(*img.get_pixel(13, 13), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_shapes_clipped_at_border() {
        let mut img = RgbImage::new(8, 8);
        fill_circle(&mut img, (0, 0), 4, RED);
        draw_line(&mut img, (-5, 3), (20, 3), RED);
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert!((0..8).all(|x| *img.get_pixel(x, 3) == RED));
    }

    #[test]
    fn test_line_endpoints_and_diagonal() {
        let mut img = RgbImage::new(10, 10);
        draw_line(&mut img, (1, 1), (6, 6), RED);
        for i in 1..=6 {
            assert_eq!(*img.get_pixel(i, i), RED);
        }
        assert_eq!(*img.get_pixel(7, 7), Rgb([0, 0, 0]));
    }
}
