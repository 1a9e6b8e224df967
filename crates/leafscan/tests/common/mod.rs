#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_ellipse_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

pub const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A filled 101x101 px block traces to a 100 px square outline, so a
/// reference area of 1.0 gives 0.01 units/px and 1e-4 units²/px².
pub const REFERENCE_SIDE_PX: u32 = 101;

pub fn paper(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, PAPER)
}

pub fn draw_reference(img: &mut RgbaImage, x: i32, y: i32) {
    draw_filled_rect_mut(
        img,
        Rect::at(x, y).of_size(REFERENCE_SIDE_PX, REFERENCE_SIDE_PX),
        INK,
    );
}

pub fn draw_leaf(img: &mut RgbaImage, cx: i32, cy: i32, rx: i32, ry: i32) {
    draw_filled_ellipse_mut(img, (cx, cy), rx, ry, INK);
}

/// Filled reference square with a `side` px edge, centred on `(cx, cy)`
/// and rotated by `angle_deg`.
pub fn draw_rotated_reference(img: &mut RgbaImage, cx: f64, cy: f64, side: f64, angle_deg: f64) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let h = side / 2.0;
    let corners: Vec<Point<i32>> = [(-h, -h), (h, -h), (h, h), (-h, h)]
        .iter()
        .map(|&(x, y)| {
            Point::new(
                (cx + x * c - y * s).round() as i32,
                (cy + x * s + y * c).round() as i32,
            )
        })
        .collect();
    draw_polygon_mut(img, &corners, INK);
}

/// Elliptical leaf with semi-axes `rx`, `ry` rotated by `angle_deg`.
pub fn draw_rotated_leaf(img: &mut RgbaImage, cx: f64, cy: f64, rx: f64, ry: f64, angle_deg: f64) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let mut poly: Vec<Point<i32>> = Vec::new();
    for k in 0..180 {
        let t = k as f64 * std::f64::consts::TAU / 180.0;
        let (ex, ey) = (rx * t.cos(), ry * t.sin());
        let p = Point::new(
            (cx + ex * c - ey * s).round() as i32,
            (cy + ex * s + ey * c).round() as i32,
        );
        if poly.last() != Some(&p) && poly.first() != Some(&p) {
            poly.push(p);
        }
    }
    draw_polygon_mut(img, &poly, INK);
}

/// Reference square top-left, one 120x50 px elliptical leaf to its right.
pub fn square_and_leaf() -> RgbaImage {
    let mut img = paper(400, 300);
    draw_reference(&mut img, 20, 20);
    draw_leaf(&mut img, 260, 150, 60, 25);
    img
}

/// Reference square plus three leaves, widest in the middle. Each leaf
/// starts lower than the one to its left, so raster order is left to right.
pub fn square_and_three_leaves() -> RgbaImage {
    let mut img = paper(460, 300);
    draw_reference(&mut img, 20, 20);
    draw_leaf(&mut img, 90, 200, 40, 20);
    draw_leaf(&mut img, 220, 230, 55, 20);
    draw_leaf(&mut img, 360, 260, 30, 20);
    img
}

pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    leafscan::encode_png(img).expect("encode png")
}
