//! Grayscale conversion and automatic (Otsu) binarization.

use image::{GrayImage, Luma, RgbaImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::SegmentationParams;

/// Foreground value in a [`BinaryMask`].
pub const FOREGROUND: u8 = 255;

/// Single-channel foreground/background mask, same size as its source.
///
/// Non-zero pixels are foreground, which is what border following expects.
#[derive(Clone, Debug)]
pub struct BinaryMask {
    image: GrayImage,
    threshold: u8,
}

impl BinaryMask {
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Gray level chosen by Otsu's method for this mask.
    #[inline]
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    #[inline]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] != 0
    }

    pub fn foreground_count(&self) -> usize {
        self.image.as_raw().iter().filter(|&&v| v != 0).count()
    }

    #[inline]
    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }
}

/// ITU-R BT.601 luma in 14-bit fixed point; alpha is ignored.
pub fn to_grayscale(src: &RgbaImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    let mut gray = GrayImage::new(src.width(), src.height());
    for (dst, px) in gray.pixels_mut().zip(src.pixels()) {
        let [r, g, b, _] = px.0;
        let y = (r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14;
        *dst = Luma([y.min(255) as u8]);
    }
    gray
}

/// Intensity histogram of a grayscale image.
pub fn histogram(gray: &GrayImage) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in gray.as_raw() {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu threshold: the level `t` maximizing between-class variance of
/// `[0, t]` vs. `(t, 255]`.
///
/// Returns `None` for an empty or single-intensity histogram, where there is
/// nothing to separate. Histograms with exactly two occupied levels split at
/// their midpoint.
pub fn otsu_level(hist: &[u32; 256]) -> Option<u8> {
    let total: u64 = hist.iter().map(|&h| h as u64).sum();
    if total == 0 {
        return None;
    }

    let min_v = hist.iter().position(|&h| h > 0)?;
    let max_v = hist.iter().rposition(|&h| h > 0)?;
    if min_v == max_v {
        return None;
    }
    let nonzero_bins = hist.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return Some(((min_v + max_v) / 2) as u8);
    }

    let total = total as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    Some(best_t)
}

/// Grayscale, pick the Otsu level, binarize.
///
/// With `params.invert` pixels at or below the level become foreground (dark
/// objects on light paper); otherwise pixels above it do. A single-intensity
/// image yields an all-background mask.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, params), fields(width = src.width(), height = src.height()))
)]
pub fn segment(src: &RgbaImage, params: &SegmentationParams) -> BinaryMask {
    let gray = to_grayscale(src);
    let Some(threshold) = otsu_level(&histogram(&gray)) else {
        log::debug!("uniform image, nothing to segment");
        let (w, h) = gray.dimensions();
        return BinaryMask {
            image: GrayImage::new(w, h),
            threshold: gray.as_raw().first().copied().unwrap_or(0),
        };
    };

    let mut image = gray;
    for px in image.pixels_mut() {
        let dark = px[0] <= threshold;
        *px = Luma([if dark == params.invert { FOREGROUND } else { 0 }]);
    }

    let mask = BinaryMask { image, threshold };
    log::debug!(
        "otsu level {} -> {} foreground pixels",
        threshold,
        mask.foreground_count()
    );
    mask
}
