//! Pixelwise operations on grayscale planes.

use image::GrayImage;

use crate::error::{ImagingError, ImagingResult};

/// Default absolute-difference threshold.
pub const DEFAULT_DIFF_THRESHOLD: u8 = 30;
/// Default number of morphology passes.
pub const DEFAULT_MORPH_PASSES: u32 = 2;
/// Default running-mean learning rate.
pub const DEFAULT_ALPHA: f64 = 0.1;

fn ensure_same_dims(a: &GrayImage, b: &GrayImage) -> ImagingResult<()> {
    if a.dimensions() != b.dimensions() {
        return Err(ImagingError::dimension_mismatch(
            a.dimensions(),
            b.dimensions(),
        ));
    }
    Ok(())
}

/// Binary image of pixels whose absolute difference exceeds `threshold`.
///
/// Emits 255 where `|a - b| > threshold`, 0 elsewhere. Fails with
/// `DimensionMismatch` when the planes differ in size.
pub fn abs_diff_threshold(
    a: &GrayImage,
    b: &GrayImage,
    threshold: u8,
) -> ImagingResult<GrayImage> {
    ensure_same_dims(a, b)?;
    let data = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&pa, &pb)| if pa.abs_diff(pb) > threshold { 255 } else { 0 })
        .collect();
    // Buffer length matches by construction.
    Ok(GrayImage::from_raw(a.width(), a.height(), data).unwrap())
}

/// Mean luma of a plane, rounded to the nearest integer.
pub fn mean_luma(img: &GrayImage) -> u8 {
    let data = img.as_raw();
    if data.is_empty() {
        return 0;
    }
    let sum: u64 = data.iter().map(|&p| p as u64).sum();
    ((sum as f64 / data.len() as f64).round() as u64).min(255) as u8
}

/// Degraded no-background fallback: threshold against the frame's own mean.
pub fn mean_diff_threshold(img: &GrayImage, threshold: u8) -> GrayImage {
    let mean = mean_luma(img);
    let data = img
        .as_raw()
        .iter()
        .map(|&p| if p.abs_diff(mean) > threshold { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(img.width(), img.height(), data).unwrap()
}

/// Erode a binary image with a 3x3 square element, `passes` times.
///
/// A foreground pixel survives only if its full 3x3 neighborhood is
/// foreground; pixels in the 1-pixel border are set to 0.
pub fn erode(bin: &GrayImage, passes: u32) -> GrayImage {
    morph(bin, passes, true)
}

/// Dilate a binary image with a 3x3 square element, `passes` times.
///
/// A pixel becomes foreground if any 3x3 neighbor is foreground; border
/// pixels are left as-is.
pub fn dilate(bin: &GrayImage, passes: u32) -> GrayImage {
    morph(bin, passes, false)
}

/// Morphological opening: `passes` erosions followed by `passes` dilations.
/// Removes speckle smaller than the structuring element while preserving
/// object mass.
pub fn morphology_open(bin: &GrayImage, passes: u32) -> GrayImage {
    dilate(&erode(bin, passes), passes)
}

fn morph(bin: &GrayImage, passes: u32, is_erode: bool) -> GrayImage {
    let (w, h) = bin.dimensions();
    let mut src = bin.as_raw().clone();
    // One scratch buffer, reused across passes.
    let mut dst = src.clone();

    for _ in 0..passes {
        if w < 3 || h < 3 {
            if is_erode {
                dst.iter_mut().for_each(|p| *p = 0);
                src.copy_from_slice(&dst);
            }
            break;
        }
        let (wu, hu) = (w as usize, h as usize);
        for y in 0..hu {
            for x in 0..wu {
                let idx = y * wu + x;
                if y == 0 || x == 0 || y == hu - 1 || x == wu - 1 {
                    dst[idx] = if is_erode { 0 } else { src[idx] };
                    continue;
                }
                let mut hit = is_erode;
                'neigh: for dy in 0..3usize {
                    for dx in 0..3usize {
                        let n = src[(y + dy - 1) * wu + (x + dx - 1)];
                        if is_erode {
                            if n == 0 {
                                hit = false;
                                break 'neigh;
                            }
                        } else if n != 0 {
                            hit = true;
                            break 'neigh;
                        }
                    }
                }
                dst[idx] = if hit { 255 } else { 0 };
            }
        }
        std::mem::swap(&mut src, &mut dst);
    }

    GrayImage::from_raw(w, h, src).unwrap()
}

/// Exponential running-mean background update.
///
/// Pixelwise `round((1 - alpha) * bg + alpha * cur)`. The caller is expected
/// to seed the background with the current frame when none exists yet.
pub fn running_mean_update(
    bg: &GrayImage,
    cur: &GrayImage,
    alpha: f64,
) -> ImagingResult<GrayImage> {
    ensure_same_dims(bg, cur)?;
    let data = bg
        .as_raw()
        .iter()
        .zip(cur.as_raw().iter())
        .map(|(&pb, &pc)| {
            let mixed = (1.0 - alpha) * pb as f64 + alpha * pc as f64;
            mixed.round().clamp(0.0, 255.0) as u8
        })
        .collect();
    Ok(GrayImage::from_raw(bg.width(), bg.height(), data).unwrap())
}
