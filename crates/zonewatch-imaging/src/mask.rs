//! Polygon rasterization and membership tests.

use image::GrayImage;
use zonewatch_models::Point;

/// Even-odd ray-casting membership test.
///
/// Uses the `(yi > y) != (yj > y)` edge rule, so pixels on horizontal edges
/// at a shared vertex y are counted once, never twice. The rasterizer below
/// applies the identical rule, keeping the two in lockstep.
pub fn point_in_polygon(x: f64, y: f64, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > y) != (pj.y > y) {
            let x_cross = (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Raster mask of a polygon: 255 for pixels inside, 0 outside.
pub fn polygon_mask(polygon: &[Point], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if polygon.len() < 3 {
        return mask;
    }
    for y in 0..height {
        for x in 0..width {
            if point_in_polygon(x as f64, y as f64, polygon) {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
    }
    mask
}

/// Pixelwise select: keep `bin` where the mask is 255, zero elsewhere.
///
/// Panics if the two planes differ in size; callers build the mask from the
/// frame's own dimensions.
pub fn apply_mask(bin: &GrayImage, mask: &GrayImage) -> GrayImage {
    assert_eq!(bin.dimensions(), mask.dimensions());
    let data = bin
        .as_raw()
        .iter()
        .zip(mask.as_raw().iter())
        .map(|(&p, &m)| if m == 255 { p } else { 0 })
        .collect();
    GrayImage::from_raw(bin.width(), bin.height(), data).unwrap()
}
