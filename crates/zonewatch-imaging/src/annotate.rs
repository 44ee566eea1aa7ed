//! Annotated frame rendering.
//!
//! Composites zone polygons, occupancy labels, and blob markers onto a
//! fetched JPEG. Drawing is done directly on the RGB buffer; no subpixel
//! work, overlays are clamped to the frame.

use image::{Rgb, RgbImage};
use zonewatch_models::{Blob, Point, ZoneOccupancy};

use crate::codec::{decode_rgb, encode_jpeg};
use crate::error::ImagingResult;
use crate::font;
use crate::mask::point_in_polygon;

const GREEN: Rgb<u8> = Rgb([0, 200, 0]);
const RED: Rgb<u8> = Rgb([220, 0, 0]);
const YELLOW: Rgb<u8> = Rgb([255, 220, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Polygon fill opacity (30%).
const FILL_ALPHA: f32 = 0.3;
/// Stroke width for polygons and blob boxes.
const STROKE: u32 = 2;
/// Label text scale (5x7 glyphs drawn at 2x).
const TEXT_SCALE: u32 = 2;

/// One zone plus its latest occupancy, ready to draw.
#[derive(Debug, Clone)]
pub struct ZoneOverlay {
    pub name: String,
    pub polygon: Vec<Point>,
    pub count: u32,
    pub alarm: bool,
    pub blobs: Vec<Blob>,
}

impl ZoneOverlay {
    /// Build an overlay from a zone's polygon and its tracked occupancy.
    pub fn new(name: impl Into<String>, polygon: Vec<Point>, occupancy: Option<&ZoneOccupancy>) -> Self {
        let (count, alarm, blobs) = match occupancy {
            Some(occ) => (occ.count, occ.alarm, occ.blobs.clone()),
            None => (0, false, Vec::new()),
        };
        Self {
            name: name.into(),
            polygon,
            count,
            alarm,
            blobs,
        }
    }
}

/// Render zone overlays onto a JPEG frame, returning a fresh JPEG (q85).
///
/// With no overlays the input bytes are returned unchanged.
pub fn render_annotated(jpeg: &[u8], overlays: &[ZoneOverlay]) -> ImagingResult<Vec<u8>> {
    if overlays.is_empty() {
        return Ok(jpeg.to_vec());
    }

    let mut img = decode_rgb(jpeg)?;

    for overlay in overlays {
        let color = if overlay.alarm { RED } else { GREEN };
        fill_polygon(&mut img, &overlay.polygon, color);
        stroke_polygon(&mut img, &overlay.polygon, color);

        for blob in &overlay.blobs {
            stroke_rect(
                &mut img,
                blob.bbox.x,
                blob.bbox.y,
                blob.bbox.width,
                blob.bbox.height,
                YELLOW,
            );
            fill_disk(&mut img, blob.centroid.0, blob.centroid.1, 4, RED);
        }

        if let Some(anchor) = overlay.polygon.first() {
            let label = format!("{}: {}", overlay.name, overlay.count);
            let x = anchor.x.max(0.0) as u32;
            let y = (anchor.y.max(0.0) as u32).saturating_sub(font::GLYPH_HEIGHT * TEXT_SCALE + 4);
            draw_label(&mut img, x, y, &label, WHITE, color);
        }
    }

    encode_jpeg(&img)
}

fn blend(px: &mut Rgb<u8>, color: Rgb<u8>, alpha: f32) {
    for c in 0..3 {
        px[c] = ((1.0 - alpha) * px[c] as f32 + alpha * color[c] as f32).round() as u8;
    }
}

fn fill_polygon(img: &mut RgbImage, polygon: &[Point], color: Rgb<u8>) {
    if polygon.len() < 3 {
        return;
    }
    // Scan only the polygon's bounding rows/cols.
    let (w, h) = img.dimensions();
    let min_x = polygon.iter().fold(f64::MAX, |a, p| a.min(p.x)).max(0.0) as u32;
    let min_y = polygon.iter().fold(f64::MAX, |a, p| a.min(p.y)).max(0.0) as u32;
    let max_x = (polygon.iter().fold(0.0f64, |a, p| a.max(p.x)) as u32).min(w.saturating_sub(1));
    let max_y = (polygon.iter().fold(0.0f64, |a, p| a.max(p.y)) as u32).min(h.saturating_sub(1));

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if point_in_polygon(x as f64, y as f64, polygon) {
                blend(img.get_pixel_mut(x, y), color, FILL_ALPHA);
            }
        }
    }
}

fn stroke_polygon(img: &mut RgbImage, polygon: &[Point], color: Rgb<u8>) {
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        draw_line(img, a, b, color);
    }
}

/// Bresenham line, thickened to the stroke width.
fn draw_line(img: &mut RgbImage, a: Point, b: Point, color: Rgb<u8>) {
    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_thick(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn put_thick(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    for dy in 0..STROKE as i64 {
        for dx in 0..STROKE as i64 {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

fn stroke_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    if width == 0 || height == 0 {
        return;
    }
    let x1 = x + width - 1;
    let y1 = y + height - 1;
    let (tl, tr) = (Point::new(x as f64, y as f64), Point::new(x1 as f64, y as f64));
    let (bl, br) = (Point::new(x as f64, y1 as f64), Point::new(x1 as f64, y1 as f64));
    draw_line(img, tl, tr, color);
    draw_line(img, tr, br, color);
    draw_line(img, br, bl, color);
    draw_line(img, bl, tl, color);
}

fn fill_disk(img: &mut RgbImage, cx: u32, cy: u32, radius: i64, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let (cx, cy) = (cx as i64, cy as i64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                let (px, py) = (cx + dx, cy + dy);
                if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                    img.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// Draw a text label on a filled tag rectangle.
fn draw_label(img: &mut RgbImage, x: u32, y: u32, text: &str, fg: Rgb<u8>, bg: Rgb<u8>) {
    let advance = (font::GLYPH_WIDTH + 1) * TEXT_SCALE;
    let tag_w = advance * text.chars().count() as u32 + 2 * TEXT_SCALE;
    let tag_h = font::GLYPH_HEIGHT * TEXT_SCALE + 2 * TEXT_SCALE;
    let (w, h) = img.dimensions();
    for py in y..(y + tag_h).min(h) {
        for px in x..(x + tag_w).min(w) {
            img.put_pixel(px, py, bg);
        }
    }

    let mut pen_x = x + TEXT_SCALE;
    let pen_y = y + TEXT_SCALE;
    for c in text.chars() {
        draw_glyph(img, pen_x, pen_y, c, fg);
        pen_x += advance;
    }
}

fn draw_glyph(img: &mut RgbImage, x: u32, y: u32, c: char, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let columns = font::glyph(c);
    for (col, bits) in columns.iter().enumerate() {
        for row in 0..font::GLYPH_HEIGHT {
            if bits >> row & 1 == 0 {
                continue;
            }
            for sy in 0..TEXT_SCALE {
                for sx in 0..TEXT_SCALE {
                    let px = x + col as u32 * TEXT_SCALE + sx;
                    let py = y + row * TEXT_SCALE + sy;
                    if px < w && py < h {
                        img.put_pixel(px, py, color);
                    }
                }
            }
        }
    }
}
