//! Connected-component extraction.

use image::GrayImage;
use zonewatch_models::{Blob, BoundingBox};

/// Extract 4-connected foreground components, gated by area.
///
/// Components are discovered in a row-major scan and assigned ids in
/// encounter order starting at 0. A component is emitted only when
/// `min_area <= area <= max_area`; ids still advance for gated-out
/// components so blob ids are stable against threshold tweaks.
///
/// Centroid is the integer-rounded mean of member pixel coordinates; the
/// bounding box is inclusive on all sides (`width = max_x - min_x + 1`).
pub fn connected_components(bin: &GrayImage, min_area: u32, max_area: u32) -> Vec<Blob> {
    let (w, h) = bin.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let data = bin.as_raw();
    let mut visited = vec![false; wu * hu];
    let mut blobs = Vec::new();
    let mut next_id = 0u32;
    let mut stack = Vec::new();

    for start in 0..wu * hu {
        if data[start] == 0 || visited[start] {
            continue;
        }

        // Flood fill one component with an explicit stack.
        let mut area = 0u64;
        let (mut sum_x, mut sum_y) = (0u64, 0u64);
        let (mut min_x, mut min_y) = (wu, hu);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        visited[start] = true;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % wu, idx / wu);
            area += 1;
            sum_x += x as u64;
            sum_y += y as u64;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            if x > 0 && data[idx - 1] != 0 && !visited[idx - 1] {
                visited[idx - 1] = true;
                stack.push(idx - 1);
            }
            if x + 1 < wu && data[idx + 1] != 0 && !visited[idx + 1] {
                visited[idx + 1] = true;
                stack.push(idx + 1);
            }
            if y > 0 && data[idx - wu] != 0 && !visited[idx - wu] {
                visited[idx - wu] = true;
                stack.push(idx - wu);
            }
            if y + 1 < hu && data[idx + wu] != 0 && !visited[idx + wu] {
                visited[idx + wu] = true;
                stack.push(idx + wu);
            }
        }

        let id = next_id;
        next_id += 1;

        if area < min_area as u64 || area > max_area as u64 {
            continue;
        }

        let centroid = (
            (sum_x as f64 / area as f64).round() as u32,
            (sum_y as f64 / area as f64).round() as u32,
        );
        blobs.push(Blob {
            id,
            area: area as u32,
            centroid,
            bbox: BoundingBox::new(
                min_x as u32,
                min_y as u32,
                (max_x - min_x + 1) as u32,
                (max_y - min_y + 1) as u32,
            ),
        });
    }

    blobs
}
