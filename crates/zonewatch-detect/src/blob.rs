//! Background-subtraction blob detection.

use std::time::Instant;

use tracing::debug;
use zonewatch_imaging::{
    abs_diff_threshold, apply_mask, connected_components, decode_background_png, decode_gray,
    mean_diff_threshold, morphology_open, polygon_mask, DEFAULT_DIFF_THRESHOLD,
    DEFAULT_MORPH_PASSES,
};
use zonewatch_models::{
    Blob, BoundingBox, DetectOptions, Detection, DetectionResult, DetectorMode, Point,
};

use crate::error::DetectResult;

/// Class label assigned to blob detections.
const BLOB_LABEL: &str = "object";

/// Run the blob pipeline over one zone polygon.
///
/// Pipeline: grayscale decode, absolute difference against the background
/// (or against the frame's own mean luma when no background exists),
/// morphological opening, polygon masking, connected components gated by
/// the zone's area bounds.
pub fn analyze(
    frame: &[u8],
    background: Option<&[u8]>,
    polygon: &[Point],
    options: &DetectOptions,
) -> DetectResult<DetectionResult> {
    let started = Instant::now();

    let gray = decode_gray(frame)?;
    let bin = match background {
        Some(bg_bytes) => {
            let bg = decode_background_png(bg_bytes)?;
            abs_diff_threshold(&gray, &bg, DEFAULT_DIFF_THRESHOLD)?
        }
        None => mean_diff_threshold(&gray, DEFAULT_DIFF_THRESHOLD),
    };

    let cleaned = morphology_open(&bin, DEFAULT_MORPH_PASSES);
    let mask = polygon_mask(polygon, cleaned.width(), cleaned.height());
    let masked = apply_mask(&cleaned, &mask);
    let blobs = connected_components(&masked, options.min_area, options.max_area);

    let detections = blobs.iter().map(detection_from_blob).collect();
    debug!(
        blobs = blobs.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "blob analysis complete"
    );

    Ok(
        DetectionResult::new(detections, started.elapsed().as_millis() as u64, DetectorMode::Blob)
            .with_blobs(blobs),
    )
}

fn detection_from_blob(blob: &Blob) -> Detection {
    Detection {
        label: BLOB_LABEL.to_string(),
        confidence: 1.0,
        bbox: BoundingBox::new(blob.bbox.x, blob.bbox.y, blob.bbox.width, blob.bbox.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, GrayImage, ImageEncoder, Luma};

    fn encode_png(img: &GrayImage) -> Vec<u8> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)
            .unwrap();
        out
    }

    fn gray_frame_with_square() -> (Vec<u8>, Vec<u8>) {
        let background = GrayImage::from_pixel(100, 100, Luma([128u8]));
        let mut frame = background.clone();
        for y in 40..60 {
            for x in 40..60 {
                frame.put_pixel(x, y, Luma([0]));
            }
        }
        (encode_png(&frame), encode_png(&background))
    }

    fn full_frame_polygon() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]
    }

    fn options() -> DetectOptions {
        DetectOptions {
            min_area: 100,
            max_area: 10_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_detects_square_against_background() {
        let (frame, background) = gray_frame_with_square();
        let result =
            analyze(&frame, Some(&background), &full_frame_polygon(), &options()).unwrap();

        assert_eq!(result.count, 1);
        assert_eq!(result.mode, DetectorMode::Blob);
        let blob = &result.blobs[0];
        assert_eq!(blob.area, 400);
        assert_eq!(blob.bbox, BoundingBox::new(40, 40, 20, 20));
        assert_eq!(blob.centroid, (50, 50));
        let det = &result.detections[0];
        assert_eq!(det.label, "object");
        assert_eq!(det.confidence, 1.0);
    }

    #[test]
    fn test_polygon_excludes_off_zone_object() {
        let (frame, background) = gray_frame_with_square();
        let corner = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 30.0),
            Point::new(0.0, 30.0),
        ];
        let result = analyze(&frame, Some(&background), &corner, &options()).unwrap();
        assert_eq!(result.count, 0);
        assert!(result.detections.is_empty());
    }

    #[test]
    fn test_mean_luma_fallback_without_background() {
        let (frame, _) = gray_frame_with_square();
        let result = analyze(&frame, None, &full_frame_polygon(), &options()).unwrap();
        // The dark square stands out against the frame mean.
        assert_eq!(result.count, 1);
        assert_eq!(result.blobs[0].bbox, BoundingBox::new(40, 40, 20, 20));
    }

    #[test]
    fn test_dimension_mismatch_surfaces() {
        let (frame, _) = gray_frame_with_square();
        let wrong = encode_png(&GrayImage::from_pixel(64, 64, Luma([128u8])));
        let err = analyze(&frame, Some(&wrong), &full_frame_polygon(), &options()).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_area_gate_drops_small_component() {
        let (frame, background) = gray_frame_with_square();
        let strict = DetectOptions {
            min_area: 1000,
            max_area: 10_000,
            ..Default::default()
        };
        let result = analyze(&frame, Some(&background), &full_frame_polygon(), &strict).unwrap();
        assert_eq!(result.count, 0);
    }
}
