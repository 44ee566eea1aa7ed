//! Image decode/encode helpers.
//!
//! Frames arrive as JPEG bytes from the snapshot source; background planes
//! are persisted as lossless grayscale PNG so running-mean updates round-trip
//! without recompression drift.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageReader, RgbImage};

use crate::error::{ImagingError, ImagingResult};

/// JPEG quality used when re-encoding annotated frames.
pub const ANNOTATED_JPEG_QUALITY: u8 = 85;

/// Decode an encoded image (JPEG or PNG) into an 8-bit grayscale plane.
///
/// Color input is converted with the standard Rec. 601 luma weights.
pub fn decode_gray(bytes: &[u8]) -> ImagingResult<GrayImage> {
    let img = decode(bytes)?;
    Ok(img.into_luma8())
}

/// Decode an encoded image into an RGB buffer (for annotation).
pub fn decode_rgb(bytes: &[u8]) -> ImagingResult<RgbImage> {
    let img = decode(bytes)?;
    Ok(img.into_rgb8())
}

fn decode(bytes: &[u8]) -> ImagingResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(ImagingError::invalid_image("empty image body"));
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ImagingError::invalid_image(e.to_string()))?;
    Ok(reader.decode()?)
}

/// Encode a grayscale plane as PNG for persistence as a background blob.
pub fn encode_background_png(plane: &GrayImage) -> ImagingResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            plane.as_raw(),
            plane.width(),
            plane.height(),
            ExtendedColorType::L8,
        )
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decode a persisted background blob back into a grayscale plane.
pub fn decode_background_png(bytes: &[u8]) -> ImagingResult<GrayImage> {
    decode_gray(bytes)
}

/// Encode an RGB buffer as JPEG at the annotation quality.
pub fn encode_jpeg(img: &RgbImage) -> ImagingResult<Vec<u8>> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, ANNOTATED_JPEG_QUALITY)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_background_png_round_trip() {
        let mut plane = GrayImage::from_pixel(16, 12, Luma([128u8]));
        plane.put_pixel(3, 4, Luma([17]));
        let blob = encode_background_png(&plane).unwrap();
        let back = decode_background_png(&blob).unwrap();
        assert_eq!(back.dimensions(), (16, 12));
        assert_eq!(back, plane);
    }

    #[test]
    fn test_decode_gray_rejects_garbage() {
        assert!(decode_gray(&[]).is_err());
        assert!(decode_gray(b"definitely not an image").is_err());
    }

    #[test]
    fn test_jpeg_encode_decodes_back() {
        let img = RgbImage::from_pixel(20, 20, image::Rgb([200, 100, 50]));
        let jpeg = encode_jpeg(&img).unwrap();
        let back = decode_rgb(&jpeg).unwrap();
        assert_eq!(back.dimensions(), (20, 20));
    }
}
