//! Cover art normalization
//!
//! Turns an arbitrary thumbnail (bytes, file or URL) into the canonical
//! cover: a centered square crop resized to 800x800, slightly sharpened,
//! encoded as RGB JPEG.

use crate::error::ImageProcessingError;
use crate::http::HttpFetcher;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Side length of the canonical cover
pub const COVER_SIZE: u32 = 800;

/// JPEG quality of the encoded cover
pub const COVER_JPEG_QUALITY: u8 = 95;

/// Sharpness factor (1.0 = unchanged), i.e. +20%
pub const SHARPNESS_FACTOR: f32 = 1.2;

/// Thumbnail names on i.ytimg.com that have a `maxresdefault` sibling
const LOW_RES_VARIANTS: &[&str] = &["hqdefault", "mqdefault", "sddefault"];

/// Where the source image comes from
#[derive(Debug, Clone)]
pub enum CoverSource {
    Bytes(Vec<u8>),
    File(PathBuf),
    Url(String),
}

/// Canonical cover, JPEG-encoded
#[derive(Debug, Clone)]
pub struct CoverImage {
    /// JPEG bytes
    pub data: Vec<u8>,
    /// Width in pixels (always COVER_SIZE)
    pub width: u32,
    /// Height in pixels (always COVER_SIZE)
    pub height: u32,
}

impl CoverImage {
    /// Write the JPEG bytes to a scratch path for the tagger
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, &self.data)
    }
}

/// Produces canonical covers from arbitrary thumbnails
#[derive(Debug, Clone)]
pub struct CoverNormalizer {
    fetcher: HttpFetcher,
}

impl CoverNormalizer {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }

    /// Normalize `source` into a canonical cover.
    ///
    /// When `upgrade_hint` names a low-resolution YouTube thumbnail, the
    /// `maxresdefault` variant is tried first; if that fails for any reason
    /// the original source is used.
    pub fn normalize(
        &self,
        source: CoverSource,
        upgrade_hint: Option<&str>,
    ) -> Result<CoverImage, ImageProcessingError> {
        if let Some(high_res_url) = upgrade_hint.and_then(high_res_variant) {
            match self.fetch_decoded(&high_res_url) {
                Ok(img) => {
                    log::info!("Using high resolution thumbnail");
                    return encode_cover(&normalize_image(img)?);
                }
                Err(e) => log::debug!("High resolution thumbnail unavailable: {}", e),
            }
        }

        let bytes = match source {
            CoverSource::Bytes(bytes) => bytes,
            CoverSource::File(path) => fs::read(&path)?,
            CoverSource::Url(url) => {
                log::info!("Downloading thumbnail: {}", url);
                self.fetcher.fetch_bytes(&url)?
            }
        };
        process_cover(&bytes)
    }

    fn fetch_decoded(&self, url: &str) -> Result<DynamicImage, ImageProcessingError> {
        let bytes = self.fetcher.fetch_bytes(url)?;
        decode(&bytes)
    }
}

/// Decode, normalize and encode one image
pub fn process_cover(data: &[u8]) -> Result<CoverImage, ImageProcessingError> {
    let img = decode(data)?;
    encode_cover(&normalize_image(img)?)
}

/// Convert to RGB, center-crop to a square, resize to COVER_SIZE and sharpen
pub fn normalize_image(img: DynamicImage) -> Result<RgbImage, ImageProcessingError> {
    log::debug!("Source thumbnail size: {}x{}", img.width(), img.height());
    let rgb = img.to_rgb8();

    let (width, height) = rgb.dimensions();
    let side = width.min(height);
    if side == 0 {
        return Err(ImageProcessingError::Empty);
    }
    let left = (width - side) / 2;
    let top = (height - side) / 2;

    let cropped = image::imageops::crop_imm(&rgb, left, top, side, side).to_image();
    let resized = image::imageops::resize(&cropped, COVER_SIZE, COVER_SIZE, FilterType::Lanczos3);

    Ok(sharpen(&resized, SHARPNESS_FACTOR))
}

/// Build a `maxresdefault` URL from a low-resolution YouTube thumbnail URL
pub fn high_res_variant(url: &str) -> Option<String> {
    if !url.contains("i.ytimg.com") || url.contains("maxresdefault") {
        return None;
    }
    LOW_RES_VARIANTS
        .iter()
        .find(|variant| url.contains(*variant))
        .map(|variant| url.replacen(variant, "maxresdefault", 1))
}

fn decode(data: &[u8]) -> Result<DynamicImage, ImageProcessingError> {
    if data.is_empty() {
        return Err(ImageProcessingError::Empty);
    }
    image::load_from_memory(data).map_err(ImageProcessingError::Decode)
}

fn encode_cover(img: &RgbImage) -> Result<CoverImage, ImageProcessingError> {
    let mut data = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut data, COVER_JPEG_QUALITY);
        encoder
            .encode_image(img)
            .map_err(ImageProcessingError::Encode)?;
    }

    Ok(CoverImage {
        data,
        width: img.width(),
        height: img.height(),
    })
}

/// Blend the image with its 3x3 smoothed version.
///
/// `factor` 1.0 returns the input, larger values sharpen. Border pixels
/// have no full neighbourhood and are kept as-is.
fn sharpen(img: &RgbImage, factor: f32) -> RgbImage {
    // 1 1 1 / 1 5 1 / 1 1 1, normalized by 13
    const CENTER_WEIGHT: u32 = 5;
    const KERNEL_SUM: f32 = 13.0;

    let (width, height) = img.dimensions();
    let mut out = img.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0u32; 3];
            for dy in 0..3 {
                for dx in 0..3 {
                    let p = img.get_pixel(x + dx - 1, y + dy - 1);
                    let weight = if dx == 1 && dy == 1 { CENTER_WEIGHT } else { 1 };
                    for (sum, channel) in sums.iter_mut().zip(p.0) {
                        *sum += weight * channel as u32;
                    }
                }
            }

            let original = img.get_pixel(x, y);
            let target = out.get_pixel_mut(x, y);
            for c in 0..3 {
                let smooth = sums[c] as f32 / KERNEL_SUM;
                let value = smooth + factor * (original.0[c] as f32 - smooth);
                target.0[c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::time::Duration;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn assert_canonical(cover: &CoverImage) {
        assert_eq!((cover.width, cover.height), (COVER_SIZE, COVER_SIZE));
        let decoded = image::load_from_memory(&cover.data).unwrap();
        assert_eq!(decoded.width(), COVER_SIZE);
        assert_eq!(decoded.height(), COVER_SIZE);
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_any_size_becomes_canonical() {
        for (w, h) in [(1920, 1080), (1080, 1920), (800, 800), (7, 3), (1, 1), (2400, 2000)] {
            let img = DynamicImage::ImageRgb8(RgbImage::new(w, h));
            let cover = process_cover(&png_bytes(img)).unwrap();
            assert_canonical(&cover);
        }
    }

    #[test]
    fn test_alpha_is_dropped() {
        let img = RgbaImage::from_pixel(64, 32, Rgba([200, 10, 10, 0]));
        let cover = process_cover(&png_bytes(DynamicImage::ImageRgba8(img))).unwrap();
        assert_canonical(&cover);
    }

    #[test]
    fn test_wide_image_uses_centered_crop() {
        // 1920x1080: left and right 420px bands are red, center is blue
        let img = RgbImage::from_fn(1920, 1080, |x, _| {
            if (420..1500).contains(&x) {
                image::Rgb([0, 0, 255])
            } else {
                image::Rgb([255, 0, 0])
            }
        });
        let normalized = normalize_image(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(normalized.dimensions(), (COVER_SIZE, COVER_SIZE));
        for (x, y) in [(0, 0), (799, 799), (400, 400), (5, 700)] {
            let p = normalized.get_pixel(x, y);
            assert!(p.0[2] > 200 && p.0[0] < 50, "pixel at {},{} = {:?}", x, y, p);
        }
    }

    #[test]
    fn test_sharpen_identity_and_flat() {
        let flat = RgbImage::from_pixel(10, 10, image::Rgb([120, 60, 30]));
        assert_eq!(sharpen(&flat, SHARPNESS_FACTOR), flat);

        let noisy = RgbImage::from_fn(10, 10, |x, y| image::Rgb([(x * 20) as u8, (y * 20) as u8, 0]));
        assert_eq!(sharpen(&noisy, 1.0), noisy);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let result = process_cover(b"definitely not an image");
        assert!(matches!(result, Err(ImageProcessingError::Decode(_))));
        assert!(matches!(process_cover(&[]), Err(ImageProcessingError::Empty)));
    }

    #[test]
    fn test_high_res_variant() {
        assert_eq!(
            high_res_variant("https://i.ytimg.com/vi/abc/hqdefault.jpg").as_deref(),
            Some("https://i.ytimg.com/vi/abc/maxresdefault.jpg")
        );
        assert!(high_res_variant("https://i.ytimg.com/vi/abc/maxresdefault.jpg").is_none());
        assert!(high_res_variant("https://example.com/hqdefault.jpg").is_none());
    }

    #[test]
    fn test_failed_upgrade_falls_back_to_source() {
        let normalizer = CoverNormalizer::new(HttpFetcher::new(Duration::from_secs(2)));
        let img = DynamicImage::ImageRgb8(RgbImage::new(320, 180));
        // The hint looks upgradeable but cannot be fetched
        let cover = normalizer
            .normalize(
                CoverSource::Bytes(png_bytes(img)),
                Some("http://127.0.0.1:9/i.ytimg.com/vi/x/hqdefault.jpg"),
            )
            .unwrap();
        assert_canonical(&cover);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let normalizer = CoverNormalizer::new(HttpFetcher::new(Duration::from_secs(2)));
        let result = normalizer.normalize(CoverSource::File(PathBuf::from("/nonexistent/thumb.jpg")), None);
        assert!(matches!(result, Err(ImageProcessingError::Read(_))));
    }
}
