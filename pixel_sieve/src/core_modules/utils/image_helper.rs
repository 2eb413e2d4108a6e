// In-memory and on-disk encoding of RGBA buffers. Fixtures for the sieve's
// tests are built here so every test feeds real PNG/JPEG bytes through the
// decoder instead of hand-made grids.

use image::{DynamicImage, ImageEncoder, ImageFormat, ImageResult, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Encodes a raw RGBA8 buffer as PNG.
pub fn encode_png(width: u32, height: u32, buffer: &[u8]) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
    encoder.write_image(buffer, width, height, image::ExtendedColorType::Rgba8)?;
    Ok(bytes)
}

/// Encodes `image` in `format`. Formats without an alpha channel (JPEG) get
/// the RGB part only.
pub fn encode(image: &RgbaImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let dynamic = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image.clone()).to_rgb8()),
        _ => DynamicImage::ImageRgba8(image.clone()),
    };

    let mut bytes = Vec::new();
    dynamic.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Writes `image` to `path`, picking the format from the extension.
pub fn save(path: impl AsRef<Path>, image: &RgbaImage) -> ImageResult<()> {
    let format = ImageFormat::from_path(path.as_ref())?;
    std::fs::write(path.as_ref(), encode(image, format)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encodes_png_with_magic_bytes() {
        let buffer = vec![255u8; 4 * 4 * 4];
        let bytes = encode_png(4, 4, &buffer).expect("Error encoding PNG.");
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(image::guess_format(&bytes).ok(), Some(ImageFormat::Png));
    }

    #[test]
    fn encodes_jpeg_without_alpha() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([120, 60, 30, 128]));
        let bytes = encode(&image, ImageFormat::Jpeg).expect("Error encoding JPEG.");
        assert_eq!(image::guess_format(&bytes).ok(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn saves_by_extension() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("gradient.png");
        let image = RgbaImage::from_fn(16, 16, |x, y| Rgba([x as u8 * 16, y as u8 * 16, 0, 255]));

        save(&path, &image).expect("Error Saving File.");
        let decoded = image::open(&path).expect("Error opening file.").to_rgba8();
        assert_eq!(decoded, image);
    }
}
