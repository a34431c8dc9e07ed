//! Decoded source images handed in by the import layer.

use std::fmt;

/// Errors constructing a [`SourceImage`].
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image has zero area ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("expected {expected} bytes of RGBA8 for {width}x{height}, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A decoded, display-referred RGBA8 image. Decoding happens elsewhere; this
/// is the buffer the renderer uploads as its source texture.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    width: u32,
    height: u32,
    /// Tightly packed RGBA8, row-major.
    pixels: Vec<u8>,
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl SourceImage {
    /// Wrap tightly packed RGBA8 pixels, validating the length.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A single-color image.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, ImageError> {
        let count = width as usize * height as usize;
        Self::from_rgba8(width, height, rgba.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixels as `[r, g, b, a]` quads.
    pub fn pixels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// The pixel at `(x, y)`, clamped to the image bounds.
    pub fn pixel_clamped(&self, x: i64, y: i64) -> [u8; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels()[y * self.width as usize + x]
    }
}

impl TryFrom<image::RgbaImage> for SourceImage {
    type Error = ImageError;

    fn try_from(img: image::RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Self::from_rgba8(width, height, img.into_raw())
    }
}

impl From<SourceImage> for image::RgbaImage {
    fn from(src: SourceImage) -> Self {
        image::RgbaImage::from_raw(src.width, src.height, src.pixels)
            .unwrap_or_else(|| image::RgbaImage::new(0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba8_validates_length() {
        assert!(SourceImage::from_rgba8(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            SourceImage::from_rgba8(2, 2, vec![0; 15]),
            Err(ImageError::SizeMismatch { expected: 16, actual: 15, .. })
        ));
        assert!(matches!(
            SourceImage::from_rgba8(0, 2, vec![]),
            Err(ImageError::Empty { .. })
        ));
    }

    #[test]
    fn test_pixel_clamped_stays_in_bounds() {
        let mut pixels = vec![0u8; 2 * 2 * 4];
        pixels[12..16].copy_from_slice(&[9, 8, 7, 6]);
        let img = SourceImage::from_rgba8(2, 2, pixels).expect("valid image");
        assert_eq!(img.pixel_clamped(5, 5), [9, 8, 7, 6]);
        assert_eq!(img.pixel_clamped(-3, -3), [0, 0, 0, 0]);
    }

    #[test]
    fn test_rgba_image_roundtrip() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let src = SourceImage::try_from(img.clone()).expect("valid image");
        assert_eq!(src.pixels()[5], [10, 20, 30, 255]);
        assert_eq!(image::RgbaImage::from(src), img);
    }
}
