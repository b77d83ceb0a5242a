use gltf::image::Format;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, Rgb, Rgba};
use tracing::debug;

/// Pixel format of a loaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
}

/// A loaded texture asset with raw pixel data.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: TextureFormat,
}

impl TextureAsset {
    /// Build an RGBA8 texture from decoded glTF image data, if the format is supported
    pub fn from_gltf(data: &gltf::image::Data) -> Option<Self> {
        let rgba = to_rgba8(data.format, data.width, data.height, &data.pixels)?;
        Some(Self {
            width: data.width,
            height: data.height,
            data: rgba,
            format: TextureFormat::Rgba8,
        })
    }
}

fn u16_samples(pixels: &[u8]) -> Vec<u16> {
    pixels
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Convert decoded pixels of any 8/16-bit glTF format to RGBA8.
pub fn to_rgba8(format: Format, width: u32, height: u32, pixels: &[u8]) -> Option<Vec<u8>> {
    let converted = match format {
        Format::R8G8B8A8 => return Some(pixels.to_vec()),
        Format::R8G8B8 => {
            let mut rgba = Vec::with_capacity(pixels.len() / 3 * 4);
            for chunk in pixels.chunks_exact(3) {
                rgba.extend_from_slice(chunk);
                rgba.push(255);
            }
            return Some(rgba);
        }
        Format::R8 => GrayImage::from_raw(width, height, pixels.to_vec()).map(DynamicImage::ImageLuma8),
        Format::R8G8 => {
            GrayAlphaImage::from_raw(width, height, pixels.to_vec()).map(DynamicImage::ImageLumaA8)
        }
        Format::R16G16B16 => ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width, height, u16_samples(pixels))
            .map(DynamicImage::ImageRgb16),
        Format::R16G16B16A16 => {
            ImageBuffer::<Rgba<u16>, Vec<u16>>::from_raw(width, height, u16_samples(pixels))
                .map(DynamicImage::ImageRgba16)
        }
        other => {
            debug!("Skipping unsupported image format {:?} in glTF", other);
            return None;
        }
    };

    match converted {
        Some(image) => Some(image.to_rgba8().into_raw()),
        None => {
            debug!("Image data does not match its {}x{} dimensions", width, height);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_is_expanded_with_opaque_alpha() {
        let rgba = to_rgba8(Format::R8G8B8, 2, 1, &[10, 20, 30, 40, 50, 60]).unwrap();
        assert_eq!(rgba, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_grayscale_is_converted() {
        let rgba = to_rgba8(Format::R8, 2, 1, &[0, 200]).unwrap();
        assert_eq!(rgba, vec![0, 0, 0, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_sixteen_bit_is_narrowed() {
        let pixel = u16::MAX.to_le_bytes();
        let pixels: Vec<u8> = pixel.iter().copied().cycle().take(8).collect();
        let rgba = to_rgba8(Format::R16G16B16A16, 1, 1, &pixels).unwrap();
        assert_eq!(rgba, vec![255, 255, 255, 255]);
    }

    #[test]
    fn test_mismatched_dimensions_are_skipped() {
        assert!(to_rgba8(Format::R8, 4, 4, &[1, 2, 3]).is_none());
    }

    #[test]
    fn test_float_formats_are_skipped() {
        assert!(to_rgba8(Format::R32G32B32FLOAT, 1, 1, &[0; 12]).is_none());
    }
}
