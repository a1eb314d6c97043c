// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector4f};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView};

/// Byte layout of the pixels handed over by a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }
}

/// Decoded texture. Channels are stored in RGB(A) order as floats in [0, 1],
/// row-major, with row 0 being the bottom row of the source image.
pub struct ImageTexture {
    name: String,
    width: usize,
    height: usize,
    format: PixelFormat,
    data: Vec<Float>,
}

impl ImageTexture {
    /// Builds a texture from top-down 8-bit pixels in `format` order.
    pub fn from_raw(
        name: &str,
        width: usize,
        height: usize,
        format: PixelFormat,
        pixels: &[u8],
    ) -> std::result::Result<Self, String> {
        let channels = format.channels();
        if width == 0 || height == 0 {
            return Err(format!("texture {} has invalid resolution: {}x{}", name, width, height));
        }
        if pixels.len() != width * height * channels {
            return Err(format!(
                "texture {} expects {} bytes, got {}",
                name,
                width * height * channels,
                pixels.len()
            ));
        }

        let row_len = width * channels;
        let mut data = vec![0.0; pixels.len()];
        for y in 0..height {
            let src_row = &pixels[y * row_len..(y + 1) * row_len];
            let dst_y = height - 1 - y;
            let dst_row = &mut data[dst_y * row_len..(dst_y + 1) * row_len];
            for (src, dst) in src_row.chunks_exact(channels).zip(dst_row.chunks_exact_mut(channels)) {
                match format {
                    PixelFormat::Rgb => {
                        dst[0] = src[0] as Float / 255.0;
                        dst[1] = src[1] as Float / 255.0;
                        dst[2] = src[2] as Float / 255.0;
                    }
                    PixelFormat::Bgr => {
                        dst[0] = src[2] as Float / 255.0;
                        dst[1] = src[1] as Float / 255.0;
                        dst[2] = src[0] as Float / 255.0;
                    }
                    PixelFormat::Rgba => {
                        dst[0] = src[0] as Float / 255.0;
                        dst[1] = src[1] as Float / 255.0;
                        dst[2] = src[2] as Float / 255.0;
                        dst[3] = src[3] as Float / 255.0;
                    }
                    PixelFormat::Bgra => {
                        dst[0] = src[2] as Float / 255.0;
                        dst[1] = src[1] as Float / 255.0;
                        dst[2] = src[0] as Float / 255.0;
                        dst[3] = src[3] as Float / 255.0;
                    }
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            width,
            height,
            format,
            data,
        })
    }

    pub fn from_file(path: &str) -> std::result::Result<Self, String> {
        let img = ImageReader::open(path)
            .map_err(|e| format!("failed to open image {}: {}", path, e))?
            .decode()
            .map_err(|e| format!("failed to decode image {}: {}", path, e))?;

        let (width, height) = img.dimensions();
        let (width, height) = (width as usize, height as usize);
        match img {
            DynamicImage::ImageRgb8(buf) => Self::from_raw(path, width, height, PixelFormat::Rgb, buf.as_raw()),
            DynamicImage::ImageRgba8(buf) => Self::from_raw(path, width, height, PixelFormat::Rgba, buf.as_raw()),
            other if other.color().has_alpha() => {
                let buf = other.to_rgba8();
                Self::from_raw(path, width, height, PixelFormat::Rgba, buf.as_raw())
            }
            other => {
                let buf = other.to_rgb8();
                Self::from_raw(path, width, height, PixelFormat::Rgb, buf.as_raw())
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Fetches one texel with toroidal wrapping on both axes. Alpha is 1.0
    /// for three-channel textures.
    pub fn texel(&self, x: i64, y: i64) -> Vector4f {
        let ix = x.rem_euclid(self.width as i64) as usize;
        let iy = y.rem_euclid(self.height as i64) as usize;
        let channels = self.channels();
        let base = (iy * self.width + ix) * channels;
        let alpha = if channels == 4 { self.data[base + 3] } else { 1.0 };

        Vector4f::new(self.data[base], self.data[base + 1], self.data[base + 2], alpha)
    }
}
