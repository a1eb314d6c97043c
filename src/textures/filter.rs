// Copyright @yucwang 2026

use super::image::ImageTexture;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector2f, Vector4f, PI};
use crate::math::warp::square_to_jitter_disk;

use std::fmt;
use std::str::FromStr;

const SMOOTH_TAPS: usize = 16;

/// Magnification filter used when a texture is looked up between texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Bilinear,
    /// Four-texel stencil blended with a cosine ramp.
    Sharp,
    /// Sixteen jittered nearest fetches averaged together.
    Smooth,
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Bilinear
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(FilterMode::Nearest),
            "linear" | "bilinear" => Ok(FilterMode::Bilinear),
            "sharp" => Ok(FilterMode::Sharp),
            "smooth" => Ok(FilterMode::Smooth),
            other => Err(format!("unknown texture filter: {}", other)),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterMode::Nearest => "nearest",
            FilterMode::Bilinear => "bilinear",
            FilterMode::Sharp => "sharp",
            FilterMode::Smooth => "smooth",
        };
        write!(f, "{}", name)
    }
}

fn lerp(a: &Vector4f, b: &Vector4f, t: Float) -> Vector4f {
    a + (b - a) * t
}

fn cosine_weight(t: Float) -> Float {
    (1.0 - (t * PI).cos()) * 0.5
}

/// Looks up `texture` at `(u, v)`. Coordinates are unbounded; addressing
/// wraps on both axes. `rng` is only consumed by `FilterMode::Smooth`.
pub fn sample(texture: &ImageTexture, mode: FilterMode, u: Float, v: Float, rng: &mut LcgRng) -> Vector4f {
    let (width, height) = texture.dimensions();
    let x = u * (width as Float - 1.0);
    let y = v * (height as Float - 1.0);

    match mode {
        FilterMode::Nearest => texture.texel((x + 0.5).floor() as i64, (y + 0.5).floor() as i64),
        FilterMode::Bilinear | FilterMode::Sharp => {
            let (x_lo, y_lo) = (x.floor(), y.floor());
            let (x_hi, y_hi) = (x.ceil(), y.ceil());
            let ll = texture.texel(x_lo as i64, y_lo as i64);
            let lh = texture.texel(x_lo as i64, y_hi as i64);
            let hl = texture.texel(x_hi as i64, y_lo as i64);
            let hh = texture.texel(x_hi as i64, y_hi as i64);

            let (mut tx, mut ty) = (x - x_lo, y - y_lo);
            if mode == FilterMode::Sharp {
                tx = cosine_weight(tx);
                ty = cosine_weight(ty);
            }
            let bottom = lerp(&ll, &hl, tx);
            let top = lerp(&lh, &hh, tx);
            lerp(&bottom, &top, ty)
        }
        FilterMode::Smooth => {
            let mut color = Vector4f::zeros();
            for _ in 0..SMOOTH_TAPS {
                let u = Vector2f::new(rng.next_f32(), rng.next_f32());
                let offset = square_to_jitter_disk(&u);
                color += texture.texel((x + offset.x).floor() as i64, (y + offset.y).floor() as i64);
            }
            color / SMOOTH_TAPS as Float
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::image::PixelFormat;

    fn constant_texture(width: usize, height: usize, rgb: [u8; 3]) -> ImageTexture {
        let pixels: Vec<u8> = (0..width * height).flat_map(|_| rgb.iter().cloned()).collect();
        ImageTexture::from_raw("constant", width, height, PixelFormat::Rgb, &pixels).unwrap()
    }

    // 2x1 black/white strip.
    fn strip() -> ImageTexture {
        ImageTexture::from_raw("strip", 2, 1, PixelFormat::Rgb, &[0, 0, 0, 255, 255, 255]).unwrap()
    }

    #[test]
    fn test_constant_texture_is_exact() {
        let tex = constant_texture(5, 3, [51, 102, 204]);
        let expected = tex.texel(0, 0);
        let mut rng = LcgRng::new(11);
        let coords = [(0.0, 0.0), (0.37, 0.81), (-2.3, 7.9), (1.0, 1.0), (0.999, -0.5)];
        for mode in [FilterMode::Nearest, FilterMode::Bilinear, FilterMode::Sharp] {
            for (u, v) in coords.iter() {
                assert_eq!(sample(&tex, mode, *u, *v, &mut rng), expected);
            }
        }
    }

    #[test]
    fn test_nearest_origin_is_bottom_left_texel() {
        // Top row red, bottom row green in source order.
        let pixels = vec![255, 0, 0, 255, 0, 0, 0, 255, 0, 0, 255, 0];
        let tex = ImageTexture::from_raw("t", 2, 2, PixelFormat::Rgb, &pixels).unwrap();
        let mut rng = LcgRng::new(0);
        let c = sample(&tex, FilterMode::Nearest, 0.0, 0.0, &mut rng);
        assert_eq!(c, Vector4f::new(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_bilinear_midpoint() {
        let tex = strip();
        let mut rng = LcgRng::new(0);
        let c = sample(&tex, FilterMode::Bilinear, 0.25, 0.0, &mut rng);
        assert!((c.x - 0.25).abs() < 1e-6);
        assert!((c.w - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sharp_uses_cosine_ramp() {
        let tex = strip();
        let mut rng = LcgRng::new(0);
        let quarter = sample(&tex, FilterMode::Sharp, 0.25, 0.0, &mut rng);
        let expected = (1.0 - (0.25 * PI).cos()) * 0.5;
        assert!((quarter.x - expected).abs() < 1e-5);
        let half = sample(&tex, FilterMode::Sharp, 0.5, 0.0, &mut rng);
        assert!((half.x - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_smooth_stays_in_range_and_averages() {
        let tex = strip();
        let mut rng = LcgRng::new(5);
        for i in 0..64 {
            let u = i as Float / 64.0;
            let c = sample(&tex, FilterMode::Smooth, u, 0.5, &mut rng);
            assert!(c.x >= 0.0 && c.x <= 1.0);
            let steps = c.x * SMOOTH_TAPS as Float;
            assert!((steps - steps.round()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_filter_mode_from_str() {
        assert_eq!("linear".parse::<FilterMode>(), Ok(FilterMode::Bilinear));
        assert_eq!("SHARP".parse::<FilterMode>(), Ok(FilterMode::Sharp));
        assert_eq!("nearest".parse::<FilterMode>(), Ok(FilterMode::Nearest));
        assert!("cubic".parse::<FilterMode>().is_err());
        assert_eq!(FilterMode::default().to_string(), "bilinear");
    }
}
