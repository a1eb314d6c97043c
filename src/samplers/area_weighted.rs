// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::warp::square_to_triangle;
use crate::shapes::triangle::Triangle;

/// Discrete distribution over triangles proportional to their area.
///
/// `cdf[i]` is the area of triangles `0..=i` divided by the total area, so
/// zero-area triangles occupy empty intervals and are never picked by
/// `select_triangle` unless every triangle is degenerate.
#[derive(Clone, Debug, Default)]
pub struct AreaWeightedSampler {
    cdf: Vec<Float>,
    total_area: f64,
    // Last triangle with a non-empty interval; the clamp target for `u`
    // values that exceed `cdf[last]` through rounding.
    last_positive: usize,
}

impl AreaWeightedSampler {
    pub fn build(triangles: &[Triangle]) -> Self {
        let total_area: f64 = triangles.iter().map(|t| t.area as f64).sum();
        if triangles.is_empty() || total_area <= 0.0 {
            return Self {
                cdf: vec![0.0; triangles.len()],
                total_area: 0.0,
                last_positive: 0,
            };
        }

        let mut cdf = Vec::with_capacity(triangles.len());
        let mut accum = 0.0f64;
        let mut last_positive = 0;
        for (i, tri) in triangles.iter().enumerate() {
            accum += tri.area as f64;
            cdf.push((accum / total_area) as Float);
            if tri.area > 0.0 {
                last_positive = i;
            }
        }

        Self { cdf, total_area, last_positive }
    }

    /// `true` when no sample can be produced: no triangles or zero total area.
    pub fn is_degenerate(&self) -> bool {
        self.total_area <= 0.0
    }

    pub fn cdf(&self) -> &[Float] {
        &self.cdf
    }

    pub fn total_area(&self) -> Float {
        self.total_area as Float
    }

    /// Fraction of the total area covered by triangle `idx`.
    pub fn probability(&self, idx: usize, triangle: &Triangle) -> f64 {
        if self.is_degenerate() || idx >= self.cdf.len() {
            return 0.0;
        }
        triangle.area as f64 / self.total_area
    }

    /// Smallest index whose cdf value exceeds `u`, for `u` in [0, 1).
    pub fn select_triangle(&self, u: Float) -> usize {
        if self.cdf.is_empty() {
            return 0;
        }
        let idx = self.cdf.partition_point(|c| *c <= u);
        if idx >= self.cdf.len() {
            self.last_positive
        } else {
            idx
        }
    }

    pub fn sample_barycentric(&self, rng: &mut LcgRng) -> Vector3f {
        let u = Vector2f::new(rng.next_f32(), rng.next_f32());
        square_to_triangle(&u)
    }

    /// Number of samples a triangle receives out of `requested`: the integer
    /// part of its share, plus one with probability equal to the remainder.
    pub fn sample_count(&self, requested: usize, idx: usize, triangle: &Triangle, rng: &mut LcgRng) -> usize {
        let expected = requested as f64 * self.probability(idx, triangle);
        let base = expected.floor();
        let remainder = expected - base;
        let extra = if remainder > 0.0 && (rng.next_f32() as f64) < remainder { 1 } else { 0 };
        base as usize + extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles_with_areas(areas: &[Float]) -> Vec<Triangle> {
        areas
            .iter()
            .map(|a| {
                let mut t = Triangle::new([0, 1, 2], [0, 0, 0], [0, 0, 0], 0);
                t.area = *a;
                t
            })
            .collect()
    }

    #[test]
    fn test_cdf_monotonic_and_normalized() {
        let sampler = AreaWeightedSampler::build(&triangles_with_areas(&[0.3, 0.0, 1.7, 0.25, 2.0, 0.0]));
        let cdf = sampler.cdf();
        for w in cdf.windows(2) {
            assert!(w[0] <= w[1]);
        }
        assert!((cdf[cdf.len() - 1] - 1.0).abs() < 1e-5);
        assert!((sampler.total_area() - 4.25).abs() < 1e-5);
    }

    #[test]
    fn test_zero_area_is_degenerate() {
        let sampler = AreaWeightedSampler::build(&triangles_with_areas(&[0.0, 0.0]));
        assert!(sampler.is_degenerate());
        assert!(sampler.cdf().iter().all(|c| *c == 0.0));
        assert!(AreaWeightedSampler::build(&[]).is_degenerate());
    }

    #[test]
    fn test_select_triangle_skips_zero_area() {
        let triangles = triangles_with_areas(&[0.0, 1.0, 0.0, 2.0, 0.0]);
        let sampler = AreaWeightedSampler::build(&triangles);
        let mut rng = LcgRng::new(99);
        for _ in 0..50_000 {
            let idx = sampler.select_triangle(rng.next_f32());
            assert!(triangles[idx].area > 0.0);
        }
        assert_eq!(sampler.select_triangle(0.0), 1);
        assert_eq!(sampler.select_triangle(0.9999999), 3);
        assert_eq!(sampler.select_triangle(1.5), 3);
    }

    #[test]
    fn test_select_triangle_follows_area() {
        let triangles = triangles_with_areas(&[1.0, 3.0]);
        let sampler = AreaWeightedSampler::build(&triangles);
        let mut rng = LcgRng::new(4);
        let n = 100_000;
        let hits = (0..n).filter(|_| sampler.select_triangle(rng.next_f32()) == 1).count();
        let fraction = hits as f64 / n as f64;
        assert!((fraction - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_barycentric_weights_valid() {
        let sampler = AreaWeightedSampler::default();
        let mut rng = LcgRng::new(17);
        let mut mean = Vector3f::zeros();
        let n = 100_000;
        for _ in 0..n {
            let w = sampler.sample_barycentric(&mut rng);
            assert!(w.x >= 0.0 && w.y >= 0.0 && w.z >= 0.0);
            assert!((w.x + w.y + w.z - 1.0).abs() < 1e-5);
            mean += w;
        }
        // Uniform over the triangle puts the centroid at (1/3, 1/3, 1/3).
        mean /= n as Float;
        for idx in 0..3 {
            assert!((mean[idx] - 1.0 / 3.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_sample_count_expectation() {
        let triangles = triangles_with_areas(&[1.0, 2.0, 7.0]);
        let sampler = AreaWeightedSampler::build(&triangles);
        let mut rng = LcgRng::new(23);

        // 25 * 0.1 = 2.5: always 2 or 3.
        let mut total = 0;
        let runs = 20_000;
        for _ in 0..runs {
            let c = sampler.sample_count(25, 0, &triangles[0], &mut rng);
            assert!(c == 2 || c == 3);
            total += c;
        }
        let mean = total as f64 / runs as f64;
        assert!((mean - 2.5).abs() < 0.05);

        // Exact shares never get an extra sample.
        assert_eq!(sampler.sample_count(10, 2, &triangles[2], &mut rng), 7);
    }

    #[test]
    fn test_sample_count_total_bounded_by_triangle_count() {
        let areas: Vec<Float> = (0..200).map(|i| 0.1 + (i % 7) as Float * 0.37).collect();
        let triangles = triangles_with_areas(&areas);
        let sampler = AreaWeightedSampler::build(&triangles);
        let mut rng = LcgRng::new(8);
        let requested = 1234;
        let emitted: usize = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| sampler.sample_count(requested, i, t, &mut rng))
            .sum();
        assert!((emitted as i64 - requested as i64).abs() <= triangles.len() as i64);
    }
}
