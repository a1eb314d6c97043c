// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f, FLOAT_MIN, FLOAT_MAX };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f
}

impl Default for AABB {
    fn default() -> Self {
        Self { p_min: Vector3f::new(FLOAT_MAX, FLOAT_MAX, FLOAT_MAX),
               p_max: Vector3f::new(FLOAT_MIN, FLOAT_MIN, FLOAT_MIN) }
    }
}

impl AABB {
    pub fn from_points<'a, I: IntoIterator<Item = &'a Vector3f>>(points: I) -> Self {
        let mut bound = Self::default();
        for p in points {
            bound.expand_by_point(p);
        }
        bound
    }

    pub fn expand_by_point(&mut self, p: &Vector3f) {
        self.p_min = self.p_min.inf(p);
        self.p_max = self.p_max.sup(p);
    }

    /// Inclusive containment with a per-axis tolerance of `eps`.
    pub fn contains(&self, p: &Vector3f, eps: Float) -> bool {
        (0..3).all(|idx| p[idx] >= self.p_min[idx] - eps && p[idx] <= self.p_max[idx] + eps)
    }

    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }
}

/* Test for AABB */
#[cfg(test)]
mod tests {
    use super::AABB;
    use super::Vector3f;

    #[test]
    fn test_aabb_from_points() {
        let points = [Vector3f::new(1.0, 7.0, 3.0), Vector3f::new(4.0, 4.0, 4.0)];
        let bbox = AABB::from_points(points.iter());
        assert_eq!(bbox.p_min, Vector3f::new(1.0, 4.0, 3.0));
        assert_eq!(bbox.p_max, Vector3f::new(4.0, 7.0, 4.0));
    }

    #[test]
    fn test_aabb_expand_and_contains() {
        let mut bbox = AABB::default();
        bbox.expand_by_point(&Vector3f::new(-1.0, 5.0, 6.0));
        bbox.expand_by_point(&Vector3f::new(1.0, 0.0, 2.0));
        assert_eq!(bbox.diagonal(), Vector3f::new(2.0, 5.0, 4.0));

        assert!(bbox.contains(&Vector3f::new(0.0, 2.5, 4.0), 0.0));
        assert!(!bbox.contains(&Vector3f::new(0.0, 5.5, 4.0), 0.0));
        assert!(bbox.contains(&Vector3f::new(1.0 + 1e-6, 0.0, 2.0), 1e-5));
    }
}
