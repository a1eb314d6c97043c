// Copyright @yucwang 2023

use super::constants::{ PI, SQUARE_2, Float, Vector2f, Vector3f };

/// Maps a point of the unit square onto barycentric weights `(w0, w1, w2)`.
///
/// Points above the diagonal are reflected back below it, so the result is
/// uniform over the triangle without rejection.
pub fn square_to_triangle(u: &Vector2f) -> Vector3f {
    let mut xsi: Float = u.x;
    let mut psi: Float = u.y;
    if xsi + psi > 1.0 {
        xsi = 1.0 - xsi;
        psi = 1.0 - psi;
    }

    Vector3f::new(1.0 - xsi - psi, xsi, psi)
}

/// Polar offset with radius `sqrt(2) * u.x` and angle `2 * PI * u.y`.
///
/// The radius is linear in `u.x`, so samples cluster toward the center.
pub fn square_to_jitter_disk(u: &Vector2f) -> Vector2f {
    let r: Float = SQUARE_2 * u.x;
    let theta: Float = 2.0 * PI * u.y;
    let (sin_theta, cos_theta) = theta.sin_cos();

    Vector2f::new(r * cos_theta, r * sin_theta)
}
