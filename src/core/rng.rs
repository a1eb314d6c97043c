// Copyright @yucwang 2026

use crate::math::constants::Float;

/// 64-bit linear congruential generator. One instance is threaded through a
/// sampling run so results are reproducible from the seed alone.
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeds from the wall clock, for runs that did not ask for a fixed seed.
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x853c49e6748fea9b);
        Self::new(nanos)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform in [0, 1). Only the top 24 bits are used so the result is
    /// exactly representable and never rounds up to 1.0.
    pub fn next_f32(&mut self) -> Float {
        (self.next_u32() >> 8) as Float * (1.0 / 16_777_216.0)
    }
}
