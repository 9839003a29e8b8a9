/// PCG-32 generator. Cheap, deterministic for a given seed, and small
/// enough to live on a worker's stack.
pub struct Pcg32 {
    state: u64,
}

impl Pcg32 {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: seed };
        rng.next_u32();
        rng
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform f32 in [0, 1). The top 24 bits scale exactly onto the
    /// mantissa, so 1.0 is never produced.
    pub fn next(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_seed() {
        let mut a = Pcg32::new(42);
        let mut b = Pcg32::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn seeds_diverge() {
        let mut a = Pcg32::new(1);
        let mut b = Pcg32::new(2);
        let same = (0..100).filter(|_| a.next_u32() == b.next_u32()).count();
        assert!(same < 3);
    }

    #[test]
    fn unit_interval_is_half_open() {
        let mut rng = Pcg32::new(7);
        for _ in 0..100_000 {
            let x = rng.next();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn roughly_uniform() {
        let mut rng = Pcg32::new(3);
        let n = 100_000;
        let mean: f32 = (0..n).map(|_| rng.next()).sum::<f32>() / n as f32;
        assert!((mean - 0.5).abs() < 0.01);
    }
}
