/// xorshift32 stream. Every episode owns one for its gap draws and the
/// driver owns another for breeding; nothing shares a global generator.
#[derive(Clone, Copy, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF } else { seed },
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        self.state
    }

    pub fn next_int(&mut self, max: u32) -> u32 {
        self.next() % max
    }

    /// Uniform draw from `[min, max_exclusive)`, widened so any `i32` span fits.
    pub fn next_range(&mut self, min: i32, max_exclusive: i32) -> i32 {
        debug_assert!(max_exclusive > min);
        let span = (i64::from(max_exclusive) - i64::from(min)) as u32;
        (i64::from(min) + i64::from(self.next_int(span))) as i32
    }

    /// Uniform sample in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        // Top 24 bits keep the value strictly below 1.0.
        (self.next() >> 8) as f64 / (1u32 << 24) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_is_remapped() {
        assert_eq!(SeededRng::new(0).state(), 0xDEAD_BEEF);
    }

    #[test]
    fn range_stays_half_open() {
        let mut rng = SeededRng::new(0x1234_5678);
        for _ in 0..10_000 {
            let value = rng.next_range(150, 550);
            assert!((150..550).contains(&value));
            let unit = rng.next_unit();
            assert!((0.0..1.0).contains(&unit));
        }
    }

    #[test]
    fn range_spanning_most_of_i32_does_not_overflow() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1_000 {
            let value = rng.next_range(-2_000_000_000, 2_000_000_000);
            assert!((-2_000_000_000..2_000_000_000).contains(&value));
        }
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..64 {
            assert_eq!(a.next(), b.next());
        }
    }
}
