// Small xorshift generator for synthetic readings

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) struct XorShift(u64);

impl XorShift {
    /// Seed from the wall clock; good enough for demo-grade variation
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9e3779b97f4a7c15);
        Self(nanos | 1)
    }

    pub fn seeded(seed: u64) -> Self {
        Self(seed | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [lo, hi)
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    pub fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_stays_in_bounds() {
        let mut rng = XorShift::seeded(42);
        for _ in 0..1000 {
            let v = rng.range(20.0, 35.0);
            assert!((20.0..35.0).contains(&v));
        }
    }

    #[test]
    fn pick_returns_member() {
        let mut rng = XorShift::seeded(7);
        let items = ["a", "b", "c"];
        for _ in 0..100 {
            assert!(items.contains(&rng.pick(&items)));
        }
    }
}
