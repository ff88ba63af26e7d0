/// Deterministic generator behind AI tie-breaking. One instance per world,
/// seeded at construction, so identical seeds replay identical games.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x9e37_79b9);
        let mut z = self.state;
        z = (z ^ (z >> 16)).wrapping_mul(0x21f0_aaad);
        z = (z ^ (z >> 15)).wrapping_mul(0x735a_2d97);
        z ^ (z >> 15)
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f64 / 4_294_967_296.0) as f32
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        min + (self.next_f32() * span).floor() as i32
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_u32() as usize) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = Rng::new(12345);
        let mut b = Rng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn int_stays_within_bounds() {
        let mut rng = Rng::new(7);
        for _ in 0..1_000 {
            let value = rng.int(-3, 5);
            assert!((-3..=5).contains(&value));
        }
        assert_eq!(rng.int(4, 4), 4);
        assert_eq!(rng.int(9, 2), 9);
    }

    #[test]
    fn pick_index_stays_within_len() {
        let mut rng = Rng::new(99);
        assert_eq!(rng.pick_index(0), 0);
        assert_eq!(rng.pick_index(1), 0);
        for _ in 0..1_000 {
            assert!(rng.pick_index(4) < 4);
        }
    }

    #[test]
    fn bool_rate_tracks_probability() {
        let mut rng = Rng::new(42);
        let hits = (0..10_000).filter(|_| rng.bool(0.5)).count();
        assert!((4_000..=6_000).contains(&hits));
    }
}
