/// Xorshift32 generator. Every random draw in a session goes through one of
/// these so a seed fully determines the run.
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

    /// Uniform in `[0, 1)` using the top 24 bits.
    pub fn next_unit(&mut self) -> f32 {
        (self.next() >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn next_range_f32(&mut self, min: f32, max: f32) -> f32 {
        debug_assert!(max >= min);
        min + (max - min) * self.next_unit()
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_unit() < probability
    }
}
