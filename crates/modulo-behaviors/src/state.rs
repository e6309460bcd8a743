//! Generic per-layer scratch state owned by the caller, passed by reference
//! into `reset`/`tick`/`render` (§4.3). Behaviors are stateless values; any
//! persistence lives here so the same catalog entry can back many layers.

#[derive(Debug, Clone, Default)]
pub struct BehaviorState {
    /// General-purpose float scratch (heat maps, trail buffers, positions).
    pub floats: Vec<f32>,
    /// RNG cursor. Stateful, randomized behaviors reseed a fresh
    /// `ChaCha8Rng` from this each tick and store its next draw back here,
    /// so replaying a recorded seed sequence reproduces the same frames.
    pub rng_cursor: u64,
    pub tick_count: u64,
}

impl BehaviorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_len(&mut self, n: usize) {
        if self.floats.len() != n {
            self.floats.clear();
            self.floats.resize(n, 0.0);
        }
    }
}
