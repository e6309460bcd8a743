//! Resolved, numeric view of a layer's parameters, after modulotor
//! combination and clamping (§4.3, §4.5) — what a behavior actually sees.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorParams {
    pub brightness: f32,
    pub speed: f32,
    pub width: f32,
    pub softness: f32,
    pub density: f32,
    pub direction: f32,
    pub purpose_f: [f32; 4],
    pub purpose_i: [f32; 4],
    pub color: [f32; 3],
    /// Deterministic seed for this layer/tick. Behaviors must derive any
    /// randomness from this, never from a process-global RNG (§4.3).
    pub seed: u64,
}

impl Default for BehaviorParams {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            speed: 1.0,
            width: 1.0,
            softness: 0.5,
            density: 0.5,
            direction: 1.0,
            purpose_f: [0.0; 4],
            purpose_i: [0.0; 4],
            color: [255.0, 255.0, 255.0],
            seed: 0,
        }
    }
}
