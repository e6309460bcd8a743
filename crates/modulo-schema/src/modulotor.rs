//! Modulotor schema: a signal -> parameter routing bound to a layer (§3, §4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModMode {
    Mul,
    Add,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Linear,
    Invert,
    Abs,
    Pow2,
    Pow3,
}

impl CurveKind {
    /// Shape a value in `[0,1]`, returning `[0,1]`.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            CurveKind::Linear => t,
            CurveKind::Invert => 1.0 - t,
            CurveKind::Abs => (2.0 * t - 1.0).abs(),
            CurveKind::Pow2 => t * t,
            CurveKind::Pow3 => t * t * t,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamTarget {
    Brightness,
    Speed,
    Width,
    Softness,
    Density,
    Direction,
    PurposeF0,
    PurposeF1,
    PurposeF2,
    PurposeF3,
    PurposeI0,
    PurposeI1,
    PurposeI2,
    PurposeI3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modulotor {
    pub source: String,
    pub target: ParamTarget,
    pub mode: ModMode,
    #[serde(default = "default_amount")]
    pub amount: f32,
    #[serde(default)]
    pub rate_hz: f32,
    #[serde(default)]
    pub phase: f32,
    #[serde(default)]
    pub bias: f32,
    #[serde(default)]
    pub smooth: f32,
    #[serde(default)]
    pub curve: CurveKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CurveKind {
    fn default() -> Self {
        CurveKind::Linear
    }
}

fn default_amount() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}

impl Modulotor {
    /// Clamp `smooth` into its documented range (§3).
    pub fn clamped_smooth(&self) -> f32 {
        self.smooth.clamp(0.0, 0.999)
    }
}
