//! Layer, operator chain, and per-layer targeting (spec §3, §4.4).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modulotor::Modulotor;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    Over,
    Add,
    Max,
    Multiply,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    All,
    Group,
    Zone,
    Mask,
}

/// A layer parameter value: either a single scalar or a tuple (e.g. RGB color).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Tuple(Vec<f64>),
}

impl ParamValue {
    pub fn as_scalar(&self) -> f64 {
        match self {
            ParamValue::Scalar(v) => *v,
            ParamValue::Tuple(v) => v.first().copied().unwrap_or(0.0),
        }
    }

    pub fn as_tuple(&self) -> Vec<f64> {
        match self {
            ParamValue::Scalar(v) => vec![*v],
            ParamValue::Tuple(v) => v.clone(),
        }
    }
}

/// Exportable operator variants applied pre-blend (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operator {
    Gain { k: f32 },
    Gamma { gamma: f32 },
    Posterize { levels: u8 },
    /// Legacy back-compat mirror: older projects stored the behavior key as
    /// `operators[0].kind` with no typed meaning. Any `kind` that isn't one
    /// of the real operators above lands here so loading never fails on it;
    /// `Layer::exported_operators` filters these out before the chain runs.
    #[serde(other)]
    Legacy,
}

impl Operator {
    /// Apply to one channel value in `[0, 255]`.
    pub fn apply(&self, c: f32) -> f32 {
        match *self {
            Operator::Gain { k } => (c * k).clamp(0.0, 255.0),
            Operator::Gamma { gamma } => {
                let gamma = gamma.max(0.001);
                ((c / 255.0).max(0.0).powf(1.0 / gamma) * 255.0).clamp(0.0, 255.0)
            }
            Operator::Posterize { levels } => {
                let levels = levels.clamp(2, 64) as f32;
                let step = 255.0 / (levels - 1.0);
                ((c / step).round() * step).clamp(0.0, 255.0)
            }
            Operator::Legacy => c,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub uid: Uuid,
    pub name: String,
    pub behavior: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_one")]
    pub opacity: f32,
    #[serde(default = "default_blend")]
    pub blend_mode: BlendMode,
    #[serde(default = "default_target_kind")]
    pub target_kind: TargetKind,
    #[serde(default)]
    pub target_ref: Option<String>,
    #[serde(default)]
    pub params: HashMap<String, ParamValue>,
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub modulotors: Vec<Modulotor>,
    #[serde(default)]
    pub locked: bool,
}

fn default_true() -> bool {
    true
}
fn default_one() -> f32 {
    1.0
}
fn default_blend() -> BlendMode {
    BlendMode::Over
}
fn default_target_kind() -> TargetKind {
    TargetKind::All
}

impl Layer {
    pub fn new(name: impl Into<String>, behavior: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.into(),
            behavior: behavior.into(),
            enabled: true,
            opacity: 1.0,
            blend_mode: BlendMode::Over,
            target_kind: TargetKind::All,
            target_ref: None,
            params: HashMap::new(),
            operators: Vec::new(),
            modulotors: Vec::new(),
            locked: false,
        }
    }

    /// Operators and modulotors are bounded to two exported slots (§3).
    /// Legacy back-compat mirror entries never occupy a slot.
    pub fn exported_operators(&self) -> Vec<Operator> {
        self.operators.iter().copied().filter(|op| !matches!(op, Operator::Legacy)).take(2).collect()
    }

    pub fn exported_modulotors(&self) -> &[Modulotor] {
        let n = self.modulotors.len().min(2);
        &self.modulotors[..n]
    }
}

pub fn blend(mode: BlendMode, a: f32, b: f32) -> f32 {
    match mode {
        BlendMode::Over => b,
        BlendMode::Add => (a + b).min(255.0),
        BlendMode::Max => a.max(b),
        BlendMode::Multiply => a * b / 255.0,
        BlendMode::Screen => 255.0 - (255.0 - a) * (255.0 - b) / 255.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_identities() {
        assert_eq!(blend(BlendMode::Over, 10.0, 200.0), 200.0);
        assert_eq!(blend(BlendMode::Multiply, 255.0, 123.0), 123.0);
        assert_eq!(blend(BlendMode::Screen, 77.0, 0.0), 77.0);
        assert_eq!(blend(BlendMode::Add, 200.0, 200.0), 255.0);
        assert_eq!(blend(BlendMode::Max, 10.0, 200.0), blend(BlendMode::Max, 200.0, 10.0));
    }

    #[test]
    fn operator_clamps() {
        assert_eq!(Operator::Gain { k: 2.0 }.apply(200.0), 255.0);
        assert!(Operator::Gamma { gamma: 2.2 }.apply(128.0) > 0.0);
        let p = Operator::Posterize { levels: 2 }.apply(130.0);
        assert!(p == 0.0 || p == 255.0);
    }
}
