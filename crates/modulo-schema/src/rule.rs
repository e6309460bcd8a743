//! Rules V6 schema (§3, §4.6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Tick,
    Rising,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl CmpOp {
    pub fn eval(&self, lhs: f32, rhs: f32) -> bool {
        match self {
            CmpOp::Gt => lhs > rhs,
            CmpOp::Gte => lhs >= rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Lte => lhs <= rhs,
            CmpOp::Eq => (lhs - rhs).abs() < f32::EPSILON,
        }
    }

    pub fn is_upper_bound(&self) -> bool {
        matches!(self, CmpOp::Lt | CmpOp::Lte)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct When {
    #[serde(default)]
    pub signal: String,
    pub op: CmpOp,
    pub value: f32,
    #[serde(default)]
    pub hyst: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub signal: String,
    pub op: CmpOp,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CondMode {
    All,
    Any,
}

impl Default for CondMode {
    fn default() -> Self {
        CondMode::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Number,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerParam {
    Opacity,
    Brightness,
    OpGain,
    OpGamma,
    PostfxTrail,
    PostfxBleed,
    PostfxBleedRadius,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conflict {
    Last,
    First,
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprSrc {
    Const,
    Signal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub src: ExprSrc,
    #[serde(default)]
    pub const_: Option<f32>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default = "default_one")]
    pub scale: f32,
    #[serde(default)]
    pub bias: f32,
    #[serde(default)]
    pub as_bool: bool,
}

fn default_one() -> f32 {
    1.0
}

impl Expr {
    /// Evaluate against a signal-value resolver. Unknown signals resolve to
    /// 0.0 (fail-closed, §4.2).
    pub fn eval(&self, resolve_signal: impl Fn(&str) -> f32) -> f32 {
        let raw = match self.src {
            ExprSrc::Const => self.const_.unwrap_or(0.0),
            ExprSrc::Signal => self.signal.as_deref().map(resolve_signal).unwrap_or(0.0),
        };
        let v = self.scale * raw + self.bias;
        if self.as_bool {
            if v > 0.5 {
                1.0
            } else {
                0.0
            }
        } else {
            v
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    SetVar {
        var_kind: VarKind,
        var: String,
        expr: Expr,
    },
    AddVar {
        var: String,
        expr: Expr,
    },
    FlipToggle {
        var: String,
    },
    SetLayerParam {
        layer_index: usize,
        param: LayerParam,
        expr: Expr,
        conflict: Conflict,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub trigger: Trigger,
    pub when: When,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub cond_mode: CondMode,
    pub action: Action,
    #[serde(default)]
    pub name: String,
}

fn default_true() -> bool {
    true
}
