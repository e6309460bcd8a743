//! Rule validation errors (§4.6, §7). These are hard failures raised before
//! the first tick, never at runtime — unknown signals at runtime resolve to
//! 0.0 instead (§4.2, §7).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule '{rule_id}': unknown variable '{var}'")]
    UnknownVar { rule_id: String, var: String },

    #[error("rule '{rule_id}': variable '{var}' has the wrong kind")]
    BadVarKind { rule_id: String, var: String },

    #[error("rule '{rule_id}': unsupported set_layer_param target for layer {layer_index}")]
    LayerParamUnsupported { rule_id: String, layer_index: usize },

    #[error("rule '{rule_id}': op_gain target has no gain operator on layer {layer_index}")]
    OpGainNoOperator { rule_id: String, layer_index: usize },

    #[error("rule '{rule_id}': op_gamma target has no gamma operator on layer {layer_index}")]
    OpGammaNoOperator { rule_id: String, layer_index: usize },
}

pub type RuleResult<T> = Result<T, RuleError>;
