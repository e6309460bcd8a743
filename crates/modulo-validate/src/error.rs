//! Error codes for export validation (§4.11, §7). These are the only
//! failures export ever raises before touching the filesystem.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    #[error("[E_INVALID_LAYOUT] {0}")]
    InvalidLayout(String),

    #[error("[E_BEHAVIOR_NOT_EXPORTABLE] layer {layer_index} ('{key}') is not exportable")]
    BehaviorNotExportable { layer_index: usize, key: String },

    #[error("[E_UNKNOWN_BEHAVIOR] layer {layer_index} references unregistered behavior '{key}'")]
    UnknownBehavior { layer_index: usize, key: String },

    #[error("[E_LAYOUT_EFFECT_MISMATCH] layer {layer_index} ('{key}') does not support this layout")]
    LayoutEffectMismatch { layer_index: usize, key: String },

    #[error("[E_ERA_MAX_LAYERS] era allows at most {max} layers (got {got})")]
    EraMaxLayers { max: usize, got: usize },

    #[error("[E_ERA_EFFECT_BLOCKED] layer {layer_index} ('{key}') is not in this era's allow-list")]
    EraEffectBlocked { layer_index: usize, key: String },

    #[error("[E_ERA_RULES_BLOCKED] era does not allow rules_v6 (found {count})")]
    EraRulesBlocked { count: usize },

    #[error("[E_ERA_OPERATORS_BLOCKED] era does not allow operators (layer {layer_index} has {count})")]
    EraOperatorsBlocked { layer_index: usize, count: usize },

    #[error("[E_ERA_AUDIO_BLOCKED] era does not allow audio modulotors (layer {layer_index})")]
    EraAudioBlocked { layer_index: usize },

    #[error("[E_ERA_MATRIX_BLOCKED] era does not allow matrix layouts")]
    EraMatrixBlocked,

    #[error("[E_TARGET_CAPABILITY] {0}")]
    TargetCapability(String),
}

pub type ValidateResult<T> = Result<T, ValidateError>;
