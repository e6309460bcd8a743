//! Emitter failures (§4.10 step 8, §6). A failed export never leaves a
//! partially-written file behind.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error(transparent)]
    Validate(#[from] modulo_validate::ValidateError),

    #[error(transparent)]
    Rule(#[from] modulo_rules::RuleError),

    #[error("rule '{rule_id}' targets layer {layer_index} param {param:?} but no matching operator slot exists")]
    MissingOperatorSlot { rule_id: String, layer_index: usize, param: &'static str },

    #[error("unknown target pack '{0}'")]
    UnknownTarget(String),

    #[error("required MSGEQ7 audio_hw field '{0}' is missing")]
    MissingAudioHwField(String),

    #[error("export artifact validation failed:\n- {0}")]
    ArtifactValidation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A behavior preconditions already confirmed is registered turned out
    /// missing at lowering time; indicates the registry changed mid-export.
    #[error("internal lowering invariant violated: {0}")]
    Internal(String),
}

pub type EmitResult<T> = Result<T, EmitError>;
