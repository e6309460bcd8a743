use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BehaviorError {
    #[error("behavior key '{0}' is already registered")]
    DuplicateKey(String),

    #[error("unknown behavior key '{0}'")]
    UnknownKey(String),

    #[error("plugin behavior '{0}' does not export (policy: if it previews, it must export)")]
    PluginMustExport(String),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
