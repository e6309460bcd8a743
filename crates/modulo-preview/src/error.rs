use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error(transparent)]
    Rule(#[from] modulo_rules::RuleError),
}

pub type PreviewResult<T> = Result<T, PreviewError>;
