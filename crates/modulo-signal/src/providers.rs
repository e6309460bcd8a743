//! Signal providers: pure functions `ctx -> map<String, f32>` registered by
//! name, each allowed to write only keys it owns (§4.2). Expressed as
//! `Result`-returning rather than exception-swallowing, per §9.

use std::collections::HashMap;

use thiserror::Error;

use crate::SignalBus;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider failed: {0}")]
    Failed(String),
}

/// Read-only view a provider may consult while computing derived signals
/// (e.g. `particles.*`, `mods.*`).
pub struct ProviderContext<'a> {
    pub bus: &'a SignalBus,
}

pub trait SignalProvider: Send + Sync {
    fn name(&self) -> &str;
    fn provide(&self, ctx: &ProviderContext<'_>) -> Result<HashMap<String, f32>, ProviderError>;
}
