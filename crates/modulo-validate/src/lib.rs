//! Pure, non-mutating export validation (§4.11): preconditions, era gates,
//! and target-pack capability checks. Never writes anything; only raises
//! the `[E_*]`-coded errors that gate `modulo-emit`.

pub mod era;
pub mod error;
pub mod preconditions;
pub mod target_pack;

pub use era::{EraGates, EraId};
pub use error::{ValidateError, ValidateResult};
pub use target_pack::TargetCapabilities;

use modulo_behaviors::BehaviorRegistry;
use modulo_schema::project::Project;

/// Run every check an export needs before `modulo-emit` may lower the
/// project: preconditions, then (if given) era gates and target capability.
pub fn validate_for_export(
    project: &Project,
    registry: &BehaviorRegistry,
    era: Option<EraId>,
    target_caps: Option<&TargetCapabilities>,
) -> ValidateResult<()> {
    preconditions::check(project, registry)?;
    if let Some(era) = era {
        era::validate(era, project)?;
    }
    if let Some(caps) = target_caps {
        target_pack::check(caps, project)?;
    }
    Ok(())
}
