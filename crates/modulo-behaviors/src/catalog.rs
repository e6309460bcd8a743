//! Fixed catalog registration (§4.3). Effects that render blank in the
//! visual audit stay in the source tree but are never registered here —
//! the quarantine policy is "present, not shipped", not deletion.

use std::sync::Arc;

use crate::effects::{AudioMeter, Chase, MappingDiagnostics, Rainbow, Solid, Sparkle, Strobe};
use crate::error::BehaviorResult;
use crate::registry::BehaviorRegistry;

pub fn register_builtins(registry: &mut BehaviorRegistry) -> BehaviorResult<()> {
    registry.register_builtin(Arc::new(Solid))?;
    registry.register_builtin(Arc::new(Strobe))?;
    registry.register_builtin(Arc::new(Rainbow))?;
    registry.register_builtin(Arc::new(Chase))?;
    registry.register_builtin(Arc::new(Sparkle))?;
    registry.register_builtin(Arc::new(AudioMeter))?;
    registry.register_builtin(Arc::new(MappingDiagnostics))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_without_duplicates() {
        let mut reg = BehaviorRegistry::new();
        register_builtins(&mut reg).unwrap();
        assert!(reg.contains("solid"));
        assert!(reg.contains("mapping_diagnostics"));
        assert_eq!(reg.keys().len(), 7);
    }
}
