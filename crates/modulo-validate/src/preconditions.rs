//! Export preconditions (§4.10 step 1, §4.11): layout validity, and every
//! referenced behavior both exportable and eligible for the project's
//! layout shape. Pure — never mutates `project`.

use modulo_behaviors::registry::{BehaviorRegistry, Exportable, Supports};
use modulo_schema::layout::Layout;
use modulo_schema::project::Project;

use crate::error::{ValidateError, ValidateResult};

fn layout_supports(layout: &Layout, supports: Supports) -> bool {
    match (layout, supports) {
        (_, Supports::Both) => true,
        (Layout::Strip { .. }, Supports::Strip) => true,
        (Layout::Cells { .. }, Supports::Cells) => true,
        _ => false,
    }
}

pub fn check(project: &Project, registry: &BehaviorRegistry) -> ValidateResult<()> {
    project.validate().map_err(|e| ValidateError::InvalidLayout(e.to_string()))?;
    if project.num_leds() == 0 {
        return Err(ValidateError::InvalidLayout("num_leds must be > 0".into()));
    }

    for (layer_index, layer) in project.layers.iter().enumerate() {
        let behavior = registry
            .get(&layer.behavior)
            .map_err(|_| ValidateError::UnknownBehavior { layer_index, key: layer.behavior.clone() })?;
        let meta = behavior.meta();
        if meta.exportable != Exportable::Exportable {
            return Err(ValidateError::BehaviorNotExportable { layer_index, key: layer.behavior.clone() });
        }
        if !layout_supports(&project.layout, meta.supports) {
            return Err(ValidateError::LayoutEffectMismatch { layer_index, key: layer.behavior.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_behaviors::catalog::register_builtins;
    use modulo_schema::layer::Layer;
    use modulo_schema::project::ExportConfig;
    use std::collections::HashMap;

    fn project(layout: Layout, layers: Vec<Layer>) -> Project {
        Project {
            schema_version: 6,
            name: "t".into(),
            layout,
            layers,
            zones: HashMap::new(),
            groups: HashMap::new(),
            masks: HashMap::new(),
            signals: HashMap::new(),
            variables: Default::default(),
            rules_v6: vec![],
            ui: Default::default(),
            export: ExportConfig::default(),
        }
    }

    fn registry() -> BehaviorRegistry {
        let mut reg = BehaviorRegistry::new();
        register_builtins(&mut reg).unwrap();
        reg
    }

    #[test]
    fn clean_project_passes() {
        let p = project(Layout::Strip { count: 4, led_pin: 6 }, vec![Layer::new("l", "solid")]);
        assert!(check(&p, &registry()).is_ok());
    }

    #[test]
    fn unknown_behavior_is_rejected() {
        let p = project(Layout::Strip { count: 4, led_pin: 6 }, vec![Layer::new("l", "no-such-thing")]);
        assert!(matches!(check(&p, &registry()), Err(ValidateError::UnknownBehavior { .. })));
    }

    #[test]
    fn zero_leds_is_rejected() {
        let p = project(Layout::Strip { count: 0, led_pin: 6 }, vec![]);
        assert!(check(&p, &registry()).is_err());
    }
}
