//! Target-pack capability checks (§4.10, §5 "Shared-resource policy"). A
//! lightweight capability view owned by this crate; the firmware emitter's
//! richer `TargetPack` trait converts into this before calling `check()`, so
//! `modulo-validate` never depends on `modulo-emit`.

use modulo_schema::layout::Layout;
use modulo_schema::project::Project;

use crate::error::{ValidateError, ValidateResult};

#[derive(Debug, Clone, Copy)]
pub struct TargetCapabilities {
    pub supports_matrix: bool,
    pub supports_operators_runtime: bool,
    pub supports_postfx_runtime: bool,
    pub max_leds_hard: Option<u32>,
}

fn postfx_in_use(project: &Project) -> bool {
    project.export.postfx.bleed_amount > 0.0 || project.export.postfx.trail_amount > 0.0
}

pub fn check(caps: &TargetCapabilities, project: &Project) -> ValidateResult<()> {
    if matches!(project.layout, Layout::Cells { .. }) && !caps.supports_matrix {
        return Err(ValidateError::TargetCapability("target does not support matrix layouts".into()));
    }

    if !caps.supports_operators_runtime && project.layers.iter().any(|l| !l.operators.is_empty()) {
        return Err(ValidateError::TargetCapability("target does not support runtime operators".into()));
    }

    if !caps.supports_postfx_runtime && postfx_in_use(project) {
        return Err(ValidateError::TargetCapability("target does not support runtime post-fx".into()));
    }

    if let Some(max) = caps.max_leds_hard {
        if project.num_leds() > max {
            return Err(ValidateError::TargetCapability(format!("project has {} leds, target allows at most {max}", project.num_leds())));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn caps() -> TargetCapabilities {
        TargetCapabilities { supports_matrix: false, supports_operators_runtime: true, supports_postfx_runtime: true, max_leds_hard: Some(120) }
    }

    #[test]
    fn matrix_layout_rejected_when_unsupported() {
        let p = project(
            Layout::Cells {
                width: 4,
                height: 4,
                serpentine: false,
                origin: modulo_schema::layout::Origin::Tl,
                rotate: modulo_schema::layout::Rotate::R0,
                flip_x: false,
                flip_y: false,
            },
            vec![Layer::new("l", "solid")],
        );
        assert!(check(&caps(), &p).is_err());
    }

    #[test]
    fn led_count_over_hard_cap_is_rejected() {
        let p = project(Layout::Strip { count: 500, led_pin: 6 }, vec![Layer::new("l", "solid")]);
        assert!(check(&caps(), &p).is_err());
    }

    #[test]
    fn within_caps_passes() {
        let p = project(Layout::Strip { count: 60, led_pin: 6 }, vec![Layer::new("l", "solid")]);
        assert!(check(&caps(), &p).is_ok());
    }
}
