//! Era gates: a policy filter over an otherwise-valid project, modelling
//! the historical capability ceilings a project template is allowed to use
//! (§4.11; original `app/eras/era_enforce.py`, `era_templates.py`).

use modulo_schema::layout::Layout;
use modulo_schema::project::Project;

use crate::error::{ValidateError, ValidateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraId {
    /// Single fixed-color indicator: one layer, no rules/operators/audio/matrix.
    Classic,
    /// Full strip feature set: rules, operators, audio, still no matrix.
    Modern,
    /// Everything Modern allows, plus matrix layouts.
    Matrix,
}

#[derive(Debug, Clone)]
pub struct EraGates {
    pub allowed_effects: Option<Vec<&'static str>>,
    pub max_layers: usize,
    pub allow_rules: bool,
    pub allow_operators: bool,
    pub allow_audio: bool,
    pub allow_matrix: bool,
}

pub fn gates(era: EraId) -> EraGates {
    match era {
        EraId::Classic => EraGates {
            allowed_effects: Some(vec!["solid", "strobe"]),
            max_layers: 1,
            allow_rules: false,
            allow_operators: false,
            allow_audio: false,
            allow_matrix: false,
        },
        EraId::Modern => EraGates {
            allowed_effects: None,
            max_layers: 99,
            allow_rules: true,
            allow_operators: true,
            allow_audio: true,
            allow_matrix: false,
        },
        EraId::Matrix => EraGates {
            allowed_effects: None,
            max_layers: 99,
            allow_rules: true,
            allow_operators: true,
            allow_audio: true,
            allow_matrix: true,
        },
    }
}

fn modulotor_is_audio(source: &str) -> bool {
    source.starts_with("audio.")
}

pub fn validate(era: EraId, project: &Project) -> ValidateResult<()> {
    let gates = gates(era);

    if project.layers.len() > gates.max_layers {
        return Err(ValidateError::EraMaxLayers { max: gates.max_layers, got: project.layers.len() });
    }

    if let Some(allowed) = &gates.allowed_effects {
        for (layer_index, layer) in project.layers.iter().enumerate() {
            if !allowed.contains(&layer.behavior.as_str()) {
                return Err(ValidateError::EraEffectBlocked { layer_index, key: layer.behavior.clone() });
            }
        }
    }

    if !gates.allow_rules && !project.rules_v6.is_empty() {
        return Err(ValidateError::EraRulesBlocked { count: project.rules_v6.len() });
    }

    if !gates.allow_operators {
        for (layer_index, layer) in project.layers.iter().enumerate() {
            if !layer.operators.is_empty() {
                return Err(ValidateError::EraOperatorsBlocked { layer_index, count: layer.operators.len() });
            }
        }
    }

    if !gates.allow_audio {
        for (layer_index, layer) in project.layers.iter().enumerate() {
            if layer.modulotors.iter().any(|m| modulotor_is_audio(&m.source)) {
                return Err(ValidateError::EraAudioBlocked { layer_index });
            }
        }
    }

    if !gates.allow_matrix && matches!(project.layout, Layout::Cells { .. }) {
        return Err(ValidateError::EraMatrixBlocked);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::layer::Layer;
    use modulo_schema::modulotor::{CurveKind, ModMode, Modulotor, ParamTarget};
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

    #[test]
    fn classic_rejects_a_second_layer() {
        let p = project(
            Layout::Strip { count: 4, led_pin: 6 },
            vec![Layer::new("a", "solid"), Layer::new("b", "solid")],
        );
        assert!(matches!(validate(EraId::Classic, &p), Err(ValidateError::EraMaxLayers { .. })));
    }

    #[test]
    fn classic_rejects_effect_outside_allow_list() {
        let p = project(Layout::Strip { count: 4, led_pin: 6 }, vec![Layer::new("a", "rainbow")]);
        assert!(matches!(validate(EraId::Classic, &p), Err(ValidateError::EraEffectBlocked { .. })));
    }

    #[test]
    fn modern_rejects_matrix_layout() {
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
            vec![Layer::new("a", "solid")],
        );
        assert!(matches!(validate(EraId::Modern, &p), Err(ValidateError::EraMatrixBlocked)));
        assert!(validate(EraId::Matrix, &p).is_ok());
    }

    #[test]
    fn classic_rejects_audio_modulotor() {
        let mut layer = Layer::new("a", "solid");
        layer.modulotors.push(Modulotor {
            source: "audio.energy".into(),
            target: ParamTarget::Brightness,
            mode: ModMode::Mul,
            amount: 1.0,
            rate_hz: 0.0,
            phase: 0.0,
            bias: 0.0,
            smooth: 0.0,
            curve: CurveKind::Linear,
            enabled: true,
        });
        let p = project(Layout::Strip { count: 4, led_pin: 6 }, vec![layer]);
        assert!(matches!(validate(EraId::Classic, &p), Err(ValidateError::EraAudioBlocked { .. })));
    }
}
