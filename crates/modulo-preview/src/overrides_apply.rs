//! Apply a tick's `RuntimeOverrides` to a layer's schema fields before it is
//! rendered and composited (§4.6, §4.8). `Layer` is otherwise immutable
//! project data; overrides act on a per-tick clone, never the original.

use modulo_rules::validate::{first_gain_slot, first_gamma_slot};
use modulo_rules::RuntimeOverrides;
use modulo_schema::layer::{Layer, Operator};
use modulo_schema::rule::LayerParam;

pub fn effective_layer(layer: &Layer, layer_index: usize, overrides: &RuntimeOverrides) -> Layer {
    let mut out = layer.clone();
    if let Some(v) = overrides.get(layer_index, LayerParam::Opacity) {
        out.opacity = v as f32;
    }
    if let Some(v) = overrides.get(layer_index, LayerParam::OpGain) {
        if let Some(slot) = first_gain_slot(layer) {
            if let Operator::Gain { k } = &mut out.operators[slot] {
                *k = v as f32;
            }
        }
    }
    if let Some(v) = overrides.get(layer_index, LayerParam::OpGamma) {
        if let Some(slot) = first_gamma_slot(layer) {
            if let Operator::Gamma { gamma } = &mut out.operators[slot] {
                *gamma = v as f32;
            }
        }
    }
    out
}

/// `brightness` is a behavior param, not a schema field — applied directly
/// to the already-resolved `BehaviorParams` after modulotor combination.
pub fn apply_brightness_override(
    params: &mut modulo_behaviors::BehaviorParams,
    layer_index: usize,
    overrides: &RuntimeOverrides,
) {
    if let Some(v) = overrides.get(layer_index, LayerParam::Brightness) {
        params.brightness = v as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::rule::Conflict;

    #[test]
    fn opacity_override_replaces_base_value() {
        let layer = Layer::new("l", "solid");
        let mut overrides = RuntimeOverrides::new();
        overrides.write(0, LayerParam::Opacity, 0.3, Conflict::Last);
        let out = effective_layer(&layer, 0, &overrides);
        assert_eq!(out.opacity, 0.3);
    }

    #[test]
    fn op_gain_override_targets_first_gain_slot() {
        let mut layer = Layer::new("l", "solid");
        layer.operators.push(Operator::Gamma { gamma: 2.0 });
        layer.operators.push(Operator::Gain { k: 1.0 });
        let mut overrides = RuntimeOverrides::new();
        overrides.write(0, LayerParam::OpGain, 3.0, Conflict::Last);
        let out = effective_layer(&layer, 0, &overrides);
        assert_eq!(out.operators[1], Operator::Gain { k: 3.0 });
    }

    #[test]
    fn missing_gain_operator_leaves_layer_unchanged() {
        let layer = Layer::new("l", "solid");
        let mut overrides = RuntimeOverrides::new();
        overrides.write(0, LayerParam::OpGain, 3.0, Conflict::Last);
        let out = effective_layer(&layer, 0, &overrides);
        assert!(out.operators.is_empty());
    }
}
