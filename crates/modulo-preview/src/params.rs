//! Layer params -> `BehaviorParams`: base values from the layer's param map,
//! combined with its modulotors, then clamped per target (§4.3, §4.5).

use modulo_behaviors::BehaviorParams;
use modulo_modulotor::{self as modulotor, ModulotorState};
use modulo_schema::layer::Layer;
use modulo_schema::modulotor::ParamTarget;
use modulo_signal::SignalBus;

fn scalar(layer: &Layer, key: &str, default: f32) -> f32 {
    layer.params.get(key).map(|v| v.as_scalar() as f32).unwrap_or(default)
}

fn base_params(layer: &Layer, seed: u64) -> BehaviorParams {
    let mut p = BehaviorParams::default();
    p.brightness = scalar(layer, "brightness", p.brightness);
    p.speed = scalar(layer, "speed", p.speed);
    p.width = scalar(layer, "width", p.width);
    p.softness = scalar(layer, "softness", p.softness);
    p.density = scalar(layer, "density", p.density);
    p.direction = scalar(layer, "direction", p.direction);
    if let Some(color) = layer.params.get("color") {
        let tuple = color.as_tuple();
        for (i, slot) in p.color.iter_mut().enumerate() {
            *slot = tuple.get(i).copied().unwrap_or(255.0) as f32;
        }
    }
    for i in 0..4 {
        p.purpose_f[i] = scalar(layer, &format!("purpose_f{i}"), 0.0);
        p.purpose_i[i] = scalar(layer, &format!("purpose_i{i}"), 0.0);
    }
    p.seed = seed;
    p
}

fn target_mut(params: &mut BehaviorParams, target: ParamTarget) -> &mut f32 {
    match target {
        ParamTarget::Brightness => &mut params.brightness,
        ParamTarget::Speed => &mut params.speed,
        ParamTarget::Width => &mut params.width,
        ParamTarget::Softness => &mut params.softness,
        ParamTarget::Density => &mut params.density,
        ParamTarget::Direction => &mut params.direction,
        ParamTarget::PurposeF0 => &mut params.purpose_f[0],
        ParamTarget::PurposeF1 => &mut params.purpose_f[1],
        ParamTarget::PurposeF2 => &mut params.purpose_f[2],
        ParamTarget::PurposeF3 => &mut params.purpose_f[3],
        ParamTarget::PurposeI0 => &mut params.purpose_i[0],
        ParamTarget::PurposeI1 => &mut params.purpose_i[1],
        ParamTarget::PurposeI2 => &mut params.purpose_i[2],
        ParamTarget::PurposeI3 => &mut params.purpose_i[3],
    }
}

/// Resolve one layer's numeric parameters for this tick: base values from
/// `layer.params`, then each exported modulotor's contribution folded in via
/// its `mode` and clamped to its target's documented range.
pub fn resolve(layer: &Layer, modulotor_states: &mut [ModulotorState], t: f32, bus: &SignalBus, seed: u64) -> BehaviorParams {
    let mut params = base_params(layer, seed);
    let purpose_f = params.purpose_f;
    let purpose_i = params.purpose_i;
    for (m, state) in layer.exported_modulotors().iter().zip(modulotor_states.iter_mut()) {
        let sig = modulotor::step(m, state, t, bus, &purpose_f, &purpose_i);
        let slot = target_mut(&mut params, m.target);
        let combined = modulotor::apply(*slot as f64, sig, m.mode, m.amount);
        *slot = modulotor::clamp_param(m.target, combined) as f32;
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::layer::ParamValue;
    use modulo_schema::modulotor::{CurveKind, ModMode, Modulotor};

    #[test]
    fn base_params_read_known_keys() {
        let mut layer = Layer::new("l", "solid");
        layer.params.insert("brightness".into(), ParamValue::Scalar(0.25));
        let params = resolve(&layer, &mut [], 0.0, &SignalBus::new(), 7);
        assert_eq!(params.brightness, 0.25);
        assert_eq!(params.seed, 7);
    }

    #[test]
    fn modulotor_multiplies_brightness() {
        let mut layer = Layer::new("l", "solid");
        layer.params.insert("brightness".into(), ParamValue::Scalar(0.5));
        layer.modulotors.push(Modulotor {
            source: "vars.number.x".into(),
            target: ParamTarget::Brightness,
            mode: ModMode::Set,
            amount: 1.0,
            rate_hz: 0.0,
            phase: 0.0,
            bias: 0.0,
            smooth: 0.0,
            curve: CurveKind::Linear,
            enabled: true,
        });
        let mut bus = SignalBus::new();
        bus.set("vars.number.x", 1.0);
        let mut states = vec![ModulotorState::default()];
        let params = resolve(&layer, &mut states, 0.0, &bus, 0);
        assert!(params.brightness > 0.5);
    }
}
