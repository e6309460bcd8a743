//! Modulotor engine: signal -> signed contribution -> shaped/smoothed ->
//! combined into a base parameter (§4.5).

use modulo_schema::modulotor::{ModMode, Modulotor, ParamTarget};
use modulo_signal::SignalBus;
use std::f32::consts::PI;

/// Per-modulotor one-pole smoothing state, owned by the evaluator alongside
/// other per-layer scratch (§3 Lifecycle).
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulotorState {
    last: Option<f32>,
}

fn audio_bipolar(reading01: f32) -> f32 {
    (reading01.clamp(0.0, 1.0) - 0.5) * 2.0
}

/// `purpose_f0..3`/`purpose_i0..3` are read from the layer's own resolved
/// params, not the signal bus — nothing else ever populates those keys on
/// the bus, so routing them through `bus.get` would silently always read 0.
fn purpose_index(src: &str, prefix: &str) -> Option<usize> {
    src.strip_prefix(prefix)?.parse::<usize>().ok().filter(|&i| i < 4)
}

/// Raw signed contribution before curve shaping, per §4.5 per-source rules.
fn raw_signal(m: &Modulotor, t: f32, bus: &SignalBus, purpose_f: &[f32; 4], purpose_i: &[f32; 4]) -> f32 {
    let src = m.source.as_str();
    if src == "lfo_sine" {
        (2.0 * PI * (m.rate_hz * t + m.phase)).sin()
    } else if src.starts_with("audio.") {
        audio_bipolar(bus.get(src))
    } else if let Some(idx) = purpose_index(src, "purpose_f") {
        audio_bipolar(purpose_f[idx])
    } else if let Some(idx) = purpose_index(src, "purpose_i") {
        // purpose_i is a signed int in [-1000,1000]; normalize to [0,1] same
        // as purpose_f before applying the shared bipolar mapping.
        audio_bipolar(normalize_purpose_i(purpose_i[idx] as i32) as f32)
    } else if let Some(name) = src.strip_prefix("vars.number.") {
        bus.get(&format!("vars.number.{name}"))
    } else if let Some(name) = src.strip_prefix("vars.toggle.") {
        bus.get(&format!("vars.toggle.{name}"))
    } else {
        0.0
    }
}

/// Step one modulotor for the current tick, updating smoothing state, and
/// return its signed contribution in `[-1, 1]`. `purpose_f`/`purpose_i` are
/// the layer's own resolved purpose-channel values for this tick (§4.5).
pub fn step(
    m: &Modulotor,
    state: &mut ModulotorState,
    t: f32,
    bus: &SignalBus,
    purpose_f: &[f32; 4],
    purpose_i: &[f32; 4],
) -> f32 {
    if !m.enabled {
        return 0.0;
    }
    let sig = raw_signal(m, t, bus, purpose_f, purpose_i);

    // curve shaping happens in [0,1] space, then we re-center to [-1,1]
    let u = (sig.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let shaped = m.curve.apply(u);
    let mut sig = shaped * 2.0 - 1.0;

    sig += m.bias;

    let a = m.clamped_smooth();
    if a > 0.0 {
        let last = state.last.unwrap_or(sig);
        let smoothed = a * last + (1.0 - a) * sig;
        state.last = Some(smoothed);
        sig = smoothed;
    } else {
        state.last = Some(sig);
    }

    sig
}

/// Combine a modulotor's contribution into a base parameter value.
pub fn apply(base: f64, sig: f32, mode: ModMode, amount: f32) -> f64 {
    let sig = sig as f64;
    let amount = amount as f64;
    match mode {
        ModMode::Mul => base * (1.0 + sig * amount),
        ModMode::Add => base + sig * amount,
        ModMode::Set => sig * amount,
    }
}

/// Parameter min/max/integer clamp registry (§4.5 "Parameters are clamped
/// per params/registry entries").
pub fn clamp_param(target: ParamTarget, value: f64) -> f64 {
    match target {
        ParamTarget::Brightness => value.clamp(0.0, 1.0),
        ParamTarget::Speed => value.clamp(0.0, 8.0),
        ParamTarget::Width => value.clamp(0.0, 1.0),
        ParamTarget::Softness => value.clamp(0.0, 1.0),
        ParamTarget::Density => value.clamp(0.0, 1.0),
        ParamTarget::Direction => value.clamp(-1.0, 1.0),
        ParamTarget::PurposeF0 | ParamTarget::PurposeF1 | ParamTarget::PurposeF2 | ParamTarget::PurposeF3 => {
            value.clamp(-1.0, 1.0)
        }
        // purpose_i* are signed ints normalized [-1000,1000] -> [0,1] (resolved
        // Open Question, DESIGN.md); value here is already in the [0,1] space.
        ParamTarget::PurposeI0 | ParamTarget::PurposeI1 | ParamTarget::PurposeI2 | ParamTarget::PurposeI3 => {
            value.clamp(0.0, 1.0)
        }
    }
}

/// Normalize a raw signed purpose-int reading (`[-1000, 1000]`) into the
/// `[0, 1]` space `purpose_i*` parameters live in.
pub fn normalize_purpose_i(raw: i32) -> f64 {
    ((raw.clamp(-1000, 1000) as f64) + 1000.0) / 2000.0
}
