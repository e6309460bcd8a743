//! A representative slice of the fixed catalog: enough stateless, stateful,
//! RNG-seeded and audio-reactive shapes to exercise every metadata axis in
//! §4.3. The full shipped catalog is much larger; effects quarantined for
//! rendering blank in audits are simply never registered (see `catalog.rs`).

use modulo_operator::Rgb;
use modulo_signal::AudioFrame;
use rand::RngCore;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::params::BehaviorParams;
use crate::registry::{Behavior, BehaviorMeta, Exportable, Supports};
use crate::state::BehaviorState;

fn scale(color: [f32; 3], k: f32) -> Rgb {
    [color[0] * k, color[1] * k, color[2] * k]
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h.floor() as i32;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i.rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r * 255.0, g * 255.0, b * 255.0]
}

/// Next deterministic u64 from a state cursor, advancing it in place.
fn next_from_cursor(cursor: &mut u64) -> u64 {
    let mut rng = ChaCha8Rng::seed_from_u64(*cursor);
    let v = rng.next_u64();
    *cursor = v;
    v
}

/// Uniformly lit solid color, scaled by brightness. Stateless.
pub struct Solid;

impl Behavior for Solid {
    fn key(&self) -> &'static str {
        "solid"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::Exportable,
            stateful: false,
            uses: vec!["color", "brightness"],
            arduino_behavior_id: Some(0),
        }
    }
    fn reset(&self, _state: &mut BehaviorState, _params: &BehaviorParams) {}
    fn tick(&self, _state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, _audio: &AudioFrame) {}
    fn render(&self, _state: &BehaviorState, params: &BehaviorParams, _t: f32, num_leds: usize) -> Vec<Rgb> {
        vec![scale(params.color, params.brightness); num_leds]
    }
}

/// Square-wave on/off. Pure function of `t` and `speed`. Stateless.
pub struct Strobe;

impl Behavior for Strobe {
    fn key(&self) -> &'static str {
        "strobe"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::Exportable,
            stateful: false,
            uses: vec!["color", "brightness", "speed"],
            arduino_behavior_id: Some(1),
        }
    }
    fn reset(&self, _state: &mut BehaviorState, _params: &BehaviorParams) {}
    fn tick(&self, _state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, _audio: &AudioFrame) {}
    fn render(&self, _state: &BehaviorState, params: &BehaviorParams, t: f32, num_leds: usize) -> Vec<Rgb> {
        let hz = params.speed.max(0.01);
        let on = (t * hz).fract() < 0.5;
        let rgb = if on { scale(params.color, params.brightness) } else { [0.0, 0.0, 0.0] };
        vec![rgb; num_leds]
    }
}

/// Hue cycling across the strip, driven by `t` and `speed`/`width`. Stateless.
pub struct Rainbow;

impl Behavior for Rainbow {
    fn key(&self) -> &'static str {
        "rainbow"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::Exportable,
            stateful: false,
            uses: vec!["brightness", "speed", "width"],
            arduino_behavior_id: Some(2),
        }
    }
    fn reset(&self, _state: &mut BehaviorState, _params: &BehaviorParams) {}
    fn tick(&self, _state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, _audio: &AudioFrame) {}
    fn render(&self, _state: &BehaviorState, params: &BehaviorParams, t: f32, num_leds: usize) -> Vec<Rgb> {
        let width = params.width.max(0.01);
        (0..num_leds)
            .map(|i| {
                let hue = (i as f32 / width) + t * params.speed;
                hsv_to_rgb(hue, 1.0, params.brightness.clamp(0.0, 1.0))
            })
            .collect()
    }
}

/// A single lit pixel sweeping back and forth across the strip. Stateless.
pub struct Chase;

impl Behavior for Chase {
    fn key(&self) -> &'static str {
        "chase"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::Exportable,
            stateful: false,
            uses: vec!["color", "brightness", "speed", "width", "direction"],
            arduino_behavior_id: Some(3),
        }
    }
    fn reset(&self, _state: &mut BehaviorState, _params: &BehaviorParams) {}
    fn tick(&self, _state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, _audio: &AudioFrame) {}
    fn render(&self, _state: &BehaviorState, params: &BehaviorParams, t: f32, num_leds: usize) -> Vec<Rgb> {
        if num_leds == 0 {
            return Vec::new();
        }
        let num_leds_f = num_leds as f32;
        let period = 2.0 * num_leds_f;
        let dir = if params.direction < 0.0 { -1.0 } else { 1.0 };
        // speed is in strip-lengths/s, so the sweep covers num_leds LEDs/s at speed=1.0.
        let phase = (t * params.speed * dir * num_leds_f).rem_euclid(period);
        let pos = if phase < num_leds_f { phase } else { period - phase };
        // width is a fraction of the strip; half of that in LEDs is the falloff radius.
        let half_width = (params.width.max(0.01) * num_leds_f / 2.0).max(0.5);
        let on = params.color;
        (0..num_leds)
            .map(|i| {
                let dist = (i as f32 - pos).abs();
                let weight = (1.0 - dist / half_width).clamp(0.0, 1.0);
                scale(on, params.brightness * weight)
            })
            .collect()
    }
}

/// Random pixels flash and decay. RNG-seeded, stateful.
pub struct Sparkle;

impl Behavior for Sparkle {
    fn key(&self) -> &'static str {
        "sparkle"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::Exportable,
            stateful: true,
            uses: vec!["color", "brightness", "density"],
            arduino_behavior_id: Some(4),
        }
    }
    fn reset(&self, state: &mut BehaviorState, params: &BehaviorParams) {
        state.rng_cursor = params.seed;
        for v in state.floats.iter_mut() {
            *v = 0.0;
        }
    }
    fn tick(&self, state: &mut BehaviorState, params: &BehaviorParams, dt: f32, _t: f32, _audio: &AudioFrame) {
        let n = state.floats.len();
        let decay = (1.0 - 3.0 * dt).clamp(0.0, 1.0);
        for v in state.floats.iter_mut() {
            *v *= decay;
        }
        let spawn_prob = params.density.clamp(0.0, 1.0) * dt * 20.0;
        let draw = next_from_cursor(&mut state.rng_cursor);
        let roll = (draw % 1_000_000) as f32 / 1_000_000.0;
        if roll < spawn_prob && n > 0 {
            let idx = (next_from_cursor(&mut state.rng_cursor) as usize) % n;
            state.floats[idx] = 1.0;
        }
    }
    fn render(&self, state: &BehaviorState, params: &BehaviorParams, _t: f32, num_leds: usize) -> Vec<Rgb> {
        (0..num_leds)
            .map(|i| {
                let v = state.floats.get(i).copied().unwrap_or(0.0);
                scale(params.color, params.brightness * v)
            })
            .collect()
    }
}

/// Whole-strip brightness tracks `audio.energy`, captured during `tick` into
/// scratch state and read back during `render` (§4.3 audio-reactive shape).
pub struct AudioMeter;

impl Behavior for AudioMeter {
    fn key(&self) -> &'static str {
        "audio_meter"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::Exportable,
            stateful: true,
            uses: vec!["color", "brightness"],
            arduino_behavior_id: Some(5),
        }
    }
    fn reset(&self, state: &mut BehaviorState, _params: &BehaviorParams) {
        state.floats.clear();
        state.floats.push(0.0);
    }
    fn tick(&self, state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, audio: &AudioFrame) {
        state.ensure_len(1);
        state.floats[0] = audio.energy.clamp(0.0, 1.0);
    }
    fn render(&self, state: &BehaviorState, params: &BehaviorParams, _t: f32, num_leds: usize) -> Vec<Rgb> {
        let level = state.floats.first().copied().unwrap_or(0.0);
        let lit = ((level * num_leds as f32).round() as usize).min(num_leds);
        let on = scale(params.color, params.brightness);
        (0..num_leds).map(|i| if i < lit { on } else { [0.0, 0.0, 0.0] }).collect()
    }
}

/// Renders the logical pixel index as a ramp; a diagnostic aid for checking
/// layout mapping, not meant to ship to firmware. Preview-only.
pub struct MappingDiagnostics;

impl Behavior for MappingDiagnostics {
    fn key(&self) -> &'static str {
        "mapping_diagnostics"
    }
    fn meta(&self) -> BehaviorMeta {
        BehaviorMeta {
            supports: Supports::Both,
            exportable: Exportable::PreviewOnly,
            stateful: false,
            uses: vec![],
            arduino_behavior_id: None,
        }
    }
    fn reset(&self, _state: &mut BehaviorState, _params: &BehaviorParams) {}
    fn tick(&self, _state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, _audio: &AudioFrame) {}
    fn render(&self, _state: &BehaviorState, _params: &BehaviorParams, _t: f32, num_leds: usize) -> Vec<Rgb> {
        let n = num_leds.max(1) as f32;
        (0..num_leds).map(|i| [0.0, (i as f32 / n) * 255.0, 255.0 - (i as f32 / n) * 255.0]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_layout_does_not_panic() {
        let params = BehaviorParams::default();
        let state = BehaviorState::new();
        for b in [&Solid as &dyn Behavior, &Strobe, &Rainbow, &Chase, &AudioMeter, &MappingDiagnostics] {
            assert_eq!(b.render(&state, &params, 0.0, 1).len(), 1);
        }
    }

    #[test]
    fn sparkle_decays_and_never_touches_a_global_rng() {
        let mut state = BehaviorState::new();
        let params = BehaviorParams { seed: 42, density: 1.0, ..Default::default() };
        state.ensure_len(8);
        Sparkle.reset(&mut state, &params);
        let audio = AudioFrame::default();
        for _ in 0..120 {
            Sparkle.tick(&mut state, &params, 1.0 / 60.0, 0.0, &audio);
        }
        assert!(state.floats.iter().any(|v| *v > 0.0));

        // replaying from the same seed reproduces the same trajectory
        let mut replay = BehaviorState::new();
        replay.ensure_len(8);
        Sparkle.reset(&mut replay, &params);
        for _ in 0..120 {
            Sparkle.tick(&mut replay, &params, 1.0 / 60.0, 0.0, &audio);
        }
        assert_eq!(state.floats, replay.floats);
    }

    #[test]
    fn chase_sweep_scales_with_strip_length() {
        let params = BehaviorParams { speed: 1.0, width: 0.25, direction: 1.0, color: [0.0, 0.0, 255.0], ..Default::default() };
        let state = BehaviorState::new();
        let peak_at = |t: f32| {
            let out = Chase.render(&state, &params, t, 8);
            out.iter().enumerate().max_by(|a, b| a.1[2].total_cmp(&b.1[2])).map(|(i, _)| i).unwrap()
        };
        assert_eq!(peak_at(0.25), 2);
        assert_eq!(peak_at(0.5), 4);
    }

    #[test]
    fn audio_meter_lights_leds_proportional_to_energy() {
        let mut state = BehaviorState::new();
        let params = BehaviorParams::default();
        let audio = AudioFrame { energy: 0.5, ..Default::default() };
        AudioMeter.reset(&mut state, &params);
        AudioMeter.tick(&mut state, &params, 1.0 / 60.0, 0.0, &audio);
        let out = AudioMeter.render(&state, &params, 0.0, 10);
        let lit = out.iter().filter(|c| c[0] > 0.0 || c[1] > 0.0 || c[2] > 0.0).count();
        assert_eq!(lit, 5);
    }
}
