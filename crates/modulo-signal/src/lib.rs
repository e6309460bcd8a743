//! Signal bus: a read-view rebuilt once per tick from audio, clock, and user
//! variable inputs, then extended by ordered signal providers (§4.2).

mod providers;

pub use providers::{ProviderContext, ProviderError, SignalProvider};

use std::collections::HashMap;

use modulo_schema::project::Variables;

/// Seven analyzer bands, stereo + mono, per §3 "Signal Bus (runtime)".
#[derive(Debug, Clone, Default)]
pub struct AudioFrame {
    pub energy: f32,
    pub mono: [f32; 7],
    pub left: [f32; 7],
    pub right: [f32; 7],
    pub beat: f32,
    pub kick: f32,
    pub snare: f32,
    pub onset: f32,
    pub sec_change: f32,
    pub bpm: f32,
    pub bpm_conf: f32,
    pub sec_id: f32,
    pub tr_left: [f32; 7],
    pub tr_right: [f32; 7],
    pub pk_left: [f32; 7],
    pub pk_right: [f32; 7],
}

/// The flat, case-sensitive namespace of scalar signals for one tick.
#[derive(Debug, Clone, Default)]
pub struct SignalBus {
    values: HashMap<String, f32>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f32) {
        self.values.insert(key.into(), value);
    }

    /// Unknown keys resolve to 0.0 (fail-closed, §4.2).
    pub fn get(&self, key: &str) -> f32 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

fn ingest_audio(bus: &mut SignalBus, audio: &AudioFrame) {
    bus.set("audio.energy", audio.energy);
    for i in 0..7 {
        bus.set(format!("audio.mono{i}"), audio.mono[i]);
        bus.set(format!("audio.L{i}"), audio.left[i]);
        bus.set(format!("audio.R{i}"), audio.right[i]);
        bus.set(format!("audio.tr_L{i}"), audio.tr_left[i]);
        bus.set(format!("audio.tr_R{i}"), audio.tr_right[i]);
        bus.set(format!("audio.pk_L{i}"), audio.pk_left[i]);
        bus.set(format!("audio.pk_R{i}"), audio.pk_right[i]);
    }
    bus.set("audio.beat", audio.beat);
    bus.set("audio.kick", audio.kick);
    bus.set("audio.snare", audio.snare);
    bus.set("audio.onset", audio.onset);
    bus.set("audio.sec_change", audio.sec_change);
    bus.set("audio.bpm", audio.bpm);
    bus.set("audio.bpm_conf", audio.bpm_conf);
    bus.set("audio.sec_id", audio.sec_id);
}

fn ingest_vars(bus: &mut SignalBus, vars: &Variables) {
    for (name, v) in &vars.number {
        bus.set(format!("vars.number.{name}"), *v);
    }
    for (name, v) in &vars.toggle {
        bus.set(format!("vars.toggle.{name}"), if *v { 1.0 } else { 0.0 });
    }
}

/// Rebuild the signal bus for one tick: ingest audio/clock/vars, then run
/// registered providers in name order. A provider's failure is logged and
/// never propagates (§4.2, §7 "never crash the UI").
pub fn build_bus(
    audio: &AudioFrame,
    vars: &Variables,
    minute_changed: bool,
    providers: &[Box<dyn SignalProvider>],
) -> SignalBus {
    let mut bus = SignalBus::new();
    ingest_audio(&mut bus, audio);
    ingest_vars(&mut bus, vars);
    bus.set("clock.minute_changed", if minute_changed { 1.0 } else { 0.0 });

    let mut ordered: Vec<&Box<dyn SignalProvider>> = providers.iter().collect();
    ordered.sort_by_key(|p| p.name().to_string());

    let ctx = ProviderContext { bus: &bus };
    let mut updates = Vec::new();
    for provider in ordered {
        match provider.provide(&ctx) {
            Ok(kv) => updates.push(kv),
            Err(e) => log::warn!("signal provider '{}' failed: {e}", provider.name()),
        }
    }
    for kv in updates {
        for (k, v) in kv {
            bus.values.insert(k, v);
        }
    }
    bus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_signal_resolves_to_zero() {
        let bus = SignalBus::new();
        assert_eq!(bus.get("nope"), 0.0);
    }

    #[test]
    fn audio_bands_are_addressable() {
        let mut audio = AudioFrame::default();
        audio.mono[3] = 0.42;
        let vars = Variables::default();
        let bus = build_bus(&audio, &vars, false, &[]);
        assert_eq!(bus.get("audio.mono3"), 0.42);
    }

    #[test]
    fn case_sensitive_lookup() {
        let mut bus = SignalBus::new();
        bus.set("Audio.Energy", 1.0);
        assert_eq!(bus.get("audio.energy"), 0.0);
    }
}
