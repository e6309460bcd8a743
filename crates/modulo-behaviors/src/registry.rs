//! Behavior trait, metadata, and the two-layer registry (§4.3): a fixed
//! catalog plus a plugin layer that must supply both preview and Arduino
//! emission ("if it previews, it must export").

use std::collections::HashMap;
use std::sync::Arc;

use modulo_operator::Rgb;
use modulo_signal::AudioFrame;

use crate::error::{BehaviorError, BehaviorResult};
use crate::params::BehaviorParams;
use crate::state::BehaviorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supports {
    Strip,
    Cells,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exportable {
    Exportable,
    PreviewOnly,
    Blocked,
}

#[derive(Debug, Clone)]
pub struct BehaviorMeta {
    pub supports: Supports,
    pub exportable: Exportable,
    pub stateful: bool,
    pub uses: Vec<&'static str>,
    pub arduino_behavior_id: Option<u8>,
}

/// A catalog entry. Implementors hold no per-layer state of their own —
/// everything persistent goes through the `BehaviorState` passed in.
pub trait Behavior: Send + Sync {
    fn key(&self) -> &'static str;
    fn meta(&self) -> BehaviorMeta;
    fn reset(&self, state: &mut BehaviorState, params: &BehaviorParams);
    fn tick(&self, state: &mut BehaviorState, params: &BehaviorParams, dt: f32, t: f32, audio: &AudioFrame);
    fn render(&self, state: &BehaviorState, params: &BehaviorParams, t: f32, num_leds: usize) -> Vec<Rgb>;
}

/// Capability a plugin behavior must supply alongside `Behavior` in order to
/// be registered: lowering to the firmware's fixed numeric dispatch table.
pub trait ArduinoEmit: Send + Sync {
    fn arduino_behavior_id(&self) -> u8;
}

#[derive(Default)]
pub struct BehaviorRegistry {
    entries: HashMap<&'static str, Arc<dyn Behavior>>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixed-catalog entry. Quarantined (blank-in-audit) effects
    /// are simply never passed here (§4.3).
    pub fn register_builtin(&mut self, behavior: Arc<dyn Behavior>) -> BehaviorResult<()> {
        let key = behavior.key();
        if self.entries.contains_key(key) {
            return Err(BehaviorError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key, behavior);
        Ok(())
    }

    /// Register a plugin behavior. Must be fully exportable: the policy is
    /// "if it previews, it must export" — plugins don't get a preview-only
    /// or blocked exemption the fixed catalog does.
    pub fn register_plugin(
        &mut self,
        behavior: Arc<dyn Behavior>,
        arduino_emit: Arc<dyn ArduinoEmit>,
    ) -> BehaviorResult<()> {
        let key = behavior.key();
        if behavior.meta().exportable != Exportable::Exportable {
            return Err(BehaviorError::PluginMustExport(key.to_string()));
        }
        let _ = arduino_emit.arduino_behavior_id();
        if self.entries.contains_key(key) {
            return Err(BehaviorError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key, behavior);
        Ok(())
    }

    pub fn get(&self, key: &str) -> BehaviorResult<Arc<dyn Behavior>> {
        self.entries.get(key).cloned().ok_or_else(|| BehaviorError::UnknownKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        let mut k: Vec<&'static str> = self.entries.keys().copied().collect();
        k.sort_unstable();
        k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub;
    impl Behavior for Stub {
        fn key(&self) -> &'static str {
            "stub"
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
            vec![[0.0, 0.0, 0.0]; num_leds]
        }
    }

    struct StubEmit;
    impl ArduinoEmit for StubEmit {
        fn arduino_behavior_id(&self) -> u8 {
            200
        }
    }

    #[test]
    fn preview_only_plugin_is_rejected() {
        let mut reg = BehaviorRegistry::new();
        let err = reg.register_plugin(Arc::new(Stub), Arc::new(StubEmit)).unwrap_err();
        assert_eq!(err, BehaviorError::PluginMustExport("stub".to_string()));
    }

    #[test]
    fn duplicate_key_rejected() {
        struct Exportable1;
        impl Behavior for Exportable1 {
            fn key(&self) -> &'static str {
                "dup"
            }
            fn meta(&self) -> BehaviorMeta {
                BehaviorMeta {
                    supports: Supports::Both,
                    exportable: Exportable::Exportable,
                    stateful: false,
                    uses: vec![],
                    arduino_behavior_id: Some(1),
                }
            }
            fn reset(&self, _state: &mut BehaviorState, _params: &BehaviorParams) {}
            fn tick(&self, _state: &mut BehaviorState, _params: &BehaviorParams, _dt: f32, _t: f32, _audio: &AudioFrame) {}
            fn render(&self, _state: &BehaviorState, _params: &BehaviorParams, _t: f32, num_leds: usize) -> Vec<Rgb> {
                vec![[0.0, 0.0, 0.0]; num_leds]
            }
        }
        let mut reg = BehaviorRegistry::new();
        reg.register_builtin(Arc::new(Exportable1)).unwrap();
        assert!(matches!(reg.register_builtin(Arc::new(Exportable1)), Err(BehaviorError::DuplicateKey(_))));
    }
}
