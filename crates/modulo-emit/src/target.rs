//! Target packs: arch-specific contribution to the generated sketch (§4.10
//! step 7, §6 `target.json`). The registry is populated at process init and
//! is meant to be frozen before the first emit runs (§5 shared-resource
//! policy) — callers own that discipline, this type just holds the map.

use std::collections::HashMap;

use modulo_validate::TargetCapabilities;

use crate::error::{EmitError, EmitResult};
use crate::lowering::ProjectIr;

#[derive(Debug, Clone)]
pub struct Capabilities {
    pub led_backends: Vec<&'static str>,
    pub audio_backends: Vec<&'static str>,
    pub default_led_backend: &'static str,
    pub default_audio_backend: &'static str,
    pub supports_matrix: bool,
    pub supports_postfx_runtime: bool,
    pub supports_operators_runtime: bool,
    pub max_leds_hard: Option<u32>,
}

impl Capabilities {
    pub fn as_target_capabilities(&self) -> TargetCapabilities {
        TargetCapabilities {
            supports_matrix: self.supports_matrix,
            supports_operators_runtime: self.supports_operators_runtime,
            supports_postfx_runtime: self.supports_postfx_runtime,
            max_leds_hard: self.max_leds_hard,
        }
    }
}

/// The per-target code contribution: `@@LED_IMPL@@`, `@@AUDIO_IMPL@@`, and
/// (for matrix-capable packs) `@@MATRIX_IMPL@@`, plus toolchain metadata for
/// the `platformio` output mode.
pub trait TargetPack: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn capabilities(&self) -> Capabilities;
    fn led_impl(&self, ir: &ProjectIr) -> String;
    fn audio_impl(&self, ir: &ProjectIr) -> String;
    fn matrix_impl(&self, ir: &ProjectIr) -> String {
        let _ = ir;
        String::new()
    }
    /// `platform`/`board`/`framework`/`lib_deps` for `platformio.ini`.
    fn platformio_ini(&self) -> String;
}

#[derive(Default)]
pub struct TargetRegistry {
    packs: HashMap<&'static str, Box<dyn TargetPack>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pack: Box<dyn TargetPack>) {
        self.packs.insert(pack.id(), pack);
    }

    pub fn get(&self, id: &str) -> EmitResult<&dyn TargetPack> {
        self.packs.get(id).map(|b| b.as_ref()).ok_or_else(|| EmitError::UnknownTarget(id.to_string()))
    }

    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.packs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Resolution precedence for a backend choice (§4.10 "Target packs"):
/// explicit `project.export.*` -> target default -> final fallback.
pub fn resolve_led_backend(requested: Option<&str>, caps: &Capabilities) -> String {
    requested.filter(|r| caps.led_backends.contains(r)).unwrap_or(caps.default_led_backend).to_string()
}

pub fn resolve_audio_backend(requested: Option<&str>, caps: &Capabilities) -> String {
    requested.filter(|r| caps.audio_backends.contains(r)).unwrap_or(caps.default_audio_backend).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> Capabilities {
        Capabilities {
            led_backends: vec!["fastled", "neopixelbus"],
            audio_backends: vec!["msgeq7", "none"],
            default_led_backend: "fastled",
            default_audio_backend: "none",
            supports_matrix: false,
            supports_postfx_runtime: true,
            supports_operators_runtime: true,
            max_leds_hard: Some(120),
        }
    }

    #[test]
    fn unrecognized_backend_falls_back_to_default() {
        assert_eq!(resolve_led_backend(Some("dotstar"), &caps()), "fastled");
    }

    #[test]
    fn recognized_backend_is_honored() {
        assert_eq!(resolve_led_backend(Some("neopixelbus"), &caps()), "neopixelbus");
    }

    #[test]
    fn unknown_target_id_is_an_error() {
        let reg = TargetRegistry::new();
        assert!(matches!(reg.get("nope"), Err(EmitError::UnknownTarget(_))));
    }
}
