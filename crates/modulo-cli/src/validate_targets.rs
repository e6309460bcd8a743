//! `validate-target-packs` (§6): schema-check every registered target pack.
//! The original walked `export/targets/**/target.json`; here packs are
//! compiled `TargetPack` impls, so "schema-check" means asserting the
//! structural invariants a `target.json` manifest would have enforced
//! (non-empty id/name, at least one backend, a sane default).

use anyhow::{bail, Result};

use modulo_emit::targets::register_builtin_targets;
use modulo_emit::TargetRegistry;

pub fn run() -> Result<Vec<String>> {
    let mut targets = TargetRegistry::new();
    register_builtin_targets(&mut targets);

    let mut problems = Vec::new();
    for id in targets.ids() {
        let pack = targets.get(id)?;
        let caps = pack.capabilities();

        if pack.id().is_empty() {
            problems.push("pack has an empty id".to_string());
        }
        if pack.name().is_empty() {
            problems.push(format!("{}: empty name", pack.id()));
        }
        if caps.led_backends.is_empty() {
            problems.push(format!("{}: no led_backends declared", pack.id()));
        }
        if !caps.led_backends.contains(&caps.default_led_backend) {
            problems.push(format!("{}: default_led_backend '{}' not in led_backends", pack.id(), caps.default_led_backend));
        }
        if caps.audio_backends.is_empty() {
            problems.push(format!("{}: no audio_backends declared", pack.id()));
        }
        if !caps.audio_backends.contains(&caps.default_audio_backend) {
            problems.push(format!("{}: default_audio_backend '{}' not in audio_backends", pack.id(), caps.default_audio_backend));
        }
        if let Some(max) = caps.max_leds_hard {
            if max == 0 {
                problems.push(format!("{}: max_leds_hard is zero", pack.id()));
            }
        }
    }

    if problems.is_empty() {
        Ok(targets.ids().into_iter().map(String::from).collect())
    } else {
        bail!("{} target pack problem(s):\n- {}", problems.len(), problems.join("\n- "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_packs_pass_validation() {
        let ids = run().unwrap();
        assert!(ids.contains(&"arduino_uno_fastled_msgeq7".to_string()));
        assert!(ids.contains(&"esp32_hub75_i2sdma_msgeq7".to_string()));
    }
}
