//! `health` probes (§6): mods load status and configured target-pack search
//! directories, folded into a `health_<ts>.txt` report.

use serde_json::Value;

use crate::diagnostics::{HealthLevel, HealthLine};
use crate::env;

fn mods_probe() -> HealthLine {
    match env::mods_load() {
        None => HealthLine { level: HealthLevel::Ok, area: "mods".into(), message: "no mods configured".into() },
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) if entries.is_empty() => {
                HealthLine { level: HealthLevel::Ok, area: "mods".into(), message: "no mods loaded".into() }
            }
            Ok(Value::Array(entries)) => {
                HealthLine { level: HealthLevel::Ok, area: "mods".into(), message: format!("{} mod(s) loaded", entries.len()) }
            }
            Ok(_) => HealthLine { level: HealthLevel::Warn, area: "mods".into(), message: "MODULO_MODS_LOAD is not a JSON array".into() },
            Err(e) => HealthLine { level: HealthLevel::Error, area: "mods".into(), message: format!("MODULO_MODS_LOAD is not valid JSON: {e}") },
        },
    }
}

fn target_path_probe() -> Vec<HealthLine> {
    env::export_targets_path()
        .into_iter()
        .map(|dir| {
            if dir.is_dir() {
                HealthLine { level: HealthLevel::Ok, area: "target_packs".into(), message: format!("{} present", dir.display()) }
            } else {
                HealthLine { level: HealthLevel::Warn, area: "target_packs".into(), message: format!("{} configured but missing", dir.display()) }
            }
        })
        .collect()
}

pub fn probe() -> Vec<HealthLine> {
    let mut lines = vec![mods_probe()];
    lines.extend(target_path_probe());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env as std_env;

    #[test]
    fn absent_mods_load_is_ok() {
        std_env::remove_var("MODULO_MODS_LOAD");
        let line = mods_probe();
        assert!(matches!(line.level, HealthLevel::Ok));
    }

    #[test]
    fn malformed_mods_load_is_an_error() {
        std_env::set_var("MODULO_MODS_LOAD", "{not json");
        let line = mods_probe();
        assert!(matches!(line.level, HealthLevel::Error));
        std_env::remove_var("MODULO_MODS_LOAD");
    }
}
