//! §6 environment variable surface.

use std::env;
use std::path::PathBuf;

/// `BETA_FREEZE=1` disables mutating actions (fixture regeneration, report
/// writes that touch shared state).
pub fn beta_freeze() -> bool {
    env::var("BETA_FREEZE").map(|v| v == "1").unwrap_or(false)
}

/// Extra directories to search for target packs, platform path-separated.
pub fn export_targets_path() -> Vec<PathBuf> {
    env::var("MODULO_EXPORT_TARGETS_PATH")
        .map(|v| env::split_paths(&v).collect())
        .unwrap_or_default()
}

pub fn fqbn_map() -> Option<String> {
    env::var("MODULO_FQBN_MAP").ok()
}

pub fn artifact_dir() -> PathBuf {
    env::var("MODULO_ARTIFACT_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("out"))
}

/// JSON status fed to the mods health probe; absent means no mods loaded.
pub fn mods_load() -> Option<String> {
    env::var("MODULO_MODS_LOAD").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beta_freeze_defaults_to_false() {
        env::remove_var("BETA_FREEZE");
        assert!(!beta_freeze());
    }

    #[test]
    fn artifact_dir_defaults_to_out() {
        env::remove_var("MODULO_ARTIFACT_DIR");
        assert_eq!(artifact_dir(), PathBuf::from("out"));
    }
}
