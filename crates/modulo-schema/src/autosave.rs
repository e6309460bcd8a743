//! Fixed-interval autosave: hash the sanitized project and write only on
//! change, keeping a single backup copy (§6 persisted state layout, §9
//! "Background/coroutine-ish autosave"). Expressed as a plain function a
//! host calls from its own timer — no task/thread spawned here.

use std::fs;
use std::path::Path;

use crate::error::SchemaResult;
use crate::project::Project;

fn hash_str(s: &str) -> u64 {
    // FNV-1a, good enough to detect content changes without a crypto dep.
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Write `project` to `<root>/out/autosave_project.json` iff its sanitized
/// JSON content differs from what's already on disk; the previous content
/// is preserved as `autosave_project.prev.json`. Returns `true` if a write
/// happened.
pub fn autosave(root: &Path, project: &Project) -> SchemaResult<bool> {
    let out_dir = root.join("out");
    fs::create_dir_all(&out_dir)?;
    let path = out_dir.join("autosave_project.json");
    let prev_path = out_dir.join("autosave_project.prev.json");

    let value = serde_json::to_value(project)?;
    let (sanitized, _issues) = crate::sanitize::sanitize(&value);
    let serialized = serde_json::to_string_pretty(&sanitized)?;

    if let Ok(existing) = fs::read_to_string(&path) {
        if hash_str(&existing) == hash_str(&serialized) {
            return Ok(false);
        }
        fs::write(&prev_path, existing)?;
    }
    fs::write(&path, serialized)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;
    use crate::project::ExportConfig;
    use std::collections::HashMap;

    fn sample_project() -> Project {
        Project {
            schema_version: crate::project::SCHEMA_VERSION,
            name: "test".into(),
            layout: Layout::Strip { count: 8, led_pin: 6 },
            layers: vec![],
            zones: HashMap::new(),
            groups: HashMap::new(),
            masks: HashMap::new(),
            signals: HashMap::new(),
            variables: Default::default(),
            rules_v6: vec![],
            ui: Default::default(),
            export: ExportConfig::default(),
        }
    }

    #[test]
    fn second_identical_autosave_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let p = sample_project();
        assert!(autosave(dir.path(), &p).unwrap());
        assert!(!autosave(dir.path(), &p).unwrap());
    }

    #[test]
    fn changed_project_writes_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = sample_project();
        autosave(dir.path(), &p).unwrap();
        p.name = "renamed".into();
        assert!(autosave(dir.path(), &p).unwrap());
        assert!(dir.path().join("out/autosave_project.prev.json").exists());
    }
}
