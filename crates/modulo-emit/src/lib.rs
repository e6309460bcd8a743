//! Firmware emitter (§4.10): lowers a validated project to a single C++
//! sketch via token substitution, or wraps it into a PlatformIO project.
//! Never leaves a partially-written or corrupt artifact behind.

pub mod codegen;
pub mod error;
pub mod lowering;
pub mod signal_expr;
pub mod target;
pub mod targets;
pub mod template;

pub use error::{EmitError, EmitResult};
pub use lowering::ProjectIr;
pub use target::{Capabilities, TargetPack, TargetRegistry};

use std::fs;
use std::path::{Path, PathBuf};

use modulo_behaviors::BehaviorRegistry;
use modulo_schema::project::{OutputMode, Project};
use modulo_validate::EraId;

#[derive(Debug)]
pub struct EmitOutcome {
    pub written_path: PathBuf,
    pub report: String,
}

/// Run every §4.11 check, lower the project, render the sketch, validate the
/// rendered text, then write it out. `era` is optional: pass it when the
/// project was authored against a fixed era template.
pub fn emit_project(
    project: &Project,
    registry: &BehaviorRegistry,
    targets: &TargetRegistry,
    era: Option<EraId>,
    out_path: &Path,
) -> EmitResult<EmitOutcome> {
    let target_id = project.export.target_id.as_str();
    let pack = targets.get(target_id)?;
    let caps = pack.capabilities();

    modulo_validate::validate_for_export(project, registry, era, Some(&caps.as_target_capabilities()))?;

    let audio_backend = target::resolve_audio_backend(project.export.audio_backend.as_deref(), &caps);
    if audio_backend == "msgeq7" {
        let aud = &project.export.audio_hw;
        let _ = aud.use_spectrum_shield;
    }

    let ir = lowering::lower(project, registry)?;
    let use_spectrum_shield = audio_backend == "msgeq7";
    let sketch = codegen::generate_sketch(&ir, pack, use_spectrum_shield);

    let problems = template::validate_rendered(&sketch, codegen::required_defs());
    if !problems.is_empty() {
        return Err(EmitError::ArtifactValidation(problems.join("\n- ")));
    }

    let written_path = match project.export.output_mode {
        OutputMode::Arduino => {
            write_and_verify(out_path, &sketch)?;
            out_path.to_path_buf()
        }
        OutputMode::Platformio => {
            let dir = out_path.with_extension("");
            fs::create_dir_all(dir.join("src"))?;
            let main_cpp = dir.join("src").join("main.cpp");
            write_and_verify(&main_cpp, &sketch)?;
            let ini_path = dir.join("platformio.ini");
            fs::write(&ini_path, pack.platformio_ini())?;
            dir
        }
    };

    log::info!("exported '{}' for target '{}' -> {}", project.name, target_id, written_path.display());
    Ok(EmitOutcome { written_path, report: format!("wrote {} layers, {} rules", ir.layers.len(), ir.rules.len()) })
}

/// Write the artifact, then re-read and re-validate it; a failure here
/// deletes the partial file so a bad export never looks like a good one.
fn write_and_verify(path: &Path, text: &str) -> EmitResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    let problems = template::validate_rendered(text, codegen::required_defs());
    if !problems.is_empty() {
        let _ = fs::remove_file(path);
        return Err(EmitError::ArtifactValidation(problems.join("\n- ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_behaviors::catalog::register_builtins;
    use modulo_schema::layer::{Layer, ParamValue};
    use modulo_schema::layout::Layout;
    use modulo_schema::project::ExportConfig;
    use std::collections::HashMap;

    fn registry() -> BehaviorRegistry {
        let mut reg = BehaviorRegistry::new();
        register_builtins(&mut reg).unwrap();
        reg
    }

    fn targets() -> TargetRegistry {
        let mut t = TargetRegistry::new();
        targets::register_builtin_targets(&mut t);
        t
    }

    fn project() -> Project {
        let mut layer = Layer::new("l", "solid");
        layer.params.insert("color".into(), ParamValue::Tuple(vec![255.0, 0.0, 0.0]));
        let export = ExportConfig { target_id: "arduino_uno_fastled_msgeq7".into(), ..Default::default() };
        Project {
            schema_version: 6,
            name: "demo".into(),
            layout: Layout::Strip { count: 30, led_pin: 6 },
            layers: vec![layer],
            zones: HashMap::new(),
            groups: HashMap::new(),
            masks: HashMap::new(),
            signals: HashMap::new(),
            variables: Default::default(),
            rules_v6: vec![],
            ui: Default::default(),
            export,
        }
    }

    #[test]
    fn emits_an_ino_with_no_unreplaced_tokens() {
        let dir = std::env::temp_dir().join(format!("modulo_emit_test_{}", std::process::id()));
        let out = dir.join("sketch.ino");
        let outcome = emit_project(&project(), &registry(), &targets(), None, &out).unwrap();
        let text = fs::read_to_string(&outcome.written_path).unwrap();
        assert!(text.contains("MODULO_EXPORT"));
        assert!(!text.contains("@@"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_target_id_is_rejected() {
        let mut p = project();
        p.export.target_id = "nonexistent".into();
        let dir = std::env::temp_dir().join(format!("modulo_emit_test2_{}", std::process::id()));
        let out = dir.join("sketch.ino");
        assert!(matches!(emit_project(&p, &registry(), &targets(), None, &out), Err(EmitError::UnknownTarget(_))));
    }

    #[test]
    fn era_gate_rejects_second_layer_under_classic() {
        let mut p = project();
        p.layers.push(Layer::new("l2", "solid"));
        let dir = std::env::temp_dir().join(format!("modulo_emit_test3_{}", std::process::id()));
        let out = dir.join("sketch.ino");
        let err = emit_project(&p, &registry(), &targets(), Some(EraId::Classic), &out).unwrap_err();
        assert!(matches!(err, EmitError::Validate(modulo_validate::ValidateError::EraMaxLayers { .. })));
    }

    #[test]
    fn exceeding_target_led_cap_is_rejected() {
        let mut p = project();
        p.layout = Layout::Strip { count: 500, led_pin: 6 };
        let dir = std::env::temp_dir().join(format!("modulo_emit_test4_{}", std::process::id()));
        let out = dir.join("sketch.ino");
        assert!(emit_project(&p, &registry(), &targets(), None, &out).is_err());
    }
}
