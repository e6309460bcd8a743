//! Representative projects used by `golden-exports` and `compile-sanity`.
//! Small and fixed on purpose: these exist to catch emitter regressions,
//! not to cover every behavior.

use std::collections::HashMap;

use modulo_schema::layer::{Layer, ParamValue};
use modulo_schema::layout::{Layout, Origin, Rotate};
use modulo_schema::project::{ExportConfig, Project};

pub fn arduino_solid_strip() -> Project {
    let mut layer = Layer::new("base", "solid");
    layer.params.insert("color".into(), ParamValue::Tuple(vec![255.0, 80.0, 0.0]));
    Project {
        schema_version: 6,
        name: "fixture-arduino-solid".into(),
        layout: Layout::Strip { count: 60, led_pin: 6 },
        layers: vec![layer],
        zones: HashMap::new(),
        groups: HashMap::new(),
        masks: HashMap::new(),
        signals: HashMap::new(),
        variables: Default::default(),
        rules_v6: vec![],
        ui: Default::default(),
        export: ExportConfig { target_id: "arduino_uno_fastled_msgeq7".into(), ..Default::default() },
    }
}

pub fn arduino_audio_meter() -> Project {
    let mut layer = Layer::new("meter", "audio_meter");
    layer.params.insert("color".into(), ParamValue::Tuple(vec![0.0, 200.0, 255.0]));
    let mut export = ExportConfig { target_id: "arduino_uno_fastled_msgeq7".into(), ..Default::default() };
    export.audio_backend = Some("msgeq7".into());
    Project {
        schema_version: 6,
        name: "fixture-arduino-audio-meter".into(),
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

pub fn esp32_matrix_chase() -> Project {
    let mut layer = Layer::new("chase", "chase");
    layer.params.insert("color".into(), ParamValue::Tuple(vec![0.0, 255.0, 120.0]));
    Project {
        schema_version: 6,
        name: "fixture-esp32-chase".into(),
        layout: Layout::Cells { width: 16, height: 16, serpentine: true, origin: Origin::Tl, rotate: Rotate::R0, flip_x: false, flip_y: false },
        layers: vec![layer],
        zones: HashMap::new(),
        groups: HashMap::new(),
        masks: HashMap::new(),
        signals: HashMap::new(),
        variables: Default::default(),
        rules_v6: vec![],
        ui: Default::default(),
        export: ExportConfig { target_id: "esp32_hub75_i2sdma_msgeq7".into(), ..Default::default() },
    }
}

pub fn all() -> Vec<(&'static str, Project)> {
    vec![
        ("arduino_solid_strip", arduino_solid_strip()),
        ("arduino_audio_meter", arduino_audio_meter()),
        ("esp32_matrix_chase", esp32_matrix_chase()),
    ]
}
