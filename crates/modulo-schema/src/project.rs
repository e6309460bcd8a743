//! The project value (§3). Immutable once loaded: "edits" produce a new
//! `Project`, mirroring the teacher's snapshot-based `ProjectMeta` (§3
//! Lifecycle, §5 shared-resource policy).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaResult;
use crate::layer::Layer;
use crate::layout::Layout;
use crate::rule::Rule;

pub const SCHEMA_VERSION: u32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Zone {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mask {
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalSpec {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Variables {
    #[serde(default)]
    pub number: HashMap<String, f32>,
    #[serde(default)]
    pub toggle: HashMap<String, bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ui {
    #[serde(default)]
    pub target_mask: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    Arduino,
    Platformio,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Arduino
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HwConfig {
    #[serde(default)]
    pub data_pin: Option<u8>,
    #[serde(default)]
    pub led_type: Option<String>,
    #[serde(default)]
    pub color_order: Option<String>,
    #[serde(default)]
    pub brightness: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioHwConfig {
    #[serde(default)]
    pub use_spectrum_shield: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hub75Config {
    #[serde(default)]
    pub panel_res_x: u32,
    #[serde(default)]
    pub panel_res_y: u32,
    #[serde(default)]
    pub chain: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostfxConfig {
    #[serde(default)]
    pub bleed_amount: f32,
    #[serde(default = "default_radius")]
    pub bleed_radius: u8,
    #[serde(default)]
    pub trail_amount: f32,
}

fn default_radius() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub target_id: String,
    #[serde(default)]
    pub led_backend: Option<String>,
    #[serde(default)]
    pub audio_backend: Option<String>,
    #[serde(default)]
    pub hw: HwConfig,
    #[serde(default)]
    pub audio_hw: AudioHwConfig,
    #[serde(default)]
    pub hub75: Hub75Config,
    #[serde(default)]
    pub postfx: PostfxConfig,
    #[serde(default)]
    pub output_mode: OutputMode,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            target_id: String::new(),
            led_backend: None,
            audio_backend: None,
            hw: HwConfig::default(),
            audio_hw: AudioHwConfig::default(),
            hub75: Hub75Config::default(),
            postfx: PostfxConfig::default(),
            output_mode: OutputMode::Arduino,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub schema_version: u32,
    pub name: String,
    pub layout: Layout,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub zones: HashMap<String, Zone>,
    #[serde(default)]
    pub groups: HashMap<String, Group>,
    #[serde(default)]
    pub masks: HashMap<String, Mask>,
    #[serde(default)]
    pub signals: HashMap<String, SignalSpec>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub rules_v6: Vec<Rule>,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Project {
    pub fn num_leds(&self) -> u32 {
        self.layout.num_leds()
    }

    pub fn validate(&self) -> SchemaResult<()> {
        self.layout.validate()?;
        if let Layout::Cells { width, height, .. } = &self.layout {
            let count = width * height;
            if count != self.layout.num_leds() {
                return Err(crate::error::SchemaError::InvalidLayout(
                    "cells count must equal width*height".into(),
                ));
            }
        }
        Ok(())
    }
}
