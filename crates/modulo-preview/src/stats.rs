//! Per-tick render statistics exposed to the host UI (§4.9).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct LayerTiming {
    pub layer_index: usize,
    pub layer_name: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    pub substeps_run: u32,
    pub nonzero_count: usize,
    pub layer_timings: Vec<LayerTiming>,
    pub warnings: Vec<String>,
}
