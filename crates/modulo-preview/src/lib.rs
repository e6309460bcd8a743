//! Fixed-timestep preview evaluator (§4.9): an accumulator quantizes real
//! elapsed time into `dt`-sized substeps, each running the full pipeline —
//! signal bus, rules, behaviors, compositor, post-fx — in that order.

pub mod error;
pub mod overrides_apply;
pub mod params;
pub mod stats;

pub use error::{PreviewError, PreviewResult};
pub use stats::{LayerTiming, RenderStats};

use std::collections::HashMap;
use std::time::Instant;

use modulo_behaviors::{BehaviorRegistry, BehaviorState};
use modulo_compositor::{compose, LayerFrame};
use modulo_modulotor::ModulotorState;
use modulo_operator::{apply_chain, Rgb};
use modulo_postfx::{self as postfx, Platform};
use modulo_rules::{eval_tick, validate_rules, RuleState, VarStore};
use modulo_schema::project::{Project, Variables};
use modulo_signal::{build_bus, AudioFrame, SignalProvider};

/// Scheduling knobs; defaults match §4.9 (60Hz, max 4 substeps per frame).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub dt: f32,
    pub max_substeps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { dt: 1.0 / 60.0, max_substeps: 4 }
    }
}

struct LayerRuntime {
    state: BehaviorState,
    modulotor_states: Vec<ModulotorState>,
}

/// Owns one project's evaluation: its variable store, per-layer scratch
/// state, and the last composited framebuffer. Evaluators share no state
/// with each other, so multiple can run concurrently (§4.9).
pub struct Evaluator {
    project: Project,
    registry: BehaviorRegistry,
    platform: Platform,
    config: SchedulerConfig,
    num_leds: usize,
    accumulator: f32,
    t: f32,
    vars: VarStore,
    rule_states: HashMap<String, RuleState>,
    layer_runtime: Vec<LayerRuntime>,
    prev_postfx_frame: Vec<Rgb>,
    framebuffer: Vec<[u8; 3]>,
}

impl Evaluator {
    pub fn new(project: Project, registry: BehaviorRegistry, platform: Platform) -> PreviewResult<Self> {
        Self::with_config(project, registry, platform, SchedulerConfig::default())
    }

    pub fn with_config(
        project: Project,
        registry: BehaviorRegistry,
        platform: Platform,
        config: SchedulerConfig,
    ) -> PreviewResult<Self> {
        validate_rules(&project)?;
        let num_leds = project.num_leds() as usize;
        let vars = VarStore::from_project(&project.variables);
        let layer_runtime = project
            .layers
            .iter()
            .map(|layer| LayerRuntime {
                state: BehaviorState::new(),
                modulotor_states: vec![ModulotorState::default(); layer.exported_modulotors().len()],
            })
            .collect();
        Ok(Self {
            project,
            registry,
            platform,
            config,
            num_leds,
            accumulator: 0.0,
            t: 0.0,
            vars,
            rule_states: HashMap::new(),
            layer_runtime,
            prev_postfx_frame: vec![[0.0, 0.0, 0.0]; num_leds],
            framebuffer: vec![[0, 0, 0]; num_leds],
        })
    }

    pub fn framebuffer(&self) -> &[[u8; 3]] {
        &self.framebuffer
    }

    /// Feed `real_dt` seconds of wall-clock time in, running as many fixed
    /// `dt` substeps as have accumulated (capped at `max_substeps` to avoid
    /// a spiral of death under a stalled host). Leftover time carries over.
    pub fn advance(
        &mut self,
        real_dt: f32,
        audio: &AudioFrame,
        minute_changed: bool,
        providers: &[Box<dyn SignalProvider>],
    ) -> RenderStats {
        self.accumulator += real_dt.max(0.0);
        let mut stats = RenderStats::default();
        while self.accumulator >= self.config.dt && stats.substeps_run < self.config.max_substeps {
            self.substep(audio, minute_changed, providers, &mut stats);
            self.accumulator -= self.config.dt;
            self.t += self.config.dt;
            stats.substeps_run += 1;
        }
        if stats.substeps_run == self.config.max_substeps && self.accumulator >= self.config.dt {
            stats.warnings.push("accumulator exceeded max substeps; dropping backlog".into());
            self.accumulator = 0.0;
        }
        stats.nonzero_count = self.framebuffer.iter().filter(|c| **c != [0, 0, 0]).count();
        stats
    }

    fn substep(
        &mut self,
        audio: &AudioFrame,
        minute_changed: bool,
        providers: &[Box<dyn SignalProvider>],
        stats: &mut RenderStats,
    ) {
        let variables = Variables { number: self.vars.number.clone(), toggle: self.vars.toggle.clone() };
        let bus = build_bus(audio, &variables, minute_changed, providers);
        let overrides = eval_tick(&self.project.rules_v6, &mut self.rule_states, &mut self.vars, &bus);

        let mut frames: Vec<(modulo_schema::layer::Layer, Vec<Rgb>)> = Vec::with_capacity(self.project.layers.len());
        for (li, layer) in self.project.layers.iter().enumerate() {
            let started = Instant::now();
            let effective = overrides_apply::effective_layer(layer, li, &overrides);
            let runtime = &mut self.layer_runtime[li];
            let behavior = match self.registry.get(&layer.behavior) {
                Ok(b) => b,
                Err(e) => {
                    stats.warnings.push(format!("layer '{}': {e}", layer.name));
                    continue;
                }
            };
            let mut params = params::resolve(&effective, &mut runtime.modulotor_states, self.t, &bus, seed_for(li, self.t));
            overrides_apply::apply_brightness_override(&mut params, li, &overrides);
            behavior.tick(&mut runtime.state, &params, self.config.dt, self.t, audio);
            let rendered = behavior.render(&runtime.state, &params, self.t, self.num_leds);
            let ops = effective.exported_operators();
            let shaded: Vec<Rgb> = rendered.iter().map(|px| apply_chain(&ops, *px)).collect();
            stats.layer_timings.push(LayerTiming { layer_index: li, layer_name: layer.name.clone(), duration: started.elapsed() });
            frames.push((effective, shaded));
        }

        let layer_frames: Vec<LayerFrame> = frames.iter().map(|(layer, pixels)| LayerFrame { layer, pixels }).collect();
        let composed = compose(&self.project, self.num_leds, &layer_frames);
        let composed_rgb: Vec<Rgb> = composed.iter().map(|c| [c[0] as f32, c[1] as f32, c[2] as f32]).collect();

        let postfx_params = postfx::resolve_params(&self.project, Some(&overrides));
        let out = postfx::apply(&self.project.layout, self.platform, postfx_params, &self.prev_postfx_frame, &composed_rgb);
        self.prev_postfx_frame = out.clone();
        self.framebuffer = out.iter().map(|c| [c[0].clamp(0.0, 255.0) as u8, c[1].clamp(0.0, 255.0) as u8, c[2].clamp(0.0, 255.0) as u8]).collect();
    }

    /// Reset every layer's scratch state and the post-fx trail buffer,
    /// without re-validating rules or re-reading the project (§3 Lifecycle).
    pub fn reset_layer_state(&mut self) {
        for (layer, runtime) in self.project.layers.iter().zip(self.layer_runtime.iter_mut()) {
            let params = params::resolve(layer, &mut runtime.modulotor_states, self.t, &modulo_signal::SignalBus::new(), 0);
            behavior_reset(&self.registry, layer, &mut runtime.state, &params);
        }
        self.prev_postfx_frame = vec![[0.0, 0.0, 0.0]; self.num_leds];
        self.accumulator = 0.0;
        self.t = 0.0;
    }
}

fn behavior_reset(registry: &BehaviorRegistry, layer: &modulo_schema::layer::Layer, state: &mut BehaviorState, params: &modulo_behaviors::BehaviorParams) {
    if let Ok(behavior) = registry.get(&layer.behavior) {
        behavior.reset(state, params);
    }
}

/// Per-layer, per-tick RNG seed: deterministic given the layer's position
/// and the evaluator's elapsed time, never a process-global source (§4.3).
fn seed_for(layer_index: usize, t: f32) -> u64 {
    (layer_index as u64).wrapping_mul(0x9E3779B97F4A7C15) ^ t.to_bits() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_behaviors::catalog::register_builtins;
    use modulo_schema::layer::Layer;
    use modulo_schema::layout::Layout;
    use modulo_schema::project::ExportConfig;
    use std::collections::HashMap;

    fn project_with_one_solid_layer() -> Project {
        let mut layer = Layer::new("l", "solid");
        layer.params.insert("color".into(), modulo_schema::layer::ParamValue::Tuple(vec![10.0, 20.0, 30.0]));
        Project {
            schema_version: 6,
            name: "t".into(),
            layout: Layout::Strip { count: 4, led_pin: 6 },
            layers: vec![layer],
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

    fn registry() -> BehaviorRegistry {
        let mut reg = BehaviorRegistry::new();
        register_builtins(&mut reg).unwrap();
        reg
    }

    #[test]
    fn advance_runs_at_most_max_substeps() {
        let mut eval = Evaluator::new(project_with_one_solid_layer(), registry(), Platform::Preview).unwrap();
        let stats = eval.advance(10.0, &AudioFrame::default(), false, &[]);
        assert_eq!(stats.substeps_run, 4);
        assert!(!stats.warnings.is_empty());
    }

    #[test]
    fn two_runs_from_scratch_are_byte_identical() {
        let run = || {
            let mut eval = Evaluator::new(project_with_one_solid_layer(), registry(), Platform::Preview).unwrap();
            for _ in 0..5 {
                eval.advance(1.0 / 60.0, &AudioFrame::default(), false, &[]);
            }
            eval.framebuffer().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn unknown_behavior_produces_warning_not_panic() {
        let mut layer = Layer::new("l", "no-such-behavior");
        layer.name = "ghost".into();
        let project = Project {
            schema_version: 6,
            name: "t".into(),
            layout: Layout::Strip { count: 2, led_pin: 6 },
            layers: vec![layer],
            zones: HashMap::new(),
            groups: HashMap::new(),
            masks: HashMap::new(),
            signals: HashMap::new(),
            variables: Default::default(),
            rules_v6: vec![],
            ui: Default::default(),
            export: ExportConfig::default(),
        };
        let mut eval = Evaluator::new(project, registry(), Platform::Preview).unwrap();
        let stats = eval.advance(1.0 / 60.0, &AudioFrame::default(), false, &[]);
        assert!(stats.warnings.iter().any(|w| w.contains("ghost")));
    }
}
