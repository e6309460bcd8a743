//! Compositor: per-layer target-set resolution and bottom-to-top blending
//! into the output framebuffer (§4.7).

pub mod target;

pub use target::{resolve_target_set, TargetSet};

use modulo_operator::Rgb;
use modulo_schema::layer::blend;
use modulo_schema::project::Project;

/// One already-rendered, operator-chained layer: its schema entry (for
/// target-set resolution, opacity, blend mode) and its per-pixel output.
pub struct LayerFrame<'a> {
    pub layer: &'a modulo_schema::layer::Layer,
    pub pixels: &'a [Rgb],
}

/// Composite layers bottom-to-top into a `num_leds`-wide framebuffer,
/// clamped and converted to `u8` per channel (§4.7 step 4).
pub fn compose(project: &Project, num_leds: usize, layers: &[LayerFrame]) -> Vec<[u8; 3]> {
    let mut framebuffer = vec![[0.0_f32, 0.0, 0.0]; num_leds];

    for frame in layers {
        if !frame.layer.enabled {
            continue;
        }
        let target = resolve_target_set(project, frame.layer, num_leds);
        if target.is_empty() {
            continue;
        }
        let opacity = frame.layer.opacity.clamp(0.0, 1.0);
        for i in target.indices() {
            if i >= frame.pixels.len() {
                continue;
            }
            let out = framebuffer[i];
            let lp = frame.pixels[i];
            let blended = [
                blend(frame.layer.blend_mode, out[0], lp[0]),
                blend(frame.layer.blend_mode, out[1], lp[1]),
                blend(frame.layer.blend_mode, out[2], lp[2]),
            ];
            framebuffer[i] = [
                out[0] * (1.0 - opacity) + blended[0] * opacity,
                out[1] * (1.0 - opacity) + blended[1] * opacity,
                out[2] * (1.0 - opacity) + blended[2] * opacity,
            ];
        }
    }

    framebuffer
        .into_iter()
        .map(|c| [c[0].clamp(0.0, 255.0) as u8, c[1].clamp(0.0, 255.0) as u8, c[2].clamp(0.0, 255.0) as u8])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::layer::Layer;
    use std::collections::HashMap;

    fn empty_project() -> Project {
        Project {
            schema_version: 6,
            name: "t".into(),
            layout: modulo_schema::layout::Layout::Strip { count: 4, led_pin: 6 },
            layers: vec![],
            zones: HashMap::new(),
            groups: HashMap::new(),
            masks: HashMap::new(),
            signals: HashMap::new(),
            variables: Default::default(),
            rules_v6: vec![],
            ui: Default::default(),
            export: Default::default(),
        }
    }

    #[test]
    fn single_opaque_over_layer_wins() {
        let project = empty_project();
        let layer = Layer::new("l", "solid");
        let pixels = vec![[200.0, 10.0, 10.0]; 4];
        let out = compose(&project, 4, &[LayerFrame { layer: &layer, pixels: &pixels }]);
        assert_eq!(out[0], [200, 10, 10]);
    }

    #[test]
    fn disabled_layer_is_skipped() {
        let project = empty_project();
        let mut layer = Layer::new("l", "solid");
        layer.enabled = false;
        let pixels = vec![[200.0, 10.0, 10.0]; 4];
        let out = compose(&project, 4, &[LayerFrame { layer: &layer, pixels: &pixels }]);
        assert_eq!(out[0], [0, 0, 0]);
    }

    #[test]
    fn half_opacity_halves_the_contribution() {
        let project = empty_project();
        let mut layer = Layer::new("l", "solid");
        layer.opacity = 0.5;
        let pixels = vec![[200.0, 0.0, 0.0]; 4];
        let out = compose(&project, 4, &[LayerFrame { layer: &layer, pixels: &pixels }]);
        assert_eq!(out[0][0], 100);
    }

    #[test]
    fn second_layer_blends_over_the_first() {
        let project = empty_project();
        let bottom = Layer::new("bottom", "solid");
        let top = Layer::new("top", "solid");
        let bottom_px = vec![[50.0, 50.0, 50.0]; 4];
        let top_px = vec![[10.0, 20.0, 30.0]; 4];
        let out = compose(
            &project,
            4,
            &[LayerFrame { layer: &bottom, pixels: &bottom_px }, LayerFrame { layer: &top, pixels: &top_px }],
        );
        assert_eq!(out[0], [10, 20, 30]);
    }
}
