//! Post-fx: spatial bleed and temporal trail applied to the composited
//! framebuffer, gated by a platform-specific LED-count ceiling (§4.8).

pub mod bleed;
pub mod platform;
pub mod trail;

pub use platform::Platform;

use modulo_operator::Rgb;
use modulo_rules::RuntimeOverrides;
use modulo_schema::layout::Layout;
use modulo_schema::project::Project;
use modulo_schema::rule::LayerParam;

#[derive(Debug, Clone, Copy)]
pub struct PostfxParams {
    pub bleed_amount: f32,
    pub bleed_radius: u8,
    pub trail_amount: f32,
}

/// Resolve effective post-fx parameters from the project's base config,
/// overridden by any staged runtime writes. Post-fx has no per-layer
/// identity of its own; by convention its overrides are staged against
/// layer index 0 (see DESIGN.md).
pub fn resolve_params(project: &Project, overrides: Option<&RuntimeOverrides>) -> PostfxParams {
    let base = &project.export.postfx;
    let mut params = PostfxParams { bleed_amount: base.bleed_amount, bleed_radius: base.bleed_radius, trail_amount: base.trail_amount };
    if let Some(overrides) = overrides {
        if let Some(v) = overrides.get(0, LayerParam::PostfxBleed) {
            params.bleed_amount = v as f32;
        }
        if let Some(v) = overrides.get(0, LayerParam::PostfxBleedRadius) {
            params.bleed_radius = v.round().clamp(1.0, 2.0) as u8;
        }
        if let Some(v) = overrides.get(0, LayerParam::PostfxTrail) {
            params.trail_amount = v as f32;
        }
    }
    params
}

/// Apply bleed then trail to `current`, given `prev`'s already-postfx'd
/// frame. Skipped outright (returns `current` unchanged) above the
/// platform's LED-count ceiling.
pub fn apply(layout: &Layout, platform: Platform, params: PostfxParams, prev: &[Rgb], current: &[Rgb]) -> Vec<Rgb> {
    if !platform.postfx_allowed(current.len()) {
        return current.to_vec();
    }
    let bled = match layout {
        Layout::Strip { .. } => bleed::bleed_strip(current, params.bleed_amount, params.bleed_radius),
        Layout::Cells { .. } => bleed::bleed_cells(current, layout, params.bleed_amount, params.bleed_radius),
    };
    trail::trail(prev, &bled, params.trail_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::project::PostfxConfig;

    fn strip_layout() -> Layout {
        Layout::Strip { count: 4, led_pin: 6 }
    }

    #[test]
    fn disabled_above_avr_cap_returns_current_unchanged() {
        let current = vec![[10.0, 10.0, 10.0]; 200];
        let prev = vec![[0.0, 0.0, 0.0]; 200];
        let params = PostfxParams { bleed_amount: 1.0, bleed_radius: 1, trail_amount: 1.0 };
        let out = apply(&Layout::Strip { count: 200, led_pin: 6 }, Platform::Avr, params, &prev, &current);
        assert_eq!(out, current);
    }

    #[test]
    fn zero_bleed_zero_trail_is_identity() {
        let current = vec![[10.0, 20.0, 30.0], [40.0, 50.0, 60.0]];
        let prev = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let params = PostfxParams { bleed_amount: 0.0, bleed_radius: 1, trail_amount: 0.0 };
        let out = apply(&strip_layout(), Platform::Preview, params, &prev, &current);
        assert_eq!(out, current);
    }

    #[test]
    fn runtime_override_wins_over_base_config() {
        let mut project = Project {
            schema_version: 6,
            name: "t".into(),
            layout: strip_layout(),
            layers: vec![],
            zones: Default::default(),
            groups: Default::default(),
            masks: Default::default(),
            signals: Default::default(),
            variables: Default::default(),
            rules_v6: vec![],
            ui: Default::default(),
            export: Default::default(),
        };
        project.export.postfx = PostfxConfig { bleed_amount: 0.2, bleed_radius: 1, trail_amount: 0.1 };
        let mut overrides = RuntimeOverrides::new();
        overrides.write(0, LayerParam::PostfxTrail, 0.9, modulo_schema::rule::Conflict::Last);
        let params = resolve_params(&project, Some(&overrides));
        assert_eq!(params.trail_amount, 0.9);
        assert_eq!(params.bleed_amount, 0.2);
    }
}
