//! Runtime overrides: bounded, per-tick scalar writes produced by rules and
//! consumed by the compositor/post-fx (§4.6, §4.8, §9 Open Question 2).
//!
//! Resolution policy (decided in DESIGN.md): rules evaluate in `(name, id)`
//! order (§4.6); each write's own `conflict` field governs how it combines
//! with whatever value is already staged for that `(layer_index, param)` —
//! "last writer wins with per-write policy", not a central reducer.

use std::collections::HashMap;

use modulo_schema::rule::{Conflict, LayerParam};

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    values: HashMap<(usize, LayerParam), f64>,
}

impl RuntimeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, layer_index: usize, param: LayerParam, value: f64, conflict: Conflict) {
        let key = (layer_index, param);
        match self.values.get(&key).copied() {
            None => {
                self.values.insert(key, value);
            }
            Some(existing) => {
                let resolved = match conflict {
                    Conflict::Last => value,
                    Conflict::First => existing,
                    Conflict::Max => existing.max(value),
                    Conflict::Min => existing.min(value),
                };
                self.values.insert(key, resolved);
            }
        }
    }

    pub fn get(&self, layer_index: usize, param: LayerParam) -> Option<f64> {
        self.values.get(&(layer_index, param)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins_by_default() {
        let mut o = RuntimeOverrides::new();
        o.write(0, LayerParam::Opacity, 0.2, Conflict::Last);
        o.write(0, LayerParam::Opacity, 0.8, Conflict::Last);
        assert_eq!(o.get(0, LayerParam::Opacity), Some(0.8));
    }

    #[test]
    fn first_keeps_the_original_write() {
        let mut o = RuntimeOverrides::new();
        o.write(0, LayerParam::Opacity, 0.2, Conflict::Last);
        o.write(0, LayerParam::Opacity, 0.8, Conflict::First);
        assert_eq!(o.get(0, LayerParam::Opacity), Some(0.2));
    }

    #[test]
    fn max_and_min_combine_with_existing() {
        let mut o = RuntimeOverrides::new();
        o.write(0, LayerParam::Opacity, 0.2, Conflict::Last);
        o.write(0, LayerParam::Opacity, 0.8, Conflict::Max);
        assert_eq!(o.get(0, LayerParam::Opacity), Some(0.8));
        o.write(0, LayerParam::Opacity, 0.1, Conflict::Min);
        assert_eq!(o.get(0, LayerParam::Opacity), Some(0.1));
    }
}
