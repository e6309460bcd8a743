//! Target-set resolution: `all` / `group[name]` / `zone[name]` / `mask[name]`
//! intersected with `ui.target_mask` (§4.7 step 1).

use modulo_schema::layer::{Layer, TargetKind};
use modulo_schema::project::Project;

#[derive(Debug, Clone)]
pub struct TargetSet {
    mask: Vec<bool>,
}

impl TargetSet {
    pub fn contains(&self, i: usize) -> bool {
        self.mask.get(i).copied().unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|&b| b)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask.iter().enumerate().filter(|&(_, &b)| b).map(|(i, _)| i)
    }
}

fn mark(mask: &mut [bool], indices: &[u32]) {
    for &idx in indices {
        if let Some(slot) = mask.get_mut(idx as usize) {
            *slot = true;
        }
    }
}

/// Resolve `layer`'s target set against `project`, then intersect with
/// `ui.target_mask` if one is set.
pub fn resolve_target_set(project: &Project, layer: &Layer, num_leds: usize) -> TargetSet {
    let mut mask = vec![false; num_leds];
    match layer.target_kind {
        TargetKind::All => mask.iter_mut().for_each(|b| *b = true),
        TargetKind::Group => {
            if let Some(group) = layer.target_ref.as_deref().and_then(|name| project.groups.get(name)) {
                mark(&mut mask, &group.indices);
            }
        }
        TargetKind::Zone => {
            if let Some(zone) = layer.target_ref.as_deref().and_then(|name| project.zones.get(name)) {
                let start = zone.start.max(0) as usize;
                let end = (zone.end.max(0) as usize).min(num_leds.saturating_sub(1));
                if start <= end {
                    if let Some(slice) = mask.get_mut(start..=end) {
                        slice.iter_mut().for_each(|b| *b = true);
                    }
                }
            }
        }
        TargetKind::Mask => {
            if let Some(m) = layer.target_ref.as_deref().and_then(|name| project.masks.get(name)) {
                mark(&mut mask, &m.indices);
            }
        }
    }

    if let Some(ui_mask_name) = &project.ui.target_mask {
        if let Some(m) = project.masks.get(ui_mask_name) {
            let mut allowed = vec![false; num_leds];
            mark(&mut allowed, &m.indices);
            for (slot, allow) in mask.iter_mut().zip(allowed.iter()) {
                *slot = *slot && *allow;
            }
        }
    }

    TargetSet { mask }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::project::{Group, Mask, Zone};
    use std::collections::HashMap;

    fn base_project() -> Project {
        Project {
            schema_version: 6,
            name: "t".into(),
            layout: modulo_schema::layout::Layout::Strip { count: 10, led_pin: 6 },
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
    fn all_covers_every_index() {
        let p = base_project();
        let layer = Layer::new("l", "solid");
        let ts = resolve_target_set(&p, &layer, 10);
        assert_eq!(ts.indices().count(), 10);
    }

    #[test]
    fn zone_clamps_to_range() {
        let mut p = base_project();
        p.zones.insert("z".into(), Zone { start: 7, end: 20 });
        let mut layer = Layer::new("l", "solid");
        layer.target_kind = TargetKind::Zone;
        layer.target_ref = Some("z".into());
        let ts = resolve_target_set(&p, &layer, 10);
        assert_eq!(ts.indices().collect::<Vec<_>>(), vec![7, 8, 9]);
    }

    #[test]
    fn missing_target_ref_yields_empty_set() {
        let p = base_project();
        let mut layer = Layer::new("l", "solid");
        layer.target_kind = TargetKind::Group;
        layer.target_ref = Some("nope".into());
        let ts = resolve_target_set(&p, &layer, 10);
        assert!(ts.is_empty());
    }

    #[test]
    fn ui_target_mask_intersects() {
        let mut p = base_project();
        p.groups.insert("g".into(), Group { indices: vec![0, 1, 2, 3] });
        p.masks.insert("m".into(), Mask { indices: vec![2, 3, 4] });
        p.ui.target_mask = Some("m".into());
        let mut layer = Layer::new("l", "solid");
        layer.target_kind = TargetKind::Group;
        layer.target_ref = Some("g".into());
        let ts = resolve_target_set(&p, &layer, 10);
        assert_eq!(ts.indices().collect::<Vec<_>>(), vec![2, 3]);
    }
}
