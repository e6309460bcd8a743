//! Rules V6 engine: stable evaluation order, per-rule edge/latch state,
//! variable mutation, and bounded runtime overrides (§4.6).

pub mod error;
pub mod overrides;
pub mod validate;

pub use error::{RuleError, RuleResult};
pub use overrides::RuntimeOverrides;
pub use validate::validate_rules;

use std::collections::HashMap;

use modulo_schema::project::Variables;
use modulo_schema::rule::{Action, CondMode, Condition, Rule, Trigger};
use modulo_signal::SignalBus;

/// Mutable variable store the evaluator owns and rules write into each tick
/// (kept separate from the immutable `Project` snapshot, §3 Lifecycle).
#[derive(Debug, Clone, Default)]
pub struct VarStore {
    pub number: HashMap<String, f32>,
    pub toggle: HashMap<String, bool>,
}

impl VarStore {
    pub fn from_project(vars: &Variables) -> Self {
        Self { number: vars.number.clone(), toggle: vars.toggle.clone() }
    }
}

/// Per-rule edge/latch state (§4.6 "Per-rule state").
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleState {
    pub prev: bool,
    pub latch: bool,
}

fn eval_conditions(conditions: &[Condition], mode: CondMode, bus: &SignalBus) -> bool {
    if conditions.is_empty() {
        return true;
    }
    let mut results = conditions.iter().map(|c| c.op.eval(bus.get(&c.signal), c.value));
    match mode {
        CondMode::All => results.all(|r| r),
        CondMode::Any => results.any(|r| r),
    }
}

fn compute_fired(rule: &Rule, state: &mut RuleState, cur: f32, cond_ok: bool) -> bool {
    match rule.trigger {
        Trigger::Tick => cond_ok,
        Trigger::Rising => {
            let now_on = cur > 0.5;
            let fired = cond_ok && now_on && !state.prev;
            state.prev = now_on;
            fired
        }
        Trigger::Threshold => {
            let w = &rule.when;
            let upper = w.op.is_upper_bound();
            let (on_thr, off_thr) = if upper {
                (w.value - w.hyst, w.value + w.hyst)
            } else {
                (w.value + w.hyst, w.value - w.hyst)
            };
            let now_on = if upper {
                if state.latch { cur <= off_thr } else { cur <= on_thr }
            } else if state.latch {
                cur >= off_thr
            } else {
                cur >= on_thr
            };
            let fired = cond_ok && now_on && !state.latch;
            state.latch = now_on;
            fired
        }
    }
}

fn apply_action(rule: &Rule, vars: &mut VarStore, bus: &SignalBus, overrides: &mut RuntimeOverrides) {
    match &rule.action {
        Action::SetVar { var, expr, .. } => {
            let v = expr.eval(|s| bus.get(s));
            vars.number.insert(var.clone(), v);
        }
        Action::AddVar { var, expr } => {
            let v = expr.eval(|s| bus.get(s));
            *vars.number.entry(var.clone()).or_insert(0.0) += v;
        }
        Action::FlipToggle { var } => {
            let entry = vars.toggle.entry(var.clone()).or_insert(false);
            *entry = !*entry;
        }
        Action::SetLayerParam { layer_index, param, expr, conflict } => {
            let v = expr.eval(|s| bus.get(s)) as f64;
            overrides.write(*layer_index, *param, v, *conflict);
        }
    }
}

/// Evaluate all enabled rules for one tick, in `(name, id)` order (§4.6),
/// mutating `vars` and `states` and returning this tick's runtime overrides.
/// Rules must have already passed [`validate_rules`].
pub fn eval_tick(
    rules: &[Rule],
    states: &mut HashMap<String, RuleState>,
    vars: &mut VarStore,
    bus: &SignalBus,
) -> RuntimeOverrides {
    let mut overrides = RuntimeOverrides::new();
    let mut ordered: Vec<&Rule> = rules.iter().filter(|r| r.enabled).collect();
    ordered.sort_by(|a, b| (a.name.as_str(), a.id.as_str()).cmp(&(b.name.as_str(), b.id.as_str())));

    for rule in ordered {
        let state = states.entry(rule.id.clone()).or_default();
        let cur = if rule.when.signal.is_empty() { 0.0 } else { bus.get(&rule.when.signal) };
        let cond_ok = eval_conditions(&rule.conditions, rule.cond_mode, bus);
        let fired = compute_fired(rule, state, cur, cond_ok);
        if fired {
            apply_action(rule, vars, bus, &mut overrides);
        }
    }
    overrides
}
