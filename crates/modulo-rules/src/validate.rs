//! Static rule validation run once before the first tick (§4.6, §4.11).

use modulo_schema::layer::Operator;
use modulo_schema::project::Project;
use modulo_schema::rule::{Action, LayerParam, VarKind};

use crate::error::{RuleError, RuleResult};

pub fn validate_rules(project: &Project) -> RuleResult<()> {
    for rule in &project.rules_v6 {
        validate_one(project, rule)?;
    }
    Ok(())
}

fn validate_one(project: &Project, rule: &modulo_schema::rule::Rule) -> RuleResult<()> {
    match &rule.action {
        Action::SetVar { var_kind, var, .. } => check_var(project, &rule.id, var, *var_kind)?,
        Action::AddVar { var, .. } => check_var(project, &rule.id, var, VarKind::Number)?,
        Action::FlipToggle { var } => check_var(project, &rule.id, var, VarKind::Toggle)?,
        Action::SetLayerParam { layer_index, param, .. } => {
            let layer = project.layers.get(*layer_index).ok_or_else(|| {
                RuleError::LayerParamUnsupported { rule_id: rule.id.clone(), layer_index: *layer_index }
            })?;
            match param {
                LayerParam::OpGain => {
                    if first_gain_slot(layer).is_none() {
                        return Err(RuleError::OpGainNoOperator {
                            rule_id: rule.id.clone(),
                            layer_index: *layer_index,
                        });
                    }
                }
                LayerParam::OpGamma => {
                    if first_gamma_slot(layer).is_none() {
                        return Err(RuleError::OpGammaNoOperator {
                            rule_id: rule.id.clone(),
                            layer_index: *layer_index,
                        });
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn check_var(project: &Project, rule_id: &str, var: &str, kind: VarKind) -> RuleResult<()> {
    let present = match kind {
        VarKind::Number => project.variables.number.contains_key(var),
        VarKind::Toggle => project.variables.toggle.contains_key(var),
    };
    if !present {
        // try the other kind to distinguish "missing" from "wrong kind"
        let other_present = match kind {
            VarKind::Number => project.variables.toggle.contains_key(var),
            VarKind::Toggle => project.variables.number.contains_key(var),
        };
        return Err(if other_present {
            RuleError::BadVarKind { rule_id: rule_id.to_string(), var: var.to_string() }
        } else {
            RuleError::UnknownVar { rule_id: rule_id.to_string(), var: var.to_string() }
        });
    }
    Ok(())
}

pub fn first_gain_slot(layer: &modulo_schema::layer::Layer) -> Option<usize> {
    layer
        .exported_operators()
        .iter()
        .position(|op| matches!(op, Operator::Gain { .. }))
}

pub fn first_gamma_slot(layer: &modulo_schema::layer::Layer) -> Option<usize> {
    layer
        .exported_operators()
        .iter()
        .position(|op| matches!(op, Operator::Gamma { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_schema::layout::Layout;
    use modulo_schema::project::ExportConfig;
    use modulo_schema::rule::{Expr, ExprSrc, Rule, Trigger, When};
    use std::collections::HashMap;

    fn project_with(rules: Vec<Rule>, layers: Vec<modulo_schema::layer::Layer>) -> Project {
        let mut vars = modulo_schema::project::Variables::default();
        vars.number.insert("n".into(), 0.0);
        Project {
            schema_version: 6,
            name: "t".into(),
            layout: Layout::Strip { count: 1, led_pin: 6 },
            layers,
            zones: HashMap::new(),
            groups: HashMap::new(),
            masks: HashMap::new(),
            signals: HashMap::new(),
            variables: vars,
            rules_v6: rules,
            ui: Default::default(),
            export: ExportConfig::default(),
        }
    }

    fn const_expr() -> Expr {
        Expr { src: ExprSrc::Const, const_: Some(1.0), signal: None, scale: 1.0, bias: 0.0, as_bool: false }
    }

    #[test]
    fn unknown_var_rejected() {
        let rule = Rule {
            id: "r1".into(),
            enabled: true,
            trigger: Trigger::Tick,
            when: When { signal: "".into(), op: modulo_schema::rule::CmpOp::Gt, value: 0.0, hyst: 0.0 },
            conditions: vec![],
            cond_mode: Default::default(),
            action: Action::SetVar { var_kind: VarKind::Number, var: "missing".into(), expr: const_expr() },
            name: "".into(),
        };
        let p = project_with(vec![rule], vec![]);
        assert!(matches!(validate_rules(&p), Err(RuleError::UnknownVar { .. })));
    }

    #[test]
    fn op_gain_rule_requires_gain_operator() {
        let layer = modulo_schema::layer::Layer::new("L", "solid");
        let rule = Rule {
            id: "r1".into(),
            enabled: true,
            trigger: Trigger::Tick,
            when: When { signal: "".into(), op: modulo_schema::rule::CmpOp::Gt, value: 0.0, hyst: 0.0 },
            conditions: vec![],
            cond_mode: Default::default(),
            action: Action::SetLayerParam {
                layer_index: 0,
                param: LayerParam::OpGain,
                expr: const_expr(),
                conflict: modulo_schema::rule::Conflict::Last,
            },
            name: "".into(),
        };
        let p = project_with(vec![rule], vec![layer]);
        assert!(matches!(validate_rules(&p), Err(RuleError::OpGainNoOperator { .. })));
    }
}
