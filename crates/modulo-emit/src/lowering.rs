//! Flatten a validated project into the fixed-size arrays the generated
//! sketch indexes by layer (§4.10 step 2). Every layer contributes exactly
//! two operator slots and two modulotor slots, matching `Layer::exported_*`.

use modulo_rules::validate::{first_gain_slot, first_gamma_slot};
use modulo_schema::layer::{BlendMode, Layer, Operator, ParamValue, TargetKind};
use modulo_schema::layout::{Layout, Origin, Rotate};
use modulo_schema::modulotor::{CurveKind, ModMode, Modulotor, ParamTarget};
use modulo_schema::project::Project;
use modulo_schema::rule::{Action, LayerParam};

use crate::error::{EmitError, EmitResult};
use crate::signal_expr::arduino_expr_or_zero;

pub const NO_OPERATOR: u8 = 255;
pub const NO_MODULOTOR: u8 = 255;
pub const OPERATOR_SLOTS_PER_LAYER: usize = 2;
pub const MODULOTOR_SLOTS_PER_LAYER: usize = 2;

#[derive(Debug, Clone)]
pub struct LayerIr {
    pub name: String,
    pub behavior_id: u8,
    pub color: [u8; 3],
    pub color2: [u8; 3],
    pub brightness: u8,
    pub speed: u8,
    pub width: u8,
    pub softness: u8,
    pub density: u8,
    pub direction: u8,
    pub purpose_f: [f32; 4],
    pub purpose_i: [i32; 4],
    pub opacity: u8,
    pub blend_id: u8,
    pub target_kind_id: u8,
    pub target_ref_index: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct OperatorIr {
    pub kind_id: u8,
    pub p0: f32,
}

impl OperatorIr {
    pub const NONE: OperatorIr = OperatorIr { kind_id: NO_OPERATOR, p0: 0.0 };
}

#[derive(Debug, Clone)]
pub struct ModulotorIr {
    pub present: bool,
    pub src_expr: String,
    pub target_id: u8,
    pub mode_id: u8,
    pub amount: f32,
    pub rate_hz: f32,
    pub bias: f32,
    pub smooth: f32,
    pub curve_id: u8,
    pub phase: f32,
}

impl ModulotorIr {
    pub const NONE: ModulotorIr = ModulotorIr {
        present: false,
        src_expr: String::new(),
        target_id: NO_MODULOTOR,
        mode_id: 0,
        amount: 0.0,
        rate_hz: 0.0,
        bias: 0.0,
        smooth: 0.0,
        curve_id: 0,
        phase: 0.0,
    };
}

#[derive(Debug, Clone)]
pub struct RuleIr {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct MatrixIr {
    pub width: u32,
    pub height: u32,
    pub serpentine: bool,
    pub origin: Origin,
    pub rotate: Rotate,
    pub flip_x: bool,
    pub flip_y: bool,
}

#[derive(Debug, Clone)]
pub struct ProjectIr {
    pub num_leds: u32,
    pub led_pin: u8,
    pub layers: Vec<LayerIr>,
    pub operators: Vec<OperatorIr>,
    pub modulotors: Vec<ModulotorIr>,
    pub rules: Vec<RuleIr>,
    pub group_offs: Vec<u32>,
    pub group_lens: Vec<u32>,
    pub group_indexes: Vec<u32>,
    pub zone_start: Vec<i32>,
    pub zone_end: Vec<i32>,
    pub matrix: Option<MatrixIr>,
    pub postfx_bleed_amount: f32,
    pub postfx_bleed_radius: u8,
    pub postfx_trail_amount: f32,
}

fn to_u8_scaled(v: f64, scale: f64) -> u8 {
    (v * scale).round().clamp(0.0, 255.0) as u8
}

fn scalar(layer: &Layer, key: &str, default: f64) -> f64 {
    layer.params.get(key).map(ParamValue::as_scalar).unwrap_or(default)
}

fn color_u8(layer: &Layer, key: &str) -> [u8; 3] {
    let t = layer.params.get(key).map(ParamValue::as_tuple).unwrap_or_else(|| vec![255.0, 255.0, 255.0]);
    [
        (t.first().copied().unwrap_or(255.0)).round().clamp(0.0, 255.0) as u8,
        (t.get(1).copied().unwrap_or(255.0)).round().clamp(0.0, 255.0) as u8,
        (t.get(2).copied().unwrap_or(255.0)).round().clamp(0.0, 255.0) as u8,
    ]
}

fn blend_id(mode: BlendMode) -> u8 {
    match mode {
        BlendMode::Over => 0,
        BlendMode::Add => 1,
        BlendMode::Max => 2,
        BlendMode::Multiply => 3,
        BlendMode::Screen => 4,
    }
}

fn target_kind_id(kind: TargetKind) -> u8 {
    match kind {
        TargetKind::All => 0,
        TargetKind::Group => 1,
        TargetKind::Zone => 2,
        TargetKind::Mask => 3,
    }
}

fn operator_kind_id(op: Operator) -> (u8, f32) {
    match op {
        Operator::Gain { k } => (0, k),
        Operator::Gamma { gamma } => (1, gamma),
        Operator::Posterize { levels } => (2, levels as f32),
        // filtered out by Layer::exported_operators before lowering ever sees it
        Operator::Legacy => (0, 1.0),
    }
}

fn param_target_id(target: ParamTarget) -> u8 {
    match target {
        ParamTarget::Brightness => 0,
        ParamTarget::Speed => 1,
        ParamTarget::Width => 2,
        ParamTarget::Softness => 3,
        ParamTarget::Density => 4,
        ParamTarget::Direction => 5,
        ParamTarget::PurposeF0 => 6,
        ParamTarget::PurposeF1 => 7,
        ParamTarget::PurposeF2 => 8,
        ParamTarget::PurposeF3 => 9,
        ParamTarget::PurposeI0 => 10,
        ParamTarget::PurposeI1 => 11,
        ParamTarget::PurposeI2 => 12,
        ParamTarget::PurposeI3 => 13,
    }
}

fn mod_mode_id(mode: ModMode) -> u8 {
    match mode {
        ModMode::Mul => 0,
        ModMode::Add => 1,
        ModMode::Set => 2,
    }
}

fn curve_id(curve: CurveKind) -> u8 {
    match curve {
        CurveKind::Linear => 0,
        CurveKind::Invert => 1,
        CurveKind::Abs => 2,
        CurveKind::Pow2 => 3,
        CurveKind::Pow3 => 4,
    }
}

fn lower_operator(layer: &Layer, slot: usize) -> OperatorIr {
    match layer.exported_operators().get(slot) {
        Some(op) => {
            let (kind_id, p0) = operator_kind_id(*op);
            OperatorIr { kind_id, p0 }
        }
        None => OperatorIr::NONE,
    }
}

fn lower_modulotor(m: &Modulotor) -> ModulotorIr {
    ModulotorIr {
        present: true,
        src_expr: arduino_expr_or_zero(&m.source),
        target_id: param_target_id(m.target),
        mode_id: mod_mode_id(m.mode),
        amount: m.amount,
        rate_hz: m.rate_hz,
        bias: m.bias,
        smooth: m.clamped_smooth(),
        curve_id: curve_id(m.curve),
        phase: m.phase,
    }
}

fn lower_layer(layer: &Layer, behavior_id: u8, target_ref_index: i32) -> LayerIr {
    LayerIr {
        name: layer.name.clone(),
        behavior_id,
        color: color_u8(layer, "color"),
        color2: color_u8(layer, "color2"),
        brightness: to_u8_scaled(scalar(layer, "brightness", 1.0), 255.0),
        speed: to_u8_scaled(scalar(layer, "speed", 1.0), 100.0),
        width: to_u8_scaled(scalar(layer, "width", 1.0), 255.0),
        softness: to_u8_scaled(scalar(layer, "softness", 0.5), 255.0),
        density: to_u8_scaled(scalar(layer, "density", 0.5), 255.0),
        direction: to_u8_scaled(scalar(layer, "direction", 1.0), 1.0),
        purpose_f: [
            scalar(layer, "purpose_f0", 0.0) as f32,
            scalar(layer, "purpose_f1", 0.0) as f32,
            scalar(layer, "purpose_f2", 0.0) as f32,
            scalar(layer, "purpose_f3", 0.0) as f32,
        ],
        purpose_i: [
            scalar(layer, "purpose_i0", 0.0) as i32,
            scalar(layer, "purpose_i1", 0.0) as i32,
            scalar(layer, "purpose_i2", 0.0) as i32,
            scalar(layer, "purpose_i3", 0.0) as i32,
        ],
        opacity: to_u8_scaled(layer.opacity as f64, 255.0),
        blend_id: blend_id(layer.blend_mode),
        target_kind_id: target_kind_id(layer.target_kind),
        target_ref_index,
    }
}

fn param_name(param: LayerParam) -> &'static str {
    match param {
        LayerParam::Opacity => "opacity",
        LayerParam::Brightness => "brightness",
        LayerParam::OpGain => "op_gain",
        LayerParam::OpGamma => "op_gamma",
        LayerParam::PostfxTrail => "postfx_trail",
        LayerParam::PostfxBleed => "postfx_bleed",
        LayerParam::PostfxBleedRadius => "postfx_bleed_radius",
    }
}

/// Emit one rule's per-frame block: compute `cur`, apply hysteresis/guards,
/// fire the action by writing directly into the pre-resolved array slot.
/// Signal expressions are inlined literally via `signal_expr` (§4.10 step 3).
fn lower_rule_code(project: &Project, rule: &modulo_schema::rule::Rule, rule_index: usize) -> EmitResult<String> {
    let cur_expr = arduino_expr_or_zero(&rule.when.signal);
    let mut code = format!(
        "  // rule '{name}' ({id})\n  {{\n    float cur = {cur_expr};\n",
        name = rule.name,
        id = rule.id,
    );
    let cmp = match rule.when.op {
        modulo_schema::rule::CmpOp::Gt => ">",
        modulo_schema::rule::CmpOp::Gte => ">=",
        modulo_schema::rule::CmpOp::Lt => "<",
        modulo_schema::rule::CmpOp::Lte => "<=",
        modulo_schema::rule::CmpOp::Eq => "==",
    };
    code += &format!(
        "    bool active = RULE_LATCH[{i}] ? (cur {cmp} ({v}f - {hyst}f)) : (cur {cmp} {v}f);\n",
        i = rule_index,
        cmp = cmp,
        v = rule.when.value,
        hyst = rule.when.hyst,
    );
    code += &format!("    RULE_LATCH[{i}] = active;\n", i = rule_index);
    code += "    if (active) {\n";
    code += &lower_action(project, rule, &rule.action)?;
    code += "    }\n";
    code += &format!("    RULE_PREV[{i}] = cur;\n", i = rule_index);
    code += "  }\n";
    Ok(code)
}

fn lower_action(project: &Project, rule: &modulo_schema::rule::Rule, action: &Action) -> EmitResult<String> {
    Ok(match action {
        Action::SetVar { var, expr, .. } => format!("      {} = {};\n", c_var_name(var), expr_code(expr)),
        Action::AddVar { var, expr } => format!("      {var} += {expr};\n", var = c_var_name(var), expr = expr_code(expr)),
        Action::FlipToggle { var } => format!("      {var} = !{var};\n", var = c_var_name(var)),
        Action::SetLayerParam { layer_index, param, expr, .. } => {
            let layer = project.layers.get(*layer_index).ok_or_else(|| EmitError::MissingOperatorSlot {
                rule_id: rule.id.clone(),
                layer_index: *layer_index,
                param: param_name(*param),
            })?;
            match param {
                LayerParam::OpGain => {
                    let slot = first_gain_slot(layer).ok_or_else(|| EmitError::MissingOperatorSlot {
                        rule_id: rule.id.clone(),
                        layer_index: *layer_index,
                        param: "op_gain",
                    })?;
                    format!("      OP_P0[{idx}] = {expr};\n", idx = layer_index * OPERATOR_SLOTS_PER_LAYER + slot, expr = expr_code(expr))
                }
                LayerParam::OpGamma => {
                    let slot = first_gamma_slot(layer).ok_or_else(|| EmitError::MissingOperatorSlot {
                        rule_id: rule.id.clone(),
                        layer_index: *layer_index,
                        param: "op_gamma",
                    })?;
                    format!("      OP_P0[{idx}] = {expr};\n", idx = layer_index * OPERATOR_SLOTS_PER_LAYER + slot, expr = expr_code(expr))
                }
                LayerParam::Opacity => format!("      L_OP[{i}] = (uint8_t)(({expr}) * 255.0f);\n", i = layer_index, expr = expr_code(expr)),
                LayerParam::Brightness => format!("      L_BR[{i}] = (uint8_t)(({expr}) * 255.0f);\n", i = layer_index, expr = expr_code(expr)),
                LayerParam::PostfxTrail => format!("      g_postfx_trail = {expr};\n", expr = expr_code(expr)),
                LayerParam::PostfxBleed => format!("      g_postfx_bleed = {expr};\n", expr = expr_code(expr)),
                LayerParam::PostfxBleedRadius => format!("      g_postfx_bleed_radius = (uint8_t)({expr});\n", expr = expr_code(expr)),
            }
        }
    })
}

fn c_var_name(var: &str) -> String {
    format!("g_var_{}", var.replace(|c: char| !c.is_ascii_alphanumeric() && c != '_', "_"))
}

fn expr_code(expr: &modulo_schema::rule::Expr) -> String {
    let raw = match expr.src {
        modulo_schema::rule::ExprSrc::Const => format!("{}f", expr.const_.unwrap_or(0.0)),
        modulo_schema::rule::ExprSrc::Signal => arduino_expr_or_zero(expr.signal.as_deref().unwrap_or("")),
    };
    let scaled = format!("(({raw}) * {scale}f + {bias}f)", raw = raw, scale = expr.scale, bias = expr.bias);
    if expr.as_bool {
        format!("(({scaled}) > 0.5f ? 1.0f : 0.0f)")
    } else {
        scaled
    }
}

pub fn lower(project: &Project, registry: &modulo_behaviors::BehaviorRegistry) -> EmitResult<ProjectIr> {
    modulo_validate::preconditions::check(project, registry)?;
    modulo_rules::validate_rules(project)?;

    let mut group_names: Vec<&String> = project.groups.keys().collect();
    group_names.sort();
    let zone_names: Vec<&String> = {
        let mut z: Vec<&String> = project.zones.keys().collect();
        z.sort();
        z
    };
    let mask_names: Vec<&String> = {
        let mut m: Vec<&String> = project.masks.keys().collect();
        m.sort();
        m
    };

    let mut group_offs = Vec::with_capacity(group_names.len());
    let mut group_lens = Vec::with_capacity(group_names.len());
    let mut group_indexes = Vec::new();
    for name in &group_names {
        let g = &project.groups[*name];
        group_offs.push(group_indexes.len() as u32);
        group_lens.push(g.indices.len() as u32);
        group_indexes.extend(g.indices.iter().copied());
    }

    let zone_start: Vec<i32> = zone_names.iter().map(|n| project.zones[*n].start).collect();
    let zone_end: Vec<i32> = zone_names.iter().map(|n| project.zones[*n].end).collect();

    let mut layers = Vec::with_capacity(project.layers.len());
    let mut operators = Vec::with_capacity(project.layers.len() * OPERATOR_SLOTS_PER_LAYER);
    let mut modulotors = Vec::with_capacity(project.layers.len() * MODULOTOR_SLOTS_PER_LAYER);

    for layer in &project.layers {
        let behavior = registry
            .get(&layer.behavior)
            .map_err(|e| EmitError::Internal(format!("layer '{}': {e}", layer.name)))?;
        let behavior_id = behavior.meta().arduino_behavior_id.unwrap_or(0);

        let target_ref_index = match layer.target_kind {
            TargetKind::All => -1,
            TargetKind::Group => layer.target_ref.as_ref().and_then(|r| group_names.iter().position(|n| *n == r)).map(|i| i as i32).unwrap_or(-1),
            TargetKind::Zone => layer.target_ref.as_ref().and_then(|r| zone_names.iter().position(|n| *n == r)).map(|i| i as i32).unwrap_or(-1),
            TargetKind::Mask => layer.target_ref.as_ref().and_then(|r| mask_names.iter().position(|n| *n == r)).map(|i| i as i32).unwrap_or(-1),
        };

        layers.push(lower_layer(layer, behavior_id, target_ref_index));
        for slot in 0..OPERATOR_SLOTS_PER_LAYER {
            operators.push(lower_operator(layer, slot));
        }
        let exported = layer.exported_modulotors();
        for slot in 0..MODULOTOR_SLOTS_PER_LAYER {
            modulotors.push(exported.get(slot).map(lower_modulotor).unwrap_or(ModulotorIr::NONE));
        }
    }

    let mut rules = Vec::with_capacity(project.rules_v6.len());
    let mut ordered_rules: Vec<&modulo_schema::rule::Rule> = project.rules_v6.iter().filter(|r| r.enabled).collect();
    ordered_rules.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    for (i, rule) in ordered_rules.iter().enumerate() {
        rules.push(RuleIr { id: rule.id.clone(), name: rule.name.clone(), code: lower_rule_code(project, rule, i)? });
    }

    let matrix = match &project.layout {
        Layout::Strip { .. } => None,
        Layout::Cells { width, height, serpentine, origin, rotate, flip_x, flip_y } => Some(MatrixIr {
            width: *width,
            height: *height,
            serpentine: *serpentine,
            origin: *origin,
            rotate: *rotate,
            flip_x: *flip_x,
            flip_y: *flip_y,
        }),
    };

    let led_pin = match &project.layout {
        Layout::Strip { led_pin, .. } => *led_pin,
        Layout::Cells { .. } => project.export.hw.data_pin.unwrap_or(6),
    };

    Ok(ProjectIr {
        num_leds: project.num_leds(),
        led_pin,
        layers,
        operators,
        modulotors,
        rules,
        group_offs,
        group_lens,
        group_indexes,
        zone_start,
        zone_end,
        matrix,
        postfx_bleed_amount: project.export.postfx.bleed_amount,
        postfx_bleed_radius: project.export.postfx.bleed_radius,
        postfx_trail_amount: project.export.postfx.trail_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modulo_behaviors::catalog::register_builtins;
    use modulo_schema::project::ExportConfig;
    use std::collections::HashMap;

    fn registry() -> modulo_behaviors::BehaviorRegistry {
        let mut reg = modulo_behaviors::BehaviorRegistry::new();
        register_builtins(&mut reg).unwrap();
        reg
    }

    fn project(layers: Vec<Layer>) -> Project {
        Project {
            schema_version: 6,
            name: "t".into(),
            layout: Layout::Strip { count: 8, led_pin: 6 },
            layers,
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

    #[test]
    fn lowers_one_solid_layer() {
        let mut layer = Layer::new("l", "solid");
        layer.params.insert("color".into(), ParamValue::Tuple(vec![10.0, 20.0, 30.0]));
        let ir = lower(&project(vec![layer]), &registry()).unwrap();
        assert_eq!(ir.num_leds, 8);
        assert_eq!(ir.layers.len(), 1);
        assert_eq!(ir.layers[0].color, [10, 20, 30]);
        assert_eq!(ir.layers[0].behavior_id, 0);
        assert_eq!(ir.operators.len(), 2);
        assert!(ir.operators.iter().all(|op| op.kind_id == NO_OPERATOR));
    }

    #[test]
    fn gain_operator_lowers_into_its_slot() {
        let mut layer = Layer::new("l", "solid");
        layer.operators.push(Operator::Gain { k: 1.5 });
        let ir = lower(&project(vec![layer]), &registry()).unwrap();
        assert_eq!(ir.operators[0].kind_id, 0);
        assert_eq!(ir.operators[0].p0, 1.5);
        assert_eq!(ir.operators[1].kind_id, NO_OPERATOR);
    }

    #[test]
    fn unknown_behavior_fails_lowering() {
        let layer = Layer::new("l", "no-such-thing");
        assert!(lower(&project(vec![layer]), &registry()).is_err());
    }
}
