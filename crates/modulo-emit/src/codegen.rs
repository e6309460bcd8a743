//! Assemble the generated sketch body from a lowered project (§4.10 steps
//! 2-7). The target pack supplies `@@LED_IMPL@@`/`@@AUDIO_IMPL@@`/
//! `@@MATRIX_IMPL@@`; this module supplies everything else.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::lowering::{ProjectIr, NO_OPERATOR};
use crate::target::TargetPack;
use crate::template::substitute;

const SKETCH_TEMPLATE: &str = include_str!("sketch.ino.tmpl");

fn join_u8(vals: impl Iterator<Item = u8>) -> String {
    vals.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

fn join_i32(vals: impl Iterator<Item = i32>) -> String {
    vals.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

fn join_f32(vals: impl Iterator<Item = f32>) -> String {
    vals.map(|v| format!("{v}f")).collect::<Vec<_>>().join(", ")
}

fn layer_arrays(ir: &ProjectIr) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "static const uint8_t L_BEH[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.behavior_id)));
    let _ = writeln!(out, "static const uint8_t L_R[LAYERS]  = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.color[0])));
    let _ = writeln!(out, "static const uint8_t L_G[LAYERS]  = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.color[1])));
    let _ = writeln!(out, "static const uint8_t L_B[LAYERS]  = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.color[2])));
    let _ = writeln!(out, "static const uint8_t L_R2[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.color2[0])));
    let _ = writeln!(out, "static const uint8_t L_G2[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.color2[1])));
    let _ = writeln!(out, "static const uint8_t L_B2[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.color2[2])));
    let _ = writeln!(out, "static uint8_t L_BR[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.brightness)));
    let _ = writeln!(out, "static uint8_t L_SP[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.speed)));
    let _ = writeln!(out, "static uint8_t L_WD[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.width)));
    let _ = writeln!(out, "static uint8_t L_SO[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.softness)));
    let _ = writeln!(out, "static uint8_t L_DN[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.density)));
    let _ = writeln!(out, "static uint8_t L_DIR[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.direction)));
    for ch in 0..4 {
        let _ = writeln!(out, "static float L_PF{ch}[LAYERS] = {{ {} }};", join_f32(ir.layers.iter().map(|l| l.purpose_f[ch])));
    }
    for ch in 0..4 {
        let _ = writeln!(out, "static int32_t L_PI{ch}[LAYERS] = {{ {} }};", join_i32(ir.layers.iter().map(|l| l.purpose_i[ch])));
    }
    let _ = writeln!(out, "static uint8_t L_OP[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.opacity)));
    let _ = writeln!(out, "static const uint8_t L_BLEND[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.blend_id)));
    let _ = writeln!(out, "static const uint8_t L_TGT_KIND[LAYERS] = {{ {} }};", join_u8(ir.layers.iter().map(|l| l.target_kind_id)));
    let _ = writeln!(out, "static const int32_t L_TGT_REF[LAYERS] = {{ {} }};", join_i32(ir.layers.iter().map(|l| l.target_ref_index)));
    out
}

fn operator_arrays(ir: &ProjectIr) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "static const uint8_t OP_KIND[LAYERS * 2] = {{ {} }};", join_u8(ir.operators.iter().map(|o| o.kind_id)));
    let _ = writeln!(out, "static float OP_P0[LAYERS * 2] = {{ {} }};", join_f32(ir.operators.iter().map(|o| o.p0)));
    out
}

fn modulotor_arrays(ir: &ProjectIr) -> String {
    let mut out = String::new();
    let src_exprs: Vec<String> = ir.modulotors.iter().map(|m| if m.present { m.src_expr.clone() } else { "0.0f".into() }).collect();
    let _ = writeln!(out, "static inline float m_src_read(uint8_t slot) {{");
    let _ = writeln!(out, "  switch (slot) {{");
    for (i, expr) in src_exprs.iter().enumerate() {
        let _ = writeln!(out, "    case {i}: return {expr};");
    }
    let _ = writeln!(out, "    default: return 0.0f;");
    let _ = writeln!(out, "  }}");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out, "static const uint8_t M_PRESENT[LAYERS * 2] = {{ {} }};", join_u8(ir.modulotors.iter().map(|m| m.present as u8)));
    let _ = writeln!(out, "static const uint8_t M_TGT[LAYERS * 2] = {{ {} }};", join_u8(ir.modulotors.iter().map(|m| m.target_id)));
    let _ = writeln!(out, "static const uint8_t M_MODE[LAYERS * 2] = {{ {} }};", join_u8(ir.modulotors.iter().map(|m| m.mode_id)));
    let _ = writeln!(out, "static const float M_AMT[LAYERS * 2] = {{ {} }};", join_f32(ir.modulotors.iter().map(|m| m.amount)));
    let _ = writeln!(out, "static const float M_RATE[LAYERS * 2] = {{ {} }};", join_f32(ir.modulotors.iter().map(|m| m.rate_hz)));
    let _ = writeln!(out, "static const float M_BIAS[LAYERS * 2] = {{ {} }};", join_f32(ir.modulotors.iter().map(|m| m.bias)));
    let _ = writeln!(out, "static const float M_SMOOTH[LAYERS * 2] = {{ {} }};", join_f32(ir.modulotors.iter().map(|m| m.smooth)));
    let _ = writeln!(out, "static const uint8_t M_CURVE[LAYERS * 2] = {{ {} }};", join_u8(ir.modulotors.iter().map(|m| m.curve_id)));
    let _ = writeln!(out, "static const float M_PHASE[LAYERS * 2] = {{ {} }};", join_f32(ir.modulotors.iter().map(|m| m.phase)));
    out
}

fn group_zone_arrays(ir: &ProjectIr) -> String {
    let mut out = String::new();
    if ir.group_offs.is_empty() {
        let _ = writeln!(out, "static const uint16_t GROUP_OFFS[1] = {{ 0 }};");
        let _ = writeln!(out, "static const uint16_t GROUP_LENS[1] = {{ 0 }};");
        let _ = writeln!(out, "static const uint16_t GROUP_INDEXES[1] = {{ 0 }};");
    } else {
        let _ = writeln!(out, "static const uint16_t GROUP_OFFS[{}] = {{ {} }};", ir.group_offs.len(), join_i32(ir.group_offs.iter().map(|v| *v as i32)));
        let _ = writeln!(out, "static const uint16_t GROUP_LENS[{}] = {{ {} }};", ir.group_lens.len(), join_i32(ir.group_lens.iter().map(|v| *v as i32)));
        let _ = writeln!(
            out,
            "static const uint16_t GROUP_INDEXES[{}] = {{ {} }};",
            ir.group_indexes.len().max(1),
            join_i32(ir.group_indexes.iter().map(|v| *v as i32))
        );
    }
    if ir.zone_start.is_empty() {
        let _ = writeln!(out, "static const int16_t ZONE_START[1] = {{ 0 }};");
        let _ = writeln!(out, "static const int16_t ZONE_END[1] = {{ 0 }};");
    } else {
        let _ = writeln!(out, "static const int16_t ZONE_START[{}] = {{ {} }};", ir.zone_start.len(), join_i32(ir.zone_start.iter().copied()));
        let _ = writeln!(out, "static const int16_t ZONE_END[{}] = {{ {} }};", ir.zone_end.len(), join_i32(ir.zone_end.iter().copied()));
    }
    out
}

/// One switch-dispatched per-pixel evaluator per exportable builtin, ported
/// from `modulo_behaviors::effects` (ids 0-5; §4.10 step 4).
fn behavior_dispatch_fn() -> &'static str {
    r#"
struct LayerParams {
  float brightness, speed, width, softness, density, direction;
  float pf0, pf1, pf2, pf3;
};

static inline void hsv_to_rgb(float h, float s, float v, float *r, float *g, float *b) {
  h = h - floorf(h);
  h *= 6.0f;
  int i = (int)floorf(h);
  float f = h - floorf(h);
  float p = v * (1.0f - s);
  float q = v * (1.0f - s * f);
  float t = v * (1.0f - s * (1.0f - f));
  switch (((i % 6) + 6) % 6) {
    case 0: *r = v; *g = t; *b = p; break;
    case 1: *r = q; *g = v; *b = p; break;
    case 2: *r = p; *g = v; *b = t; break;
    case 3: *r = p; *g = q; *b = v; break;
    case 4: *r = t; *g = p; *b = v; break;
    default: *r = v; *g = p; *b = q; break;
  }
}

static void renderLayerPixel(uint8_t li, uint16_t i, const LayerParams *p, float tsec,
                              uint8_t *outR, uint8_t *outG, uint8_t *outB) {
  float r = 0, g = 0, b = 0;
  switch (L_BEH[li]) {
    case 0: { // solid
      r = L_R[li] * p->brightness; g = L_G[li] * p->brightness; b = L_B[li] * p->brightness;
      break;
    }
    case 1: { // strobe
      float hz = p->speed > 0.01f ? p->speed : 0.01f;
      float frac = fmodf(tsec * hz, 1.0f);
      if (frac < 0.5f) { r = L_R[li] * p->brightness; g = L_G[li] * p->brightness; b = L_B[li] * p->brightness; }
      break;
    }
    case 2: { // rainbow
      float width = p->width > 0.01f ? p->width : 0.01f;
      float hue = ((float)i / width) + tsec * p->speed;
      float rr, gg, bb;
      hsv_to_rgb(hue, 1.0f, p->brightness, &rr, &gg, &bb);
      r = rr * 255.0f; g = gg * 255.0f; b = bb * 255.0f;
      break;
    }
    case 3: { // chase
      float period = 2.0f * (float)NUM_LEDS;
      float dir = p->direction < 0.0f ? -1.0f : 1.0f;
      float phase = fmodf(tsec * p->speed * dir, period);
      if (phase < 0) phase += period;
      float pos = phase < (float)NUM_LEDS ? phase : period - phase;
      float width = p->width > 1.0f ? p->width : 1.0f;
      if (fabsf((float)i - pos) < width) {
        r = L_R[li] * p->brightness; g = L_G[li] * p->brightness; b = L_B[li] * p->brightness;
      }
      break;
    }
    case 4: { // sparkle
      float v = ST_F[li][i < 16 ? i : 15];
      r = L_R[li] * p->brightness * v; g = L_G[li] * p->brightness * v; b = L_B[li] * p->brightness * v;
      break;
    }
    case 5: { // audio_meter
      float level = ST_F[li][0];
      uint16_t lit = (uint16_t)roundf(level * NUM_LEDS);
      if (i < lit) { r = L_R[li] * p->brightness; g = L_G[li] * p->brightness; b = L_B[li] * p->brightness; }
      break;
    }
    default:
      break;
  }
  *outR = (uint8_t)fminf(fmaxf(r, 0.0f), 255.0f);
  *outG = (uint8_t)fminf(fmaxf(g, 0.0f), 255.0f);
  *outB = (uint8_t)fminf(fmaxf(b, 0.0f), 255.0f);
}
"#
}

fn compute_layer_params_fn() -> &'static str {
    r#"
static float m_shape(uint8_t curve, float x) {
  x = fminf(fmaxf(x, 0.0f), 1.0f);
  switch (curve) {
    case 1: return 1.0f - x;
    case 2: return fabsf(2.0f * x - 1.0f);
    case 3: return x * x;
    case 4: return x * x * x;
    default: return x;
  }
}

static void apply_modulotor_slot(uint8_t slot, uint32_t tick_count, LayerParams *p) {
  if (!M_PRESENT[slot]) return;
  float raw = m_src_read(slot);
  float shaped = m_shape(M_CURVE[slot], raw) + M_BIAS[slot];
  float contrib = shaped * M_AMT[slot];
  float *target = NULL;
  switch (M_TGT[slot]) {
    case 0: target = &p->brightness; break;
    case 1: target = &p->speed; break;
    case 2: target = &p->width; break;
    case 3: target = &p->softness; break;
    case 4: target = &p->density; break;
    case 5: target = &p->direction; break;
    case 6: target = &p->pf0; break;
    case 7: target = &p->pf1; break;
    case 8: target = &p->pf2; break;
    case 9: target = &p->pf3; break;
    default: return;
  }
  switch (M_MODE[slot]) {
    case 0: *target *= (1.0f + contrib); break;
    case 1: *target += contrib; break;
    case 2: *target = contrib; break;
  }
}

static LayerParams computeLayerParams(uint8_t li, uint32_t tick_count) {
  LayerParams p;
  p.brightness = L_BR[li] / 255.0f;
  p.speed = L_SP[li] / 100.0f;
  p.width = L_WD[li] / 255.0f;
  p.softness = L_SO[li] / 255.0f;
  p.density = L_DN[li] / 255.0f;
  p.direction = L_DIR[li] >= 1 ? 1.0f : -1.0f;
  p.pf0 = L_PF0[li]; p.pf1 = L_PF1[li]; p.pf2 = L_PF2[li]; p.pf3 = L_PF3[li];
  apply_modulotor_slot(li * 2u, tick_count, &p);
  apply_modulotor_slot(li * 2u + 1u, tick_count, &p);
  return p;
}
"#
}

fn apply_operators_fn() -> &'static str {
    r#"
static void apply_layer_operators(uint8_t li, uint8_t *r, uint8_t *g, uint8_t *b) {
  for (uint8_t slot = li * 2u; slot < li * 2u + 2u; slot++) {
    uint8_t kind = OP_KIND[slot];
    float p0 = OP_P0[slot];
    if (kind == 255) continue;
    if (kind == 0) { // gain
      *r = (uint8_t)fminf(*r * p0, 255.0f);
      *g = (uint8_t)fminf(*g * p0, 255.0f);
      *b = (uint8_t)fminf(*b * p0, 255.0f);
    } else if (kind == 1) { // gamma
      float gamma = p0 > 0.001f ? p0 : 0.001f;
      *r = (uint8_t)(powf(*r / 255.0f, 1.0f / gamma) * 255.0f);
      *g = (uint8_t)(powf(*g / 255.0f, 1.0f / gamma) * 255.0f);
      *b = (uint8_t)(powf(*b / 255.0f, 1.0f / gamma) * 255.0f);
    } else if (kind == 2) { // posterize
      float levels = p0 < 2.0f ? 2.0f : (p0 > 64.0f ? 64.0f : p0);
      float step = 255.0f / (levels - 1.0f);
      *r = (uint8_t)(roundf(*r / step) * step);
      *g = (uint8_t)(roundf(*g / step) * step);
      *b = (uint8_t)(roundf(*b / step) * step);
    }
  }
}
"#
}

fn target_contains_fn() -> &'static str {
    r#"
static bool targetContains(uint8_t li, uint16_t i) {
  switch (L_TGT_KIND[li]) {
    case 0: return true; // all
    case 1: { // group
      int32_t gi = L_TGT_REF[li];
      if (gi < 0) return false;
      uint16_t off = GROUP_OFFS[gi], len = GROUP_LENS[gi];
      for (uint16_t k = 0; k < len; k++) if (GROUP_INDEXES[off + k] == i) return true;
      return false;
    }
    case 2: { // zone
      int32_t zi = L_TGT_REF[li];
      if (zi < 0) return false;
      return (int32_t)i >= ZONE_START[zi] && (int32_t)i < ZONE_END[zi];
    }
    default:
      return true; // mask targeting resolved by the caller's shield data
  }
}
"#
}

fn rules_decls(ir: &ProjectIr) -> String {
    let n = ir.rules.len().max(1);
    format!(
        "static float RULE_PREV[{n}];\nstatic bool RULE_LATCH[{n}];\n\nstatic void evaluate_rules() {{\n{}}}\n",
        ir.rules.iter().map(|r| r.code.clone()).collect::<Vec<_>>().join("\n")
    )
}

fn state_arrays(ir: &ProjectIr) -> String {
    let n = ir.layers.len().max(1);
    format!(
        "static float ST_F[LAYERS][16];\nstatic int32_t ST_I[LAYERS][16];\nstatic bool ST_INIT[{n}];\n\nstatic void state_reset_layer(uint8_t li) {{\n  for (uint8_t k = 0; k < 16; k++) {{ ST_F[li][k] = 0.0f; ST_I[li][k] = 0; }}\n  ST_INIT[li] = true;\n}}\n"
    )
}

fn postfx_block(ir: &ProjectIr) -> String {
    if ir.num_leds > 300 {
        return "#define MODULA_POSTFX_ENABLED 0\n".to_string();
    }
    format!(
        "#define MODULA_POSTFX_ENABLED 1\nstatic float g_postfx_bleed = {bleed}f;\nstatic uint8_t g_postfx_bleed_radius = {radius};\nstatic float g_postfx_trail = {trail}f;\n",
        bleed = ir.postfx_bleed_amount,
        radius = ir.postfx_bleed_radius.clamp(1, 2),
        trail = ir.postfx_trail_amount,
    )
}

fn matrix_block(ir: &ProjectIr) -> String {
    match &ir.matrix {
        None => String::new(),
        Some(m) => format!("#define MATRIX_WIDTH {}\n#define MATRIX_HEIGHT {}\n", m.width, m.height),
    }
}

pub fn generate_sketch(ir: &ProjectIr, pack: &dyn TargetPack, use_spectrum_shield: bool) -> String {
    let mut tokens: HashMap<&str, String> = HashMap::new();
    tokens.insert("NUM_LEDS", ir.num_leds.to_string());
    tokens.insert("LED_PIN", ir.led_pin.to_string());
    tokens.insert("LAYERS", ir.layers.len().max(1).to_string());
    tokens.insert("TARGET_ID", pack.id().to_string());
    tokens.insert("LAYER_ARRAYS", layer_arrays(ir));
    tokens.insert("OPERATOR_ARRAYS", operator_arrays(ir));
    tokens.insert("MODULOTOR_ARRAYS", modulotor_arrays(ir));
    tokens.insert("GROUP_ZONE_ARRAYS", group_zone_arrays(ir));
    tokens.insert("STATE_ARRAYS", state_arrays(ir));
    tokens.insert("RULES_DECLS", rules_decls(ir));
    tokens.insert("BEHAVIOR_DISPATCH", behavior_dispatch_fn().to_string());
    tokens.insert("COMPUTE_LAYER_PARAMS", compute_layer_params_fn().to_string());
    tokens.insert("APPLY_LAYER_OPERATORS", apply_operators_fn().to_string());
    tokens.insert("TARGET_CONTAINS", target_contains_fn().to_string());
    tokens.insert("POSTFX_BLOCK", postfx_block(ir));
    tokens.insert("MATRIX_BLOCK", matrix_block(ir));
    tokens.insert("MODULA_USE_SPECTRUM_SHIELD", if use_spectrum_shield { "1".to_string() } else { "0".to_string() });
    tokens.insert("LED_IMPL", pack.led_impl(ir));
    tokens.insert("AUDIO_IMPL", pack.audio_impl(ir));
    tokens.insert("MATRIX_IMPL", pack.matrix_impl(ir));
    substitute(SKETCH_TEMPLATE, &tokens)
}

pub fn required_defs() -> &'static [&'static str] {
    &["NUM_LEDS", "LED_PIN", "LAYERS", "state_reset_layer", "computeLayerParams", "apply_layer_operators"]
}

pub fn no_operator_marker() -> u8 {
    NO_OPERATOR
}
