//! ESP32, HUB75 RGB matrix panel over I2S DMA, MSGEQ7 audio analyzer.
//! Grounded in `original_source/export/targets/esp32_hub75_i2sdma_msgeq7`.

use crate::lowering::ProjectIr;
use crate::target::{Capabilities, TargetPack};

pub struct Esp32Hub75I2sDmaMsgeq7;

impl TargetPack for Esp32Hub75I2sDmaMsgeq7 {
    fn id(&self) -> &'static str {
        "esp32_hub75_i2sdma_msgeq7"
    }

    fn name(&self) -> &'static str {
        "ESP32 (HUB75 I2S DMA, MSGEQ7)"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            led_backends: vec!["hub75_i2sdma"],
            audio_backends: vec!["msgeq7", "none"],
            default_led_backend: "hub75_i2sdma",
            default_audio_backend: "none",
            supports_matrix: true,
            supports_postfx_runtime: true,
            supports_operators_runtime: true,
            max_leds_hard: None,
        }
    }

    fn led_impl(&self, ir: &ProjectIr) -> String {
        let (w, h) = ir.matrix.as_ref().map(|m| (m.width, m.height)).unwrap_or((64, 32));
        format!(
            r#"#include <ESP32-HUB75-MatrixPanel-I2S-DMA.h>
static MatrixPanel_I2S_DMA *dma_display = nullptr;

static void modulo_led_init() {{
  HUB75_I2S_CFG cfg({w}, {h}, 1);
  dma_display = new MatrixPanel_I2S_DMA(cfg);
  dma_display->begin();
  dma_display->setBrightness8(255);
}}

static inline void modulo_led_set(uint16_t i, uint8_t r, uint8_t g, uint8_t b) {{
  uint16_t idx = modulo_map_index(i);
  uint16_t x = idx % {w};
  uint16_t y = idx / {w};
  dma_display->drawPixelRGB888(x, y, r, g, b);
}}

static void modulo_led_show() {{
}}
"#,
            w = w,
            h = h,
        )
    }

    fn audio_impl(&self, _ir: &ProjectIr) -> String {
        r#"#define MSGEQ7_RESET_PIN 32
#define MSGEQ7_STROBE_PIN 33
#define MSGEQ7_LEFT_PIN 34
#define MSGEQ7_RIGHT_PIN 35

static float g_energy = 0.0f;
static float g_peak = 0.0f;
static float g_mono[7];
static float g_left[7];
static float g_right[7];

static void msgeq7_setup() {
  pinMode(MSGEQ7_RESET_PIN, OUTPUT);
  pinMode(MSGEQ7_STROBE_PIN, OUTPUT);
  digitalWrite(MSGEQ7_RESET_PIN, LOW);
  digitalWrite(MSGEQ7_STROBE_PIN, HIGH);
}

static void msgeq7_read() {
  digitalWrite(MSGEQ7_RESET_PIN, HIGH);
  digitalWrite(MSGEQ7_RESET_PIN, LOW);
  float sum = 0.0f;
  for (uint8_t band = 0; band < 7; band++) {
    digitalWrite(MSGEQ7_STROBE_PIN, LOW);
    delayMicroseconds(30);
    float l = analogRead(MSGEQ7_LEFT_PIN) / 4095.0f;
    float r = analogRead(MSGEQ7_RIGHT_PIN) / 4095.0f;
    digitalWrite(MSGEQ7_STROBE_PIN, HIGH);
    g_left[band] = l;
    g_right[band] = r;
    g_mono[band] = (l + r) * 0.5f;
    sum += g_mono[band];
  }
  g_energy = sum / 7.0f;
  g_peak = g_energy > g_peak ? g_energy : g_peak * 0.95f;
}
"#
        .to_string()
    }

    fn matrix_impl(&self, ir: &ProjectIr) -> String {
        let m = match &ir.matrix {
            Some(m) => m,
            None => return String::new(),
        };
        let serpentine = if m.serpentine { 1 } else { 0 };
        let flip_x = if m.flip_x { 1 } else { 0 };
        let flip_y = if m.flip_y { 1 } else { 0 };
        format!(
            r#"static inline uint16_t XY(uint16_t x, uint16_t y) {{
  return y * MATRIX_WIDTH + x;
}}

static uint16_t modulo_map_index(uint16_t i) {{
  uint16_t x = i % MATRIX_WIDTH;
  uint16_t y = i / MATRIX_WIDTH;
#if {serpentine}
  if (y % 2 == 1) x = MATRIX_WIDTH - 1 - x;
#endif
#if {flip_x}
  x = MATRIX_WIDTH - 1 - x;
#endif
#if {flip_y}
  y = MATRIX_HEIGHT - 1 - y;
#endif
  return XY(x, y);
}}
"#,
            serpentine = serpentine,
            flip_x = flip_x,
            flip_y = flip_y,
        )
    }

    fn platformio_ini(&self) -> String {
        "[env:esp32]\nplatform = espressif32\nboard = esp32dev\nframework = arduino\nlib_deps = mrfaptastic/ESP32 HUB75 LED MATRIX PANEL DMA Display\n".to_string()
    }
}
