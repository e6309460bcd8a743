//! Arduino Uno, FastLED driver, MSGEQ7 spectrum-shield audio analyzer.
//! Grounded in `original_source/export/targets/arduino_uno_fastled_msgeq7`.

use crate::lowering::ProjectIr;
use crate::target::{Capabilities, TargetPack};

pub struct ArduinoUnoFastledMsgeq7;

impl TargetPack for ArduinoUnoFastledMsgeq7 {
    fn id(&self) -> &'static str {
        "arduino_uno_fastled_msgeq7"
    }

    fn name(&self) -> &'static str {
        "Arduino Uno (FastLED, MSGEQ7)"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            led_backends: vec!["fastled"],
            audio_backends: vec!["msgeq7", "none"],
            default_led_backend: "fastled",
            default_audio_backend: "none",
            supports_matrix: false,
            supports_postfx_runtime: true,
            supports_operators_runtime: true,
            max_leds_hard: Some(120),
        }
    }

    fn led_impl(&self, _ir: &ProjectIr) -> String {
        r#"#include <FastLED.h>
static CRGB leds[NUM_LEDS];

static void modulo_led_init() {
  FastLED.addLeds<WS2812B, LED_PIN, GRB>(leds, NUM_LEDS);
  FastLED.setBrightness(255);
}

static inline void modulo_led_set(uint16_t i, uint8_t r, uint8_t g, uint8_t b) {
  leds[i] = CRGB(r, g, b);
}

static void modulo_led_show() {
  FastLED.show();
}
"#
        .to_string()
    }

    fn audio_impl(&self, _ir: &ProjectIr) -> String {
        r#"#define MSGEQ7_RESET_PIN 4
#define MSGEQ7_STROBE_PIN 5
#define MSGEQ7_LEFT_PIN A0
#define MSGEQ7_RIGHT_PIN A1

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
    float l = analogRead(MSGEQ7_LEFT_PIN) / 1023.0f;
    float r = analogRead(MSGEQ7_RIGHT_PIN) / 1023.0f;
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

    fn platformio_ini(&self) -> String {
        "[env:uno]\nplatform = atmelavr\nboard = uno\nframework = arduino\nlib_deps = fastled/FastLED\n".to_string()
    }
}
