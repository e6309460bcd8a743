pub mod arduino_uno_fastled_msgeq7;
pub mod esp32_hub75_i2sdma_msgeq7;

use crate::target::TargetRegistry;

/// Populate a registry with the built-in target packs. Callers should treat
/// the registry as frozen once this returns (§5 shared-resource policy).
pub fn register_builtin_targets(registry: &mut TargetRegistry) {
    registry.register(Box::new(arduino_uno_fastled_msgeq7::ArduinoUnoFastledMsgeq7));
    registry.register(Box::new(esp32_hub75_i2sdma_msgeq7::Esp32Hub75I2sDmaMsgeq7));
}
