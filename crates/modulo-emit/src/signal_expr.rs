//! Signal key -> Arduino C++ expression map (§4.10 step 3). Single source of
//! truth for the variables the `@@AUDIO_IMPL@@`/`@@MATRIX_IMPL@@` blocks
//! declare. Unknown signals compile to `0.0f`, never a compile error.

/// Audio variables the generated sketch declares when spectrum-shield audio
/// is enabled: `g_energy`, `g_mono[7]`, `g_left[7]`, `g_right[7]`.
pub fn arduino_expr_for_signal(key: &str) -> Option<String> {
    let k = key.trim();
    if k.is_empty() {
        return None;
    }
    if k == "audio.energy" {
        return Some("g_energy".into());
    }
    if let Some(idx) = band_index(k, "audio.mono") {
        return Some(format!("g_mono[{idx}]"));
    }
    if let Some(idx) = band_index(k, "audio.L") {
        return Some(format!("g_left[{idx}]"));
    }
    if let Some(idx) = band_index(k, "audio.R") {
        return Some(format!("g_right[{idx}]"));
    }
    None
}

/// Compile a signal expression for literal inlining, falling back to `0.0f`
/// for anything the firmware doesn't expose (rules, modulotors both use this).
pub fn arduino_expr_or_zero(key: &str) -> String {
    arduino_expr_for_signal(key).unwrap_or_else(|| "0.0f".to_string())
}

fn band_index(key: &str, prefix: &str) -> Option<u8> {
    let rest = key.strip_prefix(prefix)?;
    let idx: u8 = rest.parse().ok()?;
    (idx <= 6).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_and_bands_resolve() {
        assert_eq!(arduino_expr_for_signal("audio.energy"), Some("g_energy".into()));
        assert_eq!(arduino_expr_for_signal("audio.mono3"), Some("g_mono[3]".into()));
        assert_eq!(arduino_expr_for_signal("audio.L0"), Some("g_left[0]".into()));
        assert_eq!(arduino_expr_for_signal("audio.R6"), Some("g_right[6]".into()));
    }

    #[test]
    fn out_of_range_band_is_unknown() {
        assert_eq!(arduino_expr_for_signal("audio.mono7"), None);
    }

    #[test]
    fn unknown_signal_falls_back_to_zero_literal() {
        assert_eq!(arduino_expr_or_zero("vars.number.whatever"), "0.0f");
    }
}
