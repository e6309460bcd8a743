//! Token substitution and post-render validation for generated artifacts
//! (§4.10 step 8, §6). Token syntax is `@@NAME@@`.

use std::collections::HashMap;

/// Replace every `@@NAME@@` token with its value. Tokens with no entry in
/// `tokens` are left as-is, so `validate_rendered` can catch the omission.
pub fn substitute(template: &str, tokens: &HashMap<&str, String>) -> String {
    let mut out = template.to_string();
    for (name, value) in tokens {
        out = out.replace(&format!("@@{name}@@"), value);
    }
    out
}

/// Fail-loud validation for a rendered artifact: unreplaced `@@TOKEN@@`
/// placeholders, accidental Python-style formatting artifacts left over from
/// a hand-copied template, and the required `MODULO_EXPORT` marker.
pub fn validate_rendered(text: &str, required_defs: &[&str]) -> Vec<String> {
    let mut problems = Vec::new();

    let mut unreplaced: Vec<String> = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while let Some(start) = text[i..].find("@@") {
        let abs_start = i + start;
        if let Some(end) = text[abs_start + 2..].find("@@") {
            let token = &text[abs_start..abs_start + 2 + end + 2];
            if token.len() <= 64 && token[2..token.len() - 2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_') {
                unreplaced.push(token.to_string());
            }
            i = abs_start + 2 + end + 2;
        } else {
            break;
        }
        if i >= bytes.len() {
            break;
        }
    }
    unreplaced.sort();
    unreplaced.dedup();
    if !unreplaced.is_empty() {
        problems.push(format!("unreplaced template tokens: {}", unreplaced.join(", ")));
    }

    let suspicious = ["{engine.", "{len(", "{self.", "{project", "{ir.", "{{", "}}"];
    let found: Vec<&str> = suspicious.iter().copied().filter(|s| text.contains(s)).collect();
    if !found.is_empty() {
        problems.push(format!("suspicious formatting artifacts found: {}", found.join(", ")));
    }

    for placeholder in ["REPLACE_ME", "TODO_TOKEN", "TEMPLATE_TOKEN"] {
        if text.contains(placeholder) {
            problems.push(format!("placeholder '{placeholder}' still present"));
        }
    }

    if !text.contains("MODULO_EXPORT") {
        problems.push("missing MODULO_EXPORT marker".into());
    }

    for def in required_defs {
        if !text.contains(def) {
            problems.push(format!("missing required definition '{def}'"));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_tokens() {
        let mut tokens = HashMap::new();
        tokens.insert("NUM_LEDS", "60".to_string());
        let out = substitute("#define NUM_LEDS @@NUM_LEDS@@", &tokens);
        assert_eq!(out, "#define NUM_LEDS 60");
    }

    #[test]
    fn unreplaced_token_is_flagged() {
        let probs = validate_rendered("// MODULO_EXPORT\n@@LED_IMPL@@", &[]);
        assert!(probs.iter().any(|p| p.contains("LED_IMPL")));
    }

    #[test]
    fn missing_marker_is_flagged() {
        let probs = validate_rendered("int x = 0;", &[]);
        assert!(probs.iter().any(|p| p.contains("MODULO_EXPORT")));
    }

    #[test]
    fn clean_render_with_required_defs_passes() {
        let probs = validate_rendered("// MODULO_EXPORT\n#define NUM_LEDS 10\n", &["NUM_LEDS"]);
        assert!(probs.is_empty());
    }
}
