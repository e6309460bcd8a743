//! `golden-exports` (§6 CLI surface): regenerate fixture sketches, compare
//! against `golden_exports.json`. Exit 0 on match, 1 on mismatch (with diff
//! hints under `parity_reports/golden_mismatch/`), 2 when the file is
//! missing entirely.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use modulo_behaviors::{catalog::register_builtins, registry::BehaviorRegistry};
use modulo_emit::targets::register_builtin_targets;
use modulo_emit::{codegen, lowering, TargetRegistry};

use crate::fixtures;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Excerpt {
    pub head: String,
    pub tail: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fixture {
    pub ino_sha256: String,
    pub ino_bytes: usize,
    pub ino_excerpt: Excerpt,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GoldenFile {
    pub fixtures: BTreeMap<String, Fixture>,
}

const EXCERPT_LINES: usize = 5;

fn excerpt(text: &str) -> Excerpt {
    let lines: Vec<&str> = text.lines().collect();
    let head = lines.iter().take(EXCERPT_LINES).cloned().collect::<Vec<_>>().join("\n");
    let tail = lines.iter().rev().take(EXCERPT_LINES).rev().cloned().collect::<Vec<_>>().join("\n");
    Excerpt { head, tail, line_count: lines.len() }
}

fn fixture_from_text(text: &str) -> Fixture {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let ino_sha256 = format!("{:x}", hasher.finalize());
    Fixture { ino_sha256, ino_bytes: text.len(), ino_excerpt: excerpt(text) }
}

/// Renders every fixture project through lowering + codegen directly
/// (no filesystem write, no artifact validation detour) so the comparison
/// is purely about emitter output drift.
pub fn regenerate() -> Result<GoldenFile> {
    let mut registry = BehaviorRegistry::new();
    register_builtins(&mut registry).context("registering builtin behaviors")?;
    let mut targets = TargetRegistry::new();
    register_builtin_targets(&mut targets);

    let mut fixtures = BTreeMap::new();
    for (name, project) in fixtures::all() {
        let pack = targets.get(&project.export.target_id)?;
        let ir = lowering::lower(&project, &registry).with_context(|| format!("lowering fixture '{name}'"))?;
        let use_spectrum_shield = project.export.audio_backend.as_deref() == Some("msgeq7");
        let text = codegen::generate_sketch(&ir, pack, use_spectrum_shield);
        fixtures.insert(name.to_string(), fixture_from_text(&text));
    }
    Ok(GoldenFile { fixtures })
}

pub enum Outcome {
    Match,
    Mismatch(Vec<String>),
    Missing,
}

pub fn compare(fixtures_path: &Path) -> Result<Outcome> {
    let current = regenerate()?;
    if !fixtures_path.exists() {
        return Ok(Outcome::Missing);
    }
    let recorded: GoldenFile = serde_json::from_str(&fs::read_to_string(fixtures_path)?)?;

    let mut diffs = Vec::new();
    for (name, fixture) in &current.fixtures {
        match recorded.fixtures.get(name) {
            None => diffs.push(format!("{name}: no recorded fixture")),
            Some(recorded_fixture) if recorded_fixture != fixture => {
                diffs.push(format!(
                    "{name}: sha256 {} != {} ({} bytes vs {} bytes)",
                    fixture.ino_sha256, recorded_fixture.ino_sha256, fixture.ino_bytes, recorded_fixture.ino_bytes
                ));
            }
            Some(_) => {}
        }
    }
    for name in recorded.fixtures.keys() {
        if !current.fixtures.contains_key(name) {
            diffs.push(format!("{name}: recorded but no longer generated"));
        }
    }

    if diffs.is_empty() {
        Ok(Outcome::Match)
    } else {
        Ok(Outcome::Mismatch(diffs))
    }
}

pub fn write_fixtures(fixtures_path: &Path, golden: &GoldenFile) -> Result<()> {
    if let Some(parent) = fixtures_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(fixtures_path, serde_json::to_string_pretty(golden)?)?;
    Ok(())
}

pub fn write_mismatch_report(root: &Path, diffs: &[String]) -> Result<std::path::PathBuf> {
    let dir = root.join("parity_reports").join("golden_mismatch");
    fs::create_dir_all(&dir)?;
    let path = dir.join("mismatch.diff");
    fs::write(&path, diffs.join("\n"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_produces_one_fixture_per_project() {
        let golden = regenerate().unwrap();
        assert_eq!(golden.fixtures.len(), fixtures::all().len());
    }

    #[test]
    fn excerpt_captures_head_tail_and_line_count() {
        let text = (1..=20).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n");
        let e = excerpt(&text);
        assert!(e.head.starts_with("line 1\n"));
        assert!(e.tail.ends_with("line 20"));
        assert_eq!(e.line_count, 20);
    }

    #[test]
    fn identical_json_round_trip_matches() {
        let dir = std::env::temp_dir().join(format!("modulo_cli_golden_{}", std::process::id()));
        let path = dir.join("golden_exports.json");
        let golden = regenerate().unwrap();
        write_fixtures(&path, &golden).unwrap();
        assert!(matches!(compare(&path).unwrap(), Outcome::Match));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_reported_as_missing() {
        let path = std::env::temp_dir().join("modulo_cli_golden_never_written.json");
        let _ = fs::remove_file(&path);
        assert!(matches!(compare(&path).unwrap(), Outcome::Missing));
    }
}
