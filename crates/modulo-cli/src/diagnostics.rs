//! Crash and health reports (§6 persisted state layout), grounded in the
//! original `app/crash_reporter.py`. The panic hook is installed once by
//! `main`; library crates never touch `std::panic::set_hook`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

pub enum HealthLevel {
    Ok,
    Warn,
    Error,
}

impl HealthLevel {
    fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Ok => "OK",
            HealthLevel::Warn => "WARN",
            HealthLevel::Error => "ERROR",
        }
    }
}

pub struct HealthLine {
    pub level: HealthLevel,
    pub area: String,
    pub message: String,
}

fn timestamp() -> String {
    Local::now().format("%Y%m%dT%H%M%S").to_string()
}

/// Writes `health_<ts>.txt` as `OK` (nothing to report) or `level:area:message`
/// lines, one per probe result.
pub fn write_health_report(root: &Path, lines: &[HealthLine]) -> anyhow::Result<PathBuf> {
    let dir = root.join("health_reports");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("health_{}.txt", timestamp()));

    let mut body = String::new();
    if lines.is_empty() {
        body.push_str("OK\n");
    } else {
        for line in lines {
            writeln!(body, "{}:{}:{}", line.level.as_str(), line.area, line.message)?;
        }
    }
    fs::write(&path, body)?;
    Ok(path)
}

/// Writes `crash_<ts>.txt`: free-text diagnostics header, a recent log tail,
/// and the panic/traceback text.
pub fn write_crash_report(root: &Path, diagnostics: &str, log_tail: &[String], traceback: &str) -> anyhow::Result<PathBuf> {
    let dir = root.join("crash_reports");
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("crash_{}.txt", timestamp()));

    let mut body = String::new();
    writeln!(body, "=== diagnostics ===")?;
    writeln!(body, "{diagnostics}")?;
    writeln!(body, "=== recent log ===")?;
    for line in log_tail {
        writeln!(body, "{line}")?;
    }
    writeln!(body, "=== traceback ===")?;
    writeln!(body, "{traceback}")?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Installs a panic hook that writes a crash report before unwinding.
/// Intended for the `modulo-cli` binary only.
pub fn install_panic_hook(root: PathBuf) {
    std::panic::set_hook(Box::new(move |info| {
        let traceback = info.to_string();
        let diagnostics = format!("modulo-cli panic at {}", timestamp());
        if let Err(e) = write_crash_report(&root, &diagnostics, &[], &traceback) {
            log::error!("failed to write crash report: {e}");
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_health_report_says_ok() {
        let dir = std::env::temp_dir().join(format!("modulo_cli_health_{}", std::process::id()));
        let path = write_health_report(&dir, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "OK\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn health_report_formats_level_area_message() {
        let dir = std::env::temp_dir().join(format!("modulo_cli_health2_{}", std::process::id()));
        let lines = vec![HealthLine { level: HealthLevel::Warn, area: "mods".into(), message: "stale manifest".into() }];
        let path = write_health_report(&dir, &lines).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "WARN:mods:stale manifest\n");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn crash_report_contains_all_three_sections() {
        let dir = std::env::temp_dir().join(format!("modulo_cli_crash_{}", std::process::id()));
        let path = write_crash_report(&dir, "diag", &["line one".into()], "boom").unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("diag"));
        assert!(text.contains("line one"));
        assert!(text.contains("boom"));
        let _ = fs::remove_dir_all(&dir);
    }
}
