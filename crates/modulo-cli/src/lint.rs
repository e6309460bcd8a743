//! `lint-no-version-labels` (§6): forbid stray `FIX###`/`STAGE###`/
//! `BUILD###`/`REFAC###` tokens from leaking into source — these are
//! internal tracking labels that should never survive into committed code.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

const PREFIXES: &[&str] = &["FIX", "STAGE", "BUILD", "REFAC"];

pub struct Hit {
    pub path: PathBuf,
    pub line: usize,
    pub token: String,
}

fn token_at(line: &str, prefix: &str) -> Option<String> {
    let bytes = line.as_bytes();
    let prefix_bytes = prefix.as_bytes();
    let plen = prefix_bytes.len();
    let mut i = 0;
    while i + plen <= bytes.len() {
        if &bytes[i..i + plen] == prefix_bytes {
            let mut j = i + plen;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > i + plen {
                // the matched range is prefix bytes + ascii digits, always valid UTF-8
                return Some(std::str::from_utf8(&bytes[i..j]).unwrap().to_string());
            }
        }
        i += 1;
    }
    None
}

fn scan_file(path: &Path, hits: &mut Vec<Hit>) -> Result<()> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return Ok(()),
    };
    for (idx, line) in text.lines().enumerate() {
        for prefix in PREFIXES {
            if let Some(token) = token_at(line, prefix) {
                hits.push(Hit { path: path.to_path_buf(), line: idx + 1, token });
            }
        }
    }
    Ok(())
}

fn walk(dir: &Path, hits: &mut Vec<Hit>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name == "target" || file_name == ".git" || file_name == "examples" {
            continue;
        }
        if entry.file_type()?.is_dir() {
            walk(&path, hits)?;
        } else if path.extension().is_some_and(|e| e == "rs") {
            scan_file(&path, hits)?;
        }
    }
    Ok(())
}

pub fn run(root: &Path) -> Result<Vec<Hit>> {
    let mut hits = Vec::new();
    walk(root, &mut hits)?;
    Ok(hits)
}
