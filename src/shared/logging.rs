use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn outputs_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/outputs.log")
}

/// Best-effort append; logging never fails the stage that called it.
pub fn append_outputs_log_line(state_root: &Path, line: &str) {
    let path = outputs_log_path(state_root);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let _ = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| writeln!(file, "{stamp} {line}"));
}
