use crate::outputs::error::OutputError;
use crate::outputs::execute::ExecutionOutcome;
use crate::outputs::output_type::OutputType;
use crate::outputs::validate::ValidationError;
use crate::shared::fs_atomic::atomic_write_file;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One reported failure, shared between the structured and text artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportedError {
    pub output_type: String,
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub output_type: OutputType,
    pub executed: usize,
    pub errors: usize,
}

pub fn artifacts_dir(state_root: &Path) -> PathBuf {
    state_root.join("outputs/artifacts")
}

/// Aggregates a batch's counts and, when anything failed, persists the
/// per-type error artifacts in both structured and text form for the audit
/// stage that runs after this engine.
pub fn report_batch(
    state_root: &Path,
    output_type: OutputType,
    validation_errors: &[ValidationError],
    outcomes: &[ExecutionOutcome],
) -> Result<BatchReport, OutputError> {
    let executed = outcomes.iter().filter(|outcome| outcome.succeeded).count();

    let mut entries = Vec::new();
    let mut lines = Vec::new();
    for error in validation_errors {
        entries.push(ReportedError {
            output_type: output_type.as_str().to_string(),
            filename: error.filename.clone(),
            message: error.message.clone(),
        });
        lines.push(error.render());
    }
    for outcome in outcomes.iter().filter(|outcome| !outcome.succeeded) {
        let detail = outcome
            .error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string());
        entries.push(ReportedError {
            output_type: output_type.as_str().to_string(),
            filename: outcome.filename.clone(),
            message: format!("Failed to execute {}: {detail}", outcome.filename),
        });
        lines.push(format!(
            "**{output_type}**: Failed to execute {}: {detail}",
            outcome.filename
        ));
    }

    let errors = entries.len();
    if !entries.is_empty() {
        write_artifacts(state_root, output_type, &entries, &lines)?;
    }

    Ok(BatchReport {
        output_type,
        executed,
        errors,
    })
}

fn write_artifacts(
    state_root: &Path,
    output_type: OutputType,
    entries: &[ReportedError],
    lines: &[String],
) -> Result<(), OutputError> {
    let dir = artifacts_dir(state_root);

    let json_path = dir.join(format!("{output_type}-errors.json"));
    let payload = serde_json::to_vec_pretty(entries).map_err(|source| OutputError::Json {
        path: json_path.display().to_string(),
        source,
    })?;
    atomic_write_file(&json_path, &payload).map_err(|source| OutputError::Artifact {
        path: json_path.display().to_string(),
        source,
    })?;

    let text_path = dir.join(format!("{output_type}-errors.txt"));
    let mut text = lines.join("\n");
    text.push('\n');
    atomic_write_file(&text_path, text.as_bytes()).map_err(|source| OutputError::Artifact {
        path: text_path.display().to_string(),
        source,
    })?;
    Ok(())
}
