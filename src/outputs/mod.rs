pub mod batch;
pub mod error;
pub mod execute;
pub mod glob;
pub mod loader;
pub mod output_type;
pub mod report;
pub mod validate;

pub use batch::{validate_batch, BatchValidation};
pub use error::OutputError;
pub use execute::{execute_batch, ExecutionOutcome};
pub use loader::{discover, OutputRecord};
pub use output_type::{OutputType, ALL_OUTPUT_TYPES};
pub use report::{report_batch, BatchReport, ReportedError};
pub use validate::{ValidationContext, ValidationError};

use crate::config::AgentConfig;
use crate::event::ExecutionContext;
use crate::forge::ForgeGateway;
use crate::shared::logging::append_outputs_log_line;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
    Execute,
    /// Validation only; no gateway mutations are issued.
    CheckOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageResult {
    pub executed: usize,
    pub errors: usize,
}

pub struct StageParams<'a> {
    pub gateway: &'a dyn ForgeGateway,
    pub agent: &'a AgentConfig,
    pub context: &'a ExecutionContext,
    pub output_dir: &'a Path,
    pub state_root: &'a Path,
    pub mode: StageMode,
}

/// Runs the loader → validator → gate → executor → reporter pipeline for
/// one declared output type, or for every enabled type when none is given.
/// Each type is its own independent atomic batch.
pub fn run_outputs_stage(
    params: &StageParams,
    requested: Option<OutputType>,
) -> Result<StageResult, OutputError> {
    match requested {
        Some(output_type) => process_type(params, output_type),
        None => {
            let mut total = StageResult::default();
            for output_type in params.agent.enabled_types() {
                let result = process_type(params, output_type)?;
                total.executed += result.executed;
                total.errors += result.errors;
            }
            Ok(total)
        }
    }
}

fn process_type(params: &StageParams, output_type: OutputType) -> Result<StageResult, OutputError> {
    let records = loader::discover(params.output_dir, output_type)?;
    if records.is_empty() {
        return Ok(StageResult::default());
    }

    let Some(type_config) = params.agent.output_config(output_type) else {
        let error = ValidationError {
            output_type,
            filename: String::new(),
            message: "output type is not enabled for this agent".to_string(),
        };
        let report = report::report_batch(params.state_root, output_type, &[error], &[])?;
        log_batch(params, output_type, records.len(), &report);
        return Ok(StageResult {
            executed: 0,
            errors: report.errors,
        });
    };

    // Existence lists are fetched once per batch; a failed listing means
    // the checker is unavailable and the reference rules are skipped.
    let known_labels = if needs_label_check(output_type) {
        params.gateway.list_labels().ok()
    } else {
        None
    };
    let known_categories = if output_type == OutputType::CreateDiscussion {
        params.gateway.list_discussion_categories().ok().map(|all| {
            all.into_iter()
                .map(|category| category.name)
                .collect::<Vec<_>>()
        })
    } else {
        None
    };
    let ctx = ValidationContext {
        agent: params.agent,
        known_labels: known_labels.as_deref(),
        known_categories: known_categories.as_deref(),
    };

    let validation = batch::validate_batch(&ctx, output_type, &records, type_config);
    if !validation.valid {
        let report = report::report_batch(params.state_root, output_type, &validation.errors, &[])?;
        log_batch(params, output_type, records.len(), &report);
        return Ok(StageResult {
            executed: 0,
            errors: report.errors,
        });
    }

    let outcomes = match params.mode {
        StageMode::CheckOnly => Vec::new(),
        StageMode::Execute => {
            execute::execute_batch(params.gateway, params.context, type_config, &records)
        }
    };
    let report = report::report_batch(params.state_root, output_type, &[], &outcomes)?;
    log_batch(params, output_type, records.len(), &report);
    Ok(StageResult {
        executed: report.executed,
        errors: report.errors,
    })
}

fn needs_label_check(output_type: OutputType) -> bool {
    matches!(output_type, OutputType::AddLabel | OutputType::CreateIssue)
}

fn log_batch(params: &StageParams, output_type: OutputType, discovered: usize, report: &BatchReport) {
    append_outputs_log_line(
        params.state_root,
        &format!(
            "type={output_type} discovered={discovered} executed={} errors={}",
            report.executed, report.errors
        ),
    );
}
