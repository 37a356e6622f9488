use crate::config::OutputTypeConfig;
use crate::event::ExecutionContext;
use crate::forge::{CommitFile, ForgeError, ForgeGateway};
use crate::outputs::error::OutputError;
use crate::outputs::loader::OutputRecord;
use crate::outputs::output_type::OutputType;
use serde_json::Value;

const LABEL_UPDATE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub filename: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

/// Runs every file of an already-validated batch. A failing file becomes a
/// failed outcome; its siblings still run.
pub fn execute_batch(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    type_config: &OutputTypeConfig,
    records: &[OutputRecord],
) -> Vec<ExecutionOutcome> {
    records
        .iter()
        .map(
            |record| match execute_record(gateway, ctx, type_config, record) {
                Ok(()) => ExecutionOutcome {
                    filename: record.filename.clone(),
                    succeeded: true,
                    error: None,
                },
                Err(err) => ExecutionOutcome {
                    filename: record.filename.clone(),
                    succeeded: false,
                    error: Some(err.to_string()),
                },
            },
        )
        .collect()
}

fn execute_record(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    type_config: &OutputTypeConfig,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    match record.output_type {
        OutputType::AddComment => execute_add_comment(gateway, ctx, record),
        OutputType::AddLabel => execute_label_delta(gateway, ctx, record, LabelOp::Add),
        OutputType::RemoveLabel => execute_label_delta(gateway, ctx, record, LabelOp::Remove),
        OutputType::CreateIssue => execute_create_issue(gateway, ctx, record),
        OutputType::CreateDiscussion => execute_create_discussion(gateway, ctx, record),
        OutputType::CreatePr => execute_create_pr(gateway, ctx, type_config, record),
        OutputType::UpdateFile => execute_update_file(gateway, record),
        OutputType::CloseIssue => execute_close_issue(gateway, ctx, record),
        OutputType::ClosePr => execute_close_pr(gateway, ctx, record),
    }
}

fn execute_add_comment(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let number = require_issue_number(ctx, record)?;
    let body = require_string(record, "body")?;
    gateway.post_comment(number, &with_attribution(ctx, body))?;
    Ok(())
}

#[derive(Clone, Copy)]
enum LabelOp {
    Add,
    Remove,
}

/// Read-merge-write on the issue's label set, conditional on the set still
/// being what was read. A conflicting concurrent writer triggers a re-read,
/// bounded by `LABEL_UPDATE_ATTEMPTS`.
fn execute_label_delta(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    record: &OutputRecord,
    op: LabelOp,
) -> Result<(), OutputError> {
    let number = require_issue_number(ctx, record)?;
    let declared = require_labels(record)?;
    for _ in 0..LABEL_UPDATE_ATTEMPTS {
        let current = gateway.issue_labels(number)?;
        let next = match op {
            LabelOp::Add => {
                let mut next = current.clone();
                for label in &declared {
                    if !next.contains(label) {
                        next.push(label.clone());
                    }
                }
                next
            }
            LabelOp::Remove => current
                .iter()
                .filter(|label| !declared.contains(label))
                .cloned()
                .collect(),
        };
        match gateway.replace_labels(number, &next, &current) {
            Ok(()) => return Ok(()),
            Err(ForgeError::Conflict) => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(OutputError::LabelConflict {
        number,
        attempts: LABEL_UPDATE_ATTEMPTS,
    })
}

fn execute_create_issue(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let title = require_string(record, "title")?;
    let body = require_string(record, "body")?;
    let labels = optional_labels(record);
    gateway.create_issue(title, &with_attribution(ctx, body), &labels)?;
    Ok(())
}

fn execute_create_discussion(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let title = require_string(record, "title")?;
    let body = require_string(record, "body")?;
    let category = require_string(record, "category")?;
    let categories = gateway.list_discussion_categories()?;
    let category_id = categories
        .iter()
        .find(|candidate| candidate.name == category)
        .map(|candidate| candidate.id.clone())
        .ok_or_else(|| OutputError::UnknownCategory {
            category: category.to_string(),
        })?;
    let repository_id = gateway.repository_id()?;
    gateway.create_discussion(
        &repository_id,
        &category_id,
        title,
        &with_attribution(ctx, body),
    )?;
    Ok(())
}

/// Idempotent by branch name: an existing open PR makes the whole operation
/// a no-op. Otherwise any stale branch is deleted and recreated from the
/// default branch head before the declared files are committed and pushed.
fn execute_create_pr(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    type_config: &OutputTypeConfig,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let branch = require_string(record, "branch")?;
    if gateway.find_open_pull_by_branch(branch)?.is_some() {
        return Ok(());
    }
    let title = require_string(record, "title")?;
    let body = require_string(record, "body")?;
    let files = require_files(record)?;

    let default = gateway.default_branch()?;
    if gateway.branch_exists(branch)? {
        gateway.delete_branch(branch)?;
    }
    gateway.create_branch(branch, &default.sha)?;
    gateway.commit_files(branch, &files, title, type_config.sign)?;
    gateway.open_pull(branch, &default.name, title, &with_attribution(ctx, body))?;
    Ok(())
}

/// Update-or-create per declared file, keyed by the current remote revision
/// so the forge can reject conflicting concurrent writes.
fn execute_update_file(
    gateway: &dyn ForgeGateway,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let files = require_files(record)?;
    let message = require_string(record, "message")?;
    for file in &files {
        let revision = gateway.file_revision(&file.path)?;
        gateway.put_file(&file.path, &file.content, message, revision.as_deref())?;
    }
    Ok(())
}

fn execute_close_issue(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let number = require_issue_number(ctx, record)?;
    let state_reason = record
        .fields
        .get("state_reason")
        .and_then(Value::as_str)
        .map(str::to_string);
    gateway.close_issue(number, state_reason.as_deref())?;
    Ok(())
}

fn execute_close_pr(
    gateway: &dyn ForgeGateway,
    ctx: &ExecutionContext,
    record: &OutputRecord,
) -> Result<(), OutputError> {
    let number = require_issue_number(ctx, record)?;
    let merge = record
        .fields
        .get("merge")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if merge {
        gateway.merge_pull(number)?;
    } else {
        gateway.close_pull(number)?;
    }
    Ok(())
}

fn require_issue_number(
    ctx: &ExecutionContext,
    record: &OutputRecord,
) -> Result<u64, OutputError> {
    ctx.issue_number.ok_or(OutputError::MissingIssueNumber {
        output_type: record.output_type,
    })
}

fn require_string<'a>(record: &'a OutputRecord, field: &str) -> Result<&'a str, OutputError> {
    record
        .fields
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| OutputError::MissingField {
            filename: record.filename.clone(),
            field: field.to_string(),
        })
}

fn require_labels(record: &OutputRecord) -> Result<Vec<String>, OutputError> {
    match record.fields.get("labels") {
        Some(Value::Array(entries)) => Ok(entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()),
        _ => Err(OutputError::MissingField {
            filename: record.filename.clone(),
            field: "labels".to_string(),
        }),
    }
}

fn optional_labels(record: &OutputRecord) -> Vec<String> {
    match record.fields.get("labels") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn require_files(record: &OutputRecord) -> Result<Vec<CommitFile>, OutputError> {
    match record.fields.get("files") {
        Some(Value::Array(entries)) => Ok(entries
            .iter()
            .filter_map(|entry| {
                let object = entry.as_object()?;
                Some(CommitFile {
                    path: object.get("path")?.as_str()?.to_string(),
                    content: object.get("content")?.as_str()?.to_string(),
                })
            })
            .collect()),
        _ => Err(OutputError::MissingField {
            filename: record.filename.clone(),
            field: "files".to_string(),
        }),
    }
}

fn attribution_footer(ctx: &ExecutionContext) -> String {
    let mut footer = String::from("\n\n---\n*Generated by agent ");
    match &ctx.agent_ref {
        Some(agent_ref) => footer.push_str(&format!("[`{}`]({agent_ref})", ctx.agent_id)),
        None => footer.push_str(&format!("`{}`", ctx.agent_id)),
    }
    if let Some(run_url) = &ctx.run_url {
        footer.push_str(&format!(" for [this run]({run_url})"));
    }
    footer.push('*');
    footer
}

fn with_attribution(ctx: &ExecutionContext, body: &str) -> String {
    format!("{body}{}", attribution_footer(ctx))
}
