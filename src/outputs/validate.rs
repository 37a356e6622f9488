use crate::config::AgentConfig;
use crate::outputs::glob;
use crate::outputs::loader::OutputRecord;
use crate::outputs::output_type::OutputType;
use serde_json::{Map, Value};

pub const MAX_COMMENT_CHARS: usize = 65536;
pub const MAX_TITLE_CHARS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub output_type: OutputType,
    pub filename: String,
    pub message: String,
}

impl ValidationError {
    pub fn render(&self) -> String {
        if self.filename.is_empty() {
            format!("**{}**: {}", self.output_type, self.message)
        } else {
            format!("**{}**: {} in {}", self.output_type, self.message, self.filename)
        }
    }
}

/// Inputs the per-type rules consult. The label/category lists are `None`
/// when the existence checker was unreachable; the reference rules are then
/// skipped and hard failures deferred to execution time.
pub struct ValidationContext<'a> {
    pub agent: &'a AgentConfig,
    pub known_labels: Option<&'a [String]>,
    pub known_categories: Option<&'a [String]>,
}

pub type ValidatorFn = fn(&ValidationContext, &OutputRecord) -> Vec<ValidationError>;

const VALIDATORS: [(OutputType, ValidatorFn); 9] = [
    (OutputType::AddComment, validate_add_comment),
    (OutputType::AddLabel, validate_add_label),
    (OutputType::RemoveLabel, validate_remove_label),
    (OutputType::CreateIssue, validate_create_issue),
    (OutputType::CreateDiscussion, validate_create_discussion),
    (OutputType::CreatePr, validate_create_pr),
    (OutputType::UpdateFile, validate_update_file),
    (OutputType::CloseIssue, validate_close_issue),
    (OutputType::ClosePr, validate_close_pr),
];

pub fn validator_for(output_type: OutputType) -> ValidatorFn {
    for (candidate, validator) in VALIDATORS {
        if candidate == output_type {
            return validator;
        }
    }
    validate_nothing
}

/// All rule failures for one record; a parse failure short-circuits the
/// per-type rules since there are no fields to inspect.
pub fn validate_record(ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    if let Some(parse_error) = &record.parse_error {
        return vec![ValidationError {
            output_type: record.output_type,
            filename: record.filename.clone(),
            message: format!("invalid JSON: {parse_error}"),
        }];
    }
    validator_for(record.output_type)(ctx, record)
}

struct ErrorSink<'a> {
    record: &'a OutputRecord,
    errors: Vec<ValidationError>,
}

impl<'a> ErrorSink<'a> {
    fn new(record: &'a OutputRecord) -> Self {
        Self {
            record,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, message: String) {
        self.errors.push(ValidationError {
            output_type: self.record.output_type,
            filename: self.record.filename.clone(),
            message,
        });
    }
}

fn field_string<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(format!("{key} is required")),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(format!("{key} must be a string")),
    }
}

fn optional_field_string<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(format!("{key} must be a string")),
    }
}

/// Well-formed string entries of the `labels` array; every malformation is
/// reported through the sink.
fn collect_labels(sink: &mut ErrorSink, required: bool) -> Vec<String> {
    match sink.record.fields.get("labels") {
        None | Some(Value::Null) => {
            if required {
                sink.push("labels is required".to_string());
            }
            Vec::new()
        }
        Some(Value::Array(entries)) => {
            if entries.is_empty() && required {
                sink.push("labels must be a non-empty array".to_string());
            }
            let mut labels = Vec::new();
            let mut malformed = false;
            for entry in entries {
                match entry {
                    Value::String(label) => labels.push(label.clone()),
                    _ => malformed = true,
                }
            }
            if malformed {
                sink.push("labels must contain only strings".to_string());
            }
            labels
        }
        Some(_) => {
            sink.push("labels must be an array".to_string());
            Vec::new()
        }
    }
}

fn check_labels_exist(sink: &mut ErrorSink, ctx: &ValidationContext, labels: &[String]) {
    let Some(known) = ctx.known_labels else {
        return;
    };
    for label in labels {
        if !known.iter().any(|candidate| candidate == label) {
            sink.push(format!("label `{label}` does not exist in the repository"));
        }
    }
}

/// Well-formed `{path, content}` entries of the `files` array.
fn collect_files(sink: &mut ErrorSink) -> Vec<(String, String)> {
    match sink.record.fields.get("files") {
        None | Some(Value::Null) => {
            sink.push("files is required".to_string());
            Vec::new()
        }
        Some(Value::Array(entries)) => {
            if entries.is_empty() {
                sink.push("files must be a non-empty array".to_string());
            }
            let mut files = Vec::new();
            for (index, entry) in entries.iter().enumerate() {
                let Some(object) = entry.as_object() else {
                    sink.push(format!("files[{index}] must be an object"));
                    continue;
                };
                let path = object.get("path").and_then(Value::as_str);
                let content = object.get("content").and_then(Value::as_str);
                match (path, content) {
                    (Some(path), Some(content)) => {
                        files.push((path.to_string(), content.to_string()));
                    }
                    _ => sink.push(format!(
                        "files[{index}] requires string `path` and `content`"
                    )),
                }
            }
            files
        }
        Some(_) => {
            sink.push("files must be an array".to_string());
            Vec::new()
        }
    }
}

fn check_title(sink: &mut ErrorSink) {
    match field_string(&sink.record.fields, "title") {
        Ok(title) => {
            if title.chars().count() > MAX_TITLE_CHARS {
                sink.push(format!("title exceeds {MAX_TITLE_CHARS} characters"));
            }
        }
        Err(message) => sink.push(message),
    }
}

fn check_body(sink: &mut ErrorSink) {
    if let Err(message) = field_string(&sink.record.fields, "body") {
        sink.push(message);
    }
}

fn validate_nothing(_ctx: &ValidationContext, _record: &OutputRecord) -> Vec<ValidationError> {
    Vec::new()
}

fn validate_add_comment(_ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    match field_string(&record.fields, "body") {
        Ok(body) => {
            if body.chars().count() > MAX_COMMENT_CHARS {
                sink.push(format!("body exceeds {MAX_COMMENT_CHARS} characters"));
            }
        }
        Err(message) => sink.push(message),
    }
    sink.errors
}

fn validate_add_label(ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    let labels = collect_labels(&mut sink, true);
    check_labels_exist(&mut sink, ctx, &labels);
    sink.errors
}

fn validate_remove_label(_ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    collect_labels(&mut sink, true);
    sink.errors
}

fn validate_create_issue(ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    check_title(&mut sink);
    check_body(&mut sink);
    let labels = collect_labels(&mut sink, false);
    check_labels_exist(&mut sink, ctx, &labels);
    sink.errors
}

fn validate_create_discussion(
    ctx: &ValidationContext,
    record: &OutputRecord,
) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    check_title(&mut sink);
    check_body(&mut sink);
    match field_string(&record.fields, "category") {
        Ok(category) => {
            if let Some(known) = ctx.known_categories {
                if !known.iter().any(|candidate| candidate == category) {
                    sink.push(format!(
                        "discussion category `{category}` does not exist in the repository"
                    ));
                }
            }
        }
        Err(message) => sink.push(message),
    }
    sink.errors
}

fn branch_name_is_valid(branch: &str) -> bool {
    !branch.is_empty()
        && branch.chars().all(|ch| {
            ch.is_ascii_alphanumeric() || ch == '/' || ch == '_' || ch == '.' || ch == '-'
        })
}

fn validate_create_pr(_ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    match field_string(&record.fields, "branch") {
        Ok(branch) => {
            if !branch_name_is_valid(branch) {
                sink.push(
                    "branch may only contain ASCII letters, digits, '/', '_', '.', '-'"
                        .to_string(),
                );
            }
        }
        Err(message) => sink.push(message),
    }
    check_title(&mut sink);
    check_body(&mut sink);
    collect_files(&mut sink);
    sink.errors
}

fn validate_update_file(ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    let files = collect_files(&mut sink);
    for (path, _) in &files {
        if !glob::matches_any(path, &ctx.agent.allowed_paths) {
            sink.push(format!("file path `{path}` does not match allowed patterns"));
        }
    }
    if let Err(message) = field_string(&record.fields, "message") {
        sink.push(message);
    }
    sink.errors
}

fn validate_close_issue(_ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    match optional_field_string(&record.fields, "state_reason") {
        Ok(Some(reason)) if reason != "completed" && reason != "not_planned" => {
            sink.push("state_reason must be `completed` or `not_planned`".to_string());
        }
        Ok(_) => {}
        Err(message) => sink.push(message),
    }
    sink.errors
}

fn validate_close_pr(_ctx: &ValidationContext, record: &OutputRecord) -> Vec<ValidationError> {
    let mut sink = ErrorSink::new(record);
    match record.fields.get("merge") {
        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
        Some(_) => sink.push("merge must be a boolean".to_string()),
    }
    sink.errors
}
