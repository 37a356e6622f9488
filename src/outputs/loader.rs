use crate::outputs::error::OutputError;
use crate::outputs::output_type::OutputType;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// One discovered output declaration file, parsed leniently: a JSON parse
/// failure is carried on the record and surfaces through validation instead
/// of aborting discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub output_type: OutputType,
    pub filename: String,
    pub fields: Map<String, Value>,
    pub parse_error: Option<String>,
}

impl OutputRecord {
    pub fn parsed(output_type: OutputType, filename: &str, fields: Map<String, Value>) -> Self {
        Self {
            output_type,
            filename: filename.to_string(),
            fields,
            parse_error: None,
        }
    }

    pub fn unparsable(output_type: OutputType, filename: &str, error: String) -> Self {
        Self {
            output_type,
            filename: filename.to_string(),
            fields: Map::new(),
            parse_error: Some(error),
        }
    }
}

/// Discovers `<type>.json` and `<type>-<n>.json` files in `output_dir`,
/// sorted by filename. A missing directory is an empty batch.
pub fn discover(
    output_dir: &Path,
    output_type: OutputType,
) -> Result<Vec<OutputRecord>, OutputError> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(output_dir).map_err(|source| OutputError::Discover {
        path: output_dir.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| OutputError::Discover {
            path: output_dir.display().to_string(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !is_candidate_filename(name, output_type.as_str()) {
            continue;
        }
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let raw = fs::read_to_string(&path).map_err(|source| OutputError::ReadRecord {
            path: path.display().to_string(),
            source,
        })?;
        records.push(parse_record(output_type, name, &raw));
    }

    records.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(records)
}

fn parse_record(output_type: OutputType, filename: &str, raw: &str) -> OutputRecord {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => OutputRecord::parsed(output_type, filename, fields),
        Ok(_) => OutputRecord::unparsable(
            output_type,
            filename,
            "output file must contain a JSON object".to_string(),
        ),
        Err(err) => OutputRecord::unparsable(output_type, filename, err.to_string()),
    }
}

fn is_candidate_filename(name: &str, type_id: &str) -> bool {
    let Some(rest) = name.strip_prefix(type_id) else {
        return false;
    };
    let Some(middle) = rest.strip_suffix(".json") else {
        return false;
    };
    if middle.is_empty() {
        return true;
    }
    let Some(digits) = middle.strip_prefix('-') else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}
