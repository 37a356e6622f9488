use crate::config::OutputTypeConfig;
use crate::outputs::loader::OutputRecord;
use crate::outputs::output_type::OutputType;
use crate::outputs::validate::{validate_record, ValidationContext, ValidationError};

/// The atomic gate: a batch executes only when this says it is wholly
/// valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchValidation {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Exceeding the configured maximum short-circuits with a single error and
/// skips per-record validation entirely; otherwise every record is
/// validated and all errors unioned.
pub fn validate_batch(
    ctx: &ValidationContext,
    output_type: OutputType,
    records: &[OutputRecord],
    type_config: &OutputTypeConfig,
) -> BatchValidation {
    if let Some(max) = type_config.max {
        if records.len() > max {
            return BatchValidation {
                valid: false,
                errors: vec![ValidationError {
                    output_type,
                    filename: String::new(),
                    message: format!(
                        "{} output files exceed the configured maximum of {max}",
                        records.len()
                    ),
                }],
            };
        }
    }

    let mut errors = Vec::new();
    for record in records {
        errors.extend(validate_record(ctx, record));
    }
    BatchValidation {
        valid: errors.is_empty(),
        errors,
    }
}
