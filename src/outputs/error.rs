use crate::forge::ForgeError;
use crate::outputs::output_type::OutputType;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("failed to scan output directory {path}: {source}")]
    Discover {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read output file {path}: {source}")]
    ReadRecord {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no issue or PR number available for `{output_type}` output")]
    MissingIssueNumber { output_type: OutputType },
    #[error("output file {filename} is missing field `{field}`")]
    MissingField { filename: String, field: String },
    #[error("label update for issue #{number} conflicted after {attempts} attempts")]
    LabelConflict { number: u64, attempts: usize },
    #[error("discussion category `{category}` does not exist in the repository")]
    UnknownCategory { category: String },
    #[error("forge request failed: {0}")]
    Gateway(#[from] ForgeError),
    #[error("failed to write report artifact {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
