use serde::{Deserialize, Serialize};

/// The closed set of side-effect categories an agent may declare.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputType {
    AddComment,
    AddLabel,
    RemoveLabel,
    CreateIssue,
    CreateDiscussion,
    CreatePr,
    UpdateFile,
    CloseIssue,
    ClosePr,
}

pub const ALL_OUTPUT_TYPES: [OutputType; 9] = [
    OutputType::AddComment,
    OutputType::AddLabel,
    OutputType::RemoveLabel,
    OutputType::CreateIssue,
    OutputType::CreateDiscussion,
    OutputType::CreatePr,
    OutputType::UpdateFile,
    OutputType::CloseIssue,
    OutputType::ClosePr,
];

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddComment => "add-comment",
            Self::AddLabel => "add-label",
            Self::RemoveLabel => "remove-label",
            Self::CreateIssue => "create-issue",
            Self::CreateDiscussion => "create-discussion",
            Self::CreatePr => "create-pr",
            Self::UpdateFile => "update-file",
            Self::CloseIssue => "close-issue",
            Self::ClosePr => "close-pr",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "add-comment" => Ok(Self::AddComment),
            "add-label" => Ok(Self::AddLabel),
            "remove-label" => Ok(Self::RemoveLabel),
            "create-issue" => Ok(Self::CreateIssue),
            "create-discussion" => Ok(Self::CreateDiscussion),
            "create-pr" => Ok(Self::CreatePr),
            "update-file" => Ok(Self::UpdateFile),
            "close-issue" => Ok(Self::CloseIssue),
            "close-pr" => Ok(Self::ClosePr),
            other => Err(format!("unknown output type `{other}`")),
        }
    }
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
