pub mod rest;

pub use rest::RestForgeClient;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error("forge api request failed: {0}")]
    ApiRequest(String),
    #[error("forge api error: {0}")]
    ApiResponse(String),
    #[error("remote state changed concurrently")]
    Conflict,
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscussionCategory {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub name: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFile {
    pub path: String,
    pub content: String,
}

/// Every remote mutation and lookup the engine performs, as typed
/// operations. Any implementation satisfying these contracts is
/// substitutable; tests use an in-memory one.
pub trait ForgeGateway {
    // Existence checker surface. Validation treats a listing failure as
    // "checker unavailable" and skips the reference checks.
    fn list_labels(&self) -> Result<Vec<String>, ForgeError>;
    fn list_discussion_categories(&self) -> Result<Vec<DiscussionCategory>, ForgeError>;

    // Issue / PR surface.
    fn post_comment(&self, number: u64, body: &str) -> Result<(), ForgeError>;
    fn issue_labels(&self, number: u64) -> Result<Vec<String>, ForgeError>;
    /// Replaces the label set wholesale, conditional on `expected` still
    /// being the remote set; fails with [`ForgeError::Conflict`] otherwise.
    fn replace_labels(
        &self,
        number: u64,
        labels: &[String],
        expected: &[String],
    ) -> Result<(), ForgeError>;
    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<u64, ForgeError>;
    fn close_issue(&self, number: u64, state_reason: Option<&str>) -> Result<(), ForgeError>;
    fn close_pull(&self, number: u64) -> Result<(), ForgeError>;
    fn merge_pull(&self, number: u64) -> Result<(), ForgeError>;

    // Discussion surface.
    fn repository_id(&self) -> Result<String, ForgeError>;
    fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<(), ForgeError>;

    // Branch / file / PR surface.
    fn default_branch(&self) -> Result<BranchHead, ForgeError>;
    fn find_open_pull_by_branch(&self, branch: &str) -> Result<Option<u64>, ForgeError>;
    fn branch_exists(&self, branch: &str) -> Result<bool, ForgeError>;
    fn delete_branch(&self, branch: &str) -> Result<(), ForgeError>;
    fn create_branch(&self, branch: &str, from_sha: &str) -> Result<(), ForgeError>;
    fn commit_files(
        &self,
        branch: &str,
        files: &[CommitFile],
        message: &str,
        sign: bool,
    ) -> Result<(), ForgeError>;
    fn open_pull(
        &self,
        branch: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<u64, ForgeError>;
    /// Revision marker of `path` on the default branch; `None` when the
    /// file does not exist yet (an update becomes a create).
    fn file_revision(&self, path: &str) -> Result<Option<String>, ForgeError>;
    fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_revision: Option<&str>,
    ) -> Result<(), ForgeError>;
}
