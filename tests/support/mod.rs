#![allow(dead_code)]

use forgeclaw::forge::{BranchHead, CommitFile, DiscussionCategory, ForgeError, ForgeGateway};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct ForgeState {
    pub labels: Vec<String>,
    pub categories: Vec<DiscussionCategory>,
    pub issue_labels: BTreeMap<u64, Vec<String>>,
    pub comments: Vec<(u64, String)>,
    pub created_issues: Vec<(String, String, Vec<String>)>,
    pub discussions: Vec<(String, String, String)>,
    pub branches: BTreeMap<String, String>,
    pub open_pulls: BTreeMap<String, u64>,
    pub commits: Vec<(String, Vec<CommitFile>, String, bool)>,
    pub files: BTreeMap<String, (String, String)>,
    pub puts: Vec<(String, Option<String>)>,
    pub closed_issues: Vec<(u64, Option<String>)>,
    pub closed_pulls: Vec<u64>,
    pub merged_pulls: Vec<u64>,
    pub deleted_branches: Vec<String>,
    pub next_number: u64,
    pub fail_listings: bool,
    pub label_conflicts_remaining: usize,
    pub mutations: usize,
}

/// In-memory gateway that records every mutation for assertions.
pub struct RecordingForge {
    pub state: RefCell<ForgeState>,
}

impl RecordingForge {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(ForgeState {
                next_number: 100,
                ..ForgeState::default()
            }),
        }
    }

    pub fn with_labels(self, labels: &[&str]) -> Self {
        self.state.borrow_mut().labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_categories(self, categories: &[(&str, &str)]) -> Self {
        self.state.borrow_mut().categories = categories
            .iter()
            .map(|(id, name)| DiscussionCategory {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn with_issue_labels(self, number: u64, labels: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .issue_labels
            .insert(number, labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_open_pull(self, branch: &str, number: u64) -> Self {
        self.state
            .borrow_mut()
            .open_pulls
            .insert(branch.to_string(), number);
        self
    }

    pub fn with_branch(self, branch: &str, sha: &str) -> Self {
        self.state
            .borrow_mut()
            .branches
            .insert(branch.to_string(), sha.to_string());
        self
    }

    pub fn with_file(self, path: &str, content: &str, sha: &str) -> Self {
        self.state
            .borrow_mut()
            .files
            .insert(path.to_string(), (content.to_string(), sha.to_string()));
        self
    }

    pub fn with_failing_listings(self) -> Self {
        self.state.borrow_mut().fail_listings = true;
        self
    }

    pub fn with_label_conflicts(self, conflicts: usize) -> Self {
        self.state.borrow_mut().label_conflicts_remaining = conflicts;
        self
    }
}

impl ForgeGateway for RecordingForge {
    fn list_labels(&self) -> Result<Vec<String>, ForgeError> {
        let state = self.state.borrow();
        if state.fail_listings {
            return Err(ForgeError::ApiRequest("listing unavailable".to_string()));
        }
        Ok(state.labels.clone())
    }

    fn list_discussion_categories(&self) -> Result<Vec<DiscussionCategory>, ForgeError> {
        let state = self.state.borrow();
        if state.fail_listings {
            return Err(ForgeError::ApiRequest("listing unavailable".to_string()));
        }
        Ok(state.categories.clone())
    }

    fn post_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state.comments.push((number, body.to_string()));
        Ok(())
    }

    fn issue_labels(&self, number: u64) -> Result<Vec<String>, ForgeError> {
        Ok(self
            .state
            .borrow()
            .issue_labels
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    fn replace_labels(
        &self,
        number: u64,
        labels: &[String],
        expected: &[String],
    ) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        if state.label_conflicts_remaining > 0 {
            state.label_conflicts_remaining -= 1;
            return Err(ForgeError::Conflict);
        }
        let current = state.issue_labels.get(&number).cloned().unwrap_or_default();
        if current != expected {
            return Err(ForgeError::Conflict);
        }
        state.mutations += 1;
        state.issue_labels.insert(number, labels.to_vec());
        Ok(())
    }

    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<u64, ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state
            .created_issues
            .push((title.to_string(), body.to_string(), labels.to_vec()));
        state.next_number += 1;
        Ok(state.next_number)
    }

    fn close_issue(&self, number: u64, state_reason: Option<&str>) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state
            .closed_issues
            .push((number, state_reason.map(str::to_string)));
        Ok(())
    }

    fn close_pull(&self, number: u64) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state.closed_pulls.push(number);
        Ok(())
    }

    fn merge_pull(&self, number: u64) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state.merged_pulls.push(number);
        Ok(())
    }

    fn repository_id(&self) -> Result<String, ForgeError> {
        Ok("repo-node-1".to_string())
    }

    fn create_discussion(
        &self,
        _repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state
            .discussions
            .push((category_id.to_string(), title.to_string(), body.to_string()));
        Ok(())
    }

    fn default_branch(&self) -> Result<BranchHead, ForgeError> {
        Ok(BranchHead {
            name: "main".to_string(),
            sha: "sha-main".to_string(),
        })
    }

    fn find_open_pull_by_branch(&self, branch: &str) -> Result<Option<u64>, ForgeError> {
        Ok(self.state.borrow().open_pulls.get(branch).copied())
    }

    fn branch_exists(&self, branch: &str) -> Result<bool, ForgeError> {
        Ok(self.state.borrow().branches.contains_key(branch))
    }

    fn delete_branch(&self, branch: &str) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state.branches.remove(branch);
        state.deleted_branches.push(branch.to_string());
        Ok(())
    }

    fn create_branch(&self, branch: &str, from_sha: &str) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state
            .branches
            .insert(branch.to_string(), from_sha.to_string());
        Ok(())
    }

    fn commit_files(
        &self,
        branch: &str,
        files: &[CommitFile],
        message: &str,
        sign: bool,
    ) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state
            .commits
            .push((branch.to_string(), files.to_vec(), message.to_string(), sign));
        Ok(())
    }

    fn open_pull(
        &self,
        branch: &str,
        _base: &str,
        _title: &str,
        _body: &str,
    ) -> Result<u64, ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state.next_number += 1;
        let number = state.next_number;
        state.open_pulls.insert(branch.to_string(), number);
        Ok(number)
    }

    fn file_revision(&self, path: &str) -> Result<Option<String>, ForgeError> {
        Ok(self
            .state
            .borrow()
            .files
            .get(path)
            .map(|(_, sha)| sha.clone()))
    }

    fn put_file(
        &self,
        path: &str,
        content: &str,
        _message: &str,
        expected_revision: Option<&str>,
    ) -> Result<(), ForgeError> {
        let mut state = self.state.borrow_mut();
        state.mutations += 1;
        state
            .puts
            .push((path.to_string(), expected_revision.map(str::to_string)));
        let sha = format!("sha-{}", state.puts.len());
        state
            .files
            .insert(path.to_string(), (content.to_string(), sha));
        Ok(())
    }
}
