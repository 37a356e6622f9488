use super::{BranchHead, CommitFile, DiscussionCategory, ForgeError, ForgeGateway};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_FORGE_API_BASE: &str = "https://api.github.com";
const LIST_PAGE_SIZE: usize = 100;

/// Production gateway: a GitHub-style REST surface reached with bearer
/// auth. The base URL is overridable for self-hosted forges and tests.
#[derive(Debug, Clone)]
pub struct RestForgeClient {
    api_base: String,
    repo: String,
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelData {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct IssueData {
    number: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct PullData {
    number: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct RepoData {
    node_id: String,
    default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RefData {
    object: RefObject,
}

#[derive(Debug, Clone, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentData {
    sha: String,
}

impl RestForgeClient {
    /// `repo` is an `owner/name` slug. The API base honors the
    /// `FORGECLAW_API_BASE` environment override at construction.
    pub fn new(repo: String, token: String) -> Self {
        let api_base = std::env::var("FORGECLAW_API_BASE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FORGE_API_BASE.to_string());
        Self::with_api_base(api_base, repo, token)
    }

    pub fn with_api_base(api_base: String, repo: String, token: String) -> Self {
        Self {
            api_base,
            repo,
            token,
        }
    }

    fn repo_root(&self) -> String {
        format!("{}/repos/{}", self.api_base.trim_end_matches('/'), self.repo)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.repo_root(), path)
    }

    fn owner(&self) -> &str {
        self.repo.split('/').next().unwrap_or(self.repo.as_str())
    }

    fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ForgeError> {
        let mut url = self.endpoint(path);
        if !query.is_empty() {
            let encoded = query
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url = format!("{url}?{encoded}");
        }
        let response = ureq::get(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(request_error)?;
        response
            .into_json::<T>()
            .map_err(|e| ForgeError::ApiRequest(e.to_string()))
    }

    fn send<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ForgeError> {
        let url = self.endpoint(path);
        let response = ureq::request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body.clone())
            .map_err(request_error)?;
        response
            .into_json::<T>()
            .map_err(|e| ForgeError::ApiRequest(e.to_string()))
    }

    fn send_expect_empty(
        &self,
        method: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), ForgeError> {
        let url = self.endpoint(path);
        ureq::request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body.clone())
            .map_err(request_error)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), ForgeError> {
        let url = self.endpoint(path);
        ureq::delete(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(request_error)?;
        Ok(())
    }
}

fn request_error(err: ureq::Error) -> ForgeError {
    match err {
        ureq::Error::Status(status, response) => {
            let detail = response.into_string().unwrap_or_default();
            match status {
                404 => ForgeError::NotFound(detail),
                409 | 412 => ForgeError::Conflict,
                _ => ForgeError::ApiResponse(format!("status {status}: {detail}")),
            }
        }
        other => ForgeError::ApiRequest(other.to_string()),
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl ForgeGateway for RestForgeClient {
    fn list_labels(&self) -> Result<Vec<String>, ForgeError> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            let query = vec![
                ("per_page", LIST_PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let labels: Vec<LabelData> = self.get("labels", &query)?;
            let count = labels.len();
            all.extend(labels.into_iter().map(|label| label.name));
            if count < LIST_PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    fn list_discussion_categories(&self) -> Result<Vec<DiscussionCategory>, ForgeError> {
        self.get("discussions/categories", &[])
    }

    fn post_comment(&self, number: u64, body: &str) -> Result<(), ForgeError> {
        self.send_expect_empty(
            "POST",
            &format!("issues/{number}/comments"),
            &json!({ "body": body }),
        )
    }

    fn issue_labels(&self, number: u64) -> Result<Vec<String>, ForgeError> {
        let labels: Vec<LabelData> = self.get(&format!("issues/{number}/labels"), &[])?;
        Ok(labels.into_iter().map(|label| label.name).collect())
    }

    fn replace_labels(
        &self,
        number: u64,
        labels: &[String],
        expected: &[String],
    ) -> Result<(), ForgeError> {
        self.send_expect_empty(
            "PUT",
            &format!("issues/{number}/labels"),
            &json!({ "labels": labels, "expected_labels": expected }),
        )
    }

    fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<u64, ForgeError> {
        let mut payload = json!({ "title": title, "body": body });
        if !labels.is_empty() {
            payload["labels"] = json!(labels);
        }
        let issue: IssueData = self.send("POST", "issues", &payload)?;
        Ok(issue.number)
    }

    fn close_issue(&self, number: u64, state_reason: Option<&str>) -> Result<(), ForgeError> {
        let mut payload = json!({ "state": "closed" });
        if let Some(reason) = state_reason {
            payload["state_reason"] = json!(reason);
        }
        self.send_expect_empty("PATCH", &format!("issues/{number}"), &payload)
    }

    fn close_pull(&self, number: u64) -> Result<(), ForgeError> {
        self.send_expect_empty(
            "PATCH",
            &format!("pulls/{number}"),
            &json!({ "state": "closed" }),
        )
    }

    fn merge_pull(&self, number: u64) -> Result<(), ForgeError> {
        self.send_expect_empty("PUT", &format!("pulls/{number}/merge"), &json!({}))
    }

    fn repository_id(&self) -> Result<String, ForgeError> {
        let repo: RepoData = self.get("", &[])?;
        Ok(repo.node_id)
    }

    fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<(), ForgeError> {
        self.send_expect_empty(
            "POST",
            "discussions",
            &json!({
                "repository_id": repository_id,
                "category_id": category_id,
                "title": title,
                "body": body,
            }),
        )
    }

    fn default_branch(&self) -> Result<BranchHead, ForgeError> {
        let repo: RepoData = self.get("", &[])?;
        let reference: RefData =
            self.get(&format!("git/ref/heads/{}", repo.default_branch), &[])?;
        Ok(BranchHead {
            name: repo.default_branch,
            sha: reference.object.sha,
        })
    }

    fn find_open_pull_by_branch(&self, branch: &str) -> Result<Option<u64>, ForgeError> {
        let query = vec![
            ("state", "open".to_string()),
            ("head", format!("{}:{branch}", self.owner())),
        ];
        let pulls: Vec<PullData> = self.get("pulls", &query)?;
        Ok(pulls.first().map(|pull| pull.number))
    }

    fn branch_exists(&self, branch: &str) -> Result<bool, ForgeError> {
        match self.get::<RefData>(&format!("git/ref/heads/{branch}"), &[]) {
            Ok(_) => Ok(true),
            Err(ForgeError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn delete_branch(&self, branch: &str) -> Result<(), ForgeError> {
        self.delete(&format!("git/refs/heads/{branch}"))
    }

    fn create_branch(&self, branch: &str, from_sha: &str) -> Result<(), ForgeError> {
        self.send_expect_empty(
            "POST",
            "git/refs",
            &json!({ "ref": format!("refs/heads/{branch}"), "sha": from_sha }),
        )
    }

    fn commit_files(
        &self,
        branch: &str,
        files: &[CommitFile],
        message: &str,
        sign: bool,
    ) -> Result<(), ForgeError> {
        self.send_expect_empty(
            "POST",
            "commits",
            &json!({
                "branch": branch,
                "message": message,
                "sign": sign,
                "files": files,
            }),
        )
    }

    fn open_pull(
        &self,
        branch: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<u64, ForgeError> {
        let pull: PullData = self.send(
            "POST",
            "pulls",
            &json!({ "head": branch, "base": base, "title": title, "body": body }),
        )?;
        Ok(pull.number)
    }

    fn file_revision(&self, path: &str) -> Result<Option<String>, ForgeError> {
        match self.get::<ContentData>(&format!("contents/{}", encode_path(path)), &[]) {
            Ok(content) => Ok(Some(content.sha)),
            Err(ForgeError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_revision: Option<&str>,
    ) -> Result<(), ForgeError> {
        let mut payload = json!({ "message": message, "content": content });
        if let Some(revision) = expected_revision {
            payload["sha"] = json!(revision);
        }
        self.send_expect_empty("PUT", &format!("contents/{}", encode_path(path)), &payload)
    }
}
