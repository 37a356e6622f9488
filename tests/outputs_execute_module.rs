mod support;

use forgeclaw::config::OutputTypeConfig;
use forgeclaw::event::ExecutionContext;
use forgeclaw::outputs::execute::execute_batch;
use forgeclaw::outputs::loader::OutputRecord;
use forgeclaw::outputs::OutputType;
use forgeclaw::shared::ids::AgentId;
use serde_json::{json, Value};
use support::RecordingForge;

fn context(issue_number: Option<u64>) -> ExecutionContext {
    ExecutionContext {
        agent_id: AgentId::parse("tester").expect("agent id"),
        issue_number,
        agent_ref: Some("https://forge.example/agents/tester.yaml".to_string()),
        run_url: Some("https://forge.example/runs/42".to_string()),
    }
}

fn record(output_type: OutputType, filename: &str, payload: Value) -> OutputRecord {
    OutputRecord::parsed(
        output_type,
        filename,
        payload.as_object().expect("object").clone(),
    )
}

#[test]
fn execute_module_add_comment_posts_with_attribution() {
    let forge = RecordingForge::new();
    let records = vec![record(
        OutputType::AddComment,
        "add-comment.json",
        json!({ "body": "hello" }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(7)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);

    let state = forge.state.borrow();
    assert_eq!(state.comments.len(), 1);
    let (number, body) = &state.comments[0];
    assert_eq!(*number, 7);
    assert!(body.starts_with("hello"));
    assert!(body.contains("Generated by agent"));
    assert!(body.contains("https://forge.example/runs/42"));
}

#[test]
fn execute_module_issue_scoped_outputs_need_a_number() {
    let forge = RecordingForge::new();
    let records = vec![
        record(
            OutputType::AddComment,
            "add-comment-1.json",
            json!({ "body": "a" }),
        ),
        record(
            OutputType::AddComment,
            "add-comment-2.json",
            json!({ "body": "b" }),
        ),
    ];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    // Both files are attempted; each fails independently.
    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        assert!(!outcome.succeeded);
        let error = outcome.error.as_deref().expect("error");
        assert!(error.contains("no issue or PR number available"));
    }
    assert!(forge.state.borrow().comments.is_empty());
}

#[test]
fn execute_module_add_label_merges_with_current_set() {
    let forge = RecordingForge::new().with_issue_labels(7, &["bug"]);
    let records = vec![record(
        OutputType::AddLabel,
        "add-label.json",
        json!({ "labels": ["bug", "urgent"] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(7)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);
    assert_eq!(
        forge.state.borrow().issue_labels.get(&7).expect("labels"),
        &vec!["bug".to_string(), "urgent".to_string()]
    );
}

#[test]
fn execute_module_remove_label_subtracts_declared_set() {
    let forge = RecordingForge::new().with_issue_labels(7, &["bug", "urgent", "docs"]);
    let records = vec![record(
        OutputType::RemoveLabel,
        "remove-label.json",
        json!({ "labels": ["urgent", "absent"] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(7)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);
    assert_eq!(
        forge.state.borrow().issue_labels.get(&7).expect("labels"),
        &vec!["bug".to_string(), "docs".to_string()]
    );
}

#[test]
fn execute_module_label_update_retries_past_a_conflict() {
    let forge = RecordingForge::new()
        .with_issue_labels(7, &["bug"])
        .with_label_conflicts(1);
    let records = vec![record(
        OutputType::AddLabel,
        "add-label.json",
        json!({ "labels": ["urgent"] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(7)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);
    assert_eq!(
        forge.state.borrow().issue_labels.get(&7).expect("labels"),
        &vec!["bug".to_string(), "urgent".to_string()]
    );
}

#[test]
fn execute_module_label_update_gives_up_after_bounded_attempts() {
    let forge = RecordingForge::new()
        .with_issue_labels(7, &["bug"])
        .with_label_conflicts(5);
    let records = vec![record(
        OutputType::AddLabel,
        "add-label.json",
        json!({ "labels": ["urgent"] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(7)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(!outcomes[0].succeeded);
    let error = outcomes[0].error.as_deref().expect("error");
    assert!(error.contains("conflicted after 3 attempts"));
    assert_eq!(
        forge.state.borrow().issue_labels.get(&7).expect("labels"),
        &vec!["bug".to_string()]
    );
}

#[test]
fn execute_module_create_issue_carries_labels_and_footer() {
    let forge = RecordingForge::new();
    let records = vec![record(
        OutputType::CreateIssue,
        "create-issue.json",
        json!({ "title": "t", "body": "b", "labels": ["bug"] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    // Entity creation does not need a resolved issue number.
    assert!(outcomes[0].succeeded);
    let state = forge.state.borrow();
    let (title, body, labels) = &state.created_issues[0];
    assert_eq!(title, "t");
    assert!(body.contains("Generated by agent"));
    assert_eq!(labels, &vec!["bug".to_string()]);
}

#[test]
fn execute_module_create_discussion_resolves_category_id() {
    let forge = RecordingForge::new().with_categories(&[("cat-1", "General"), ("cat-2", "Ideas")]);
    let records = vec![record(
        OutputType::CreateDiscussion,
        "create-discussion.json",
        json!({ "title": "t", "body": "b", "category": "Ideas" }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);
    let state = forge.state.borrow();
    assert_eq!(state.discussions[0].0, "cat-2");
}

#[test]
fn execute_module_create_discussion_fails_on_unknown_category() {
    let forge = RecordingForge::new().with_categories(&[("cat-1", "General")]);
    let records = vec![record(
        OutputType::CreateDiscussion,
        "create-discussion.json",
        json!({ "title": "t", "body": "b", "category": "Ideas" }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(!outcomes[0].succeeded);
    assert!(outcomes[0]
        .error
        .as_deref()
        .expect("error")
        .contains("category `Ideas`"));
}

#[test]
fn execute_module_create_pr_builds_branch_and_opens_pull() {
    let forge = RecordingForge::new();
    let config = OutputTypeConfig {
        enabled: true,
        max: None,
        sign: true,
    };
    let records = vec![record(
        OutputType::CreatePr,
        "create-pr.json",
        json!({ "branch": "feat/x", "title": "Add docs", "body": "b",
                "files": [{ "path": "docs/a.md", "content": "hello" }] }),
    )];
    let outcomes = execute_batch(&forge, &context(None), &config, &records);
    assert!(outcomes[0].succeeded);

    let state = forge.state.borrow();
    assert_eq!(
        state.branches.get("feat/x").expect("branch"),
        &"sha-main".to_string()
    );
    let (branch, files, message, sign) = &state.commits[0];
    assert_eq!(branch, "feat/x");
    assert_eq!(files[0].path, "docs/a.md");
    assert_eq!(message, "Add docs");
    assert!(*sign);
    assert!(state.open_pulls.contains_key("feat/x"));
}

#[test]
fn execute_module_create_pr_is_idempotent_by_branch() {
    let forge = RecordingForge::new().with_open_pull("feat/x", 5);
    let records = vec![record(
        OutputType::CreatePr,
        "create-pr.json",
        json!({ "branch": "feat/x", "title": "t", "body": "b",
                "files": [{ "path": "a.md", "content": "x" }] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);

    let state = forge.state.borrow();
    assert_eq!(state.open_pulls.len(), 1);
    assert_eq!(state.open_pulls.get("feat/x"), Some(&5));
    assert_eq!(state.mutations, 0);
}

#[test]
fn execute_module_create_pr_twice_leaves_one_open_pull() {
    let forge = RecordingForge::new();
    let records = vec![record(
        OutputType::CreatePr,
        "create-pr.json",
        json!({ "branch": "feat/x", "title": "t", "body": "b",
                "files": [{ "path": "a.md", "content": "x" }] }),
    )];
    for _ in 0..2 {
        let outcomes = execute_batch(
            &forge,
            &context(None),
            &OutputTypeConfig::default(),
            &records,
        );
        assert!(outcomes[0].succeeded);
    }

    let state = forge.state.borrow();
    assert_eq!(state.open_pulls.len(), 1);
    assert_eq!(state.commits.len(), 1);
    assert!(state.deleted_branches.is_empty());
}

#[test]
fn execute_module_create_pr_recreates_a_stale_branch() {
    let forge = RecordingForge::new().with_branch("feat/x", "stale-sha");
    let records = vec![record(
        OutputType::CreatePr,
        "create-pr.json",
        json!({ "branch": "feat/x", "title": "t", "body": "b",
                "files": [{ "path": "a.md", "content": "x" }] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);

    let state = forge.state.borrow();
    assert_eq!(state.deleted_branches, vec!["feat/x".to_string()]);
    assert_eq!(
        state.branches.get("feat/x").expect("branch"),
        &"sha-main".to_string()
    );
}

#[test]
fn execute_module_update_file_keys_writes_by_current_revision() {
    let forge = RecordingForge::new().with_file("docs/a.md", "old", "sha-old");
    let records = vec![record(
        OutputType::UpdateFile,
        "update-file.json",
        json!({ "message": "m",
                "files": [{ "path": "docs/a.md", "content": "new" },
                          { "path": "docs/b.md", "content": "fresh" }] }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(None),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);

    let state = forge.state.borrow();
    assert_eq!(
        state.puts,
        vec![
            ("docs/a.md".to_string(), Some("sha-old".to_string())),
            ("docs/b.md".to_string(), None),
        ]
    );
}

#[test]
fn execute_module_close_issue_passes_state_reason() {
    let forge = RecordingForge::new();
    let records = vec![record(
        OutputType::CloseIssue,
        "close-issue.json",
        json!({ "state_reason": "not_planned" }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(7)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);
    assert_eq!(
        forge.state.borrow().closed_issues,
        vec![(7, Some("not_planned".to_string()))]
    );
}

#[test]
fn execute_module_close_pr_merges_when_asked() {
    let forge = RecordingForge::new();
    let records = vec![record(
        OutputType::ClosePr,
        "close-pr.json",
        json!({ "merge": true }),
    )];
    let outcomes = execute_batch(
        &forge,
        &context(Some(9)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);

    let state = forge.state.borrow();
    assert_eq!(state.merged_pulls, vec![9]);
    assert!(state.closed_pulls.is_empty());
}

#[test]
fn execute_module_close_pr_closes_by_default() {
    let forge = RecordingForge::new();
    let records = vec![record(OutputType::ClosePr, "close-pr.json", json!({}))];
    let outcomes = execute_batch(
        &forge,
        &context(Some(9)),
        &OutputTypeConfig::default(),
        &records,
    );
    assert!(outcomes[0].succeeded);
    assert_eq!(forge.state.borrow().closed_pulls, vec![9]);
}
