use crate::shared::ids::AgentId;
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("failed to read event payload {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in event payload {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What the engine needs from the triggering event file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSummary {
    pub issue_number: Option<u64>,
    pub actor: Option<String>,
}

pub fn load_event_summary(path: &Path) -> Result<EventSummary, EventError> {
    let raw = fs::read_to_string(path).map_err(|source| EventError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| EventError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let issue_number = ["issue", "pull_request", "discussion"]
        .iter()
        .find_map(|key| {
            value
                .get(*key)
                .and_then(|v| v.get("number"))
                .and_then(Value::as_u64)
        });
    let actor = value
        .get("sender")
        .and_then(|v| v.get("login"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(EventSummary {
        issue_number,
        actor,
    })
}

/// Resolved invocation context, computed once at the boundary and passed by
/// value into the engine. The engine never reads ambient process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub agent_id: AgentId,
    pub issue_number: Option<u64>,
    /// Link to the agent contract document, for attribution text.
    pub agent_ref: Option<String>,
    /// Link to the triggering workflow run, for attribution text.
    pub run_url: Option<String>,
}

impl ExecutionContext {
    /// An explicit override wins over the number carried by the event file.
    pub fn resolve(
        agent_id: AgentId,
        override_number: Option<u64>,
        event: Option<&EventSummary>,
        agent_ref: Option<String>,
        run_url: Option<String>,
    ) -> Self {
        let issue_number = override_number.or_else(|| event.and_then(|e| e.issue_number));
        Self {
            agent_id,
            issue_number,
            agent_ref,
            run_url,
        }
    }
}
