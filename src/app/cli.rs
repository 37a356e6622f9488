#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Process,
    Check,
    Types,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "process" => CliVerb::Process,
        "check" => CliVerb::Check,
        "types" => CliVerb::Types,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  process <agent.yaml> [options]       Validate declared outputs and execute side effects"
            .to_string(),
        "  check <agent.yaml> [options]         Validate declared outputs without executing"
            .to_string(),
        "  types                                List known output type ids".to_string(),
        "Options:".to_string(),
        "  --type <id>                          Process one output type (default: all enabled)"
            .to_string(),
        "  --outputs <dir>                      Output declarations directory (default: outputs)"
            .to_string(),
        "  --event <file>                       Triggering event payload (JSON)".to_string(),
        "  --state <dir>                        State root for logs and artifacts (default: .forgeclaw)"
            .to_string(),
        "  --repo <owner/name>                  Repository slug (or FORGECLAW_REPO)".to_string(),
        "  --issue <n>                          Issue/PR number override".to_string(),
        "  --agent-ref <url>                    Link to the agent definition, for attribution"
            .to_string(),
        "  --run-url <url>                      Link to the triggering run, for attribution"
            .to_string(),
        "Environment:".to_string(),
        "  FORGECLAW_TOKEN                      Forge API token".to_string(),
        "  FORGECLAW_API_BASE                   Forge API base URL override".to_string(),
    ]
}
