use crate::app::cli::{cli_help_lines, parse_cli_verb, CliVerb};
use crate::config::load_agent_config;
use crate::event::{load_event_summary, ExecutionContext};
use crate::forge::RestForgeClient;
use crate::outputs::{
    run_outputs_stage, OutputType, StageMode, StageParams, ALL_OUTPUT_TYPES,
};
use std::path::PathBuf;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let Some(verb) = args.first() else {
        return Ok(cli_help_lines().join("\n"));
    };
    match parse_cli_verb(verb) {
        CliVerb::Process => handle_process(&args[1..], StageMode::Execute),
        CliVerb::Check => handle_process(&args[1..], StageMode::CheckOnly),
        CliVerb::Types => Ok(ALL_OUTPUT_TYPES
            .iter()
            .map(|output_type| output_type.as_str())
            .collect::<Vec<_>>()
            .join("\n")),
        CliVerb::Unknown => Err(format!(
            "unknown command `{verb}`\n{}",
            cli_help_lines().join("\n")
        )),
    }
}

struct ProcessArgs {
    agent_config: PathBuf,
    output_type: Option<OutputType>,
    output_dir: PathBuf,
    event_path: Option<PathBuf>,
    state_root: PathBuf,
    repo: Option<String>,
    issue_override: Option<u64>,
    agent_ref: Option<String>,
    run_url: Option<String>,
}

fn parse_process_args(args: &[String]) -> Result<ProcessArgs, String> {
    let mut agent_config = None;
    let mut output_type = None;
    let mut output_dir = PathBuf::from("outputs");
    let mut event_path = None;
    let mut state_root = PathBuf::from(".forgeclaw");
    let mut repo = None;
    let mut issue_override = None;
    let mut agent_ref = None;
    let mut run_url = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut flag_value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--type" => {
                output_type = Some(OutputType::parse(&flag_value("--type")?)?);
            }
            "--outputs" => output_dir = PathBuf::from(flag_value("--outputs")?),
            "--event" => event_path = Some(PathBuf::from(flag_value("--event")?)),
            "--state" => state_root = PathBuf::from(flag_value("--state")?),
            "--repo" => repo = Some(flag_value("--repo")?),
            "--issue" => {
                let raw = flag_value("--issue")?;
                let number = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--issue must be a number, got `{raw}`"))?;
                issue_override = Some(number);
            }
            "--agent-ref" => agent_ref = Some(flag_value("--agent-ref")?),
            "--run-url" => run_url = Some(flag_value("--run-url")?),
            other if other.starts_with("--") => {
                return Err(format!("unknown option `{other}`"));
            }
            other => {
                if agent_config.is_some() {
                    return Err(format!("unexpected argument `{other}`"));
                }
                agent_config = Some(PathBuf::from(other));
            }
        }
    }

    let agent_config = agent_config.ok_or("missing agent contract path")?;
    Ok(ProcessArgs {
        agent_config,
        output_type,
        output_dir,
        event_path,
        state_root,
        repo,
        issue_override,
        agent_ref,
        run_url,
    })
}

fn handle_process(args: &[String], mode: StageMode) -> Result<String, String> {
    let parsed = parse_process_args(args)?;
    let agent = load_agent_config(&parsed.agent_config).map_err(|err| err.to_string())?;

    let repo = parsed
        .repo
        .or_else(|| std::env::var("FORGECLAW_REPO").ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or("missing repository slug: pass --repo or set FORGECLAW_REPO")?;
    let token = std::env::var("FORGECLAW_TOKEN").unwrap_or_default();
    let gateway = RestForgeClient::new(repo, token);

    let event = match &parsed.event_path {
        Some(path) => Some(load_event_summary(path).map_err(|err| err.to_string())?),
        None => None,
    };
    let context = ExecutionContext::resolve(
        agent.id.clone(),
        parsed.issue_override,
        event.as_ref(),
        parsed.agent_ref,
        parsed.run_url,
    );

    let params = StageParams {
        gateway: &gateway,
        agent: &agent,
        context: &context,
        output_dir: &parsed.output_dir,
        state_root: &parsed.state_root,
        mode,
    };
    let result = run_outputs_stage(&params, parsed.output_type).map_err(|err| err.to_string())?;
    Ok(format!(
        "outputs processed: executed={} errors={}",
        result.executed, result.errors
    ))
}
