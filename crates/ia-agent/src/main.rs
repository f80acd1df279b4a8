//! ia-agent: turn a free-text infrastructure request into a provisioning
//! plan.
//!
//! Reads the request from the command line (or stdin), runs it through the
//! router and prints a JSON report on stdout. Logs go to stderr.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ia_agent::config::AgentConfig;
use ia_agent::router::RequestRouter;
use ia_protocol::{RequestOutcome, RequestReport, VariableMap};

#[derive(Parser)]
#[command(name = "ia-agent")]
#[command(about = "Route natural-language infrastructure requests to provisioning functions", long_about = None)]
struct Cli {
    /// Request text. Read from stdin when omitted.
    prompt: Vec<String>,

    /// Agent config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default GCP project for requests that don't name one
    #[arg(long)]
    project_id: Option<String>,

    /// Default location for requests that don't name one
    #[arg(long)]
    location: Option<String>,

    /// Extra default variable, `key=value` (repeatable)
    #[arg(long = "var", value_parser = parse_key_val)]
    vars: Vec<(String, String)>,

    /// Override the overall request deadline
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// List templates and exit
    #[arg(long)]
    list_templates: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    // ── Load config ─────────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => {
            let config = AgentConfig::from_file(path)?;
            tracing::info!(path = %path.display(), "config loaded");
            config
        }
        None => AgentConfig::default(),
    };
    if let Some(secs) = cli.deadline_secs {
        config.deadline_secs = secs;
        config.validate()?;
    }

    let mut defaults = config.defaults.clone();
    defaults.extend(cli.vars.iter().cloned());
    if let Some(project_id) = &cli.project_id {
        defaults.insert("project_id".into(), project_id.clone());
    }
    if let Some(location) = &cli.location {
        defaults.insert("location".into(), location.clone());
    }

    // ── Build router ────────────────────────────────────────────
    let router = RequestRouter::from_config(&config)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        templates = router.registry().len(),
        functions = router.functions().len(),
        "ia-agent ready"
    );

    if cli.list_templates {
        print_json(&template_listing(&router), cli.pretty)?;
        return Ok(ExitCode::SUCCESS);
    }

    // ── Process ─────────────────────────────────────────────────
    let text = if cli.prompt.is_empty() {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        cli.prompt.join(" ")
    };
    let report = run_request(&router, &text, &defaults).await;
    print_json(&report, cli.pretty)?;
    Ok(exit_code(&report.outcome))
}

/// Run one request, blank or not, and time it.
async fn run_request(router: &RequestRouter, text: &str, defaults: &VariableMap) -> RequestReport {
    let text = text.trim();
    let start = Instant::now();
    let outcome = router.process(text, defaults).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    RequestReport::new(text, outcome, latency_ms)
}

/// Templates with their variables, plus every registered function.
fn template_listing(router: &RequestRouter) -> serde_json::Value {
    let functions = router.functions().list();
    let templates: Vec<serde_json::Value> = router
        .registry()
        .iter()
        .map(|t| {
            let function = functions.iter().find(|f| f.template == t.name);
            serde_json::json!({
                "name": t.name,
                "keywords": t.keywords,
                "required_vars": t.required_vars,
                "optional_vars": t.optional_vars,
                "function": function.map(|f| f.description.as_str()),
            })
        })
        .collect();
    serde_json::json!({ "templates": templates, "functions": functions })
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}

/// 0 success, 1 dispatch failure or timeout, 2 missing variables,
/// 3 unidentified.
fn exit_code(outcome: &RequestOutcome) -> ExitCode {
    match outcome {
        RequestOutcome::Success { .. } => ExitCode::SUCCESS,
        RequestOutcome::DispatchError { .. } | RequestOutcome::TimedOut { .. } => ExitCode::from(1),
        RequestOutcome::MissingVariables { .. } => ExitCode::from(2),
        RequestOutcome::Unidentified => ExitCode::from(3),
    }
}
