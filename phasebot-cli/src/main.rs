use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use phasebot_core::{
    check_event_kind, match_phrase, run_invocation, ActionKind, DryRunTracker, GitHubClient,
    IssueCommentPayload, PhaseLabelConfig, PhraseConfig, StaticToken, TriggerContext,
    DEFAULT_API_URL,
};

/// Phasebot: move GitHub issues through phase labels from comments
#[derive(Parser, Debug)]
#[command(name = "phasebot")]
#[command(about = "Comment-triggered phase workflow for GitHub issues", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Handle the issue comment event that triggered this workflow run
    Run(RunArgs),
    /// Show which action a comment body would trigger
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct PhraseArgs {
    /// Phrase that assigns the commenter to the issue
    #[arg(long, env = "INPUT_ASSIGN_PHRASE")]
    assign_phrase: Option<String>,

    /// Phrase that completes the current phase
    #[arg(long, env = "INPUT_COMPLETE_PHRASE")]
    complete_phrase: Option<String>,

    #[arg(long, env = "INPUT_PHASE1_RESULTS_PHRASE")]
    phase1_results_phrase: Option<String>,

    #[arg(long, env = "INPUT_PHASE2_RESULTS_PHRASE")]
    phase2_results_phrase: Option<String>,

    #[arg(long, env = "INPUT_UNROLL_PHRASE")]
    unroll_phrase: Option<String>,
}

impl PhraseArgs {
    fn to_config(&self) -> PhraseConfig {
        let mut config = PhraseConfig::new();
        let phrases = [
            (ActionKind::Assign, &self.assign_phrase),
            (ActionKind::Complete, &self.complete_phrase),
            (ActionKind::Phase1Results, &self.phase1_results_phrase),
            (ActionKind::Phase2Results, &self.phase2_results_phrase),
            (ActionKind::Unroll, &self.unroll_phrase),
        ];
        for (action, phrase) in phrases {
            if let Some(phrase) = phrase {
                config.insert(action, phrase);
            }
        }
        config
    }
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    phrases: PhraseArgs,

    /// Comma-separated phase labels, in order
    #[arg(long, env = "INPUT_PHASE_LABELS")]
    phase_labels: String,

    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: String,

    /// Path to the JSON event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    github_api_url: String,

    /// Read the issue but only log the changes that would be made
    #[arg(long)]
    dry_run: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Comment text to test
    body: String,

    #[command(flatten)]
    phrases: PhraseArgs,
}

/// Read and validate the event payload. `None` means the event should be
/// skipped without running the engine.
async fn load_context(args: &RunArgs) -> Result<Option<TriggerContext>> {
    check_event_kind(&args.event_name)?;

    let payload = read_payload(&args.event_path).await?;

    if payload.action.as_deref() != Some("created") {
        info!("Skipping issue_comment action {:?}", payload.action);
        return Ok(None);
    }
    if payload.is_bot_comment() {
        info!(
            "Skipping comment by a bot on {}",
            payload.repository_full_name()
        );
        return Ok(None);
    }

    let phases = PhaseLabelConfig::new(args.phase_labels.split(',').map(str::trim))
        .context("Invalid phase labels")?;

    Ok(Some(TriggerContext {
        event_kind: args.event_name.clone(),
        event: payload.into_comment_event()?,
        phrases: args.phrases.to_config(),
        phases,
    }))
}

async fn read_payload(path: &Path) -> Result<IssueCommentPayload> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse event payload {}", path.display()))
}

async fn run(args: RunArgs) -> Result<()> {
    let Some(ctx) = load_context(&args).await? else {
        return Ok(());
    };

    let client = GitHubClient::new(
        &args.github_api_url,
        Arc::new(StaticToken::new(args.github_token.clone())),
    )?;

    let report = if args.dry_run {
        run_invocation(&ctx, &DryRunTracker::new(client)).await?
    } else {
        run_invocation(&ctx, &client).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    match match_phrase(&args.body, &args.phrases.to_config()) {
        Some(action) => println!("{}", action),
        None => println!("no match"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Check(args) => check(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasebot_core::{ConfigurationError, IssueRef};
    use serde_json::json;

    fn run_args(event_name: &str, event_path: &Path) -> RunArgs {
        let cli = Cli::try_parse_from([
            "phasebot",
            "run",
            "--assign-phrase",
            "I would like to work on this please!",
            "--complete-phrase",
            "Ready for review!",
            "--phase-labels",
            "phase1,phase2",
            "--event-name",
            event_name,
            "--event-path",
            event_path.to_str().unwrap(),
            "--github-token",
            "t0ken",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => args,
            Commands::Check(_) => panic!("expected run"),
        }
    }

    fn write_event(dir: &tempfile::TempDir, payload: serde_json::Value) -> PathBuf {
        let path = dir.path().join("event.json");
        std::fs::write(&path, payload.to_string()).unwrap();
        path
    }

    fn comment_event(action: &str, user_type: &str) -> serde_json::Value {
        json!({
            "action": action,
            "issue": {"number": 8},
            "comment": {
                "body": "Ready for review!",
                "user": {"login": "alice", "type": user_type}
            },
            "repository": {
                "name": "tasks",
                "full_name": "octo/tasks",
                "owner": {"login": "octo"}
            }
        })
    }

    #[test]
    fn test_check_parses_phrases() {
        let cli = Cli::try_parse_from([
            "phasebot",
            "check",
            "please UNROLL please",
            "--unroll-phrase",
            "unroll please",
        ])
        .unwrap();

        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(
            match_phrase(&args.body, &args.phrases.to_config()),
            Some(ActionKind::Unroll)
        );
    }

    #[test]
    fn test_phrase_inputs_match_input_names() {
        use clap::CommandFactory;

        let cli = Cli::command();
        let run = cli.find_subcommand("run").unwrap();
        let envs: Vec<String> = run
            .get_arguments()
            .filter_map(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned())
            .collect();

        for action in ActionKind::ALL {
            let expected = format!("INPUT_{}", action.input_name().to_uppercase());
            assert!(envs.contains(&expected), "no {expected} fallback");
        }
    }

    #[test]
    fn test_run_defaults() {
        let args = run_args("issue_comment", Path::new("/tmp/event.json"));
        assert_eq!(args.github_api_url, "https://api.github.com");
        assert!(!args.dry_run);
        assert_eq!(
            args.phrases.to_config().phrase(ActionKind::Complete),
            Some("ready for review!")
        );
    }

    #[tokio::test]
    async fn test_load_context_from_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_event(&dir, comment_event("created", "User"));

        let ctx = load_context(&run_args("issue_comment", &path))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ctx.event.issue, IssueRef::new("octo", "tasks", 8));
        assert_eq!(ctx.event.author_login, "alice");
        assert_eq!(ctx.phases.labels(), ["phase1", "phase2"]);
    }

    #[tokio::test]
    async fn test_edited_and_bot_comments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_event(&dir, comment_event("edited", "User"));
        assert!(load_context(&run_args("issue_comment", &path))
            .await
            .unwrap()
            .is_none());

        let path = write_event(&dir, comment_event("created", "Bot"));
        assert!(load_context(&run_args("issue_comment", &path))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_other_events_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_event(&dir, comment_event("created", "User"));

        let err = load_context(&run_args("push", &path)).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::UnsupportedEvent { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_event_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = load_context(&run_args("issue_comment", &path))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to read event payload"));
    }
}
