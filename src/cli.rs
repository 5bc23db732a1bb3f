//! CLI interface for report-sync.
//!
//! One command, two switches. Everything else comes from the environment
//! or `~/.report-sync/config.toml`.

mod format;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    git::GitRepo,
    model::Outcome,
    notify::SlackNotifier,
    prompt,
    workflow::SyncWorkflow,
};

pub use format::format_outcome;

/// Sync report files into the reports repository and deploy them.
#[derive(Debug, Parser)]
#[command(name = "report-sync", after_long_help = ENV_HELP)]
pub struct Cli {
    /// Test run: use the `test` branch and force a change in a marker report.
    #[arg(long)]
    pub test: bool,

    /// Also notify the team Slack webhook (never in test runs).
    #[arg(long)]
    pub notify_team: bool,

    /// More log output on stderr. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

const ENV_HELP: &str = r#"Environment:
  REPORT_SYNC_MAC_SOURCE / REPORT_SYNC_WIN_SOURCE   source root
  REPORT_SYNC_MAC_DEST / REPORT_SYNC_WIN_DEST       destination root (inside the repository)
  REPORT_SYNC_SLACK_WEBHOOK                          operator webhook
  REPORT_SYNC_SLACK_WEBHOOK_TEAM                     team webhook (--notify-team)

Any of these may instead be set in ~/.report-sync/config.toml:
  source = "/path/to/source"
  destination = "/path/to/repo/Reports"
  slack-webhook = "https://hooks.slack.com/...""#;

impl Cli {
    /// Resolve configuration and run one sync.
    pub fn run(&self) -> Result<Outcome, String> {
        println!(
            "Starting report sync with test_mode={}, notify_team={}",
            self.test, self.notify_team
        );

        let config = Config::resolve(self.test, self.notify_team)
            .map_err(|e| format!("configuration error: {e}"))?;

        let repo = GitRepo::new(&config.repo_path);
        let notifier = SlackNotifier::for_run(
            config.slack_webhook.as_deref(),
            config.team_slack_webhook.as_deref(),
            config.test_mode,
            config.notify_team,
        );
        tracing::debug!(webhooks = notifier.webhooks().len(), "notifier ready");

        SyncWorkflow::new(&config, &repo, &notifier, prompt::confirm)
            .run()
            .map_err(|e| e.to_string())
    }
}

/// Log to stderr. `RUST_LOG` wins over the `-v` count.
pub fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info,ignore=warn"),
        2 => EnvFilter::new("debug,ignore=warn"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_switches() {
        let args = ["report-sync", "--test", "--notify-team", "-vv"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.test);
        assert!(cli.notify_team);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn defaults_to_normal_run() {
        let cli = Cli::try_parse_from(["report-sync"]).unwrap();
        assert!(!cli.test);
        assert!(!cli.notify_team);
        assert_eq!(cli.verbose, 0);
    }
}
