use std::process::ExitCode;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{fmt, EnvFilter};

use migralint_core::{LintConfig, LintError};
use migralint_difflens::source::GitCli;
use migralint_review::github::GitHubSink;
use migralint_review::pipeline::LintPipeline;
use migralint_review::report::Outcome;

#[derive(Parser)]
#[command(
    name = "migralint",
    version,
    about = "Check naming conventions between database migrations and ORM models",
    long_about = "Check naming conventions between database migrations and ORM models.\n\n\
                   Diffs the changed files of a pull request against its base branch, asks an AI\n\
                   reviewer whether models and migrations agree, and comments on the pull request\n\
                   when they do not. Takes no arguments; everything comes from the environment.\n\n\
                   Required environment:\n  \
                     GITHUB_BASE_REF        Base branch to diff against\n  \
                     CHANGED_FILES          Space-separated changed paths\n  \
                     GITHUB_REPOSITORY      owner/repo\n  \
                     PR_NUMBER              Pull request number\n  \
                     GITHUB_TOKEN           Token used to post comments\n\n\
                   Optional environment:\n  \
                     AI_PROVIDER            gemini (default), openai, openai-legacy\n  \
                     GEMINI_API_KEY         Required when AI_PROVIDER is gemini\n  \
                     OPENAI_API_KEY         Required when AI_PROVIDER is openai or openai-legacy\n  \
                     POST_SUCCESS_COMMENTS  \"true\" to comment when the check passes\n  \
                     DEBUG_THINKING         \"true\" to log the provider's reasoning trace\n  \
                     MIGRALINT_CONFIG       Settings file (default: .migralint.toml)\n  \
                     RUST_LOG               Log filter (default: info)\n\n\
                   Prompt templates are read from .github/migralint/: system.md and user.md,\n\
                   or the single-file prompt.md. The {{CHANGES}} token receives the diffs.\n\n\
                   Exit status: 0 when consistent or nothing to check, 1 on violations or errors."
)]
struct Cli {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> std::result::Result<Outcome, LintError> {
    let config = LintConfig::from_env()?;
    let sink = GitHubSink::for_run(&config.settings.github, &config.run)?;
    let pipeline = LintPipeline::from_config(&config, GitCli::new("."), sink)?;
    pipeline.run(&config.run).await
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let _cli = Cli::parse();
    init_tracing();

    let outcome = run().await.into_diagnostic()?;
    Ok(ExitCode::from(outcome.exit_code()))
}
