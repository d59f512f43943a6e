use std::fmt;

use migralint_core::{LintConfig, LintError, ReviewVerdict, RunContext, VerdictPolicy};
use migralint_difflens::classify::FileClassifier;
use migralint_difflens::collect::DiffClassifier;
use migralint_difflens::source::DiffSource;
use tracing::{debug, info};

use crate::github::CommentSink;
use crate::llm::ReviewClient;
use crate::prompt::PromptAssembler;
use crate::report::{Outcome, ReportContext, ResultReporter};

/// Stage of a lint run. Runs move forward only; any error ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Collecting and categorizing diffs.
    Classifying,
    /// Rendering the prompts.
    Assembling,
    /// Waiting for the provider's verdict.
    Reviewing,
    /// Posting the result.
    Reporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Classifying => write!(f, "classifying"),
            Stage::Assembling => write!(f, "assembling"),
            Stage::Reviewing => write!(f, "reviewing"),
            Stage::Reporting => write!(f, "reporting"),
        }
    }
}

/// Classify, assemble, review, report.
///
/// Generic over where diffs come from and where comments go so runs can be
/// driven without git or GitHub.
pub struct LintPipeline<S, K> {
    classifier: DiffClassifier<S>,
    assembler: PromptAssembler,
    client: ReviewClient,
    reporter: ResultReporter<K>,
    policy: VerdictPolicy,
}

impl<S: DiffSource, K: CommentSink> LintPipeline<S, K> {
    /// Wire a pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Config`] for invalid classification patterns and
    /// [`LintError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &LintConfig, source: S, sink: K) -> Result<Self, LintError> {
        let rules = FileClassifier::from_config(&config.settings.classify)?;
        Ok(Self {
            classifier: DiffClassifier::new(rules, source),
            assembler: PromptAssembler::new(&config.settings.prompt),
            client: ReviewClient::new(&config.settings.review, config.run.debug_thinking)?,
            reporter: ResultReporter::new(sink),
            policy: config.settings.review.verdict_policy,
        })
    }

    /// Borrow the comment sink.
    pub fn sink(&self) -> &K {
        self.reporter.sink()
    }

    /// Run once for the pull request in `run`.
    ///
    /// # Errors
    ///
    /// Any error from assembling or reviewing ends the run before a comment
    /// is posted. Diff and comment failures are logged, not returned.
    pub async fn run(&self, run: &RunContext) -> Result<Outcome, LintError> {
        if run.changed_files.is_empty() {
            info!("no changed files, nothing to check");
            return Ok(Outcome::NothingToCheck);
        }

        enter(Stage::Classifying);
        let bundle = self.classifier.classify(&run.changed_files, &run.base_ref);
        if !bundle.has_schema_changes() {
            info!(
                files = bundle.len(),
                "no model or migration changes, nothing to check"
            );
            return Ok(Outcome::NothingToCheck);
        }

        enter(Stage::Assembling);
        let prompts = self.assembler.assemble(&bundle)?;

        enter(Stage::Reviewing);
        let raw = self
            .client
            .review(
                run.provider,
                &prompts.system,
                &prompts.user,
                &run.provider_credential,
            )
            .await?;
        let verdict = ReviewVerdict::evaluate(raw, self.policy);
        debug!(passed = verdict.passed, policy = %self.policy, "verdict");

        enter(Stage::Reporting);
        let repository = run.repository();
        let ctx = ReportContext {
            pr_number: run.pr_number,
            repository: &repository,
            provider: run.provider,
            bundle: &bundle,
            post_success_comments: run.post_success_comments,
        };
        Ok(self.reporter.report(&verdict, &ctx).await)
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "entering stage");
}
