use std::fmt::Write;

use migralint_core::{DiffBundle, Provider, ReviewVerdict};
use tracing::{error, info, warn};

use crate::github::CommentSink;
use crate::prompt::fence_for;

/// Final result of a run.
///
/// # Examples
///
/// ```
/// use migralint_review::report::Outcome;
///
/// assert_eq!(Outcome::Passed.exit_code(), 0);
/// assert_eq!(Outcome::NothingToCheck.exit_code(), 0);
/// assert_eq!(Outcome::Failed.exit_code(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reviewer found no violations.
    Passed,
    /// The reviewer reported violations.
    Failed,
    /// No model or migration changes to review.
    NothingToCheck,
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Passed | Outcome::NothingToCheck => 0,
            Outcome::Failed => 1,
        }
    }
}

/// What the comment needs to know about the run.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext<'a> {
    /// Pull request number.
    pub pr_number: u64,
    /// `owner/repo`.
    pub repository: &'a str,
    /// Provider that produced the verdict.
    pub provider: Provider,
    /// Files that were reviewed.
    pub bundle: &'a DiffBundle,
    /// Post a comment on success too.
    pub post_success_comments: bool,
}

/// Turns a verdict into a PR comment and an [`Outcome`].
pub struct ResultReporter<S> {
    sink: S,
}

impl<S: CommentSink> ResultReporter<S> {
    /// Create a reporter posting through `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Borrow the underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Report `verdict`. Comment failures are logged and never change the
    /// outcome.
    pub async fn report(&self, verdict: &ReviewVerdict, ctx: &ReportContext<'_>) -> Outcome {
        if verdict.passed {
            info!(repo = ctx.repository, pr = ctx.pr_number, "naming conventions are consistent");
            if ctx.post_success_comments {
                self.post(&success_comment(ctx)).await;
            }
            Outcome::Passed
        } else {
            error!(
                repo = ctx.repository,
                pr = ctx.pr_number,
                "naming convention violations found:\n{}",
                verdict.raw_text
            );
            self.post(&failure_comment(verdict, ctx)).await;
            Outcome::Failed
        }
    }

    async fn post(&self, body: &str) {
        match self.sink.post_comment(body).await {
            Ok(()) => info!("posted pull request comment"),
            Err(e) => warn!(error = %e, "failed to post pull request comment"),
        }
    }
}

/// Markdown comment for a failed review.
///
/// # Examples
///
/// ```
/// use migralint_core::{DiffBundle, Provider, ReviewVerdict, VerdictPolicy};
/// use migralint_review::report::{failure_comment, ReportContext};
///
/// let bundle = DiffBundle::default();
/// let ctx = ReportContext {
///     pr_number: 3,
///     repository: "acme/agency",
///     provider: Provider::Gemini,
///     bundle: &bundle,
///     post_success_comments: false,
/// };
/// let verdict = ReviewVerdict::evaluate("agentId vs agent_id", VerdictPolicy::Exact);
/// let body = failure_comment(&verdict, &ctx);
/// assert!(body.contains("agentId vs agent_id"));
/// assert!(body.contains("Google Gemini"));
/// ```
pub fn failure_comment(verdict: &ReviewVerdict, ctx: &ReportContext<'_>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "## ❌ Naming convention check failed\n");
    let _ = writeln!(
        body,
        "The reviewer found inconsistencies between migrations and models.\n"
    );
    write_counts(&mut body, ctx);
    let text = verdict.raw_text.trim();
    let fence = fence_for(text);
    let _ = writeln!(body, "\n{fence}\n{text}\n{fence}");
    body
}

/// Markdown comment for a passed review.
pub fn success_comment(ctx: &ReportContext<'_>) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "## ✅ Naming convention check passed\n");
    write_counts(&mut body, ctx);
    body
}

fn write_counts(body: &mut String, ctx: &ReportContext<'_>) {
    let _ = writeln!(body, "- **Provider:** {}", ctx.provider.display_name());
    let _ = writeln!(body, "- **Model files:** {}", ctx.bundle.model_paths.len());
    let _ = writeln!(
        body,
        "- **Migration files:** {}",
        ctx.bundle.migration_paths.len()
    );
    let _ = writeln!(body, "- **Other files:** {}", ctx.bundle.other_paths.len());
}
