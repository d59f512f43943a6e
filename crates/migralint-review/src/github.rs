use std::future::Future;

use migralint_core::{GithubConfig, LintError, RunContext};
use octocrab::service::middleware::retry::RetryConfig;

/// Destination for pull request comments.
pub trait CommentSink {
    /// Post `body` as a comment on the pull request.
    fn post_comment(&self, body: &str) -> impl Future<Output = Result<(), LintError>> + Send;
}

/// Posts comments on one GitHub pull request via the issue-comments API.
///
/// # Examples
///
/// ```no_run
/// use migralint_core::GithubConfig;
/// use migralint_review::github::GitHubSink;
///
/// # async fn demo() -> Result<(), migralint_core::LintError> {
/// let sink = GitHubSink::new(&GithubConfig::default(), "ghs_xxxx", "acme", "agency", 42)?;
/// # Ok(())
/// # }
/// ```
pub struct GitHubSink {
    octocrab: octocrab::Octocrab,
    owner: String,
    repo: String,
    pr_number: u64,
}

impl GitHubSink {
    /// Create a sink for `owner/repo#pr_number`.
    ///
    /// Must be called inside a Tokio runtime. Retries are disabled so every
    /// comment is attempted once.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Github`] if the client cannot be built or the
    /// configured API URL is invalid.
    pub fn new(
        config: &GithubConfig,
        token: &str,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Self, LintError> {
        let mut builder = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .add_retry_config(RetryConfig::None);
        if let Some(api_url) = &config.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| LintError::Github(format!("invalid GitHub API URL {api_url}: {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| LintError::Github(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            owner: owner.to_string(),
            repo: repo.to_string(),
            pr_number,
        })
    }

    /// Create a sink for the pull request described by `run`.
    ///
    /// # Errors
    ///
    /// See [`GitHubSink::new`].
    pub fn for_run(config: &GithubConfig, run: &RunContext) -> Result<Self, LintError> {
        Self::new(config, &run.github_token, &run.owner, &run.repo, run.pr_number)
    }

    /// API route comments are posted to.
    pub fn route(&self) -> String {
        format!(
            "/repos/{}/{}/issues/{}/comments",
            self.owner, self.repo, self.pr_number
        )
    }
}

impl CommentSink for GitHubSink {
    async fn post_comment(&self, body: &str) -> Result<(), LintError> {
        let payload = serde_json::json!({ "body": body });
        let _response: serde_json::Value = self
            .octocrab
            .post(self.route(), Some(&payload))
            .await
            .map_err(comment_error)?;
        Ok(())
    }
}

fn comment_error(err: octocrab::Error) -> LintError {
    match err {
        octocrab::Error::GitHub { source, .. } => LintError::RemoteService {
            service: "GitHub".into(),
            status: source.status_code.as_u16(),
            body: source.message,
        },
        other => LintError::Github(format!("failed to post comment: {other}")),
    }
}
