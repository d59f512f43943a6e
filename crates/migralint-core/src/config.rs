use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LintError;
use crate::types::{Provider, VerdictPolicy};

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = ".migralint.toml";

/// Environment variable that points at an alternative settings file.
pub const SETTINGS_ENV: &str = "MIGRALINT_CONFIG";

/// Everything a run needs, assembled once at startup.
///
/// Components receive this struct (or the part they need) and never read the
/// environment themselves.
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// File-backed tunables.
    pub settings: LintSettings,
    /// Per-invocation values from the CI environment.
    pub run: RunContext,
}

impl LintConfig {
    /// Build the configuration from the process environment and the optional
    /// settings file.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Config`] for missing or invalid environment
    /// values, and [`LintError::Io`] / [`LintError::Toml`] if an explicitly
    /// named settings file cannot be read or parsed.
    pub fn from_env() -> Result<Self, LintError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use migralint_core::LintConfig;
    ///
    /// let env: HashMap<&str, &str> = HashMap::from([
    ///     ("GITHUB_BASE_REF", "main"),
    ///     ("CHANGED_FILES", "src/models/agent.model.ts"),
    ///     ("GITHUB_REPOSITORY", "acme/agency"),
    ///     ("PR_NUMBER", "7"),
    ///     ("GITHUB_TOKEN", "ghs_x"),
    ///     ("GEMINI_API_KEY", "g-key"),
    ///     ("MIGRALINT_CONFIG", "/nonexistent/settings.toml"),
    /// ]);
    /// let result = LintConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
    /// assert!(result.is_err(), "an explicitly named settings file must exist");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LintError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = match lookup(SETTINGS_ENV) {
            Some(path) if !path.trim().is_empty() => LintSettings::from_file(Path::new(path.trim()))?,
            _ => {
                let default_path = Path::new(DEFAULT_SETTINGS_FILE);
                if default_path.exists() {
                    LintSettings::from_file(default_path)?
                } else {
                    LintSettings::default()
                }
            }
        };
        let run = RunContext::from_lookup(&lookup)?;
        Ok(Self { settings, run })
    }
}

/// Values read from the CI environment.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Base branch or revision the PR is compared against.
    pub base_ref: String,
    /// Changed paths, in the order CI listed them.
    pub changed_files: Vec<String>,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub pr_number: u64,
    /// Token used to post PR comments.
    pub github_token: String,
    /// Selected review provider.
    pub provider: Provider,
    /// API key for `provider`.
    pub provider_credential: String,
    /// Post a comment when the review passes too.
    pub post_success_comments: bool,
    /// Log provider reasoning traces when present.
    pub debug_thinking: bool,
}

const REQUIRED_VARS: [&str; 5] = [
    "GITHUB_BASE_REF",
    "CHANGED_FILES",
    "GITHUB_REPOSITORY",
    "PR_NUMBER",
    "GITHUB_TOKEN",
];

impl RunContext {
    /// Read the run context through `lookup`.
    ///
    /// All missing required variables are reported together.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Config`] if a required variable is missing, the
    /// repository or PR number is malformed, the provider is unknown, or the
    /// provider's API key is not set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LintError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| lookup(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(LintError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }
        let required = |key: &str| lookup(key).unwrap_or_default();

        let base_ref = required("GITHUB_BASE_REF").trim().to_string();
        if base_ref.is_empty() {
            return Err(LintError::Config("GITHUB_BASE_REF is empty".into()));
        }

        let changed_files = parse_changed_files(&required("CHANGED_FILES"));

        let repository = required("GITHUB_REPOSITORY");
        let (owner, repo) = parse_repository(&repository)?;

        let pr_raw = required("PR_NUMBER");
        let pr_number: u64 = pr_raw
            .trim()
            .parse()
            .map_err(|_| LintError::Config(format!("invalid PR_NUMBER: {pr_raw}")))?;

        let github_token = required("GITHUB_TOKEN");
        if github_token.trim().is_empty() {
            return Err(LintError::Config("GITHUB_TOKEN is empty".into()));
        }

        let provider = match lookup("AI_PROVIDER") {
            Some(key) if !key.trim().is_empty() => key.parse::<Provider>().map_err(LintError::Config)?,
            _ => Provider::default(),
        };
        let credential_var = provider.credential_var();
        let provider_credential = lookup(credential_var)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                LintError::Config(format!(
                    "{credential_var} must be set when AI_PROVIDER is '{provider}'"
                ))
            })?;

        Ok(Self {
            base_ref,
            changed_files,
            owner,
            repo,
            pr_number,
            github_token,
            provider,
            provider_credential,
            post_success_comments: flag(lookup("POST_SUCCESS_COMMENTS")),
            debug_thinking: flag(lookup("DEBUG_THINKING")),
        })
    }

    /// `owner/repo`.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

fn flag(value: Option<String>) -> bool {
    value.as_deref() == Some("true")
}

/// Split the space-separated `CHANGED_FILES` value.
///
/// # Examples
///
/// ```
/// use migralint_core::config::parse_changed_files;
///
/// let files = parse_changed_files("  a.ts  b.js\n");
/// assert_eq!(files, vec!["a.ts", "b.js"]);
/// ```
pub fn parse_changed_files(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Parse `GITHUB_REPOSITORY` (`owner/repo`).
///
/// # Errors
///
/// Returns [`LintError::Config`] if the value is not `owner/repo`.
///
/// # Examples
///
/// ```
/// use migralint_core::config::parse_repository;
///
/// let (owner, repo) = parse_repository("octocat/hello-world").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert!(parse_repository("hello-world").is_err());
/// ```
pub fn parse_repository(value: &str) -> Result<(String, String), LintError> {
    let value = value.trim();
    let Some((owner, repo)) = value.split_once('/') else {
        return Err(LintError::Config(format!(
            "invalid GITHUB_REPOSITORY '{value}', expected owner/repo"
        )));
    };
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(LintError::Config(format!(
            "invalid GITHUB_REPOSITORY '{value}', expected owner/repo"
        )));
    }
    Ok((owner.to_string(), repo.to_string()))
}

/// Tunables loaded from `.migralint.toml`.
///
/// # Examples
///
/// ```
/// use migralint_core::LintSettings;
///
/// let settings = LintSettings::default();
/// assert_eq!(settings.review.timeout_secs, 120);
/// assert_eq!(settings.prompt.placeholder, "{{CHANGES}}");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintSettings {
    /// File classification rules.
    #[serde(default)]
    pub classify: ClassifyConfig,
    /// Prompt template location.
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Review call and verdict settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// GitHub API settings.
    #[serde(default)]
    pub github: GithubConfig,
}

impl LintSettings {
    /// Load settings from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Io`] if the file cannot be read, or
    /// [`LintError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, LintError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use migralint_core::{LintSettings, VerdictPolicy};
    ///
    /// let toml = r#"
    /// [review]
    /// verdict_policy = "contains"
    /// "#;
    /// let settings = LintSettings::from_toml(toml).unwrap();
    /// assert_eq!(settings.review.verdict_policy, VerdictPolicy::Contains);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, LintError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }
}

/// Path rules used to categorize changed files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Glob patterns matched against the file name for model files.
    #[serde(default = "default_model_patterns")]
    pub model_patterns: Vec<String>,
    /// Directory names that mark migration scripts.
    #[serde(default = "default_migration_dirs")]
    pub migration_dirs: Vec<String>,
    /// File extensions (without the dot) a migration script may have.
    #[serde(default = "default_migration_extensions")]
    pub migration_extensions: Vec<String>,
}

fn default_model_patterns() -> Vec<String> {
    vec!["*.model.ts".into(), "*.model.js".into()]
}

fn default_migration_dirs() -> Vec<String> {
    vec!["migrations".into()]
}

fn default_migration_extensions() -> Vec<String> {
    vec!["ts".into(), "js".into()]
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            model_patterns: default_model_patterns(),
            migration_dirs: default_migration_dirs(),
            migration_extensions: default_migration_extensions(),
        }
    }
}

/// Where prompt templates live and which token receives the changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Template directory, relative to the working directory.
    #[serde(default = "default_prompt_dir")]
    pub dir: PathBuf,
    /// Token replaced by the rendered change summary.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from(".github/migralint")
}

fn default_placeholder() -> String {
    "{{CHANGES}}".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            dir: default_prompt_dir(),
            placeholder: default_placeholder(),
        }
    }
}

/// Review request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// How the reply is judged (default: `exact`).
    #[serde(default)]
    pub verdict_policy: VerdictPolicy,
    /// Request timeout in seconds (default: 120).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Override for the provider's API base URL.
    pub base_url: Option<String>,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            verdict_policy: VerdictPolicy::default(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

/// GitHub API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// API root for GitHub Enterprise (default: `https://api.github.com`).
    pub api_url: Option<String>,
}
