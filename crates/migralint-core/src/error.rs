/// Errors that can occur while linting a pull request.
///
/// Library crates return this type directly; the binary converts to a
/// `miette` diagnostic at the boundary and exits non-zero.
///
/// # Examples
///
/// ```
/// use migralint_core::LintError;
///
/// let err = LintError::Config("GITHUB_TOKEN is not set".into());
/// assert!(err.to_string().contains("GITHUB_TOKEN"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing environment, templates, credentials, or an unknown provider.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git invocation failure.
    #[error("git error: {0}")]
    Git(String),

    /// A remote endpoint answered with a non-success HTTP status.
    #[error("{service} returned HTTP {status}: {body}")]
    RemoteService {
        /// Human-readable name of the remote service.
        service: String,
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the service.
        body: String,
    },

    /// A remote endpoint answered, but without the expected field.
    #[error("malformed response from {service}: {detail}")]
    MalformedResponse {
        /// Human-readable name of the remote service.
        service: String,
        /// What was missing or unreadable.
        detail: String,
    },

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// GitHub client construction or API failure.
    #[error("GitHub error: {0}")]
    Github(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Settings file parse failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
