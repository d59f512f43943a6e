use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of a changed file, decided by its path.
///
/// # Examples
///
/// ```
/// use migralint_core::FileCategory;
///
/// assert_eq!(FileCategory::Migration.to_string(), "migration");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// ORM model definition (`*.model.ts`, `*.model.js`).
    Model,
    /// Database migration script.
    Migration,
    /// Anything else.
    Other,
}

impl FileCategory {
    /// Whether the reviewer should also receive the full file content.
    pub fn wants_full_content(self) -> bool {
        matches!(self, FileCategory::Model | FileCategory::Migration)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileCategory::Model => write!(f, "model"),
            FileCategory::Migration => write!(f, "migration"),
            FileCategory::Other => write!(f, "other"),
        }
    }
}

/// A single changed file with its diff and, for models and migrations, its
/// current content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path relative to the repository root, as given in `CHANGED_FILES`.
    pub path: String,
    /// Textual diff against the base revision. Empty when unavailable.
    pub diff_text: String,
    /// Full current content, only for models and migrations that are readable.
    pub full_content: Option<String>,
    /// Category derived from the path.
    pub category: FileCategory,
}

/// Categorized set of changed files for one pull request.
///
/// Every file is recorded in `files` (input order) and in exactly one of the
/// three path sets matching its category.
///
/// # Examples
///
/// ```
/// use migralint_core::{ChangedFile, DiffBundle, FileCategory};
///
/// let mut bundle = DiffBundle::default();
/// bundle.push(ChangedFile {
///     path: "src/models/agent.model.ts".into(),
///     diff_text: String::new(),
///     full_content: None,
///     category: FileCategory::Model,
/// });
/// assert!(bundle.model_paths.contains("src/models/agent.model.ts"));
/// assert_eq!(bundle.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffBundle {
    /// Changed files in input order.
    pub files: Vec<ChangedFile>,
    /// Paths categorized as models.
    pub model_paths: BTreeSet<String>,
    /// Paths categorized as migrations.
    pub migration_paths: BTreeSet<String>,
    /// All remaining paths.
    pub other_paths: BTreeSet<String>,
}

impl DiffBundle {
    /// Append a file, recording its path in the set for its category.
    pub fn push(&mut self, file: ChangedFile) {
        let set = match file.category {
            FileCategory::Model => &mut self.model_paths,
            FileCategory::Migration => &mut self.migration_paths,
            FileCategory::Other => &mut self.other_paths,
        };
        set.insert(file.path.clone());
        self.files.push(file);
    }

    /// Number of files in the bundle.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` when no files changed.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `true` when at least one model or migration changed.
    pub fn has_schema_changes(&self) -> bool {
        !self.model_paths.is_empty() || !self.migration_paths.is_empty()
    }
}

/// How the reviewer's reply is turned into pass or fail.
///
/// # Examples
///
/// ```
/// use migralint_core::VerdictPolicy;
///
/// let policy: VerdictPolicy = "contains".parse().unwrap();
/// assert_eq!(policy, VerdictPolicy::Contains);
/// assert_eq!(VerdictPolicy::default(), VerdictPolicy::Exact);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictPolicy {
    /// The trimmed reply must be exactly `OK`.
    #[default]
    Exact,
    /// The reply must contain `OK` anywhere.
    Contains,
}

impl fmt::Display for VerdictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictPolicy::Exact => write!(f, "exact"),
            VerdictPolicy::Contains => write!(f, "contains"),
        }
    }
}

impl FromStr for VerdictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(VerdictPolicy::Exact),
            "contains" => Ok(VerdictPolicy::Contains),
            other => Err(format!("unknown verdict policy: {other}")),
        }
    }
}

/// The token a passing review must answer with.
pub const PASS_TOKEN: &str = "OK";

/// The reviewer's judgement on a bundle.
///
/// # Examples
///
/// ```
/// use migralint_core::{ReviewVerdict, VerdictPolicy};
///
/// let verdict = ReviewVerdict::evaluate("OK\n", VerdictPolicy::Exact);
/// assert!(verdict.passed);
///
/// let verdict = ReviewVerdict::evaluate("OK, but check naming", VerdictPolicy::Exact);
/// assert!(!verdict.passed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVerdict {
    /// Reply text exactly as returned by the provider.
    pub raw_text: String,
    /// Whether the reply counts as a pass under the configured policy.
    pub passed: bool,
}

impl ReviewVerdict {
    /// Judge `raw_text` under `policy`.
    pub fn evaluate(raw_text: impl Into<String>, policy: VerdictPolicy) -> Self {
        let raw_text = raw_text.into();
        let passed = match policy {
            VerdictPolicy::Exact => raw_text.trim() == PASS_TOKEN,
            VerdictPolicy::Contains => raw_text.contains(PASS_TOKEN),
        };
        Self { raw_text, passed }
    }
}

/// Wire format a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiShape {
    /// `/chat/completions` with role-tagged messages.
    Chat,
    /// `/completions` with a single prompt string.
    Completion,
}

/// External text-generation provider used as the reviewer.
///
/// Implements [`FromStr`] over the `AI_PROVIDER` keys.
///
/// # Examples
///
/// ```
/// use migralint_core::Provider;
///
/// let p: Provider = "openai".parse().unwrap();
/// assert_eq!(p, Provider::OpenAi);
/// assert_eq!(p.credential_var(), "OPENAI_API_KEY");
/// assert_eq!(Provider::default(), Provider::Gemini);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// Google Gemini through its OpenAI-compatible chat endpoint.
    #[default]
    #[serde(rename = "gemini")]
    Gemini,
    /// OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAi,
    /// OpenAI legacy text completions (single prompt string).
    #[serde(rename = "openai-legacy")]
    OpenAiLegacy,
}

impl Provider {
    /// All supported providers, primary first.
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::OpenAiLegacy];

    /// Key used in `AI_PROVIDER`.
    pub fn key(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::OpenAiLegacy => "openai-legacy",
        }
    }

    /// Name shown in logs and PR comments.
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Gemini => "Google Gemini",
            Provider::OpenAi => "OpenAI",
            Provider::OpenAiLegacy => "OpenAI (legacy completions)",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn credential_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::OpenAi | Provider::OpenAiLegacy => "OPENAI_API_KEY",
        }
    }

    /// Model identifier sent with every request.
    pub fn model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o",
            Provider::OpenAiLegacy => "gpt-3.5-turbo-instruct",
        }
    }

    /// Default API base URL; the request path is appended by [`Provider::path`].
    pub fn base_url(self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::OpenAi | Provider::OpenAiLegacy => "https://api.openai.com/v1",
        }
    }

    /// Request path relative to the base URL.
    pub fn path(self) -> &'static str {
        match self.shape() {
            ApiShape::Chat => "/chat/completions",
            ApiShape::Completion => "/completions",
        }
    }

    /// Request/response shape.
    pub fn shape(self) -> ApiShape {
        match self {
            Provider::Gemini | Provider::OpenAi => ApiShape::Chat,
            Provider::OpenAiLegacy => ApiShape::Completion,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.key() == wanted)
            .ok_or_else(|| {
                let keys: Vec<&str> = Provider::ALL.iter().map(|p| p.key()).collect();
                format!(
                    "unsupported AI provider '{s}' (expected one of: {})",
                    keys.join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, category: FileCategory) -> ChangedFile {
        ChangedFile {
            path: path.into(),
            diff_text: String::new(),
            full_content: None,
            category,
        }
    }

    #[test]
    fn push_records_path_in_matching_set() {
        let mut bundle = DiffBundle::default();
        bundle.push(file("a.model.ts", FileCategory::Model));
        bundle.push(file("migrations/1.js", FileCategory::Migration));
        bundle.push(file("README.md", FileCategory::Other));

        assert_eq!(bundle.len(), 3);
        assert!(bundle.model_paths.contains("a.model.ts"));
        assert!(bundle.migration_paths.contains("migrations/1.js"));
        assert!(bundle.other_paths.contains("README.md"));
        assert!(bundle.has_schema_changes());
    }

    #[test]
    fn bundle_without_models_or_migrations_has_no_schema_changes() {
        let mut bundle = DiffBundle::default();
        bundle.push(file("README.md", FileCategory::Other));
        assert!(!bundle.has_schema_changes());
        assert!(!bundle.is_empty());
    }

    #[test]
    fn exact_policy_requires_bare_ok() {
        assert!(ReviewVerdict::evaluate("OK", VerdictPolicy::Exact).passed);
        assert!(ReviewVerdict::evaluate("  OK \n", VerdictPolicy::Exact).passed);
        assert!(!ReviewVerdict::evaluate("OK, but check naming", VerdictPolicy::Exact).passed);
        assert!(!ReviewVerdict::evaluate("ok", VerdictPolicy::Exact).passed);
        assert!(!ReviewVerdict::evaluate("", VerdictPolicy::Exact).passed);
    }

    #[test]
    fn contains_policy_accepts_ok_anywhere() {
        assert!(ReviewVerdict::evaluate("OK", VerdictPolicy::Contains).passed);
        assert!(ReviewVerdict::evaluate("OK, but check naming", VerdictPolicy::Contains).passed);
        assert!(!ReviewVerdict::evaluate("column agent_id is camelCase", VerdictPolicy::Contains).passed);
    }

    #[test]
    fn evaluate_keeps_raw_text() {
        let verdict = ReviewVerdict::evaluate(" OK\n", VerdictPolicy::Exact);
        assert_eq!(verdict.raw_text, " OK\n");
    }

    #[test]
    fn verdict_policy_from_str() {
        assert_eq!("exact".parse::<VerdictPolicy>().unwrap(), VerdictPolicy::Exact);
        assert_eq!("CONTAINS".parse::<VerdictPolicy>().unwrap(), VerdictPolicy::Contains);
        assert!("fuzzy".parse::<VerdictPolicy>().is_err());
    }

    #[test]
    fn provider_from_str() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(
            "openai-legacy".parse::<Provider>().unwrap(),
            Provider::OpenAiLegacy
        );
        let err = "claude".parse::<Provider>().unwrap_err();
        assert!(err.contains("gemini"));
    }

    #[test]
    fn provider_shapes() {
        assert_eq!(Provider::Gemini.shape(), ApiShape::Chat);
        assert_eq!(Provider::OpenAi.path(), "/chat/completions");
        assert_eq!(Provider::OpenAiLegacy.path(), "/completions");
    }

    #[test]
    fn provider_key_round_trips_through_serde() {
        let json = serde_json::to_string(&Provider::OpenAiLegacy).unwrap();
        assert_eq!(json, "\"openai-legacy\"");
        for p in Provider::ALL {
            assert_eq!(p.key().parse::<Provider>().unwrap(), p);
        }
    }

    #[test]
    fn bundle_serializes_camel_case() {
        let mut bundle = DiffBundle::default();
        bundle.push(file("a.model.ts", FileCategory::Model));
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("modelPaths").is_some());
        assert_eq!(json["files"][0]["category"], "model");
    }
}
