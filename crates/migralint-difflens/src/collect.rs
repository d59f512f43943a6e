//! Builds the categorized [`DiffBundle`] for a pull request.

use std::collections::HashSet;

use migralint_core::{ChangedFile, DiffBundle};
use tracing::{debug, info, warn};

use crate::classify::FileClassifier;
use crate::source::DiffSource;

/// Collects diffs for changed paths and sorts them into models, migrations,
/// and everything else.
///
/// # Examples
///
/// ```
/// use migralint_core::LintError;
/// use migralint_difflens::classify::FileClassifier;
/// use migralint_difflens::collect::DiffClassifier;
/// use migralint_difflens::source::DiffSource;
///
/// struct NoGit;
/// impl DiffSource for NoGit {
///     fn diff(&self, _base: &str, _path: &str) -> Result<String, LintError> {
///         Err(LintError::Git("no repository".into()))
///     }
///     fn read(&self, _path: &str) -> Option<String> {
///         None
///     }
/// }
///
/// let classifier = DiffClassifier::new(FileClassifier::default_rules(), NoGit);
/// let bundle = classifier.classify(&["src/models/agent.model.ts".to_string()], "main");
/// assert_eq!(bundle.files[0].diff_text, "");
/// assert!(bundle.model_paths.contains("src/models/agent.model.ts"));
/// ```
pub struct DiffClassifier<S> {
    rules: FileClassifier,
    source: S,
}

impl<S: DiffSource> DiffClassifier<S> {
    /// Create a classifier reading from `source`.
    pub fn new(rules: FileClassifier, source: S) -> Self {
        Self { rules, source }
    }

    /// Diff and categorize every path against `base_ref`.
    ///
    /// Never fails: a path whose diff cannot be produced gets an empty diff
    /// and a warning. Input order is kept; repeated paths are collapsed.
    pub fn classify(&self, changed_paths: &[String], base_ref: &str) -> DiffBundle {
        let base = self.source.resolve_base(base_ref);
        let mut seen = HashSet::new();
        let mut bundle = DiffBundle::default();

        for path in changed_paths {
            if !seen.insert(path.as_str()) {
                debug!(path, "skipping duplicate path");
                continue;
            }

            let category = self.rules.category(path);
            let diff_text = match self.source.diff(&base, path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path, error = %e, "could not retrieve diff, continuing with empty diff");
                    String::new()
                }
            };
            let full_content = if category.wants_full_content() {
                self.source.read(path)
            } else {
                None
            };

            debug!(path, %category, diff_bytes = diff_text.len(), "classified");
            bundle.push(ChangedFile {
                path: path.clone(),
                diff_text,
                full_content,
                category,
            });
        }

        info!(
            models = bundle.model_paths.len(),
            migrations = bundle.migration_paths.len(),
            other = bundle.other_paths.len(),
            base = %base,
            "classified changed files"
        );
        bundle
    }
}
