//! Path-based file categorization.
//!
//! Model files are recognized by file-name glob patterns, migrations by a
//! directory segment plus extension. Model rules win when both match.

use std::path::{Component, Path};

use migralint_core::{ClassifyConfig, FileCategory, LintError};

/// Compiled classification rules.
///
/// # Examples
///
/// ```
/// use migralint_core::FileCategory;
/// use migralint_difflens::classify::FileClassifier;
///
/// let classifier = FileClassifier::default_rules();
/// assert_eq!(classifier.category("src/models/agent.model.ts"), FileCategory::Model);
/// assert_eq!(classifier.category("db/migrations/001-init.js"), FileCategory::Migration);
/// assert_eq!(classifier.category("README.md"), FileCategory::Other);
/// ```
#[derive(Debug, Clone)]
pub struct FileClassifier {
    model_patterns: Vec<glob::Pattern>,
    migration_dirs: Vec<String>,
    migration_extensions: Vec<String>,
}

impl FileClassifier {
    /// Rules for `*.model.ts` / `*.model.js` models and `migrations/` scripts.
    pub fn default_rules() -> Self {
        // The default patterns are literals that always compile.
        Self::from_config(&ClassifyConfig::default()).unwrap_or_else(|_| Self {
            model_patterns: Vec::new(),
            migration_dirs: Vec::new(),
            migration_extensions: Vec::new(),
        })
    }

    /// Compile the rules from settings.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Config`] if a model pattern is not a valid glob.
    ///
    /// # Examples
    ///
    /// ```
    /// use migralint_core::{ClassifyConfig, FileCategory};
    /// use migralint_difflens::classify::FileClassifier;
    ///
    /// let config = ClassifyConfig {
    ///     model_patterns: vec!["*.entity.ts".into()],
    ///     ..ClassifyConfig::default()
    /// };
    /// let classifier = FileClassifier::from_config(&config).unwrap();
    /// assert_eq!(classifier.category("src/agent.entity.ts"), FileCategory::Model);
    /// assert_eq!(classifier.category("src/agent.model.ts"), FileCategory::Other);
    /// ```
    pub fn from_config(config: &ClassifyConfig) -> Result<Self, LintError> {
        let mut model_patterns = Vec::with_capacity(config.model_patterns.len());
        for pat in &config.model_patterns {
            let compiled = glob::Pattern::new(pat).map_err(|e| {
                LintError::Config(format!("invalid model pattern '{pat}': {e}"))
            })?;
            model_patterns.push(compiled);
        }

        Ok(Self {
            model_patterns,
            migration_dirs: config
                .migration_dirs
                .iter()
                .map(|d| d.trim_matches('/').to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            migration_extensions: config
                .migration_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
        })
    }

    /// Categorize a repository-relative path.
    pub fn category(&self, path: &str) -> FileCategory {
        let normalized = path.replace('\\', "/");
        let path = Path::new(&normalized);

        if self.is_model(path) {
            FileCategory::Model
        } else if self.is_migration(path) {
            FileCategory::Migration
        } else {
            FileCategory::Other
        }
    }

    fn is_model(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.model_patterns.iter().any(|p| p.matches(name))
    }

    fn is_migration(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.migration_extensions.iter().any(|m| m == ext));
        if !has_extension {
            return false;
        }

        let Some(parent) = path.parent() else {
            return false;
        };
        let segments: Vec<&str> = parent
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();

        // Entries like "db/migrate" must match as consecutive segments.
        self.migration_dirs.iter().any(|dir| {
            let wanted: Vec<&str> = dir.split('/').collect();
            segments.windows(wanted.len()).any(|w| w == wanted.as_slice())
        })
    }
}
