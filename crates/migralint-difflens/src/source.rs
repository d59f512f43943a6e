//! Where per-file diffs and contents come from.

use std::path::{Path, PathBuf};
use std::process::Command;

use migralint_core::LintError;
use tracing::debug;

/// Supplies diffs and current file contents to the classifier.
pub trait DiffSource {
    /// Pick the revision to diff against. Called once per run.
    fn resolve_base(&self, base_ref: &str) -> String {
        base_ref.to_string()
    }

    /// Diff of `path` between `base` and the current revision.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the diff cannot be produced; the
    /// classifier degrades that to an empty diff.
    fn diff(&self, base: &str, path: &str) -> Result<String, LintError>;

    /// Current content of `path`, or `None` if it cannot be read.
    fn read(&self, path: &str) -> Option<String>;
}

/// [`DiffSource`] backed by the `git` command line in a working tree.
///
/// # Examples
///
/// ```no_run
/// use migralint_difflens::source::{DiffSource, GitCli};
///
/// let git = GitCli::new(".");
/// let base = git.resolve_base("main");
/// let diff = git.diff(&base, "src/models/agent.model.ts").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    /// Use the working tree rooted at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Repository root this source reads from.
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn git(&self, args: &[&str]) -> Result<String, LintError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .output()
            .map_err(|e| LintError::Git(format!("failed to run git {}: {e}", args.join(" "))))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LintError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn ref_exists(&self, rev: &str) -> bool {
        let spec = format!("{rev}^{{commit}}");
        self.git(&["rev-parse", "--verify", "--quiet", &spec]).is_ok()
    }
}

impl DiffSource for GitCli {
    /// Prefer `origin/<base_ref>`: CI checkouts usually lack the local branch.
    fn resolve_base(&self, base_ref: &str) -> String {
        if !base_ref.starts_with("origin/") {
            let remote = format!("origin/{base_ref}");
            if self.ref_exists(&remote) {
                debug!(base = %remote, "using remote-tracking base ref");
                return remote;
            }
        }
        base_ref.to_string()
    }

    fn diff(&self, base: &str, path: &str) -> Result<String, LintError> {
        self.git(&["diff", base, "--", path])
    }

    fn read(&self, path: &str) -> Option<String> {
        match std::fs::read_to_string(self.repo_root.join(path)) {
            Ok(content) => Some(content),
            Err(e) => {
                debug!(path, error = %e, "full content unavailable");
                None
            }
        }
    }
}
