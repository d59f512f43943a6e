use std::fmt::Write;
use std::path::{Path, PathBuf};

use migralint_core::{ChangedFile, DiffBundle, FileCategory, LintError, PromptConfig};
use tracing::{debug, warn};

/// System prompt template file name.
pub const SYSTEM_TEMPLATE: &str = "system.md";
/// User prompt template file name.
pub const USER_TEMPLATE: &str = "user.md";
/// Single-file template used when the system/user pair is absent.
pub const LEGACY_TEMPLATE: &str = "prompt.md";

/// The two prompts sent to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    /// Instructions for the reviewer.
    pub system: String,
    /// The rendered changes to review.
    pub user: String,
}

/// Renders review prompts from the template directory.
///
/// # Examples
///
/// ```
/// use migralint_core::{DiffBundle, PromptConfig};
/// use migralint_review::prompt::PromptAssembler;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("system.md"), "Check naming.").unwrap();
/// std::fs::write(dir.path().join("user.md"), "Changes:\n{{CHANGES}}").unwrap();
///
/// let assembler = PromptAssembler::new(&PromptConfig {
///     dir: dir.path().to_path_buf(),
///     ..PromptConfig::default()
/// });
/// let prompts = assembler.assemble(&DiffBundle::default()).unwrap();
/// assert_eq!(prompts.system, "Check naming.");
/// assert!(prompts.user.starts_with("Changes:\n"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    dir: PathBuf,
    placeholder: String,
}

enum Templates {
    Pair { system: String, user: String },
    Legacy(String),
}

impl PromptAssembler {
    /// Create an assembler for the configured directory and placeholder.
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            placeholder: config.placeholder.clone(),
        }
    }

    /// Render the system and user prompts for `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`LintError::Config`] when neither `system.md` + `user.md` nor
    /// `prompt.md` exists, and [`LintError::Io`] if a present template
    /// cannot be read.
    pub fn assemble(&self, bundle: &DiffBundle) -> Result<Prompts, LintError> {
        let changes = render_changes(bundle);
        let prompts = match self.load_templates()? {
            Templates::Pair { system, user } => Prompts {
                system: system.trim().to_string(),
                user: self.fill_user(&user, &changes),
            },
            Templates::Legacy(template) => self.split_legacy(&template, &changes),
        };
        debug!(
            system_chars = prompts.system.len(),
            user_chars = prompts.user.len(),
            "assembled prompts"
        );
        Ok(prompts)
    }

    fn load_templates(&self) -> Result<Templates, LintError> {
        let system_path = self.dir.join(SYSTEM_TEMPLATE);
        let user_path = self.dir.join(USER_TEMPLATE);
        if system_path.is_file() && user_path.is_file() {
            return Ok(Templates::Pair {
                system: read_template(&system_path)?,
                user: read_template(&user_path)?,
            });
        }

        let legacy_path = self.dir.join(LEGACY_TEMPLATE);
        if legacy_path.is_file() {
            debug!(path = %legacy_path.display(), "using legacy combined template");
            return Ok(Templates::Legacy(read_template(&legacy_path)?));
        }

        Err(LintError::Config(format!(
            "no prompt templates found in {}: expected {SYSTEM_TEMPLATE} and {USER_TEMPLATE}, or {LEGACY_TEMPLATE}",
            self.dir.display()
        )))
    }

    fn fill_user(&self, template: &str, changes: &str) -> String {
        if template.contains(&self.placeholder) {
            template.replacen(&self.placeholder, changes, 1)
        } else {
            warn!(
                placeholder = %self.placeholder,
                "user template has no placeholder, appending changes"
            );
            format!("{}\n\n{changes}", template.trim_end())
        }
    }

    /// Text before the marker is the system prompt; the changes plus any text
    /// after the marker form the user prompt.
    fn split_legacy(&self, template: &str, changes: &str) -> Prompts {
        match template.split_once(&self.placeholder) {
            Some((before, after)) => {
                let mut user = changes.to_string();
                let after = after.trim();
                if !after.is_empty() {
                    user.push_str("\n\n");
                    user.push_str(after);
                }
                Prompts {
                    system: before.trim().to_string(),
                    user,
                }
            }
            None => {
                warn!(
                    placeholder = %self.placeholder,
                    "legacy template has no placeholder, using it whole as system prompt"
                );
                Prompts {
                    system: template.trim().to_string(),
                    user: changes.to_string(),
                }
            }
        }
    }
}

fn read_template(path: &Path) -> Result<String, LintError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Render the Markdown summary of a bundle that replaces the placeholder.
///
/// # Examples
///
/// ```
/// use migralint_core::{ChangedFile, DiffBundle, FileCategory};
/// use migralint_review::prompt::render_changes;
///
/// let mut bundle = DiffBundle::default();
/// bundle.push(ChangedFile {
///     path: "src/models/agent.model.ts".into(),
///     diff_text: "+  agencyId: number;".into(),
///     full_content: None,
///     category: FileCategory::Model,
/// });
/// let text = render_changes(&bundle);
/// assert!(text.contains("Model files (1)"));
/// assert!(text.contains("+  agencyId: number;"));
/// ```
pub fn render_changes(bundle: &DiffBundle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Changed files\n");
    write_group(&mut out, "Model files", bundle.model_paths.iter());
    write_group(&mut out, "Migration files", bundle.migration_paths.iter());
    write_group(&mut out, "Other files", bundle.other_paths.iter());

    for file in &bundle.files {
        out.push('\n');
        write_file(&mut out, file);
    }
    out
}

fn write_group<'a>(out: &mut String, label: &str, paths: impl ExactSizeIterator<Item = &'a String>) {
    let count = paths.len();
    if count == 0 {
        let _ = writeln!(out, "- {label} (0): none");
        return;
    }
    let names: Vec<String> = paths.map(|p| format!("`{p}`")).collect();
    let _ = writeln!(out, "- {label} ({count}): {}", names.join(", "));
}

fn write_file(out: &mut String, file: &ChangedFile) {
    let _ = writeln!(out, "### `{}` ({})\n", file.path, file.category);

    if file.diff_text.trim().is_empty() {
        let _ = writeln!(out, "_No diff available._");
    } else {
        write_block(out, "diff", &file.diff_text);
    }

    if let Some(content) = &file.full_content {
        let _ = writeln!(out, "\nFull content:\n");
        write_block(out, language_hint(&file.path, file.category), content);
    }
}

fn write_block(out: &mut String, lang: &str, body: &str) {
    let fence = fence_for(body);
    let _ = writeln!(out, "{fence}{lang}");
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "{fence}");
}

/// A backtick fence longer than any backtick run inside `body`.
pub(crate) fn fence_for(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in body.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

fn language_hint(path: &str, category: FileCategory) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("ts") => "typescript",
        Some("js") => "javascript",
        _ if category == FileCategory::Other => "",
        _ => "text",
    }
}
