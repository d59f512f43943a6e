mod common;

use std::path::Path;

use common::RecordingSink;
use migralint_core::{
    LintConfig, LintError, LintSettings, PromptConfig, Provider, ReviewConfig, RunContext,
    VerdictPolicy,
};
use migralint_difflens::source::DiffSource;
use migralint_review::pipeline::LintPipeline;
use migralint_review::report::Outcome;

/// Serves fixed diffs; paths under `gone/` fail like deleted files.
struct StaticSource;

impl DiffSource for StaticSource {
    fn diff(&self, _base: &str, path: &str) -> Result<String, LintError> {
        if path.starts_with("gone/") {
            return Err(LintError::Git(format!("no such path {path}")));
        }
        Ok(format!("+changed {path}\n"))
    }

    fn read(&self, path: &str) -> Option<String> {
        (!path.starts_with("gone/")).then(|| format!("// {path}\n"))
    }
}

fn write_templates(dir: &Path) {
    std::fs::write(dir.join("system.md"), "Check naming between models and migrations.").unwrap();
    std::fs::write(dir.join("user.md"), "{{CHANGES}}\nAnswer OK if consistent.").unwrap();
}

fn config(prompt_dir: &Path, base_url: &str, changed: &[&str]) -> LintConfig {
    LintConfig {
        settings: LintSettings {
            prompt: PromptConfig {
                dir: prompt_dir.to_path_buf(),
                ..PromptConfig::default()
            },
            review: ReviewConfig {
                base_url: Some(base_url.to_string()),
                timeout_secs: 5,
                verdict_policy: VerdictPolicy::Exact,
            },
            ..LintSettings::default()
        },
        run: RunContext {
            base_ref: "main".into(),
            changed_files: changed.iter().map(|s| s.to_string()).collect(),
            owner: "acme".into(),
            repo: "agency".into(),
            pr_number: 9,
            github_token: "ghs_x".into(),
            provider: Provider::Gemini,
            provider_credential: "g-key".into(),
            post_success_comments: false,
            debug_thinking: false,
        },
    }
}

const CHANGED: [&str; 3] = [
    "src/models/agent.model.ts",
    "src/migrations/20240101-init.js",
    "README.md",
];

#[tokio::test]
async fn ok_verdict_without_success_comments_exits_zero_silently() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let (url, server) = common::serve_once(200, &common::chat_reply("OK")).await;
    let config = config(dir.path(), &url, &CHANGED);
    let sink = RecordingSink::default();

    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    let outcome = pipeline.run(&config.run).await.unwrap();

    assert_eq!(outcome, Outcome::Passed);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(sink.call_count(), 0);

    let request = server.await.unwrap();
    assert!(request.contains("src/models/agent.model.ts"));
    assert!(request.contains("Model files (1)"));
    assert!(request.contains("Migration files (1)"));
}

#[tokio::test]
async fn ok_verdict_with_success_comments_posts_once() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let (url, _server) = common::serve_once(200, &common::chat_reply("OK")).await;
    let mut config = config(dir.path(), &url, &CHANGED);
    config.run.post_success_comments = true;
    let sink = RecordingSink::default();

    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    let outcome = pipeline.run(&config.run).await.unwrap();

    assert_eq!(outcome, Outcome::Passed);
    assert_eq!(sink.call_count(), 1);
}

#[tokio::test]
async fn violations_post_comment_and_exit_one() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let reply = "Model field agencyId has no matching column; migration adds agency_ref.";
    let (url, _server) = common::serve_once(200, &common::chat_reply(reply)).await;
    let config = config(dir.path(), &url, &CHANGED);
    let sink = RecordingSink::default();

    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    let outcome = pipeline.run(&config.run).await.unwrap();

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(outcome.exit_code(), 1);
    let posts = pipeline.sink().posts.lock().unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].contains(reply));
    assert!(posts[0].contains("Google Gemini"));
}

#[tokio::test]
async fn review_http_500_fails_before_posting() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let (url, _server) = common::serve_once(500, r#"{"error":"boom"}"#).await;
    let config = config(dir.path(), &url, &CHANGED);
    let sink = RecordingSink::default();

    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    let err = pipeline.run(&config.run).await.unwrap_err();

    assert!(matches!(err, LintError::RemoteService { status: 500, .. }));
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn missing_templates_fail_without_calling_provider() {
    let dir = tempfile::tempdir().unwrap();
    let url = common::closed_endpoint().await;
    let config = config(dir.path(), &url, &CHANGED);
    let sink = RecordingSink::default();

    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    let err = pipeline.run(&config.run).await.unwrap_err();

    assert!(matches!(err, LintError::Config(_)));
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn nothing_to_check_without_schema_changes() {
    let dir = tempfile::tempdir().unwrap();
    let url = common::closed_endpoint().await;
    let sink = RecordingSink::default();

    let config = config(dir.path(), &url, &["README.md", "src/index.ts"]);
    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    assert_eq!(
        pipeline.run(&config.run).await.unwrap(),
        Outcome::NothingToCheck
    );

    let config = self::config(dir.path(), &url, &[]);
    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    assert_eq!(
        pipeline.run(&config.run).await.unwrap(),
        Outcome::NothingToCheck
    );
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn deleted_file_still_reviewed() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let (url, server) = common::serve_once(200, &common::chat_reply("OK")).await;
    let config = config(
        dir.path(),
        &url,
        &["gone/agency.model.ts", "src/migrations/002-drop-agency.js"],
    );

    let pipeline =
        LintPipeline::from_config(&config, StaticSource, RecordingSink::default()).unwrap();
    let outcome = pipeline.run(&config.run).await.unwrap();

    assert_eq!(outcome, Outcome::Passed);
    let request = server.await.unwrap();
    assert!(request.contains("gone/agency.model.ts"));
    assert!(request.contains("_No diff available._"));
}

#[tokio::test]
async fn contains_policy_accepts_qualified_ok() {
    let dir = tempfile::tempdir().unwrap();
    write_templates(dir.path());
    let (url, _server) =
        common::serve_once(200, &common::chat_reply("OK, but check naming")).await;
    let mut config = config(dir.path(), &url, &CHANGED);
    config.settings.review.verdict_policy = VerdictPolicy::Contains;
    let sink = RecordingSink::default();

    let pipeline = LintPipeline::from_config(&config, StaticSource, sink.clone()).unwrap();
    assert_eq!(pipeline.run(&config.run).await.unwrap(), Outcome::Passed);
    assert_eq!(sink.call_count(), 0);
}
