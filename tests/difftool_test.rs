//! Contract tests for the comparison-tool adapter, using shell scripts as
//! stand-ins for the real tool.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use texwatch::DiffTool;
use texwatch::error::ReactionError;

fn write_tool(dir: &Path, body: &str) -> PathBuf {
    let script = dir.join("fake_tool.sh");
    std::fs::write(&script, body).unwrap();
    script
}

fn adapter(script: PathBuf) -> DiffTool {
    DiffTool::new(
        "sh",
        script,
        200,
        vec!["png".into(), "jpg".into(), "jpeg".into()],
    )
}

#[tokio::test]
async fn test_success_returns_images_in_emitted_order() {
    let dir = TempDir::new().unwrap();
    let script = write_tool(
        dir.path(),
        "echo images/page_2_diff.png\n\
         echo rendering page 3\n\
         echo images/page_3_diff.png\n",
    );

    let artifacts = adapter(script)
        .run(
            Path::new("old.pdf"),
            Path::new("new.pdf"),
            Path::new("images"),
        )
        .await
        .unwrap();

    assert_eq!(
        artifacts,
        vec![
            PathBuf::from("images/page_2_diff.png"),
            PathBuf::from("images/page_3_diff.png"),
        ]
    );
}

#[tokio::test]
async fn test_arguments_follow_the_tool_contract() {
    let dir = TempDir::new().unwrap();
    let argv_log = dir.path().join("argv.txt");
    let script = write_tool(
        dir.path(),
        &format!(
            "printf '%s\\n' \"$@\" > {}\necho out/page_1_diff.png\n",
            argv_log.display()
        ),
    );

    adapter(script)
        .run(
            Path::new("base line.pdf"),
            Path::new("fresh.pdf"),
            Path::new("out dir"),
        )
        .await
        .unwrap();

    let argv: Vec<String> = std::fs::read_to_string(&argv_log)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();

    // Exec-style argument passing keeps paths with spaces as single args
    assert_eq!(
        argv,
        vec![
            "base line.pdf",
            "fresh.pdf",
            "--output-dir",
            "out dir",
            "--dpi",
            "200"
        ]
    );
}

#[tokio::test]
async fn test_nonzero_exit_carries_stderr() {
    let dir = TempDir::new().unwrap();
    let script = write_tool(dir.path(), "echo 'cannot open pdf' >&2\nexit 3\n");

    let err = adapter(script)
        .run(Path::new("a.pdf"), Path::new("b.pdf"), Path::new("images"))
        .await
        .unwrap_err();

    match err {
        ReactionError::ExternalTool { detail } => assert_eq!(detail, "cannot open pdf"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_nonzero_exit_without_stderr_reports_status() {
    let dir = TempDir::new().unwrap();
    let script = write_tool(dir.path(), "exit 7\n");

    let err = adapter(script)
        .run(Path::new("a.pdf"), Path::new("b.pdf"), Path::new("images"))
        .await
        .unwrap_err();

    match err {
        ReactionError::ExternalTool { detail } => assert!(detail.contains("7")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_no_recognized_artifacts_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let script = write_tool(dir.path(), "echo all pages identical\n");

    let err = adapter(script)
        .run(Path::new("a.pdf"), Path::new("b.pdf"), Path::new("images"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReactionError::NoDifferences));
}

#[tokio::test]
async fn test_missing_interpreter_is_a_spawn_failure() {
    let tool = DiffTool::new(
        "definitely-not-a-real-interpreter",
        "tool.py",
        200,
        vec!["png".into()],
    );

    let err = tool
        .run(Path::new("a.pdf"), Path::new("b.pdf"), Path::new("images"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReactionError::ExternalTool { .. }));
}
