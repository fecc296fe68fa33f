//! Invocation adapter for the external PDF comparison tool.
//!
//! The tool is a black box: `<interpreter> <tool> <old> <new> --output-dir
//! <dir> --dpi <n>`, exit 0 with newline-delimited artifact paths on stdout,
//! nonzero with diagnostics on stderr. Argument passing is exec-style, so
//! paths with spaces need no quoting here.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::ReactionError;

/// Builds and runs the comparison command and parses its output.
#[derive(Debug, Clone)]
pub struct DiffTool {
    interpreter: String,
    tool_path: PathBuf,
    dpi: u32,
    image_extensions: Vec<String>,
}

impl DiffTool {
    pub fn new(
        interpreter: impl Into<String>,
        tool_path: impl Into<PathBuf>,
        dpi: u32,
        image_extensions: Vec<String>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            tool_path: tool_path.into(),
            dpi,
            image_extensions,
        }
    }

    /// Compare `old` against `new`, writing rendered differences into
    /// `output_dir`.
    ///
    /// Returns the generated image paths in the order the tool emitted them
    /// (page order is the tool's responsibility). Fails with `ExternalTool`
    /// on spawn failure or nonzero exit and `NoDifferences` when no output
    /// line looks like an image artifact.
    pub async fn run(
        &self,
        old: &Path,
        new: &Path,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ReactionError> {
        crate::debug_event!(
            "difftool",
            "spawning",
            "{} {} {} {}",
            self.interpreter,
            self.tool_path.display(),
            old.display(),
            new.display()
        );

        let output = Command::new(&self.interpreter)
            .arg(&self.tool_path)
            .arg(old)
            .arg(new)
            .arg("--output-dir")
            .arg(output_dir)
            .arg("--dpi")
            .arg(self.dpi.to_string())
            .output()
            .await
            .map_err(|e| ReactionError::ExternalTool {
                detail: format!("failed to spawn {}: {e}", self.interpreter),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ReactionError::ExternalTool { detail });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let artifacts = self.parse_output(&stdout);

        if artifacts.is_empty() {
            return Err(ReactionError::NoDifferences);
        }

        Ok(artifacts)
    }

    /// Keep stdout lines whose filename suffix is a recognized image
    /// extension; the tool may interleave progress chatter.
    fn parse_output(&self, stdout: &str) -> Vec<PathBuf> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| self.is_image(line))
            .map(PathBuf::from)
            .collect()
    }

    fn is_image(&self, line: &str) -> bool {
        Path::new(line)
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                self.image_extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> DiffTool {
        DiffTool::new(
            "python3",
            "compare_pdfs.py",
            200,
            vec!["png".into(), "jpg".into(), "jpeg".into()],
        )
    }

    #[test]
    fn test_parse_keeps_only_images_in_order() {
        let stdout = "processing page 1\nimages/page_1_diff.png\nnotes.txt\nimages/page_3_diff.png\n";
        let artifacts = tool().parse_output(stdout);

        assert_eq!(
            artifacts,
            vec![
                PathBuf::from("images/page_1_diff.png"),
                PathBuf::from("images/page_3_diff.png"),
            ]
        );
    }

    #[test]
    fn test_parse_trims_and_skips_blank_lines() {
        let stdout = "  images/page_1_diff.PNG  \n\n\n";
        let artifacts = tool().parse_output(stdout);

        assert_eq!(artifacts, vec![PathBuf::from("images/page_1_diff.PNG")]);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(tool().parse_output("").is_empty());
    }
}
