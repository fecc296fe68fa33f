//! Marker-based document splicing.
//!
//! Replaces every occurrence of the anchor marker in a document with one
//! generated image block. All replacements are computed against the original
//! text and applied in a single sweep, so incremental position drift cannot
//! leave some anchors replaced and others not. A second pass strips any
//! marker instance the first scan did not see before the one write-back.

use std::path::{Path, PathBuf};

use crate::error::ReactionError;
use crate::paths::relative_for_markup;

/// Splices generated artifacts into a document at anchor markers.
#[derive(Debug, Clone)]
pub struct Splicer {
    marker: String,
}

impl Splicer {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Fill every anchor in `document` with a block built from `artifacts`.
    ///
    /// The block is computed once and inserted verbatim at each occurrence.
    /// Returns the number of anchors filled; fails with `NoAnchor` (and
    /// leaves the file untouched) when the marker never occurs.
    pub async fn splice(
        &self,
        document: &Path,
        artifacts: &[PathBuf],
    ) -> Result<usize, ReactionError> {
        let text = tokio::fs::read_to_string(document)
            .await
            .map_err(|source| ReactionError::Io {
                path: document.to_path_buf(),
                source,
            })?;

        let doc_dir = document.parent().unwrap_or_else(|| Path::new("."));
        let block = render_block(artifacts, doc_dir);

        let (spliced, count) = replace_all_markers(&text, &self.marker, &block);
        if count == 0 {
            return Err(ReactionError::NoAnchor {
                document: document.to_path_buf(),
                marker: self.marker.clone(),
            });
        }

        // Cleanup pass: a marker inside the generated block or introduced
        // between scan and edit must not survive the save.
        let (cleaned, _) = replace_all_markers(&spliced, &self.marker, "");

        tokio::fs::write(document, cleaned)
            .await
            .map_err(|source| ReactionError::Io {
                path: document.to_path_buf(),
                source,
            })?;

        Ok(count)
    }
}

/// Render the replacement block: one `\includegraphics` entry per artifact,
/// relative to the document's directory, joined with a blank line.
pub fn render_block(artifacts: &[PathBuf], doc_dir: &Path) -> String {
    artifacts
        .iter()
        .map(|artifact| {
            let rel = relative_for_markup(artifact, doc_dir);
            format!("\\noindent\\includegraphics[width=\\linewidth]{{{rel}}}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Replace every occurrence of `marker` in `text` with `replacement`.
///
/// Occurrences are located against the original text first, then the output
/// is assembled in one sweep. Returns the new text and the occurrence count.
pub fn replace_all_markers(text: &str, marker: &str, replacement: &str) -> (String, usize) {
    if marker.is_empty() {
        return (text.to_string(), 0);
    }

    let positions: Vec<usize> = text.match_indices(marker).map(|(i, _)| i).collect();
    if positions.is_empty() {
        return (text.to_string(), 0);
    }

    let mut out = String::with_capacity(text.len() + replacement.len() * positions.len());
    let mut cursor = 0;
    for &pos in &positions {
        out.push_str(&text[cursor..pos]);
        out.push_str(replacement);
        cursor = pos + marker.len();
    }
    out.push_str(&text[cursor..]);

    (out, positions.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "%ANCHOR%";

    fn artifacts() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/work/images/page_1_diff.png"),
            PathBuf::from("/work/images/page_2_diff.png"),
        ]
    }

    #[test]
    fn test_replace_all_occurrences_identically() {
        let text = "intro\n%ANCHOR%\nmiddle\n%ANCHOR%\nend\n";
        let (out, count) = replace_all_markers(text, MARKER, "BLOCK");

        assert_eq!(count, 2);
        assert_eq!(out, "intro\nBLOCK\nmiddle\nBLOCK\nend\n");
        assert!(!out.contains(MARKER));
    }

    #[test]
    fn test_replace_adjacent_markers() {
        let (out, count) = replace_all_markers("%ANCHOR%%ANCHOR%", MARKER, "x");

        assert_eq!(count, 2);
        assert_eq!(out, "xx");
    }

    #[test]
    fn test_no_markers_leaves_text_alone() {
        let (out, count) = replace_all_markers("plain text", MARKER, "x");

        assert_eq!(count, 0);
        assert_eq!(out, "plain text");
    }

    #[test]
    fn test_render_block_is_relative_with_forward_slashes() {
        let block = render_block(&artifacts(), Path::new("/work"));

        assert_eq!(
            block,
            "\\noindent\\includegraphics[width=\\linewidth]{images/page_1_diff.png}\n\n\
             \\noindent\\includegraphics[width=\\linewidth]{images/page_2_diff.png}"
        );
    }

    #[tokio::test]
    async fn test_splice_fills_every_anchor() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = dir.path().join("paper.tex");
        std::fs::write(&doc, "a\n%ANCHOR%\nb\n%ANCHOR%\nc\n").unwrap();

        let images = vec![
            dir.path().join("images/page_1_diff.png"),
            dir.path().join("images/page_2_diff.png"),
        ];

        let count = Splicer::new(MARKER).splice(&doc, &images).await.unwrap();
        assert_eq!(count, 2);

        let out = std::fs::read_to_string(&doc).unwrap();
        assert!(!out.contains(MARKER));
        assert_eq!(out.matches("page_1_diff.png").count(), 2);
        assert_eq!(out.matches("page_2_diff.png").count(), 2);
    }

    #[tokio::test]
    async fn test_splice_without_anchor_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = dir.path().join("paper.tex");
        std::fs::write(&doc, "no markers here\n").unwrap();

        let err = Splicer::new(MARKER)
            .splice(&doc, &artifacts())
            .await
            .unwrap_err();

        assert!(matches!(err, ReactionError::NoAnchor { .. }));
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), "no markers here\n");
    }
}
