//! Companion-path derivation for a watched document.
//!
//! A LaTeX build leaves a family of files next to the source: the typeset
//! artifact (`paper.pdf`), the build log (`paper.log`) and our draft copy
//! (`paper_draft.pdf`). These are pure functions of the document path plus
//! the configured extensions; nothing here touches the filesystem and the
//! results are never cached across reactions.

use std::path::{Path, PathBuf};

/// The companion paths derived from one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPaths {
    /// Typeset output, e.g. `paper.pdf`.
    pub artifact: PathBuf,
    /// Build log, e.g. `paper.log`.
    pub log: PathBuf,
    /// Draft copy of the artifact, e.g. `paper_draft.pdf`.
    pub draft: PathBuf,
}

impl DerivedPaths {
    /// Derive all companion paths from a document path.
    pub fn for_document(
        document: &Path,
        artifact_ext: &str,
        log_ext: &str,
        draft_suffix: &str,
    ) -> Self {
        Self {
            artifact: swap_extension(document, artifact_ext),
            log: swap_extension(document, log_ext),
            draft: insert_suffix(&swap_extension(document, artifact_ext), draft_suffix),
        }
    }
}

/// Replace the path's extension, appending one if it has none.
pub fn swap_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Insert a suffix between the file stem and the extension.
///
/// `paper.pdf` with suffix `_draft` becomes `paper_draft.pdf`. A path with
/// no extension just gets the suffix appended to the stem.
pub fn insert_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };

    path.with_file_name(name)
}

/// Relativize `target` against `base_dir`, falling back to the target as
/// given when it does not live under the base.
///
/// Separators are normalized to `/` because the result is spliced into
/// document markup, which uses forward slashes on every platform.
pub fn relative_for_markup(target: &Path, base_dir: &Path) -> String {
    let rel = target.strip_prefix(base_dir).unwrap_or(target);
    rel.to_string_lossy().replace('\\', "/")
}
