//! Decide what a finished workspace is handed back as.

use crate::fetch::MEDIA_EXTENSIONS;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// What the user receives for a workspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Deliverable {
    /// Exactly one media file, outside playlist mode.
    SingleFile { path: PathBuf },
    /// Everything under `root`, packaged as one archive.
    CollectionArchive { root: PathBuf },
}

/// Classification failures.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The workspace holds nothing at all
    #[error("workspace is empty")]
    EmptyResult,

    /// Listing the workspace failed
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<walkdir::Error> for ClassifyError {
    fn from(e: walkdir::Error) -> Self {
        ClassifyError::Io(e.into())
    }
}

/// Classify the contents of `workspace`.
///
/// 1. Not a playlist and exactly one media file: [`Deliverable::SingleFile`].
/// 2. Anything else that is non-empty: [`Deliverable::CollectionArchive`].
///
/// Subtitles and other side files never count as media.
pub fn classify(workspace: &Path, is_playlist: bool) -> Result<Deliverable, ClassifyError> {
    let mut entries = 0usize;
    let mut media = Vec::new();

    for entry in WalkDir::new(workspace).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        entries += 1;

        if entry.file_type().is_file() && is_media(entry.path()) {
            media.push(entry.into_path());
        }
    }

    tracing::debug!(entries, media = media.len(), is_playlist, "workspace classified");

    if entries == 0 {
        return Err(ClassifyError::EmptyResult);
    }

    match media.as_slice() {
        [single] if !is_playlist => Ok(Deliverable::SingleFile {
            path: single.clone(),
        }),
        _ => Ok(Deliverable::CollectionArchive {
            root: workspace.to_path_buf(),
        }),
    }
}

/// Extension is one of [`MEDIA_EXTENSIONS`], ignoring case.
pub fn is_media(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MEDIA_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}
