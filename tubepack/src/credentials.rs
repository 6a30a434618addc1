//! Transient cookie-jar files for a single fetch.
//!
//! Cookie text is written verbatim to an owner-only temp file and removed as
//! soon as the fetch completes. The text itself is never logged.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const COOKIE_PREFIX: &str = "tubepack-cookies-";
const COOKIE_SUFFIX: &str = ".txt";

/// Header lines yt-dlp accepts at the top of a cookie jar.
const COOKIE_JAR_HEADERS: &[&str] = &["# Netscape HTTP Cookie File", "# HTTP Cookie File"];

/// Writes cookie text into staging files under one directory.
#[derive(Clone, Debug)]
pub struct CredentialStager {
    dir: PathBuf,
}

impl CredentialStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stage cookie text for one fetch.
    ///
    /// Absent or blank text returns `None` without touching the filesystem.
    pub fn stage(&self, raw_cookie_text: Option<&str>) -> io::Result<Option<StagedCredentials>> {
        let Some(text) = raw_cookie_text.filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };

        if !looks_like_cookie_jar(text) {
            tracing::warn!("cookie text has no Netscape cookie-jar header, yt-dlp may reject it");
        }

        // tempfile creates the file with 0o600 on Unix
        let mut file = tempfile::Builder::new()
            .prefix(COOKIE_PREFIX)
            .suffix(COOKIE_SUFFIX)
            .tempfile_in(&self.dir)?;

        file.write_all(text.as_bytes())?;
        file.flush()?;

        tracing::debug!(path = %file.path().display(), bytes = text.len(), "cookies staged");

        Ok(Some(StagedCredentials { file }))
    }
}

/// A staged cookie jar. Deleted on [`StagedCredentials::unstage`] or drop.
#[derive(Debug)]
pub struct StagedCredentials {
    file: NamedTempFile,
}

impl StagedCredentials {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the staged file. A file that is already gone is not an error.
    pub fn unstage(self) -> io::Result<()> {
        let path = self.file.path().to_path_buf();

        match self.file.close() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        tracing::debug!(path = %path.display(), "cookies unstaged");
        Ok(())
    }
}

/// First non-blank line is one of the cookie-jar headers.
fn looks_like_cookie_jar(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|first| COOKIE_JAR_HEADERS.iter().any(|h| first.starts_with(h)))
}
