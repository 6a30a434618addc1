//! Per-request scratch directories.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "tubepack-";

/// Hands out isolated scratch directories under one root.
#[derive(Clone, Debug)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory under which workspaces are created.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new, empty, uniquely named workspace.
    pub fn acquire(&self) -> io::Result<Workspace> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.root)?;

        tracing::debug!(path = %dir.path().display(), "workspace acquired");

        Ok(Workspace { dir })
    }
}

/// Scratch directory owned by a single request.
///
/// Removed by [`Workspace::release`]; dropping it without releasing (early
/// return, panic) removes it as well.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Recursively remove the workspace. A directory that is already gone is not an error.
    pub fn release(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();

        match self.dir.close() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "workspace already removed");
            }
            Err(e) => return Err(e),
        }

        tracing::debug!(path = %path.display(), "workspace released");
        Ok(())
    }
}
