//! Download-and-package workflow.
//!
//! ```text
//! acquire workspace → stage cookies → fetch → unstage → classify → (archive) → deliver → release
//! ```
//!
//! Every temporary resource is released on every exit path: explicitly on the
//! normal and error paths, by drop guards on panic.

use crate::archive::{self, PackagedArchive};
use crate::classify::{self, ClassifyError, Deliverable};
use crate::credentials::CredentialStager;
use crate::error::{Result, WorkflowError};
use crate::fetch::{FetchOptions, Fetcher};
use crate::workspace::{Workspace, WorkspaceManager};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Default download name for collection archives.
pub const DEFAULT_ARCHIVE_NAME: &str = "youtube_downloads.zip";

const HANDOFF_PREFIX: &str = "tubepack-out-";

/// A validated download request. Immutable once accepted.
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
    options: FetchOptions,
    cookies: Option<String>,
}

impl Request {
    /// Validate user input. Blank URLs are rejected; blank cookie text counts as absent.
    pub fn new(
        url: impl Into<String>,
        options: FetchOptions,
        raw_cookie_text: Option<String>,
    ) -> Result<Self> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(WorkflowError::InvalidInput("enter a URL first"));
        }

        Ok(Self {
            url,
            options,
            cookies: raw_cookie_text.filter(|text| !text.trim().is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> FetchOptions {
        self.options
    }

    pub fn cookies(&self) -> Option<&str> {
        self.cookies.as_deref()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("options", &self.options)
            .field("cookies", &self.cookies.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The file handed to the delivery surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Artifact<'a> {
    pub path: &'a Path,
    /// Name the user's download is saved as.
    pub file_name: &'a str,
    pub media_type: &'static str,
}

/// Receives the finished artifact while it still exists on disk.
pub trait Deliver {
    type Output;

    fn deliver(&mut self, artifact: Artifact<'_>) -> io::Result<Self::Output>;
}

/// Moves the artifact out of the workspace into its own temp file under `dir`.
#[derive(Clone, Debug)]
pub struct Handoff {
    dir: PathBuf,
}

impl Handoff {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// An artifact detached from the workspace. Its file is deleted on drop.
#[derive(Debug)]
pub struct Download {
    pub file_name: String,
    pub media_type: &'static str,
    /// Size in bytes.
    pub len: u64,
    file: TempPath,
}

impl Download {
    pub fn path(&self) -> &Path {
        &self.file
    }

    /// Hand over the file, still deleted when the returned guard drops.
    pub fn into_temp_path(self) -> TempPath {
        self.file
    }
}

impl Deliver for Handoff {
    type Output = Download;

    fn deliver(&mut self, artifact: Artifact<'_>) -> io::Result<Download> {
        let file = tempfile::Builder::new()
            .prefix(HANDOFF_PREFIX)
            .make_in(&self.dir, |dest| move_file(artifact.path, dest))?
            .into_temp_path();

        let len = std::fs::metadata(&file)?.len();

        tracing::debug!(path = %file.display(), len, "artifact handed off");

        Ok(Download {
            file_name: artifact.file_name.to_string(),
            media_type: artifact.media_type,
            len,
            file,
        })
    }
}

/// Rename `src` to `dest`, copying when a rename is not possible.
fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %e, "rename failed, copying artifact");
            std::fs::copy(src, dest).map(drop)
        }
    }
}

/// Media type for a delivered file, from its extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("vtt") => "text/vtt",
        Some("srt") => "application/x-subrip",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Wires workspace, credentials, fetch, classification and packaging together.
#[derive(Debug)]
pub struct Pipeline {
    workspaces: WorkspaceManager,
    credentials: CredentialStager,
    fetcher: Fetcher,
    scratch_dir: PathBuf,
    archive_name: String,
}

impl Pipeline {
    /// Workspaces, cookie files and archives all live under `scratch_dir`.
    pub fn new(scratch_dir: impl Into<PathBuf>, fetcher: Fetcher) -> Self {
        let scratch_dir = scratch_dir.into();
        Self {
            workspaces: WorkspaceManager::new(&scratch_dir),
            credentials: CredentialStager::new(&scratch_dir),
            fetcher,
            scratch_dir,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }

    pub fn with_archive_name(mut self, archive_name: impl Into<String>) -> Self {
        self.archive_name = archive_name.into();
        self
    }

    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Sink that detaches artifacts into this pipeline's scratch dir.
    pub fn handoff(&self) -> Handoff {
        Handoff::new(&self.scratch_dir)
    }

    /// Run one request to completion and hand the artifact to `sink`.
    pub fn run<D: Deliver>(&self, request: &Request, sink: &mut D) -> Result<D::Output> {
        let workspace = self
            .workspaces
            .acquire()
            .map_err(WorkflowError::Workspace)?;

        let outcome = self.fill_and_deliver(&workspace, request, sink);

        if let Err(e) = workspace.release() {
            tracing::error!(error = %e, "failed to remove workspace");
        }

        match &outcome {
            Ok(_) => tracing::info!(url = request.url(), "request completed"),
            Err(e) => tracing::warn!(url = request.url(), error = %e, "request failed"),
        }

        outcome
    }

    fn fill_and_deliver<D: Deliver>(
        &self,
        workspace: &Workspace,
        request: &Request,
        sink: &mut D,
    ) -> Result<D::Output> {
        self.fetch_into(workspace, request)?;

        let deliverable =
            classify::classify(workspace.path(), request.options().is_playlist).map_err(
                |e| match e {
                    ClassifyError::EmptyResult => WorkflowError::EmptyResult,
                    ClassifyError::Io(e) => WorkflowError::Classify(e),
                },
            )?;

        match deliverable {
            Deliverable::SingleFile { path } => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "download".to_string());

                sink.deliver(Artifact {
                    path: &path,
                    file_name: &file_name,
                    media_type: media_type_for(&path),
                })
                .map_err(WorkflowError::Delivery)
            }
            Deliverable::CollectionArchive { root } => {
                let packaged = archive::archive(&root, &self.scratch_dir)?;
                let delivered = self.deliver_archive(&packaged, sink);

                if let Err(e) = packaged.discard() {
                    tracing::error!(error = %e, "failed to remove archive");
                }

                delivered
            }
        }
    }

    /// Stage cookies, fetch, and unstage regardless of the fetch outcome.
    fn fetch_into(&self, workspace: &Workspace, request: &Request) -> Result<()> {
        let staged = self
            .credentials
            .stage(request.cookies())
            .map_err(WorkflowError::Credentials)?;

        let fetched = self.fetcher.fetch(
            request.url(),
            workspace.path(),
            request.options(),
            staged.as_ref().map(|s| s.path()),
        );

        if let Some(staged) = staged
            && let Err(e) = staged.unstage()
        {
            tracing::error!(error = %e, "failed to remove staged cookies");
        }

        Ok(fetched?)
    }

    fn deliver_archive<D: Deliver>(
        &self,
        packaged: &PackagedArchive,
        sink: &mut D,
    ) -> Result<D::Output> {
        sink.deliver(Artifact {
            path: packaged.path(),
            file_name: &self.archive_name,
            media_type: "application/zip",
        })
        .map_err(WorkflowError::Delivery)
    }
}
