//! Error types for tubepack organized by workflow stage.

use thiserror::Error;

/// Workflow error variants organized by stage.
///
/// Every variant is caught at the pipeline boundary and turned into a
/// user-visible message; none of them aborts the process.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Request rejected before any resource was acquired
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Scratch directory could not be created
    #[error("failed to prepare workspace")]
    Workspace(#[source] std::io::Error),

    /// Cookie text could not be staged
    #[error("failed to stage cookies")]
    Credentials(#[source] std::io::Error),

    /// Extractor reported an error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Extractor reported success but wrote nothing
    #[error("download completed, but no files were produced")]
    EmptyResult,

    /// Workspace listing failed
    #[error("failed to inspect downloaded files")]
    Classify(#[source] std::io::Error),

    /// Archive creation failed
    #[error(transparent)]
    Packaging(#[from] ArchiveError),

    /// Sink failed to read or forward the artifact
    #[error("failed to deliver download")]
    Delivery(#[source] std::io::Error),
}

impl WorkflowError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::InvalidInput(reason) => format!("Please check your input: {reason}."),
            WorkflowError::Fetch(e) => format!("Error occurred. Details: {}", e.message),
            WorkflowError::EmptyResult => "Download completed, but no files were found. \
                 The stream might have been blocked silently."
                .to_string(),
            WorkflowError::Classify(e) => format!("File processing error: {e}"),
            WorkflowError::Packaging(e) => format!("File processing error: {e}"),
            other => format!("Internal error: {other}"),
        }
    }

    /// Remediation hint, when the error kind suggests one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            WorkflowError::Fetch(e) if e.is_forbidden() => Some(
                "The site is blocking this server. Paste fresh browser cookies \
                 (Netscape cookies.txt format) and try again.",
            ),
            WorkflowError::EmptyResult => {
                Some("Try again with fresh browser cookies; the site may be blocking anonymous access.")
            }
            _ => None,
        }
    }
}

/// Boundary translation of an extractor failure.
///
/// Carries the extractor's own diagnostic text verbatim.
#[derive(Debug, Error)]
#[error("fetch failed: {message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    /// HTTP 403 in the diagnostic: the site refused this client.
    pub fn is_forbidden(&self) -> bool {
        self.message.contains("403")
    }
}

/// Archive creation errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// IO error while reading the tree or writing the archive
    #[error("archive I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error
    #[error("failed to walk workspace: {0}")]
    Walk(#[from] walkdir::Error),

    /// ZIP encoder error
    #[error("failed to write zip: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Result type alias for tubepack workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_fetch_gets_cookie_hint() {
        let err = WorkflowError::from(FetchError {
            message: "ERROR: unable to download video data: HTTP Error 403: Forbidden".to_string(),
        });

        assert!(err.user_message().contains("HTTP Error 403"));
        assert!(err.hint().is_some_and(|h| h.contains("cookies")));
    }

    #[test]
    fn other_fetch_errors_have_no_hint() {
        let err = WorkflowError::from(FetchError {
            message: "Unsupported URL: https://example.com".to_string(),
        });

        assert!(err.hint().is_none());
        assert!(err.user_message().ends_with("Unsupported URL: https://example.com"));
    }

    #[test]
    fn empty_result_is_distinct_from_fetch_error() {
        let err = WorkflowError::EmptyResult;

        assert!(err.user_message().contains("blocked silently"));
        assert!(err.hint().is_some());
    }
}
