//! Type-safe Rust bindings to [yt-dlp](https://github.com/yt-dlp/yt-dlp) Python library.
//!
//! ## Modules
//!
//! - [`dl`] - Core yt-dlp API wrappers
//! - [`video`] - Video presets merging best streams into one container
//!
//! ## Quick Start
//!
//! **Video preset** (best streams merged into mp4):
//! ```no_run
//! use tubepack_dl::{dl::download, video::Container};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! download("https://youtube.com/watch?v=example", Container::Mp4.into())?;
//! # Ok(())
//! # }
//! ```
//!
//! **Custom configuration**:
//! ```no_run
//! use tubepack_dl::dl::{download, DownloadOptions, HttpHeaders, OutputPaths, OutputTemplates};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let job = Path::new("/tmp/job");
//!
//! let opts = DownloadOptions {
//!     format: Some("bestvideo+bestaudio/best".to_string()),
//!     paths: Some(OutputPaths::simple(job, job)),
//!     outtmpl: Some(OutputTemplates::simple("%(title)s.%(ext)s".to_string())),
//!     writesubtitles: Some(true),
//!     subtitleslangs: Some(vec!["en".to_string()]),
//!     noplaylist: Some(false),
//!     ignoreerrors: Some(true),
//!     http_headers: Some(HttpHeaders::default().with_referer("https://www.youtube.com/")),
//!     quiet: Some(true),
//!     ..Default::default()
//! };
//!
//! download("https://youtube.com/playlist?list=example", opts)?;
//! # Ok(())
//! # }
//! ```

pub mod dl;
pub mod video;
