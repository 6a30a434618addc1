//! Video presets: best video+audio merged into one container.
//!
//! **Containers:** [`Container::Mp4`] (widest player support), [`Container::Mkv`], [`Container::Webm`]
//!
//! ```no_run
//! use tubepack_dl::{dl::download, video::Container};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! download("https://youtube.com/watch?v=example", Container::Mp4.into())?;
//! # Ok(())
//! # }
//! ```
//!
//! **Output:** `title.ext` in the working directory unless `paths` is set.

use crate::dl::{DownloadOptions, OutputTemplates};

/// Output template used by the video preset: `title.ext`.
pub const VIDEO_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Best separate video+audio streams, falling back to the best single stream.
pub const BEST_AV_FORMAT: &str = "bestvideo+bestaudio/best";

/// Merge target for separately downloaded video and audio streams.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Container {
    #[default]
    Mp4,
    Mkv,
    Webm,
}

impl Container {
    /// Extension and `merge_output_format` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mkv => "mkv",
            Container::Webm => "webm",
        }
    }
}

impl std::str::FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Container::Mp4),
            "mkv" => Ok(Container::Mkv),
            "webm" => Ok(Container::Webm),
            other => Err(format!("unsupported container: {other} (expected mp4, mkv or webm)")),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Container> for DownloadOptions {
    /// Video preset: best streams merged into `container`, named `title.ext`, quiet.
    fn from(container: Container) -> Self {
        Self {
            format: Some(BEST_AV_FORMAT.to_string()),
            outtmpl: Some(OutputTemplates::simple(VIDEO_OUTPUT_TEMPLATE.to_string())),
            merge_output_format: Some(container.as_str().to_string()),
            writeautomaticsub: Some(false),
            quiet: Some(true),
            no_warnings: Some(true),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_to_dl_options() {
        for container in [Container::Mp4, Container::Mkv, Container::Webm] {
            let opts: DownloadOptions = container.into();

            assert_eq!(opts.format.as_deref(), Some(BEST_AV_FORMAT));
            assert_eq!(opts.merge_output_format.as_deref(), Some(container.as_str()));
            assert_eq!(opts.writeautomaticsub, Some(false));
            assert_eq!(opts.quiet, Some(true));
            assert_eq!(opts.no_warnings, Some(true));
            assert!(opts.outtmpl.is_some());
            assert!(opts.paths.is_none());
            assert!(opts.cookiefile.is_none());
        }
    }

    #[test]
    fn test_container_preset_to_python() {
        use pyo3::prelude::*;

        Python::attach(|py| {
            let opts: DownloadOptions = Container::Mkv.into();
            let params = opts.into_pyobject(py).unwrap().into_any();

            let outtmpl = params.get_item("outtmpl").unwrap();
            let default: String = outtmpl.get_item("default").unwrap().extract().unwrap();
            assert_eq!(default, VIDEO_OUTPUT_TEMPLATE);

            let merge: String = params.get_item("merge_output_format").unwrap().extract().unwrap();
            assert_eq!(merge, "mkv");
        });
    }

    #[test]
    fn test_container_parse() {
        assert_eq!("MKV".parse::<Container>(), Ok(Container::Mkv));
        assert!("avi".parse::<Container>().is_err());
    }

    #[test]
    fn test_container_default() {
        assert_eq!(Container::default(), Container::Mp4);
        assert_eq!(Container::default().to_string(), "mp4");
    }
}
