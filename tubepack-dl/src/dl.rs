//! yt-dlp Python API wrappers.
//!
//! Type-safe bindings to [yt-dlp](https://github.com/yt-dlp/yt-dlp) `YoutubeDL` parameters.
//!
//! ```no_run
//! use tubepack_dl::{dl::{download, OutputPaths}, video::Container};
//! use tubepack_dl::dl::DownloadOptions;
//! use std::path::Path;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut opts: DownloadOptions = Container::Mp4.into();
//! opts.paths = Some(OutputPaths::simple(Path::new("/tmp/job"), Path::new("/tmp/job")));
//! let retcode = download("https://youtube.com/watch?v=example", opts)?;
//! println!("yt-dlp exited with {retcode}");
//! # Ok(())
//! # }
//! ```

use pyo3::ffi::c_str;
use pyo3::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Filename templates using `%(field)s` syntax. Key `default` required.
#[derive(Clone, Debug, Default, IntoPyObject)]
pub struct OutputTemplates(pub Option<HashMap<String, String>>);

impl OutputTemplates {
    /// Create with a single default template.
    pub fn simple(default: String) -> Self {
        Self(Some(HashMap::from([("default".to_string(), default)])))
    }
}

/// Download directories: `home`, `temp`, optional type-specific paths.
#[derive(Clone, Debug, Default, IntoPyObject)]
pub struct OutputPaths(pub Option<HashMap<String, String>>);

impl OutputPaths {
    /// Create with home and temp directories.
    pub fn simple(home: &Path, temp: &Path) -> Self {
        Self::default().with_home(home).with_temp(temp)
    }

    pub fn with_home(self, home: &Path) -> Self {
        self.with_key("home".to_string(), home)
    }

    pub fn with_temp(self, temp: &Path) -> Self {
        self.with_key("temp".to_string(), temp)
    }

    fn with_key(self, key: String, value: &Path) -> Self {
        let mut inner = self.0.unwrap_or_default();
        inner.insert(key, value.to_string_lossy().to_string());
        Self(Some(inner))
    }
}

/// Extra HTTP headers sent with every request (`User-Agent`, `Referer`, ...).
#[derive(Clone, Debug, Default, IntoPyObject)]
pub struct HttpHeaders(pub Option<HashMap<String, String>>);

impl HttpHeaders {
    pub fn with_user_agent(self, user_agent: &str) -> Self {
        self.with_header("User-Agent".to_string(), user_agent)
    }

    pub fn with_referer(self, referer: &str) -> Self {
        self.with_header("Referer".to_string(), referer)
    }

    fn with_header(self, name: String, value: &str) -> Self {
        let mut inner = self.0.unwrap_or_default();
        inner.insert(name, value.to_string());
        Self(Some(inner))
    }
}

/// yt-dlp download configuration passed to `YoutubeDL(params)`.
///
/// `None` fields are dropped before reaching yt-dlp, so its own defaults apply.
#[derive(Clone, Debug, Default, IntoPyObject)]
pub struct DownloadOptions {
    pub format: Option<String>,
    pub paths: Option<OutputPaths>,
    pub outtmpl: Option<OutputTemplates>,
    pub merge_output_format: Option<String>,
    pub writesubtitles: Option<bool>,
    pub writeautomaticsub: Option<bool>,
    pub subtitleslangs: Option<Vec<String>>,
    pub noplaylist: Option<bool>,
    pub ignoreerrors: Option<bool>,
    pub cookiefile: Option<String>,
    pub http_headers: Option<HttpHeaders>,
    pub socket_timeout: Option<f64>,
    pub source_address: Option<String>,
    pub nocheckcertificate: Option<bool>,
    pub quiet: Option<bool>,
    pub no_warnings: Option<bool>,
}

impl DownloadOptions {
    /// Read session cookies from a Netscape cookie jar.
    pub fn with_cookiefile(mut self, path: &Path) -> Self {
        self.cookiefile = Some(path.to_string_lossy().to_string());
        self
    }
}

/// Download a single URL (or every entry of a playlist URL).
///
/// Clears the yt-dlp cache first, then calls `YoutubeDL.download([url])`.
/// Returns yt-dlp's return code: `0` when every item succeeded, non-zero when
/// some items failed and `ignoreerrors` kept the run going.
pub fn download(url: &str, opts: DownloadOptions) -> Result<i32, PyErr> {
    Python::attach(|py| {
        let module = PyModule::from_code(py, c_str!(include_str!("./dl.py")), c"dl.py", c"dl")?;

        let py_params = opts.into_pyobject(py)?;

        let retcode = module.getattr("download")?.call1((url, py_params))?;

        retcode.extract()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::types::PyAnyMethods;
    use std::ffi::CStr;

    /// Evaluate `literal` and require it to equal `actual` under Python `==`.
    #[track_caller]
    fn assert_py_eq(py: Python, actual: &Bound<PyAny>, literal: &'static CStr) {
        let expected = py.eval(literal, None, None).unwrap();
        assert!(
            actual.eq(&expected).unwrap(),
            "{actual} != {expected}"
        );
    }

    #[test]
    fn unset_paths_become_none() {
        Python::attach(|py| {
            let py_obj = OutputPaths::default().into_pyobject(py).unwrap();
            assert!(py_obj.is_none());
        });
    }

    #[test]
    fn paths_simple() {
        Python::attach(|py| {
            let paths = OutputPaths::simple(Path::new("/jobs/a"), Path::new("/jobs/tmp"));
            let py_obj = paths.into_pyobject(py).unwrap();
            assert_py_eq(
                py,
                py_obj.as_any(),
                c"{'home': '/jobs/a', 'temp': '/jobs/tmp'}",
            );
        });
    }

    #[test]
    fn http_headers_accumulate() {
        Python::attach(|py| {
            let headers = HttpHeaders::default()
                .with_user_agent("Mozilla/5.0")
                .with_referer("https://www.youtube.com/");
            let py_obj = headers.into_pyobject(py).unwrap();
            assert_py_eq(
                py,
                py_obj.as_any(),
                c"{'User-Agent': 'Mozilla/5.0', 'Referer': 'https://www.youtube.com/'}",
            );
        });
    }

    #[test]
    fn cookiefile_builder() {
        let opts = DownloadOptions::default().with_cookiefile(Path::new("/tmp/cookies.txt"));
        assert_eq!(opts.cookiefile.as_deref(), Some("/tmp/cookies.txt"));
    }

    #[test]
    fn dl_options_custom() {
        Python::attach(|py| {
            let opts = DownloadOptions {
                format: Some("bestvideo+bestaudio/best".to_string()),
                subtitleslangs: Some(vec!["en".to_string()]),
                noplaylist: Some(true),
                socket_timeout: Some(30.0),
                ..Default::default()
            };
            let py_obj = opts.into_pyobject(py).unwrap();
            assert_py_eq(
                py,
                py_obj.as_any(),
                c"{'format': 'bestvideo+bestaudio/best', 'paths': None, 'outtmpl': None, 'merge_output_format': None, 'writesubtitles': None, 'writeautomaticsub': None, 'subtitleslangs': ['en'], 'noplaylist': True, 'ignoreerrors': None, 'cookiefile': None, 'http_headers': None, 'socket_timeout': 30.0, 'source_address': None, 'nocheckcertificate': None, 'quiet': None, 'no_warnings': None}"
            );
        });
    }
}
