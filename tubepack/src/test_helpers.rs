//! Shared test doubles for the extractor seam.

use crate::fetch::{ExtractReport, Extractor, ExtractorError, FetchPlan, FetchPolicy, Fetcher, FixedAgent};
use crate::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Writes fixed files into the plan's output dir, or fails with a fixed message.
///
/// Records the path and contents of every cookie file it is handed.
#[derive(Clone, Default)]
pub(crate) struct StubExtractor {
    pub files: Vec<&'static str>,
    pub fail_with: Option<&'static str>,
    pub seen_cookies: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl StubExtractor {
    pub fn writing(files: &[&'static str]) -> Self {
        Self {
            files: files.to_vec(),
            ..Default::default()
        }
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            fail_with: Some(message),
            ..Default::default()
        }
    }
}

impl Extractor for StubExtractor {
    fn extract(&self, _url: &str, plan: &FetchPlan) -> Result<ExtractReport, ExtractorError> {
        if let Some(path) = &plan.cookie_file {
            let text = std::fs::read_to_string(path).unwrap();
            self.seen_cookies.lock().unwrap().push((path.clone(), text));
        }

        if let Some(message) = self.fail_with {
            return Err(ExtractorError::new(message));
        }

        for file in &self.files {
            let path = plan.output_dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, file.as_bytes()).unwrap();
        }

        Ok(ExtractReport::default())
    }
}

/// Pipeline over `scratch` with default policy and a fixed user agent.
pub(crate) fn stub_pipeline(scratch: &Path, stub: StubExtractor) -> Pipeline {
    Pipeline::new(
        scratch,
        Fetcher::new(FetchPolicy::default(), stub, FixedAgent(0)),
    )
}
