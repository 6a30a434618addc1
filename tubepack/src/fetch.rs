//! Fetch orchestration: request options → extractor configuration → outcome.
//!
//! The extractor itself sits behind [`Extractor`]; [`Fetcher`] derives a
//! [`FetchPlan`] from the immutable [`FetchPolicy`] and the request, makes
//! exactly one attempt, and folds any failure into a [`FetchError`].

#[cfg(feature = "yt-dlp")]
pub mod ytdlp;

use crate::error::FetchError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Extensions of merged video files. Also the allowed merge targets.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm"];

/// Desktop browser user agents rotated across requests.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// User choices that shape the extractor configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub want_subtitles: bool,
    pub is_playlist: bool,
}

/// Operational knobs with no effect on the functional contract.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkTuning {
    pub socket_timeout: Duration,
    /// Bind address for outgoing connections; `0.0.0.0` forces IPv4.
    pub source_address: Option<String>,
    pub skip_certificate_check: bool,
    pub referer: Option<String>,
    pub user_agents: Vec<String>,
}

impl Default for NetworkTuning {
    fn default() -> Self {
        Self {
            socket_timeout: Duration::from_secs(30),
            source_address: Some("0.0.0.0".to_string()),
            skip_certificate_check: true,
            referer: Some("https://www.youtube.com/".to_string()),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Immutable extractor defaults shared by every request.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchPolicy {
    /// Format selector: best video+audio, else best single stream.
    pub format: String,
    pub merge_format: String,
    pub output_template: String,
    pub subtitle_langs: Vec<String>,
    pub network: Option<NetworkTuning>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            format: "bestvideo+bestaudio/best".to_string(),
            merge_format: "mp4".to_string(),
            output_template: "%(title)s.%(ext)s".to_string(),
            subtitle_langs: vec!["en".to_string()],
            network: Some(NetworkTuning::default()),
        }
    }
}

impl FetchPolicy {
    /// Derive the configuration for one extractor run.
    pub fn plan(
        &self,
        workspace: &Path,
        options: FetchOptions,
        cookie_file: Option<&Path>,
        agents: &dyn AgentPicker,
    ) -> FetchPlan {
        let network = self.network.as_ref().map(|tuning| PlannedNetwork {
            socket_timeout: tuning.socket_timeout,
            source_address: tuning.source_address.clone(),
            skip_certificate_check: tuning.skip_certificate_check,
            referer: tuning.referer.clone(),
            user_agent: agents.pick(&tuning.user_agents).map(str::to_string),
        });

        FetchPlan {
            output_dir: workspace.to_path_buf(),
            output_template: self.output_template.clone(),
            format: self.format.clone(),
            merge_format: self.merge_format.clone(),
            write_subtitles: options.want_subtitles,
            subtitle_langs: if options.want_subtitles {
                self.subtitle_langs.clone()
            } else {
                Vec::new()
            },
            write_auto_subtitles: false,
            no_playlist: !options.is_playlist,
            continue_on_error: options.is_playlist,
            cookie_file: cookie_file.map(Path::to_path_buf),
            network,
        }
    }
}

/// Network settings resolved for a single run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedNetwork {
    pub socket_timeout: Duration,
    pub source_address: Option<String>,
    pub skip_certificate_check: bool,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

/// Extractor configuration for one request.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchPlan {
    /// Files are written here, named by `output_template`.
    pub output_dir: PathBuf,
    pub output_template: String,
    pub format: String,
    pub merge_format: String,
    pub write_subtitles: bool,
    pub subtitle_langs: Vec<String>,
    pub write_auto_subtitles: bool,
    /// A playlist URL yields only its primary item.
    pub no_playlist: bool,
    /// A failed playlist item does not abort the rest.
    pub continue_on_error: bool,
    pub cookie_file: Option<PathBuf>,
    pub network: Option<PlannedNetwork>,
}

/// Extractor failure carrying its diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ExtractorError(pub String);

impl ExtractorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Completion report from an extractor run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Some items failed but the run continued.
    pub partial_failure: bool,
}

/// External download capability: network, format negotiation, merging.
pub trait Extractor: Send + Sync {
    /// Download `url` into `plan.output_dir`. Blocks until done.
    fn extract(&self, url: &str, plan: &FetchPlan) -> Result<ExtractReport, ExtractorError>;
}

/// Chooses a user agent from the configured list.
pub trait AgentPicker: Send + Sync {
    fn pick<'a>(&self, agents: &'a [String]) -> Option<&'a str>;
}

impl<P: AgentPicker + ?Sized> AgentPicker for Box<P> {
    fn pick<'a>(&self, agents: &'a [String]) -> Option<&'a str> {
        (**self).pick(agents)
    }
}

/// Uniformly random choice from the thread RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomAgent;

impl AgentPicker for RandomAgent {
    fn pick<'a>(&self, agents: &'a [String]) -> Option<&'a str> {
        if agents.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..agents.len());
        agents.get(index).map(String::as_str)
    }
}

/// Reproducible choice sequence from a seed.
#[derive(Debug)]
pub struct SeededAgent {
    rng: Mutex<StdRng>,
}

impl SeededAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl AgentPicker for SeededAgent {
    fn pick<'a>(&self, agents: &'a [String]) -> Option<&'a str> {
        if agents.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = rng.random_range(0..agents.len());
        agents.get(index).map(String::as_str)
    }
}

/// Always the agent at `index` (wrapping).
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedAgent(pub usize);

impl AgentPicker for FixedAgent {
    fn pick<'a>(&self, agents: &'a [String]) -> Option<&'a str> {
        if agents.is_empty() {
            return None;
        }
        agents.get(self.0 % agents.len()).map(String::as_str)
    }
}

/// Runs the extractor once per request with a derived plan.
pub struct Fetcher {
    policy: FetchPolicy,
    extractor: Box<dyn Extractor>,
    agents: Box<dyn AgentPicker>,
}

impl Fetcher {
    pub fn new(
        policy: FetchPolicy,
        extractor: impl Extractor + 'static,
        agents: impl AgentPicker + 'static,
    ) -> Self {
        Self {
            policy,
            extractor: Box::new(extractor),
            agents: Box::new(agents),
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch `url` into `workspace`. Exactly one attempt, no retries.
    pub fn fetch(
        &self,
        url: &str,
        workspace: &Path,
        options: FetchOptions,
        cookie_file: Option<&Path>,
    ) -> Result<(), FetchError> {
        let plan = self
            .policy
            .plan(workspace, options, cookie_file, self.agents.as_ref());

        tracing::info!(
            url,
            subtitles = plan.write_subtitles,
            playlist = !plan.no_playlist,
            cookies = plan.cookie_file.is_some(),
            "fetching"
        );

        match self.extractor.extract(url, &plan) {
            Ok(report) => {
                if report.partial_failure {
                    tracing::warn!(url, "some items failed, continuing with what was downloaded");
                }
                Ok(())
            }
            Err(ExtractorError(message)) => {
                tracing::error!(url, error = %message, "extractor failed");
                Err(FetchError { message })
            }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
