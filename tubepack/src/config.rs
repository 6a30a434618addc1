//! Configuration types for resolved CLI arguments.
//!
//! The Cli struct (for parsing) remains in cli.rs; this module validates it
//! and builds the pipeline from the result.

use crate::cli::{Cli, FetchArgs};
use crate::fetch::{
    AgentPicker, Extractor, FetchPolicy, Fetcher, MEDIA_EXTENSIONS, NetworkTuning, RandomAgent,
    SeededAgent,
};
use crate::pipeline::Pipeline;
use eyre::{Context, Result, ensure};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved server configuration.
#[derive(Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub scratch_dir: PathBuf,
    pub archive_name: String,
    pub policy: FetchPolicy,
    pub agent_seed: Option<u64>,
}

impl TryFrom<Cli> for ServeConfig {
    type Error = eyre::Error;

    fn try_from(cli: Cli) -> Result<Self> {
        let scratch_dir = cli.scratch_dir.unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&scratch_dir)
            .wrap_err_with(|| format!("failed to create scratch dir: {:?}", scratch_dir.display()))?;

        let archive_name = cli.archive_name.trim().to_string();
        ensure!(
            archive_name.ends_with(".zip") && !archive_name.contains(['/', '\\', '"']),
            "archive name must be a plain file name ending in .zip, got {archive_name:?}"
        );

        let agent_seed = cli.fetch.agent_seed;
        let policy = FetchPolicy::try_from(cli.fetch)?;

        Ok(Self {
            bind: cli.bind,
            scratch_dir,
            archive_name,
            policy,
            agent_seed,
        })
    }
}

impl TryFrom<FetchArgs> for FetchPolicy {
    type Error = eyre::Error;

    fn try_from(args: FetchArgs) -> Result<Self> {
        let merge_format = args.merge_format.to_ascii_lowercase();
        ensure!(
            MEDIA_EXTENSIONS.contains(&merge_format.as_str()),
            "unsupported merge format {merge_format:?} (expected one of {MEDIA_EXTENSIONS:?})"
        );

        let subtitle_lang = args.subtitle_lang.trim().to_string();
        ensure!(!subtitle_lang.is_empty(), "subtitle language must not be empty");
        ensure!(args.socket_timeout > 0, "socket timeout must be at least 1 second");

        let network = (!args.no_network_tuning).then(|| NetworkTuning {
            socket_timeout: Duration::from_secs(args.socket_timeout),
            ..NetworkTuning::default()
        });

        Ok(Self {
            merge_format,
            subtitle_langs: vec![subtitle_lang],
            network,
            ..FetchPolicy::default()
        })
    }
}

impl ServeConfig {
    /// Build the pipeline around `extractor`.
    pub fn pipeline(&self, extractor: impl Extractor + 'static) -> Pipeline {
        let agents: Box<dyn AgentPicker> = match self.agent_seed {
            Some(seed) => Box::new(SeededAgent::new(seed)),
            None => Box::new(RandomAgent),
        };

        tracing::info!(
            scratch_dir = %self.scratch_dir.display(),
            archive_name = %self.archive_name,
            merge_format = %self.policy.merge_format,
            network_tuning = self.policy.network.is_some(),
            "pipeline configured"
        );

        let fetcher = Fetcher::new(self.policy.clone(), extractor, agents);
        Pipeline::new(&self.scratch_dir, fetcher).with_archive_name(&self.archive_name)
    }
}
