//! [`Extractor`] backed by the yt-dlp Python library.

use super::{ExtractReport, Extractor, ExtractorError, FetchPlan};
use tubepack_dl::dl::{DownloadOptions, HttpHeaders, OutputPaths, OutputTemplates, download};
use tubepack_dl::video::Container;

/// Runs yt-dlp in the embedded Python interpreter.
#[derive(Clone, Copy, Debug, Default)]
pub struct YtDlp;

impl Extractor for YtDlp {
    fn extract(&self, url: &str, plan: &FetchPlan) -> Result<ExtractReport, ExtractorError> {
        let opts = to_download_options(plan)?;

        let retcode = download(url, opts).map_err(|e| ExtractorError::new(e.to_string()))?;

        tracing::debug!(url, retcode, "yt-dlp finished");

        Ok(ExtractReport {
            partial_failure: retcode != 0,
        })
    }
}

/// Map a plan onto `YoutubeDL` params, starting from the container preset.
fn to_download_options(plan: &FetchPlan) -> Result<DownloadOptions, ExtractorError> {
    let container: Container = plan.merge_format.parse().map_err(ExtractorError::new)?;

    let mut opts: DownloadOptions = container.into();
    opts.format = Some(plan.format.clone());
    opts.paths = Some(OutputPaths::simple(&plan.output_dir, &plan.output_dir));
    opts.outtmpl = Some(OutputTemplates::simple(plan.output_template.clone()));

    opts.writesubtitles = Some(plan.write_subtitles);
    opts.writeautomaticsub = Some(plan.write_auto_subtitles);
    if !plan.subtitle_langs.is_empty() {
        opts.subtitleslangs = Some(plan.subtitle_langs.clone());
    }

    opts.noplaylist = Some(plan.no_playlist);
    opts.ignoreerrors = Some(plan.continue_on_error);

    if let Some(cookie_file) = plan.cookie_file.as_deref() {
        opts = opts.with_cookiefile(cookie_file);
    }

    if let Some(network) = &plan.network {
        let mut headers = HttpHeaders::default();
        if let Some(user_agent) = network.user_agent.as_deref() {
            headers = headers.with_user_agent(user_agent);
        }
        if let Some(referer) = network.referer.as_deref() {
            headers = headers.with_referer(referer);
        }

        opts.http_headers = Some(headers);
        opts.socket_timeout = Some(network.socket_timeout.as_secs_f64());
        opts.source_address = network.source_address.clone();
        opts.nocheckcertificate = Some(network.skip_certificate_check);
    }

    Ok(opts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchOptions, FetchPolicy, FixedAgent};
    use std::path::Path;

    fn plan(options: FetchOptions, cookie_file: Option<&Path>) -> FetchPlan {
        FetchPolicy::default().plan(Path::new("/scratch/job"), options, cookie_file, &FixedAgent(1))
    }

    #[test]
    fn maps_single_video_plan() {
        let opts = to_download_options(&plan(FetchOptions::default(), None)).unwrap();

        assert_eq!(opts.format.as_deref(), Some("bestvideo+bestaudio/best"));
        assert_eq!(opts.merge_output_format.as_deref(), Some("mp4"));
        assert_eq!(opts.writesubtitles, Some(false));
        assert_eq!(opts.writeautomaticsub, Some(false));
        assert!(opts.subtitleslangs.is_none());
        assert_eq!(opts.noplaylist, Some(true));
        assert_eq!(opts.ignoreerrors, Some(false));
        assert!(opts.cookiefile.is_none());
        assert_eq!(opts.socket_timeout, Some(30.0));
        assert_eq!(opts.source_address.as_deref(), Some("0.0.0.0"));
        assert_eq!(opts.nocheckcertificate, Some(true));

        let paths = opts.paths.unwrap().0.unwrap();
        assert_eq!(paths["home"], "/scratch/job");

        let headers = opts.http_headers.unwrap().0.unwrap();
        assert_eq!(headers["Referer"], "https://www.youtube.com/");
        assert_eq!(headers["User-Agent"], crate::fetch::DEFAULT_USER_AGENTS[1]);
    }

    #[test]
    fn maps_playlist_with_subtitles_and_cookies() {
        let options = FetchOptions {
            want_subtitles: true,
            is_playlist: true,
        };
        let opts =
            to_download_options(&plan(options, Some(Path::new("/tmp/cookies.txt")))).unwrap();

        assert_eq!(opts.writesubtitles, Some(true));
        assert_eq!(opts.subtitleslangs, Some(vec!["en".to_string()]));
        assert_eq!(opts.noplaylist, Some(false));
        assert_eq!(opts.ignoreerrors, Some(true));
        assert_eq!(opts.cookiefile.as_deref(), Some("/tmp/cookies.txt"));
    }

    #[test]
    fn rejects_unknown_merge_format() {
        let mut plan = plan(FetchOptions::default(), None);
        plan.merge_format = "avi".to_string();

        assert!(to_download_options(&plan).is_err());
    }

    #[test]
    fn untuned_plan_leaves_network_defaults() {
        let policy = FetchPolicy {
            network: None,
            ..FetchPolicy::default()
        };
        let plan = policy.plan(Path::new("/w"), FetchOptions::default(), None, &FixedAgent(0));
        let opts = to_download_options(&plan).unwrap();

        assert!(opts.http_headers.is_none());
        assert!(opts.socket_timeout.is_none());
        assert!(opts.source_address.is_none());
        assert!(opts.nocheckcertificate.is_none());
    }
}
