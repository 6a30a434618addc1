//! tubepack: fetch a video or playlist and hand it back as one download.
//!
//! Each request runs through a [`pipeline::Pipeline`]:
//!
//! - [`workspace`]: a private scratch directory per request, removed afterwards
//! - [`credentials`]: pasted browser cookies staged as a short-lived cookie jar
//! - [`fetch`]: one extractor run configured from a [`fetch::FetchPolicy`]
//! - [`classify`]: single media file or collection
//! - [`archive`]: deflated ZIP of a collection
//! - [`server`]: the HTML form and attachment responses
//!
//! The extractor sits behind [`fetch::Extractor`]. With the default `yt-dlp`
//! feature, [`fetch::ytdlp::YtDlp`] drives yt-dlp through an embedded Python
//! interpreter.

pub mod archive;
pub mod classify;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod server;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_helpers;
