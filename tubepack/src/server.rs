//! Browser-facing HTTP surface.
//!
//! # Routes
//!
//! - `GET /` - Download form
//! - `POST /download` - Run the pipeline and return the artifact as an attachment
//! - `GET /health` - Health check

use crate::error::WorkflowError;
use crate::fetch::FetchOptions;
use crate::pipeline::{Download, Pipeline, Request};
use axum::{
    Form, Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>tubepack</title>
<style>
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
input[type=url], textarea { width: 100%; }
textarea { height: 8rem; font-family: monospace; }
</style>
</head>
<body>
<h1>Video downloader</h1>
<form method="post" action="/download">
<p><label>Video or playlist URL<br><input type="url" name="url" required></label></p>
<p><label><input type="checkbox" name="subtitles" value="on"> Download subtitles</label></p>
<p><label><input type="checkbox" name="playlist" value="on"> Download the whole playlist</label></p>
<details>
<summary>Cookies (optional)</summary>
<p>Paste browser cookies in Netscape cookies.txt format if the site blocks anonymous downloads.</p>
<textarea name="cookies" placeholder="# Netscape HTTP Cookie File"></textarea>
</details>
<p><button type="submit">Download</button></p>
</form>
</body>
</html>
"##;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Fields posted by the download form. Checkboxes are absent when unticked.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadForm {
    pub url: String,
    pub subtitles: Option<String>,
    pub playlist: Option<String>,
    pub cookies: Option<String>,
}

impl DownloadForm {
    fn options(&self) -> FetchOptions {
        FetchOptions {
            want_subtitles: is_checked(self.subtitles.as_deref()),
            is_playlist: is_checked(self.playlist.as_deref()),
        }
    }
}

fn is_checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| !matches!(v.trim(), "" | "off" | "false" | "0"))
}

/// Create the router with all route definitions.
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/download", post(download))
        .route("/health", get(health_check))
        .with_state(AppState { pipeline })
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C.
pub async fn serve(bind: SocketAddr, pipeline: Arc<Pipeline>) -> io::Result<()> {
    let app = create_router(pipeline);
    let listener = TcpListener::bind(bind).await?;

    tracing::info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

/// GET / - Download form
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// POST /download - Fetch, package and return the result
async fn download(State(state): State<AppState>, Form(form): Form<DownloadForm>) -> Response {
    let options = form.options();
    let request = match Request::new(form.url, options, form.cookies) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    let pipeline = state.pipeline.clone();
    let outcome =
        tokio::task::spawn_blocking(move || pipeline.run(&request, &mut pipeline.handoff())).await;

    match outcome {
        Ok(Ok(download)) => match attachment(download).await {
            Ok(response) => response,
            Err(e) => error_response(&WorkflowError::Delivery(e)),
        },
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            tracing::error!(error = %e, "pipeline task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

/// Stream the detached artifact. Its file is deleted once the body is dropped.
async fn attachment(download: Download) -> io::Result<Response> {
    let disposition = HeaderValue::from_str(&content_disposition(&download.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let media_type = HeaderValue::from_static(download.media_type);
    let len = download.len;

    let file = File::open(download.path()).await?;
    let body = Body::from_stream(ArtifactStream {
        inner: ReaderStream::new(file),
        _file: download.into_temp_path(),
    });

    Ok((
        [
            (header::CONTENT_TYPE, media_type),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        body,
    )
        .into_response())
}

/// File contents as a byte stream, holding the file until the stream is dropped.
struct ArtifactStream {
    inner: ReaderStream<File>,
    _file: TempPath,
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// `attachment` disposition with an ASCII fallback name and the exact name in RFC 5987 form.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' => c,
            _ => '_',
        })
        .collect();

    if fallback == file_name {
        format!("attachment; filename=\"{file_name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(file_name)
        )
    }
}

/// HTTP status for a failed run.
pub fn status_for(error: &WorkflowError) -> StatusCode {
    match error {
        WorkflowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        WorkflowError::Fetch(_) | WorkflowError::EmptyResult => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &WorkflowError) -> Response {
    let mut body = error.user_message();
    if let Some(hint) = error.hint() {
        body.push_str("\n\n");
        body.push_str(hint);
    }

    (status_for(error), body).into_response()
}
