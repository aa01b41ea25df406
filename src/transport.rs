use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::borrow::Cow;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::LatisError;

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Blocking HTTP GET.
///
/// Implementations report network failures as errors and every HTTP status, including
/// error statuses, as an `Ok` response.
pub trait Transport: fmt::Debug + Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// [`Transport`] backed by `reqwest::blocking`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: HttpClient,
    progress: bool,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, verify: bool) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("latis-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("latis-rs")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .timeout(timeout);

        if !verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;
        Ok(Self {
            http,
            progress: false,
        })
    }

    /// Show a progress bar while reading bodies of known length.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url, "GET");
        let mut resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| LatisError::Unreachable {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status().as_u16();
        let mut body = Vec::new();

        match resp.content_length() {
            Some(len) if self.progress => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                    )?
                    .progress_chars("=>-"),
                );
                std::io::copy(&mut pb.wrap_read(resp), &mut body)
                    .with_context(|| format!("failed to read response body from {url}"))?;
                pb.finish_and_clear();
            }
            _ => {
                resp.copy_to(&mut body)
                    .map_err(|source| LatisError::Unreachable {
                        url: url.to_string(),
                        source,
                    })?;
            }
        }

        debug!(url, status, bytes = body.len(), "response");
        Ok(HttpResponse { status, body })
    }
}
