use anyhow::Result;
use tracing::error;

use crate::error::{ErrorDetail, LatisError, format_query_error};
use crate::transport::{HttpResponse, Transport};

/// Pre-flight check that a URL is servable before its result is used.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'t> {
    transport: &'t dyn Transport,
}

impl<'t> Validator<'t> {
    pub fn new(transport: &'t dyn Transport) -> Self {
        Self { transport }
    }

    /// GETs `url` and returns the response when its status is below 400.
    ///
    /// Error statuses become [`LatisError::InvalidQuery`] carrying either the response body
    /// or the status code, per `detail`. Nothing is logged here.
    pub fn probe(&self, url: &str, detail: ErrorDetail) -> Result<HttpResponse> {
        let resp = self.transport.get(url)?;
        if resp.is_error() {
            return Err(LatisError::InvalidQuery {
                url: url.to_string(),
                detail: format_query_error(url, resp.status, &resp.text(), detail),
            }
            .into());
        }
        Ok(resp)
    }

    /// Like [`Validator::probe`] but only reports the verdict, logging failures at error level.
    pub fn is_servable_with(&self, url: &str, detail: ErrorDetail) -> bool {
        match self.probe(url, detail) {
            Ok(_) => true,
            Err(e) => {
                error!(url, "Cannot build query\n{e:#}");
                false
            }
        }
    }

    pub fn is_servable(&self, url: &str) -> bool {
        self.is_servable_with(url, ErrorDetail::Body)
    }
}
