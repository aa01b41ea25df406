/// Failures surfaced by the LaTiS client.
///
/// Public operations return [`anyhow::Result`]; when a failure originates in this crate the
/// root cause is a `LatisError`, so callers can branch on it with
/// `err.downcast_ref::<LatisError>()`.
#[derive(Debug, thiserror::Error)]
pub enum LatisError {
    /// Network-level failure talking to the service. Not retried.
    #[error("could not reach LaTiS at {url}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Neither protocol generation can serve the dataset.
    #[error("{dataset} cannot be accessed through LaTiS version 2 or version 3")]
    NoUsableProtocol { dataset: String },

    /// The service answered with an error status (>= 400).
    #[error("invalid query: {url}\n{detail}")]
    InvalidQuery { url: String, detail: String },

    /// A catalog, metadata or data payload did not have the expected shape.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("{format} is not a valid LaTiS format. Valid formats are: {valid}")]
    InvalidFormat { format: String, valid: String },

    #[error("unknown LaTiS version [{0}]; expected 2 or 3")]
    InvalidVersion(String),
}

/// How a failing endpoint describes its failure.
///
/// LaTiS 2 endpoints answer errors with a readable text body; the LaTiS 3 catalog only
/// reports a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDetail {
    Body,
    Status,
}

pub(crate) fn format_query_error(
    url: &str,
    status: u16,
    body: &str,
    detail: ErrorDetail,
) -> String {
    match detail {
        ErrorDetail::Body => {
            let body = body
                .trim()
                .lines()
                .collect::<Vec<_>>()
                .join("\n    ");
            format!("    Query: {url} got:\n    {body}")
        }
        ErrorDetail::Status => format!("    Query: {url} got: {status}"),
    }
}
