use anyhow::{Context, Result};
use std::borrow::Cow;

/// Percent-encodes a clause token for embedding in a query string.
///
/// ASCII alphanumerics and `-_.~` pass through; everything else (including `&`, `=`, `,`,
/// `<`, `>`, parentheses and whitespace) is encoded. Tokens that are already safe come back
/// borrowed and unchanged.
pub fn encode(token: &str) -> Cow<'_, str> {
    urlencoding::encode(token)
}

/// Reverses [`encode`].
pub fn decode(token: &str) -> Result<Cow<'_, str>> {
    urlencoding::decode(token)
        .with_context(|| format!("token is not valid UTF-8 once decoded: {token}"))
}
