//! Keeping secrets out of logs
//!
//! [`Redacted`] hides a value from `Debug` and `Display`. RPC URLs often
//! carry an API key in the path or query, so [`redact_rpc_url`] keeps only
//! the scheme and host.

use std::fmt;
use url::Url;

#[derive(Clone, Copy)]
pub struct Redacted<T>(pub T);

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// `https://user:pw@host/v3/key?x=1` -> `https://host/<redacted>`
pub fn redact_rpc_url(rpc_url: &str) -> String {
    let Ok(url) = Url::parse(rpc_url) else {
        return "<redacted>".to_string();
    };
    let host = url.host_str().unwrap_or_default();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    let hidden = url.path() != "/" || url.query().is_some() || !url.username().is_empty();

    if hidden {
        format!("{}://{}{}/<redacted>", url.scheme(), host, port)
    } else {
        format!("{}://{}{}", url.scheme(), host, port)
    }
}
