use std::fmt;

use serde::Serialize;
use url::Url;

use crate::error::{Result, ScanError};

const DEFAULT_SCHEME: &str = "https://";
const KNOWN_SCHEMES: &[&str] = &["http://", "https://"];

/// Canonical scan target: scheme-qualified, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the probe URL for one candidate path (`base + "/" + path`).
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize user input into a [`BaseUrl`].
///
/// - surrounding whitespace is ignored
/// - `https://` is prepended when no `http://` or `https://` prefix is present
/// - exactly one trailing `/` is removed
///
/// Fails with [`ScanError::InvalidTarget`] for empty input or anything that
/// does not parse as an absolute URL with a host.
pub fn resolve(raw: &str) -> Result<BaseUrl> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(ScanError::InvalidTarget("target is empty".into()));
    }

    let mut base = if has_known_scheme(input) {
        input.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{input}")
    };
    if base.ends_with('/') {
        base.pop();
    }

    match Url::parse(&base) {
        Ok(u) if u.host_str().is_some_and(|h| !h.is_empty()) => Ok(BaseUrl(base)),
        Ok(_) => Err(ScanError::InvalidTarget(format!("{input}: missing host"))),
        Err(e) => Err(ScanError::InvalidTarget(format!("{input}: {e}"))),
    }
}

fn has_known_scheme(s: &str) -> bool {
    KNOWN_SCHEMES.iter().any(|scheme| {
        s.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
