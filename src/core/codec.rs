use crate::domain::model::ParsedUrl;
use crate::utils::error::{RepostError, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

// Optional scheme, dotted-name or dotted-quad host, optional port, path, query and fragment.
// ASCII-only: Unicode digits and case folds (U+212A, U+017F) must not pass as host text.
static URL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i-u)^(https?://)?",
        r"((([a-z0-9]([a-z0-9-]*[a-z0-9])?)\.)+[a-z]{2,}|([0-9]{1,3}\.){3}[0-9]{1,3})",
        r"(:[0-9]+)?",
        r"(/[-a-z0-9%_.~+!$&'()*,;=:@]*)*",
        r"(\?[-a-z0-9%_.~+!$&'()*,;=:@/?]*)?",
        r"(#[-a-z0-9%_.~+!$&'()*,;=:@/?]*)?$",
    ))
    .expect("URL syntax pattern compiles")
});

/// Everything but RFC 3986 unreserved characters gets escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Splits frame source URLs into their parts and turns the query into form fields.
#[derive(Debug, Clone, Default)]
pub struct QueryStringCodec {
    base: Option<Url>,
}

impl QueryStringCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources without an `http`/`https` scheme are resolved against `base`,
    /// the way an anchor inside the host document would resolve them.
    pub fn with_base(base: Url) -> Self {
        Self { base: Some(base) }
    }

    pub fn strip_fragment(url: &str) -> &str {
        match url.find('#') {
            Some(idx) => &url[..idx],
            None => url,
        }
    }

    pub fn has_query_component(url: &str) -> bool {
        Self::strip_fragment(url)
            .split_once('?')
            .is_some_and(|(_, query)| !query.is_empty())
    }

    pub fn parse(&self, url: &str) -> Result<ParsedUrl> {
        let clean = Self::strip_fragment(url);

        let absolute = if has_http_scheme(clean) {
            clean.to_string()
        } else {
            let base = self
                .base
                .as_ref()
                .ok_or_else(|| RepostError::invalid_url(url, "relative URL without a base URL"))?;
            base.join(clean)
                .map_err(|e| RepostError::invalid_url(url, e.to_string()))?
                .to_string()
        };

        if !URL_SYNTAX.is_match(&absolute) {
            return Err(RepostError::invalid_url(url, "does not match URL syntax"));
        }

        let parsed = Url::parse(&absolute).map_err(|e| RepostError::invalid_url(url, e.to_string()))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(RepostError::invalid_url(url, "missing host")),
        };

        Ok(ParsedUrl {
            url: clean.to_string(),
            scheme: parsed.scheme().to_string(),
            host,
            path: parsed.path().to_string(),
            parameter_list: split_query(parsed.query().unwrap_or("")),
        })
    }

    /// `scheme://host/path` with exactly one leading slash taken off the path
    /// before the separator is re-added.
    pub fn destination_of(parsed: &ParsedUrl) -> String {
        let path = parsed.path.strip_prefix('/').unwrap_or(&parsed.path);
        format!("{}://{}/{}", parsed.scheme, parsed.host, path)
    }

    /// Decoded fields in query order. Each name and value is decoded once;
    /// escapes that do not form UTF-8 make the URL invalid.
    pub fn parameters_of(parsed: &ParsedUrl) -> Result<Vec<(String, String)>> {
        parsed
            .parameter_list
            .iter()
            .map(|(name, value)| {
                Ok((
                    decode_once(&parsed.url, name)?,
                    decode_once(&parsed.url, value)?,
                ))
            })
            .collect()
    }

    pub fn encode_fields(fields: &[(String, String)]) -> String {
        fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(name, COMPONENT),
                    utf8_percent_encode(value, COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

// Every piece becomes a field, empty ones included: `a&&b` is three fields.
fn split_query(query: &str) -> Vec<(String, String)> {
    if query.is_empty() {
        return Vec::new();
    }
    query
        .split('&')
        .map(|piece| match piece.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (piece.to_string(), String::new()),
        })
        .collect()
}

fn decode_once(url: &str, raw: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| {
            RepostError::invalid_url(url, format!("'{}' does not decode to UTF-8", raw))
        })
}
