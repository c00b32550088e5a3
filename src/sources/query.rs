use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{Engine, alphabet};
use serde_json::Value;
use tracing::{debug, warn};

/// Standard alphabet; trailing `=` padding is optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Source parameters recognised in a dashboard query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadRequest {
    /// Inline KPI payload, URI-encoded JSON or base64 JSON.
    pub strategies: Option<String>,
    /// Inline JSON, or an http(s) URL to fetch.
    pub data: Option<String>,
    pub data_url: Option<String>,
    pub gist: Option<String>,
}

impl LoadRequest {
    /// Parses a full URL or a bare query string (with or without the leading
    /// `?`). The first occurrence of a parameter wins and empty values are
    /// treated as absent.
    pub fn from_query(input: &str) -> Self {
        let query = match input.split_once('?') {
            Some((_, rest)) => rest,
            None => input,
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut request = Self::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
            let Some(value) = form_decode(raw) else {
                warn!(param = key, "query parameter is not valid UTF-8, ignoring");
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            let slot = match key {
                "strategies" => &mut request.strategies,
                "data" => &mut request.data,
                "data_url" | "dataUrl" => &mut request.data_url,
                "gist" => &mut request.gist,
                _ => {
                    debug!(param = key, "ignoring query parameter");
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        request
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_none()
            && self.data.is_none()
            && self.data_url.is_none()
            && self.gist.is_none()
    }
}

fn form_decode(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|v| v.into_owned())
}

/// Decodes a `strategies` value. URI-encoded JSON is tried first, then
/// base64 JSON. Only arrays and objects are accepted.
pub fn decode_strategies(raw: &str) -> Option<Value> {
    if let Some(value) = decode_uri_json(raw) {
        return Some(value);
    }
    decode_base64_json(raw)
}

/// Parses `raw` as JSON after one more round of percent-decoding. Values that
/// fail to percent-decode are parsed as-is.
pub fn decode_uri_json(raw: &str) -> Option<Value> {
    let decoded = urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    container(serde_json::from_str(decoded.trim()).ok()?)
}

fn decode_base64_json(raw: &str) -> Option<Value> {
    // An unescaped '+' in a query string arrives as a space.
    let cleaned: String = raw.trim().replace(' ', "+");
    let bytes = match LENIENT.decode(cleaned.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "strategies parameter is not base64");
            return None;
        }
    };
    let text = String::from_utf8(bytes).ok()?;
    container(serde_json::from_str(&text).ok()?)
}

fn container(value: Value) -> Option<Value> {
    (value.is_array() || value.is_object()).then_some(value)
}
