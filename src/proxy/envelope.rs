//! Proxy-integration envelope schema.
//!
//! Field names follow the API Gateway REST proxy format exactly. The proxy
//! layer sends explicit `null` for absent maps and bodies, so every
//! collection and string field tolerates `null` as well as omission.

use std::collections::{BTreeMap, HashMap};

use axum::http::{header, HeaderMap, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Inbound envelope describing one HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyRequest {
    /// Resource path template, e.g. `/items/{id}`.
    #[serde(deserialize_with = "nullable")]
    pub resource: String,

    /// Request path. Used verbatim as the request target.
    #[serde(deserialize_with = "nullable")]
    pub path: String,

    #[serde(deserialize_with = "nullable")]
    pub http_method: String,

    #[serde(deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,

    #[serde(deserialize_with = "nullable")]
    pub multi_value_headers: HashMap<String, Vec<String>>,

    #[serde(deserialize_with = "nullable")]
    pub query_string_parameters: HashMap<String, String>,

    #[serde(deserialize_with = "nullable")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,

    /// Opaque, carried but never interpreted.
    pub path_parameters: Value,

    /// Opaque, carried but never interpreted.
    pub stage_variables: Value,

    #[serde(deserialize_with = "nullable")]
    pub body: String,

    /// `body` holds base64 of the raw request bytes.
    #[serde(rename = "isBase64Encoded", deserialize_with = "nullable")]
    pub is_base64_encoded: bool,

    #[serde(deserialize_with = "nullable")]
    pub request_context: HashMap<String, Value>,
}

/// Outbound envelope describing one HTTP response.
///
/// `body` is the literal response text when `is_base64_encoded` is false,
/// and base64 of the raw response bytes otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
    pub status_code: u16,
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

impl ProxyResponse {
    /// Encode a status, header set and raw body into an envelope.
    ///
    /// Bodies declared as exactly `application/json` stay readable text;
    /// everything else is base64 of the raw bytes.
    pub fn encode(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Self {
        let is_json = headers
            .get(header::CONTENT_TYPE)
            .is_some_and(|v| v.as_bytes() == b"application/json");

        let (is_base64_encoded, body) = if is_json {
            (false, String::from_utf8_lossy(body).into_owned())
        } else {
            (true, STANDARD.encode(body))
        };

        Self {
            is_base64_encoded,
            status_code: status.as_u16(),
            multi_value_headers: multi_value_headers(headers),
            body,
        }
    }

    /// Decode `body` back into raw bytes.
    pub fn decoded_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            STANDARD.decode(&self.body)
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

/// Short plain-text diagnostic envelope for per-request failures.
pub fn error_response(status: StatusCode, msg: &str) -> ProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain"),
    );
    ProxyResponse::encode(status, &headers, msg.as_bytes())
}

/// Group a header map by name, keeping value order within each name.
pub fn multi_value_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        out.entry(canonical_header_key(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// Canonical MIME form of a header name: `content-type` becomes `Content-Type`.
///
/// Names containing anything other than token characters are returned as-is.
pub fn canonical_header_key(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
