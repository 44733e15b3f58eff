//! Decoding of the ArangoDB response envelope.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{ApiError, Error, Result};

#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(default)]
    error: bool,
    #[serde(default, rename = "errorMessage")]
    error_message: String,
    #[serde(default, rename = "errorNum")]
    error_num: Option<i64>,
    #[serde(default, borrow)]
    result: Option<&'a RawValue>,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    cached: bool,
    #[serde(default)]
    count: Option<u64>,
}

/// A decoded, successful database response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    status_code: u16,
    raw: Vec<u8>,
    result: Option<Vec<u8>>,
    has_more: bool,
    cursor_id: Option<String>,
    cached: bool,
    count: Option<u64>,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"))
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}

impl Response {
    /// Decodes a raw HTTP exchange.
    ///
    /// The envelope is decoded only for JSON content whose body is an object.
    /// Database errors and non-2xx statuses become [`Error::Api`]; a `hasMore`
    /// page without a cursor id is a decode error.
    pub fn parse(status_code: u16, headers: &HeaderMap, body: &[u8]) -> Result<Self> {
        let raw = trim_ascii(body);
        let success = (200..300).contains(&status_code);

        let envelope = if is_json(headers) && raw.first() == Some(&b'{') {
            Some(serde_json::from_slice::<Envelope<'_>>(raw)?)
        } else {
            None
        };

        let Some(envelope) = envelope else {
            if !success {
                let message = if raw.is_empty() {
                    status_reason(status_code)
                } else {
                    String::from_utf8_lossy(raw).into_owned()
                };
                return Err(ApiError::new(message).with_status_code(status_code).into());
            }
            return Ok(Self {
                status_code,
                raw: raw.to_vec(),
                ..Self::default()
            });
        };

        if envelope.error || !success {
            let message = if envelope.error_message.is_empty() {
                status_reason(status_code)
            } else {
                envelope.error_message
            };
            let mut err = ApiError::new(message);
            if envelope.error {
                err.error_num = envelope.error_num;
            }
            if !success {
                err.status_code = Some(status_code);
            }
            return Err(err.into());
        }

        let cursor_id = envelope.id.filter(|id| !id.is_empty());
        if envelope.has_more && cursor_id.is_none() {
            return Err(Error::decode("response has more results but no cursor id"));
        }

        Ok(Self {
            status_code,
            raw: raw.to_vec(),
            result: envelope.result.map(|r| r.get().as_bytes().to_vec()),
            has_more: envelope.has_more,
            cursor_id,
            cached: envelope.cached,
            count: envelope.count,
        })
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The whole trimmed body.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The raw `result` member, if the envelope had one.
    pub fn raw_result(&self) -> Option<&[u8]> {
        self.result.as_deref()
    }

    /// The page payload: `result` when present, the whole body otherwise.
    pub fn payload(&self) -> &[u8] {
        self.raw_result().unwrap_or(&self.raw)
    }

    /// Consumes the response and returns its payload.
    pub fn into_payload(self) -> Vec<u8> {
        self.result.unwrap_or(self.raw)
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Cursor id, present whenever `has_more` is true.
    pub fn cursor_id(&self) -> Option<&str> {
        self.cursor_id.as_deref()
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// Deserializes the payload.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(self.payload())?)
    }
}

fn status_reason(status_code: u16) -> String {
    StatusCode::from_u16(status_code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map_or_else(|| format!("HTTP status {status_code}"), str::to_string)
}
