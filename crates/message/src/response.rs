//! HTTP response values.

use http::StatusCode;

use crate::ensure;
use crate::error::MessageError;
use crate::message::{Message, MessageHead};

/// An immutable HTTP response: status code, reason phrase and the shared [`Message`] state.
#[derive(Debug, Clone)]
pub struct Response {
    head: MessageHead,
    status: StatusCode,
    reason_phrase: String,
}

/// Validates `code` against the 100..=599 range.
fn parse_status(code: u16) -> Result<StatusCode, MessageError> {
    ensure!((100..=599).contains(&code), MessageError::InvalidStatus { code });
    StatusCode::from_u16(code).map_err(|_e| MessageError::InvalidStatus { code })
}

/// Uses `reason_phrase` when given, else the standard phrase of `status`, else `""`.
fn resolve_reason(status: StatusCode, reason_phrase: Option<&str>) -> Result<String, MessageError> {
    match reason_phrase {
        Some(phrase) => {
            ensure!(
                !phrase.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0),
                MessageError::InvalidReasonPhrase { phrase: phrase.to_string() }
            );
            Ok(phrase.to_string())
        }
        None => Ok(status.canonical_reason().unwrap_or_default().to_string()),
    }
}

impl Response {
    /// Creates a response with no headers and an empty body.
    pub fn new(code: u16, reason_phrase: Option<&str>) -> Result<Self, MessageError> {
        Self::with_head(code, reason_phrase, MessageHead::default())
    }

    pub fn with_head(code: u16, reason_phrase: Option<&str>, head: MessageHead) -> Result<Self, MessageError> {
        let status = parse_status(code)?;
        let reason_phrase = resolve_reason(status, reason_phrase)?;
        Ok(Self { head, status, reason_phrase })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    /// Returns a copy with the status replaced; the reason phrase resolves like in [`Response::new`].
    pub fn with_status(&self, code: u16, reason_phrase: Option<&str>) -> Result<Self, MessageError> {
        let status = parse_status(code)?;
        let reason_phrase = resolve_reason(status, reason_phrase)?;
        Ok(Self { status, reason_phrase, head: self.head.clone() })
    }
}

impl Message for Response {
    fn head(&self) -> &MessageHead {
        &self.head
    }

    fn head_mut(&mut self) -> &mut MessageHead {
        &mut self.head
    }
}
