//! The capability set shared by requests and responses.
//!
//! [`Message`] is implemented by [`Request`](crate::Request), [`Response`](crate::Response)
//! and [`ServerRequest`](crate::ServerRequest). Every mutator clones the message, changes
//! the clone and returns it; the receiver is never touched. The body stream is shared
//! between the original and the clone until one of them calls [`Message::with_body`].

use std::fmt;
use std::str::FromStr;

use http::Version;

use crate::ensure;
use crate::error::MessageError;
use crate::header::Headers;
use crate::stream::Body;

/// A validated HTTP protocol version such as `1.1` or `2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    /// Accepts `major` or `major.minor`, both single digits.
    pub fn parse(version: &str) -> Result<Self, MessageError> {
        let valid = match version.as_bytes() {
            [major] => major.is_ascii_digit(),
            [major, b'.', minor] => major.is_ascii_digit() && minor.is_ascii_digit(),
            _ => false,
        };
        ensure!(valid, MessageError::invalid_protocol_version(version));
        Ok(Self(version.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Maps onto [`http::Version`] when the version is one it knows.
    pub fn to_http_version(&self) -> Option<Version> {
        match self.0.as_str() {
            "0.9" => Some(Version::HTTP_09),
            "1.0" => Some(Version::HTTP_10),
            "1.1" => Some(Version::HTTP_11),
            "2" | "2.0" => Some(Version::HTTP_2),
            "3" | "3.0" => Some(Version::HTTP_3),
            _ => None,
        }
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self("1.1".to_string())
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProtocolVersion {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Version> for ProtocolVersion {
    fn from(version: Version) -> Self {
        let version = match version {
            Version::HTTP_09 => "0.9",
            Version::HTTP_10 => "1.0",
            Version::HTTP_2 => "2",
            Version::HTTP_3 => "3",
            _ => "1.1",
        };
        Self(version.to_string())
    }
}

/// Protocol version, headers and body: the state every message carries.
#[derive(Debug, Clone, Default)]
pub struct MessageHead {
    pub(crate) version: ProtocolVersion,
    pub(crate) headers: Headers,
    pub(crate) body: Body,
}

impl MessageHead {
    pub fn new(version: ProtocolVersion, body: Body) -> Self {
        Self { version, headers: Headers::new(), body }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::Request {}
    impl Sealed for crate::Response {}
    impl Sealed for crate::ServerRequest {}
}

/// Protocol version, case-insensitive headers and a body, with copy-on-write mutators.
pub trait Message: Clone + sealed::Sealed {
    #[doc(hidden)]
    fn head(&self) -> &MessageHead;

    #[doc(hidden)]
    fn head_mut(&mut self) -> &mut MessageHead;

    fn protocol_version(&self) -> &ProtocolVersion {
        &self.head().version
    }

    fn with_protocol_version(&self, version: &str) -> Result<Self, MessageError> {
        let version = ProtocolVersion::parse(version)?;
        let mut next = self.clone();
        next.head_mut().version = version;
        Ok(next)
    }

    fn headers(&self) -> &Headers {
        &self.head().headers
    }

    fn has_header(&self, name: &str) -> bool {
        self.head().headers.contains(name)
    }

    /// Returns every value of the header; empty when it is absent.
    fn header(&self, name: &str) -> &[String] {
        self.head().headers.get(name)
    }

    /// Returns the values of the header joined with `", "`.
    fn header_line(&self, name: &str) -> String {
        self.head().headers.get_line(name)
    }

    /// Returns a copy where `name` holds exactly `values`.
    fn with_header<V: AsRef<str>>(&self, name: &str, values: impl IntoIterator<Item = V>) -> Result<Self, MessageError> {
        let mut next = self.clone();
        next.head_mut().headers.set(name, values)?;
        Ok(next)
    }

    /// Returns a copy with `values` appended to `name`, under its existing canonical name.
    fn with_added_header<V: AsRef<str>>(
        &self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, MessageError> {
        let mut next = self.clone();
        next.head_mut().headers.append(name, values)?;
        Ok(next)
    }

    #[must_use]
    fn without_header(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.head_mut().headers.remove(name);
        next
    }

    fn body(&self) -> &Body {
        &self.head().body
    }

    #[must_use]
    fn with_body(&self, body: impl Into<Body>) -> Self {
        let mut next = self.clone();
        next.head_mut().body = body.into();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_version() {
        assert_eq!(ProtocolVersion::default().as_str(), "1.1");
        assert_eq!(ProtocolVersion::parse("2").unwrap().to_http_version(), Some(Version::HTTP_2));
        assert_eq!(ProtocolVersion::parse("1.0").unwrap().to_http_version(), Some(Version::HTTP_10));
        assert_eq!(ProtocolVersion::parse("4.2").unwrap().to_http_version(), None);

        assert!(ProtocolVersion::parse("").is_err());
        assert!(ProtocolVersion::parse("1.").is_err());
        assert!(ProtocolVersion::parse("HTTP/1.1").is_err());
        assert!(ProtocolVersion::parse("10.1").is_err());
    }

    #[test]
    fn test_from_http_version() {
        assert_eq!(ProtocolVersion::from(Version::HTTP_11), ProtocolVersion::default());
        assert_eq!(ProtocolVersion::from(Version::HTTP_2).as_str(), "2");
    }
}
