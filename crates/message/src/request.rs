//! Client-side HTTP request values.

use http::Method;
use tracing::warn;

use crate::ensure;
use crate::error::MessageError;
use crate::message::{Message, MessageHead};
use crate::uri::Uri;

/// How [`Request::with_uri`] treats the `Host` header.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum HostPolicy {
    /// Replace `Host` with the authority of the new URI whenever it has a host.
    #[default]
    Overwrite,
    /// Keep a non-empty `Host` header; only fill it in when it is missing or empty.
    Preserve,
}

/// An immutable HTTP request: method, target URI and the shared [`Message`] state.
#[derive(Debug, Clone)]
pub struct Request {
    head: MessageHead,
    method: Method,
    request_target: Option<String>,
    uri: Uri,
    host_policy: HostPolicy,
}

/// Validates `method` as a non-empty HTTP token; the case is preserved.
pub(crate) fn parse_method(method: &str) -> Result<Method, MessageError> {
    Method::from_bytes(method.as_bytes()).map_err(|_e| MessageError::invalid_method(method))
}

impl Request {
    /// Creates a request with no headers, an empty body and protocol version `1.1`.
    pub fn new(method: &str, uri: Uri) -> Result<Self, MessageError> {
        Self::with_head(method, uri, MessageHead::default())
    }

    pub fn with_head(method: &str, uri: Uri, head: MessageHead) -> Result<Self, MessageError> {
        let method = parse_method(method)?;
        Ok(Self { head, method, request_target: None, uri, host_policy: HostPolicy::default() })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn with_method(&self, method: &str) -> Result<Self, MessageError> {
        let method = parse_method(method)?;
        Ok(Self { method, ..self.clone() })
    }

    /// Returns the explicit request target, or `path[?query]` of the URI.
    pub fn request_target(&self) -> String {
        match &self.request_target {
            Some(target) => target.clone(),
            None => self.uri.path_and_query(),
        }
    }

    /// Overrides the request target, e.g. with `*` or an absolute form.
    pub fn with_request_target(&self, target: &str) -> Result<Self, MessageError> {
        ensure!(!target.is_empty(), MessageError::invalid_request_target("request target is empty"));
        ensure!(
            !target.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()),
            MessageError::invalid_request_target(format!("{target:?} contains whitespace"))
        );
        Ok(Self { request_target: Some(target.to_string()), ..self.clone() })
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns a copy targeting `uri`, updating `Host` according to the [`HostPolicy`].
    #[must_use]
    pub fn with_uri(&self, uri: Uri) -> Self {
        let mut next = Self { uri, ..self.clone() };
        next.update_host();
        next
    }

    fn update_host(&mut self) {
        let Some(host) = self.uri.host_header() else {
            return;
        };
        let update = match self.host_policy {
            HostPolicy::Overwrite => true,
            HostPolicy::Preserve => self.head.headers.get("host").iter().all(String::is_empty),
        };
        if !update {
            return;
        }
        match self.head.headers.set("Host", [&host]) {
            Ok(()) => self.head.headers.move_to_front("host"),
            Err(e) => warn!(host = %host, cause = %e, "could not update host header from uri"),
        }
    }

    pub fn host_policy(&self) -> HostPolicy {
        self.host_policy
    }

    #[must_use]
    pub fn with_host_policy(&self, host_policy: HostPolicy) -> Self {
        Self { host_policy, ..self.clone() }
    }
}

impl Message for Request {
    fn head(&self) -> &MessageHead {
        &self.head
    }

    fn head_mut(&mut self) -> &mut MessageHead {
        &mut self.head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Body, Stream};

    fn request(uri: &str) -> Request {
        Request::new("GET", Uri::parse(uri).unwrap()).unwrap()
    }

    #[test]
    fn test_new() {
        let request = request("http://example.com/index.html?x=1");
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.protocol_version().as_str(), "1.1");
        assert!(request.headers().is_empty());
        assert_eq!(request.request_target(), "/index.html?x=1");
    }

    #[test]
    fn test_method() {
        assert!(matches!(Request::new("", Uri::default()), Err(MessageError::InvalidMethod { .. })));
        assert!(matches!(Request::new("GE T", Uri::default()), Err(MessageError::InvalidMethod { .. })));

        let request = Request::new("purge", Uri::default()).unwrap();
        assert_eq!(request.method().as_str(), "purge");
        assert_eq!(request.with_method("POST").unwrap().method(), &Method::POST);
        assert_eq!(request.method().as_str(), "purge");
    }

    #[test]
    fn test_request_target() {
        let request = request("http://example.com");
        assert_eq!(request.request_target(), "/");

        let star = request.with_request_target("*").unwrap();
        assert_eq!(star.request_target(), "*");
        assert_eq!(request.request_target(), "/");

        assert!(request.with_request_target("/a b").is_err());
        assert!(request.with_request_target("").is_err());
    }

    #[test]
    fn test_with_uri_overwrites_host() {
        let request = request("/").with_header("Host", ["old.example.com"]).unwrap();
        let next = request.with_uri(Uri::parse("http://new.example.com:8080/x").unwrap());

        assert_eq!(next.header("host"), ["new.example.com:8080"]);
        assert_eq!(request.header("host"), ["old.example.com"]);
    }

    #[test]
    fn test_with_uri_preserves_host() {
        let request = request("/")
            .with_host_policy(HostPolicy::Preserve)
            .with_header("Accept", ["*/*"])
            .unwrap()
            .with_header("Host", ["old.example.com"])
            .unwrap();
        let next = request.with_uri(Uri::parse("http://new.example.com/").unwrap());
        assert_eq!(next.header("host"), ["old.example.com"]);

        let without = request.without_header("host").with_uri(Uri::parse("http://new.example.com/").unwrap());
        assert_eq!(without.header("host"), ["new.example.com"]);
        let names: Vec<_> = without.headers().iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["Host", "Accept"]);

        let empty = request.with_header("Host", [""]).unwrap().with_uri(Uri::parse("http://new.example.com/").unwrap());
        assert_eq!(empty.header("host"), ["new.example.com"]);
    }

    #[test]
    fn test_with_uri_without_host() {
        let request = request("http://example.com/");
        let next = request.with_uri(Uri::parse("/relative").unwrap());
        assert!(!next.has_header("host"));
        assert_eq!(next.uri().path(), "/relative");
    }

    #[test]
    fn test_immutability() {
        let request = request("/");
        let with = request.with_header("X-Foo", ["1"]).unwrap();

        assert_eq!(with.header("x-foo"), ["1"]);
        assert!(request.header("X-Foo").is_empty());

        let added = with.with_added_header("x-FOO", ["2"]).unwrap();
        assert_eq!(added.header("X-Foo"), ["1", "2"]);
        assert_eq!(added.headers().canonical_name("x-foo"), Some("X-Foo"));
        assert_eq!(with.header("X-Foo"), ["1"]);
    }

    #[test]
    fn test_body_is_shared_until_replaced() {
        let request = request("/").with_body(Stream::temp(b"payload", 64).unwrap());
        let copy = request.with_header("X", ["y"]).unwrap();
        assert!(request.body().ptr_eq(copy.body()));

        let replaced = copy.with_body(Body::empty());
        assert!(!replaced.body().ptr_eq(request.body()));
        assert_eq!(request.body().lock().read_all().unwrap(), "payload");
    }

    #[test]
    fn test_protocol_version() {
        let request = request("/");
        assert_eq!(request.with_protocol_version("2").unwrap().protocol_version().as_str(), "2");
        assert!(request.with_protocol_version("x").is_err());
    }
}
