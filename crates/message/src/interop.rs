//! Conversions between the message values of this crate and the `http` crate types.
//!
//! [`Body`] implements [`http_body::Body`], so a converted request or response can be handed
//! to anything speaking `http-body`. Frames are produced by reading the stream synchronously
//! in chunks; the streams of this crate are file or memory backed.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::error::{MessageError, StreamError, UriError};
use crate::header::Headers;
use crate::message::{Message, MessageHead, ProtocolVersion};
use crate::request::Request;
use crate::response::Response;
use crate::stream::{Body, Stream};
use crate::uri::Uri;

const FRAME_SIZE: usize = 8 * 1024;

impl HttpBody for Body {
    type Data = Bytes;
    type Error = StreamError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut stream = self.lock();
        let frame = match stream.read_bytes(FRAME_SIZE) {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(Ok(Frame::data(bytes))),
            Err(e) => Some(Err(e)),
        };
        Poll::Ready(frame)
    }

    fn size_hint(&self) -> SizeHint {
        let mut stream = self.lock();
        if !stream.is_seekable() {
            return SizeHint::default();
        }
        match (stream.size(), stream.tell()) {
            (Some(size), Ok(position)) => SizeHint::with_exact(size.saturating_sub(position)),
            _ => SizeHint::default(),
        }
    }
}

impl TryFrom<&Uri> for http::Uri {
    type Error = UriError;

    /// Drops the fragment, which has no place in an HTTP request target. A scheme-relative
    /// URI is rejected; `http::Uri` cannot carry an authority without a scheme.
    fn try_from(uri: &Uri) -> Result<Self, Self::Error> {
        let path_and_query = uri.path_and_query();
        let rendered = match (uri.scheme(), uri.authority()) {
            (None, Some(_)) => return Err(UriError::malformed(format!("{uri} has an authority but no scheme"))),
            (Some(scheme), Some(authority)) if path_and_query.starts_with('/') => {
                format!("{scheme}://{authority}{path_and_query}")
            }
            (Some(scheme), Some(authority)) => format!("{scheme}://{authority}/{path_and_query}"),
            _ => path_and_query,
        };
        http::Uri::try_from(rendered.as_str()).map_err(UriError::malformed)
    }
}

impl TryFrom<&http::Uri> for Uri {
    type Error = UriError;

    fn try_from(uri: &http::Uri) -> Result<Self, Self::Error> {
        Uri::parse(&uri.to_string())
    }
}

fn http_version(version: &ProtocolVersion) -> Result<http::Version, MessageError> {
    version.to_http_version().ok_or_else(|| MessageError::invalid_protocol_version(version))
}

fn head_from_parts(version: http::Version, headers: &http::HeaderMap, body: Bytes) -> Result<MessageHead, MessageError> {
    let mut head = MessageHead::new(ProtocolVersion::from(version), Body::new(Stream::from(body)));
    head.headers = Headers::try_from(headers)?;
    Ok(head)
}

impl TryFrom<Request> for http::Request<Body> {
    type Error = MessageError;

    fn try_from(request: Request) -> Result<Self, Self::Error> {
        let mut http_request = http::Request::new(request.body().clone());
        *http_request.method_mut() = request.method().clone();
        *http_request.uri_mut() = http::Uri::try_from(request.uri())?;
        *http_request.version_mut() = http_version(request.protocol_version())?;
        *http_request.headers_mut() = request.headers().to_header_map()?;
        Ok(http_request)
    }
}

impl TryFrom<http::Request<Bytes>> for Request {
    type Error = MessageError;

    fn try_from(http_request: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = http_request.into_parts();
        let uri = Uri::try_from(&parts.uri)?;
        let head = head_from_parts(parts.version, &parts.headers, body)?;
        Request::with_head(parts.method.as_str(), uri, head)
    }
}

impl TryFrom<Response> for http::Response<Body> {
    type Error = MessageError;

    fn try_from(response: Response) -> Result<Self, Self::Error> {
        let mut http_response = http::Response::new(response.body().clone());
        *http_response.status_mut() = response.status();
        *http_response.version_mut() = http_version(response.protocol_version())?;
        *http_response.headers_mut() = response.headers().to_header_map()?;
        Ok(http_response)
    }
}

impl TryFrom<http::Response<Bytes>> for Response {
    type Error = MessageError;

    fn try_from(http_response: http::Response<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = http_response.into_parts();
        let head = head_from_parts(parts.version, &parts.headers, body)?;
        Response::with_head(parts.status.as_u16(), None, head)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn test_body_frames() {
        let content = vec![b'x'; FRAME_SIZE * 2 + 10];
        let body = Body::new(Stream::temp(&content, 1024).unwrap());
        assert_eq!(body.size_hint().exact(), Some(content.len() as u64));

        let collected = block_on(body.clone().collect()).unwrap().to_bytes();
        assert_eq!(collected.len(), content.len());
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[test]
    fn test_detached_body_errors() {
        let body = Body::empty();
        body.lock().detach();
        assert!(block_on(body.collect()).is_err());
    }

    #[test]
    fn test_uri_to_http() {
        let uri = Uri::parse("https://example.com:8443/a/b?x=1#frag").unwrap();
        let http_uri = http::Uri::try_from(&uri).unwrap();
        assert_eq!(http_uri.to_string(), "https://example.com:8443/a/b?x=1");

        let relative = http::Uri::try_from(&Uri::parse("").unwrap()).unwrap();
        assert_eq!(relative.to_string(), "/");

        let scheme_relative = Uri::parse("//cdn.example.com/x").unwrap();
        assert!(matches!(http::Uri::try_from(&scheme_relative), Err(UriError::Malformed { .. })));
    }

    #[test]
    fn test_request_into_http() {
        let request = Request::new("POST", Uri::parse("http://example.com/submit").unwrap())
            .unwrap()
            .with_header("Content-Type", ["text/plain"])
            .unwrap()
            .with_body(Stream::temp(b"hello", 64).unwrap());

        let http_request = http::Request::<Body>::try_from(request).unwrap();
        assert_eq!(http_request.method(), http::Method::POST);
        assert_eq!(http_request.uri().path(), "/submit");
        assert_eq!(http_request.version(), http::Version::HTTP_11);
        assert_eq!(http_request.headers()["content-type"], "text/plain");

        let body = block_on(http_request.into_body().collect()).unwrap().to_bytes();
        assert_eq!(body, "hello");
    }

    #[test]
    fn test_request_from_http() {
        let http_request = http::Request::builder()
            .method("PUT")
            .uri("http://example.com/items/1?full=true")
            .header("Accept", "application/json")
            .header("Accept", "text/html")
            .body(Bytes::from_static(b"{}"))
            .unwrap();

        let request = Request::try_from(http_request).unwrap();
        assert_eq!(request.method(), &http::Method::PUT);
        assert_eq!(request.uri().query(), Some("full=true"));
        assert_eq!(request.header_line("accept"), "application/json, text/html");
        assert_eq!(request.body().lock().read_all().unwrap(), "{}");
    }

    #[test]
    fn test_unsupported_version() {
        let request = Request::new("GET", Uri::parse("/").unwrap()).unwrap().with_protocol_version("4.2").unwrap();
        let err = http::Request::<Body>::try_from(request).unwrap_err();
        assert!(matches!(err, MessageError::InvalidProtocolVersion { .. }));
    }

    #[test]
    fn test_response_roundtrip() {
        let response = Response::new(404, None).unwrap().with_header("X-Trace", ["abc"]).unwrap();
        let http_response = http::Response::<Body>::try_from(response).unwrap();
        assert_eq!(http_response.status(), http::StatusCode::NOT_FOUND);

        let (parts, _body) = http_response.into_parts();
        let back = Response::try_from(http::Response::from_parts(parts, Bytes::from_static(b"missing"))).unwrap();
        assert_eq!(back.status_code(), 404);
        assert_eq!(back.reason_phrase(), "Not Found");
        assert_eq!(back.header("x-trace"), ["abc"]);
    }
}
