//! Immutable HTTP message values
//!
//! This crate provides the value layer for HTTP messages: URIs, byte streams, requests,
//! responses, server-side requests and uploaded files. Every value is immutable; mutators
//! named `with_*` validate their input and return a modified copy, leaving the original
//! untouched.
//!
//! # Example
//!
//! ```
//! use micro_message::{Message, Request, Response, Uri};
//! use micro_message::stream::Stream;
//!
//! let uri = Uri::parse("https://example.com:443/search?q=rust").unwrap();
//! assert_eq!(uri.port(), None);
//!
//! let request = Request::new("GET", uri).unwrap()
//!     .with_header("Accept", ["text/html"]).unwrap();
//! assert_eq!(request.header_line("accept"), "text/html");
//! assert!(!request.has_header("Host"));
//!
//! let response = Response::new(200, None).unwrap()
//!     .with_body(Stream::temp(b"Hello World!", 1024).unwrap());
//! assert_eq!(response.reason_phrase(), "OK");
//! assert_eq!(response.body().lock().read_all().unwrap(), "Hello World!");
//! ```
//!
//! # Architecture
//!
//! - [`uri`]: RFC 3986 parsing, percent-encoding and the [`Uri`] value
//! - [`stream`]: [`Stream`](stream::Stream) over files, spooled temporary storage, memory
//!   or arbitrary readers, and the shared [`Body`](stream::Body) reference messages hold
//! - [`header`]: the case-insensitive, insertion-ordered header store
//! - [`message`]: the [`Message`] trait shared by [`Request`], [`Response`] and [`ServerRequest`]
//! - [`upload`]: [`UploadedFile`](upload::UploadedFile) and the uploaded-file tree
//! - [`interop`]: conversions to and from the `http` crate types
//!
//! # Error Handling
//!
//! Each area has its own error type, all classified by [`error::ErrorKind`]:
//!
//! - [`error::MessageError`]: top-level error, wrapping the others
//! - [`error::UriError`]: malformed URIs and URI components
//! - [`error::StreamError`]: stream state and I/O failures
//! - [`error::UploadedFileError`]: uploaded file state and move failures

pub mod error;
pub mod header;
pub mod interop;
pub mod message;
pub mod request;
pub mod response;
pub mod server_request;
pub mod stream;
pub mod upload;
pub mod uri;

mod utils;
pub(crate) use utils::ensure;

pub use message::{Message, ProtocolVersion};
pub use request::{HostPolicy, Request};
pub use response::Response;
pub use server_request::ServerRequest;
pub use uri::Uri;
