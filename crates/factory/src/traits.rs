//! Capability-set factory traits.
//!
//! Each trait covers the construction of one kind of value. Components that need to build
//! messages depend on the narrowest trait that serves them; [`Factory`](crate::Factory)
//! implements all of them.

use std::path::Path;

use micro_message::error::{MessageError, StreamError, UploadedFileError, UriError};
use micro_message::server_request::Params;
use micro_message::stream::{Handle, Stream};
use micro_message::upload::{UploadError, UploadedFile};
use micro_message::{Request, Response, ServerRequest, Uri};

use crate::environment::Environment;

pub trait UriFactory {
    /// Parses `uri`; the empty string is a valid, empty URI.
    fn create_uri(&self, uri: &str) -> Result<Uri, UriError>;
}

pub trait StreamFactory {
    /// Creates a readable, writable and seekable stream holding `content`, rewound to offset 0.
    fn create_stream(&self, content: &[u8]) -> Result<Stream, StreamError>;

    /// Opens the file at `path` with an fopen-style `mode` like `r`, `w+` or `ab`.
    ///
    /// An invalid mode is an invalid argument; a file that cannot be opened is an I/O error.
    fn create_stream_from_file(&self, path: &Path, mode: &str) -> Result<Stream, StreamError>;

    /// Wraps an externally supplied handle, which must be readable.
    fn create_stream_from_handle(&self, handle: Handle) -> Result<Stream, StreamError>;
}

pub trait UploadedFileFactory {
    /// Creates an uploaded file over `stream`; without `size`, the stream is measured.
    fn create_uploaded_file(
        &self,
        stream: Stream,
        size: Option<u64>,
        error: UploadError,
        client_filename: Option<&str>,
        client_media_type: Option<&str>,
    ) -> Result<UploadedFile, UploadedFileError>;
}

/// Values a request factory accepts as a target URI.
pub trait IntoUri {
    fn into_uri(self) -> Result<Uri, UriError>;
}

impl IntoUri for Uri {
    fn into_uri(self) -> Result<Uri, UriError> {
        Ok(self)
    }
}

impl IntoUri for &Uri {
    fn into_uri(self) -> Result<Uri, UriError> {
        Ok(self.clone())
    }
}

impl IntoUri for &str {
    fn into_uri(self) -> Result<Uri, UriError> {
        Uri::parse(self)
    }
}

impl IntoUri for String {
    fn into_uri(self) -> Result<Uri, UriError> {
        Uri::parse(&self)
    }
}

pub trait RequestFactory: UriFactory + StreamFactory {
    /// Creates a request with no headers and an empty body.
    fn create_request<U: IntoUri>(&self, method: &str, uri: U) -> Result<Request, MessageError>;
}

pub trait ResponseFactory {
    /// Creates a response; `code` must be within 100..=599.
    fn create_response(&self, code: u16, reason_phrase: Option<&str>) -> Result<Response, MessageError>;

    /// Creates a `200 OK` response.
    fn create_ok_response(&self) -> Result<Response, MessageError> {
        self.create_response(200, None)
    }
}

pub trait ServerRequestFactory: RequestFactory + UploadedFileFactory {
    /// Creates a server request with fixed `server_params`; cookies, query parameters, parsed
    /// body, uploaded files and attributes all start empty.
    fn create_server_request<U: IntoUri>(
        &self,
        method: &str,
        uri: U,
        server_params: Params,
    ) -> Result<ServerRequest, MessageError>;

    /// Builds a server request from everything the environment knows about the incoming request.
    fn create_server_request_from_globals<E: Environment + ?Sized>(
        &self,
        environment: &E,
    ) -> Result<ServerRequest, MessageError>;
}
