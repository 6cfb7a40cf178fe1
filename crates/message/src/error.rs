//! Error types for message construction and stream/upload state transitions.
//!
//! Every error can be classified with [`ErrorKind`]:
//!
//! - [`ErrorKind::InvalidArgument`]: the caller handed in malformed input
//! - [`ErrorKind::IllegalState`]: the object is past a one-shot transition (detached stream, moved upload)
//! - [`ErrorKind::Io`]: the inputs were valid but the environment failed

use std::io;
use thiserror::Error;

/// Coarse classification shared by all error types of this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    IllegalState,
    Io,
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid header name: {name:?}")]
    InvalidHeaderName { name: String },

    #[error("invalid header value for {name:?}: {reason}")]
    InvalidHeaderValue { name: String, reason: String },

    #[error("invalid protocol version: {version:?}")]
    InvalidProtocolVersion { version: String },

    #[error("invalid http method: {method:?}")]
    InvalidMethod { method: String },

    #[error("invalid status code {code}, must be within 100..=599")]
    InvalidStatus { code: u16 },

    #[error("invalid reason phrase: {phrase:?}")]
    InvalidReasonPhrase { phrase: String },

    #[error("invalid request target: {reason}")]
    InvalidRequestTarget { reason: String },

    #[error("invalid parsed body: {reason}")]
    InvalidParsedBody { reason: String },

    #[error("invalid query string: {reason}")]
    InvalidQuery { reason: String },

    #[error("uri error: {source}")]
    Uri {
        #[from]
        source: UriError,
    },

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },

    #[error("uploaded file error: {source}")]
    UploadedFile {
        #[from]
        source: UploadedFileError,
    },
}

impl MessageError {
    pub fn invalid_header_name<S: ToString>(name: S) -> Self {
        Self::InvalidHeaderName { name: name.to_string() }
    }

    pub fn invalid_header_value<N: ToString, S: ToString>(name: N, reason: S) -> Self {
        Self::InvalidHeaderValue { name: name.to_string(), reason: reason.to_string() }
    }

    pub fn invalid_protocol_version<S: ToString>(version: S) -> Self {
        Self::InvalidProtocolVersion { version: version.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_request_target<S: ToString>(reason: S) -> Self {
        Self::InvalidRequestTarget { reason: reason.to_string() }
    }

    pub fn invalid_parsed_body<S: ToString>(reason: S) -> Self {
        Self::InvalidParsedBody { reason: reason.to_string() }
    }

    pub fn invalid_query<S: ToString>(reason: S) -> Self {
        Self::InvalidQuery { reason: reason.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Uri { source } => source.kind(),
            Self::Stream { source } => source.kind(),
            Self::UploadedFile { source } => source.kind(),
            _ => ErrorKind::InvalidArgument,
        }
    }
}

/// Errors raised while parsing or rebuilding a [`Uri`](crate::uri::Uri).
///
/// All of them are [`ErrorKind::InvalidArgument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("invalid scheme: {scheme:?}")]
    InvalidScheme { scheme: String },

    #[error("invalid host: {host:?}")]
    InvalidHost { host: String },

    #[error("invalid port: {port:?}, must be within 1..=65535")]
    InvalidPort { port: String },

    #[error("invalid character {ch:?} in {component}")]
    InvalidChar { component: &'static str, ch: char },

    #[error("malformed percent-encoding in {component}")]
    MalformedPercentEncoding { component: &'static str },

    #[error("malformed uri: {reason}")]
    Malformed { reason: String },
}

impl UriError {
    pub fn invalid_scheme<S: ToString>(scheme: S) -> Self {
        Self::InvalidScheme { scheme: scheme.to_string() }
    }

    pub fn invalid_host<S: ToString>(host: S) -> Self {
        Self::InvalidHost { host: host.to_string() }
    }

    pub fn invalid_port<S: ToString>(port: S) -> Self {
        Self::InvalidPort { port: port.to_string() }
    }

    pub fn malformed<S: ToString>(reason: S) -> Self {
        Self::Malformed { reason: reason.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream is detached")]
    Detached,

    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("invalid stream source: {reason}")]
    InvalidSource { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl StreamError {
    pub fn invalid_source<S: ToString>(reason: S) -> Self {
        Self::InvalidSource { reason: reason.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Detached | Self::NotReadable | Self::NotWritable | Self::NotSeekable => ErrorKind::IllegalState,
            Self::InvalidSource { .. } => ErrorKind::InvalidArgument,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Io { source } => source,
            StreamError::Detached => io::Error::new(io::ErrorKind::NotConnected, e),
            StreamError::NotReadable | StreamError::NotWritable | StreamError::NotSeekable => {
                io::Error::new(io::ErrorKind::Unsupported, e)
            }
            StreamError::InvalidSource { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadedFileError {
    #[error("uploaded file has already been moved")]
    AlreadyMoved,

    #[error("uploaded file is not available: {reason}")]
    UploadFailed { reason: &'static str },

    #[error("uploaded file stream is in use elsewhere")]
    StreamBusy,

    #[error("invalid upload error code: {code}")]
    InvalidErrorCode { code: i64 },

    #[error("invalid move target: {reason}")]
    InvalidTarget { reason: String },

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl UploadedFileError {
    pub fn invalid_target<S: ToString>(reason: S) -> Self {
        Self::InvalidTarget { reason: reason.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyMoved | Self::UploadFailed { .. } | Self::StreamBusy => ErrorKind::IllegalState,
            Self::InvalidErrorCode { .. } | Self::InvalidTarget { .. } => ErrorKind::InvalidArgument,
            Self::Stream { source } => source.kind(),
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}
