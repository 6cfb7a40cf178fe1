//! The environment snapshot a server request is built from.
//!
//! Whatever receives the request (a CGI bridge, a test harness, an embedding server)
//! describes it through the [`Environment`] trait. [`Snapshot`] is an owned implementation
//! assembled builder-style.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use micro_message::stream::Body;
use serde_json::Value;

/// Describes an incoming request to
/// [`ServerRequestFactory::create_server_request_from_globals`](crate::ServerRequestFactory::create_server_request_from_globals).
#[cfg_attr(test, mockall::automock)]
pub trait Environment {
    fn method(&self) -> String;

    /// The raw request target, usually origin-form like `/path?query`.
    fn target(&self) -> String;

    /// An explicit protocol version like `1.1`; when absent, `SERVER_PROTOCOL` is consulted.
    fn protocol_version(&self) -> Option<String>;

    /// Header lines in arrival order; a name may repeat.
    fn headers(&self) -> Vec<(String, String)>;

    fn cookies(&self) -> Vec<(String, String)>;

    /// The raw, still encoded query string; empty when there is none.
    fn query_string(&self) -> String;

    fn server_params(&self) -> HashMap<String, String>;

    fn body(&self) -> Body;

    fn parsed_body(&self) -> Value;

    fn uploaded_files(&self) -> BTreeMap<String, FileDescriptor>;
}

/// One uploaded file as received: where it was stored and what the client claimed about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: Option<u64>,
    /// Raw upload error code; see [`UploadError`](micro_message::upload::UploadError).
    pub error: i64,
    pub client_filename: Option<String>,
    pub client_media_type: Option<String>,
}

impl FileEntry {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), size: None, error: 0, client_filename: None, client_media_type: None }
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn error(mut self, error: i64) -> Self {
        self.error = error;
        self
    }

    pub fn client_filename<S: Into<String>>(mut self, client_filename: S) -> Self {
        self.client_filename = Some(client_filename.into());
        self
    }

    pub fn client_media_type<S: Into<String>>(mut self, client_media_type: S) -> Self {
        self.client_media_type = Some(client_media_type.into());
        self
    }
}

/// The nested shape of uploaded files, mirroring form field names like `docs[]` or `a[b][c]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDescriptor {
    File(FileEntry),
    Map(BTreeMap<String, FileDescriptor>),
    List(Vec<FileDescriptor>),
}

impl From<FileEntry> for FileDescriptor {
    fn from(entry: FileEntry) -> Self {
        FileDescriptor::File(entry)
    }
}

/// An owned [`Environment`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    method: String,
    target: String,
    protocol_version: Option<String>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    query_string: String,
    server_params: HashMap<String, String>,
    body: Body,
    parsed_body: Value,
    uploaded_files: BTreeMap<String, FileDescriptor>,
}

impl Snapshot {
    pub fn new<M: Into<String>, T: Into<String>>(method: M, target: T) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            protocol_version: None,
            headers: Vec::new(),
            cookies: Vec::new(),
            query_string: String::new(),
            server_params: HashMap::new(),
            body: Body::empty(),
            parsed_body: Value::Null,
            uploaded_files: BTreeMap::new(),
        }
    }

    pub fn with_protocol_version<S: Into<String>>(mut self, version: S) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    pub fn with_header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_cookie<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }

    pub fn with_query_string<S: Into<String>>(mut self, query_string: S) -> Self {
        self.query_string = query_string.into();
        self
    }

    pub fn with_server_param<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.server_params.insert(name.into(), value.into());
        self
    }

    pub fn with_body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_parsed_body(mut self, parsed_body: Value) -> Self {
        self.parsed_body = parsed_body;
        self
    }

    pub fn with_uploaded_file<N: Into<String>, D: Into<FileDescriptor>>(mut self, name: N, descriptor: D) -> Self {
        self.uploaded_files.insert(name.into(), descriptor.into());
        self
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new("GET", "/")
    }
}

impl Environment for Snapshot {
    fn method(&self) -> String {
        self.method.clone()
    }

    fn target(&self) -> String {
        self.target.clone()
    }

    fn protocol_version(&self) -> Option<String> {
        self.protocol_version.clone()
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }

    fn cookies(&self) -> Vec<(String, String)> {
        self.cookies.clone()
    }

    fn query_string(&self) -> String {
        self.query_string.clone()
    }

    fn server_params(&self) -> HashMap<String, String> {
        self.server_params.clone()
    }

    fn body(&self) -> Body {
        self.body.clone()
    }

    fn parsed_body(&self) -> Value {
        self.parsed_body.clone()
    }

    fn uploaded_files(&self) -> BTreeMap<String, FileDescriptor> {
        self.uploaded_files.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = Snapshot::new("POST", "/upload?x=1")
            .with_header("Host", "example.com")
            .with_header("Accept", "a")
            .with_header("Accept", "b")
            .with_cookie("session", "abc")
            .with_server_param("SERVER_PORT", "8080")
            .with_uploaded_file("avatar", FileEntry::new("/tmp/php123").size(10).client_filename("me.png"));

        assert_eq!(snapshot.method(), "POST");
        assert_eq!(snapshot.target(), "/upload?x=1");
        assert_eq!(snapshot.headers().len(), 3);
        assert_eq!(snapshot.cookies(), [("session".to_string(), "abc".to_string())]);
        assert_eq!(snapshot.server_params()["SERVER_PORT"], "8080");

        let Some(FileDescriptor::File(entry)) = snapshot.uploaded_files().remove("avatar") else {
            panic!("avatar should be a file entry");
        };
        assert_eq!(entry.size, Some(10));
        assert_eq!(entry.error, 0);
        assert_eq!(entry.client_filename.as_deref(), Some("me.png"));
    }

    #[test]
    fn test_snapshot_shares_body() {
        let snapshot = Snapshot::default();
        assert!(snapshot.body().ptr_eq(&snapshot.body()));
        assert_eq!(snapshot.parsed_body(), Value::Null);
        assert!(snapshot.protocol_version().is_none());
    }
}
