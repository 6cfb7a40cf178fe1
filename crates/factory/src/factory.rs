use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use micro_message::error::{MessageError, StreamError, UploadedFileError, UriError};
use micro_message::message::MessageHead;
use micro_message::server_request::Params;
use micro_message::stream::{Body, DEFAULT_MEMORY_LIMIT, Handle, Stream};
use micro_message::upload::{UploadError, UploadedFile, UploadedFiles};
use micro_message::{HostPolicy, Message, ProtocolVersion, Request, Response, ServerRequest, Uri};
use tracing::{trace, warn};

use crate::environment::{Environment, FileDescriptor};
use crate::error::FactoryBuildError;
use crate::traits::{
    IntoUri, RequestFactory, ResponseFactory, ServerRequestFactory, StreamFactory, UploadedFileFactory, UriFactory,
};

/// Settings shared by every value a [`Factory`] creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    pub host_policy: HostPolicy,
    pub protocol_version: ProtocolVersion,
    /// Bytes a temp-backed stream keeps in memory before spilling to a temporary file.
    pub memory_limit: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            host_policy: HostPolicy::default(),
            protocol_version: ProtocolVersion::default(),
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }
}

#[derive(Debug)]
pub struct FactoryBuilder {
    host_policy: HostPolicy,
    protocol_version: Option<String>,
    memory_limit: usize,
}

impl FactoryBuilder {
    fn new() -> Self {
        Self { host_policy: HostPolicy::default(), protocol_version: None, memory_limit: DEFAULT_MEMORY_LIMIT }
    }

    pub fn host_policy(mut self, host_policy: HostPolicy) -> Self {
        self.host_policy = host_policy;
        self
    }

    /// The protocol version of created messages, `1.1` unless set.
    pub fn protocol_version(mut self, version: &str) -> Self {
        self.protocol_version = Some(version.to_string());
        self
    }

    pub fn memory_limit(mut self, memory_limit: usize) -> Self {
        self.memory_limit = memory_limit;
        self
    }

    pub fn build(self) -> Result<Factory, FactoryBuildError> {
        let protocol_version = match self.protocol_version {
            Some(version) => ProtocolVersion::parse(&version)?,
            None => ProtocolVersion::default(),
        };
        let config = FactoryConfig { host_policy: self.host_policy, protocol_version, memory_limit: self.memory_limit };
        trace!(?config, "factory built");
        Ok(Factory { config })
    }
}

/// Creates every kind of message value.
///
/// A factory only holds its immutable [`FactoryConfig`]; calls share no mutable state, so a
/// factory can be cloned freely or shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Factory {
    config: FactoryConfig,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::new()
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    fn head(&self) -> Result<MessageHead, StreamError> {
        Ok(MessageHead::new(self.config.protocol_version.clone(), Body::new(self.create_stream(b"")?)))
    }
}

impl UriFactory for Factory {
    fn create_uri(&self, uri: &str) -> Result<Uri, UriError> {
        Uri::parse(uri)
    }
}

impl StreamFactory for Factory {
    fn create_stream(&self, content: &[u8]) -> Result<Stream, StreamError> {
        Stream::temp(content, self.config.memory_limit)
    }

    fn create_stream_from_file(&self, path: &Path, mode: &str) -> Result<Stream, StreamError> {
        trace!(path = %path.display(), mode, "open stream from file");
        Stream::from_handle(Handle::open(path, mode)?)
    }

    fn create_stream_from_handle(&self, handle: Handle) -> Result<Stream, StreamError> {
        Stream::from_handle(handle)
    }
}

impl UploadedFileFactory for Factory {
    fn create_uploaded_file(
        &self,
        stream: Stream,
        size: Option<u64>,
        error: UploadError,
        client_filename: Option<&str>,
        client_media_type: Option<&str>,
    ) -> Result<UploadedFile, UploadedFileError> {
        UploadedFile::new(
            stream,
            size,
            error,
            client_filename.map(ToString::to_string),
            client_media_type.map(ToString::to_string),
        )
    }
}

impl RequestFactory for Factory {
    fn create_request<U: IntoUri>(&self, method: &str, uri: U) -> Result<Request, MessageError> {
        let uri = uri.into_uri()?;
        trace!(method, %uri, "create request");
        let request = Request::with_head(method, uri, self.head()?)?;
        Ok(request.with_host_policy(self.config.host_policy))
    }
}

impl ResponseFactory for Factory {
    fn create_response(&self, code: u16, reason_phrase: Option<&str>) -> Result<Response, MessageError> {
        trace!(code, reason_phrase, "create response");
        Response::with_head(code, reason_phrase, self.head()?)
    }
}

impl ServerRequestFactory for Factory {
    fn create_server_request<U: IntoUri>(
        &self,
        method: &str,
        uri: U,
        server_params: Params,
    ) -> Result<ServerRequest, MessageError> {
        let request = self.create_request(method, uri)?;
        Ok(ServerRequest::from_request(request, server_params))
    }

    fn create_server_request_from_globals<E: Environment + ?Sized>(
        &self,
        environment: &E,
    ) -> Result<ServerRequest, MessageError> {
        let target = environment.target();
        let headers = environment.headers();
        let server_params = environment.server_params();

        let origin = Uri::parse(&target)?;
        let keep_target = !target.is_empty() && target != origin.path_and_query();
        let uri = with_server_authority(origin, &headers, &server_params)?;

        let version = environment.protocol_version().or_else(|| {
            let protocol = server_params.get("SERVER_PROTOCOL")?;
            protocol.strip_prefix("HTTP/").map(ToString::to_string)
        });

        let mut request = self.create_server_request(&environment.method(), uri, server_params)?;
        if keep_target {
            request = request.with_request_target(&target)?;
        }
        if let Some(version) = version {
            request = request.with_protocol_version(&version)?;
        }
        for (name, value) in &headers {
            request = request.with_added_header(name, [value])?;
        }

        let query_string = environment.query_string();
        let query_string = match query_string.as_str() {
            "" => request.uri().query().unwrap_or_default(),
            query_string => query_string,
        };
        let query_params = serde_urlencoded::from_str::<Vec<(String, String)>>(query_string)
            .map_err(|e| MessageError::invalid_query(e.to_string()))?;

        let uploaded_files = environment
            .uploaded_files()
            .into_iter()
            .map(|(name, descriptor)| Ok((name, uploaded_files_from(descriptor)?)))
            .collect::<Result<BTreeMap<_, _>, MessageError>>()?;

        let request = request
            .with_cookie_params(environment.cookies().into_iter().collect::<HashMap<_, _>>())
            .with_query_params(query_params.into_iter().collect::<HashMap<_, _>>())
            .with_uploaded_files(uploaded_files)
            .with_body(environment.body())
            .with_parsed_body(environment.parsed_body())?;

        trace!(method = %request.method(), uri = %request.uri(), "server request created from environment");
        Ok(request)
    }
}

/// Completes an origin-form target with scheme and authority from the `Host` header, or
/// from `SERVER_NAME`/`SERVER_PORT` when there is none.
fn with_server_authority(uri: Uri, headers: &[(String, String)], server_params: &Params) -> Result<Uri, UriError> {
    if uri.host().is_some() {
        return Ok(uri);
    }

    let authority = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("host"))
        .map(|(_, value)| value.clone())
        .or_else(|| {
            let name = server_params.get("SERVER_NAME")?;
            Some(match server_params.get("SERVER_PORT") {
                Some(port) => format!("{name}:{port}"),
                None => name.clone(),
            })
        });
    let Some(authority) = authority.filter(|authority| !authority.is_empty()) else {
        return Ok(uri);
    };

    let https = server_params.get("HTTPS").is_some_and(|https| !https.is_empty() && !https.eq_ignore_ascii_case("off"));
    let scheme = if https { "https" } else { "http" };

    match Uri::parse(&format!("{scheme}://{authority}")) {
        Ok(base) => {
            let uri = uri.with_scheme(scheme)?.with_host(base.host().unwrap_or_default())?;
            uri.with_port(base.port())
        }
        Err(e) => {
            warn!(authority = %authority, cause = %e, "ignoring malformed server authority");
            Ok(uri)
        }
    }
}

fn uploaded_files_from(descriptor: FileDescriptor) -> Result<UploadedFiles, MessageError> {
    match descriptor {
        FileDescriptor::File(entry) => {
            let error = UploadError::try_from(entry.error)?;
            let file = UploadedFile::new(entry.path, entry.size, error, entry.client_filename, entry.client_media_type)?;
            Ok(UploadedFiles::file(file))
        }
        FileDescriptor::Map(map) => map
            .into_iter()
            .map(|(name, descriptor)| Ok((name, uploaded_files_from(descriptor)?)))
            .collect::<Result<BTreeMap<_, _>, MessageError>>()
            .map(UploadedFiles::Map),
        FileDescriptor::List(list) => {
            list.into_iter().map(uploaded_files_from).collect::<Result<Vec<_>, _>>().map(UploadedFiles::List)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{FileEntry, MockEnvironment};
    use micro_message::error::ErrorKind;
    use serde_json::{Value, json};

    fn mock_environment(target: &'static str, headers: Vec<(String, String)>, server_params: Params) -> MockEnvironment {
        let mut environment = MockEnvironment::new();
        environment.expect_method().return_const("POST".to_string());
        environment.expect_target().return_const(target.to_string());
        environment.expect_protocol_version().return_const(None::<String>);
        environment.expect_headers().return_const(headers);
        environment.expect_cookies().return_const(vec![("session".to_string(), "s1".to_string())]);
        environment.expect_query_string().return_const(String::new());
        environment.expect_server_params().return_const(server_params);
        environment.expect_body().returning(|| Body::new(Stream::temp(b"name=micro", 64).unwrap()));
        environment.expect_parsed_body().returning(|| json!({"name": "micro"}));
        environment.expect_uploaded_files().returning(BTreeMap::new);
        environment
    }

    #[test]
    fn test_builder_defaults() {
        let factory = Factory::builder().build().unwrap();
        assert_eq!(factory.config(), &FactoryConfig::default());
        assert_eq!(factory.config().memory_limit, DEFAULT_MEMORY_LIMIT);
        assert_eq!(factory.config().host_policy, HostPolicy::Overwrite);
    }

    #[test]
    fn test_builder_rejects_bad_version() {
        assert!(Factory::builder().protocol_version("one").build().is_err());

        let factory = Factory::builder().protocol_version("2").build().unwrap();
        let request = factory.create_request("GET", "/").unwrap();
        assert_eq!(request.protocol_version().as_str(), "2");
    }

    #[test]
    fn test_host_policy_is_stamped() {
        let factory = Factory::builder().host_policy(HostPolicy::Preserve).build().unwrap();
        let request = factory.create_request("GET", "/").unwrap().with_header("Host", ["kept.example.com"]).unwrap();

        let moved = request.with_uri(Uri::parse("http://other.example.com/").unwrap());
        assert_eq!(moved.header("host"), ["kept.example.com"]);
    }

    #[test]
    fn test_empty_body_is_writable() {
        let request = Factory::new().create_request("GET", "/").unwrap();
        let mut body = request.body().lock();
        assert!(body.is_writable());
        assert_eq!(body.size(), Some(0));
    }

    #[test]
    fn test_globals_from_mock() {
        let headers = vec![("Host".to_string(), "example.com:8080".to_string())];
        let environment = mock_environment("/submit?debug=1", headers, Params::new());

        let request = Factory::new().create_server_request_from_globals(&environment).unwrap();
        assert_eq!(request.method().as_str(), "POST");
        assert_eq!(request.uri().to_string(), "http://example.com:8080/submit?debug=1");
        assert_eq!(request.request_target(), "/submit?debug=1");
        assert_eq!(request.query_params()["debug"], "1");
        assert_eq!(request.cookie_params()["session"], "s1");
        assert_eq!(request.parsed_body()["name"], "micro");
        assert_eq!(request.body().lock().read_all().unwrap(), "name=micro");
    }

    #[test]
    fn test_globals_server_name() {
        let params = Params::from([
            ("HTTPS".to_string(), "on".to_string()),
            ("SERVER_NAME".to_string(), "secure.example.com".to_string()),
            ("SERVER_PORT".to_string(), "443".to_string()),
            ("SERVER_PROTOCOL".to_string(), "HTTP/1.0".to_string()),
        ]);
        let environment = mock_environment("/", Vec::new(), params);

        let request = Factory::new().create_server_request_from_globals(&environment).unwrap();
        assert_eq!(request.uri().to_string(), "https://secure.example.com/");
        assert_eq!(request.uri().port(), None);
        assert_eq!(request.protocol_version().as_str(), "1.0");
        assert_eq!(request.server_param("SERVER_NAME"), Some("secure.example.com"));
        assert!(!request.has_header("host"));
    }

    #[test]
    fn test_globals_rejects_scalar_body() {
        let mut environment = MockEnvironment::new();
        environment.expect_method().return_const("GET".to_string());
        environment.expect_target().return_const("/".to_string());
        environment.expect_protocol_version().return_const(None::<String>);
        environment.expect_headers().return_const(Vec::new());
        environment.expect_cookies().return_const(Vec::new());
        environment.expect_query_string().return_const(String::new());
        environment.expect_server_params().return_const(Params::new());
        environment.expect_body().returning(Body::empty);
        environment.expect_parsed_body().returning(|| Value::from(3));
        environment.expect_uploaded_files().returning(BTreeMap::new);

        let err = Factory::new().create_server_request_from_globals(&environment).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_uploaded_files_from_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        std::fs::write(&first, b"one").unwrap();

        let descriptor = FileDescriptor::Map(BTreeMap::from([(
            "photos".to_string(),
            FileDescriptor::List(vec![
                FileEntry::new(&first).client_filename("a.png").into(),
                FileEntry::new("").error(4).into(),
            ]),
        )]));

        let tree = uploaded_files_from(descriptor).unwrap();
        let files = tree.files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].size(), Some(3));
        assert_eq!(files[0].client_filename(), Some("a.png"));
        assert_eq!(files[1].error(), UploadError::NoFile);

        let err = uploaded_files_from(FileEntry::new("").error(5).into()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
