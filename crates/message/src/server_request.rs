//! Server-side view of an incoming request.
//!
//! A [`ServerRequest`] is a [`Request`] plus what a server learns about it: server
//! parameters fixed at construction, cookies, decoded query parameters, a parsed body,
//! the uploaded-file tree and request-scoped attributes. Like every [`Message`], it is
//! immutable; `with_*` methods return modified copies.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use http::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::ensure;
use crate::error::MessageError;
use crate::message::{Message, MessageHead};
use crate::request::{HostPolicy, Request};
use crate::upload::UploadedFiles;
use crate::uri::Uri;

pub type Params = HashMap<String, String>;

type Attribute = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ServerRequest {
    request: Request,
    server_params: Arc<Params>,
    cookie_params: Params,
    query_params: Params,
    parsed_body: Value,
    uploaded_files: BTreeMap<String, UploadedFiles>,
    attributes: HashMap<String, Attribute>,
}

impl ServerRequest {
    /// Creates a server request; everything besides the server parameters starts empty.
    pub fn new(method: &str, uri: Uri, server_params: Params) -> Result<Self, MessageError> {
        Ok(Self::from_request(Request::new(method, uri)?, server_params))
    }

    pub fn from_request(request: Request, server_params: Params) -> Self {
        Self {
            request,
            server_params: Arc::new(server_params),
            cookie_params: Params::new(),
            query_params: Params::new(),
            parsed_body: Value::Null,
            uploaded_files: BTreeMap::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn as_request(&self) -> &Request {
        &self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    fn map_request(&self, f: impl FnOnce(&Request) -> Request) -> Self {
        Self { request: f(&self.request), ..self.clone() }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn with_method(&self, method: &str) -> Result<Self, MessageError> {
        let request = self.request.with_method(method)?;
        Ok(Self { request, ..self.clone() })
    }

    pub fn request_target(&self) -> String {
        self.request.request_target()
    }

    pub fn with_request_target(&self, target: &str) -> Result<Self, MessageError> {
        let request = self.request.with_request_target(target)?;
        Ok(Self { request, ..self.clone() })
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    #[must_use]
    pub fn with_uri(&self, uri: Uri) -> Self {
        self.map_request(|request| request.with_uri(uri))
    }

    pub fn host_policy(&self) -> HostPolicy {
        self.request.host_policy()
    }

    #[must_use]
    pub fn with_host_policy(&self, host_policy: HostPolicy) -> Self {
        self.map_request(|request| request.with_host_policy(host_policy))
    }

    /// Server parameters are fixed at construction and have no mutator.
    pub fn server_params(&self) -> &Params {
        &self.server_params
    }

    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params.get(name).map(String::as_str)
    }

    pub fn cookie_params(&self) -> &Params {
        &self.cookie_params
    }

    #[must_use]
    pub fn with_cookie_params(&self, cookie_params: Params) -> Self {
        Self { cookie_params, ..self.clone() }
    }

    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    #[must_use]
    pub fn with_query_params(&self, query_params: Params) -> Self {
        Self { query_params, ..self.clone() }
    }

    /// Decodes the query string of the URI into `T`; nested keys follow the `serde_qs` conventions.
    ///
    /// A URI without a query decodes like an empty query string.
    pub fn query<T>(&self) -> Result<T, MessageError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let query = self.uri().query().unwrap_or_default();
        serde_qs::from_str::<T>(query).map_err(|e| MessageError::invalid_query(e.to_string()))
    }

    /// The deserialized body; [`Value::Null`] when there is none.
    pub fn parsed_body(&self) -> &Value {
        &self.parsed_body
    }

    /// Replaces the parsed body, which must be null, an array or an object.
    pub fn with_parsed_body(&self, parsed_body: Value) -> Result<Self, MessageError> {
        ensure!(
            matches!(parsed_body, Value::Null | Value::Array(_) | Value::Object(_)),
            MessageError::invalid_parsed_body("parsed body must be null, an array or an object")
        );
        Ok(Self { parsed_body, ..self.clone() })
    }

    pub fn uploaded_files(&self) -> &BTreeMap<String, UploadedFiles> {
        &self.uploaded_files
    }

    #[must_use]
    pub fn with_uploaded_files(&self, uploaded_files: BTreeMap<String, UploadedFiles>) -> Self {
        Self { uploaded_files, ..self.clone() }
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &(dyn Any + Send + Sync))> {
        self.attributes.iter().map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Returns the attribute `name` when it is present and of type `T`.
    pub fn attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.attributes.get(name).and_then(|value| value.downcast_ref::<T>())
    }

    #[must_use]
    pub fn with_attribute<T: Any + Send + Sync>(&self, name: &str, value: T) -> Self {
        let mut next = self.clone();
        next.attributes.insert(name.to_string(), Arc::new(value));
        next
    }

    #[must_use]
    pub fn without_attribute(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.attributes.remove(name);
        next
    }
}

impl Message for ServerRequest {
    fn head(&self) -> &MessageHead {
        self.request.head()
    }

    fn head_mut(&mut self) -> &mut MessageHead {
        self.request.head_mut()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn server_request(uri: &str) -> ServerRequest {
        let params = Params::from([("SERVER_NAME".to_string(), "example.com".to_string())]);
        ServerRequest::new("GET", Uri::parse(uri).unwrap(), params).unwrap()
    }

    #[test]
    fn test_starts_empty() {
        let request = ServerRequest::new("GET", Uri::parse("/").unwrap(), Params::new()).unwrap();
        assert!(request.cookie_params().is_empty());
        assert!(request.query_params().is_empty());
        assert!(request.uploaded_files().is_empty());
        assert_eq!(request.attributes().count(), 0);
        assert_eq!(request.parsed_body(), &Value::Null);
    }

    #[test]
    fn test_server_params_survive_copies() {
        let request = server_request("/");
        let copy = request.with_header("X", ["1"]).unwrap().with_cookie_params(Params::new());
        assert_eq!(copy.server_param("SERVER_NAME"), Some("example.com"));
        assert!(Arc::ptr_eq(&request.server_params, &copy.server_params));
    }

    #[test]
    fn test_attributes() {
        let request = server_request("/");
        let with = request.with_attribute("user_id", 42_u64);

        assert_eq!(with.attribute::<u64>("user_id"), Some(&42));
        assert_eq!(with.attribute::<String>("user_id"), None);
        assert_eq!(request.attribute::<u64>("user_id"), None);

        let without = with.without_attribute("user_id");
        assert_eq!(without.attribute::<u64>("user_id"), None);
        assert_eq!(with.attribute::<u64>("user_id"), Some(&42));
    }

    #[test]
    fn test_parsed_body() {
        let request = server_request("/");
        let with = request.with_parsed_body(json!({"name": "micro"})).unwrap();
        assert_eq!(with.parsed_body()["name"], "micro");
        assert_eq!(request.parsed_body(), &Value::Null);

        assert!(with.with_parsed_body(json!([1, 2])).is_ok());
        assert!(with.with_parsed_body(Value::Null).is_ok());

        let err = with.with_parsed_body(json!("scalar")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(with.with_parsed_body(json!(1)).is_err());
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Filter {
        page: u32,
        sort: Option<String>,
    }

    #[test]
    fn test_typed_query() {
        let request = server_request("/list?page=2&sort=name");
        let filter: Filter = request.query().unwrap();
        assert_eq!(filter, Filter { page: 2, sort: Some("name".to_string()) });

        let err = server_request("/list?page=x").query::<Filter>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_request_delegation() {
        let request = server_request("http://example.com/a").with_attribute("k", "v".to_string());
        let moved = request.with_uri(Uri::parse("http://other.example.com/b").unwrap());

        assert_eq!(moved.uri().path(), "/b");
        assert_eq!(moved.header("host"), ["other.example.com"]);
        assert_eq!(moved.attribute::<String>("k").map(String::as_str), Some("v"));
        assert_eq!(moved.with_method("POST").unwrap().method(), &Method::POST);
        assert_eq!(moved.as_request().uri().path(), "/b");
    }
}
