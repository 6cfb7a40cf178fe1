//! Factories for micro-message values
//!
//! Components that need to create HTTP messages depend on the capability traits of this
//! crate instead of on concrete constructors:
//!
//! - [`UriFactory`], [`StreamFactory`], [`UploadedFileFactory`]
//! - [`RequestFactory`] (requires [`UriFactory`] and [`StreamFactory`])
//! - [`ResponseFactory`]
//! - [`ServerRequestFactory`], which can also build a request from an [`Environment`]
//!
//! [`Factory`] implements all of them and is configured through [`Factory::builder`].
//!
//! # Example
//!
//! ```
//! use micro_message::{HostPolicy, Message};
//! use micro_message_factory::{Factory, RequestFactory, ResponseFactory, StreamFactory};
//!
//! let factory = Factory::builder()
//!     .host_policy(HostPolicy::Preserve)
//!     .memory_limit(64 * 1024)
//!     .build()
//!     .unwrap();
//!
//! let request = factory.create_request("POST", "http://localhost:8080/echo").unwrap()
//!     .with_body(factory.create_stream(b"ping").unwrap());
//! assert_eq!(request.body().lock().read_all().unwrap(), "ping");
//!
//! let response = factory.create_response(201, None).unwrap();
//! assert_eq!(response.reason_phrase(), "Created");
//! ```

mod error;
mod factory;
mod traits;

pub mod environment;

pub use environment::{Environment, FileDescriptor, FileEntry, Snapshot};
pub use error::FactoryBuildError;
pub use factory::{Factory, FactoryBuilder, FactoryConfig};
pub use traits::{
    IntoUri, RequestFactory, ResponseFactory, ServerRequestFactory, StreamFactory, UploadedFileFactory, UriFactory,
};
