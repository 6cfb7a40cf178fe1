//! URI values per the [RFC 3986](https://www.rfc-editor.org/rfc/rfc3986) generic syntax.
//!
//! [`Uri::parse`] is strict: malformed percent-encoding, an invalid port or an illegal
//! character fails the whole parse. The `with_*` setters are lenient where they can be and
//! percent-encode what a component may not contain literally.

mod encode;
mod parser;
#[allow(clippy::module_inception, reason = "the module is named after its main type")]
mod uri;

pub use uri::Uri;
pub use uri::default_port;
