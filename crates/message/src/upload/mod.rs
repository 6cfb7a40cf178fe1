//! Uploaded files and their error codes.
//!
//! An [`UploadedFile`] wraps content received through a multipart upload together with the
//! metadata the client sent. [`UploadedFiles`] arranges them in the nested shape of the form
//! field names.

mod error_code;
mod tree;
mod uploaded_file;

pub use error_code::UploadError;
pub use tree::UploadedFiles;
pub use uploaded_file::{UploadSource, UploadedFile};
