//! Byte streams with explicit capability flags.
//!
//! - [`Stream`]: the cursor over a byte sequence, readable/writable/seekable as its backing allows
//! - [`Handle`]: the owned backing resource (file, spooled temp storage, memory, reader, writer)
//! - [`Body`]: the shared reference through which messages hold their stream
//!
//! Mutability of the whole message model is confined to streams. A stream moves through a
//! small state machine: it is open with a fixed capability set from construction until it is
//! detached or closed, both of which are terminal.

mod body;
mod handle;
#[allow(clippy::module_inception, reason = "the module is named after its main type")]
mod stream;

pub use body::Body;
pub use handle::Capabilities;
pub use handle::Handle;
pub use handle::Mode;
pub use stream::Stream;
pub use stream::StreamMetadata;

/// Default amount of bytes a temp-backed stream keeps in memory before spilling to disk.
pub const DEFAULT_MEMORY_LIMIT: usize = 2 * 1024 * 1024;
