use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::ensure;
use crate::error::StreamError;
use crate::stream::{Capabilities, Handle};

/// Chunk size used when draining a stream to its end.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A cursor over a byte sequence with fixed capability flags.
///
/// The flags are probed from the backing [`Handle`] once, at construction, and never
/// change afterwards. [`detach`](Stream::detach) and [`close`](Stream::close) are terminal:
/// every later read, write or seek fails with [`StreamError::Detached`].
///
/// A stream carries mutable cursor state, so concurrent use of one instance needs external
/// mutual exclusion; messages share their body through [`Body`](super::Body) for that reason.
#[derive(Debug)]
pub struct Stream {
    handle: Option<Handle>,
    capabilities: Capabilities,
    eof: bool,
}

/// Descriptive data about an attached stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub mode: String,
    pub seekable: bool,
    pub path: Option<PathBuf>,
}

impl Stream {
    /// Builds a stream on top of an externally supplied handle.
    ///
    /// The handle must be readable; its other capabilities are mirrored as they are.
    pub fn from_handle(handle: Handle) -> Result<Self, StreamError> {
        let capabilities = handle.capabilities();
        ensure!(capabilities.readable, StreamError::invalid_source(format!("handle opened with mode {:?} is not readable", handle.mode().as_str())));
        Ok(Self { handle: Some(handle), capabilities, eof: false })
    }

    /// Builds a readable, writable and seekable stream holding `content`, with the cursor
    /// rewound to offset 0.
    ///
    /// The content is kept in memory up to `memory_limit` bytes and spills to an anonymous
    /// temporary file beyond that.
    pub fn temp(content: &[u8], memory_limit: usize) -> Result<Self, StreamError> {
        let mut handle = Handle::temp(memory_limit);
        handle.write_all(content)?;
        handle.rewind()?;
        Self::from_handle(handle)
    }

    /// An empty in-memory stream.
    pub fn empty() -> Self {
        let handle = Handle::memory(Vec::new());
        Self { capabilities: handle.capabilities(), handle: Some(handle), eof: false }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn is_readable(&self) -> bool {
        self.capabilities.readable
    }

    pub fn is_writable(&self) -> bool {
        self.capabilities.writable
    }

    pub fn is_seekable(&self) -> bool {
        self.capabilities.seekable
    }

    pub fn is_detached(&self) -> bool {
        self.handle.is_none()
    }

    fn handle(&mut self) -> Result<&mut Handle, StreamError> {
        self.handle.as_mut().ok_or(StreamError::Detached)
    }

    /// Reads up to `len` bytes from the current position.
    ///
    /// An empty result means the end of the stream has been reached.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, StreamError> {
        ensure!(self.handle.is_some(), StreamError::Detached);
        ensure!(self.capabilities.readable, StreamError::NotReadable);

        let mut buf = BytesMut::zeroed(len);
        let n = self.handle()?.read(&mut buf)?;
        if n == 0 && len > 0 {
            self.eof = true;
        }
        buf.truncate(n);
        Ok(buf.freeze())
    }

    /// Writes all of `bytes` at the current position and returns the number written.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, StreamError> {
        ensure!(self.handle.is_some(), StreamError::Detached);
        ensure!(self.capabilities.writable, StreamError::NotWritable);

        self.handle()?.write_all(bytes)?;
        Ok(bytes.len())
    }

    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        ensure!(self.handle.is_some(), StreamError::Detached);
        ensure!(self.capabilities.seekable, StreamError::NotSeekable);

        let position = self.handle()?.seek(pos)?;
        self.eof = false;
        Ok(position)
    }

    pub fn rewind_to_start(&mut self) -> Result<(), StreamError> {
        self.seek_to(SeekFrom::Start(0)).map(|_| ())
    }

    /// Returns the current cursor position.
    pub fn tell(&mut self) -> Result<u64, StreamError> {
        ensure!(self.capabilities.seekable || self.handle.is_none(), StreamError::NotSeekable);
        Ok(self.handle()?.stream_position()?)
    }

    /// Whether the cursor is at the end of the stream.
    ///
    /// Detached streams always report `true`. Non-seekable streams only know they are
    /// exhausted after a read came back empty.
    pub fn eof(&mut self) -> bool {
        if self.eof {
            return true;
        }
        let seekable = self.capabilities.seekable;
        let Some(handle) = self.handle.as_mut() else {
            return true;
        };
        if !seekable {
            return false;
        }
        match (handle.stream_position(), handle.size()) {
            (Ok(position), Ok(Some(size))) => position >= size,
            _ => false,
        }
    }

    /// Returns the total size in bytes, or `None` when it is unknown or the stream is detached.
    pub fn size(&mut self) -> Option<u64> {
        self.handle.as_mut().and_then(|handle| handle.size().ok().flatten())
    }

    /// Reads everything from the current position to the end.
    pub fn contents(&mut self) -> Result<Bytes, StreamError> {
        ensure!(self.handle.is_some(), StreamError::Detached);
        ensure!(self.capabilities.readable, StreamError::NotReadable);

        let mut buf = BytesMut::new();
        loop {
            let chunk = self.read_bytes(READ_CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Rewinds a seekable stream and reads it in full; for non-seekable streams this is the
    /// same as [`contents`](Stream::contents).
    pub fn read_all(&mut self) -> Result<Bytes, StreamError> {
        if self.capabilities.seekable {
            self.rewind_to_start()?;
        }
        self.contents()
    }

    /// Convenience over [`read_all`](Stream::read_all) that decodes the bytes lossily.
    pub fn read_to_string_lossy(&mut self) -> Result<String, StreamError> {
        self.read_all().map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn metadata(&self) -> Option<StreamMetadata> {
        self.handle.as_ref().map(|handle| StreamMetadata {
            mode: handle.mode().as_str().to_string(),
            seekable: self.capabilities.seekable,
            path: handle.path().map(ToOwned::to_owned),
        })
    }

    /// Releases the backing handle to the caller; the stream is unusable afterwards.
    pub fn detach(&mut self) -> Option<Handle> {
        let handle = self.handle.take();
        if handle.is_some() {
            debug!("stream detached");
        }
        handle
    }

    /// Releases the backing resources. Calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.flush() {
                debug!(cause = %e, "flush failed while closing stream");
            }
            debug!("stream closed");
        }
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ensure!(self.handle.is_some(), StreamError::Detached.into());
        ensure!(self.capabilities.readable, StreamError::NotReadable.into());
        let n = self.handle()?.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        Ok(n)
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ensure!(self.handle.is_some(), StreamError::Detached.into());
        ensure!(self.capabilities.writable, StreamError::NotWritable.into());
        Ok(self.handle()?.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.handle()?.flush()?)
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }
}

impl From<Bytes> for Stream {
    fn from(bytes: Bytes) -> Self {
        let handle = Handle::memory(bytes.to_vec());
        Self { capabilities: handle.capabilities(), handle: Some(handle), eof: false }
    }
}
