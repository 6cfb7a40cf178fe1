//! Backing resources of a [`Stream`](super::Stream).
//!
//! A [`Handle`] is what a stream reads from and writes to. Its capabilities are a property
//! of the resource itself: a file opened with mode `"r"` is never writable, an arbitrary
//! reader is never seekable, and so on. [`Stream`](super::Stream) probes them once when it
//! takes ownership of the handle and hands the handle back on detach.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::SpooledTempFile;

use crate::ensure;
use crate::error::StreamError;

/// The fixed capability set of a stream or handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub readable: bool,
    pub writable: bool,
    pub seekable: bool,
}

/// An fopen-style access mode such as `"r"`, `"w+"` or `"a+b"`.
///
/// The leading character selects the base access (`r`, `w`, `a`, `x`, `c`), a `+` adds the
/// complementary access, and `b`/`t` flags are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    raw: String,
    base: u8,
    plus: bool,
}

impl Mode {
    pub fn parse(mode: &str) -> Result<Self, StreamError> {
        let bytes = mode.as_bytes();
        let Some((&base, flags)) = bytes.split_first() else {
            return Err(StreamError::invalid_source("empty stream mode"));
        };
        ensure!(
            matches!(base, b'r' | b'w' | b'a' | b'x' | b'c'),
            StreamError::invalid_source(format!("unknown stream mode {mode:?}"))
        );

        let mut plus = false;
        for flag in flags {
            match flag {
                b'+' if !plus => plus = true,
                b'b' | b't' => {}
                _ => return Err(StreamError::invalid_source(format!("unknown stream mode {mode:?}"))),
            }
        }

        Ok(Self { raw: mode.to_string(), base, plus })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_readable(&self) -> bool {
        self.base == b'r' || self.plus
    }

    pub fn is_writable(&self) -> bool {
        self.base != b'r' || self.plus
    }

    /// Translates the mode into the equivalent [`OpenOptions`].
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.is_readable());
        match self.base {
            b'r' => {
                options.write(self.plus);
            }
            b'w' => {
                options.write(true).create(true).truncate(true);
            }
            b'a' => {
                options.append(true).create(true);
            }
            b'x' => {
                options.write(true).create_new(true);
            }
            _ => {
                options.write(true).create(true);
            }
        }
        options
    }
}

/// An owned resource that a [`Stream`](super::Stream) can be built on.
pub struct Handle {
    kind: Kind,
    mode: Mode,
    path: Option<PathBuf>,
}

enum Kind {
    File(File),
    Temp(SpooledTempFile),
    Memory(Cursor<Vec<u8>>),
    Reader(Box<dyn Read + Send>),
    Writer(Box<dyn Write + Send>),
}

impl Handle {
    /// Opens the file at `path` with an fopen-style `mode`.
    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self, StreamError> {
        let mode = Mode::parse(mode)?;
        let path = path.as_ref();
        let file = mode.open_options().open(path)?;
        Ok(Self { kind: Kind::File(file), mode, path: Some(path.to_path_buf()) })
    }

    /// Wraps an already opened file.
    ///
    /// Read and write access are taken from `mode`, which must describe how the file was
    /// opened; the platform offers no portable way to query them. Seekability is probed
    /// from the file itself, so a pipe or FIFO is never seekable.
    pub fn from_file(file: File, mode: &str) -> Result<Self, StreamError> {
        Ok(Self { kind: Kind::File(file), mode: Mode::parse(mode)?, path: None })
    }

    /// Temporary storage that lives in memory until it grows beyond `memory_limit` bytes,
    /// then spills to an anonymous file that is removed when the handle is dropped.
    pub fn temp(memory_limit: usize) -> Self {
        Self { kind: Kind::Temp(SpooledTempFile::new(memory_limit)), mode: mode("w+b"), path: None }
    }

    /// Purely in-memory storage.
    pub fn memory(content: Vec<u8>) -> Self {
        Self { kind: Kind::Memory(Cursor::new(content)), mode: mode("w+b"), path: None }
    }

    /// A read-only, non-seekable source of unknown size, such as a pipe or a socket half.
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self { kind: Kind::Reader(Box::new(reader)), mode: mode("r"), path: None }
    }

    /// A write-only, non-seekable sink.
    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self { kind: Kind::Writer(Box::new(writer)), mode: mode("w"), path: None }
    }

    pub fn capabilities(&self) -> Capabilities {
        let seekable = match &self.kind {
            Kind::File(file) => {
                let mut file: &File = file;
                file.stream_position().is_ok()
            }
            Kind::Temp(_) | Kind::Memory(_) => true,
            Kind::Reader(_) | Kind::Writer(_) => false,
        };
        Capabilities { readable: self.mode.is_readable(), writable: self.mode.is_writable(), seekable }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// The filesystem path this handle was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the total size of the resource, when it can be measured.
    pub fn size(&mut self) -> io::Result<Option<u64>> {
        match &mut self.kind {
            Kind::File(file) => file.metadata().map(|metadata| Some(metadata.len())),
            Kind::Memory(cursor) => Ok(Some(cursor.get_ref().len() as u64)),
            Kind::Temp(temp) => {
                let position = temp.stream_position()?;
                let end = temp.seek(SeekFrom::End(0))?;
                temp.seek(SeekFrom::Start(position))?;
                Ok(Some(end))
            }
            Kind::Reader(_) | Kind::Writer(_) => Ok(None),
        }
    }

    /// Consumes an in-memory handle and returns its bytes.
    pub fn into_memory(self) -> Option<Vec<u8>> {
        match self.kind {
            Kind::Memory(cursor) => Some(cursor.into_inner()),
            _ => None,
        }
    }

    /// Consumes a file handle and returns the file.
    pub fn into_file(self) -> Option<File> {
        match self.kind {
            Kind::File(file) => Some(file),
            _ => None,
        }
    }
}

fn mode(raw: &'static str) -> Mode {
    let bytes = raw.as_bytes();
    Mode { raw: raw.to_string(), base: bytes[0], plus: bytes.contains(&b'+') }
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("handle does not support {what}"))
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.mode.is_readable() {
            return Err(unsupported("reading"));
        }
        match &mut self.kind {
            Kind::File(file) => file.read(buf),
            Kind::Temp(temp) => temp.read(buf),
            Kind::Memory(cursor) => cursor.read(buf),
            Kind::Reader(reader) => reader.read(buf),
            Kind::Writer(_) => Err(unsupported("reading")),
        }
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.mode.is_writable() {
            return Err(unsupported("writing"));
        }
        match &mut self.kind {
            Kind::File(file) => file.write(buf),
            Kind::Temp(temp) => temp.write(buf),
            Kind::Memory(cursor) => cursor.write(buf),
            Kind::Writer(writer) => writer.write(buf),
            Kind::Reader(_) => Err(unsupported("writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::File(file) => file.flush(),
            Kind::Temp(temp) => temp.flush(),
            Kind::Writer(writer) => writer.flush(),
            Kind::Memory(_) | Kind::Reader(_) => Ok(()),
        }
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.kind {
            Kind::File(file) => file.seek(pos),
            Kind::Temp(temp) => temp.seek(pos),
            Kind::Memory(cursor) => cursor.seek(pos),
            Kind::Reader(_) | Kind::Writer(_) => Err(unsupported("seeking")),
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::File(_) => "file",
            Kind::Temp(_) => "temp",
            Kind::Memory(_) => "memory",
            Kind::Reader(_) => "reader",
            Kind::Writer(_) => "writer",
        };
        f.debug_struct("Handle").field("kind", &kind).field("mode", &self.mode.as_str()).field("path", &self.path).finish()
    }
}
