use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use mime::Mime;
use tracing::{debug, warn};

use crate::ensure;
use crate::error::{StreamError, UploadedFileError};
use crate::stream::{Body, Handle, Stream};
use crate::upload::UploadError;

/// Where the content of an uploaded file lives.
#[derive(Debug)]
pub enum UploadSource {
    /// Content already available as a stream.
    Stream(Stream),
    /// A file on disk, opened lazily when the stream is first requested.
    Path(PathBuf),
}

impl From<Stream> for UploadSource {
    fn from(stream: Stream) -> Self {
        UploadSource::Stream(stream)
    }
}

impl From<PathBuf> for UploadSource {
    fn from(path: PathBuf) -> Self {
        UploadSource::Path(path)
    }
}

impl From<&Path> for UploadSource {
    fn from(path: &Path) -> Self {
        UploadSource::Path(path.to_path_buf())
    }
}

#[derive(Debug)]
enum State {
    Stream(Body),
    Path { path: PathBuf, stream: Option<Body> },
    Moved,
}

/// A file received through an upload.
///
/// The client filename and media type are whatever the client sent and must not be trusted.
/// Moving the file is a one-shot transition: once [`move_to`](UploadedFile::move_to)
/// succeeded, neither the stream nor a second move is available.
#[derive(Debug)]
pub struct UploadedFile {
    state: Mutex<State>,
    size: Option<u64>,
    error: UploadError,
    client_filename: Option<String>,
    client_media_type: Option<String>,
}

impl UploadedFile {
    /// Creates an uploaded file.
    ///
    /// Without an explicit `size`, the source is measured; a source that cannot be measured
    /// leaves the size unknown. The stream of a successful upload must be readable.
    pub fn new(
        source: impl Into<UploadSource>,
        size: Option<u64>,
        error: UploadError,
        client_filename: Option<String>,
        client_media_type: Option<String>,
    ) -> Result<Self, UploadedFileError> {
        let (state, measured) = match source.into() {
            UploadSource::Stream(mut stream) => {
                if error.is_ok() {
                    ensure!(
                        !stream.is_detached() && stream.is_readable(),
                        StreamError::invalid_source("uploaded file stream is not readable").into()
                    );
                }
                let measured = if size.is_none() { stream.size() } else { None };
                (State::Stream(Body::new(stream)), measured)
            }
            UploadSource::Path(path) => {
                let measured = if size.is_none() { fs::metadata(&path).ok().map(|metadata| metadata.len()) } else { None };
                (State::Path { path, stream: None }, measured)
            }
        };

        Ok(Self { state: Mutex::new(state), size: size.or(measured), error, client_filename, client_media_type })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_active(&self, state: &State) -> Result<(), UploadedFileError> {
        ensure!(!matches!(state, State::Moved), UploadedFileError::AlreadyMoved);
        ensure!(self.error.is_ok(), UploadedFileError::UploadFailed { reason: self.error.message() });
        Ok(())
    }

    /// Returns the stream of the file, opening a path source on first use.
    pub fn stream(&self) -> Result<Body, UploadedFileError> {
        let mut state = self.state();
        self.ensure_active(&state)?;

        match &mut *state {
            State::Stream(body) => Ok(body.clone()),
            State::Path { path, stream } => {
                if let Some(body) = stream {
                    return Ok(body.clone());
                }
                let body = Body::new(Stream::from_handle(Handle::open(&*path, "rb")?)?);
                *stream = Some(body.clone());
                Ok(body)
            }
            State::Moved => Err(UploadedFileError::AlreadyMoved),
        }
    }

    /// Moves the file to `target`.
    ///
    /// A path source is renamed, falling back to copy-and-remove when a rename is not
    /// possible (e.g. across filesystems); a stream source is copied from its start and
    /// closed. Fails with an I/O error when `target` cannot be written, and is not retried.
    /// Fails with `StreamBusy` while a stream returned by [`stream`](Self::stream) is locked.
    pub fn move_to<P: AsRef<Path>>(&self, target: P) -> Result<(), UploadedFileError> {
        let target = target.as_ref();
        let mut state = self.state();
        self.ensure_active(&state)?;
        ensure!(!target.as_os_str().is_empty(), UploadedFileError::invalid_target("target path is empty"));

        match &mut *state {
            State::Stream(body) => copy_stream(body, target)?,
            State::Path { path, stream } => {
                {
                    let opened = stream.as_ref().map(lock_idle).transpose()?;
                    move_path(path, target)?;
                    if let Some(mut opened) = opened {
                        opened.close();
                    }
                }
                *stream = None;
            }
            State::Moved => return Err(UploadedFileError::AlreadyMoved),
        }

        *state = State::Moved;
        debug!(target = %target.display(), "uploaded file moved");
        Ok(())
    }

    pub fn is_moved(&self) -> bool {
        matches!(*self.state(), State::Moved)
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn error(&self) -> UploadError {
        self.error
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    /// Parses the client media type; `None` when absent or not a valid media type.
    pub fn client_media_type_mime(&self) -> Option<Mime> {
        self.client_media_type.as_deref().and_then(|media_type| media_type.parse().ok())
    }
}

fn lock_idle(body: &Body) -> Result<MutexGuard<'_, Stream>, UploadedFileError> {
    body.try_lock().ok_or(UploadedFileError::StreamBusy)
}

fn copy_stream(body: &Body, target: &Path) -> Result<(), UploadedFileError> {
    let mut stream = lock_idle(body)?;
    if stream.is_seekable() {
        stream.rewind_to_start()?;
    }
    let mut file = File::create(target)?;
    io::copy(&mut *stream, &mut file)?;
    file.sync_all()?;
    stream.close();
    Ok(())
}

fn move_path(source: &Path, target: &Path) -> Result<(), UploadedFileError> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(cause = %e, source = %source.display(), "rename of uploaded file failed, falling back to copy");
            fs::copy(source, target)?;
            if let Err(e) = fs::remove_file(source) {
                warn!(cause = %e, source = %source.display(), "failed to remove uploaded file after copy");
            }
            Ok(())
        }
    }
}
