use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::stream::Stream;

/// A shared reference to the body [`Stream`] of a message.
///
/// Message mutators copy the message, so a message and its successor point at the same
/// stream until one of them replaces it with `with_body`. The mutex only serializes access
/// to the cursor; it does not make interleaved reads from two holders meaningful.
#[derive(Clone)]
pub struct Body {
    inner: Arc<Mutex<Stream>>,
}

impl Body {
    pub fn new(stream: Stream) -> Self {
        Self { inner: Arc::new(Mutex::new(stream)) }
    }

    pub fn empty() -> Self {
        Self::new(Stream::empty())
    }

    /// Locks the stream for exclusive use.
    pub fn lock(&self) -> MutexGuard<'_, Stream> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the stream unless another holder has it locked already.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Stream>> {
        match self.inner.try_lock() {
            Ok(stream) => Some(stream),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Returns `true` when both bodies refer to the same stream.
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Takes the stream back if this is the only reference to it.
    pub fn try_into_stream(self) -> Result<Stream, Body> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Body { inner }),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Stream> for Body {
    fn from(stream: Stream) -> Self {
        Self::new(stream)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(stream) => f.debug_tuple("Body").field(&*stream).finish(),
            Err(_) => f.debug_tuple("Body").field(&"<locked>").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_shared_until_unwrapped() {
        let body = Body::new(Stream::temp(b"shared", 64).unwrap());
        let copy = body.clone();
        assert!(body.ptr_eq(&copy));

        let body = body.try_into_stream().unwrap_err();
        drop(copy);

        let mut stream = body.try_into_stream().unwrap();
        assert_eq!(stream.contents().unwrap(), Bytes::from_static(b"shared"));
    }

    #[test]
    fn test_cursor_is_shared() {
        let body = Body::new(Stream::temp(b"abcd", 64).unwrap());
        let copy = body.clone();

        assert_eq!(body.lock().read_bytes(2).unwrap(), Bytes::from_static(b"ab"));
        assert_eq!(copy.lock().read_bytes(2).unwrap(), Bytes::from_static(b"cd"));
    }
}
