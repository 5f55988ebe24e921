//! The binary form of an event stream.

use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;

use crate::errors::Result;
use crate::events::{Event, Recorder};
use crate::handler::ContentHandler;
use crate::interpreter::Replayer;
use crate::utils::write_byte_string;

/// The complete binary encoding of one document or fragment.
///
/// A blob is an immutable sequence of records, as produced by a
/// [`Compiler`]. It owns its bytes and is independent of the compiler that
/// produced it, so it can be stored, cached or sent elsewhere and replayed
/// any number of times.
///
/// ```
/// # use xml_event_codec::{Blob, Compiler, ContentHandler, Event};
/// let mut compiler = Compiler::new();
/// compiler.start_document().unwrap();
/// compiler.end_document().unwrap();
/// let blob: Blob = compiler.into_blob();
///
/// assert_eq!(blob.as_bytes(), &[1, 2]);
/// assert_eq!(blob.events().unwrap(), vec![Event::StartDocument, Event::EndDocument]);
/// ```
///
/// [`Compiler`]: crate::Compiler
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Blob(Vec<u8>);

impl Blob {
    /// Wraps bytes obtained elsewhere, for example read back from a cache.
    /// The bytes are not checked until they are replayed.
    #[inline]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the encoded bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the blob, returning the encoded bytes.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Replays the encoded events into `consumer`.
    ///
    /// Uses a fresh interpreter with the default configuration. To reuse the
    /// scratch storage of an interpreter across many blobs, use
    /// [`Interpreter::replay`] instead.
    ///
    /// [`Interpreter::replay`]: crate::Interpreter::replay
    pub fn replay<C>(&self, consumer: &mut C) -> std::result::Result<(), C::Error>
    where
        C: ContentHandler + ?Sized,
    {
        Replayer::default().replay(&self.0, consumer)
    }

    /// Decodes the blob into owned events.
    pub fn events(&self) -> Result<Vec<Event>> {
        let mut recorder = Recorder::new();
        self.replay(&mut recorder)?;
        Ok(recorder.into_events())
    }
}

impl Deref for Blob {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Blob {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Blob {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<Blob> for Vec<u8> {
    #[inline]
    fn from(blob: Blob) -> Self {
        blob.0
    }
}

impl Debug for Blob {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Blob(")?;
        write_byte_string(f, &self.0)?;
        write!(f, ")")
    }
}
