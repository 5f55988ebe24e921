//! Error management module

use std::collections::TryReserveError;
use std::fmt;
use std::io;
use std::str::Utf8Error;
use std::sync::Arc;

use crate::opcode::Opcode;

/// An error produced while reading a binary event stream.
///
/// Every variant carries the byte offset in the stream at which the problem
/// was detected. Decoding stops at the first error; the record that contains
/// it is never delivered to the consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// A byte at an opcode position does not name any known event.
    UnknownOpcode {
        /// The offending byte
        opcode: u8,
        /// Offset of the offending byte
        offset: usize,
    },
    /// A field needs more bytes than remain in the stream.
    Truncated {
        /// Offset at which the field starts
        offset: usize,
        /// Number of bytes the field needs
        needed: usize,
        /// Number of bytes that remain
        available: usize,
    },
    /// A variable-length integer has more than 10 bytes or does not fit into `u64`.
    VarintOverflow {
        /// Offset of the first byte of the integer
        offset: usize,
    },
    /// A declared length does not fit into the platform `usize` or exceeds
    /// the maximum length of a single field.
    LengthOverflow {
        /// Offset of the length prefix
        offset: usize,
        /// The declared length
        length: u64,
    },
    /// A string field is not valid UTF-8.
    Utf8 {
        /// Offset of the first byte of the string
        offset: usize,
        /// The underlying conversion error
        error: Utf8Error,
    },
    /// A field that must always be present (a name, a value or a text run)
    /// is encoded as absent.
    UnexpectedAbsent {
        /// Offset of the length prefix
        offset: usize,
    },
}

impl DecodeError {
    /// Returns the byte offset in the stream where the error was detected.
    pub fn offset(&self) -> usize {
        match *self {
            DecodeError::UnknownOpcode { offset, .. }
            | DecodeError::Truncated { offset, .. }
            | DecodeError::VarintOverflow { offset }
            | DecodeError::LengthOverflow { offset, .. }
            | DecodeError::Utf8 { offset, .. }
            | DecodeError::UnexpectedAbsent { offset } => offset,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode {:#04x} at position {}", opcode, offset)
            }
            DecodeError::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated record at position {}: field needs {} bytes, but only {} remain",
                offset, needed, available
            ),
            DecodeError::VarintOverflow { offset } => {
                write!(f, "variable-length integer at position {} overflows", offset)
            }
            DecodeError::LengthOverflow { offset, length } => write!(
                f,
                "length {} declared at position {} is too large",
                length, offset
            ),
            DecodeError::Utf8 { offset, error } => {
                write!(f, "invalid UTF-8 string at position {}: {}", offset, error)
            }
            DecodeError::UnexpectedAbsent { offset } => write!(
                f,
                "required string at position {} is encoded as absent",
                offset
            ),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Utf8 { error, .. } => Some(error),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// An event that could not be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// A buffer could not grow.
    Reserve(TryReserveError),
    /// A string or text field is longer than the format can carry.
    FieldTooLong {
        /// Length of the field in bytes
        length: usize,
        /// Maximum length of a field in bytes
        max: usize,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::Reserve(e) => write!(f, "cannot grow buffer: {}", e),
            EncodeError::FieldTooLong { length, max } => write!(
                f,
                "field of {} bytes exceeds the maximum of {} bytes",
                length, max
            ),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Reserve(e) => Some(e),
            EncodeError::FieldTooLong { .. } => None,
        }
    }
}

impl From<TryReserveError> for EncodeError {
    #[inline]
    fn from(error: TryReserveError) -> EncodeError {
        EncodeError::Reserve(error)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A violation of the document grammar detected by the well-formedness checker.
///
/// Reported only when [`Config::check_well_formed`] is enabled.
///
/// [`Config::check_well_formed`]: crate::Config::check_well_formed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IllFormedError {
    /// A second `StartDocument` was seen.
    DuplicatedStartDocument,
    /// An event was seen after `EndDocument`.
    EventAfterEndDocument(Opcode),
    /// `EndDocument` was seen while elements were still open.
    EndDocumentWithOpenElements(usize),
    /// `EndDocument` was seen inside a CDATA section, a DTD or an entity
    /// expansion. Holds the number of such open constructs.
    EndDocumentWithOpenLexical(usize),
    /// `EndDocument` without a preceding `StartDocument`.
    UnmatchedEndDocument,
    /// `EndElement` without an open element.
    UnmatchedEndElement(String),
    /// `EndElement` does not close the innermost open element.
    MismatchedEndElement {
        /// Qualified name of the innermost open element
        expected: String,
        /// Qualified name in the end event
        found: String,
    },
    /// `EndPrefixMapping` for a prefix that is not mapped.
    UnmatchedEndPrefixMapping(String),
    /// A lexical `End*` event (CDATA, DTD, entity) without a matching start.
    UnmatchedLexicalEnd(Opcode),
    /// The stream ended while some constructs were still open.
    Unclosed {
        /// Number of open elements
        elements: usize,
        /// Number of prefix mappings still in scope
        prefixes: usize,
        /// Number of open CDATA sections, DTDs and entity expansions
        lexical: usize,
        /// Whether a `StartDocument` was not followed by an `EndDocument`
        document: bool,
    },
}

impl fmt::Display for IllFormedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IllFormedError::DuplicatedStartDocument => {
                write!(f, "document is already started")
            }
            IllFormedError::EventAfterEndDocument(opcode) => {
                write!(f, "`{:?}` event after the end of document", opcode)
            }
            IllFormedError::EndDocumentWithOpenElements(count) => write!(
                f,
                "document ended while {} element(s) are still open",
                count
            ),
            IllFormedError::EndDocumentWithOpenLexical(count) => write!(
                f,
                "document ended inside {} CDATA section(s), DTD(s) or entities",
                count
            ),
            IllFormedError::UnmatchedEndDocument => {
                write!(f, "document ended but was never started")
            }
            IllFormedError::UnmatchedEndElement(name) => {
                write!(f, "close tag `</{}>` does not match any open tag", name)
            }
            IllFormedError::MismatchedEndElement { expected, found } => {
                write!(f, "expecting `</{}>` found `</{}>`", expected, found)
            }
            IllFormedError::UnmatchedEndPrefixMapping(prefix) => {
                write!(f, "prefix `{}` is not mapped", prefix)
            }
            IllFormedError::UnmatchedLexicalEnd(opcode) => {
                write!(f, "`{:?}` event without matching start", opcode)
            }
            IllFormedError::Unclosed {
                elements,
                prefixes,
                lexical,
                document,
            } => write!(
                f,
                "stream ended with {} open element(s), {} prefix mapping(s) in scope, \
                 {} open lexical construct(s){}",
                elements,
                prefixes,
                lexical,
                if *document { " and an unfinished document" } else { "" }
            ),
        }
    }
}

impl std::error::Error for IllFormedError {}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// The API was used out of its contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MisuseError {
    /// [`Interpreter::deserialize`] was called before a consumer was bound.
    ///
    /// [`Interpreter::deserialize`]: crate::Interpreter::deserialize
    NoConsumer,
    /// An event was fed to a compiler whose previous event failed to encode.
    /// The compiler must be recycled before it can be used again.
    Failed,
}

impl fmt::Display for MisuseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MisuseError::NoConsumer => write!(f, "no consumer is bound to the interpreter"),
            MisuseError::Failed => write!(
                f,
                "compiler failed to encode a previous event and must be recycled"
            ),
        }
    }
}

impl std::error::Error for MisuseError {}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// The error type used by this crate.
#[derive(Clone, Debug)]
pub enum Error {
    /// IO error.
    ///
    /// `std::io::Error` is not `Clone`, so it is wrapped in `Arc`.
    Io(Arc<io::Error>),
    /// An event could not be stored by the compiler or by a handler that
    /// keeps events in memory
    Encoding(EncodeError),
    /// The binary stream is corrupted
    Decode(DecodeError),
    /// The event sequence violates the document grammar
    IllFormed(IllFormedError),
    /// The API was used out of contract
    Misuse(MisuseError),
}

impl From<io::Error> for Error {
    /// Creates a new `Error::Io` from the given error
    #[inline]
    fn from(error: io::Error) -> Error {
        Error::Io(Arc::new(error))
    }
}

impl From<EncodeError> for Error {
    /// Creates a new `Error::Encoding` from the given error
    #[inline]
    fn from(error: EncodeError) -> Error {
        Error::Encoding(error)
    }
}

impl From<TryReserveError> for Error {
    /// Creates a new `Error::Encoding` from the given error
    #[inline]
    fn from(error: TryReserveError) -> Error {
        Error::Encoding(EncodeError::Reserve(error))
    }
}

impl From<DecodeError> for Error {
    /// Creates a new `Error::Decode` from the given error
    #[inline]
    fn from(error: DecodeError) -> Error {
        Error::Decode(error)
    }
}

impl From<IllFormedError> for Error {
    /// Creates a new `Error::IllFormed` from the given error
    #[inline]
    fn from(error: IllFormedError) -> Error {
        Error::IllFormed(error)
    }
}

impl From<MisuseError> for Error {
    /// Creates a new `Error::Misuse` from the given error
    #[inline]
    fn from(error: MisuseError) -> Error {
        Error::Misuse(error)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Encoding(e) => write!(f, "encoding error: {}", e),
            Error::Decode(e) => write!(f, "decoding error: {}", e),
            Error::IllFormed(e) => write!(f, "ill-formed event stream: {}", e),
            Error::Misuse(e) => write!(f, "misuse: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e.as_ref()),
            Error::Encoding(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::IllFormed(e) => Some(e),
            Error::Misuse(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_error_offset() {
        let err = DecodeError::Truncated {
            offset: 7,
            needed: 4,
            available: 1,
        };
        assert_eq!(err.offset(), 7);
        assert_eq!(
            err.to_string(),
            "truncated record at position 7: field needs 4 bytes, but only 1 remain"
        );
    }

    #[test]
    fn reserve_failure_is_encoding_error() {
        let reserve = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        match Error::from(reserve) {
            Error::Encoding(EncodeError::Reserve(_)) => {}
            x => panic!("Expected `Encoding(Reserve)`, but got `{:?}`", x),
        }
    }

    #[test]
    fn field_too_long_display() {
        let err: Error = EncodeError::FieldTooLong { length: 5, max: 4 }.into();
        assert_eq!(
            err.to_string(),
            "encoding error: field of 5 bytes exceeds the maximum of 4 bytes"
        );
    }

    #[test]
    fn unknown_opcode_display() {
        let err: Error = DecodeError::UnknownOpcode {
            opcode: 0xAB,
            offset: 3,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "decoding error: unknown opcode 0xab at position 3"
        );
    }
}
