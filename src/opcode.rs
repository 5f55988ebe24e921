//! The tag vocabulary of the binary format.
//!
//! Every record in a stream starts with a single byte that identifies the
//! kind of event it encodes. The assignment of bytes to events is fixed by
//! [`FORMAT_VERSION`]: a stored blob can only be read back by a decoder that
//! uses the same table. Byte `0` is reserved and never names an event.

/// Version of the opcode table and of the field encodings.
///
/// Changing the meaning of an existing opcode, or the encoding of any field,
/// requires a new version and an explicit migration of stored blobs.
pub const FORMAT_VERSION: u8 = 1;

/// Identifies the event kind of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Opcode {
    /// No fields
    StartDocument = 1,
    /// No fields
    EndDocument = 2,
    /// Fields: prefix, uri
    StartPrefixMapping = 3,
    /// Fields: prefix
    EndPrefixMapping = 4,
    /// Fields: uri, local name, qualified name, attribute count, then five
    /// strings per attribute: uri, local name, qualified name, type, value
    StartElement = 5,
    /// Fields: uri, local name, qualified name
    EndElement = 6,
    /// Fields: text
    Characters = 7,
    /// Fields: text
    IgnorableWhitespace = 8,
    /// Fields: target, optional data
    ProcessingInstruction = 9,
    /// Fields: name
    SkippedEntity = 10,
    /// Fields: optional public id, optional system id, line, column
    Locator = 11,
    /// Fields: text
    Comment = 12,
    /// No fields
    StartCdata = 13,
    /// No fields
    EndCdata = 14,
    /// Fields: name, optional public id, optional system id
    StartDtd = 15,
    /// No fields
    EndDtd = 16,
    /// Fields: name
    StartEntity = 17,
    /// Fields: name
    EndEntity = 18,
}

impl Opcode {
    /// All opcodes in the order of their byte values.
    pub const ALL: [Opcode; 18] = [
        Opcode::StartDocument,
        Opcode::EndDocument,
        Opcode::StartPrefixMapping,
        Opcode::EndPrefixMapping,
        Opcode::StartElement,
        Opcode::EndElement,
        Opcode::Characters,
        Opcode::IgnorableWhitespace,
        Opcode::ProcessingInstruction,
        Opcode::SkippedEntity,
        Opcode::Locator,
        Opcode::Comment,
        Opcode::StartCdata,
        Opcode::EndCdata,
        Opcode::StartDtd,
        Opcode::EndDtd,
        Opcode::StartEntity,
        Opcode::EndEntity,
    ];

    /// Returns the byte that identifies this opcode on the wire.
    #[inline]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns the opcode identified by `byte`, or `None` if the byte is
    /// reserved or outside of the table.
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            1..=18 => Some(Self::ALL[usize::from(byte - 1)]),
            _ => None,
        }
    }
}

impl From<Opcode> for u8 {
    #[inline]
    fn from(opcode: Opcode) -> u8 {
        opcode.to_byte()
    }
}

impl TryFrom<u8> for Opcode {
    /// The rejected byte
    type Error = u8;

    #[inline]
    fn try_from(byte: u8) -> Result<Self, u8> {
        Opcode::from_byte(byte).ok_or(byte)
    }
}
