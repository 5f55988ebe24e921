//! Contains the Event Compiler: turns [`ContentHandler`] calls into a binary stream.

use std::io::Write;

use crate::blob::Blob;
use crate::checker::WellFormedChecker;
use crate::codec::{write_opcode, write_opt_str, write_str, write_text, write_varint};
use crate::config::Config;
use crate::errors::{EncodeError, Error, IllFormedError, MisuseError, Result};
use crate::handler::{Attributes, ContentHandler, Locator};
use crate::opcode::Opcode;
use crate::utils::recycle_vec;

#[cfg(feature = "async-tokio")]
mod async_tokio;

/// Encodes a stream of XML events into a [`Blob`].
///
/// The compiler is a [`ContentHandler`]: any producer of events can drive it.
/// Each call appends exactly one record to an internal buffer, in call order.
/// Nothing is reordered or merged, so the same sequence of calls always
/// produces the same bytes.
///
/// ```
/// use xml_event_codec::{Attribute, Attributes, Compiler, ContentHandler};
///
/// let mut compiler = Compiler::new();
/// compiler.start_document().unwrap();
/// compiler
///     .start_element("", "p", "p", Attributes::from(&[Attribute::new("id", "1")]))
///     .unwrap();
/// compiler.characters("text").unwrap();
/// compiler.end_element("", "p", "p").unwrap();
/// compiler.end_document().unwrap();
///
/// let blob = compiler.output();
/// assert_eq!(blob.events().unwrap().len(), 5);
///
/// // ready for the next document, keeping the buffer
/// compiler.recycle();
/// assert!(compiler.is_empty());
/// ```
///
/// # Failures
///
/// A call that fails leaves no partial record: the buffer is rolled back to
/// the end of the previous record and the grammar checker is not updated.
///
/// A string or text longer than [`MAX_FIELD_LEN`] is refused with
/// [`EncodeError::FieldTooLong`] and the compiler stays usable. When the
/// buffer cannot grow, the call returns [`EncodeError::Reserve`] and the
/// document is lost: all further calls return [`MisuseError::Failed`] until
/// the compiler is [recycled](Self::recycle).
///
/// [`MAX_FIELD_LEN`]: crate::codec::MAX_FIELD_LEN
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    /// Records compiled since the last recycle
    buffer: Vec<u8>,
    config: Config,
    checker: WellFormedChecker,
    /// Set when a record could not be written
    failed: bool,
}

impl Compiler {
    /// Creates a compiler with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compiler whose buffer can hold `capacity` bytes without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Creates a compiler with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Returns the bytes compiled so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the number of bytes compiled so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing was compiled since construction or the last
    /// recycle.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the number of bytes the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Returns a copy of the bytes compiled so far as a [`Blob`].
    ///
    /// May be called at any time. Before `end_document` the blob holds a
    /// partial stream, which is still valid to replay. The compiler keeps its
    /// buffer, so compiling can continue.
    pub fn output(&self) -> Blob {
        Blob::from(self.buffer.clone())
    }

    /// Consumes the compiler, returning its buffer as a [`Blob`] without
    /// copying.
    pub fn into_blob(self) -> Blob {
        Blob::from(self.buffer)
    }

    /// Writes the bytes compiled so far to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.buffer)?;
        Ok(())
    }

    /// Discards the compiled bytes and all transient state, returning the
    /// compiler to its just-constructed state.
    ///
    /// The buffer keeps its capacity, up to [`Config::retain_capacity`].
    pub fn recycle(&mut self) {
        debug!(
            "compiler recycled, {} bytes discarded, capacity {}",
            self.buffer.len(),
            self.buffer.capacity()
        );
        recycle_vec(&mut self.buffer, self.config.retain_capacity);
        self.checker.reset();
        self.failed = false;
    }

    /// Appends one record. `write` encodes the record; `check` then validates
    /// the event against the document grammar when checks are enabled. The
    /// record is removed again if either fails, so the checker only sees
    /// events that were stored.
    fn emit<C, W>(&mut self, check: C, write: W) -> Result<()>
    where
        C: FnOnce(&mut WellFormedChecker) -> std::result::Result<(), IllFormedError>,
        W: FnOnce(&mut Vec<u8>) -> std::result::Result<(), EncodeError>,
    {
        if self.failed {
            return Err(Error::Misuse(MisuseError::Failed));
        }
        let start = self.buffer.len();
        if let Err(e) = write(&mut self.buffer) {
            self.buffer.truncate(start);
            if let EncodeError::Reserve(_) = e {
                self.failed = true;
            }
            debug!("cannot encode record at position {}: {}", start, e);
            return Err(Error::Encoding(e));
        }
        if self.config.check_well_formed {
            if let Err(e) = check(&mut self.checker) {
                self.buffer.truncate(start);
                return Err(Error::IllFormed(e));
            }
        }
        Ok(())
    }

    /// Appends a record without fields.
    #[inline]
    fn emit_opcode<C>(&mut self, opcode: Opcode, check: C) -> Result<()>
    where
        C: FnOnce(&mut WellFormedChecker) -> std::result::Result<(), IllFormedError>,
    {
        self.emit(check, |buf| write_opcode(buf, opcode))
    }

    /// Appends a record with a single string field.
    #[inline]
    fn emit_str<C>(&mut self, opcode: Opcode, check: C, value: &str) -> Result<()>
    where
        C: FnOnce(&mut WellFormedChecker) -> std::result::Result<(), IllFormedError>,
    {
        self.emit(check, |buf| {
            write_opcode(buf, opcode)?;
            write_str(buf, value)
        })
    }

    /// Appends a record with a single text run.
    #[inline]
    fn emit_text(&mut self, opcode: Opcode, text: &str) -> Result<()> {
        self.emit(
            |c| c.other(opcode),
            |buf| {
                write_opcode(buf, opcode)?;
                write_text(buf, text)
            },
        )
    }
}

impl ContentHandler for Compiler {
    type Error = Error;

    fn set_document_locator(&mut self, locator: Locator) -> Result<()> {
        self.emit(
            |c| c.other(Opcode::Locator),
            |buf| {
                write_opcode(buf, Opcode::Locator)?;
                write_opt_str(buf, locator.public_id)?;
                write_opt_str(buf, locator.system_id)?;
                write_varint(buf, locator.line)?;
                write_varint(buf, locator.column)
            },
        )
    }

    fn start_document(&mut self) -> Result<()> {
        self.emit_opcode(Opcode::StartDocument, |c| c.start_document())
    }

    fn end_document(&mut self) -> Result<()> {
        self.emit_opcode(Opcode::EndDocument, |c| c.end_document())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.emit(
            |c| c.start_prefix_mapping(prefix),
            |buf| {
                write_opcode(buf, Opcode::StartPrefixMapping)?;
                write_str(buf, prefix)?;
                write_str(buf, uri)
            },
        )
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.emit_str(
            Opcode::EndPrefixMapping,
            |c| c.end_prefix_mapping(prefix),
            prefix,
        )
    }

    fn start_element(
        &mut self,
        uri: &str,
        local_name: &str,
        qname: &str,
        attributes: Attributes,
    ) -> Result<()> {
        self.emit(
            |c| c.start_element(uri, local_name, qname),
            |buf| {
                write_opcode(buf, Opcode::StartElement)?;
                write_str(buf, uri)?;
                write_str(buf, local_name)?;
                write_str(buf, qname)?;
                write_varint(buf, attributes.len() as u64)?;
                for attribute in attributes {
                    write_str(buf, attribute.uri)?;
                    write_str(buf, attribute.local_name)?;
                    write_str(buf, attribute.qname)?;
                    write_str(buf, attribute.ty)?;
                    write_str(buf, attribute.value)?;
                }
                Ok(())
            },
        )
    }

    fn end_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result<()> {
        self.emit(
            |c| c.end_element(uri, local_name, qname),
            |buf| {
                write_opcode(buf, Opcode::EndElement)?;
                write_str(buf, uri)?;
                write_str(buf, local_name)?;
                write_str(buf, qname)
            },
        )
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.emit_text(Opcode::Characters, text)
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.emit_text(Opcode::IgnorableWhitespace, text)
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        self.emit(
            |c| c.other(Opcode::ProcessingInstruction),
            |buf| {
                write_opcode(buf, Opcode::ProcessingInstruction)?;
                write_str(buf, target)?;
                write_opt_str(buf, data)
            },
        )
    }

    fn skipped_entity(&mut self, name: &str) -> Result<()> {
        self.emit_str(
            Opcode::SkippedEntity,
            |c| c.other(Opcode::SkippedEntity),
            name,
        )
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.emit_text(Opcode::Comment, text)
    }

    fn start_cdata(&mut self) -> Result<()> {
        self.emit_opcode(Opcode::StartCdata, |c| c.start_cdata())
    }

    fn end_cdata(&mut self) -> Result<()> {
        self.emit_opcode(Opcode::EndCdata, |c| c.end_cdata())
    }

    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<()> {
        self.emit(
            |c| c.start_dtd(),
            |buf| {
                write_opcode(buf, Opcode::StartDtd)?;
                write_str(buf, name)?;
                write_opt_str(buf, public_id)?;
                write_opt_str(buf, system_id)
            },
        )
    }

    fn end_dtd(&mut self) -> Result<()> {
        self.emit_opcode(Opcode::EndDtd, |c| c.end_dtd())
    }

    fn start_entity(&mut self, name: &str) -> Result<()> {
        self.emit_str(Opcode::StartEntity, |c| c.start_entity(name), name)
    }

    fn end_entity(&mut self, name: &str) -> Result<()> {
        self.emit_str(Opcode::EndEntity, |c| c.end_entity(name), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Attribute;
    use pretty_assertions::assert_eq;

    macro_rules! test {
        ($name: ident, |$c:ident| $calls: expr, $expected: expr) => {
            #[test]
            fn $name() {
                let mut $c = Compiler::new();
                $calls.expect("compile failed");
                assert_eq!($c.as_bytes(), &$expected[..]);
            }
        };
    }

    test!(start_document, |c| c.start_document(), [1]);
    test!(end_document, |c| c.end_document(), [2]);
    test!(
        prefix_mapping,
        |c| c.start_prefix_mapping("x", "urn:x"),
        [3, 2, b'x', 6, b'u', b'r', b'n', b':', b'x']
    );
    test!(
        empty_element,
        |c| c.start_element("", "p", "p", Attributes::empty()),
        [5, 1, 2, b'p', 2, b'p', 0]
    );
    test!(
        element_with_attribute,
        |c| c.start_element("", "p", "p", Attributes::from(&[Attribute::new("a", "")])),
        [5, 1, 2, b'p', 2, b'p', 1, 1, 2, b'a', 2, b'a', 6, b'C', b'D', b'A', b'T', b'A', 1]
    );
    test!(
        end_element,
        |c| c.end_element("urn:x", "p", "x:p"),
        [6, 6, b'u', b'r', b'n', b':', b'x', 2, b'p', 4, b'x', b':', b'p']
    );
    test!(characters, |c| c.characters("hi"), [7, 2, b'h', b'i']);
    test!(empty_characters, |c| c.characters(""), [7, 0]);
    test!(whitespace, |c| c.ignorable_whitespace(" "), [8, 1, b' ']);
    test!(
        processing_instruction,
        |c| c.processing_instruction("t", None),
        [9, 2, b't', 0]
    );
    test!(
        processing_instruction_with_empty_data,
        |c| c.processing_instruction("t", Some("")),
        [9, 2, b't', 1]
    );
    test!(skipped_entity, |c| c.skipped_entity("e"), [10, 2, b'e']);
    test!(
        locator,
        |c| c.set_document_locator(Locator {
            public_id: None,
            system_id: Some("f"),
            line: 300,
            column: 1,
        }),
        [11, 0, 2, b'f', 0xAC, 0x02, 1]
    );
    test!(comment, |c| c.comment("c"), [12, 1, b'c']);
    test!(cdata, |c| c.start_cdata().and_then(|_| c.end_cdata()), [13, 14]);
    test!(
        dtd,
        |c| c.start_dtd("html", None, None).and_then(|_| c.end_dtd()),
        [15, 5, b'h', b't', b'm', b'l', 0, 0, 16]
    );
    test!(
        entity,
        |c| c.start_entity("e").and_then(|_| c.end_entity("e")),
        [17, 2, b'e', 18, 2, b'e']
    );

    #[test]
    fn output_keeps_buffer() {
        let mut compiler = Compiler::new();
        compiler.start_document().unwrap();
        let partial = compiler.output();
        compiler.end_document().unwrap();

        assert_eq!(partial.as_bytes(), &[1]);
        assert_eq!(compiler.into_blob().as_bytes(), &[1, 2]);
    }

    #[test]
    fn recycle() {
        let mut compiler = Compiler::with_capacity(64);
        compiler.characters("some text").unwrap();
        compiler.recycle();

        assert!(compiler.is_empty());
        assert!(compiler.capacity() >= 64);

        compiler.comment("c").unwrap();
        assert_eq!(compiler.as_bytes(), &[12, 1, b'c']);
    }

    #[test]
    fn recycle_shrinks_to_retained_capacity() {
        let mut compiler = Compiler::new();
        compiler.config_mut().retain_capacity = Some(16);
        compiler.characters(&"x".repeat(1000)).unwrap();
        compiler.recycle();
        assert!(compiler.capacity() < 1000);
    }

    #[test]
    fn failed_until_recycled() {
        let mut compiler = Compiler::new();
        compiler.start_document().unwrap();
        compiler.failed = true;

        match compiler.characters("x") {
            Err(Error::Misuse(MisuseError::Failed)) => {}
            x => panic!("Expected `Err(Misuse(Failed))`, but got `{:?}`", x),
        }
        assert_eq!(compiler.as_bytes(), &[1]);

        compiler.recycle();
        compiler.characters("x").unwrap();
        assert_eq!(compiler.as_bytes(), &[7, 1, b'x']);
    }

    #[test]
    fn reserve_failure_rolls_back_and_fails() {
        let mut compiler = Compiler::new();
        compiler.start_document().unwrap();

        let result = compiler.emit(
            |c| c.other(Opcode::Characters),
            |buf| {
                buf.extend_from_slice(&[7, 1]);
                Err(Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err().into())
            },
        );
        match result {
            Err(Error::Encoding(EncodeError::Reserve(_))) => {}
            x => panic!("Expected `Err(Encoding(Reserve))`, but got `{:?}`", x),
        }
        assert_eq!(compiler.as_bytes(), &[1]);

        match compiler.comment("c") {
            Err(Error::Misuse(MisuseError::Failed)) => {}
            x => panic!("Expected `Err(Misuse(Failed))`, but got `{:?}`", x),
        }
        assert_eq!(compiler.as_bytes(), &[1]);

        compiler.recycle();
        compiler.comment("c").unwrap();
        assert_eq!(compiler.as_bytes(), &[12, 1, b'c']);
    }

    #[test]
    fn field_too_long_keeps_compiler_usable() {
        let mut compiler = Compiler::with_config(Config::default().with_checks(true));
        compiler.start_document().unwrap();

        let result = compiler.emit(
            |c| c.start_element("", "a", "a"),
            |buf| {
                write_opcode(buf, Opcode::StartElement)?;
                Err(EncodeError::FieldTooLong {
                    length: usize::MAX,
                    max: crate::codec::MAX_FIELD_LEN,
                })
            },
        );
        match result {
            Err(Error::Encoding(EncodeError::FieldTooLong { .. })) => {}
            x => panic!("Expected `Err(Encoding(FieldTooLong))`, but got `{:?}`", x),
        }
        assert_eq!(compiler.as_bytes(), &[1]);
        assert_eq!(compiler.checker.depth(), 0);

        // the refused element was never opened
        compiler.end_document().unwrap();
        assert_eq!(compiler.as_bytes(), &[1, 2]);
    }

    #[test]
    fn write_to() {
        let mut compiler = Compiler::new();
        compiler.start_document().unwrap();
        compiler.end_document().unwrap();

        let mut out = Vec::new();
        compiler.write_to(&mut out).unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    mod checks {
        use super::*;
        use pretty_assertions::assert_eq;

        fn checked() -> Compiler {
            Compiler::with_config(Config::default().with_checks(true))
        }

        #[test]
        fn mismatched_end_is_not_written() {
            let mut compiler = checked();
            compiler
                .start_element("", "a", "a", Attributes::empty())
                .unwrap();
            let before = compiler.as_bytes().to_vec();

            match compiler.end_element("", "b", "b") {
                Err(Error::IllFormed(IllFormedError::MismatchedEndElement { .. })) => {}
                x => panic!("Expected `Err(IllFormed(MismatchedEndElement))`, but got `{:?}`", x),
            }
            assert_eq!(compiler.as_bytes(), &before[..]);

            // the compiler remains usable
            compiler.end_element("", "a", "a").unwrap();
        }

        #[test]
        fn event_after_end_document() {
            let mut compiler = checked();
            compiler.start_document().unwrap();
            compiler.end_document().unwrap();
            match compiler.comment("late") {
                Err(Error::IllFormed(IllFormedError::EventAfterEndDocument(Opcode::Comment))) => {}
                x => panic!("Expected `Err(IllFormed(EventAfterEndDocument))`, but got `{:?}`", x),
            }
        }

        #[test]
        fn end_document_inside_lexical_construct() {
            let mut compiler = checked();
            compiler.start_document().unwrap();
            compiler.start_cdata().unwrap();
            compiler.start_entity("e").unwrap();
            let before = compiler.as_bytes().to_vec();

            match compiler.end_document() {
                Err(Error::IllFormed(IllFormedError::EndDocumentWithOpenLexical(2))) => {}
                x => panic!(
                    "Expected `Err(IllFormed(EndDocumentWithOpenLexical(2)))`, but got `{:?}`",
                    x
                ),
            }
            assert_eq!(compiler.as_bytes(), &before[..]);

            compiler.end_entity("e").unwrap();
            compiler.end_cdata().unwrap();
            compiler.end_document().unwrap();
        }

        #[test]
        fn recycle_resets_checker() {
            let mut compiler = checked();
            compiler.start_document().unwrap();
            compiler.recycle();
            compiler.start_document().unwrap();
        }

        #[test]
        fn unchecked_transports_anything() {
            let mut compiler = Compiler::new();
            compiler.end_element("", "a", "a").unwrap();
            compiler.end_document().unwrap();
            compiler.start_document().unwrap();
        }
    }
}
