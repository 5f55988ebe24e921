//! Contains the Event Interpreter: replays a binary stream into a [`ContentHandler`].

use std::io::Read;

use crate::checker::WellFormedChecker;
use crate::codec::Cursor;
use crate::config::Config;
use crate::errors::{DecodeError, Error, IllFormedError, MisuseError};
use crate::handler::{AttributeRange, Attributes, ContentHandler, Locator};
use crate::opcode::Opcode;
use crate::utils::recycle_vec;

#[cfg(feature = "async-tokio")]
mod async_tokio;

/// Fields of one decoded record, borrowed from the stream. Attributes of a
/// `StartElement` are kept by the [`Replayer`].
#[derive(Clone, Copy, Debug)]
enum Record<'b> {
    Locator(Locator<'b>),
    StartDocument,
    EndDocument,
    StartPrefixMapping(&'b str, &'b str),
    EndPrefixMapping(&'b str),
    StartElement(&'b str, &'b str, &'b str),
    EndElement(&'b str, &'b str, &'b str),
    Characters(&'b str),
    IgnorableWhitespace(&'b str),
    ProcessingInstruction(&'b str, Option<&'b str>),
    SkippedEntity(&'b str),
    Comment(&'b str),
    StartCdata,
    EndCdata,
    StartDtd(&'b str, Option<&'b str>, Option<&'b str>),
    EndDtd,
    StartEntity(&'b str),
    EndEntity(&'b str),
}

/// The decoding loop with its scratch storage, independent of the consumer.
#[derive(Clone, Debug, Default)]
pub(crate) struct Replayer {
    config: Config,
    /// Attributes of the last decoded `StartElement`
    attributes: Vec<AttributeRange>,
    checker: WellFormedChecker,
}

impl Replayer {
    fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn recycle(&mut self) {
        recycle_vec(&mut self.attributes, self.config.retain_capacity);
        self.checker.reset();
    }

    /// Reads `blob` record by record and calls `consumer` once per record.
    ///
    /// A record is delivered only after all of its fields were decoded, so a
    /// corrupted record is never partially seen by the consumer. Records
    /// before the corrupted one have already been delivered when the error
    /// is returned.
    pub fn replay<C>(&mut self, blob: &[u8], consumer: &mut C) -> Result<(), C::Error>
    where
        C: ContentHandler + ?Sized,
    {
        let check = self.config.check_well_formed;
        self.checker.reset();

        let mut cursor = Cursor::new(blob);
        let mut records = 0usize;
        while !cursor.is_empty() {
            let record = match self.decode(&mut cursor) {
                Ok(record) => record,
                Err(e) => {
                    debug!("cannot decode record #{}: {}", records, e);
                    return Err(Error::Decode(e).into());
                }
            };
            if check {
                if let Err(e) = self.check(record) {
                    debug!("record #{} breaks the document grammar: {}", records, e);
                    return Err(Error::IllFormed(e).into());
                }
            }
            self.dispatch(blob, record, consumer)?;
            records += 1;
        }
        if check {
            self.checker.finish().map_err(Error::IllFormed)?;
        }
        trace!("replayed {} records from {} bytes", records, blob.len());
        Ok(())
    }

    fn decode<'b>(&mut self, cursor: &mut Cursor<'b>) -> Result<Record<'b>, DecodeError> {
        let record = match cursor.read_opcode()? {
            Opcode::Locator => Record::Locator(Locator {
                public_id: cursor.read_opt_str()?,
                system_id: cursor.read_opt_str()?,
                line: cursor.read_varint()?,
                column: cursor.read_varint()?,
            }),
            Opcode::StartDocument => Record::StartDocument,
            Opcode::EndDocument => Record::EndDocument,
            Opcode::StartPrefixMapping => {
                Record::StartPrefixMapping(cursor.read_str()?, cursor.read_str()?)
            }
            Opcode::EndPrefixMapping => Record::EndPrefixMapping(cursor.read_str()?),
            Opcode::StartElement => {
                let uri = cursor.read_str()?;
                let local_name = cursor.read_str()?;
                let qname = cursor.read_str()?;
                // every attribute takes at least five bytes, so a count that
                // does not fit will fail with `Truncated` before it is reached
                let count = cursor.read_len(usize::MAX)?;
                self.attributes.clear();
                for _ in 0..count {
                    self.attributes.push(AttributeRange {
                        uri: cursor.read_str_range()?,
                        local_name: cursor.read_str_range()?,
                        qname: cursor.read_str_range()?,
                        ty: cursor.read_str_range()?,
                        value: cursor.read_str_range()?,
                    });
                }
                Record::StartElement(uri, local_name, qname)
            }
            Opcode::EndElement => Record::EndElement(
                cursor.read_str()?,
                cursor.read_str()?,
                cursor.read_str()?,
            ),
            Opcode::Characters => Record::Characters(cursor.read_text()?),
            Opcode::IgnorableWhitespace => Record::IgnorableWhitespace(cursor.read_text()?),
            Opcode::ProcessingInstruction => {
                Record::ProcessingInstruction(cursor.read_str()?, cursor.read_opt_str()?)
            }
            Opcode::SkippedEntity => Record::SkippedEntity(cursor.read_str()?),
            Opcode::Comment => Record::Comment(cursor.read_text()?),
            Opcode::StartCdata => Record::StartCdata,
            Opcode::EndCdata => Record::EndCdata,
            Opcode::StartDtd => Record::StartDtd(
                cursor.read_str()?,
                cursor.read_opt_str()?,
                cursor.read_opt_str()?,
            ),
            Opcode::EndDtd => Record::EndDtd,
            Opcode::StartEntity => Record::StartEntity(cursor.read_str()?),
            Opcode::EndEntity => Record::EndEntity(cursor.read_str()?),
        };
        Ok(record)
    }

    fn check(&mut self, record: Record) -> Result<(), IllFormedError> {
        let checker = &mut self.checker;
        match record {
            Record::StartDocument => checker.start_document(),
            Record::EndDocument => checker.end_document(),
            Record::StartPrefixMapping(prefix, _) => checker.start_prefix_mapping(prefix),
            Record::EndPrefixMapping(prefix) => checker.end_prefix_mapping(prefix),
            Record::StartElement(uri, local_name, qname) => {
                checker.start_element(uri, local_name, qname)
            }
            Record::EndElement(uri, local_name, qname) => {
                checker.end_element(uri, local_name, qname)
            }
            Record::StartCdata => checker.start_cdata(),
            Record::EndCdata => checker.end_cdata(),
            Record::StartDtd(..) => checker.start_dtd(),
            Record::EndDtd => checker.end_dtd(),
            Record::StartEntity(name) => checker.start_entity(name),
            Record::EndEntity(name) => checker.end_entity(name),
            Record::Locator(_) => checker.other(Opcode::Locator),
            Record::Characters(_) => checker.other(Opcode::Characters),
            Record::IgnorableWhitespace(_) => checker.other(Opcode::IgnorableWhitespace),
            Record::ProcessingInstruction(..) => checker.other(Opcode::ProcessingInstruction),
            Record::SkippedEntity(_) => checker.other(Opcode::SkippedEntity),
            Record::Comment(_) => checker.other(Opcode::Comment),
        }
    }

    fn dispatch<C>(&self, blob: &[u8], record: Record, consumer: &mut C) -> Result<(), C::Error>
    where
        C: ContentHandler + ?Sized,
    {
        match record {
            Record::Locator(locator) => consumer.set_document_locator(locator),
            Record::StartDocument => consumer.start_document(),
            Record::EndDocument => consumer.end_document(),
            Record::StartPrefixMapping(prefix, uri) => consumer.start_prefix_mapping(prefix, uri),
            Record::EndPrefixMapping(prefix) => consumer.end_prefix_mapping(prefix),
            Record::StartElement(uri, local_name, qname) => consumer.start_element(
                uri,
                local_name,
                qname,
                Attributes::encoded(blob, &self.attributes),
            ),
            Record::EndElement(uri, local_name, qname) => {
                consumer.end_element(uri, local_name, qname)
            }
            Record::Characters(text) => consumer.characters(text),
            Record::IgnorableWhitespace(text) => consumer.ignorable_whitespace(text),
            Record::ProcessingInstruction(target, data) => {
                consumer.processing_instruction(target, data)
            }
            Record::SkippedEntity(name) => consumer.skipped_entity(name),
            Record::Comment(text) => consumer.comment(text),
            Record::StartCdata => consumer.start_cdata(),
            Record::EndCdata => consumer.end_cdata(),
            Record::StartDtd(name, public_id, system_id) => {
                consumer.start_dtd(name, public_id, system_id)
            }
            Record::EndDtd => consumer.end_dtd(),
            Record::StartEntity(name) => consumer.start_entity(name),
            Record::EndEntity(name) => consumer.end_entity(name),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Replays binary event streams into a consumer.
///
/// The interpreter owns its consumer, bound with [`set_consumer`]. Each call
/// to [`deserialize`] decodes one blob from its first byte to its last, in a
/// single pass, calling the consumer once per record in the order the
/// records were compiled. Because `deserialize` takes `&mut self`, an
/// interpreter cannot be re-entered while it is replaying.
///
/// Scratch storage (the attribute list of the current element, the input
/// buffer of [`deserialize_from`]) is kept between calls and reset by
/// [`recycle`], so one interpreter can replay many small blobs without
/// allocating per blob.
///
/// # Errors
///
/// - a corrupted or truncated blob yields [`Error::Decode`] converted into
///   the consumer's error type;
/// - an error returned by the consumer is returned unchanged;
/// - calling `deserialize` without a consumer yields [`MisuseError::NoConsumer`].
///
/// # Example
///
/// ```
/// use xml_event_codec::{Attribute, Attributes, Compiler, ContentHandler, Interpreter, Recorder};
///
/// let mut compiler = Compiler::new();
/// compiler.start_document().unwrap();
/// compiler
///     .start_element("", "a", "a", Attributes::from(&[Attribute::new("x", "1")]))
///     .unwrap();
/// compiler.end_element("", "a", "a").unwrap();
/// compiler.end_document().unwrap();
///
/// let mut interpreter = Interpreter::with_consumer(Recorder::new());
/// interpreter.deserialize(compiler.as_bytes()).unwrap();
///
/// let events = interpreter.take_consumer().unwrap().into_events();
/// assert_eq!(events.len(), 4);
/// ```
///
/// [`set_consumer`]: Self::set_consumer
/// [`deserialize`]: Self::deserialize
/// [`deserialize_from`]: Self::deserialize_from
/// [`recycle`]: Self::recycle
#[derive(Clone, Debug)]
pub struct Interpreter<H> {
    replayer: Replayer,
    consumer: Option<H>,
    /// Bytes read by `deserialize_from`
    input: Vec<u8>,
}

impl<H> Interpreter<H> {
    /// Creates an interpreter with the default configuration and no consumer.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an interpreter with the given configuration and no consumer.
    pub fn with_config(config: Config) -> Self {
        Self {
            replayer: Replayer::with_config(config),
            consumer: None,
            input: Vec::new(),
        }
    }

    /// Creates an interpreter with the default configuration, bound to `consumer`.
    pub fn with_consumer(consumer: H) -> Self {
        let mut interpreter = Self::new();
        interpreter.consumer = Some(consumer);
        interpreter
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.replayer.config
    }

    /// Returns a mutable reference to the configuration.
    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.replayer.config
    }

    /// Binds the consumer that receives replayed events, returning the
    /// previously bound one.
    pub fn set_consumer(&mut self, consumer: H) -> Option<H> {
        self.consumer.replace(consumer)
    }

    /// Returns the bound consumer.
    #[inline]
    pub fn consumer(&self) -> Option<&H> {
        self.consumer.as_ref()
    }

    /// Returns the bound consumer mutably.
    #[inline]
    pub fn consumer_mut(&mut self) -> Option<&mut H> {
        self.consumer.as_mut()
    }

    /// Unbinds and returns the consumer.
    #[inline]
    pub fn take_consumer(&mut self) -> Option<H> {
        self.consumer.take()
    }

    /// Consumes the interpreter, returning the bound consumer.
    #[inline]
    pub fn into_consumer(self) -> Option<H> {
        self.consumer
    }

    /// Clears scratch storage so the interpreter is ready for the next blob.
    ///
    /// Allocated capacity is kept, up to [`Config::retain_capacity`]. The
    /// bound consumer stays bound.
    pub fn recycle(&mut self) {
        let retain = self.replayer.config.retain_capacity;
        self.replayer.recycle();
        recycle_vec(&mut self.input, retain);
        debug!("interpreter recycled");
    }

    /// Replays `blob` into `consumer` instead of the bound consumer, reusing
    /// the scratch storage of this interpreter.
    pub fn replay<C>(&mut self, blob: &[u8], consumer: &mut C) -> Result<(), C::Error>
    where
        C: ContentHandler + ?Sized,
    {
        self.replayer.replay(blob, consumer)
    }
}

impl<H: ContentHandler> Interpreter<H> {
    /// Replays `blob` into the bound consumer.
    ///
    /// The empty blob is a valid stream with no events.
    pub fn deserialize(&mut self, blob: &[u8]) -> Result<(), H::Error> {
        match self.consumer.as_mut() {
            Some(consumer) => self.replayer.replay(blob, consumer),
            None => Err(no_consumer()),
        }
    }

    /// Reads `reader` to its end and replays the bytes into the bound consumer.
    ///
    /// The bytes are collected in a buffer owned by the interpreter, which is
    /// reused by subsequent calls.
    pub fn deserialize_from<R: Read>(&mut self, mut reader: R) -> Result<(), H::Error> {
        if self.consumer.is_none() {
            return Err(no_consumer());
        }
        self.input.clear();
        reader.read_to_end(&mut self.input).map_err(Error::from)?;
        self.deserialize_input()
    }

    /// Replays the content of the input buffer.
    fn deserialize_input(&mut self) -> Result<(), H::Error> {
        let Self {
            replayer,
            consumer,
            input,
        } = self;
        match consumer {
            Some(consumer) => replayer.replay(input, consumer),
            None => Err(no_consumer()),
        }
    }
}

impl<H> Default for Interpreter<H> {
    fn default() -> Self {
        Self::new()
    }
}

fn no_consumer<E: From<Error>>() -> E {
    debug!("interpreter used without a consumer");
    Error::Misuse(MisuseError::NoConsumer).into()
}
