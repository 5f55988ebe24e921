//! Owned XML events.
//!
//! The [`Compiler`] and the [`Interpreter`] never materialize events: they talk
//! to [`ContentHandler`]s with borrowed data. [`Event`] is the owned form of a
//! single handler call, useful to store a sequence of calls, compare it, or
//! replay it later with [`Event::dispatch`]. [`Recorder`] is the handler that
//! turns calls into events.
//!
//! ```
//! use xml_event_codec::events::{Event, Recorder};
//! use xml_event_codec::{Attributes, Compiler, ContentHandler};
//!
//! let mut compiler = Compiler::new();
//! compiler.start_document().unwrap();
//! compiler.start_element("", "p", "p", Attributes::empty()).unwrap();
//! compiler.characters("hi").unwrap();
//! compiler.end_element("", "p", "p").unwrap();
//! compiler.end_document().unwrap();
//!
//! let mut recorder = Recorder::new();
//! compiler.output().replay(&mut recorder).unwrap();
//! assert_eq!(recorder.events()[2], Event::Characters("hi".to_string()));
//! ```
//!
//! [`Compiler`]: crate::Compiler
//! [`Interpreter`]: crate::Interpreter

use crate::errors::{Error, Result};
use crate::handler::{Attribute, Attributes, ContentHandler, Locator};
use crate::opcode::Opcode;

/// Owned version of [`Attribute`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub struct OwnedAttribute {
    /// Namespace URI, or the empty string if the attribute has no namespace
    pub uri: String,
    /// Local name, without prefix
    pub local_name: String,
    /// Qualified name, with prefix if any
    pub qname: String,
    /// Attribute type
    pub ty: String,
    /// Attribute value
    pub value: String,
}

impl OwnedAttribute {
    /// Borrows this attribute.
    #[inline]
    pub fn as_attribute(&self) -> Attribute<'_> {
        Attribute {
            uri: &self.uri,
            local_name: &self.local_name,
            qname: &self.qname,
            ty: &self.ty,
            value: &self.value,
        }
    }
}

impl<'a> From<Attribute<'a>> for OwnedAttribute {
    fn from(attr: Attribute<'a>) -> Self {
        Self {
            uri: attr.uri.to_owned(),
            local_name: attr.local_name.to_owned(),
            qname: attr.qname.to_owned(),
            ty: attr.ty.to_owned(),
            value: attr.value.to_owned(),
        }
    }
}

/// Owned version of [`Locator`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub struct OwnedLocator {
    /// Public identifier of the document entity
    pub public_id: Option<String>,
    /// System identifier of the document entity
    pub system_id: Option<String>,
    /// Line number
    pub line: u64,
    /// Column number
    pub column: u64,
}

impl OwnedLocator {
    /// Borrows this locator.
    #[inline]
    pub fn as_locator(&self) -> Locator<'_> {
        Locator {
            public_id: self.public_id.as_deref(),
            system_id: self.system_id.as_deref(),
            line: self.line,
            column: self.column,
        }
    }
}

impl<'a> From<Locator<'a>> for OwnedLocator {
    fn from(locator: Locator<'a>) -> Self {
        Self {
            public_id: locator.public_id.map(str::to_owned),
            system_id: locator.system_id.map(str::to_owned),
            line: locator.line,
            column: locator.column,
        }
    }
}

/// One call of a [`ContentHandler`] method, with owned data.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Event {
    /// [`ContentHandler::set_document_locator`]
    Locator(OwnedLocator),
    /// [`ContentHandler::start_document`]
    StartDocument,
    /// [`ContentHandler::end_document`]
    EndDocument,
    /// [`ContentHandler::start_prefix_mapping`]
    StartPrefixMapping {
        /// Prefix, empty for the default namespace
        prefix: String,
        /// Namespace URI
        uri: String,
    },
    /// [`ContentHandler::end_prefix_mapping`]
    EndPrefixMapping {
        /// Prefix, empty for the default namespace
        prefix: String,
    },
    /// [`ContentHandler::start_element`]
    StartElement {
        /// Namespace URI, may be empty
        uri: String,
        /// Local name
        local_name: String,
        /// Qualified name
        qname: String,
        /// Attributes in document order
        attributes: Vec<OwnedAttribute>,
    },
    /// [`ContentHandler::end_element`]
    EndElement {
        /// Namespace URI, may be empty
        uri: String,
        /// Local name
        local_name: String,
        /// Qualified name
        qname: String,
    },
    /// [`ContentHandler::characters`]
    Characters(String),
    /// [`ContentHandler::ignorable_whitespace`]
    IgnorableWhitespace(String),
    /// [`ContentHandler::processing_instruction`]
    ProcessingInstruction {
        /// Target of the instruction
        target: String,
        /// Data, if any
        data: Option<String>,
    },
    /// [`ContentHandler::skipped_entity`]
    SkippedEntity(String),
    /// [`ContentHandler::comment`]
    Comment(String),
    /// [`ContentHandler::start_cdata`]
    StartCdata,
    /// [`ContentHandler::end_cdata`]
    EndCdata,
    /// [`ContentHandler::start_dtd`]
    StartDtd {
        /// Name of the document element
        name: String,
        /// Public identifier of the external subset
        public_id: Option<String>,
        /// System identifier of the external subset
        system_id: Option<String>,
    },
    /// [`ContentHandler::end_dtd`]
    EndDtd,
    /// [`ContentHandler::start_entity`]
    StartEntity(String),
    /// [`ContentHandler::end_entity`]
    EndEntity(String),
}

impl Event {
    /// Creates a start element event without namespace and attributes.
    pub fn start(name: &str) -> Self {
        Self::StartElement {
            uri: String::new(),
            local_name: name.to_owned(),
            qname: name.to_owned(),
            attributes: Vec::new(),
        }
    }

    /// Creates an end element event without namespace.
    pub fn end(name: &str) -> Self {
        Self::EndElement {
            uri: String::new(),
            local_name: name.to_owned(),
            qname: name.to_owned(),
        }
    }

    /// Creates a characters event.
    pub fn text(text: &str) -> Self {
        Self::Characters(text.to_owned())
    }

    /// Returns the opcode of the record that encodes this event.
    pub fn opcode(&self) -> Opcode {
        match self {
            Event::Locator(_) => Opcode::Locator,
            Event::StartDocument => Opcode::StartDocument,
            Event::EndDocument => Opcode::EndDocument,
            Event::StartPrefixMapping { .. } => Opcode::StartPrefixMapping,
            Event::EndPrefixMapping { .. } => Opcode::EndPrefixMapping,
            Event::StartElement { .. } => Opcode::StartElement,
            Event::EndElement { .. } => Opcode::EndElement,
            Event::Characters(_) => Opcode::Characters,
            Event::IgnorableWhitespace(_) => Opcode::IgnorableWhitespace,
            Event::ProcessingInstruction { .. } => Opcode::ProcessingInstruction,
            Event::SkippedEntity(_) => Opcode::SkippedEntity,
            Event::Comment(_) => Opcode::Comment,
            Event::StartCdata => Opcode::StartCdata,
            Event::EndCdata => Opcode::EndCdata,
            Event::StartDtd { .. } => Opcode::StartDtd,
            Event::EndDtd => Opcode::EndDtd,
            Event::StartEntity(_) => Opcode::StartEntity,
            Event::EndEntity(_) => Opcode::EndEntity,
        }
    }

    /// Calls the handler method that corresponds to this event.
    pub fn dispatch<H>(&self, handler: &mut H) -> std::result::Result<(), H::Error>
    where
        H: ContentHandler + ?Sized,
    {
        match self {
            Event::Locator(locator) => handler.set_document_locator(locator.as_locator()),
            Event::StartDocument => handler.start_document(),
            Event::EndDocument => handler.end_document(),
            Event::StartPrefixMapping { prefix, uri } => handler.start_prefix_mapping(prefix, uri),
            Event::EndPrefixMapping { prefix } => handler.end_prefix_mapping(prefix),
            Event::StartElement {
                uri,
                local_name,
                qname,
                attributes,
            } => {
                let attributes: Vec<Attribute> =
                    attributes.iter().map(OwnedAttribute::as_attribute).collect();
                handler.start_element(uri, local_name, qname, Attributes::from(&attributes[..]))
            }
            Event::EndElement {
                uri,
                local_name,
                qname,
            } => handler.end_element(uri, local_name, qname),
            Event::Characters(text) => handler.characters(text),
            Event::IgnorableWhitespace(text) => handler.ignorable_whitespace(text),
            Event::ProcessingInstruction { target, data } => {
                handler.processing_instruction(target, data.as_deref())
            }
            Event::SkippedEntity(name) => handler.skipped_entity(name),
            Event::Comment(text) => handler.comment(text),
            Event::StartCdata => handler.start_cdata(),
            Event::EndCdata => handler.end_cdata(),
            Event::StartDtd {
                name,
                public_id,
                system_id,
            } => handler.start_dtd(name, public_id.as_deref(), system_id.as_deref()),
            Event::EndDtd => handler.end_dtd(),
            Event::StartEntity(name) => handler.start_entity(name),
            Event::EndEntity(name) => handler.end_entity(name),
        }
    }
}

/// Feeds every event of `events` to `handler`, in order.
pub fn dispatch_all<'e, H, I>(events: I, handler: &mut H) -> std::result::Result<(), H::Error>
where
    H: ContentHandler + ?Sized,
    I: IntoIterator<Item = &'e Event>,
{
    events.into_iter().try_for_each(|e| e.dispatch(handler))
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A handler that records every call as an [`Event`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recorder {
    events: Vec<Event>,
}

impl Recorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events recorded so far.
    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consumes the recorder, returning the recorded events.
    #[inline]
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Forgets all recorded events, keeping the allocated storage.
    pub fn recycle(&mut self) {
        self.events.clear();
    }

    #[inline]
    fn push(&mut self, event: Event) -> Result<()> {
        self.events.try_reserve(1)?;
        self.events.push(event);
        Ok(())
    }
}

impl ContentHandler for Recorder {
    type Error = Error;

    fn set_document_locator(&mut self, locator: Locator) -> Result<()> {
        self.push(Event::Locator(locator.into()))
    }

    fn start_document(&mut self) -> Result<()> {
        self.push(Event::StartDocument)
    }

    fn end_document(&mut self) -> Result<()> {
        self.push(Event::EndDocument)
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.push(Event::StartPrefixMapping {
            prefix: prefix.to_owned(),
            uri: uri.to_owned(),
        })
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.push(Event::EndPrefixMapping {
            prefix: prefix.to_owned(),
        })
    }

    fn start_element(
        &mut self,
        uri: &str,
        local_name: &str,
        qname: &str,
        attributes: Attributes,
    ) -> Result<()> {
        self.push(Event::StartElement {
            uri: uri.to_owned(),
            local_name: local_name.to_owned(),
            qname: qname.to_owned(),
            attributes: attributes.iter().map(OwnedAttribute::from).collect(),
        })
    }

    fn end_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result<()> {
        self.push(Event::EndElement {
            uri: uri.to_owned(),
            local_name: local_name.to_owned(),
            qname: qname.to_owned(),
        })
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.push(Event::Characters(text.to_owned()))
    }

    fn ignorable_whitespace(&mut self, text: &str) -> Result<()> {
        self.push(Event::IgnorableWhitespace(text.to_owned()))
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<()> {
        self.push(Event::ProcessingInstruction {
            target: target.to_owned(),
            data: data.map(str::to_owned),
        })
    }

    fn skipped_entity(&mut self, name: &str) -> Result<()> {
        self.push(Event::SkippedEntity(name.to_owned()))
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.push(Event::Comment(text.to_owned()))
    }

    fn start_cdata(&mut self) -> Result<()> {
        self.push(Event::StartCdata)
    }

    fn end_cdata(&mut self) -> Result<()> {
        self.push(Event::EndCdata)
    }

    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<()> {
        self.push(Event::StartDtd {
            name: name.to_owned(),
            public_id: public_id.map(str::to_owned),
            system_id: system_id.map(str::to_owned),
        })
    }

    fn end_dtd(&mut self) -> Result<()> {
        self.push(Event::EndDtd)
    }

    fn start_entity(&mut self, name: &str) -> Result<()> {
        self.push(Event::StartEntity(name.to_owned()))
    }

    fn end_entity(&mut self, name: &str) -> Result<()> {
        self.push(Event::EndEntity(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dispatch_into_recorder_is_identity() {
        let events = vec![
            Event::Locator(OwnedLocator {
                public_id: None,
                system_id: Some("file:///a.xml".to_owned()),
                line: 1,
                column: 1,
            }),
            Event::StartDocument,
            Event::StartPrefixMapping {
                prefix: "x".to_owned(),
                uri: "urn:x".to_owned(),
            },
            Event::StartElement {
                uri: "urn:x".to_owned(),
                local_name: "root".to_owned(),
                qname: "x:root".to_owned(),
                attributes: vec![OwnedAttribute {
                    uri: String::new(),
                    local_name: "id".to_owned(),
                    qname: "id".to_owned(),
                    ty: "ID".to_owned(),
                    value: String::new(),
                }],
            },
            Event::ProcessingInstruction {
                target: "pi".to_owned(),
                data: None,
            },
            Event::EndElement {
                uri: "urn:x".to_owned(),
                local_name: "root".to_owned(),
                qname: "x:root".to_owned(),
            },
            Event::EndPrefixMapping {
                prefix: "x".to_owned(),
            },
            Event::EndDocument,
        ];

        let mut recorder = Recorder::new();
        dispatch_all(&events, &mut recorder).unwrap();
        assert_eq!(recorder.into_events(), events);
    }

    #[test]
    fn opcode_of_events() {
        assert_eq!(Event::start("a").opcode(), Opcode::StartElement);
        assert_eq!(Event::end("a").opcode(), Opcode::EndElement);
        assert_eq!(Event::text("a").opcode(), Opcode::Characters);
        assert_eq!(Event::EndDtd.opcode(), Opcode::EndDtd);
    }

    #[test]
    fn borrowed_views_of_owned_parts() {
        let attribute = OwnedAttribute::from(Attribute::new("a", "1"));
        assert_eq!(attribute.as_attribute(), Attribute::new("a", "1"));

        let locator = OwnedLocator {
            public_id: Some("-//x".to_owned()),
            system_id: None,
            line: 3,
            column: 7,
        };
        assert_eq!(
            locator.as_locator(),
            Locator {
                public_id: Some("-//x"),
                system_id: None,
                line: 3,
                column: 7,
            }
        );
    }

    #[test]
    fn recycle_keeps_nothing() {
        let mut recorder = Recorder::new();
        recorder.characters("a").unwrap();
        recorder.recycle();
        assert!(recorder.events().is_empty());
    }
}
