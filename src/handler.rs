//! The content-handler contract that connects event producers and consumers.
//!
//! [`ContentHandler`] is the input side of the [`Compiler`] and the output side
//! of the [`Interpreter`]: anything that produces XML events drives a handler,
//! anything that consumes them implements one.
//!
//! [`Compiler`]: crate::Compiler
//! [`Interpreter`]: crate::Interpreter

use std::fmt::{self, Debug, Formatter};
use std::iter::FusedIterator;
use std::ops::Range;

use crate::codec::str_at;
use crate::errors::Error;

/// A single attribute of a start element event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Attribute<'a> {
    /// Namespace URI, or the empty string if the attribute has no namespace
    pub uri: &'a str,
    /// Local name, without prefix
    pub local_name: &'a str,
    /// Qualified name, with prefix if any
    pub qname: &'a str,
    /// Attribute type as reported by the parser, for example `CDATA` or `ID`
    pub ty: &'a str,
    /// Normalized attribute value
    pub value: &'a str,
}

impl<'a> Attribute<'a> {
    /// Creates a `CDATA` attribute without namespace.
    ///
    /// ```
    /// # use xml_event_codec::Attribute;
    /// let attr = Attribute::new("id", "42");
    /// assert_eq!(attr.local_name, "id");
    /// assert_eq!(attr.ty, "CDATA");
    /// ```
    pub const fn new(qname: &'a str, value: &'a str) -> Self {
        Self {
            uri: "",
            local_name: qname,
            qname,
            ty: "CDATA",
            value,
        }
    }

    /// Creates a `CDATA` attribute in a namespace.
    pub const fn with_namespace(
        uri: &'a str,
        local_name: &'a str,
        qname: &'a str,
        value: &'a str,
    ) -> Self {
        Self {
            uri,
            local_name,
            qname,
            ty: "CDATA",
            value,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Location of one attribute in an encoded stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AttributeRange {
    pub uri: Range<usize>,
    pub local_name: Range<usize>,
    pub qname: Range<usize>,
    pub ty: Range<usize>,
    pub value: Range<usize>,
}

#[derive(Clone, Copy)]
enum Source<'a> {
    List(&'a [Attribute<'a>]),
    /// Attributes still in their encoded form. Every range was validated as
    /// UTF-8 when the record was decoded.
    Encoded {
        bytes: &'a [u8],
        ranges: &'a [AttributeRange],
    },
}

/// An ordered list of attributes passed to [`ContentHandler::start_element`].
///
/// It is either a view over a slice of [`Attribute`]s built by the producer,
/// or over attributes still in their encoded form inside a blob being replayed.
/// In both cases no allocation is needed to pass the list to a handler.
///
/// ```
/// # use xml_event_codec::{Attribute, Attributes};
/// let list = [Attribute::new("a", "1"), Attribute::new("b", "")];
/// let attributes = Attributes::from(&list[..]);
///
/// assert_eq!(attributes.len(), 2);
/// assert_eq!(attributes.get(1).map(|a| a.value), Some(""));
/// assert_eq!(attributes.value_of("", "a"), Some("1"));
/// ```
#[derive(Clone, Copy)]
pub struct Attributes<'a> {
    source: Source<'a>,
}

impl<'a> Attributes<'a> {
    /// An empty attribute list.
    pub const fn empty() -> Self {
        Self {
            source: Source::List(&[]),
        }
    }

    pub(crate) fn encoded(bytes: &'a [u8], ranges: &'a [AttributeRange]) -> Self {
        Self {
            source: Source::Encoded { bytes, ranges },
        }
    }

    /// Returns the number of attributes.
    #[inline]
    pub fn len(&self) -> usize {
        match self.source {
            Source::List(list) => list.len(),
            Source::Encoded { ranges, .. } => ranges.len(),
        }
    }

    /// Returns `true` if there are no attributes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the attribute at `index`, in document order.
    pub fn get(&self, index: usize) -> Option<Attribute<'a>> {
        match self.source {
            Source::List(list) => list.get(index).copied(),
            Source::Encoded { bytes, ranges } => ranges.get(index).map(|r| Attribute {
                uri: str_at(bytes, r.uri.clone()),
                local_name: str_at(bytes, r.local_name.clone()),
                qname: str_at(bytes, r.qname.clone()),
                ty: str_at(bytes, r.ty.clone()),
                value: str_at(bytes, r.value.clone()),
            }),
        }
    }

    /// Returns the value of the attribute with the given namespace and local name.
    pub fn value_of(&self, uri: &str, local_name: &str) -> Option<&'a str> {
        match self.source {
            Source::List(list) => list
                .iter()
                .find(|a| a.uri == uri && a.local_name == local_name)
                .map(|a| a.value),
            Source::Encoded { bytes, ranges } => ranges
                .iter()
                .find(|r| {
                    bytes.get(r.uri.clone()) == Some(uri.as_bytes())
                        && bytes.get(r.local_name.clone()) == Some(local_name.as_bytes())
                })
                .map(|r| str_at(bytes, r.value.clone())),
        }
    }

    /// Returns the value of the attribute with the given qualified name.
    pub fn value_of_qname(&self, qname: &str) -> Option<&'a str> {
        match self.source {
            Source::List(list) => list.iter().find(|a| a.qname == qname).map(|a| a.value),
            Source::Encoded { bytes, ranges } => ranges
                .iter()
                .find(|r| bytes.get(r.qname.clone()) == Some(qname.as_bytes()))
                .map(|r| str_at(bytes, r.value.clone())),
        }
    }

    /// Returns an iterator over the attributes in document order.
    #[inline]
    pub fn iter(&self) -> AttributesIter<'a> {
        AttributesIter {
            attributes: *self,
            index: 0,
        }
    }
}

impl<'a> Default for Attributes<'a> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<'a> From<&'a [Attribute<'a>]> for Attributes<'a> {
    #[inline]
    fn from(list: &'a [Attribute<'a>]) -> Self {
        Self {
            source: Source::List(list),
        }
    }
}

impl<'a, const N: usize> From<&'a [Attribute<'a>; N]> for Attributes<'a> {
    #[inline]
    fn from(list: &'a [Attribute<'a>; N]) -> Self {
        Self::from(&list[..])
    }
}

impl<'a> Debug for Attributes<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> PartialEq for Attributes<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<'a> IntoIterator for Attributes<'a> {
    type Item = Attribute<'a>;
    type IntoIter = AttributesIter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over [`Attributes`], created by [`Attributes::iter`].
#[derive(Clone, Debug)]
pub struct AttributesIter<'a> {
    attributes: Attributes<'a>,
    index: usize,
}

impl<'a> Iterator for AttributesIter<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        let attribute = self.attributes.get(self.index)?;
        self.index += 1;
        Some(attribute)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.attributes.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for AttributesIter<'a> {}
impl<'a> FusedIterator for AttributesIter<'a> {}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Position information a producer may attach to a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Locator<'a> {
    /// Public identifier of the document entity, if known
    pub public_id: Option<&'a str>,
    /// System identifier (usually the URL) of the document entity, if known
    pub system_id: Option<&'a str>,
    /// Line number, starting at 1, or 0 if unknown
    pub line: u64,
    /// Column number, starting at 1, or 0 if unknown
    pub column: u64,
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Receiver of a stream of XML events.
///
/// Producers call the methods in document order. Every method has a default
/// implementation that ignores the event, so a consumer only overrides what
/// it needs. In particular a consumer without the lexical capability simply
/// does not override [`comment`], [`start_cdata`] and the other lexical
/// methods, and those events are dropped when delivered to it.
///
/// Errors returned by a handler abort the producer and are returned to its
/// caller unchanged. The `Error` type must be able to represent the errors of
/// this crate, so that an [`Interpreter`] can report decoding failures through
/// the same channel.
///
/// ```
/// use xml_event_codec::{Attributes, ContentHandler, Error};
///
/// /// Counts elements in a document
/// #[derive(Default)]
/// struct Counter(usize);
///
/// impl ContentHandler for Counter {
///     type Error = Error;
///
///     fn start_element(
///         &mut self,
///         _uri: &str,
///         _local_name: &str,
///         _qname: &str,
///         _attributes: Attributes,
///     ) -> Result<(), Error> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
/// ```
///
/// [`comment`]: ContentHandler::comment
/// [`start_cdata`]: ContentHandler::start_cdata
/// [`Interpreter`]: crate::Interpreter
#[allow(unused_variables)]
pub trait ContentHandler {
    /// Error returned by the handler.
    type Error: From<Error>;

    /// Receives the position of the document being produced.
    fn set_document_locator(&mut self, locator: Locator) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning of a document.
    fn start_document(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// End of a document.
    fn end_document(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning of the scope of a namespace prefix mapping.
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// End of the scope of a namespace prefix mapping.
    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning of an element.
    fn start_element(
        &mut self,
        uri: &str,
        local_name: &str,
        qname: &str,
        attributes: Attributes,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// End of an element.
    fn end_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A run of character data.
    fn characters(&mut self, text: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A run of whitespace in element content that the document type marks
    /// as ignorable.
    fn ignorable_whitespace(&mut self, text: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A processing instruction. `data` is `None` when the instruction has no data.
    fn processing_instruction(
        &mut self,
        target: &str,
        data: Option<&str>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// An entity the producer did not expand.
    fn skipped_entity(&mut self, name: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// A comment. Lexical event.
    fn comment(&mut self, text: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning of a CDATA section. Lexical event.
    fn start_cdata(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// End of a CDATA section. Lexical event.
    fn end_cdata(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning of a document type declaration. Lexical event.
    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// End of a document type declaration. Lexical event.
    fn end_dtd(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Beginning of an entity expansion. Lexical event.
    fn start_entity(&mut self, name: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    /// End of an entity expansion. Lexical event.
    fn end_entity(&mut self, name: &str) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<'h, H: ContentHandler + ?Sized> ContentHandler for &'h mut H {
    type Error = H::Error;

    #[inline]
    fn set_document_locator(&mut self, locator: Locator) -> Result<(), Self::Error> {
        (**self).set_document_locator(locator)
    }
    #[inline]
    fn start_document(&mut self) -> Result<(), Self::Error> {
        (**self).start_document()
    }
    #[inline]
    fn end_document(&mut self) -> Result<(), Self::Error> {
        (**self).end_document()
    }
    #[inline]
    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<(), Self::Error> {
        (**self).start_prefix_mapping(prefix, uri)
    }
    #[inline]
    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<(), Self::Error> {
        (**self).end_prefix_mapping(prefix)
    }
    #[inline]
    fn start_element(
        &mut self,
        uri: &str,
        local_name: &str,
        qname: &str,
        attributes: Attributes,
    ) -> Result<(), Self::Error> {
        (**self).start_element(uri, local_name, qname, attributes)
    }
    #[inline]
    fn end_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result<(), Self::Error> {
        (**self).end_element(uri, local_name, qname)
    }
    #[inline]
    fn characters(&mut self, text: &str) -> Result<(), Self::Error> {
        (**self).characters(text)
    }
    #[inline]
    fn ignorable_whitespace(&mut self, text: &str) -> Result<(), Self::Error> {
        (**self).ignorable_whitespace(text)
    }
    #[inline]
    fn processing_instruction(
        &mut self,
        target: &str,
        data: Option<&str>,
    ) -> Result<(), Self::Error> {
        (**self).processing_instruction(target, data)
    }
    #[inline]
    fn skipped_entity(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).skipped_entity(name)
    }
    #[inline]
    fn comment(&mut self, text: &str) -> Result<(), Self::Error> {
        (**self).comment(text)
    }
    #[inline]
    fn start_cdata(&mut self) -> Result<(), Self::Error> {
        (**self).start_cdata()
    }
    #[inline]
    fn end_cdata(&mut self) -> Result<(), Self::Error> {
        (**self).end_cdata()
    }
    #[inline]
    fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), Self::Error> {
        (**self).start_dtd(name, public_id, system_id)
    }
    #[inline]
    fn end_dtd(&mut self) -> Result<(), Self::Error> {
        (**self).end_dtd()
    }
    #[inline]
    fn start_entity(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).start_entity(name)
    }
    #[inline]
    fn end_entity(&mut self, name: &str) -> Result<(), Self::Error> {
        (**self).end_entity(name)
    }
}
