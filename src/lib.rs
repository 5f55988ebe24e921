//! Compact binary codec for streams of SAX-like XML events.
//!
//! Re-parsing the same XML document over and over is wasteful when what a
//! pipeline really needs is the sequence of events a parser produced. This
//! crate records that sequence once, as a compact binary [`Blob`], and
//! replays it later, as many times as needed, without touching a parser:
//!
//! - the [`Compiler`] is a [`ContentHandler`]: drive it with events (from a
//!   parser, from code, from another replay) and it appends one record per
//!   event to its buffer;
//! - the [`Interpreter`] reads a blob record by record and calls a bound
//!   [`ContentHandler`] with exactly the calls that produced it, in the same
//!   order.
//!
//! Both are meant to be long-lived: [`Compiler::recycle`] and
//! [`Interpreter::recycle`] reset them between documents while keeping
//! allocated buffers.
//!
//! # Example
//!
//! ```
//! use xml_event_codec::events::{Event, Recorder};
//! use xml_event_codec::{Attribute, Attributes, Compiler, ContentHandler, Interpreter};
//!
//! let mut compiler = Compiler::new();
//! compiler.start_document()?;
//! compiler.start_prefix_mapping("x", "urn:x")?;
//! compiler.start_element(
//!     "urn:x",
//!     "item",
//!     "x:item",
//!     Attributes::from(&[Attribute::new("id", "42")]),
//! )?;
//! compiler.characters("caf\u{e9}")?;
//! compiler.end_element("urn:x", "item", "x:item")?;
//! compiler.end_prefix_mapping("x")?;
//! compiler.end_document()?;
//! let blob = compiler.output();
//!
//! let mut interpreter = Interpreter::with_consumer(Recorder::new());
//! interpreter.deserialize(&blob)?;
//! let events = interpreter.into_consumer().unwrap().into_events();
//!
//! assert_eq!(events.len(), 7);
//! assert_eq!(events[3], Event::text("caf\u{e9}"));
//! # Ok::<(), xml_event_codec::Error>(())
//! ```
//!
//! # Format
//!
//! A blob is a plain concatenation of records with no header or trailer.
//! Each record is an [`Opcode`] byte followed by the fields of the event.
//! See the [`codec`] module for the encoding of fields. The format is not
//! self-describing: a blob can only be read by a decoder with the same
//! [`FORMAT_VERSION`].
//!
//! # Features
//!
//! `xml-event-codec` supports the following features:
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!(
        // Replicates the default format, but adds an anchor to the feature
        feature_label = "<a id=\"{feature}\" href=\"#{feature}\"><strong><code>{feature}</code></strong></a>"
    ))
)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
// Enable feature requirements in the docs from 1.57
// See https://stackoverflow.com/questions/61417452
#![cfg_attr(docs_rs, feature(doc_auto_cfg))]

#[macro_use]
extern crate log;

mod blob;
pub mod checker;
pub mod codec;
mod compiler;
mod config;
pub mod errors;
pub mod events;
mod handler;
mod interpreter;
pub mod opcode;
mod utils;

// reexports
pub use crate::blob::Blob;
pub use crate::compiler::Compiler;
pub use crate::config::Config;
pub use crate::errors::{DecodeError, EncodeError, Error, IllFormedError, MisuseError, Result};
pub use crate::events::{Event, Recorder};
pub use crate::handler::{Attribute, Attributes, AttributesIter, ContentHandler, Locator};
pub use crate::interpreter::Interpreter;
pub use crate::opcode::{Opcode, FORMAT_VERSION};
