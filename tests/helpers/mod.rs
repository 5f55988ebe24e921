//! Utility functions for integration tests

#![allow(dead_code)]

use xml_event_codec::events::{dispatch_all, Event, OwnedAttribute, OwnedLocator};
use xml_event_codec::{Blob, Compiler, Interpreter, Recorder};

/// Creates an attribute without namespace
pub fn attr(name: &str, value: &str) -> OwnedAttribute {
    OwnedAttribute {
        uri: String::new(),
        local_name: name.to_owned(),
        qname: name.to_owned(),
        ty: "CDATA".to_owned(),
        value: value.to_owned(),
    }
}

/// Creates a start element event in a namespace
pub fn start_ns(uri: &str, local_name: &str, qname: &str, attributes: Vec<OwnedAttribute>) -> Event {
    Event::StartElement {
        uri: uri.to_owned(),
        local_name: local_name.to_owned(),
        qname: qname.to_owned(),
        attributes,
    }
}

/// Creates an end element event in a namespace
pub fn end_ns(uri: &str, local_name: &str, qname: &str) -> Event {
    Event::EndElement {
        uri: uri.to_owned(),
        local_name: local_name.to_owned(),
        qname: qname.to_owned(),
    }
}

/// Events of a small well-formed document that uses every kind of event.
///
/// ```xml
/// <!DOCTYPE catalog SYSTEM "catalog.dtd">
/// <!-- generated -->
/// <?render fast?>
/// <catalog xmlns="urn:catalog" xmlns:x="urn:x" version="2">
///   <x:item id="1" x:state="">caf&#xE9; &amp; <![CDATA[<raw>]]>&ent;&skipped;</x:item>
///   <empty/>
/// </catalog>
/// ```
pub fn sample_document() -> Vec<Event> {
    vec![
        Event::Locator(OwnedLocator {
            public_id: None,
            system_id: Some("file:///catalog.xml".to_owned()),
            line: 1,
            column: 1,
        }),
        Event::StartDocument,
        Event::StartDtd {
            name: "catalog".to_owned(),
            public_id: None,
            system_id: Some("catalog.dtd".to_owned()),
        },
        Event::EndDtd,
        Event::Comment(" generated ".to_owned()),
        Event::ProcessingInstruction {
            target: "render".to_owned(),
            data: Some("fast".to_owned()),
        },
        Event::StartPrefixMapping {
            prefix: String::new(),
            uri: "urn:catalog".to_owned(),
        },
        Event::StartPrefixMapping {
            prefix: "x".to_owned(),
            uri: "urn:x".to_owned(),
        },
        start_ns("urn:catalog", "catalog", "catalog", vec![attr("version", "2")]),
        Event::IgnorableWhitespace("\n  ".to_owned()),
        start_ns(
            "urn:x",
            "item",
            "x:item",
            vec![
                attr("id", "1"),
                OwnedAttribute {
                    uri: "urn:x".to_owned(),
                    local_name: "state".to_owned(),
                    qname: "x:state".to_owned(),
                    ty: "CDATA".to_owned(),
                    value: String::new(),
                },
            ],
        ),
        Event::text("caf\u{e9} & "),
        Event::StartCdata,
        Event::text("<raw>"),
        Event::EndCdata,
        Event::StartEntity("ent".to_owned()),
        Event::text("entity text"),
        Event::EndEntity("ent".to_owned()),
        Event::SkippedEntity("skipped".to_owned()),
        end_ns("urn:x", "item", "x:item"),
        Event::IgnorableWhitespace("\n  ".to_owned()),
        start_ns("urn:catalog", "empty", "empty", Vec::new()),
        end_ns("urn:catalog", "empty", "empty"),
        Event::IgnorableWhitespace("\n".to_owned()),
        end_ns("urn:catalog", "catalog", "catalog"),
        Event::EndPrefixMapping {
            prefix: "x".to_owned(),
        },
        Event::EndPrefixMapping {
            prefix: String::new(),
        },
        Event::EndDocument,
    ]
}

/// Compiles `events` with a fresh compiler
pub fn compile(events: &[Event]) -> Blob {
    let mut compiler = Compiler::new();
    dispatch_all(events, &mut compiler).expect("compile failed");
    compiler.into_blob()
}

/// Replays `blob` with a fresh interpreter and returns the delivered events
pub fn replay(blob: &[u8]) -> Vec<Event> {
    let mut interpreter = Interpreter::with_consumer(Recorder::new());
    interpreter.deserialize(blob).expect("replay failed");
    interpreter
        .into_consumer()
        .expect("consumer is bound")
        .into_events()
}
