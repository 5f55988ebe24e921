//! Optional checks of the document grammar.
//!
//! The codec transports whatever sequence of events it is given. When
//! [`Config::check_well_formed`] is set, the [`Compiler`] and the
//! [`Interpreter`] consult a [`WellFormedChecker`] before every record and
//! reject sequences that no well-formed document could produce.
//!
//! [`Config::check_well_formed`]: crate::Config::check_well_formed
//! [`Compiler`]: crate::Compiler
//! [`Interpreter`]: crate::Interpreter

use crate::errors::IllFormedError;
use crate::opcode::Opcode;

type Result = std::result::Result<(), IllFormedError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentState {
    /// No `StartDocument` seen. Fragments live in this state
    NotStarted,
    Started,
    Ended,
}

/// Positions of the name parts of one open element in
/// [`WellFormedChecker::opened_buffer`].
#[derive(Clone, Copy, Debug)]
struct OpenedElement {
    start: usize,
    uri_end: usize,
    local_end: usize,
}

/// Tracks the open constructs of an event stream.
///
/// One method per event kind; each returns an error if the event cannot
/// appear at the current position. State is only updated by events that
/// pass the check.
#[derive(Clone, Debug)]
pub struct WellFormedChecker {
    document: DocumentState,
    /// Names of all currently open elements, concatenated.
    ///
    /// For events `<a xmlns="urn:a"><b>` it contains
    ///
    /// ```text
    /// urn:aaaurn:abb
    /// ^    ^^^    ^^
    /// ```
    ///
    /// that is, for each element its namespace URI, local name and qualified
    /// name, with boundaries stored in [`Self::opened`].
    opened_buffer: String,
    opened: Vec<OpenedElement>,
    /// Prefixes in scope, concatenated, with start indexes in `prefix_starts`
    prefix_buffer: String,
    prefix_starts: Vec<usize>,
    /// Number of open CDATA sections
    cdata: usize,
    in_dtd: bool,
    /// Names of entities being expanded, innermost last
    entities: Vec<String>,
}

impl Default for WellFormedChecker {
    fn default() -> Self {
        Self {
            document: DocumentState::NotStarted,
            opened_buffer: String::new(),
            opened: Vec::new(),
            prefix_buffer: String::new(),
            prefix_starts: Vec::new(),
            cdata: 0,
            in_dtd: false,
            entities: Vec::new(),
        }
    }
}

impl WellFormedChecker {
    /// Creates a checker at the start of a stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the checker to the start of a stream, keeping allocated storage.
    pub fn reset(&mut self) {
        self.document = DocumentState::NotStarted;
        self.opened_buffer.clear();
        self.opened.clear();
        self.prefix_buffer.clear();
        self.prefix_starts.clear();
        self.cdata = 0;
        self.in_dtd = false;
        self.entities.clear();
    }

    /// Returns the number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.opened.len()
    }

    /// Checks an event that opens or closes nothing.
    #[inline]
    pub fn other(&self, opcode: Opcode) -> Result {
        match self.document {
            DocumentState::Ended => Err(IllFormedError::EventAfterEndDocument(opcode)),
            _ => Ok(()),
        }
    }

    /// Checks and records `StartDocument`.
    pub fn start_document(&mut self) -> Result {
        match self.document {
            DocumentState::NotStarted => {
                self.document = DocumentState::Started;
                Ok(())
            }
            DocumentState::Started => Err(IllFormedError::DuplicatedStartDocument),
            DocumentState::Ended => Err(IllFormedError::EventAfterEndDocument(
                Opcode::StartDocument,
            )),
        }
    }

    /// Checks and records `EndDocument`.
    pub fn end_document(&mut self) -> Result {
        match self.document {
            DocumentState::NotStarted => Err(IllFormedError::UnmatchedEndDocument),
            DocumentState::Ended => Err(IllFormedError::EventAfterEndDocument(
                Opcode::EndDocument,
            )),
            DocumentState::Started if !self.opened.is_empty() => Err(
                IllFormedError::EndDocumentWithOpenElements(self.opened.len()),
            ),
            DocumentState::Started if self.open_lexical() > 0 => Err(
                IllFormedError::EndDocumentWithOpenLexical(self.open_lexical()),
            ),
            DocumentState::Started => {
                self.document = DocumentState::Ended;
                Ok(())
            }
        }
    }

    /// Number of open CDATA sections, DTDs and entity expansions.
    #[inline]
    fn open_lexical(&self) -> usize {
        self.cdata + usize::from(self.in_dtd) + self.entities.len()
    }

    /// Checks and records `StartPrefixMapping`.
    pub fn start_prefix_mapping(&mut self, prefix: &str) -> Result {
        self.other(Opcode::StartPrefixMapping)?;
        self.prefix_starts.push(self.prefix_buffer.len());
        self.prefix_buffer.push_str(prefix);
        Ok(())
    }

    /// Checks and records `EndPrefixMapping`. Mappings opened together may be
    /// closed in any order, so the innermost mapping of `prefix` is closed.
    pub fn end_prefix_mapping(&mut self, prefix: &str) -> Result {
        self.other(Opcode::EndPrefixMapping)?;
        let found = (0..self.prefix_starts.len())
            .rev()
            .find(|&i| self.prefix(i) == prefix);
        match found {
            Some(index) => {
                let start = self.prefix_starts.remove(index);
                self.prefix_buffer.replace_range(start..start + prefix.len(), "");
                for s in &mut self.prefix_starts[index..] {
                    *s -= prefix.len();
                }
                Ok(())
            }
            None => Err(IllFormedError::UnmatchedEndPrefixMapping(prefix.to_owned())),
        }
    }

    fn prefix(&self, index: usize) -> &str {
        let start = self.prefix_starts[index];
        let end = self
            .prefix_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.prefix_buffer.len());
        &self.prefix_buffer[start..end]
    }

    /// Checks and records `StartElement`.
    pub fn start_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result {
        self.other(Opcode::StartElement)?;
        let start = self.opened_buffer.len();
        self.opened_buffer.push_str(uri);
        let uri_end = self.opened_buffer.len();
        self.opened_buffer.push_str(local_name);
        let local_end = self.opened_buffer.len();
        self.opened_buffer.push_str(qname);
        self.opened.push(OpenedElement {
            start,
            uri_end,
            local_end,
        });
        Ok(())
    }

    /// Checks and records `EndElement`: the names must be those of the
    /// innermost open element.
    pub fn end_element(&mut self, uri: &str, local_name: &str, qname: &str) -> Result {
        self.other(Opcode::EndElement)?;
        let top = match self.opened.last() {
            Some(top) => *top,
            None => return Err(IllFormedError::UnmatchedEndElement(qname.to_owned())),
        };
        let buffer = &self.opened_buffer;
        let matches = &buffer[top.start..top.uri_end] == uri
            && &buffer[top.uri_end..top.local_end] == local_name
            && &buffer[top.local_end..] == qname;
        if !matches {
            return Err(IllFormedError::MismatchedEndElement {
                expected: buffer[top.local_end..].to_owned(),
                found: qname.to_owned(),
            });
        }
        self.opened.pop();
        self.opened_buffer.truncate(top.start);
        Ok(())
    }

    /// Checks and records `StartCdata`.
    pub fn start_cdata(&mut self) -> Result {
        self.other(Opcode::StartCdata)?;
        self.cdata += 1;
        Ok(())
    }

    /// Checks and records `EndCdata`.
    pub fn end_cdata(&mut self) -> Result {
        self.other(Opcode::EndCdata)?;
        if self.cdata == 0 {
            return Err(IllFormedError::UnmatchedLexicalEnd(Opcode::EndCdata));
        }
        self.cdata -= 1;
        Ok(())
    }

    /// Checks and records `StartDtd`.
    pub fn start_dtd(&mut self) -> Result {
        self.other(Opcode::StartDtd)?;
        self.in_dtd = true;
        Ok(())
    }

    /// Checks and records `EndDtd`.
    pub fn end_dtd(&mut self) -> Result {
        self.other(Opcode::EndDtd)?;
        if !self.in_dtd {
            return Err(IllFormedError::UnmatchedLexicalEnd(Opcode::EndDtd));
        }
        self.in_dtd = false;
        Ok(())
    }

    /// Checks and records `StartEntity`.
    pub fn start_entity(&mut self, name: &str) -> Result {
        self.other(Opcode::StartEntity)?;
        self.entities.push(name.to_owned());
        Ok(())
    }

    /// Checks and records `EndEntity`.
    pub fn end_entity(&mut self, name: &str) -> Result {
        self.other(Opcode::EndEntity)?;
        match self.entities.last() {
            Some(last) if last == name => {
                self.entities.pop();
                Ok(())
            }
            _ => Err(IllFormedError::UnmatchedLexicalEnd(Opcode::EndEntity)),
        }
    }

    /// Checks that nothing is left open at the end of a stream.
    pub fn finish(&self) -> Result {
        let document = self.document == DocumentState::Started;
        let lexical = self.open_lexical();
        if self.opened.is_empty() && self.prefix_starts.is_empty() && lexical == 0 && !document {
            return Ok(());
        }
        Err(IllFormedError::Unclosed {
            elements: self.opened.len(),
            prefixes: self.prefix_starts.len(),
            lexical,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_elements() {
        let mut checker = WellFormedChecker::new();
        checker.start_document().unwrap();
        checker.start_element("urn:a", "a", "a").unwrap();
        checker.start_element("", "b", "b").unwrap();
        assert_eq!(checker.depth(), 2);
        assert_eq!(
            checker.end_element("urn:a", "a", "a"),
            Err(IllFormedError::MismatchedEndElement {
                expected: "b".to_owned(),
                found: "a".to_owned(),
            })
        );
        checker.end_element("", "b", "b").unwrap();
        checker.end_element("urn:a", "a", "a").unwrap();
        checker.end_document().unwrap();
        assert_eq!(checker.finish(), Ok(()));
    }

    #[test]
    fn end_element_compares_namespace() {
        let mut checker = WellFormedChecker::new();
        checker.start_element("urn:a", "x", "p:x").unwrap();
        assert!(checker.end_element("urn:b", "x", "p:x").is_err());
        checker.end_element("urn:a", "x", "p:x").unwrap();
    }

    #[test]
    fn unmatched_end_element() {
        let mut checker = WellFormedChecker::new();
        assert_eq!(
            checker.end_element("", "a", "a"),
            Err(IllFormedError::UnmatchedEndElement("a".to_owned()))
        );
    }

    #[test]
    fn document_bracketing() {
        let mut checker = WellFormedChecker::new();
        assert_eq!(
            checker.end_document(),
            Err(IllFormedError::UnmatchedEndDocument)
        );
        checker.start_document().unwrap();
        assert_eq!(
            checker.start_document(),
            Err(IllFormedError::DuplicatedStartDocument)
        );
        checker.start_element("", "a", "a").unwrap();
        assert_eq!(
            checker.end_document(),
            Err(IllFormedError::EndDocumentWithOpenElements(1))
        );
        checker.end_element("", "a", "a").unwrap();
        checker.end_document().unwrap();
        assert_eq!(
            checker.other(Opcode::Characters),
            Err(IllFormedError::EventAfterEndDocument(Opcode::Characters))
        );
    }

    #[test]
    fn prefix_mappings_close_in_any_order() {
        let mut checker = WellFormedChecker::new();
        checker.start_prefix_mapping("a").unwrap();
        checker.start_prefix_mapping("bb").unwrap();
        checker.start_prefix_mapping("").unwrap();
        checker.end_prefix_mapping("a").unwrap();
        assert_eq!(checker.prefix(0), "bb");
        assert_eq!(checker.prefix(1), "");
        checker.end_prefix_mapping("").unwrap();
        assert_eq!(
            checker.end_prefix_mapping("a"),
            Err(IllFormedError::UnmatchedEndPrefixMapping("a".to_owned()))
        );
        checker.end_prefix_mapping("bb").unwrap();
        assert_eq!(checker.finish(), Ok(()));
    }

    #[test]
    fn unclosed_at_finish() {
        let mut checker = WellFormedChecker::new();
        checker.start_document().unwrap();
        checker.start_prefix_mapping("x").unwrap();
        checker.start_element("", "a", "a").unwrap();
        assert_eq!(
            checker.finish(),
            Err(IllFormedError::Unclosed {
                elements: 1,
                prefixes: 1,
                lexical: 0,
                document: true,
            })
        );
        checker.reset();
        assert_eq!(checker.finish(), Ok(()));
    }

    #[test]
    fn lexical_constructs() {
        let mut checker = WellFormedChecker::new();
        assert!(checker.end_cdata().is_err());
        assert!(checker.end_dtd().is_err());
        checker.start_dtd().unwrap();
        checker.end_dtd().unwrap();
        checker.start_entity("e").unwrap();
        assert_eq!(
            checker.end_entity("f"),
            Err(IllFormedError::UnmatchedLexicalEnd(Opcode::EndEntity))
        );
        checker.end_entity("e").unwrap();
        checker.start_cdata().unwrap();
        checker.end_cdata().unwrap();
    }

    #[test]
    fn end_document_inside_lexical_construct() {
        let mut checker = WellFormedChecker::new();
        checker.start_document().unwrap();
        checker.start_cdata().unwrap();
        assert_eq!(
            checker.end_document(),
            Err(IllFormedError::EndDocumentWithOpenLexical(1))
        );
        checker.end_cdata().unwrap();

        checker.start_dtd().unwrap();
        checker.start_entity("e").unwrap();
        assert_eq!(
            checker.end_document(),
            Err(IllFormedError::EndDocumentWithOpenLexical(2))
        );
        checker.end_entity("e").unwrap();
        checker.end_dtd().unwrap();
        checker.end_document().unwrap();
        assert_eq!(checker.finish(), Ok(()));
    }

    #[test]
    fn open_lexical_at_finish() {
        let mut checker = WellFormedChecker::new();
        checker.start_dtd().unwrap();
        assert_eq!(
            checker.finish(),
            Err(IllFormedError::Unclosed {
                elements: 0,
                prefixes: 0,
                lexical: 1,
                document: false,
            })
        );
        checker.end_dtd().unwrap();
        checker.start_entity("e").unwrap();
        checker.start_cdata().unwrap();
        assert_eq!(
            checker.finish(),
            Err(IllFormedError::Unclosed {
                elements: 0,
                prefixes: 0,
                lexical: 2,
                document: false,
            })
        );
    }
}
