//! The line iterator and the element splitter.
//!
//! The splitter does not interpret the enclosed language: it only finds
//! macro-token structure, classifying each span of a line as a macro
//! opener (`{` followed by an identifier), an end-of-macro marker (`}`),
//! or raw text. Offsets are byte positions into the whole input so that
//! the tree builder can slice literals across line boundaries.

use std::fmt;

use unicode_xid::UnicodeXID;

/// One classified span of a parse frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element<'a> {
    /// `{NAME` - the brace and the macro name, argument lexing follows.
    MacroOpen { name: &'a str, start: usize },
    /// A lone `}`.
    MacroClose { start: usize },
    /// Everything between macro tokens, verbatim.
    Text { span: &'a str, start: usize },
}

impl<'a> Element<'a> {
    pub fn start(&self) -> usize {
        match *self {
            Element::MacroOpen { start, .. }
            | Element::MacroClose { start }
            | Element::Text { start, .. } => start,
        }
    }

    pub fn end(&self) -> usize {
        match *self {
            Element::MacroOpen { name, start } => start + 1 + name.len(),
            Element::MacroClose { start } => start + 1,
            Element::Text { span, start } => start + span.len(),
        }
    }
}

/// A line not yet split into elements, positioned within the input.
#[derive(Clone, Copy, Debug)]
pub struct ParseFrame<'a> {
    pub text: &'a str,
    pub lineno: usize,
    /// Byte offset of the line start within the input.
    pub offset: usize,
}

/// Raised by the strict splitter on a line it cannot classify. The tree
/// builder consumes this as "bail the current parse, keep what was built".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementError {
    pub lineno: usize,
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.lineno, self.message)
    }
}

fn is_name_start(c: char) -> bool {
    UnicodeXID::is_xid_start(c) || c.is_ascii_digit() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    UnicodeXID::is_xid_continue(c)
}

impl<'a> ParseFrame<'a> {
    /// Split the frame into elements. The second return is the scope
    /// list: offsets of openers still unclosed at the end of the frame.
    /// Balanced braces within a single frame nest cleanly.
    pub fn parse_elements(&self) -> Result<(Vec<Element<'a>>, Vec<usize>), ElementError> {
        let mut elements = Vec::new();
        let mut scopes = Vec::new();
        let mut text_start = 0;
        let mut iter = self.text.char_indices().peekable();

        while let Some((i, c)) = iter.next() {
            if c != '{' && c != '}' {
                continue;
            }
            if text_start < i {
                elements.push(Element::Text {
                    span: &self.text[text_start..i],
                    start: self.offset + text_start,
                });
            }
            if c == '}' {
                elements.push(Element::MacroClose {
                    start: self.offset + i,
                });
                scopes.pop();
                text_start = i + 1;
                continue;
            }

            let name_start = i + 1;
            let mut name_end = name_start;
            let mut first = true;
            while let Some(&(j, nc)) = iter.peek() {
                let ok = if first {
                    is_name_start(nc)
                } else {
                    is_name_continue(nc)
                };
                if !ok {
                    break;
                }
                first = false;
                name_end = j + nc.len_utf8();
                iter.next();
            }
            if name_end == name_start {
                return Err(ElementError {
                    lineno: self.lineno,
                    offset: self.offset + i,
                    message: format!("`{{` not followed by a macro name in {:?}", self.text),
                });
            }
            elements.push(Element::MacroOpen {
                name: &self.text[name_start..name_end],
                start: self.offset + i,
            });
            scopes.push(self.offset + i);
            text_start = name_end;
        }

        if text_start < self.text.len() {
            elements.push(Element::Text {
                span: &self.text[text_start..],
                start: self.offset + text_start,
            });
        }
        Ok((elements, scopes))
    }
}

/// Yields a [`ParseFrame`] per non-blank line of the input, with 1-based
/// line numbers and absolute byte offsets.
pub struct LineIterator<'a> {
    input: &'a str,
    offset: usize,
    lineno: usize,
}

impl<'a> LineIterator<'a> {
    pub fn new(input: &'a str) -> LineIterator<'a> {
        LineIterator {
            input,
            offset: 0,
            lineno: 0,
        }
    }
}

impl<'a> Iterator for LineIterator<'a> {
    type Item = ParseFrame<'a>;

    fn next(&mut self) -> Option<ParseFrame<'a>> {
        while self.offset < self.input.len() {
            let start = self.offset;
            let rest = &self.input[start..];
            let (line, advance) = match rest.find('\n') {
                Some(nl) => (&rest[..nl], nl + 1),
                None => (rest, rest.len()),
            };
            self.offset = start + advance;
            self.lineno += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(ParseFrame {
                text: line,
                lineno: self.lineno,
                offset: start,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> ParseFrame<'_> {
        ParseFrame {
            text,
            lineno: 1,
            offset: 0,
        }
    }

    #[test]
    fn classifies_openers_closers_and_text() {
        let (elements, scopes) = frame("a {FOO x} b").parse_elements().unwrap();
        assert_eq!(
            elements,
            vec![
                Element::Text { span: "a ", start: 0 },
                Element::MacroOpen { name: "FOO", start: 2 },
                Element::Text { span: " x", start: 6 },
                Element::MacroClose { start: 8 },
                Element::Text { span: " b", start: 9 },
            ]
        );
        assert!(scopes.is_empty());
    }

    #[test]
    fn nested_openers_scope_cleanly() {
        let (elements, scopes) = frame("{A {B}").parse_elements().unwrap();
        assert_eq!(elements.len(), 4);
        assert_eq!(scopes, vec![0]);
    }

    #[test]
    fn opener_without_a_name_is_malformed() {
        let err = frame("x { y").parse_elements().unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn element_offsets_honor_the_frame_offset() {
        let f = ParseFrame {
            text: "{FOO}",
            lineno: 3,
            offset: 20,
        };
        let (elements, _) = f.parse_elements().unwrap();
        assert_eq!(elements[0].start(), 20);
        assert_eq!(elements[0].end(), 24);
        assert_eq!(elements[1].start(), 24);
    }

    #[test]
    fn line_iterator_skips_blank_lines() {
        let frames: Vec<_> = LineIterator::new("one\n\n  \nfour\n").collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].text, "one");
        assert_eq!(frames[0].lineno, 1);
        assert_eq!(frames[1].text, "four");
        assert_eq!(frames[1].lineno, 4);
        assert_eq!(frames[1].offset, 8);
    }
}
