//! The main parser interface: building call trees from translatable
//! sentences and from single macro arguments.

use crate::ast::{Ast, NodeId};
use crate::session::ScanSession;

use log::debug;

pub mod elements;

use self::elements::{Element, LineIterator};

/// Callback fired for every completed call node, with its children in
/// place and the node still active.
pub type OnMacro<'a> = &'a mut dyn FnMut(&Ast, NodeId);

/// Build the call tree for `input`.
///
/// Walks the element stream frame by frame: openers descend, closers fill
/// the pending argument span and pop, and an unbalanced closer at the top
/// level is skipped so the brace survives in the surrounding literal. A
/// malformed line bails the parse with a warning and returns whatever
/// tree was built so far.
pub fn parse_ast(sess: &ScanSession, input: &str, mut on_macro: Option<OnMacro<'_>>) -> Ast {
    let mut ast = Ast::new();
    for frame in LineIterator::new(input) {
        let (elems, _scopes) = match frame.parse_elements() {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("element splitter bailed on {:?}: {}", input, e);
                sess.handler()
                    .struct_warn(&format!("cannot split macro elements: {}", e))
                    .emit();
                return ast;
            }
        };
        for elem in elems {
            match elem {
                Element::MacroClose { start } => {
                    // An unmatched close at the top level is tolerated.
                    if ast.active_is_root() {
                        continue;
                    }
                    ast.fill_literals(input, start);
                    if let Some(cb) = on_macro.as_mut() {
                        cb(&ast, ast.active());
                    }
                    ast.close_call(elem.end());
                }
                Element::MacroOpen { name, .. } => {
                    ast.fill_literals(input, elem.start());
                    ast.open_call(name, elem.end());
                }
                Element::Text { .. } => {}
            }
        }
    }
    ast.fill_literals(input, input.len());
    ast
}

/// Parse a translatable sentence, with no interest in its call nodes.
pub fn parse_sentence(sess: &ScanSession, input: &str) -> Ast {
    parse_ast(sess, input, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use std::collections::BTreeMap;
    use wmlx_errors::{Diagnostic, Emitter, Handler};

    struct SilentEmitter;

    impl Emitter for SilentEmitter {
        fn emit(&mut self, _diagnostic: &Diagnostic) {}
    }

    fn sess() -> ScanSession {
        let handler = Handler::with_emitter(true, false, Box::new(SilentEmitter));
        ScanSession::with_handler(handler, "wmlx")
    }

    fn no_args() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn roundtrip(input: &str) -> String {
        let sess = sess();
        parse_sentence(&sess, input).render(&no_args())
    }

    #[test]
    fn root_text_renders_verbatim() {
        for input in &[
            "Hello, world.",
            "Hello, {WHOM}.",
            "spaced   out {A} and {B}  tail",
            "a}b",
            "}",
        ] {
            assert_eq!(roundtrip(input), *input);
        }
    }

    #[test]
    fn argument_whitespace_is_normalized() {
        assert_eq!(roundtrip("{GREET  {MODE}   x}"), "{GREET {MODE} x}");
    }

    #[test]
    fn quoted_and_empty_arguments_survive() {
        assert_eq!(roundtrip(r#"{FOO "hello world"}"#), r#"{FOO "hello world"}"#);
        assert_eq!(roundtrip("{FOO ()}"), "{FOO ()}");
    }

    #[test]
    fn parenthesized_arguments_lose_their_parens() {
        assert_eq!(roundtrip("{FOO (bar)}"), "{FOO bar}");
        // A group containing nested calls is split at the call
        // boundaries; the parens do not survive.
        assert_eq!(
            roundtrip("{GREET {MODE} (very {Q} {W})}"),
            "{GREET {MODE} very {Q} {W}}"
        );
    }

    #[test]
    fn multiline_input_keeps_literals_across_frames() {
        assert_eq!(roundtrip("line one {FOO\nbar} tail"), "line one {FOO bar} tail");
    }

    #[test]
    fn substitution_replaces_bound_calls_only() {
        let sess = sess();
        let ast = parse_sentence(&sess, "Hello, {WHOM} and {OTHER}.");
        let mut args = BTreeMap::new();
        args.insert("WHOM".to_string(), "world".to_string());
        assert_eq!(ast.render(&args), "Hello, world and {OTHER}.");
    }

    #[test]
    fn on_macro_sees_each_completed_call() {
        let sess = sess();
        let mut names = Vec::new();
        let mut cb = |ast: &Ast, id: crate::ast::NodeId| {
            if let NodeKind::Call(ref name) = ast.node(id).kind {
                names.push((name.clone(), ast.node(id).children.is_empty()));
            }
        };
        parse_ast(&sess, "{OUTER {LEAF} x}", Some(&mut cb));
        assert_eq!(
            names,
            vec![("LEAF".to_string(), true), ("OUTER".to_string(), false)]
        );
    }

    #[test]
    fn malformed_line_bails_with_partial_tree() {
        let sess = sess();
        let ast = parse_sentence(&sess, "good text {");
        // Nothing was built before the bail; the warning is the signal.
        assert!(ast.root_children().is_empty());
        assert_eq!(sess.handler().err_count(), 0);
    }

    #[test]
    fn unbalanced_close_does_not_duplicate_text() {
        assert_eq!(roundtrip("a } b {FOO x}"), "a } b {FOO x}");
    }
}
