//! The macro-call tree built from a translatable sentence or a single
//! macro argument.
//!
//! Nodes live in an arena owned by the tree; parent links and the active
//! cursor are indices, so walks never chase owning references and the
//! search cursors can be updated without interior mutability.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Arguments are lexed from the span between two macro tokens:
/// parenthesized spans verbatim (contents, possibly empty), then quoted
/// spans, then bare words - in that priority.
static ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\(([^)]*)\)|".+?"|\w+"#).unwrap());

pub type NodeId = usize;

pub const ROOT: NodeId = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// A verbatim text span; never has children.
    Literal(String),
    /// A macro call; children are its positional arguments in order.
    Call(String),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub parent: NodeId,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    /// Offset past the last consumed token; literals fill from here.
    pub(crate) search: usize,
}

#[derive(Clone, Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    active: NodeId,
}

impl Ast {
    pub fn new() -> Ast {
        Ast {
            nodes: vec![Node {
                parent: ROOT,
                kind: NodeKind::Root,
                children: Vec::new(),
                search: 0,
            }],
            active: ROOT,
        }
    }

    /// Wrap a plain string as a single-literal tree.
    pub fn literal(value: &str) -> Ast {
        let mut ast = Ast::new();
        ast.push_literal(ROOT, value);
        ast
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn active(&self) -> NodeId {
        self.active
    }

    pub fn active_is_root(&self) -> bool {
        self.active == ROOT
    }

    pub fn root_children(&self) -> &[NodeId] {
        &self.nodes[ROOT].children
    }

    fn push_literal(&mut self, parent: NodeId, value: &str) {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent,
            kind: NodeKind::Literal(value.to_string()),
            children: Vec::new(),
            search: 0,
        });
        self.nodes[parent].children.push(id);
    }

    /// Open a macro call under the active node and descend into it.
    /// `search` is the offset just past the opener token.
    pub fn open_call(&mut self, name: &str, search: usize) {
        let id = self.nodes.len();
        let parent = self.active;
        self.nodes.push(Node {
            parent,
            kind: NodeKind::Call(name.to_string()),
            children: Vec::new(),
            search,
        });
        self.nodes[parent].children.push(id);
        self.active = id;
    }

    /// Pop the active cursor to its parent and move the parent's search
    /// cursor past the close marker.
    pub fn close_call(&mut self, end: usize) {
        let parent = self.nodes[self.active].parent;
        self.active = parent;
        self.nodes[parent].search = end;
    }

    /// Turn the span between the active search cursor and `end` into
    /// literal children. At the root the span is kept verbatim; inside a
    /// call's argument list whitespace is dropped and each argument
    /// becomes its own literal.
    pub fn fill_literals(&mut self, input: &str, end: usize) {
        let start = self.nodes[self.active].search;
        if start >= end {
            return;
        }
        let span = &input[start..end];
        if self.active == ROOT {
            self.push_literal(ROOT, span);
            return;
        }
        let parent = self.active;
        for caps in ARG_RE.captures_iter(span) {
            let value = match caps.get(1) {
                Some(inner) => inner.as_str(),
                None => caps.get(0).unwrap().as_str(),
            };
            self.push_literal(parent, value);
        }
    }

    /// Materialize the tree: literals verbatim (an empty literal in
    /// argument position renders `()`), bound calls substituted, unbound
    /// calls re-emitted as `{NAME arg1 .. argN}`.
    pub fn render(&self, args: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        self.render_node(ROOT, args, &mut out);
        out
    }

    fn render_node(&self, id: NodeId, args: &BTreeMap<String, String>, out: &mut String) {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::Root => {
                for &child in &node.children {
                    self.render_node(child, args, out);
                }
            }
            NodeKind::Literal(ref value) => {
                let in_args = matches!(self.nodes[node.parent].kind, NodeKind::Call(_));
                if value.is_empty() && in_args {
                    out.push_str("()");
                } else {
                    out.push_str(value);
                }
            }
            NodeKind::Call(ref name) => {
                if let Some(bound) = args.get(name) {
                    out.push_str(bound);
                    return;
                }
                out.push('{');
                out.push_str(name);
                for &child in &node.children {
                    out.push(' ');
                    self.render_node(child, args, out);
                }
                out.push('}');
            }
        }
    }
}

impl Default for Ast {
    fn default() -> Ast {
        Ast::new()
    }
}
