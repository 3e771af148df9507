//! Read-only adapter over the corpus cross-reference index.
//!
//! The indexer that scans the whole corpus lives with the driver; the
//! expansion engine only consumes its records: per macro name, the known
//! definitions with their formal parameters, optional defaults, bodies,
//! and call sites grouped by calling file. Nothing here mutates the
//! index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wmlx_pos::{FileName, MacroId};

/// One call of a macro: `{NAME positional... name=value...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub lineno: usize,
    /// Positional arguments, argument-grouping parens already removed.
    pub args: Vec<String>,
    pub named_args: BTreeMap<String, String>,
}

impl CallSite {
    pub fn new(lineno: usize, args: &[&str]) -> CallSite {
        CallSite {
            lineno,
            args: args.iter().map(|a| a.to_string()).collect(),
            named_args: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: &str, value: &str) -> CallSite {
        self.named_args.insert(name.to_string(), value.to_string());
        self
    }
}

/// One `#define` record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub filename: FileName,
    /// Line of the `#define`.
    pub lineno: usize,
    /// First line past the definition body.
    pub lineno_end: usize,
    pub body: Vec<String>,
    /// Ordered formal parameters.
    pub args: Vec<String>,
    /// Optional parameters with their default values.
    pub optional_args: BTreeMap<String, String>,
    /// Call sites, grouped by calling file.
    pub references: BTreeMap<FileName, Vec<CallSite>>,
}

impl Definition {
    pub fn new(name: &str, filename: &str, lineno: usize, lineno_end: usize) -> Definition {
        Definition {
            name: name.to_string(),
            filename: filename.to_string(),
            lineno,
            lineno_end,
            body: Vec::new(),
            args: Vec::new(),
            optional_args: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    pub fn formal(mut self, name: &str) -> Definition {
        self.args.push(name.to_string());
        self
    }

    pub fn optional(mut self, name: &str, default: &str) -> Definition {
        self.optional_args
            .insert(name.to_string(), default.to_string());
        self
    }

    pub fn body_line(mut self, line: &str) -> Definition {
        self.body.push(line.to_string());
        self
    }

    pub fn called_from(mut self, file: &str, call: CallSite) -> Definition {
        self.references
            .entry(file.to_string())
            .or_insert_with(Vec::new)
            .push(call);
        self
    }

    pub fn id(&self) -> MacroId {
        MacroId::new(self.name.clone(), self.filename.clone(), self.lineno)
    }

    /// A definition can be substituted into a translatable string only
    /// when its body is a single line containing no double-quote.
    pub fn is_embeddable(&self) -> bool {
        self.lineno + 1 == self.lineno_end && !self.body.iter().any(|line| line.contains('"'))
    }
}

/// The index: macro name to every known definition of that name.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MacroIndex {
    xref: BTreeMap<String, Vec<Definition>>,
}

impl MacroIndex {
    pub fn new() -> MacroIndex {
        MacroIndex {
            xref: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, def: Definition) {
        self.xref
            .entry(def.name.clone())
            .or_insert_with(Vec::new)
            .push(def);
    }

    pub fn get(&self, name: &str) -> Option<&[Definition]> {
        self.xref.get(name).map(|defs| defs.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.xref.contains_key(name)
    }

    /// Resolve a macro identity back to its definition record.
    pub fn get_def(&self, id: &MacroId) -> Option<&Definition> {
        self.xref
            .get(&id.name)?
            .iter()
            .find(|def| def.filename == id.fileref && def.lineno == id.line)
    }

    /// The innermost definition whose `(lineno, lineno_end)` range
    /// strictly contains `line` of `file`, or None when the line is at
    /// the top level.
    pub fn macro_at(&self, file: &str, line: usize) -> Option<MacroId> {
        let mut innermost: Option<&Definition> = None;
        for defs in self.xref.values() {
            for def in defs {
                if def.filename != file {
                    continue;
                }
                if !(def.lineno < line && line < def.lineno_end) {
                    continue;
                }
                if innermost.map_or(true, |found| def.lineno > found.lineno) {
                    innermost = Some(def);
                }
            }
        }
        innermost.map(Definition::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_at_picks_the_innermost_definition() {
        let mut index = MacroIndex::new();
        index.insert(Definition::new("OUTER", "a.cfg", 1, 20));
        index.insert(Definition::new("INNER", "a.cfg", 5, 10));
        index.insert(Definition::new("ELSEWHERE", "b.cfg", 1, 50));

        assert_eq!(
            index.macro_at("a.cfg", 7),
            Some(MacroId::new("INNER", "a.cfg", 5))
        );
        assert_eq!(
            index.macro_at("a.cfg", 12),
            Some(MacroId::new("OUTER", "a.cfg", 1))
        );
        assert_eq!(index.macro_at("a.cfg", 25), None);
        // Range bounds are strict on both sides.
        assert_eq!(index.macro_at("a.cfg", 1), None);
        assert_eq!(
            index.macro_at("a.cfg", 19),
            Some(MacroId::new("OUTER", "a.cfg", 1))
        );
    }

    #[test]
    fn identities_resolve_to_their_records() {
        let mut index = MacroIndex::new();
        index.insert(Definition::new("GREET", "a.cfg", 3, 6).formal("WHOM"));
        index.insert(Definition::new("GREET", "b.cfg", 9, 12));

        let def = index.get_def(&MacroId::new("GREET", "a.cfg", 3)).unwrap();
        assert_eq!(def.args, vec!["WHOM".to_string()]);
        assert!(index.get_def(&MacroId::new("GREET", "a.cfg", 4)).is_none());
    }

    #[test]
    fn embeddability_requires_one_quoteless_line() {
        let single = Definition::new("BRACKET", "a.cfg", 1, 2).body_line("<{TEXT}>");
        assert!(single.is_embeddable());

        let quoted = Definition::new("QUOTED", "a.cfg", 1, 2).body_line("say \"hi\"");
        assert!(!quoted.is_embeddable());

        let long = Definition::new("LONG", "a.cfg", 1, 3)
            .body_line("one")
            .body_line("two");
        assert!(!long.is_embeddable());
    }
}
