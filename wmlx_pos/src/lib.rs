//! Source positions for the WML extraction pipeline.
//!
//! The scanner and the expansion engine are line-oriented: everything a
//! diagnostic or a cross-reference needs to point at is a file name and a
//! 1-based line number. Macro definitions additionally carry an identity
//! used as a map key throughout expansion.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File paths are kept as plain strings; the index stores them relative
/// to the corpus root.
pub type FileName = String;

/// A 1-based line position inside a source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Loc {
    pub file: FileName,
    pub line: usize,
}

impl Loc {
    pub fn new<F: Into<FileName>>(file: F, line: usize) -> Loc {
        Loc {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Identity of a macro definition: its name plus the file and line of the
/// `#define` that introduced it.
///
/// Two identities are equal iff all three fields are equal. File
/// references must be corpus-relative to be usable as map keys; an
/// absolute reference denotes the index's own view of a definition and
/// may not be hashed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroId {
    pub name: String,
    pub fileref: FileName,
    pub line: usize,
}

impl MacroId {
    pub fn new<N: Into<String>, F: Into<FileName>>(name: N, fileref: F, line: usize) -> MacroId {
        MacroId {
            name: name.into(),
            fileref: fileref.into(),
            line,
        }
    }

    pub fn is_relative(&self) -> bool {
        !Path::new(&self.fileref).is_absolute()
    }

    /// Resolve the file reference against `root`, yielding an absolute
    /// identity. Absolute identities compare but do not hash.
    pub fn to_abs(&self, root: &Path) -> MacroId {
        let joined: PathBuf = root.join(&self.fileref);
        MacroId {
            name: self.name.clone(),
            fileref: joined.to_string_lossy().into_owned(),
            line: self.line,
        }
    }

    /// Strip `root` from an absolute file reference, yielding the
    /// relative identity used for lookups. Returns the identity unchanged
    /// when the reference does not live under `root`.
    pub fn to_rel(&self, root: &Path) -> MacroId {
        let fileref = match Path::new(&self.fileref).strip_prefix(root) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => self.fileref.clone(),
        };
        MacroId {
            name: self.name.clone(),
            fileref,
            line: self.line,
        }
    }
}

impl std::hash::Hash for MacroId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        assert!(
            self.is_relative(),
            "absolute macro identity used as a map key: {}",
            self
        );
        self.name.hash(state);
        self.fileref.hash(state);
        self.line.hash(state);
    }
}

impl fmt::Display for MacroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.name, self.fileref, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn macro_id_equality_is_field_wise() {
        let a = MacroId::new("GREET", "core/macros.cfg", 12);
        let b = MacroId::new("GREET", "core/macros.cfg", 12);
        let c = MacroId::new("GREET", "core/macros.cfg", 13);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn relative_ids_hash() {
        let mut set = HashSet::new();
        set.insert(MacroId::new("GREET", "core/macros.cfg", 12));
        assert!(set.contains(&MacroId::new("GREET", "core/macros.cfg", 12)));
    }

    #[test]
    #[should_panic(expected = "absolute macro identity")]
    fn absolute_ids_do_not_hash() {
        let mut set = HashSet::new();
        set.insert(MacroId::new("GREET", "/addon/core/macros.cfg", 12));
    }

    #[test]
    fn abs_rel_round_trip() {
        let rel = MacroId::new("GREET", "core/macros.cfg", 12);
        let abs = rel.to_abs(Path::new("/addon"));
        assert!(!abs.is_relative());
        assert_eq!(abs.to_rel(Path::new("/addon")), rel);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Loc::new("a.cfg", 3).to_string(), "a.cfg:3");
        assert_eq!(
            MacroId::new("GREET", "a.cfg", 3).to_string(),
            "GREET@a.cfg:3"
        );
    }
}
