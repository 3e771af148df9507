use crate::Level;
use crate::Loc;

use serde::{Deserialize, Serialize};

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub loc: Option<Loc>,
    pub children: Vec<SubDiagnostic>,
}

/// For example a note attached to an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubDiagnostic {
    pub level: Level,
    pub message: String,
    pub loc: Option<Loc>,
}

impl Diagnostic {
    pub fn new(level: Level, message: &str) -> Self {
        Diagnostic {
            level,
            message: message.to_owned(),
            loc: None,
            children: vec![],
        }
    }

    /// Mark the record as withdrawn; emitters skip cancelled records
    /// and the builder's drop check accepts them.
    pub fn cancel(&mut self) {
        self.level = Level::Cancelled;
    }

    pub fn cancelled(&self) -> bool {
        self.level == Level::Cancelled
    }

    pub fn is_fatal(&self) -> bool {
        self.level == Level::Fatal
    }

    pub fn set_loc(&mut self, loc: Loc) -> &mut Self {
        self.loc = Some(loc);
        self
    }

    pub fn note(&mut self, msg: &str) -> &mut Self {
        self.sub(Level::Note, msg, None);
        self
    }

    pub fn loc_note(&mut self, loc: Loc, msg: &str) -> &mut Self {
        self.sub(Level::Note, msg, Some(loc));
        self
    }

    pub fn help(&mut self, msg: &str) -> &mut Self {
        self.sub(Level::Help, msg, None);
        self
    }

    fn sub(&mut self, level: Level, message: &str, loc: Option<Loc>) {
        self.children.push(SubDiagnostic {
            level,
            message: message.to_owned(),
            loc,
        });
    }
}
