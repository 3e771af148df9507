//! Diagnostic reporting for the extraction pipeline.
//!
//! The scanner and the expansion driver report everything through a
//! [`Handler`]: structural errors with a source location, soft expansion
//! faults as warnings, and internal invariant violations as bugs. The
//! handler counts hard errors and forwards rendered diagnostics to an
//! [`Emitter`].

use std::cell::{Cell, RefCell};
use std::fmt;

pub use wmlx_pos::{FileName, Loc};

use serde::{Deserialize, Serialize};

pub mod emitter;
mod diagnostic;
mod diagnostic_builder;

pub use crate::diagnostic::{Diagnostic, SubDiagnostic};
pub use crate::diagnostic_builder::DiagnosticBuilder;
pub use crate::emitter::{ColorConfig, Emitter, EmitterWriter};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Level {
    Bug,
    Fatal,
    Error,
    Warning,
    Note,
    Help,
    Cancelled,
}

impl Level {
    pub fn to_str(self) -> &'static str {
        match self {
            Level::Bug => "error: internal error",
            Level::Fatal | Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
            Level::Help => "help",
            Level::Cancelled => panic!("shouldn't call on cancelled diagnostic"),
        }
    }

    pub fn color(self) -> term::color::Color {
        match self {
            Level::Bug | Level::Fatal | Level::Error => term::color::BRIGHT_RED,
            Level::Warning => term::color::BRIGHT_YELLOW,
            Level::Note => term::color::BRIGHT_GREEN,
            Level::Help => term::color::BRIGHT_CYAN,
            Level::Cancelled => unreachable!(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Signals an unrecoverable condition; the caller is expected to abort
/// the current input.
#[derive(Copy, Clone, Debug)]
pub struct FatalError;

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "extraction fatal error")
    }
}

impl std::error::Error for FatalError {}

/// A handler deals with errors; certain errors (fatal, bug) may cause
/// immediate exit, others log errors for later reporting.
pub struct Handler {
    err_count: Cell<usize>,
    emitter: RefCell<Box<dyn Emitter>>,
    pub can_emit_warnings: bool,
    treat_err_as_bug: bool,
}

impl Handler {
    pub fn with_tty_emitter(color_config: ColorConfig, can_emit_warnings: bool) -> Handler {
        let emitter = Box::new(EmitterWriter::stderr(color_config));
        Handler::with_emitter(can_emit_warnings, false, emitter)
    }

    pub fn with_emitter(
        can_emit_warnings: bool,
        treat_err_as_bug: bool,
        emitter: Box<dyn Emitter>,
    ) -> Handler {
        Handler {
            err_count: Cell::new(0),
            emitter: RefCell::new(emitter),
            can_emit_warnings,
            treat_err_as_bug,
        }
    }

    pub fn struct_warn(&self, msg: &str) -> DiagnosticBuilder<'_> {
        let mut result = DiagnosticBuilder::new(self, Level::Warning, msg);
        if !self.can_emit_warnings {
            result.cancel();
        }
        result
    }

    pub fn struct_loc_warn(&self, loc: Loc, msg: &str) -> DiagnosticBuilder<'_> {
        let mut result = self.struct_warn(msg);
        result.set_loc(loc);
        result
    }

    pub fn struct_err(&self, msg: &str) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder::new(self, Level::Error, msg)
    }

    pub fn struct_loc_err(&self, loc: Loc, msg: &str) -> DiagnosticBuilder<'_> {
        let mut result = self.struct_err(msg);
        result.set_loc(loc);
        result
    }

    pub fn struct_fatal(&self, msg: &str) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder::new(self, Level::Fatal, msg)
    }

    pub fn warn(&self, msg: &str) {
        self.struct_warn(msg).emit();
    }

    pub fn loc_warn(&self, loc: Loc, msg: &str) {
        self.struct_loc_warn(loc, msg).emit();
    }

    pub fn err(&self, msg: &str) {
        self.struct_err(msg).emit();
    }

    pub fn loc_err(&self, loc: Loc, msg: &str) {
        self.struct_loc_err(loc, msg).emit();
    }

    pub fn fatal(&self, msg: &str) -> FatalError {
        self.struct_fatal(msg).emit();
        FatalError
    }

    pub fn note(&self, msg: &str) {
        DiagnosticBuilder::new(self, Level::Note, msg).emit();
    }

    /// Report an internal invariant violation. The caller abandons the
    /// current input afterwards.
    pub fn bug(&self, msg: &str) -> FatalError {
        DiagnosticBuilder::new(self, Level::Bug, msg).emit();
        FatalError
    }

    pub fn loc_bug(&self, loc: Loc, msg: &str) -> FatalError {
        let mut db = DiagnosticBuilder::new(self, Level::Bug, msg);
        db.set_loc(loc);
        db.emit();
        FatalError
    }

    pub fn bump_err_count(&self) {
        self.err_count.set(self.err_count.get() + 1);
    }

    pub fn err_count(&self) -> usize {
        self.err_count.get()
    }

    pub fn has_errors(&self) -> bool {
        self.err_count.get() > 0
    }

    pub fn abort_if_errors(&self) -> Result<(), FatalError> {
        let s = match self.err_count.get() {
            0 => return Ok(()),
            1 => "aborting due to previous error".to_string(),
            count => format!("aborting due to {} previous errors", count),
        };
        Err(self.fatal(&s))
    }

    pub(crate) fn panic_if_treat_err_as_bug(&self) {
        if self.treat_err_as_bug {
            panic!("encountered error with treat-err-as-bug enabled");
        }
    }

    pub(crate) fn emit_diagnostic(&self, diagnostic: &Diagnostic) {
        self.emitter.borrow_mut().emit(diagnostic);
    }
}
