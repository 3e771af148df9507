//! Chained construction of diagnostics.

use std::fmt;
use std::mem;
use std::thread::panicking;

use crate::{Diagnostic, Handler, Level, Loc};

/// A diagnostic being assembled against its handler.
///
/// Chaining ends in [`emit`], which counts hard errors, hands the
/// finished record to the handler's emitter, and leaves the builder
/// spent. A builder that goes out of scope still live is a programming
/// error; the drop glue reports it as a bug so no diagnostic can be
/// lost silently.
///
/// [`emit`]: DiagnosticBuilder::emit
#[must_use]
pub struct DiagnosticBuilder<'a> {
    handler: &'a Handler,
    diagnostic: Diagnostic,
}

impl<'a> DiagnosticBuilder<'a> {
    pub(crate) fn new(handler: &'a Handler, level: Level, message: &str) -> DiagnosticBuilder<'a> {
        DiagnosticBuilder {
            handler,
            diagnostic: Diagnostic::new(level, message),
        }
    }

    /// The record as assembled so far.
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    pub fn level(&self) -> Level {
        self.diagnostic.level
    }

    pub fn message(&self) -> &str {
        &self.diagnostic.message
    }

    pub fn set_loc(&mut self, loc: Loc) -> &mut Self {
        self.diagnostic.set_loc(loc);
        self
    }

    pub fn note(&mut self, msg: &str) -> &mut Self {
        self.diagnostic.note(msg);
        self
    }

    pub fn loc_note(&mut self, loc: Loc, msg: &str) -> &mut Self {
        self.diagnostic.loc_note(loc, msg);
        self
    }

    pub fn help(&mut self, msg: &str) -> &mut Self {
        self.diagnostic.help(msg);
        self
    }

    /// Withdraw the diagnostic. Nothing is reported, and the drop check
    /// is satisfied.
    pub fn cancel(&mut self) {
        self.diagnostic.cancel();
    }

    pub fn cancelled(&self) -> bool {
        self.diagnostic.cancelled()
    }

    /// Finish the chain. Bugs, fatals and errors bump the handler's
    /// error count before the record reaches the emitter; a spent or
    /// cancelled builder emits nothing, so calling this twice is
    /// harmless.
    pub fn emit(&mut self) {
        if self.diagnostic.cancelled() {
            return;
        }
        let level = self.diagnostic.level;
        if matches!(level, Level::Bug | Level::Fatal | Level::Error) {
            self.handler.bump_err_count();
        }
        self.handler.emit_diagnostic(&self.diagnostic);
        self.diagnostic.cancel();
        if level == Level::Error {
            self.handler.panic_if_treat_err_as_bug();
        }
    }

    /// Detach the record without emitting it, for callers that route
    /// diagnostics somewhere other than the handler's emitter. A spent
    /// record takes its place, keeping the drop check quiet.
    pub fn take_diagnostic(mut self) -> Diagnostic {
        let spent = Diagnostic::new(Level::Cancelled, "");
        mem::replace(&mut self.diagnostic, spent)
    }
}

impl<'a> fmt::Debug for DiagnosticBuilder<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.diagnostic, f)
    }
}

impl<'a> Drop for DiagnosticBuilder<'a> {
    fn drop(&mut self) {
        if self.cancelled() || panicking() {
            return;
        }
        DiagnosticBuilder::new(
            self.handler,
            Level::Bug,
            "diagnostic was built but never emitted",
        )
        .emit();
        panic!("dropped an unfinished diagnostic");
    }
}
