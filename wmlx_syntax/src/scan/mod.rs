//! The character-level scanner: a deterministic state dispatcher that
//! walks configuration source line by line and reports completed strings
//! to a collector.
//!
//! All scan state lives in an explicit [`ScannerContext`] passed by
//! mutable reference into every state action; the states themselves are
//! stateless. The dispatcher tries the current state's pattern against
//! the remaining line: on a match the action consumes text and names the
//! next state, on a miss the dispatcher jumps to the state's fallback.
//! When an action returns no remaining text the machine advances to the
//! next input line.

use log::debug;
use wmlx_errors::{FatalError, Handler, Loc};
use wmlx_pos::FileName;

use crate::catalog::{ExtractedString, StringFlags, StringSink};
use crate::session::ScanSession;

pub mod states;

pub use self::states::StateId;

/// Tokenizer for the embedded scripting language. The core hands over
/// after the `<<` that opens a script block; the delegate consumes text
/// until the block closes and returns the unconsumed remainder of that
/// line, or `None` while the block stays open (subsequent whole lines
/// arrive through `resume`).
pub trait ScriptScanner {
    fn enter(&mut self, text: &str, lineno: usize) -> Option<String>;
    fn resume(&mut self, line: &str, lineno: usize) -> Option<String>;
}

/// Fallback delegate for drivers without an embedded-language tokenizer:
/// skips everything up to the closing `>>`.
#[derive(Debug, Default)]
pub struct SkipScript;

impl ScriptScanner for SkipScript {
    fn enter(&mut self, text: &str, _lineno: usize) -> Option<String> {
        text.find(">>").map(|at| text[at + 2..].to_string())
    }

    fn resume(&mut self, line: &str, lineno: usize) -> Option<String> {
        self.enter(line, lineno)
    }
}

/// An in-progress string capture.
#[derive(Clone, Debug)]
pub struct PendingString {
    pub lineno: usize,
    pub body: String,
    pub flags: StringFlags,
}

impl PendingString {
    fn new(
        lineno: usize,
        body: &str,
        multiline: bool,
        translatable: bool,
        raw: bool,
    ) -> PendingString {
        let mut flags = StringFlags::empty();
        if multiline {
            flags.insert(StringFlags::MULTILINE);
        }
        if translatable {
            flags.insert(StringFlags::TRANSLATABLE);
        }
        if raw {
            flags.insert(StringFlags::RAW);
        }
        PendingString {
            lineno,
            body: body.to_string(),
            flags,
        }
    }

    /// Append a continuation line to the body.
    pub fn addline(&mut self, line: &str) {
        self.body.push('\n');
        self.body.push_str(line);
        self.flags.insert(StringFlags::MULTILINE);
    }
}

/// The scan state of one input file.
pub struct ScannerContext<'a> {
    pub file: FileName,
    pub domain: String,
    pub pending: Option<PendingString>,
    pub added_info: Vec<String>,
    pub override_info: Vec<String>,
    /// Open `#define` frame: name and line.
    pub pending_macro: Option<(String, usize)>,
    /// Attribute name a captured string belongs to, when the capture came
    /// from an informational assignment.
    pub info_type: Option<String>,
    pub on_script_tag: bool,
    /// Opened tags, innermost last, entries of the form `[name]`.
    pub tag_stack: Vec<String>,
    sess: &'a ScanSession,
    sink: &'a mut dyn StringSink,
    script: &'a mut dyn ScriptScanner,
}

impl<'a> ScannerContext<'a> {
    pub fn new<F: Into<FileName>>(
        sess: &'a ScanSession,
        file: F,
        sink: &'a mut dyn StringSink,
        script: &'a mut dyn ScriptScanner,
    ) -> ScannerContext<'a> {
        ScannerContext {
            file: file.into(),
            domain: sess.default_domain.clone(),
            pending: None,
            added_info: Vec::new(),
            override_info: Vec::new(),
            pending_macro: None,
            info_type: None,
            on_script_tag: false,
            tag_stack: Vec::new(),
            sess,
            sink,
            script,
        }
    }

    pub fn handler(&self) -> &Handler {
        self.sess.handler()
    }

    pub(crate) fn loc(&self, lineno: usize) -> Loc {
        Loc::new(self.file.clone(), lineno)
    }

    pub(crate) fn open_string(
        &mut self,
        lineno: usize,
        body: &str,
        multiline: bool,
        translatable: bool,
        raw: bool,
    ) {
        self.pending = Some(PendingString::new(lineno, body, multiline, translatable, raw));
    }

    /// Commit the pending string, if any, snapshotting the scan state.
    pub(crate) fn store_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(
                "storing string from {}:{} ({} bytes)",
                self.file,
                pending.lineno,
                pending.body.len()
            );
            let string = ExtractedString {
                text: pending.body,
                lineno: pending.lineno,
                flags: pending.flags,
                domain: self.domain.clone(),
                tags: self.tag_stack.clone(),
                added_info: std::mem::take(&mut self.added_info),
                override_info: std::mem::take(&mut self.override_info),
                attribute: self.info_type.take(),
            };
            self.sink.emit_string(string);
        }
    }

    pub(crate) fn add_attribute(&mut self, info: &str, lineno: usize) {
        self.sink.add_attribute(info, lineno);
    }

    pub(crate) fn close_tag(&mut self, name: &str, lineno: usize) {
        let closing = format!("[{}]", name);
        match self.tag_stack.last() {
            Some(top) if *top == closing => {
                self.tag_stack.pop();
            }
            Some(top) => {
                let msg = format!("[/{}] closes {}, which is not the innermost open tag", name, top);
                self.handler().struct_loc_warn(self.loc(lineno), &msg).emit();
                self.tag_stack.pop();
            }
            None => {
                let msg = format!("[/{}] does not close any open tag", name);
                self.handler().struct_loc_warn(self.loc(lineno), &msg).emit();
            }
        }
    }

    pub(crate) fn script_enter(&mut self, text: &str, lineno: usize) -> Option<String> {
        self.script.enter(text, lineno)
    }

    pub(crate) fn script_resume(&mut self, line: &str, lineno: usize) -> Option<String> {
        self.script.resume(line, lineno)
    }
}

/// The state dispatcher. State persists across lines so that multiline
/// strings and script blocks continue where they left off.
pub struct Machine {
    state: StateId,
}

impl Machine {
    pub fn new() -> Machine {
        Machine {
            state: StateId::Idle,
        }
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn scan_line(
        &mut self,
        ctx: &mut ScannerContext<'_>,
        line: &str,
        lineno: usize,
    ) -> Result<(), FatalError> {
        let mut text: Option<String> = Some(line.to_string());
        while let Some(current) = text {
            let state = self.state;
            match state.pattern() {
                Some(re) => match re.captures(&current) {
                    Some(caps) => {
                        let (rest, next) = states::run(state, ctx, &current, lineno, Some(&caps))?;
                        text = rest;
                        self.state = next;
                    }
                    None => {
                        self.state = state.fallback();
                        text = Some(current);
                    }
                },
                None => {
                    let (rest, next) = states::run(state, ctx, &current, lineno, None)?;
                    text = rest;
                    self.state = next;
                }
            }
        }
        Ok(())
    }

    /// End-of-file teardown: commit the pending string and report
    /// anything left open.
    pub fn finish(&mut self, ctx: &mut ScannerContext<'_>, last_lineno: usize) {
        ctx.store_pending();
        if let Some((name, line)) = ctx.pending_macro.take() {
            let msg = format!("#define {} has no #enddef before end of file", name);
            ctx.handler()
                .struct_loc_warn(Loc::new(ctx.file.clone(), line), &msg)
                .emit();
        }
        let open: Vec<String> = ctx.tag_stack.drain(..).collect();
        for tag in open.into_iter().rev() {
            let msg = format!("{} is still open at end of file", tag);
            ctx.handler()
                .struct_loc_warn(ctx.loc(last_lineno), &msg)
                .emit();
        }
        ctx.on_script_tag = false;
        self.state = StateId::Idle;
    }
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}

/// Scan a whole pre-loaded buffer, line by line with 1-based numbering.
pub fn scan_source(ctx: &mut ScannerContext<'_>, source: &str) -> Result<(), FatalError> {
    let mut machine = Machine::new();
    let mut lineno = 0;
    for (i, line) in source.lines().enumerate() {
        lineno = i + 1;
        machine.scan_line(ctx, line, lineno)?;
    }
    machine.finish(ctx, lineno);
    Ok(())
}
