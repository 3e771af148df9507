use crate::{Diagnostic, Level, SubDiagnostic};

use std::io::{self, Write};

/// Emitter trait for emitting errors.
pub trait Emitter {
    /// Emit a finished diagnostic record.
    fn emit(&mut self, diagnostic: &Diagnostic);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorConfig {
    Auto,
    Always,
    Never,
}

impl ColorConfig {
    fn use_color(self) -> bool {
        match self {
            ColorConfig::Always => true,
            ColorConfig::Never => false,
            ColorConfig::Auto => stderr_isatty(),
        }
    }
}

/// An emitter that renders `file:line: level: message` to stderr, colored
/// by level when the destination is a terminal.
pub struct EmitterWriter {
    dst: Destination,
}

impl EmitterWriter {
    pub fn stderr(color_config: ColorConfig) -> EmitterWriter {
        if color_config.use_color() {
            if let Some(t) = term::stderr() {
                return EmitterWriter {
                    dst: Destination::Terminal(t),
                };
            }
        }
        EmitterWriter {
            dst: Destination::Raw(Box::new(io::stderr())),
        }
    }

    pub fn new(dst: Box<dyn Write + Send>) -> EmitterWriter {
        EmitterWriter {
            dst: Destination::Raw(dst),
        }
    }

    fn emit_message(
        &mut self,
        loc: Option<&wmlx_pos::Loc>,
        level: Level,
        message: &str,
    ) -> io::Result<()> {
        if let Some(loc) = loc {
            write!(self.dst.writer(), "{}: ", loc)?;
        }
        self.dst.start_color(level);
        write!(self.dst.writer(), "{}", level)?;
        self.dst.reset_color();
        writeln!(self.dst.writer(), ": {}", message)
    }
}

impl Emitter for EmitterWriter {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        if let Err(e) = self.emit_message(diagnostic.loc.as_ref(), diagnostic.level, &diagnostic.message) {
            panic!("failed to emit diagnostic: {}", e);
        }
        for child in &diagnostic.children {
            let &SubDiagnostic {
                level,
                ref message,
                ref loc,
            } = child;
            if let Err(e) = self.emit_message(loc.as_ref(), level, message) {
                panic!("failed to emit diagnostic: {}", e);
            }
        }
    }
}

enum Destination {
    Terminal(Box<term::StderrTerminal>),
    Raw(Box<dyn Write + Send>),
}

impl Destination {
    fn writer(&mut self) -> &mut dyn Write {
        match *self {
            Destination::Terminal(ref mut t) => t.get_mut(),
            Destination::Raw(ref mut w) => w,
        }
    }

    fn start_color(&mut self, level: Level) {
        if let Destination::Terminal(ref mut t) = *self {
            let _ = t.fg(level.color());
            let _ = t.attr(term::Attr::Bold);
        }
    }

    fn reset_color(&mut self) {
        if let Destination::Terminal(ref mut t) = *self {
            let _ = t.reset();
        }
    }
}

#[cfg(unix)]
fn stderr_isatty() -> bool {
    unsafe { libc::isatty(libc::STDERR_FILENO) != 0 }
}

#[cfg(not(unix))]
fn stderr_isatty() -> bool {
    false
}
