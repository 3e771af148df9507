//! The scanner's state catalog: one pattern and one action per state,
//! with a fixed fallback chain routing unaccepted text.

use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};
use wmlx_errors::FatalError;

use super::ScannerContext;

static BLANK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*$").unwrap());

static DEFINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#(define[ \t][^\n]+|enddef|\s+wmlxgettext:\s+)").unwrap());

static CHECKDOM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#textdomain\s+(\S+)").unwrap());

static CHECKPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*#\s*(wmlxgettext|po-override|po):\s+(.+)").unwrap());

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#.+").unwrap());

// Refuses to match when an unescaped `"` appears before `_ <<`, so a
// mixed line such as `name = "..." + <<...>>` falls through to the
// ordinary-string state and the quoted part is not lost.
static STR02_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^"]*_\s*<<(?:(.*?)>>|(.*))"#).unwrap());

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*(?:[^"]+\(\s*)?\[\s*([/+-]?)\s*([A-Za-z0-9_]+)\s*\]"#).unwrap());

static GETINF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(speaker|id|role|description|condition|type|race)\s*=\s*(.*)").unwrap()
});

static STR01_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^"]*?\s*(_?)\s*"((?:""|[^"])*)("?)"#).unwrap());

static STR10_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^((?:""|[^"])*)("?)"#).unwrap());

static STR20_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)>>").unwrap());

static GOLUA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.*?<<\s*").unwrap());

/// State identifiers. `Script` is the delegation state entered from
/// `Golua` while an embedded-language block is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateId {
    Idle,
    Define,
    Checkdom,
    Checkpo,
    Comment,
    Str02,
    Tag,
    Getinf,
    Str01,
    Str10,
    Str20,
    Golua,
    Final,
    Script,
}

impl StateId {
    /// The state's pattern; `None` means the action always runs.
    pub fn pattern(self) -> Option<&'static Regex> {
        match self {
            StateId::Idle | StateId::Str20 | StateId::Final | StateId::Script => None,
            StateId::Define => Some(&*DEFINE_RE),
            StateId::Checkdom => Some(&*CHECKDOM_RE),
            StateId::Checkpo => Some(&*CHECKPO_RE),
            StateId::Comment => Some(&*COMMENT_RE),
            StateId::Str02 => Some(&*STR02_RE),
            StateId::Tag => Some(&*TAG_RE),
            StateId::Getinf => Some(&*GETINF_RE),
            StateId::Str01 => Some(&*STR01_RE),
            StateId::Str10 => Some(&*STR10_RE),
            StateId::Golua => Some(&*GOLUA_RE),
        }
    }

    /// Where the dispatcher jumps when the pattern misses.
    pub fn fallback(self) -> StateId {
        match self {
            StateId::Idle => StateId::Define,
            StateId::Define => StateId::Checkdom,
            StateId::Checkdom => StateId::Checkpo,
            StateId::Checkpo => StateId::Comment,
            StateId::Comment => StateId::Str02,
            StateId::Str02 => StateId::Tag,
            StateId::Tag => StateId::Getinf,
            StateId::Getinf => StateId::Str01,
            StateId::Str01 => StateId::Golua,
            StateId::Golua => StateId::Final,
            StateId::Str10 => StateId::Str10,
            StateId::Str20 | StateId::Final | StateId::Script => self,
        }
    }
}

type Step = Result<(Option<String>, StateId), FatalError>;

pub(super) fn run(
    state: StateId,
    ctx: &mut ScannerContext<'_>,
    text: &str,
    lineno: usize,
    caps: Option<&Captures<'_>>,
) -> Step {
    match state {
        StateId::Idle => idle(ctx, text),
        StateId::Define => define(ctx, text, lineno, caps.unwrap()),
        StateId::Checkdom => checkdom(ctx, caps.unwrap()),
        StateId::Checkpo => checkpo(ctx, caps.unwrap()),
        StateId::Comment => Ok((None, StateId::Idle)),
        StateId::Str02 => str02(ctx, text, lineno, caps.unwrap()),
        StateId::Tag => tag(ctx, text, lineno, caps.unwrap()),
        StateId::Getinf => getinf(ctx, text, lineno, caps.unwrap()),
        StateId::Str01 => str01(ctx, text, lineno, caps.unwrap()),
        StateId::Str10 => str10(ctx, text, lineno, caps.unwrap()),
        StateId::Str20 => str20(ctx, text, lineno),
        StateId::Golua => golua(ctx, text, lineno, caps.unwrap()),
        StateId::Final => {
            ctx.store_pending();
            Ok((None, StateId::Idle))
        }
        StateId::Script => script(ctx, text, lineno),
    }
}

fn idle(ctx: &mut ScannerContext<'_>, text: &str) -> Step {
    ctx.store_pending();
    if BLANK_RE.is_match(text) {
        Ok((None, StateId::Idle))
    } else {
        Ok((Some(text.to_string()), StateId::Define))
    }
}

fn define(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    let directive = caps.get(1).unwrap().as_str().to_uppercase();

    if let Some(rest) = directive.strip_prefix("DEFINE") {
        if rest.starts_with(' ') || rest.starts_with('\t') {
            let name = rest.split_whitespace().next().unwrap_or("").to_string();
            debug!("opening definition frame {} at line {}", name, lineno);
            ctx.pending_macro = Some((name, lineno));
            return Ok((None, StateId::Idle));
        }
    }
    if directive == "ENDDEF" {
        if ctx.pending_macro.take().is_none() {
            ctx.handler()
                .struct_loc_err(
                    ctx.loc(lineno),
                    "found an #enddef, but no macro definition is pending; \
                     perhaps you forgot to put a #define somewhere?",
                )
                .emit();
        }
        return Ok((None, StateId::Idle));
    }
    // `# wmlxgettext: <code>` - strip the prefix and re-scan the rest.
    let end = caps.get(0).unwrap().end();
    Ok((Some(text[end..].to_string()), StateId::Idle))
}

fn checkdom(ctx: &mut ScannerContext<'_>, caps: &Captures<'_>) -> Step {
    ctx.domain = caps.get(1).unwrap().as_str().to_string();
    Ok((None, StateId::Idle))
}

fn checkpo(ctx: &mut ScannerContext<'_>, caps: &Captures<'_>) -> Step {
    let payload = caps.get(2).unwrap().as_str();
    match caps.get(1).unwrap().as_str().to_lowercase().as_str() {
        "wmlxgettext" => Ok((Some(payload.to_string()), StateId::Idle)),
        "po" => {
            ctx.added_info.push(payload.to_string());
            Ok((None, StateId::Idle))
        }
        _ => {
            ctx.override_info.push(payload.to_string());
            Ok((None, StateId::Idle))
        }
    }
}

fn str02(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    match (caps.get(1), caps.get(2)) {
        (Some(body), _) => {
            ctx.open_string(lineno, body.as_str(), false, true, true);
            let end = caps.get(0).unwrap().end();
            Ok((Some(text[end..].to_string()), StateId::Idle))
        }
        (None, Some(body)) => {
            ctx.open_string(lineno, body.as_str(), true, true, true);
            Ok((None, StateId::Str20))
        }
        (None, None) => Err(ctx.handler().loc_bug(
            ctx.loc(lineno),
            "heredoc pattern matched but neither branch captured; \
             please report a bug if you encounter this error message",
        )),
    }
}

fn tag(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    let name = caps.get(2).unwrap().as_str();
    if caps.get(1).unwrap().as_str() == "/" {
        ctx.close_tag(name, lineno);
        if name == "lua" {
            ctx.on_script_tag = false;
        }
    } else {
        ctx.tag_stack.push(format!("[{}]", name));
        if name == "lua" {
            ctx.on_script_tag = true;
        }
    }
    ctx.added_info.clear();
    ctx.override_info.clear();
    let end = caps.get(0).unwrap().end();
    Ok((Some(text[end..].to_string()), StateId::Idle))
}

fn getinf(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    let attr = caps.get(1).unwrap().as_str();
    let value = caps.get(2).unwrap().as_str();
    if value.contains('"') {
        // The value is a string; record which attribute it belongs to
        // and let the string states capture it.
        ctx.info_type = Some(attr.to_lowercase());
        Ok((Some(text.to_string()), StateId::Str01))
    } else {
        let info = format!("{}={}", attr, value);
        ctx.add_attribute(&info, lineno);
        Ok((None, StateId::Idle))
    }
}

fn str01(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    let translatable = caps.get(1).unwrap().as_str() == "_";
    let body = caps.get(2).unwrap().as_str();
    if caps.get(3).unwrap().as_str().is_empty() {
        ctx.open_string(lineno, body, true, translatable, false);
        Ok((None, StateId::Str10))
    } else {
        ctx.open_string(lineno, body, false, translatable, false);
        let end = caps.get(0).unwrap().end();
        Ok((Some(text[end..].to_string()), StateId::Idle))
    }
}

fn str10(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    let line = caps.get(1).unwrap().as_str().to_string();
    let closed = !caps.get(2).unwrap().as_str().is_empty();
    match ctx.pending.as_mut() {
        Some(pending) => pending.addline(&line),
        None => {
            return Err(ctx.handler().loc_bug(
                ctx.loc(lineno),
                "string continuation reached with no pending string",
            ))
        }
    }
    if closed {
        let end = caps.get(0).unwrap().end();
        Ok((Some(text[end..].to_string()), StateId::Idle))
    } else {
        Ok((None, StateId::Str10))
    }
}

fn str20(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize) -> Step {
    if ctx.pending.is_none() {
        return Err(ctx.handler().loc_bug(
            ctx.loc(lineno),
            "raw-string continuation reached with no pending string",
        ));
    }
    if let Some(caps) = STR20_END_RE.captures(text) {
        let line = caps.get(1).unwrap().as_str().to_string();
        ctx.pending.as_mut().unwrap().addline(&line);
        let end = caps.get(0).unwrap().end();
        Ok((Some(text[end..].to_string()), StateId::Idle))
    } else {
        ctx.pending.as_mut().unwrap().addline(text);
        Ok((None, StateId::Str20))
    }
}

fn golua(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize, caps: &Captures<'_>) -> Step {
    if ctx.on_script_tag {
        let end = caps.get(0).unwrap().end();
        match ctx.script_enter(&text[end..], lineno) {
            Some(rest) => Ok((Some(rest), StateId::Idle)),
            None => Ok((None, StateId::Script)),
        }
    } else {
        // `<<` with no open script tag is ordinary markup.
        Ok((Some(text.to_string()), StateId::Final))
    }
}

fn script(ctx: &mut ScannerContext<'_>, text: &str, lineno: usize) -> Step {
    match ctx.script_resume(text, lineno) {
        Some(rest) => Ok((Some(rest), StateId::Idle)),
        None => Ok((None, StateId::Script)),
    }
}
