//! The macro expansion driver.
//!
//! Given a translatable sentence still containing macro references, the
//! driver enumerates the call sites of the sentence's originating macro
//! (Stage A), propagates argument bindings upward through enclosing
//! definitions until nothing brace-bearing remains (Stage B), and
//! materializes one concrete string per surviving binding, expanding
//! embeddable macro calls and the built-in globals along the way
//! (Stage C). Faults degrade to warnings: the driver emits whatever
//! variants it could fully resolve.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use wmlx_errors::Loc;
use wmlx_pos::MacroId;

use crate::ast::{Ast, NodeId, NodeKind, ROOT};
use crate::catalog::{CatalogEntry, ExtractedString};
use crate::globals::{self, GlobalBody};
use crate::parse::{parse_ast, parse_sentence};
use crate::session::ScanSession;
use crate::xref::{Definition, MacroIndex};

/// Placeholder stored for arguments the caller filtered out.
pub const IGNORED_ARG: &str = "_ignored_";

/// Nesting bound for call expansion; a corpus exceeding it almost
/// certainly has a cyclic index.
const MAX_CALL_DEPTH: usize = 64;

/// Does the argument still contain an unresolved macro reference?
pub fn has_brace(arg: &str) -> bool {
    arg.contains('{')
}

/// One entry of the variant pool: bindings for the formals of `ctx`, or a
/// terminal binding when `ctx` is `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Variant {
    pub args: BTreeMap<String, String>,
    pub ctx: Option<MacroId>,
}

/// Which formal parameters a caller is interested in.
pub enum ParamFilter<'a> {
    All,
    Only(&'a BTreeSet<String>),
}

impl<'a> ParamFilter<'a> {
    fn allows(&self, name: &str) -> bool {
        match *self {
            ParamFilter::All => true,
            ParamFilter::Only(set) => set.contains(name),
        }
    }
}

/// Stage A: one variant per usable call site of `def`.
///
/// Filtered-out formals are bound to the `_ignored_` placeholder; extra
/// positional arguments are truncated, unknown named arguments skipped,
/// unsupplied optionals defaulted - each with a warning. A call site
/// whose stored arguments contain a double-quote cannot be represented
/// in the catalog and is dropped.
pub fn call_site_arguments(
    sess: &ScanSession,
    def: &Definition,
    index: &MacroIndex,
    filter: &ParamFilter<'_>,
) -> Vec<Variant> {
    let mut variants = Vec::new();
    for (caller, call_sites) in &def.references {
        for call in call_sites {
            let loc = Loc::new(caller.clone(), call.lineno);
            let parent = index.macro_at(caller, call.lineno);

            if call.args.len() > def.args.len() {
                let msg = format!(
                    "{} called with {} positional arguments, but its definition takes {}",
                    def.name,
                    call.args.len(),
                    def.args.len()
                );
                sess.handler().struct_loc_warn(loc.clone(), &msg).emit();
            }

            let mut args = BTreeMap::new();
            for (i, called_arg) in call.args.iter().enumerate() {
                let formal = match def.args.get(i) {
                    Some(formal) => formal,
                    None => break,
                };
                let value = if filter.allows(formal) {
                    called_arg.clone()
                } else {
                    IGNORED_ARG.to_string()
                };
                args.insert(formal.clone(), value);
            }
            for (name, value) in &call.named_args {
                if !def.optional_args.contains_key(name) {
                    let msg = format!(
                        "{} is not an optional parameter of {}; ignoring it",
                        name, def.name
                    );
                    sess.handler().struct_loc_warn(loc.clone(), &msg).emit();
                    continue;
                }
                let value = if filter.allows(name) {
                    value.clone()
                } else {
                    IGNORED_ARG.to_string()
                };
                args.insert(name.clone(), value);
            }
            for (name, default) in &def.optional_args {
                if !args.contains_key(name) {
                    args.insert(name.clone(), default.clone());
                }
            }

            if args.values().any(|value| value.contains('"')) {
                let msg = format!(
                    "a quoted argument makes this call of {} untranslatable; dropping it",
                    def.name
                );
                sess.handler().struct_loc_warn(loc, &msg).emit();
                continue;
            }
            variants.push(Variant { args, ctx: parent });
        }
    }
    variants
}

/// Parse one macro argument, noting which leaf calls name formals of
/// `def` and which name external macros.
fn parse_argument(
    sess: &ScanSession,
    arg: &str,
    def: &Definition,
    used_params: &mut BTreeSet<String>,
    used_macros: &mut BTreeSet<String>,
) -> Ast {
    let mut on_macro = |ast: &Ast, id: NodeId| {
        let node = ast.node(id);
        if let NodeKind::Call(ref name) = node.kind {
            let is_formal = def.args.iter().any(|formal| formal == name)
                || def.optional_args.contains_key(name);
            if node.children.is_empty() && is_formal {
                used_params.insert(name.clone());
            } else {
                used_macros.insert(name.clone());
            }
        }
    };
    parse_ast(sess, arg, Some(&mut on_macro))
}

/// Stage B: drain brace-bearing entries from the pool, resolving their
/// arguments against the call sites of their context, until only
/// terminal entries remain.
///
/// The generator walks the pool by index and swap-removes each match, so
/// removal is O(1) and a yielded entry is never revisited; entries pushed
/// during resolution are examined in later iterations.
pub fn resolve_variants(sess: &ScanSession, pool: &mut Vec<Variant>, index: &MacroIndex) {
    let mut i = 0;
    while i < pool.len() {
        let expandable =
            pool[i].ctx.is_some() && pool[i].args.values().any(|value| has_brace(value));
        if !expandable {
            i += 1;
            continue;
        }
        let entry = pool.swap_remove(i);
        let ctx_id = entry.ctx.expect("expandable entry has a context");
        let def = match index.get_def(&ctx_id) {
            Some(def) => def,
            None => {
                let msg = format!("macro {} not found in the cross-reference index", ctx_id);
                sess.handler().struct_warn(&msg).emit();
                pool.push(Variant {
                    args: entry.args,
                    ctx: None,
                });
                continue;
            }
        };

        let mut used_params = BTreeSet::new();
        let mut used_macros = BTreeSet::new();
        let mut param_asts: BTreeMap<String, Ast> = BTreeMap::new();
        for (name, value) in &entry.args {
            let ast = if has_brace(value) {
                parse_argument(sess, value, def, &mut used_params, &mut used_macros)
            } else {
                Ast::literal(value)
            };
            param_asts.insert(name.clone(), ast);
        }
        for name in &used_macros {
            debug!("argument of {} calls external macro {}", ctx_id, name);
        }

        if used_params.is_empty() {
            // Nothing refers to a formal of the context: the braces are
            // external calls, resolved (or re-emitted) at render time.
            pool.push(Variant {
                args: entry.args,
                ctx: None,
            });
            continue;
        }

        let parents = call_site_arguments(sess, def, index, &ParamFilter::Only(&used_params));
        if parents.is_empty() {
            let msg = format!("arguments unknown for {}", ctx_id);
            sess.handler().struct_warn(&msg).emit();
            pool.push(Variant {
                args: entry.args,
                ctx: None,
            });
            continue;
        }

        for parent in parents {
            let mut merged = parent.args.clone();
            for (name, value) in &entry.args {
                if !merged.contains_key(name) {
                    merged.insert(name.clone(), value.clone());
                }
            }
            let mut substituted = BTreeMap::new();
            for (name, ast) in &param_asts {
                substituted.insert(name.clone(), ast.render(&merged));
            }
            pool.push(Variant {
                args: substituted,
                ctx: parent.ctx,
            });
        }
    }
}

/// Shared state of Stage C rendering: the index for embeddable lookups
/// and the names already warned about.
pub struct ExpandEnv<'a> {
    sess: &'a ScanSession,
    index: &'a MacroIndex,
    warned: RefCell<BTreeSet<String>>,
}

impl<'a> ExpandEnv<'a> {
    pub fn new(sess: &'a ScanSession, index: &'a MacroIndex) -> ExpandEnv<'a> {
        ExpandEnv {
            sess,
            index,
            warned: RefCell::new(BTreeSet::new()),
        }
    }

    fn warn_once(&self, name: &str, msg: &str) {
        if self.warned.borrow_mut().insert(name.to_string()) {
            self.sess.handler().struct_warn(msg).emit();
        }
    }
}

/// Stage C: materialize the tree against one terminal binding, expanding
/// global and embeddable macro calls. Multi-bodied globals fan the result
/// out, which is why this returns a list.
pub fn expand_calls(ast: &Ast, args: &BTreeMap<String, String>, env: &ExpandEnv<'_>) -> Vec<String> {
    expand_node(ast, ROOT, args, env, 0)
}

fn expand_node(
    ast: &Ast,
    id: NodeId,
    args: &BTreeMap<String, String>,
    env: &ExpandEnv<'_>,
    depth: usize,
) -> Vec<String> {
    let node = ast.node(id);
    match node.kind {
        NodeKind::Root => {
            let parts: Vec<Vec<String>> = node
                .children
                .iter()
                .map(|&child| expand_node(ast, child, args, env, depth))
                .collect();
            cartesian(&parts)
                .into_iter()
                .map(|combo| combo.concat())
                .collect()
        }
        NodeKind::Literal(ref value) => {
            let in_args = matches!(ast.node(node.parent).kind, NodeKind::Call(_));
            if value.is_empty() && in_args {
                vec!["()".to_string()]
            } else {
                vec![value.clone()]
            }
        }
        NodeKind::Call(ref name) => {
            if let Some(bound) = args.get(name) {
                return vec![bound.clone()];
            }
            let children: Vec<Vec<String>> = node
                .children
                .iter()
                .map(|&child| expand_node(ast, child, args, env, depth))
                .collect();

            if depth >= MAX_CALL_DEPTH {
                let msg = format!(
                    "{} nests more than {} calls deep; emitting the call verbatim",
                    name, MAX_CALL_DEPTH
                );
                env.warn_once(name, &msg);
                return reemit(name, &children);
            }

            if let Some(gdefs) = globals::lookup(name) {
                let mut out = Vec::new();
                for gdef in gdefs {
                    match gdef.body {
                        GlobalBody::Text(text) => out.push(text.to_string()),
                        GlobalBody::Param(param) => {
                            let ix = gdef
                                .args
                                .iter()
                                .position(|formal| *formal == param)
                                .expect("selector body names one of its formals");
                            for combo in cartesian(&children) {
                                match combo.get(ix) {
                                    Some(value) => out.push(value.clone()),
                                    None => {
                                        let msg =
                                            format!("{} called with too few arguments", name);
                                        env.warn_once(name, &msg);
                                    }
                                }
                            }
                        }
                    }
                }
                return out;
            }

            if let Some(defs) = env.index.get(name) {
                let mut out = Vec::new();
                let mut any_embeddable = false;
                for def in defs {
                    if !def.is_embeddable() {
                        continue;
                    }
                    any_embeddable = true;
                    let body = def.body.first().map(String::as_str).unwrap_or("");
                    let body_ast = parse_sentence(env.sess, body);
                    for combo in cartesian(&children) {
                        let mut bound = BTreeMap::new();
                        for (i, formal) in def.args.iter().enumerate() {
                            if let Some(value) = combo.get(i) {
                                bound.insert(formal.clone(), value.clone());
                            }
                        }
                        for (opt, default) in &def.optional_args {
                            if !bound.contains_key(opt) {
                                bound.insert(opt.clone(), default.clone());
                            }
                        }
                        out.extend(expand_node(&body_ast, ROOT, &bound, env, depth + 1));
                    }
                }
                if any_embeddable {
                    return out;
                }
                let msg = format!(
                    "{} cannot be embedded in a translatable string; emitting the call verbatim",
                    name
                );
                env.warn_once(name, &msg);
                return reemit(name, &children);
            }

            let msg = format!("unknown macro {}; emitting the call verbatim", name);
            env.warn_once(name, &msg);
            reemit(name, &children)
        }
    }
}

fn reemit(name: &str, children: &[Vec<String>]) -> Vec<String> {
    cartesian(children)
        .into_iter()
        .map(|combo| {
            let mut out = format!("{{{}", name);
            for part in combo {
                out.push(' ');
                out.push_str(&part);
            }
            out.push('}');
            out
        })
        .collect()
}

fn cartesian(parts: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut combos: Vec<Vec<String>> = vec![Vec::new()];
    for part in parts {
        let mut next = Vec::with_capacity(combos.len() * part.len());
        for combo in &combos {
            for value in part {
                let mut extended = combo.clone();
                extended.push(value.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// Expand one seed sentence. `ctx` names the macro definition the
/// sentence was captured inside, or `None` for top-level text. Every
/// surviving pool entry materializes, paired with the outermost
/// containing macro identity the propagation discovered.
pub fn expand_sentence(
    sess: &ScanSession,
    sentence: &str,
    ctx: Option<&MacroId>,
    index: &MacroIndex,
) -> Vec<(String, Option<MacroId>)> {
    let def = match ctx {
        Some(id) => {
            let def = index.get_def(id);
            if def.is_none() {
                let msg = format!("macro {} not found in the cross-reference index", id);
                sess.handler().struct_warn(&msg).emit();
            }
            def
        }
        None => None,
    };

    let mut used_params = BTreeSet::new();
    let mut used_macros = BTreeSet::new();
    let seed = match def {
        Some(def) => parse_argument(sess, sentence, def, &mut used_params, &mut used_macros),
        None => parse_sentence(sess, sentence),
    };
    for name in &used_macros {
        debug!("seed sentence calls external macro {}", name);
    }

    let mut pool = match def {
        Some(def) if !used_params.is_empty() => {
            call_site_arguments(sess, def, index, &ParamFilter::Only(&used_params))
        }
        _ => vec![Variant {
            args: BTreeMap::new(),
            ctx: ctx.cloned(),
        }],
    };
    if pool.is_empty() {
        debug!("no usable call sites for {:?}; nothing to expand", ctx);
        return Vec::new();
    }

    resolve_variants(sess, &mut pool, index);

    let env = ExpandEnv::new(sess, index);
    let mut out = Vec::new();
    for variant in pool {
        for text in expand_calls(&seed, &variant.args, &env) {
            out.push((text, variant.ctx.clone()));
        }
    }
    out
}

/// Turn one captured string into catalog entries.
///
/// Non-translatable strings produce nothing; raw strings and strings
/// without macro references pass through unexpanded; everything else
/// goes through the three-stage driver, with the originating macro
/// discovered from the index by position.
pub fn catalog_entries(
    sess: &ScanSession,
    string: &ExtractedString,
    file: &str,
    index: &MacroIndex,
) -> Vec<CatalogEntry> {
    if !string.is_translatable() {
        return Vec::new();
    }
    let entry = |msgid: String| CatalogEntry {
        msgid,
        domain: string.domain.clone(),
        file: file.to_string(),
        line: string.lineno,
        comments: string.added_info.clone(),
        overrides: string.override_info.clone(),
    };
    if string.is_raw() || !has_brace(&string.text) {
        return vec![entry(string.text.clone())];
    }
    let ctx = index.macro_at(file, string.lineno);
    expand_sentence(sess, &string.text, ctx.as_ref(), index)
        .into_iter()
        .map(|(text, _origin)| entry(text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StringFlags;
    use crate::scan::{scan_source, ScannerContext, SkipScript};
    use crate::xref::CallSite;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wmlx_errors::{Diagnostic, Emitter, Handler, Level};

    struct Collector(Rc<RefCell<Vec<(Level, String)>>>);

    impl Emitter for Collector {
        fn emit(&mut self, diagnostic: &Diagnostic) {
            self.0
                .borrow_mut()
                .push((diagnostic.level, diagnostic.message.clone()));
        }
    }

    fn sess_with_diags() -> (ScanSession, Rc<RefCell<Vec<(Level, String)>>>) {
        let diags = Rc::new(RefCell::new(Vec::new()));
        let handler = Handler::with_emitter(true, false, Box::new(Collector(diags.clone())));
        (ScanSession::with_handler(handler, "wmlx"), diags)
    }

    fn texts(out: &[(String, Option<MacroId>)]) -> Vec<String> {
        let mut texts: Vec<String> = out.iter().map(|(text, _)| text.clone()).collect();
        texts.sort();
        texts
    }

    fn greet_def() -> Definition {
        Definition::new("GREET", "macros.cfg", 1, 5)
            .formal("MODE")
            .formal("WHOM")
    }

    #[test]
    fn direct_parameter_substitution() {
        let mut index = MacroIndex::new();
        index.insert(
            greet_def().called_from("scenario.cfg", CallSite::new(10, &["message", "world"])),
        );
        let (sess, diags) = sess_with_diags();
        let ctx = MacroId::new("GREET", "macros.cfg", 1);
        let out = expand_sentence(&sess, "Hello, {WHOM}.", Some(&ctx), &index);
        assert_eq!(out, vec![("Hello, world.".to_string(), None)]);
        assert!(diags.borrow().is_empty());
    }

    #[test]
    fn two_level_parameter_propagation() {
        let mut index = MacroIndex::new();
        // {GREET {MODE} (very {QUALIFIER} {WHOM})} inside MOODY_GREET's
        // body; the indexer stores the grouped argument without parens.
        index.insert(greet_def().called_from(
            "macros.cfg",
            CallSite::new(7, &["{MODE}", "very {QUALIFIER} {WHOM}"]),
        ));
        index.insert(
            Definition::new("MOODY_GREET", "macros.cfg", 6, 8)
                .formal("MODE")
                .formal("QUALIFIER")
                .formal("WHOM")
                .called_from("scenario.cfg", CallSite::new(3, &["message", "good", "world"]))
                .called_from("scenario.cfg", CallSite::new(4, &["message", "bad", "world"])),
        );
        let (sess, diags) = sess_with_diags();
        let ctx = MacroId::new("GREET", "macros.cfg", 1);
        let out = expand_sentence(&sess, "Hello, {WHOM}.", Some(&ctx), &index);
        assert_eq!(
            texts(&out),
            vec![
                "Hello, very bad world.".to_string(),
                "Hello, very good world.".to_string(),
            ]
        );
        assert!(out.iter().all(|(_, ctx)| ctx.is_none()));
        assert!(diags.borrow().is_empty());
    }

    #[test]
    fn quoted_arguments_suppress_their_call_site() {
        let mut index = MacroIndex::new();
        index.insert(
            greet_def()
                .called_from("scenario.cfg", CallSite::new(10, &["message", "\"has quotes\""]))
                .called_from("scenario.cfg", CallSite::new(12, &["message", "clean"])),
        );
        let (sess, diags) = sess_with_diags();
        let ctx = MacroId::new("GREET", "macros.cfg", 1);
        let out = expand_sentence(&sess, "Hello, {WHOM}.", Some(&ctx), &index);
        assert_eq!(out, vec![("Hello, clean.".to_string(), None)]);
        let diags = diags.borrow();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].1.contains("untranslatable"));
    }

    #[test]
    fn variant_count_matches_quoteless_call_sites() {
        let mut def = greet_def();
        for line in 0..5 {
            def = def.called_from(
                "scenario.cfg",
                CallSite::new(10 + line, &["message", "world"]),
            );
        }
        def = def.called_from("scenario.cfg", CallSite::new(20, &["message", "\"quoted\""]));
        let index = {
            let mut index = MacroIndex::new();
            index.insert(def);
            index
        };
        let (sess, _diags) = sess_with_diags();
        let variants =
            call_site_arguments(&sess, index.get("GREET").unwrap().first().unwrap(), &index, &ParamFilter::All);
        assert_eq!(variants.len(), 5);
    }

    #[test]
    fn globals_expand_without_an_index() {
        let index = MacroIndex::new();
        let (sess, diags) = sess_with_diags();
        let out = expand_sentence(&sess, "{LEFT_BRACE}hello{RIGHT_BRACE}", None, &index);
        assert_eq!(out, vec![("{hello}".to_string(), None)]);
        assert!(diags.borrow().is_empty());
    }

    #[test]
    fn difficulty_selector_fans_out() {
        let index = MacroIndex::new();
        let (sess, _diags) = sess_with_diags();
        let out = expand_sentence(&sess, "{ON_DIFFICULTY easy normal hard}", None, &index);
        assert_eq!(
            texts(&out),
            vec!["easy".to_string(), "hard".to_string(), "normal".to_string()]
        );
    }

    #[test]
    fn named_and_optional_arguments() {
        let mut index = MacroIndex::new();
        index.insert(
            Definition::new("SAY", "macros.cfg", 1, 4)
                .formal("TEXT")
                .optional("SPEAKER", "narrator")
                .called_from("a.cfg", CallSite::new(3, &["hi"]).named("SPEAKER", "Kaleh"))
                .called_from("a.cfg", CallSite::new(5, &["hi"]))
                .called_from("a.cfg", CallSite::new(7, &["hi"]).named("VOLUME", "loud")),
        );
        let (sess, diags) = sess_with_diags();
        let def = index.get("SAY").unwrap().first().unwrap();
        let variants = call_site_arguments(&sess, def, &index, &ParamFilter::All);
        assert_eq!(variants.len(), 3);
        let speakers: Vec<&str> = variants
            .iter()
            .map(|v| v.args.get("SPEAKER").unwrap().as_str())
            .collect();
        assert_eq!(speakers, vec!["Kaleh", "narrator", "narrator"]);
        let diags = diags.borrow();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].1.contains("VOLUME"));
    }

    #[test]
    fn extra_positional_arguments_are_truncated() {
        let mut index = MacroIndex::new();
        index.insert(
            greet_def().called_from("a.cfg", CallSite::new(3, &["message", "world", "extra"])),
        );
        let (sess, diags) = sess_with_diags();
        let def = index.get("GREET").unwrap().first().unwrap();
        let variants = call_site_arguments(&sess, def, &index, &ParamFilter::All);
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].args.len(), 2);
        assert_eq!(diags.borrow().len(), 1);
    }

    #[test]
    fn ignored_parameters_use_the_placeholder() {
        let mut index = MacroIndex::new();
        index.insert(
            greet_def().called_from("a.cfg", CallSite::new(3, &["message", "world"])),
        );
        let (sess, _diags) = sess_with_diags();
        let def = index.get("GREET").unwrap().first().unwrap();
        let mut only = BTreeSet::new();
        only.insert("WHOM".to_string());
        let variants = call_site_arguments(&sess, def, &index, &ParamFilter::Only(&only));
        assert_eq!(variants[0].args.get("MODE").unwrap(), IGNORED_ARG);
        assert_eq!(variants[0].args.get("WHOM").unwrap(), "world");
    }

    #[test]
    fn embeddable_macros_are_inlined() {
        let mut index = MacroIndex::new();
        index.insert(
            Definition::new("EXCITE", "macros.cfg", 1, 2)
                .formal("ADJ")
                .body_line("totally {ADJ}"),
        );
        let (sess, diags) = sess_with_diags();
        let out = expand_sentence(&sess, "{EXCITE great} stuff", None, &index);
        assert_eq!(out, vec![("totally great stuff".to_string(), None)]);
        assert!(diags.borrow().is_empty());
    }

    #[test]
    fn non_embeddable_macros_are_reemitted_with_one_warning() {
        let mut index = MacroIndex::new();
        index.insert(
            Definition::new("BIG", "macros.cfg", 1, 3)
                .body_line("line one")
                .body_line("line two"),
        );
        let (sess, diags) = sess_with_diags();
        let out = expand_sentence(&sess, "{BIG} and {BIG}", None, &index);
        assert_eq!(out, vec![("{BIG} and {BIG}".to_string(), None)]);
        assert_eq!(diags.borrow().len(), 1);
    }

    #[test]
    fn unknown_macros_are_reemitted_verbatim() {
        let index = MacroIndex::new();
        let (sess, diags) = sess_with_diags();
        let out = expand_sentence(&sess, "keep {MYSTERY x} intact", None, &index);
        assert_eq!(out, vec![("keep {MYSTERY x} intact".to_string(), None)]);
        assert_eq!(diags.borrow().len(), 1);
        assert!(diags.borrow()[0].1.contains("MYSTERY"));
    }

    #[test]
    fn concrete_bindings_keep_their_context() {
        let mut index = MacroIndex::new();
        index.insert(greet_def().called_from("macros.cfg", CallSite::new(7, &["message", "world"])));
        index.insert(Definition::new("WRAPPER", "macros.cfg", 6, 9));
        let (sess, _diags) = sess_with_diags();
        let ctx = MacroId::new("GREET", "macros.cfg", 1);
        let out = expand_sentence(&sess, "Hello, {WHOM}.", Some(&ctx), &index);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, "Hello, world.");
        assert_eq!(out[0].1, Some(MacroId::new("WRAPPER", "macros.cfg", 6)));
    }

    #[test]
    fn sentences_without_parameters_keep_their_origin() {
        let mut index = MacroIndex::new();
        index.insert(greet_def());
        let (sess, _diags) = sess_with_diags();
        let ctx = MacroId::new("GREET", "macros.cfg", 1);
        let out = expand_sentence(&sess, "No parameters here.", Some(&ctx), &index);
        assert_eq!(out, vec![("No parameters here.".to_string(), Some(ctx))]);
    }

    #[test]
    fn sentences_in_uncalled_macros_produce_no_variants() {
        let mut index = MacroIndex::new();
        // GREET is called nowhere: its sentence has no argument sets.
        index.insert(greet_def());
        let (sess, _diags) = sess_with_diags();
        let ctx = MacroId::new("GREET", "macros.cfg", 1);
        let out = expand_sentence(&sess, "Hello, {WHOM}.", Some(&ctx), &index);
        assert!(out.is_empty());
    }

    fn extracted(text: &str, lineno: usize, flags: StringFlags) -> ExtractedString {
        ExtractedString {
            text: text.to_string(),
            lineno,
            flags,
            domain: "wmlx".to_string(),
            tags: Vec::new(),
            added_info: Vec::new(),
            override_info: Vec::new(),
            attribute: None,
        }
    }

    #[test]
    fn raw_strings_are_never_expanded() {
        let mut index = MacroIndex::new();
        index.insert(
            Definition::new("EXCITE", "macros.cfg", 1, 2)
                .formal("ADJ")
                .body_line("totally {ADJ}"),
        );
        let (sess, _diags) = sess_with_diags();
        let raw = extracted(
            "{EXCITE wow} stays",
            4,
            StringFlags::TRANSLATABLE | StringFlags::RAW,
        );
        let entries = catalog_entries(&sess, &raw, "a.cfg", &index);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msgid, "{EXCITE wow} stays");
    }

    #[test]
    fn untranslatable_strings_produce_no_entries() {
        let index = MacroIndex::new();
        let (sess, _diags) = sess_with_diags();
        let plain = extracted("not marked", 1, StringFlags::empty());
        assert!(catalog_entries(&sess, &plain, "a.cfg", &index).is_empty());
    }

    #[test]
    fn scanned_strings_flow_into_catalog_entries() {
        let source = "#textdomain wesnoth-test\n\
                      #define GREET MODE WHOM\n\
                      message = _ \"Hello, {WHOM}.\"\n\
                      #enddef\n";
        let mut index = MacroIndex::new();
        index.insert(
            Definition::new("GREET", "greet.cfg", 2, 4)
                .formal("MODE")
                .formal("WHOM")
                .called_from("scenario.cfg", CallSite::new(9, &["message", "world"])),
        );
        let (sess, diags) = sess_with_diags();
        let mut strings: Vec<ExtractedString> = Vec::new();
        let mut script = SkipScript::default();
        {
            let mut ctx = ScannerContext::new(&sess, "greet.cfg", &mut strings, &mut script);
            scan_source(&mut ctx, source).unwrap();
        }
        assert_eq!(strings.len(), 1);

        let entries = catalog_entries(&sess, &strings[0], "greet.cfg", &index);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msgid, "Hello, world.");
        assert_eq!(entries[0].domain, "wesnoth-test");
        assert_eq!(entries[0].file, "greet.cfg");
        assert_eq!(entries[0].line, 3);
        assert!(diags.borrow().is_empty());
    }
}
