//! The collector interface between the scanner and the catalog driver.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use wmlx_pos::FileName;

bitflags! {
    /// Properties of a captured string.
    #[derive(Serialize, Deserialize)]
    pub struct StringFlags: u8 {
        /// The body spans more than one source line.
        const MULTILINE = 1 << 0;
        /// The source marked the string with the `_` sigil.
        const TRANSLATABLE = 1 << 1;
        /// Heredoc form: no escape processing, never macro-expanded.
        const RAW = 1 << 2;
    }
}

/// A completed string reported by the scanner, together with the scan
/// state snapshotted at store time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedString {
    pub text: String,
    /// Line the opening delimiter was seen on.
    pub lineno: usize,
    pub flags: StringFlags,
    pub domain: String,
    /// Node-stack snapshot, innermost last; entries have the form `[name]`.
    pub tags: Vec<String>,
    /// Pending `#po:` comments.
    pub added_info: Vec<String>,
    /// Pending `#po-override:` comments.
    pub override_info: Vec<String>,
    /// Informational attribute the string was assigned to (`speaker`,
    /// `id`, ...), when the capture came from such an assignment.
    pub attribute: Option<String>,
}

impl ExtractedString {
    pub fn is_multiline(&self) -> bool {
        self.flags.contains(StringFlags::MULTILINE)
    }

    pub fn is_translatable(&self) -> bool {
        self.flags.contains(StringFlags::TRANSLATABLE)
    }

    pub fn is_raw(&self) -> bool {
        self.flags.contains(StringFlags::RAW)
    }
}

/// Receives scanner output. The node/domain bookkeeping that turns these
/// reports into catalog sentences lives with the driver.
pub trait StringSink {
    fn emit_string(&mut self, string: ExtractedString);

    /// An unquoted informational attribute such as `speaker=Kaleh`.
    fn add_attribute(&mut self, _info: &str, _lineno: usize) {}
}

impl StringSink for Vec<ExtractedString> {
    fn emit_string(&mut self, string: ExtractedString) {
        self.push(string);
    }
}

/// One concrete translatable entry produced by the expansion driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub msgid: String,
    pub domain: String,
    pub file: FileName,
    pub line: usize,
    pub comments: Vec<String>,
    pub overrides: Vec<String>,
}
