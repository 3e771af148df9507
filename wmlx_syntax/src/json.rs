//! A JSON emitter for extracted strings.
//!
//! This works by converting each report to a simplified structural
//! format (see the structs at the end of the file) and then serialising
//! it, one object per line. Drivers that post-process extraction output
//! with other tooling consume this instead of the catalog writer.

use std::io::{self, Write};

use serde::Serialize;
use wmlx_pos::FileName;

use crate::catalog::{ExtractedString, StringSink};

pub struct JsonSink {
    dst: Box<dyn Write + Send>,
    file: FileName,
}

impl JsonSink {
    pub fn stderr(file: FileName) -> JsonSink {
        JsonSink {
            dst: Box::new(io::stderr()),
            file,
        }
    }

    pub fn new(dst: Box<dyn Write + Send>, file: FileName) -> JsonSink {
        JsonSink { dst, file }
    }
}

impl StringSink for JsonSink {
    fn emit_string(&mut self, string: ExtractedString) {
        let data = JsonString::from_extracted(&string, &self.file);
        if let Err(e) = serde_json::to_writer(&mut self.dst, &data) {
            panic!("failed to print extracted string: {:?}", e);
        }
        if let Err(e) = self.dst.write_all(b"\n") {
            panic!("failed to print extracted string: {:?}", e);
        }
    }

    fn add_attribute(&mut self, info: &str, lineno: usize) {
        let data = JsonAttribute {
            file: &self.file,
            line: lineno,
            info,
        };
        if let Err(e) = serde_json::to_writer(&mut self.dst, &data) {
            panic!("failed to print attribute: {:?}", e);
        }
        if let Err(e) = self.dst.write_all(b"\n") {
            panic!("failed to print attribute: {:?}", e);
        }
    }
}

// The following data types are provided just for serialisation.

#[derive(Serialize)]
struct JsonString<'a> {
    file: &'a str,
    line: usize,
    text: &'a str,
    multiline: bool,
    translatable: bool,
    raw: bool,
    domain: &'a str,
    tags: &'a [String],
    added_info: &'a [String],
    override_info: &'a [String],
    attribute: Option<&'a str>,
}

impl<'a> JsonString<'a> {
    fn from_extracted(string: &'a ExtractedString, file: &'a str) -> JsonString<'a> {
        JsonString {
            file,
            line: string.lineno,
            text: &string.text,
            multiline: string.is_multiline(),
            translatable: string.is_translatable(),
            raw: string.is_raw(),
            domain: &string.domain,
            tags: &string.tags,
            added_info: &string.added_info,
            override_info: &string.override_info,
            attribute: string.attribute.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct JsonAttribute<'a> {
    file: &'a str,
    line: usize,
    info: &'a str,
}
