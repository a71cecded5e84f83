//! Writing transformed node trees
pub mod json;

use crate::common::prettify::prettify;
use crate::common::sourcemap::SourceMap;
use crate::core::expr::RcExpr;
use json::JsonEmitter;
use std::io::{self, Write};

/// Receives each transformed tree in turn
pub trait Emitter {
    fn emit(&mut self, expr: &RcExpr, source_map: &SourceMap) -> io::Result<()>;
}

/// Emit pseudo-source for inspection
pub struct PrettyEmitter<'a> {
    out: &'a mut (dyn Write + 'a),
}

impl<'a> PrettyEmitter<'a> {
    pub fn new(out: &'a mut (dyn Write + 'a)) -> Self {
        PrettyEmitter { out }
    }
}

impl Emitter for PrettyEmitter<'_> {
    fn emit(&mut self, expr: &RcExpr, _source_map: &SourceMap) -> io::Result<()> {
        write!(self.out, "{}", prettify(expr))
    }
}

/// Create an emitter for the format specified
///
/// Return None if the format is not recognised.
pub fn create_emitter<'a, S: AsRef<str>>(
    format: S,
    output: &'a mut (dyn Write + 'a),
) -> Option<Box<dyn Emitter + 'a>> {
    match format.as_ref() {
        "json" => Some(Box::new(JsonEmitter::new(output))),
        "pretty" => Some(Box::new(PrettyEmitter::new(output))),
        _ => None,
    }
}
