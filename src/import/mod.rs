//! Reading node trees from serialised input
use codespan_reporting::files::{Files, SimpleFiles};

use crate::{common::sourcemap::SourceMap, core::expr::RcExpr};

use self::error::SourceError;

pub mod error;
pub mod json;

/// Read a loaded source file into core representation
pub fn read_to_core(
    files: &SimpleFiles<String, String>,
    source_map: &mut SourceMap,
    file_id: usize,
) -> Result<RcExpr, SourceError> {
    json::read_json(source_map, file_id, files.source(file_id)?)
}
