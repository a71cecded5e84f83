use crate::common::sourcemap::SourceMap;
use crate::core::expr::RcExpr;
use crate::driver::error::MixologyError;
use crate::import::read_to_core;
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::emit;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// A loader for serialised node trees that stores the text for error
/// reporting and the trees read from it
pub struct SourceLoader {
    /// Access to source file text
    files: SimpleFiles<String, String>,
    /// Trees read so far, with the name of the input
    trees: Vec<(String, RcExpr)>,
    /// SourceMap for references to source locations across all files
    source_map: SourceMap,
}

impl Default for SourceLoader {
    fn default() -> Self {
        SourceLoader {
            files: SimpleFiles::new(),
            trees: Vec::new(),
            source_map: SourceMap::new(),
        }
    }
}

impl SourceLoader {
    /// Create a fresh blank source loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a node tree from the file at `path` (`-` for stdin)
    pub fn load(&mut self, path: &Path) -> Result<usize, MixologyError> {
        let name = path.to_string_lossy().to_string();
        let text = if name == "-" {
            self.read_stdin()?
        } else {
            fs::read_to_string(path).map_err(|_| MixologyError::FileCouldNotBeRead(name.clone()))?
        };
        self.load_text(name, text)
    }

    /// Load a node tree from text already in memory
    pub fn load_text(&mut self, name: String, text: String) -> Result<usize, MixologyError> {
        let file_id = self.files.add(name.clone(), text);
        let expr = read_to_core(&self.files, &mut self.source_map, file_id)?;
        debug!(input = %name, file_id, "loaded node tree");
        self.trees.push((name, expr));
        Ok(file_id)
    }

    /// Trees loaded so far, in load order
    pub fn trees(&self) -> &[(String, RcExpr)] {
        &self.trees
    }

    fn read_stdin(&mut self) -> Result<String, MixologyError> {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }

    /// Access to source map for creating diagnostics
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Print a diagnostic to stderr
    pub fn diagnose_to_stderr(&self, diag: &Diagnostic<usize>) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();
        let mut lock = writer.lock();
        if let Err(e) = emit(&mut lock, &config, &self.files, diag) {
            eprintln!("{}: {}", diag.message, e);
        }
    }

    pub fn diagnose_to_string(&self, diag: &Diagnostic<usize>) -> String {
        let mut s: Vec<u8> = Vec::new();
        {
            let mut writer = NoColor::new(&mut s);
            let config = codespan_reporting::term::Config::default();
            if emit(&mut writer, &config, &self.files, diag).is_err() {
                return diag.message.clone();
            }
        }
        String::from_utf8_lossy(&s).into_owned()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::expr::acore::*;

    #[test]
    pub fn test_load_text() {
        let mut loader = SourceLoader::new();
        loader
            .load_text("a.json".to_string(), r#"["lvar", "x"]"#.to_string())
            .unwrap();
        assert_eq!(loader.trees(), &[("a.json".to_string(), lvar("x"))]);
    }

    #[test]
    pub fn test_errors_render_against_file() {
        let mut loader = SourceLoader::new();
        let err = loader
            .load_text(
                "bad.json".to_string(),
                r#"{"type": "send", "children": [], "loc": [0, 4]}"#.to_string(),
            )
            .unwrap_err();
        let text = loader.diagnose_to_string(&err.to_diagnostic());
        assert!(text.contains("bad.json"));
        assert!(text.contains("wrong number of children for send"));
    }

    #[test]
    pub fn test_diagnose_to_stderr() {
        let mut loader = SourceLoader::new();
        let err = loader
            .load_text("bad.json".to_string(), "[\"send\"]".to_string())
            .unwrap_err();
        loader.diagnose_to_stderr(&err.to_diagnostic());
    }

    #[test]
    pub fn test_missing_file() {
        let mut loader = SourceLoader::new();
        assert!(matches!(
            loader.load(Path::new("no/such/input.json")),
            Err(MixologyError::FileCouldNotBeRead(_))
        ));
    }
}
