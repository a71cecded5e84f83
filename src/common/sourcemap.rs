use codespan::Span;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;
use std::fmt::Display;
use std::num::NonZeroU32;

/// A handle that points to a source location in a source map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Smid(Option<NonZeroU32>);

impl Default for Smid {
    /// The default SMID is invalid.
    fn default() -> Self {
        Smid(None)
    }
}

impl Display for Smid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.0 {
            Some(n) => write!(f, "[{}]", n),
            None => write!(f, "[?]"),
        }
    }
}

impl Smid {
    fn new(index: usize) -> Option<Smid> {
        u32::try_from(index + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .map(|n| Smid(Some(n)))
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    fn index(self) -> Option<usize> {
        self.0.map(|n| (n.get() - 1) as usize)
    }
}

#[cfg(test)]
impl Smid {
    pub fn fake(index: usize) -> Smid {
        Smid::new(index).unwrap_or_default()
    }
}

/// Anything that has a SMID identifying a source location.
pub trait HasSmid {
    fn smid(&self) -> Smid;
}

/// Source information to associate with a node
pub struct SourceInfo {
    /// File id in the loader's file database
    pub file: usize,
    /// Byte span
    pub span: Span,
}

/// Store all source info...
#[derive(Default)]
pub struct SourceMap {
    source: Vec<SourceInfo>,
}

impl SourceMap {
    /// Create a new, empty database of locations.
    pub fn new() -> Self {
        SourceMap::default()
    }

    /// Add a new source info and get a SMID referencing it
    pub fn add(&mut self, file: usize, span: Span) -> Smid {
        match Smid::new(self.source.len()) {
            Some(smid) => {
                self.source.push(SourceInfo { file, span });
                smid
            }
            None => Smid::default(),
        }
    }

    /// Number of locations recorded
    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Retrieve the SourceInfo for something that has a SMID
    pub fn source_info(&self, item: &dyn HasSmid) -> Option<&SourceInfo> {
        item.smid().index().and_then(|i| self.source.get(i))
    }

    /// Create a default diagnostic for an item with a SMID
    pub fn diagnostic<E>(&self, error: &E) -> Diagnostic<usize>
    where
        E: HasSmid + Display,
    {
        let diag = Diagnostic::error().with_message(format!("{}", error));

        if let Some(info) = self.source_info(error) {
            diag.with_labels(vec![Label::primary(info.file, info.span)])
        } else {
            diag
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use codespan::ByteIndex;

    struct Located(Smid);

    impl HasSmid for Located {
        fn smid(&self) -> Smid {
            self.0
        }
    }

    #[test]
    pub fn test_add_and_retrieve() {
        let mut map = SourceMap::new();
        let a = map.add(0, Span::new(ByteIndex(0), ByteIndex(4)));
        let b = map.add(1, Span::new(ByteIndex(10), ByteIndex(12)));

        assert!(a.is_valid());
        assert_ne!(a, b);
        assert_eq!(map.len(), 2);

        let info = map.source_info(&Located(b)).unwrap();
        assert_eq!(info.file, 1);
        assert_eq!(info.span, Span::new(ByteIndex(10), ByteIndex(12)));
    }

    #[test]
    pub fn test_default_smid_has_no_info() {
        let map = SourceMap::new();
        assert!(!Smid::default().is_valid());
        assert!(map.source_info(&Located(Smid::default())).is_none());
    }
}
