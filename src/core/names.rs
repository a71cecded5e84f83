//! Method name conventions: trailing predicate (`?`), mutation (`!`)
//! and assignment (`=`) markers

/// Strip a single trailing predicate, mutation or assignment marker
pub fn strip_marker(name: &str) -> &str {
    name.strip_suffix(['?', '!', '='])
        .filter(|base| !base.is_empty())
        .unwrap_or(name)
}

/// True if the name carries a trailing mutation marker (`save!`)
pub fn is_mutator(name: &str) -> bool {
    name.len() > 1 && name.ends_with('!')
}

/// True if the name is an attribute writer (`title=`) rather than an
/// operator such as `==` or `<=`
pub fn is_setter(name: &str) -> bool {
    match name.strip_suffix('=') {
        Some(base) => {
            !base.is_empty() && base.chars().all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// True if two distinct names are the same once a trailing marker is
/// removed (`active?` / `active`)
pub fn differ_only_by_marker(a: &str, b: &str) -> bool {
    a != b && strip_marker(a) == strip_marker(b)
}
