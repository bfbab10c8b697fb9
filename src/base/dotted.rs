//! Dotted-name manipulation.
//!
//! Symbol keys are fully-qualified dotted paths (`pkg.sub.mod.func`). The
//! helpers here cover the three key transformations the resolver performs:
//! collapsing a package's marker module onto the package name, walking up
//! the ancestor chain of a relative import, and building the synthetic keys
//! under which star-imports are parked until expansion.

/// File that marks a directory as a regular package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Module stem of the package marker file.
pub const PACKAGE_MARKER_STEM: &str = "__init__";

/// Path component used in synthetic relative-star-import keys.
pub const RELATIVE_MARKER: &str = "relative";

/// The namespace a key is directly nested under (`a.b.c` → `a.b`).
///
/// A top-level key has the empty namespace.
pub fn namespace_of(key: &str) -> &str {
    match key.rfind('.') {
        Some(idx) => &key[..idx],
        None => "",
    }
}

/// Collapse a package marker module onto the package's own name
/// (`pkg.__init__` → `pkg`, `pkg.__init__.x` → `pkg.x`).
pub fn strip_marker(key: &str) -> String {
    key.replace(&format!(".{PACKAGE_MARKER_STEM}"), "")
}

/// Dereference a relative import: walk up `level` dotted components from
/// the importing module, then append the local target.
///
/// `level` 0 means the target is already absolute. A target of `""`
/// (`from . import *`) resolves to the ancestor namespace itself.
pub fn dereference_relative(module: &str, level: u32, target: &str) -> String {
    if level == 0 {
        return target.to_string();
    }
    let components: Vec<&str> = module.split('.').collect();
    let keep = components.len().saturating_sub(level as usize);
    let mut parts: Vec<&str> = components[..keep].to_vec();
    if !target.is_empty() {
        parts.push(target);
    }
    parts.join(".")
}

/// Synthetic key under which a module's external star-imports accumulate.
pub fn star_key(module: &str) -> String {
    format!("{module}.*")
}

/// Synthetic key under which a module's relative star-imports accumulate.
pub fn relative_star_key(module: &str) -> String {
    format!("{module}.{RELATIVE_MARKER}.*")
}

pub fn is_star_key(key: &str) -> bool {
    key.ends_with(".*") && !is_relative_star_key(key)
}

pub fn is_relative_star_key(key: &str) -> bool {
    key.ends_with(&format!(".{RELATIVE_MARKER}.*"))
}

/// The namespace a relative-star-import key expands into
/// (`pkg.relative.*` → `pkg`).
pub fn relative_star_namespace(key: &str) -> &str {
    key.strip_suffix(&format!(".{RELATIVE_MARKER}.*")).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of("a.b.c"), "a.b");
        assert_eq!(namespace_of("a"), "");
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("pkg.__init__"), "pkg");
        assert_eq!(strip_marker("pkg.__init__.x"), "pkg.x");
        assert_eq!(strip_marker("pkg.sub.mod"), "pkg.sub.mod");
    }

    #[rstest]
    #[case("pkg.__init__", 1, "core", "pkg.core")]
    #[case("pkg.core.__init__", 1, "numeric", "pkg.core.numeric")]
    #[case("pkg.core.__init__", 2, "version", "pkg.version")]
    #[case("pkg.mod", 1, "other.f", "pkg.other.f")]
    #[case("pkg.mod", 1, "", "pkg")]
    #[case("mod", 0, "numpy.ones", "numpy.ones")]
    fn test_dereference_relative(
        #[case] module: &str,
        #[case] level: u32,
        #[case] target: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(dereference_relative(module, level, target), expected);
    }

    #[test]
    fn test_star_keys() {
        assert_eq!(star_key("pkg.mod"), "pkg.mod.*");
        assert_eq!(relative_star_key("pkg.mod"), "pkg.mod.relative.*");
        assert!(is_star_key("pkg.mod.*"));
        assert!(!is_star_key("pkg.mod.relative.*"));
        assert!(is_relative_star_key("pkg.mod.relative.*"));
        assert_eq!(relative_star_namespace("pkg.relative.*"), "pkg");
    }
}
