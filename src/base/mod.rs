//! Foundation helpers shared across the crate.
//!
//! This module has NO dependencies on other pysym modules.

pub mod builtins;
pub mod dotted;

pub use builtins::is_builtin;
pub use dotted::{
    dereference_relative, is_relative_star_key, is_star_key, namespace_of, relative_star_key,
    relative_star_namespace, star_key, strip_marker, PACKAGE_MARKER, RELATIVE_MARKER,
};
