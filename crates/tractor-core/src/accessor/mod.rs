//! Accessor expressions and their resolution
//!
//! An accessor is a textual path such as `order.lines.getTotal()` or
//! `user::name`, or a computed accessor whose own path is resolved first to
//! yield the literal path used for the outer lookup.
//!
//! - [`segment`] - the segment grammar (chain, context and call separators)
//! - [`resolver`] - evaluation of accessors against a subject and context
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

pub mod resolver;
pub mod segment;


pub use resolver::{Resolver, ResolverConfig};
pub use segment::{split_chain, Segment, CALL_SUFFIX, CHAIN_SEPARATOR, CONTEXT_SEPARATOR};

use std::fmt;

/// A path expression, possibly computed from another accessor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Literal path string
    Path(String),
    /// Accessor whose resolved value (a string or null) is the path to use
    Computed(Box<Accessor>),
}

impl Accessor {
    pub fn path(path: impl Into<String>) -> Self {
        Accessor::Path(path.into())
    }

    /// Computed accessor over `inner`
    pub fn computed(inner: impl Into<Accessor>) -> Self {
        Accessor::Computed(Box::new(inner.into()))
    }

    /// The empty path, which resolves to the subject itself
    pub fn identity() -> Self {
        Accessor::Path(String::new())
    }

    /// Number of computed layers wrapped around the innermost path
    pub fn depth(&self) -> usize {
        match self {
            Accessor::Path(_) => 0,
            Accessor::Computed(inner) => 1 + inner.depth(),
        }
    }

    pub fn as_path(&self) -> Option<&str> {
        match self {
            Accessor::Path(p) => Some(p),
            Accessor::Computed(_) => None,
        }
    }
}

impl Default for Accessor {
    fn default() -> Self {
        Accessor::identity()
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Path(p) => write!(f, "{}", p),
            Accessor::Computed(inner) => write!(f, "{{{}}}", inner),
        }
    }
}

impl From<&str> for Accessor {
    fn from(value: &str) -> Self {
        Accessor::Path(value.to_string())
    }
}

impl From<String> for Accessor {
    fn from(value: String) -> Self {
        Accessor::Path(value)
    }
}

impl From<Extraction> for Accessor {
    fn from(value: Extraction) -> Self {
        Accessor::Computed(Box::new(value.accessor))
    }
}

/// A deferred accessor usable wherever a literal value is expected
///
/// Extractions are immutable once built and are resolved against the live
/// payload when a stage asks for the argument holding them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extraction {
    accessor: Accessor,
}

impl Extraction {
    pub fn new(accessor: impl Into<Accessor>) -> Self {
        Self {
            accessor: accessor.into(),
        }
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.accessor)
    }
}
