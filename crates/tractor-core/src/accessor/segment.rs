//! Accessor segment grammar
//!
//! A literal accessor is split on the chain separator into segments.
//! Blank segments are identity steps. Each remaining segment is classified
//! with the priority context scope, then call suffix, then plain lookup.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

/// Separates the steps of a chained accessor
pub const CHAIN_SEPARATOR: char = '.';

/// Scopes a segment to a context entry: `entry::rest`
pub const CONTEXT_SEPARATOR: &str = "::";

/// Marks a segment as a method invocation: `name()`
pub const CALL_SUFFIX: &str = "()";

/// One classified step of an accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `entry::rest` - switch to `context[entry]` and resolve `rest` there
    Context { entry: &'a str, rest: &'a str },
    /// `method()` - invoke on the subject, or on every element of a collection
    Call { method: &'a str },
    /// Map key, sequence index or object field
    Lookup { name: &'a str },
}

impl<'a> Segment<'a> {
    /// Classify a single non-blank segment
    pub fn classify(segment: &'a str) -> Self {
        if let Some((entry, rest)) = segment.split_once(CONTEXT_SEPARATOR) {
            return Segment::Context { entry, rest };
        }

        if let Some(method) = segment.strip_suffix(CALL_SUFFIX) {
            return Segment::Call { method };
        }

        Segment::Lookup { name: segment }
    }
}

/// Whether a segment is an identity step
pub fn is_blank(segment: &str) -> bool {
    segment.trim().is_empty()
}

/// Split a literal accessor into its non-blank segments
///
/// `a..b` yields the same segments as `a.b`; an empty or all-blank accessor
/// yields none.
pub fn split_chain(path: &str) -> Vec<&str> {
    path.split(CHAIN_SEPARATOR)
        .filter(|segment| !is_blank(segment))
        .collect()
}
