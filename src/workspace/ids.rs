//! Stable identifiers for shapes held by a [`Workspace`](super::Workspace).
//!
//! Indices shift when shapes are removed; a [`ShapeId`] does not. Ids are
//! assigned at insertion, never reused within one workspace, and are not
//! persisted.

use std::fmt;

/// Identifies one shape for the lifetime of its workspace.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(u64);

impl ShapeId {
    #[inline]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeId({})", self.0)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ordering_and_display() {
        assert!(ShapeId::new(1) < ShapeId::new(2));
        assert_eq!(ShapeId::new(7).to_string(), "#7");
        assert_eq!(format!("{:?}", ShapeId::new(7)), "ShapeId(7)");
    }
}
