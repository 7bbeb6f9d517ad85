// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Neighbor-list errors.

use core::fmt;

/// Errors from configuring or updating a neighbor list.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The index rejected a rebuild or traversal.
    Index(lbvh_index::Error),

    /// An input array has the wrong length.
    LengthMismatch {
        /// Which array was wrong.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(e) => write!(f, "neighbor search failed: {e}"),
            Self::LengthMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what} has length {found}, expected {expected}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Index(e) => Some(e),
            Self::LengthMismatch { .. } => None,
        }
    }
}

impl From<lbvh_index::Error> for Error {
    fn from(e: lbvh_index::Error) -> Self {
        Self::Index(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use core::error::Error as _;

    #[test]
    fn wraps_index_errors() {
        let inner = lbvh_index::Error::InvalidHeadList { particle: 3 };
        let e = Error::from(inner.clone());
        assert!(e.source().is_some());
        assert!(e.to_string().contains(&inner.to_string()));
    }
}
