// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed errors for invalid rebuild and traversal inputs.
//!
//! Only malformed caller input is an error. Particles outside the padded box
//! and neighbor-slot overflow are reported through return values instead.

use core::fmt;

/// Errors arising from invalid inputs to a rebuild or traversal.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Two arrays that must agree in length do not.
    LengthMismatch {
        /// Which array was wrong.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Length actually supplied.
        found: usize,
    },

    /// A particle carries a type id outside `0..n_types`.
    TypeOutOfRange {
        /// Index of the offending particle.
        particle: usize,
        /// Its type id.
        type_id: u32,
        /// Number of types the index was built for.
        n_types: usize,
    },

    /// A cutoff or buffer distance is NaN or infinite, or the buffer is negative.
    InvalidDistance {
        /// Which parameter was wrong.
        what: &'static str,
        /// The offending value.
        value: f32,
    },

    /// A periodic box is narrower than twice the longest interaction range.
    BoxTooSmall {
        /// Lattice direction that is too narrow.
        axis: usize,
        /// Distance between the box faces along that direction.
        width: f32,
        /// Minimum width required.
        required: f32,
    },

    /// Neighbor rows described by the head list overlap or overrun the list.
    InvalidHeadList {
        /// First particle whose row does not fit.
        particle: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what} has length {found}, expected {expected}"),
            Self::TypeOutOfRange {
                particle,
                type_id,
                n_types,
            } => write!(
                f,
                "particle {particle} has type {type_id}, but only {n_types} types exist"
            ),
            Self::InvalidDistance { what, value } => write!(f, "invalid {what}: {value}"),
            Self::BoxTooSmall {
                axis,
                width,
                required,
            } => write!(
                f,
                "box width {width} along axis {axis} is smaller than twice the interaction range ({required})"
            ),
            Self::InvalidHeadList { particle } => {
                write!(f, "neighbor row of particle {particle} overlaps or overruns the list")
            }
        }
    }
}

impl core::error::Error for Error {}
