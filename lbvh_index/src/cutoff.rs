// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type-pair cutoff radii.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::Error;

/// Symmetric `n_types × n_types` matrix of cutoff radii.
///
/// A pair with `r_cut <= 0` does not interact and its tree is never searched
/// for that pair.
#[derive(Clone, Debug, PartialEq)]
pub struct CutoffMatrix {
    n_types: usize,
    r_cut: Vec<f32>,
}

impl CutoffMatrix {
    /// Every pair uses the same cutoff.
    pub fn uniform(n_types: usize, r_cut: f32) -> Self {
        Self {
            n_types,
            r_cut: vec![r_cut; n_types * n_types],
        }
    }

    /// Set the cutoff of pair `(a, b)` and `(b, a)`.
    #[must_use]
    pub fn with_pair(mut self, a: usize, b: usize, r_cut: f32) -> Self {
        self.set(a, b, r_cut);
        self
    }

    /// Set the cutoff of pair `(a, b)` and `(b, a)`.
    pub fn set(&mut self, a: usize, b: usize, r_cut: f32) {
        self.r_cut[a * self.n_types + b] = r_cut;
        self.r_cut[b * self.n_types + a] = r_cut;
    }

    /// Cutoff of pair `(a, b)`.
    pub fn get(&self, a: usize, b: usize) -> f32 {
        self.r_cut[a * self.n_types + b]
    }

    /// Number of particle types.
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    /// Search radius `r_cut + buffer` of pair `(a, b)`, or `None` if the pair does not interact.
    pub fn r_list(&self, a: usize, b: usize, buffer: f32) -> Option<f32> {
        let r = self.get(a, b);
        (r > 0.0).then_some(r + buffer)
    }

    /// Longest search radius over all interacting pairs; zero if none interact.
    pub fn max_r_list(&self, buffer: f32) -> f32 {
        self.r_cut
            .iter()
            .filter(|&&r| r > 0.0)
            .fold(0.0, |acc: f32, &r| acc.max(r + buffer))
    }

    /// Reject NaN or infinite cutoffs.
    pub fn validate(&self) -> Result<(), Error> {
        match self.r_cut.iter().find(|r| !r.is_finite()) {
            Some(&value) => Err(Error::InvalidDistance {
                what: "cutoff radius",
                value,
            }),
            None => Ok(()),
        }
    }
}

/// Reject a NaN, infinite or negative buffer distance.
pub fn validate_buffer(buffer: f32) -> Result<(), Error> {
    if buffer.is_finite() && buffer >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidDistance {
            what: "buffer distance",
            value: buffer,
        })
    }
}
