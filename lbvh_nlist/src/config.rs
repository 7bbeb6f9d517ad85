// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Neighbor-list settings.

use glam::Vec3;

/// Row capacities are kept at multiples of this.
pub const NMAX_GRANULE: u32 = 8;

/// Round a row capacity up to a positive multiple of [`NMAX_GRANULE`].
pub const fn round_nmax(n: u32) -> u32 {
    if n == 0 {
        NMAX_GRANULE
    } else {
        n.div_ceil(NMAX_GRANULE) * NMAX_GRANULE
    }
}

/// Settings of a [`NeighborList`](crate::NeighborList).
///
/// Build with [`Default`] and adjust through the `with_*` methods.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeighborListConfig {
    /// Skin added to every cutoff.
    pub buffer: f32,
    /// Minimum number of steps between two rebuilds that are not forced.
    pub rebuild_check_delay: u64,
    /// Rebuild only once some particle moved more than half the buffer.
    pub check_dist: bool,
    /// Skip pairs in the same rigid body.
    pub body_filter: bool,
    /// Padding on every side of the box within which ghosts are indexed.
    pub ghost_width: Vec3,
    /// Row capacity every type starts with.
    pub initial_nmax: u32,
}

impl Default for NeighborListConfig {
    fn default() -> Self {
        Self {
            buffer: 0.4,
            rebuild_check_delay: 1,
            check_dist: true,
            body_filter: false,
            ghost_width: Vec3::ZERO,
            initial_nmax: NMAX_GRANULE,
        }
    }
}

impl NeighborListConfig {
    /// Set the buffer distance.
    #[must_use]
    pub fn with_buffer(mut self, buffer: f32) -> Self {
        self.buffer = buffer;
        self
    }

    /// Set the number of steps to wait before checking again after a rebuild.
    #[must_use]
    pub fn with_rebuild_check_delay(mut self, steps: u64) -> Self {
        self.rebuild_check_delay = steps;
        self
    }

    /// Enable or disable the displacement check.
    #[must_use]
    pub fn with_check_dist(mut self, check_dist: bool) -> Self {
        self.check_dist = check_dist;
        self
    }

    /// Enable or disable same-body filtering.
    #[must_use]
    pub fn with_body_filter(mut self, body_filter: bool) -> Self {
        self.body_filter = body_filter;
        self
    }

    /// Set the ghost padding.
    #[must_use]
    pub fn with_ghost_width(mut self, ghost_width: Vec3) -> Self {
        self.ghost_width = ghost_width;
        self
    }

    /// Set the starting row capacity, rounded up to a multiple of [`NMAX_GRANULE`].
    #[must_use]
    pub fn with_initial_nmax(mut self, nmax: u32) -> Self {
        self.initial_nmax = round_nmax(nmax);
        self
    }
}
