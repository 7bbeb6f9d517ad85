// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=lbvh_nlist --heading-base-level=0

//! LBVH Neighbor List: a buffered full neighbor list driven by [`lbvh_index`].
//!
//! - Decides when the list must be rebuilt: first use, box change, forced
//!   updates, or a particle moving more than half the buffer distance.
//! - Stores one row per local particle in a flat array addressed by a head
//!   list, with a per-type row capacity.
//! - Grows the capacity and re-traverses when a row overflows, without
//!   rebuilding the trees.
//! - Filters explicitly excluded tag pairs and, optionally, pairs within the
//!   same rigid body.
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use lbvh_index::{CutoffMatrix, Particle, ParticleData, SimBox};
//! use lbvh_nlist::{NeighborList, NeighborListConfig, RebuildReason};
//!
//! let mut particles = vec![
//!     Particle::new(Vec3::new(0.0, 0.0, 0.0), 0),
//!     Particle::new(Vec3::new(0.9, 0.0, 0.0), 0),
//!     Particle::new(Vec3::new(3.0, 3.0, 3.0), 0),
//! ];
//! let sim_box = SimBox::cube(10.0);
//! let mut list: NeighborList =
//!     NeighborList::new(CutoffMatrix::uniform(1, 1.0), NeighborListConfig::default())?;
//!
//! let reason = list.compute(0, &ParticleData::new(&particles), None, &sim_box)?;
//! assert_eq!(reason, Some(RebuildReason::Initial));
//! assert_eq!(list.pair_list(), [(0, 1)]);
//!
//! // Moving less than half the buffer keeps the rows.
//! particles[2].pos.x += 0.1;
//! let reason = list.compute(1, &ParticleData::new(&particles), None, &sim_box)?;
//! assert_eq!(reason, None);
//! # Ok::<(), lbvh_nlist::Error>(())
//! ```
//!
//! Row contents are in traversal order, not sorted. Rows hold both `(i, j)`
//! and `(j, i)`; use [`NeighborList::pair_list`] for unique pairs.

#![no_std]

extern crate alloc;

pub mod config;
pub mod error;
pub mod exclusions;
pub mod nlist;

pub use config::{NMAX_GRANULE, NeighborListConfig};
pub use error::Error;
pub use exclusions::Exclusions;
pub use nlist::{NeighborList, NeighborListStats, RebuildReason};
