// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=lbvh_index --heading-base-level=0

//! LBVH Index: per-type linear bounding volume hierarchies over point particles.
//!
//! LBVH Index is the spatial core of a molecular-dynamics neighbor list.
//!
//! - Rebuild one binary tree per particle type from scratch, fully in parallel.
//! - Walk the trees without a stack to collect every neighbor within a per-type-pair cutoff.
//! - Handle periodic and triclinic boxes by searching each periodic image of the query.
//!
//! A rebuild is a fixed sequence of data-parallel phases, each a module of its own:
//!
//! 1. [`morton`]: quantize positions in the (optionally ghost-padded) box and
//!    interleave them into 30-bit Morton codes, bucketed by type.
//! 2. [`sort`]: stable sort of each type's codes.
//! 3. [`leaf`]: group up to `L` consecutive particles of a type into a leaf.
//! 4. [`hierarchy`]: Karras-style topology, each internal node found independently.
//! 5. [`propagate`]: bottom-up box merging driven by atomic visit counters.
//! 6. [`layout`]: depth-first linearization with skip counts for the traversal.
//!
//! [`Lbvh`] runs all six and keeps the results; [`Lbvh::traverse`] fills
//! caller-owned neighbor rows. The [`reference`] module holds an all-pairs
//! search that produces the same rows and is used to check the trees.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use lbvh_index::{
//!     CutoffMatrix, Lbvh, NeighborBuffers, Particle, ParticleData, SimBox, TraversalParams,
//!     head_list,
//! };
//!
//! let particles = [
//!     Particle::new(Vec3::new(0.0, 0.0, 0.0), 0),
//!     Particle::new(Vec3::new(0.8, 0.0, 0.0), 0),
//!     Particle::new(Vec3::new(4.8, 0.0, 0.0), 1),
//!     // Sits next to particle 2 through the periodic boundary.
//!     Particle::new(Vec3::new(-4.9, 0.0, 0.0), 1),
//! ];
//! let data = ParticleData::new(&particles);
//! let sim_box = SimBox::cube(10.0);
//!
//! let mut lbvh: Lbvh = Lbvh::new(2);
//! lbvh.build(&data, &sim_box, Vec3::ZERO)?;
//!
//! let cutoffs = CutoffMatrix::uniform(2, 1.0);
//! let params = TraversalParams { cutoffs: &cutoffs, buffer: 0.0, body_filter: false };
//! let nmax = [4, 4];
//! let (head, total) = head_list(&data, &nmax)?;
//! let mut nlist = vec![0; total];
//! let mut n_neigh = vec![0; particles.len()];
//! let mut last_pos = vec![Vec3::ZERO; particles.len()];
//! let report = lbvh.traverse(
//!     &data,
//!     &sim_box,
//!     &params,
//!     &nmax,
//!     NeighborBuffers {
//!         nlist: &mut nlist,
//!         head_list: &head,
//!         n_neigh: &mut n_neigh,
//!         last_pos: &mut last_pos,
//!     },
//! )?;
//!
//! assert!(!report.overflowed());
//! assert_eq!(n_neigh, [1, 1, 1, 1]);
//! assert_eq!(nlist[head[2]], 3);
//! # Ok::<(), lbvh_index::Error>(())
//! ```
//!
//! ## Out-of-domain particles and overflow
//!
//! Neither is an error. A particle whose fractional coordinate leaves
//! `[0, 1.00001)` is left out of every tree and counted in
//! [`BuildSummary::dropped`]. A row that runs out of space still records its
//! true count, and the returned [`OverflowReport`] carries the capacity each
//! type needs so the caller can grow the rows and traverse again without
//! rebuilding.
//!
//! ## Parallelism
//!
//! With the default `rayon` feature every phase runs on the rayon pool.
//! Without it the same kernels run sequentially and produce identical trees.
//! Concurrent writes go through atomics only; the crate has no `unsafe`.
//!
//! ### Float semantics
//!
//! Positions, cutoffs and box dimensions are assumed finite. Non-finite
//! cutoffs, buffers and ghost widths are rejected with [`Error::InvalidDistance`].

#![no_std]

extern crate alloc;

pub mod cutoff;
pub mod error;
pub mod hierarchy;
pub mod layout;
pub mod lbvh;
pub mod leaf;
pub mod morton;
pub mod propagate;
pub mod reference;
pub mod segments;
pub mod sort;
pub mod traverse;
pub mod types;

mod kernel;

pub use cutoff::CutoffMatrix;
pub use error::Error;
pub use lbvh::{BuildSummary, DEFAULT_LEAF_CAPACITY, Lbvh};
pub use traverse::{NeighborBuffers, OverflowReport, TraversalParams, head_list};
pub use types::{Aabb, NO_BODY, Particle, ParticleData, Periodic, SimBox};
