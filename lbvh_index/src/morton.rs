// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Morton encoding of particle positions.
//!
//! Each particle's fractional coordinate in the ghost-padded box is quantized
//! to 10 bits per axis and interleaved into a 30-bit code (x in the most
//! significant position). Codes are written straight into their per-type
//! segment so that encoding and bucketing happen in one pass.

use glam::{UVec3, Vec3};

use crate::kernel;
use crate::segments::{TypeSegments, UNPLACED, to_u32};
use crate::types::{Particle, SimBox};

/// Quantization bins per axis.
pub const MORTON_BINS: u32 = 1024;

/// Fractional coordinates at or beyond this bound are out of the domain.
pub const FRACTION_LIMIT: f32 = 1.000_01;

/// A Morton code paired with the index of the particle it was computed from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MortonKey {
    /// 30-bit Morton code.
    pub code: u32,
    /// Global particle index.
    pub id: u32,
}

/// Spread the low 10 bits of `v` so that two zero bits separate each original bit.
pub const fn expand_bits(v: u32) -> u32 {
    let mut v = v & 0x3ff;
    v = (v | (v << 16)) & 0x0300_00ff;
    v = (v | (v << 8)) & 0x0300_f00f;
    v = (v | (v << 4)) & 0x030c_30c3;
    v = (v | (v << 2)) & 0x0924_9249;
    v
}

/// Interleave three 10-bit bin coordinates into a 30-bit code.
pub const fn interleave(i: u32, j: u32, k: u32) -> u32 {
    expand_bits(i) * 4 + expand_bits(j) * 2 + expand_bits(k)
}

/// Whether a fractional coordinate lies in the indexable domain `[0, 1.00001)`.
pub fn fraction_in_domain(f: Vec3) -> bool {
    f.cmpge(Vec3::ZERO).all() && f.cmplt(Vec3::splat(FRACTION_LIMIT)).all()
}

/// Quantize an in-domain fractional coordinate into bins.
///
/// A coordinate that lands on bin 1024 wraps to bin 0 on a periodic axis and
/// clamps to bin 1023 otherwise.
pub fn quantize(f: Vec3, sim_box: &SimBox) -> UVec3 {
    let periodic = sim_box.periodic();
    let mut bins = [0_u32; 3];
    for (axis, bin) in bins.iter_mut().enumerate() {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "In-domain fractions are non-negative and below 1.00001, so the product fits."
        )]
        let raw = (f[axis] * MORTON_BINS as f32) as u32;
        *bin = if raw < MORTON_BINS {
            raw
        } else if periodic.is_periodic(axis) {
            0
        } else {
            MORTON_BINS - 1
        };
    }
    UVec3::from_array(bins)
}

/// Morton code of a position, or `None` when it lies outside the padded box.
pub fn code_of(pos: Vec3, sim_box: &SimBox, ghost_width: Vec3) -> Option<u32> {
    let f = sim_box.make_fraction(pos, ghost_width);
    if !fraction_in_domain(f) {
        return None;
    }
    let b = quantize(f, sim_box);
    Some(interleave(b.x, b.y, b.z))
}

/// Placement map for a rebuild: each particle's type, or [`UNPLACED`] when out of the domain.
pub fn mark(particles: &[Particle], sim_box: &SimBox, ghost_width: Vec3) -> alloc::vec::Vec<u32> {
    kernel::map(particles.len(), |i| {
        let p = particles[i];
        let f = sim_box.make_fraction(p.pos, ghost_width);
        if fraction_in_domain(f) {
            p.type_id
        } else {
            UNPLACED
        }
    })
}

/// Encode every placed particle into its slot `type_head[type] + rank`.
///
/// `keys` must hold exactly `segments.n_placed()` entries. Unplaced particles
/// are skipped.
pub fn encode(
    particles: &[Particle],
    sim_box: &SimBox,
    ghost_width: Vec3,
    segments: &TypeSegments,
    keys: &mut [MortonKey],
) {
    debug_assert_eq!(keys.len(), segments.n_placed(), "one key per placed particle");
    // Invert the placement map so each slot is written by exactly one task.
    let mut owner = alloc::vec![0_u32; keys.len()];
    for i in 0..particles.len() {
        if let Some(slot) = segments.slot(i) {
            owner[slot] = to_u32(i);
        }
    }
    kernel::launch_mut(keys, |slot, key| {
        let id = owner[slot];
        let p = particles[id as usize];
        // Placed particles passed the same domain check in `mark`.
        let code = code_of(p.pos, sim_box, ghost_width).unwrap_or(0);
        *key = MortonKey { code, id };
    });
}
