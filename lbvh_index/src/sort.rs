// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-type sort of Morton keys.

use crate::kernel;
use crate::morton::MortonKey;
use crate::segments::TypeSegments;

/// Sort keys by code, ascending, independently within each type segment.
///
/// The sort is stable. Keys arrive in ascending particle order within a type,
/// so equal codes stay ordered by particle index and repeated rebuilds of the
/// same configuration produce identical orderings.
pub fn sort_segments(keys: &mut [MortonKey], segments: &TypeSegments) {
    let mut parts = kernel::split_segments(keys, segments.type_head());
    kernel::launch_mut(&mut parts, |_, seg| seg.sort_by_key(|k| k.code));
}
