// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data-parallel kernel launches.
//!
//! Every build phase is a kernel: one independent task per particle, leaf or
//! node, with a full join before the next phase starts. With the `rayon`
//! feature the tasks run on the rayon pool; otherwise they run in index order.

use alloc::vec::Vec;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Run `f(i)` for every `i` in `0..n`.
pub(crate) fn launch<F>(n: usize, f: F)
where
    F: Fn(usize) + Sync + Send,
{
    #[cfg(feature = "rayon")]
    (0..n).into_par_iter().for_each(f);
    #[cfg(not(feature = "rayon"))]
    (0..n).for_each(f);
}

/// Run `f(i, &mut items[i])` for every element.
pub(crate) fn launch_mut<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    #[cfg(feature = "rayon")]
    items.par_iter_mut().enumerate().for_each(|(i, t)| f(i, t));
    #[cfg(not(feature = "rayon"))]
    items.iter_mut().enumerate().for_each(|(i, t)| f(i, t));
}

/// Collect `f(i)` for every `i` in `0..n`, in index order.
pub(crate) fn map<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "rayon")]
    return (0..n).into_par_iter().map(f).collect();
    #[cfg(not(feature = "rayon"))]
    return (0..n).map(f).collect();
}

/// Split `data` into consecutive mutable chunks at the given boundaries.
///
/// `bounds` is an offsets table of length `chunks + 1` starting at zero and
/// ending at `data.len()`.
pub(crate) fn split_segments<'a, T>(mut data: &'a mut [T], bounds: &[usize]) -> Vec<&'a mut [T]> {
    let mut out = Vec::with_capacity(bounds.len().saturating_sub(1));
    for w in bounds.windows(2) {
        let (head, tail) = data.split_at_mut(w[1] - w[0]);
        out.push(head);
        data = tail;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn launch_visits_every_index_once() {
        let hits: Vec<AtomicUsize> = (0..100).map(|_| AtomicUsize::new(0)).collect();
        launch(hits.len(), |i| {
            hits[i].fetch_add(1, Ordering::Relaxed);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn map_preserves_order() {
        let v = map(50, |i| i * 2);
        assert_eq!(v, (0..50).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn split_segments_respects_bounds() {
        let mut data = [0_u32; 7];
        let mut parts = split_segments(&mut data, &[0, 2, 2, 7]);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 0);
        parts[2][0] = 9;
        launch_mut(&mut parts, |t, seg| seg.iter_mut().for_each(|x| *x += t as u32));
        assert_eq!(data, [0, 0, 11, 2, 2, 2, 2]);
    }
}
