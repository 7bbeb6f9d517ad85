// Copyright 2025 the LBVH Neighbor List Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: axis-aligned boxes, the periodic simulation box, and particle records.

use alloc::vec::Vec;
use glam::Vec3;

/// Body id of a particle that is not part of any rigid body.
pub const NO_BODY: u32 = u32::MAX;

/// Axis-aligned bounding box in 3D.
///
/// Intervals are closed: two boxes that share a face overlap.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Lower corner.
    pub lo: Vec3,
    /// Upper corner.
    pub hi: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// The inverted box; the identity for [`Aabb::union`].
    pub const EMPTY: Self = Self {
        lo: Vec3::INFINITY,
        hi: Vec3::NEG_INFINITY,
    };

    /// Create a new AABB from its corners.
    pub const fn new(lo: Vec3, hi: Vec3) -> Self {
        Self { lo, hi }
    }

    /// A degenerate box holding a single point.
    pub const fn from_point(p: Vec3) -> Self {
        Self { lo: p, hi: p }
    }

    /// The box `center ± radius` on every axis.
    pub fn around(center: Vec3, radius: f32) -> Self {
        let r = Vec3::splat(radius);
        Self {
            lo: center - r,
            hi: center + r,
        }
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            lo: self.lo.min(other.lo),
            hi: self.hi.max(other.hi),
        }
    }

    /// Grow the box to contain `p`.
    pub fn grow(&mut self, p: Vec3) {
        self.lo = self.lo.min(p);
        self.hi = self.hi.max(p);
    }

    /// Whether the two boxes intersect (touching counts).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lo.cmple(other.hi).all() && self.hi.cmpge(other.lo).all()
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        self.lo.cmple(other.lo).all() && self.hi.cmpge(other.hi).all()
    }

    /// Whether the point lies inside this box.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.lo.cmple(p).all() && self.hi.cmpge(p).all()
    }

    /// Return true if the box is inverted on any axis. Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        self.hi.cmplt(self.lo).any()
    }
}

bitflags::bitflags! {
    /// Per-axis periodicity of a [`SimBox`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Periodic: u8 {
        /// Periodic along the first lattice vector.
        const X = 0b0000_0001;
        /// Periodic along the second lattice vector.
        const Y = 0b0000_0010;
        /// Periodic along the third lattice vector.
        const Z = 0b0000_0100;
    }
}

impl Default for Periodic {
    fn default() -> Self {
        Self::all()
    }
}

impl Periodic {
    /// Flag for axis `0`, `1` or `2`.
    pub const fn for_axis(axis: usize) -> Self {
        match axis {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }

    /// Whether the given axis is periodic.
    pub const fn is_periodic(self, axis: usize) -> bool {
        self.contains(Self::for_axis(axis))
    }
}

/// Triclinic simulation box.
///
/// The box spans edge lengths `l` from the lower corner `lo` with tilt factors
/// `xy`, `xz`, `yz`. Lattice vectors are
///
/// - `a1 = (Lx, 0, 0)`
/// - `a2 = (xy Ly, Ly, 0)`
/// - `a3 = (xz Lz, yz Lz, Lz)`
///
/// A point maps to fractional coordinates in `[0, 1)` along each lattice vector
/// when it lies inside the box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimBox {
    lo: Vec3,
    l: Vec3,
    xy: f32,
    xz: f32,
    yz: f32,
    periodic: Periodic,
}

impl SimBox {
    /// Orthorhombic box centered on the origin, periodic on all axes.
    pub fn new(l: Vec3) -> Self {
        Self {
            lo: -0.5 * l,
            l,
            xy: 0.0,
            xz: 0.0,
            yz: 0.0,
            periodic: Periodic::all(),
        }
    }

    /// Cubic box of edge `l` centered on the origin, periodic on all axes.
    pub fn cube(l: f32) -> Self {
        Self::new(Vec3::splat(l))
    }

    /// Set the tilt factors.
    #[must_use]
    pub fn with_tilt(mut self, xy: f32, xz: f32, yz: f32) -> Self {
        self.xy = xy;
        self.xz = xz;
        self.yz = yz;
        self
    }

    /// Set the periodicity flags.
    #[must_use]
    pub fn with_periodic(mut self, periodic: Periodic) -> Self {
        self.periodic = periodic;
        self
    }

    /// Move the lower corner.
    #[must_use]
    pub fn with_lo(mut self, lo: Vec3) -> Self {
        self.lo = lo;
        self
    }

    /// Edge lengths.
    pub fn lengths(&self) -> Vec3 {
        self.l
    }

    /// Lower corner.
    pub fn lo(&self) -> Vec3 {
        self.lo
    }

    /// Tilt factors `(xy, xz, yz)`.
    pub fn tilt(&self) -> (f32, f32, f32) {
        (self.xy, self.xz, self.yz)
    }

    /// Periodicity flags.
    pub fn periodic(&self) -> Periodic {
        self.periodic
    }

    /// Lattice vector `axis` (`0`, `1` or `2`).
    pub fn lattice_vector(&self, axis: usize) -> Vec3 {
        match axis {
            0 => Vec3::new(self.l.x, 0.0, 0.0),
            1 => Vec3::new(self.xy * self.l.y, self.l.y, 0.0),
            _ => Vec3::new(self.xz * self.l.z, self.yz * self.l.z, self.l.z),
        }
    }

    /// Fractional coordinates of `v` in the box padded by `ghost_width` on every side.
    ///
    /// Points inside the padded box map into `[0, 1)`.
    pub fn make_fraction(&self, v: Vec3, ghost_width: Vec3) -> Vec3 {
        let mut delta = v - self.lo;
        delta.x -= (self.xz - self.yz * self.xy) * v.z + self.xy * v.y;
        delta.y -= self.yz * v.z;
        (delta + ghost_width) / (self.l + 2.0 * ghost_width)
    }

    /// Inverse of [`SimBox::make_fraction`] without ghost padding.
    pub fn make_coordinates(&self, f: Vec3) -> Vec3 {
        let mut v = self.lo + f * self.l;
        v.x += self.xy * v.y + self.xz * v.z;
        v.y += self.yz * v.z;
        v
    }

    /// Wrap a separation vector to its minimum image along the periodic axes.
    pub fn min_image(&self, dr: Vec3) -> Vec3 {
        let mut v = dr;
        if self.periodic.contains(Periodic::Z) {
            let img = rint(v.z / self.l.z);
            v.z -= self.l.z * img;
            v.y -= self.l.z * self.yz * img;
            v.x -= self.l.z * self.xz * img;
        }
        if self.periodic.contains(Periodic::Y) {
            let img = rint(v.y / self.l.y);
            v.y -= self.l.y * img;
            v.x -= self.l.y * self.xy * img;
        }
        if self.periodic.contains(Periodic::X) {
            let img = rint(v.x / self.l.x);
            v.x -= self.l.x * img;
        }
        v
    }

    /// Distances between opposite faces of the box, one per lattice direction.
    pub fn nearest_plane_distance(&self) -> Vec3 {
        let a1 = self.lattice_vector(0);
        let a2 = self.lattice_vector(1);
        let a3 = self.lattice_vector(2);
        let volume = self.l.x * self.l.y * self.l.z;
        Vec3::new(
            volume / a2.cross(a3).length(),
            volume / a3.cross(a1).length(),
            volume / a1.cross(a2).length(),
        )
    }

    /// Translation vectors of every periodic image to search.
    ///
    /// The primary image (zero vector) is always first, followed by every
    /// combination of `-1, 0, 1` lattice shifts along the periodic axes.
    pub fn image_vectors(&self) -> Vec<Vec3> {
        let a = [
            self.lattice_vector(0),
            self.lattice_vector(1),
            self.lattice_vector(2),
        ];
        let span = |axis: usize| -> &'static [i8] {
            if self.periodic.is_periodic(axis) {
                &[-1, 0, 1]
            } else {
                &[0]
            }
        };
        let mut images = Vec::with_capacity(27);
        images.push(Vec3::ZERO);
        for &i in span(0) {
            for &j in span(1) {
                for &k in span(2) {
                    if i == 0 && j == 0 && k == 0 {
                        continue;
                    }
                    images.push(f32::from(i) * a[0] + f32::from(j) * a[1] + f32::from(k) * a[2]);
                }
            }
        }
        images
    }
}

// Round half away from zero; goes through glam so `std` and `libm` builds agree.
#[inline]
fn rint(x: f32) -> f32 {
    Vec3::splat(x).round().x
}

/// A particle record: position with its type tag packed alongside.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position.
    pub pos: Vec3,
    /// Particle type, in `0..n_types`.
    pub type_id: u32,
}

impl Particle {
    /// Create a particle record.
    pub const fn new(pos: Vec3, type_id: u32) -> Self {
        Self { pos, type_id }
    }
}

/// Read-only view of the particle arrays consumed by a rebuild.
///
/// Particles `0..n_local` own a neighbor row; the remainder are ghosts that
/// can be neighbors but are never queried.
#[derive(Copy, Clone, Debug)]
pub struct ParticleData<'a> {
    /// Position and type per particle.
    pub particles: &'a [Particle],
    /// Rigid-body id per particle ([`NO_BODY`] for free particles).
    pub bodies: Option<&'a [u32]>,
    /// Number of local (non-ghost) particles at the start of `particles`.
    pub n_local: usize,
}

impl<'a> ParticleData<'a> {
    /// All particles local, no body information.
    pub fn new(particles: &'a [Particle]) -> Self {
        Self {
            particles,
            bodies: None,
            n_local: particles.len(),
        }
    }

    /// Attach body ids.
    #[must_use]
    pub fn with_bodies(mut self, bodies: &'a [u32]) -> Self {
        self.bodies = Some(bodies);
        self
    }

    /// Treat only the first `n_local` particles as local.
    #[must_use]
    pub fn with_n_local(mut self, n_local: usize) -> Self {
        self.n_local = n_local;
        self
    }

    /// Total number of particles, ghosts included.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when there are no particles at all.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Body id of particle `i`, or [`NO_BODY`] when no body array was given.
    pub fn body(&self, i: usize) -> u32 {
        self.bodies.map_or(NO_BODY, |b| b[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn union_and_overlap() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(1.0), Vec3::splat(2.0));
        assert!(a.overlaps(&b), "touching faces overlap");
        let u = a.union(b);
        assert!(u.contains(&a) && u.contains(&b));
        assert_eq!(Aabb::EMPTY.union(a), a);
        assert!(Aabb::EMPTY.is_empty());
        let c = Aabb::new(Vec3::new(1.5, -1.0, 0.0), Vec3::new(2.0, -0.5, 1.0));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn fraction_round_trip_triclinic() {
        let b = SimBox::new(Vec3::new(10.0, 8.0, 6.0)).with_tilt(0.3, -0.2, 0.1);
        let f = Vec3::new(0.25, 0.5, 0.75);
        let v = b.make_coordinates(f);
        let back = b.make_fraction(v, Vec3::ZERO);
        assert_relative_eq!(back.x, f.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, f.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, f.z, epsilon = 1e-5);
    }

    #[test]
    fn ghost_padding_shrinks_fraction() {
        let b = SimBox::cube(10.0);
        let f = b.make_fraction(Vec3::splat(-5.0), Vec3::splat(1.0));
        assert_relative_eq!(f.x, 1.0 / 12.0, epsilon = 1e-6);
        let f = b.make_fraction(Vec3::splat(-6.0), Vec3::splat(1.0));
        assert_relative_eq!(f.x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn min_image_wraps_periodic_axes_only() {
        let b = SimBox::cube(10.0).with_periodic(Periodic::X | Periodic::Y);
        let v = b.min_image(Vec3::new(9.0, -6.0, 9.0));
        assert_relative_eq!(v.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(v.y, 4.0, epsilon = 1e-5);
        assert_relative_eq!(v.z, 9.0, epsilon = 1e-5);
    }

    #[test]
    fn image_vectors_primary_first() {
        let b = SimBox::cube(4.0);
        let images = b.image_vectors();
        assert_eq!(images.len(), 27);
        assert_eq!(images[0], Vec3::ZERO);
        assert_eq!(images.iter().filter(|v| **v == Vec3::ZERO).count(), 1);

        let slab = b.with_periodic(Periodic::X);
        assert_eq!(slab.image_vectors().len(), 3);
        let closed = b.with_periodic(Periodic::empty());
        assert_eq!(closed.image_vectors(), [Vec3::ZERO]);
    }

    #[test]
    fn plane_distance_of_tilted_box_is_smaller() {
        let b = SimBox::cube(10.0);
        assert_relative_eq!(b.nearest_plane_distance().x, 10.0, epsilon = 1e-5);
        let t = b.with_tilt(0.5, 0.0, 0.0);
        assert!(t.nearest_plane_distance().x < 10.0);
        assert_relative_eq!(t.nearest_plane_distance().y, 10.0, epsilon = 1e-4);
    }
}
