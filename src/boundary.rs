//! Out-of-range sample access policies.
//!
//! Two extensions are supported:
//! - **Mirror** (half-sample symmetric): index `-1` maps to `0`, `n` to `n-1`,
//!   and the pattern repeats with period `2n`.
//! - **Periodic**: index `-1` maps to `n-1`, `n` to `0`.
//!
//! Hot loops are generic over [`BoundaryAccess`] so each policy is
//! monomorphized; [`Boundary`] is the runtime tag carried in parameters.
use serde::{Deserialize, Serialize};

/// Maps an arbitrary signed index onto `0..n`.
pub trait BoundaryAccess {
    /// Fold `i` into `0..n`. `n` must be non-zero.
    fn wrap(i: isize, n: usize) -> usize;
}

/// Half-sample symmetric reflection.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mirror;

/// Wrap-around extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct Periodic;

impl BoundaryAccess for Mirror {
    #[inline]
    fn wrap(i: isize, n: usize) -> usize {
        debug_assert!(n > 0);
        if i >= 0 && (i as usize) < n {
            return i as usize;
        }
        let n = n as isize;
        let m = i.rem_euclid(2 * n);
        if m >= n {
            (2 * n - 1 - m) as usize
        } else {
            m as usize
        }
    }
}

impl BoundaryAccess for Periodic {
    #[inline]
    fn wrap(i: isize, n: usize) -> usize {
        debug_assert!(n > 0);
        if i >= 0 && (i as usize) < n {
            return i as usize;
        }
        i.rem_euclid(n as isize) as usize
    }
}

/// Boundary condition selected for a restoration run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    #[default]
    Mirror,
    Periodic,
}

impl Boundary {
    /// Runtime-dispatched variant of [`BoundaryAccess::wrap`].
    #[inline]
    pub fn wrap(self, i: isize, n: usize) -> usize {
        match self {
            Boundary::Mirror => Mirror::wrap(i, n),
            Boundary::Periodic => Periodic::wrap(i, n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_reflects_one_step_past_each_edge() {
        let w = 5;
        assert_eq!(Mirror::wrap(-1, w), 0);
        assert_eq!(Mirror::wrap(-2, w), 1);
        assert_eq!(Mirror::wrap(5, w), 4);
        assert_eq!(Mirror::wrap(6, w), 3);
        assert_eq!(Mirror::wrap(3, w), 3);
    }

    #[test]
    fn mirror_handles_offsets_larger_than_the_image() {
        // ... 0 1 1 0 | 0 1 | 1 0 0 1 ...
        let w = 2;
        assert_eq!(Mirror::wrap(-3, w), 1);
        assert_eq!(Mirror::wrap(-4, w), 0);
        assert_eq!(Mirror::wrap(-5, w), 0);
        assert_eq!(Mirror::wrap(4, w), 0);
        assert_eq!(Mirror::wrap(5, w), 1);
        assert_eq!(Mirror::wrap(6, w), 1);
        assert_eq!(Mirror::wrap(7, 1), 0);
    }

    #[test]
    fn periodic_wraps_around() {
        let w = 5;
        assert_eq!(Periodic::wrap(-1, w), 4);
        assert_eq!(Periodic::wrap(5, w), 0);
        assert_eq!(Periodic::wrap(-6, w), 4);
        assert_eq!(Periodic::wrap(12, w), 2);
    }

    #[test]
    fn runtime_tag_matches_policy() {
        for i in -12..12 {
            assert_eq!(Boundary::Mirror.wrap(i, 4), Mirror::wrap(i, 4));
            assert_eq!(Boundary::Periodic.wrap(i, 4), Periodic::wrap(i, 4));
        }
    }

    #[test]
    fn boundary_deserializes_from_snake_case() {
        let b: Boundary = serde_json::from_str("\"periodic\"").unwrap();
        assert_eq!(b, Boundary::Periodic);
    }
}
