//! Angular arcs on [0, 2π).
//!
//! An arc is given by wrapped endpoints and runs counter-clockwise from `min`
//! to `max`; `min > max` means it crosses the 0/2π seam.

use std::f32::consts::TAU;

use crate::wrap_angle;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcSpan {
    pub min: f32,
    pub max: f32,
}

impl ArcSpan {
    /// Arc of half-width `half_angle` around `center`; endpoints are wrapped.
    pub fn around(center: f32, half_angle: f32) -> Self {
        Self {
            min: wrap_angle(center - half_angle),
            max: wrap_angle(center + half_angle),
        }
    }

    /// The 1 or 2 contiguous [lo, hi] intervals the arc covers.
    fn intervals(self) -> [(f32, f32); 2] {
        if self.min <= self.max {
            // Second slot is an empty placeholder.
            [(self.min, self.max), (0.0, -1.0)]
        } else {
            [(self.min, TAU), (0.0, self.max)]
        }
    }
}

/// True iff the two arcs share any angle.
pub fn arcs_overlap(a: ArcSpan, b: ArcSpan) -> bool {
    for (a_lo, a_hi) in a.intervals() {
        if a_hi < a_lo {
            continue;
        }
        for (b_lo, b_hi) in b.intervals() {
            if b_hi < b_lo {
                continue;
            }
            if a_lo <= b_hi && b_lo <= a_hi {
                return true;
            }
        }
    }
    false
}
