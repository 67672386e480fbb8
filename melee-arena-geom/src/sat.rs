//! Separating-axis overlap tests for the shapes the simulation uses.

use crate::{Circle, Polygon, Vec2};

/// Projects every vertex onto `axis` and returns the covered interval.
fn project_polygon(poly: &Polygon, axis: Vec2) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in poly.vertices() {
        let d = v.dot(axis);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

fn project_circle(circle: Circle, axis: Vec2) -> (f32, f32) {
    let center = circle.center.dot(axis);
    (center - circle.radius, center + circle.radius)
}

fn intervals_separated(a: (f32, f32), b: (f32, f32)) -> bool {
    a.1 < b.0 || b.1 < a.0
}

/// True iff the circle and the polygon share any point.
pub fn circle_overlaps_polygon(circle: Circle, poly: &Polygon) -> bool {
    // Edge normals.
    for (from, to) in poly.edges() {
        let axis = (to - from).perp().normalized();
        if intervals_separated(project_polygon(poly, axis), project_circle(circle, axis)) {
            return false;
        }
    }

    // Axis from the circle center to the closest vertex. Catches the corner
    // case every edge-normal axis misses.
    let mut closest = poly.vertices()[0];
    let mut best = f32::INFINITY;
    for &v in poly.vertices() {
        let d = circle.center.distance(v);
        if d < best {
            best = d;
            closest = v;
        }
    }
    let axis = (closest - circle.center).normalized();
    if axis == Vec2::ZERO {
        // Center sits exactly on a vertex.
        return true;
    }
    !intervals_separated(project_polygon(poly, axis), project_circle(circle, axis))
}

/// True iff two polygons share any point (both treated as convex).
pub fn polygons_overlap(a: &Polygon, b: &Polygon) -> bool {
    for poly in [a, b] {
        for (from, to) in poly.edges() {
            let axis = (to - from).perp().normalized();
            if intervals_separated(project_polygon(a, axis), project_polygon(b, axis)) {
                return false;
            }
        }
    }
    true
}
