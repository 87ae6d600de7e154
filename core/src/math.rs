//! 2D math type aliases and helpers.
//!
//! Canvas scenes are authored in `f64` to match the persisted document
//! format, so every alias here is double precision. Affine transforms are
//! homogeneous 3x3 matrices acting on column vectors.

pub use nalgebra;

/// 2D vector (f64).
pub type Vec2 = nalgebra::Vector2<f64>;

/// 2D point (f64).
pub type Point2 = nalgebra::Point2<f64>;

/// Homogeneous 2D affine matrix (f64).
pub type Mat3 = nalgebra::Matrix3<f64>;

/// Axis-aligned rectangle in some coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the rectangle spanned by two corners, in any order.
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edges are inclusive.
    pub fn contains(&self, p: Point2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Bounding box of this rectangle after applying `m`.
    pub fn transformed(&self, m: &Mat3) -> Rect {
        let corners = [
            Point2::new(self.x, self.y),
            Point2::new(self.right(), self.y),
            Point2::new(self.right(), self.bottom()),
            Point2::new(self.x, self.bottom()),
        ];
        let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for corner in corners {
            let p = transform_point(m, corner);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::from_corners(min, max)
    }
}

/// Builds a node's local matrix.
///
/// Composition order is translate, rotate, pivot offset, scale, so the pivot
/// is expressed in unscaled local units and rotation happens around the
/// node's layout position.
pub fn affine_from_layout(
    x: f64,
    y: f64,
    angle_degrees: f64,
    scale_x: f64,
    scale_y: f64,
    pivot_x: f64,
    pivot_y: f64,
) -> Mat3 {
    let translation = Mat3::new_translation(&Vec2::new(x, y));
    let rotation = Mat3::new_rotation(angle_degrees.to_radians());
    let pivot = Mat3::new_translation(&Vec2::new(-pivot_x * scale_x, -pivot_y * scale_y));
    let scale = Mat3::new_nonuniform_scaling(&Vec2::new(scale_x, scale_y));
    translation * rotation * pivot * scale
}

/// Applies `m` to a point.
pub fn transform_point(m: &Mat3, p: Point2) -> Point2 {
    m.transform_point(&p)
}

/// Maps `p` through the inverse of `m`.
///
/// Returns `None` when `m` is singular (e.g. a zero scale somewhere in the
/// chain).
pub fn inverse_transform_point(m: &Mat3, p: Point2) -> Option<Point2> {
    m.try_inverse().map(|inv| inv.transform_point(&p))
}

/// Re-expresses a world-space point in the local space of a parent whose
/// world matrix is `parent_world`.
pub fn project_to_local(world: Point2, parent_world: &Mat3) -> Option<Point2> {
    inverse_transform_point(parent_world, world)
}

/// Approximate equality for coordinates coming out of matrix products.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_layout() {
        let m = affine_from_layout(0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0);
        assert!((m - Mat3::identity()).norm() < 1e-12);
    }

    #[test]
    fn translation_only() {
        let m = affine_from_layout(50.0, 25.0, 0.0, 1.0, 1.0, 0.0, 0.0);
        let p = transform_point(&m, Point2::new(10.0, 10.0));
        assert!(approx_eq(p.x, 60.0));
        assert!(approx_eq(p.y, 35.0));
    }

    #[test]
    fn rotation_quarter_turn() {
        let m = affine_from_layout(0.0, 0.0, 90.0, 1.0, 1.0, 0.0, 0.0);
        let p = transform_point(&m, Point2::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pivot_offsets_in_scaled_units() {
        let m = affine_from_layout(0.0, 0.0, 0.0, 2.0, 2.0, 5.0, 5.0);
        let p = transform_point(&m, Point2::new(5.0, 5.0));
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.y, 0.0));
    }

    #[test]
    fn project_roundtrip() {
        let parent = affine_from_layout(50.0, 50.0, 30.0, 2.0, 0.5, 0.0, 0.0);
        let world = transform_point(&parent, Point2::new(7.0, -3.0));
        let local = project_to_local(world, &parent).unwrap();
        assert!((local.x - 7.0).abs() < 1e-9);
        assert!((local.y + 3.0).abs() < 1e-9);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = affine_from_layout(0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        assert!(inverse_transform_point(&m, Point2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn rect_contains_and_corners() {
        let r = Rect::from_corners(Point2::new(10.0, 10.0), Point2::new(0.0, 0.0));
        assert_eq!(r, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(r.contains(Point2::new(10.0, 10.0)));
        assert!(!r.contains(Point2::new(10.1, 5.0)));
        assert!(r.contains_rect(&Rect::new(1.0, 1.0, 2.0, 2.0)));
    }

    #[test]
    fn rect_transformed_bounds() {
        let m = affine_from_layout(0.0, 0.0, 90.0, 1.0, 1.0, 0.0, 0.0);
        let r = Rect::new(0.0, 0.0, 10.0, 5.0).transformed(&m);
        assert!((r.x + 5.0).abs() < 1e-9);
        assert!(r.y.abs() < 1e-9);
        assert!((r.width - 5.0).abs() < 1e-9);
        assert!((r.height - 10.0).abs() < 1e-9);
    }
}
