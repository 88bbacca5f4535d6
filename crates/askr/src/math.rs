//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Pose2D`] is the position/rotation/scale triple every
//! 2D entity carries, and [`IRect`] is the integer box the quadtree indexes.

pub use glam::{IVec2, Vec2};

use serde::{Deserialize, Serialize};

/// A 2D pose: position, rotation (degrees) and scale.
///
/// Poses compose parent-first: `parent.compose(&local)` yields the child's
/// absolute pose. Scale multiplies the child's scale but does not stretch its
/// offset from the parent; rotation swings the offset around the parent's
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub position: Vec2,
    /// Rotation in degrees.
    pub rotation: f32,
    pub scale: Vec2,
}

impl Pose2D {
    /// Identity pose (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    /// Create a pose at the given position.
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::IDENTITY
        }
    }

    /// Return a copy with the given rotation in degrees.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Return a copy with the given scale.
    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Apply `local` inside this pose's space.
    pub fn compose(&self, local: &Pose2D) -> Pose2D {
        Pose2D {
            position: self.position + rotate_degrees(local.position, self.rotation),
            rotation: self.rotation + local.rotation,
            scale: self.scale * local.scale,
        }
    }

    /// Express the absolute pose `world` relative to this pose.
    ///
    /// Inverse of [`compose`](Self::compose): `p.compose(&p.to_local(&w)) == w`
    /// up to float error. A zero scale component on `self` leaves the matching
    /// component of `world.scale` untouched.
    pub fn to_local(&self, world: &Pose2D) -> Pose2D {
        Pose2D {
            position: rotate_degrees(world.position - self.position, -self.rotation),
            rotation: world.rotation - self.rotation,
            scale: Vec2::new(
                ratio(world.scale.x, self.scale.x),
                ratio(world.scale.y, self.scale.y),
            ),
        }
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rotate `v` counter-clockwise by `degrees` around the origin.
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    if degrees == 0.0 {
        return v;
    }
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

fn ratio(value: f32, by: f32) -> f32 {
    if by == 0.0 { value } else { value / by }
}

/// An integer axis-aligned rectangle with inclusive bounds.
///
/// Used by the quadtree, which splits its region with integer halving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl IRect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min: IVec2::new(min_x.min(max_x), min_y.min(max_y)),
            max: IVec2::new(min_x.max(max_x), min_y.max(max_y)),
        }
    }

    /// A degenerate rectangle covering a single point.
    pub fn from_point(p: IVec2) -> Self {
        Self { min: p, max: p }
    }

    /// Build from a center and half extents.
    pub fn from_center_half(center: IVec2, half: IVec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Center point, rounded toward negative infinity.
    pub fn center(&self) -> IVec2 {
        IVec2::new(
            (self.min.x + self.max.x).div_euclid(2),
            (self.min.y + self.max.y).div_euclid(2),
        )
    }

    /// Half extents, rounded down.
    pub fn half_extents(&self) -> IVec2 {
        IVec2::new(self.width().div_euclid(2), self.height().div_euclid(2))
    }

    pub fn contains_point(&self, p: IVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Inclusive overlap test: touching edges count as intersecting.
    pub fn intersects(&self, other: &IRect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn compose_then_to_local_round_trips() {
        let parent = Pose2D::from_xy(5.0, -3.0)
            .with_rotation(30.0)
            .with_scale(Vec2::new(2.0, 0.5));
        let world = Pose2D::from_xy(12.0, 4.0)
            .with_rotation(75.0)
            .with_scale(Vec2::new(3.0, 3.0));

        let back = parent.compose(&parent.to_local(&world));
        assert_abs_diff_eq!(back.position.x, world.position.x, epsilon = 1e-4);
        assert_abs_diff_eq!(back.position.y, world.position.y, epsilon = 1e-4);
        assert_abs_diff_eq!(back.rotation, world.rotation, epsilon = 1e-4);
        assert_abs_diff_eq!(back.scale.x, world.scale.x, epsilon = 1e-6);
    }

    #[test]
    fn parent_scale_does_not_stretch_offset() {
        let parent = Pose2D::IDENTITY.with_scale(Vec2::splat(4.0));
        let child = parent.compose(&Pose2D::from_xy(10.0, 0.0));
        assert_eq!(child.position, Vec2::new(10.0, 0.0));
        assert_eq!(child.scale, Vec2::splat(4.0));
    }

    #[test]
    fn rotation_swings_offset_around_parent() {
        let parent = Pose2D::from_xy(1.0, 1.0).with_rotation(90.0);
        let child = parent.compose(&Pose2D::from_xy(2.0, 0.0));
        assert_abs_diff_eq!(child.position.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(child.position.y, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(child.rotation, 90.0);
    }

    #[test]
    fn irect_center_and_half_use_integer_halving() {
        let r = IRect::new(0, 0, 101, 50);
        assert_eq!(r.center(), IVec2::new(50, 25));
        assert_eq!(r.half_extents(), IVec2::new(50, 25));

        let neg = IRect::new(-3, -3, 0, 0);
        assert_eq!(neg.center(), IVec2::new(-2, -2));
    }

    #[test]
    fn irect_touching_edges_intersect() {
        let a = IRect::new(0, 0, 10, 10);
        assert!(a.intersects(&IRect::new(10, 10, 20, 20)));
        assert!(!a.intersects(&IRect::new(11, 0, 20, 10)));
        assert!(a.contains_point(IVec2::new(10, 0)));
    }
}
