use glam::{Quat, Vec3};
use std::fmt;

/// Provides simple axis-aligned bounding box functionality.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Location with the lowest X, Y, and Z coordinates in the axis-aligned bounding box.
    pub min: Vec3,
    /// Location with the highest X, Y, and Z coordinates in the axis-aligned bounding box.
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}

impl BoundingBox {
    /// Constructs a bounding box from the specified minimum and maximum.
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            min.cmple(max).all(),
            "Bounding box minimum must not exceed its maximum."
        );
        Self { min, max }
    }

    /// Constructs a bounding box centered on `center` with the given half extents.
    #[inline]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Determines if a bounding box intersects another bounding box.
    /// Touching faces count as intersecting.
    #[inline]
    pub fn intersects(a: Self, b: Self) -> bool {
        Self::intersects_bounds(a.min, a.max, b.min, b.max)
    }

    /// Determines if a bounding box intersects another bounding box.
    #[inline]
    pub fn intersects_bounds(min_a: Vec3, max_a: Vec3, min_b: Vec3, max_b: Vec3) -> bool {
        let no_intersection_on_axes = max_a.cmplt(min_b) | max_b.cmplt(min_a);
        !no_intersection_on_axes.any()
    }

    /// Computes a bounding box which contains two other bounding boxes.
    #[inline]
    pub fn create_merged(a: Self, b: Self) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Computes the volume of the bounding box.
    #[inline]
    pub fn compute_volume(&self) -> f32 {
        let diagonal = self.max - self.min;
        diagonal.x * diagonal.y * diagonal.z
    }

    /// Creates the smallest possible bounding box that contains a list of points.
    /// Returns `None` for an empty list.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for point in rest {
            min = min.min(*point);
            max = max.max(*point);
        }
        Some(Self { min, max })
    }

    /// Computes the world space bounds of this local box after rotating by `orientation`
    /// and translating by `position`.
    pub fn transformed(&self, position: Vec3, orientation: Quat) -> Self {
        let local_center = (self.min + self.max) * 0.5;
        let local_half = (self.max - self.min) * 0.5;
        let basis = glam::Mat3::from_quat(orientation);
        // Projected extent along each world axis is the abs-rotated half extent.
        let abs_basis = glam::Mat3::from_cols(
            basis.x_axis.abs(),
            basis.y_axis.abs(),
            basis.z_axis.abs(),
        );
        let world_half = abs_basis * local_half;
        let world_center = position + orientation * local_center;
        Self {
            min: world_center - world_half,
            max: world_center + world_half,
        }
    }

    /// Expands the box by `margin` on every side.
    #[inline]
    pub fn expanded(&self, margin: f32) -> Self {
        let margin = Vec3::splat(margin);
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.min, self.max)
    }
}
