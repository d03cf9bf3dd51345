use glam::Vec3;
use std::ops::Index;

use super::compound::Compound;
use crate::physics::body_properties::RigidPose;
use crate::physics::handles::ShapeHandle;
use crate::utilities::bounding_box::BoundingBox;

/// Coarse classification used by the algorithm registry to pick a strategy for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeCategory {
    /// Shapes with no hollowed out regions.
    Convex = 0,
    /// Surfaces such as triangle meshes.
    Concave = 1,
    /// Collections of child shapes.
    Compound = 2,
}

impl ShapeCategory {
    /// Number of categories.
    pub const COUNT: usize = 3;

    /// All categories in index order.
    pub const ALL: [ShapeCategory; Self::COUNT] = [
        ShapeCategory::Convex,
        ShapeCategory::Concave,
        ShapeCategory::Compound,
    ];

    /// Index into registry tables.
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Convex primitives. Geometric queries on them belong to the narrow phase tester.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvexShape {
    /// Sphere centered on the local origin.
    Sphere {
        /// Radius of the sphere.
        radius: f32,
    },
    /// Box centered on the local origin.
    Box {
        /// Half of the box's extent along each local axis.
        half_extents: Vec3,
    },
    /// Capsule aligned with the local Y axis.
    Capsule {
        /// Radius of the swept sphere.
        radius: f32,
        /// Half of the length of the internal segment.
        half_length: f32,
    },
    /// Convex hull of a point set.
    ConvexHull {
        /// Hull points in local space.
        points: Vec<Vec3>,
    },
}

impl ConvexShape {
    /// Computes local space bounds.
    pub fn local_bounds(&self) -> BoundingBox {
        match self {
            ConvexShape::Sphere { radius } => BoundingBox::from_center(Vec3::ZERO, Vec3::splat(*radius)),
            ConvexShape::Box { half_extents } => BoundingBox::from_center(Vec3::ZERO, *half_extents),
            ConvexShape::Capsule {
                radius,
                half_length,
            } => BoundingBox::from_center(
                Vec3::ZERO,
                Vec3::new(*radius, half_length + radius, *radius),
            ),
            ConvexShape::ConvexHull { points } => {
                BoundingBox::from_points(points).unwrap_or_default()
            }
        }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions in local space.
    pub vertices: Vec<Vec3>,
    /// Three vertex indices per triangle.
    pub triangles: Vec<[u32; 3]>,
    bounds: BoundingBox,
}

impl TriangleMesh {
    /// Creates a mesh and caches its local bounds.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        debug_assert!(
            triangles
                .iter()
                .flatten()
                .all(|&index| (index as usize) < vertices.len()),
            "Triangle indices must reference existing vertices."
        );
        let bounds = BoundingBox::from_points(&vertices).unwrap_or_default();
        Self {
            vertices,
            triangles,
            bounds,
        }
    }

    /// Local space bounds of every vertex.
    #[inline(always)]
    pub fn local_bounds(&self) -> BoundingBox {
        self.bounds
    }
}

/// Any shape a collision body can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A convex primitive.
    Convex(ConvexShape),
    /// A concave surface.
    Concave(TriangleMesh),
    /// A list of child shapes.
    Compound(Compound),
}

impl Shape {
    /// Category used for strategy selection.
    #[inline(always)]
    pub fn category(&self) -> ShapeCategory {
        match self {
            Shape::Convex(_) => ShapeCategory::Convex,
            Shape::Concave(_) => ShapeCategory::Concave,
            Shape::Compound(_) => ShapeCategory::Compound,
        }
    }

    /// Gets the compound data if this is a compound.
    #[inline(always)]
    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Shape::Compound(compound) => Some(compound),
            _ => None,
        }
    }
}

/// Registry of every shape referenced by bodies and compound children.
#[derive(Debug, Clone, Default)]
pub struct Shapes {
    shapes: Vec<Shape>,
}

impl Shapes {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a shape and returns its handle.
    pub fn add(&mut self, shape: Shape) -> ShapeHandle {
        self.shapes.push(shape);
        ShapeHandle(self.shapes.len() - 1)
    }

    /// Number of registered shapes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the registry is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Gets a shape.
    #[inline(always)]
    pub fn get(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(handle.0)
    }

    /// Gets a shape mutably. Editing a compound through [`Compound`]'s methods bumps its revision.
    #[inline(always)]
    pub fn get_mut(&mut self, handle: ShapeHandle) -> Option<&mut Shape> {
        self.shapes.get_mut(handle.0)
    }

    /// Computes the world space bounds of a shape at `pose`, recursing into compounds.
    pub fn compute_bounds(&self, handle: ShapeHandle, pose: &RigidPose) -> BoundingBox {
        match &self[handle] {
            Shape::Convex(convex) => convex
                .local_bounds()
                .transformed(pose.position, pose.orientation),
            Shape::Concave(mesh) => mesh
                .local_bounds()
                .transformed(pose.position, pose.orientation),
            Shape::Compound(compound) => {
                let mut children = compound.children().iter().map(|child| {
                    self.compute_bounds(child.shape, &pose.compose(&child.local_pose))
                });
                let first = children
                    .next()
                    .unwrap_or_else(|| BoundingBox::from_center(pose.position, Vec3::ZERO));
                children.fold(first, BoundingBox::create_merged)
            }
        }
    }
}

impl Index<ShapeHandle> for Shapes {
    type Output = Shape;

    fn index(&self, handle: ShapeHandle) -> &Shape {
        &self.shapes[handle.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collidables::compound::CompoundChild;

    #[test]
    fn compound_bounds_cover_children() {
        let mut shapes = Shapes::new();
        let sphere = shapes.add(Shape::Convex(ConvexShape::Sphere { radius: 0.5 }));
        let compound = shapes.add(Shape::Compound(Compound::new(vec![
            CompoundChild::new(RigidPose::from_position(Vec3::new(-2.0, 0.0, 0.0)), sphere),
            CompoundChild::new(RigidPose::from_position(Vec3::new(2.0, 0.0, 0.0)), sphere),
        ])));
        assert_eq!(shapes[compound].category(), ShapeCategory::Compound);
        let bounds = shapes.compute_bounds(compound, &RigidPose::from_position(Vec3::Y));
        assert!((bounds.min - Vec3::new(-2.5, 0.5, -0.5)).length() < 1e-5);
        assert!((bounds.max - Vec3::new(2.5, 1.5, 0.5)).length() < 1e-5);
    }

    #[test]
    fn mesh_bounds_are_cached() {
        let mesh = TriangleMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![[0, 1, 2]],
        );
        assert_eq!(mesh.local_bounds().max, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(Shape::Concave(mesh).category(), ShapeCategory::Concave);
    }
}
