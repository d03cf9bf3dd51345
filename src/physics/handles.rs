use std::fmt;

// Newtype Pattern for enhanced type safety
/// Index of a collision body in [`Bodies`](crate::physics::collision_body::Bodies).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BodyHandle(pub usize);

/// Identifier of a broad-phase proxy. Proxies are owned by the broad phase; this crate only reads them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProxyHandle(pub u32);

/// Slot of a persistent contact manifold inside the dispatcher that created it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ManifoldHandle(pub usize);

/// Index of a shape inside [`Shapes`](crate::physics::collidables::shape::Shapes).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ShapeHandle(pub usize);

// Simple implementations for Display for user-friendliness
impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyHandle<{}>", self.0)
    }
}

impl fmt::Display for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyHandle<{}>", self.0)
    }
}

impl fmt::Display for ManifoldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManifoldHandle<{}>", self.0)
    }
}

impl fmt::Display for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeHandle<{}>", self.0)
    }
}
