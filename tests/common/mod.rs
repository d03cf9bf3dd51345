#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use glam::Vec3;
use rust_collision_islands::{
    Bodies, BodyHandle, BodyView, CollisionBody, CollisionProxy, Compound, CompoundChild,
    ConvexShape, DispatcherInfo, INarrowPhaseTester, ManifoldResult, ProxyHandle, RigidPose, Shape,
    ShapeHandle, Shapes, TriangleMesh,
};

/// Tester that reports one fixed-depth contact per discrete query and scripted times of impact.
///
/// Times of impact are looked up by compound child index when the query involves a child view, and fall
/// back to `time_of_impact` otherwise.
pub struct ScriptedTester {
    pub contact_depth: f32,
    pub time_of_impact: f32,
    pub child_time_of_impact: Vec<f32>,
    convex_convex_calls: Cell<usize>,
    convex_concave_calls: Cell<usize>,
    time_of_impact_calls: Cell<usize>,
    concave_queries: RefCell<Vec<(BodyHandle, BodyHandle)>>,
}

impl Default for ScriptedTester {
    fn default() -> Self {
        Self {
            contact_depth: -0.01,
            time_of_impact: 1.0,
            child_time_of_impact: Vec::new(),
            convex_convex_calls: Cell::new(0),
            convex_concave_calls: Cell::new(0),
            time_of_impact_calls: Cell::new(0),
            concave_queries: RefCell::new(Vec::new()),
        }
    }
}

impl ScriptedTester {
    pub fn with_child_time_of_impact(values: Vec<f32>) -> Self {
        Self {
            child_time_of_impact: values,
            ..Default::default()
        }
    }

    pub fn convex_convex_calls(&self) -> usize {
        self.convex_convex_calls.get()
    }

    pub fn convex_concave_calls(&self) -> usize {
        self.convex_concave_calls.get()
    }

    pub fn time_of_impact_calls(&self) -> usize {
        self.time_of_impact_calls.get()
    }

    /// `(convex, concave)` body pairs in the order the concave queries arrived.
    pub fn concave_queries(&self) -> Vec<(BodyHandle, BodyHandle)> {
        self.concave_queries.borrow().clone()
    }

    fn report_contact(&self, a: &BodyView<'_>, b: &BodyView<'_>, result: &mut ManifoldResult<'_>) {
        let normal = (a.world_transform.position - b.world_transform.position)
            .try_normalize()
            .unwrap_or(Vec3::Y);
        result.add_contact_point(normal, b.world_transform.position, self.contact_depth);
    }

    fn scripted_time_of_impact(&self, views: [&BodyView<'_>; 2]) -> f32 {
        self.time_of_impact_calls.set(self.time_of_impact_calls.get() + 1);
        views
            .iter()
            .filter_map(|view| usize::try_from(view.index).ok())
            .find_map(|index| self.child_time_of_impact.get(index).copied())
            .unwrap_or(self.time_of_impact)
    }
}

impl INarrowPhaseTester for ScriptedTester {
    fn convex_convex(
        &self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        _info: &DispatcherInfo,
        result: &mut ManifoldResult<'_>,
    ) {
        self.convex_convex_calls.set(self.convex_convex_calls.get() + 1);
        self.report_contact(a, b, result);
    }

    fn convex_concave(
        &self,
        convex: &BodyView<'_>,
        concave: &BodyView<'_>,
        _info: &DispatcherInfo,
        result: &mut ManifoldResult<'_>,
    ) {
        self.convex_concave_calls.set(self.convex_concave_calls.get() + 1);
        self.concave_queries.borrow_mut().push((convex.body, concave.body));
        self.report_contact(convex, concave, result);
    }

    fn convex_convex_time_of_impact(
        &self,
        a: &BodyView<'_>,
        b: &BodyView<'_>,
        _info: &DispatcherInfo,
    ) -> f32 {
        self.scripted_time_of_impact([a, b])
    }

    fn convex_concave_time_of_impact(
        &self,
        convex: &BodyView<'_>,
        concave: &BodyView<'_>,
        _info: &DispatcherInfo,
    ) -> f32 {
        self.scripted_time_of_impact([convex, concave])
    }
}

/// Shapes shared by the scenarios: a unit sphere, a flat two-triangle ground mesh and a compound of two
/// spheres one unit either side of its origin.
pub struct Scene {
    pub shapes: Shapes,
    pub bodies: Bodies,
    pub sphere: ShapeHandle,
    pub mesh: ShapeHandle,
    pub compound: ShapeHandle,
    next_proxy: u32,
}

impl Scene {
    pub fn new() -> Self {
        let mut shapes = Shapes::new();
        let sphere = shapes.add(Shape::Convex(ConvexShape::Sphere { radius: 1.0 }));
        let mesh = shapes.add(Shape::Concave(TriangleMesh::new(
            vec![
                Vec3::new(-10.0, 0.0, -10.0),
                Vec3::new(10.0, 0.0, -10.0),
                Vec3::new(10.0, 0.0, 10.0),
                Vec3::new(-10.0, 0.0, 10.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )));
        let compound = shapes.add(Shape::Compound(Compound::new(vec![
            CompoundChild::new(RigidPose::from_position(Vec3::new(-1.0, 0.0, 0.0)), sphere),
            CompoundChild::new(RigidPose::from_position(Vec3::new(1.0, 0.0, 0.0)), sphere),
        ])));
        Self {
            shapes,
            bodies: Bodies::new(),
            sphere,
            mesh,
            compound,
            next_proxy: 0,
        }
    }

    /// Adds a body and returns it with a proxy covering its current bounds.
    pub fn add(&mut self, body: CollisionBody) -> (BodyHandle, CollisionProxy) {
        let is_static = body.is_static();
        let aabb = self.shapes.compute_bounds(body.shape, &body.world_transform);
        let handle = self.bodies.add(body);
        let proxy_handle = ProxyHandle(self.next_proxy);
        self.next_proxy += 1;
        let proxy = if is_static {
            CollisionProxy::new_static(proxy_handle, handle, aabb)
        } else {
            CollisionProxy::new(proxy_handle, handle, aabb)
        };
        (handle, proxy)
    }

    pub fn add_sphere(&mut self, position: Vec3) -> (BodyHandle, CollisionProxy) {
        self.add(CollisionBody::new(self.sphere, RigidPose::from_position(position)))
    }
}
