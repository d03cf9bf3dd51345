mod common;

use std::collections::BTreeMap;
use std::sync::Mutex;

use common::{Scene, ScriptedTester};
use glam::Vec3;
use proptest::prelude::*;
use rust_collision_islands::utilities::collections::UnionFind;
use rust_collision_islands::{
    BodyHandle, BroadPhaseEvent, CollisionBody, CollisionConfiguration, CollisionPipeline, ConstraintLink,
    DispatchFunc, IThreadDispatcher, Island, IslandDispatcher, PersistentManifold, RigidPose,
    ScopedThreadDispatcher, SequentialThreadDispatcher,
};

/// Three separate stacks of spheres resting on a static ground, plus one loose sphere.
fn stacked_scene() -> (Scene, CollisionPipeline, Vec<ConstraintLink>) {
    let mut scene = Scene::new();
    let mesh = scene.mesh;
    let (_, ground) = scene.add(CollisionBody::new_static(mesh, RigidPose::IDENTITY));
    let mut events = Vec::new();
    let mut handles = Vec::new();
    for stack in 0..3 {
        let mut below = ground;
        for level in 0..3 {
            let (handle, proxy) =
                scene.add_sphere(Vec3::new(stack as f32 * 5.0, 0.99 + level as f32 * 1.9, 0.0));
            events.push(BroadPhaseEvent::OverlapBegin(below, proxy));
            below = proxy;
            handles.push(handle);
        }
    }
    let (loose, _) = scene.add_sphere(Vec3::new(-20.0, 5.0, 0.0));

    let mut pipeline = CollisionPipeline::new(&CollisionConfiguration::default()).expect("valid configuration");
    pipeline.step(
        &events,
        &mut scene.bodies,
        &scene.shapes,
        &ScriptedTester::default(),
        DispatchFunc::Discrete,
        &mut |_: &[BodyHandle], _: &[&PersistentManifold], _: i32| {},
    );
    // A joint ties the loose sphere to the top of the first stack.
    let constraints = vec![ConstraintLink::new(loose, handles[2])];
    (scene, pipeline, constraints)
}

fn simulate<D: IThreadDispatcher>(thread_dispatcher: &D) -> (Vec<Island>, Vec<(i32, usize, usize, usize)>) {
    let (mut scene, pipeline, constraints) = stacked_scene();
    let mut island_dispatcher = IslandDispatcher::new();
    island_dispatcher.build(
        &mut scene.bodies,
        pipeline.dispatcher(),
        pipeline.pair_cache(),
        &constraints,
    );
    let seen = Mutex::new(Vec::new());
    let simulated = island_dispatcher.dispatch_islands(
        &|_worker: usize, island: &Island| {
            let summary = (
                island.id,
                island.controllers.len(),
                island.manifolds.len(),
                island.constraints.len(),
            );
            seen.lock().expect("not poisoned").push(summary);
        },
        thread_dispatcher,
    );
    let mut seen = seen.into_inner().expect("not poisoned");
    assert_eq!(simulated, seen.len());
    seen.sort();
    (island_dispatcher.islands().to_vec(), seen)
}

#[test]
fn island_results_do_not_depend_on_thread_count() {
    let (sequential_islands, sequential) = simulate(&SequentialThreadDispatcher);
    let (threaded_islands, threaded) = simulate(&ScopedThreadDispatcher::new(4));
    assert_eq!(sequential_islands, threaded_islands);
    assert_eq!(sequential, threaded);

    assert_eq!(sequential_islands.len(), 3);
    let mut controllers: Vec<usize> = sequential.iter().map(|island| island.1).collect();
    controllers.sort();
    assert_eq!(controllers, vec![3, 3, 4]);
    // Ground contacts land in the island of their dynamic body.
    assert!(sequential.iter().all(|island| island.2 == 3));
    assert_eq!(sequential.iter().map(|island| island.3).sum::<usize>(), 1);
}

#[test]
fn islands_share_no_member() {
    let (islands, _) = simulate(&ScopedThreadDispatcher::new(2));
    let mut owner = BTreeMap::new();
    for island in &islands {
        for controller in &island.controllers {
            assert!(owner.insert(*controller, island.id).is_none());
        }
    }
    let mut manifolds: Vec<_> = islands.iter().flat_map(|island| island.manifolds.clone()).collect();
    let total = manifolds.len();
    manifolds.sort();
    manifolds.dedup();
    assert_eq!(manifolds.len(), total);
}

fn naive_components(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut label: Vec<usize> = (0..count).collect();
    let mut changed = true;
    while changed {
        changed = false;
        for &(a, b) in edges {
            let low = label[a].min(label[b]);
            if label[a] != low || label[b] != low {
                label[a] = low;
                label[b] = low;
                changed = true;
            }
        }
    }
    label
}

proptest! {
    #[test]
    fn union_find_matches_naive_components(
        count in 1usize..24,
        raw_edges in prop::collection::vec((0usize..24, 0usize..24), 0..40),
    ) {
        let edges: Vec<_> = raw_edges
            .into_iter()
            .map(|(a, b)| (a % count, b % count))
            .collect();
        let mut union_find = UnionFind::new();
        union_find.reset(count);
        for &(a, b) in &edges {
            union_find.unite(a, b);
        }
        let labels = naive_components(count, &edges);
        for a in 0..count {
            for b in 0..count {
                prop_assert_eq!(
                    union_find.find_readonly(a) == union_find.find_readonly(b),
                    labels[a] == labels[b]
                );
            }
        }

        union_find.sort_islands();
        let mut finished = Vec::new();
        let mut current = None;
        for index in 0..count {
            let element = union_find.element(index);
            if current != Some(element.id) {
                // Each island appears as one contiguous run.
                prop_assert!(!finished.contains(&element.id));
                if let Some(previous) = current {
                    finished.push(previous);
                }
                current = Some(element.id);
            }
            prop_assert_eq!(labels[element.sz], labels[element.id]);
        }
    }
}
