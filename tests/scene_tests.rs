//! Scene hierarchy and transform tests
//!
//! Tests for:
//! - TransformData TRS concatenation (scale, then rotation, then translation)
//! - World-transform propagation over deep and branched hierarchies
//! - Re-parenting via attach, including cycle refusal
//! - Subtree removal and stale-handle behavior
//! - Targeted propagation via propagate_subtree

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

use armature::scene::{Hierarchy, Node, NodeHandle, Transform, TransformData};

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn node_at(position: Vec3) -> Node {
    Node::with_local(TransformData::from_position(position))
}

fn world_position(hierarchy: &Hierarchy, handle: NodeHandle) -> Vec3 {
    hierarchy.node(handle).unwrap().transform.world().position
}

// ============================================================================
// TransformData
// ============================================================================

#[test]
fn transform_identity_components() {
    let t = TransformData::IDENTITY;
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);

    let fresh = Transform::new();
    assert_eq!(fresh.local.position, Vec3::ZERO);
    assert_eq!(fresh.world().position, Vec3::ZERO);
}

#[test]
fn concatenate_applies_scale_rotation_translation() {
    let parent = TransformData::new(
        Vec3::new(1.0, 0.0, 0.0),
        Quat::from_rotation_z(FRAC_PI_2),
        Vec3::splat(2.0),
    );
    let local = TransformData::from_position(Vec3::new(1.0, 0.0, 0.0));

    let world = TransformData::concatenate(&local, &parent);

    // Child offset is scaled to (2, 0, 0), rotated to (0, 2, 0), then
    // shifted by the parent position.
    assert!(vec3_approx(world.position, Vec3::new(1.0, 2.0, 0.0)), "got {}", world.position);
    assert!(vec3_approx(world.scale, Vec3::splat(2.0)));
    assert!(world.rotation.angle_between(Quat::from_rotation_z(FRAC_PI_2)) < EPSILON);
}

#[test]
fn concatenate_matches_matrix_composition() {
    let parent = TransformData::new(
        Vec3::new(3.0, -1.0, 2.0),
        Quat::from_rotation_y(0.7),
        Vec3::splat(1.5),
    );
    let local = TransformData::new(
        Vec3::new(0.5, 2.0, 0.0),
        Quat::from_rotation_x(-0.3),
        Vec3::splat(0.5),
    );

    let composed = TransformData::concatenate(&local, &parent).matrix();
    let reference = parent.matrix() * local.matrix();

    let probe = Vec3::new(1.0, 2.0, 3.0);
    let a = composed.transform_point3(probe);
    let b = reference.transform_point3(probe);
    assert!(vec3_approx(a, b), "composed {a} vs matrices {b}");
}

#[test]
fn transform_matrix_carries_translation() {
    let t = TransformData::from_position(Vec3::new(10.0, 20.0, 30.0));
    let m: Mat4 = t.matrix();
    assert!(vec3_approx(m.w_axis.truncate(), Vec3::new(10.0, 20.0, 30.0)));
}

// ============================================================================
// World Propagation
// ============================================================================

#[test]
fn chain_accumulates_translations() {
    let mut hierarchy = Hierarchy::new();
    let mut parent = hierarchy.add_root(node_at(Vec3::X));
    let mut handles = vec![parent];
    for _ in 0..3 {
        parent = hierarchy.add_child(parent, node_at(Vec3::X));
        handles.push(parent);
    }

    hierarchy.update_world_transforms();

    for (depth, &handle) in handles.iter().enumerate() {
        let expected = Vec3::new((depth + 1) as f32, 0.0, 0.0);
        let got = world_position(&hierarchy, handle);
        assert!(vec3_approx(got, expected), "depth {depth}: got {got}");
    }
}

#[test]
fn rotations_cascade_down_the_chain() {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.add_root(Node::with_local(TransformData::new(
        Vec3::ZERO,
        Quat::from_rotation_z(FRAC_PI_2),
        Vec3::ONE,
    )));
    let elbow = hierarchy.add_child(
        root,
        Node::with_local(TransformData::new(
            Vec3::X,
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::ONE,
        )),
    );
    let tip = hierarchy.add_child(elbow, node_at(Vec3::X));

    hierarchy.update_world_transforms();

    // Root bends +X to +Y; the elbow sits at (0, 1, 0) and bends again,
    // so the tip extends in -X from there.
    assert!(vec3_approx(world_position(&hierarchy, elbow), Vec3::new(0.0, 1.0, 0.0)));
    assert!(vec3_approx(world_position(&hierarchy, tip), Vec3::new(-1.0, 1.0, 0.0)));
}

#[test]
fn scales_inherit_multiplicatively() {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.add_root(Node::with_local(TransformData::new(
        Vec3::ZERO,
        Quat::IDENTITY,
        Vec3::splat(2.0),
    )));
    let child = hierarchy.add_child(
        root,
        Node::with_local(TransformData::new(Vec3::X, Quat::IDENTITY, Vec3::splat(3.0))),
    );

    hierarchy.update_world_transforms();

    let world = hierarchy.node(child).unwrap().transform.world();
    assert!(vec3_approx(world.position, Vec3::new(2.0, 0.0, 0.0)));
    assert!(vec3_approx(world.scale, Vec3::splat(6.0)));
}

#[test]
fn sibling_branches_are_independent() {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.add_root(node_at(Vec3::ZERO));
    let left = hierarchy.add_child(root, node_at(Vec3::new(-1.0, 0.0, 0.0)));
    let right = hierarchy.add_child(root, node_at(Vec3::new(1.0, 0.0, 0.0)));

    hierarchy.node_mut(left).unwrap().transform.local.position = Vec3::new(-5.0, 0.0, 0.0);
    hierarchy.update_world_transforms();

    assert!(vec3_approx(world_position(&hierarchy, left), Vec3::new(-5.0, 0.0, 0.0)));
    assert!(vec3_approx(world_position(&hierarchy, right), Vec3::new(1.0, 0.0, 0.0)));
}

// ============================================================================
// Re-parenting
// ============================================================================

#[test]
fn attach_keeps_local_transform() {
    let mut hierarchy = Hierarchy::new();
    let a = hierarchy.add_root(node_at(Vec3::new(10.0, 0.0, 0.0)));
    let b = hierarchy.add_root(node_at(Vec3::new(0.0, 5.0, 0.0)));
    let child = hierarchy.add_child(a, node_at(Vec3::X));

    hierarchy.update_world_transforms();
    assert!(vec3_approx(world_position(&hierarchy, child), Vec3::new(11.0, 0.0, 0.0)));

    // Re-parenting preserves the local offset, so the world position
    // follows the new parent.
    hierarchy.attach(child, Some(b));
    hierarchy.update_world_transforms();
    assert!(vec3_approx(world_position(&hierarchy, child), Vec3::new(1.0, 5.0, 0.0)));
}

#[test]
fn attach_to_none_promotes_to_root() {
    let mut hierarchy = Hierarchy::new();
    let parent = hierarchy.add_root(node_at(Vec3::new(4.0, 0.0, 0.0)));
    let child = hierarchy.add_child(parent, node_at(Vec3::X));

    hierarchy.attach(child, None);

    assert_eq!(hierarchy.node(child).unwrap().parent(), None);
    assert!(hierarchy.roots().contains(&child));
    assert!(hierarchy.node(parent).unwrap().children().is_empty());

    hierarchy.update_world_transforms();
    assert!(vec3_approx(world_position(&hierarchy, child), Vec3::X));
}

#[test]
fn attach_refuses_descendant_as_parent() {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.add_root(Node::new());
    let child = hierarchy.add_child(root, Node::new());
    let grandchild = hierarchy.add_child(child, Node::new());

    hierarchy.attach(root, Some(grandchild));

    // The structure is unchanged and propagation still terminates.
    assert_eq!(hierarchy.node(root).unwrap().parent(), None);
    assert_eq!(hierarchy.node(grandchild).unwrap().parent(), Some(child));
    hierarchy.update_world_transforms();
}

#[test]
fn add_child_with_stale_parent_becomes_root() {
    let mut hierarchy = Hierarchy::new();
    let parent = hierarchy.add_root(Node::new());
    hierarchy.remove_subtree(parent);

    let orphan = hierarchy.add_child(parent, node_at(Vec3::X));

    assert!(hierarchy.contains(orphan));
    assert!(hierarchy.roots().contains(&orphan));
    assert_eq!(hierarchy.node(orphan).unwrap().parent(), None);
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn remove_subtree_spares_siblings() {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.add_root(Node::new());
    let doomed = hierarchy.add_child(root, Node::new());
    let doomed_leaf = hierarchy.add_child(doomed, Node::new());
    let survivor = hierarchy.add_child(root, Node::new());

    hierarchy.remove_subtree(doomed);

    assert!(!hierarchy.contains(doomed));
    assert!(!hierarchy.contains(doomed_leaf));
    assert!(hierarchy.contains(survivor));
    assert_eq!(hierarchy.node(root).unwrap().children(), &[survivor]);
    assert_eq!(hierarchy.len(), 2);
}

#[test]
fn remove_root_updates_root_list() {
    let mut hierarchy = Hierarchy::new();
    let a = hierarchy.add_root(Node::new());
    let b = hierarchy.add_root(Node::new());

    hierarchy.remove_subtree(a);

    assert_eq!(hierarchy.roots(), &[b]);
    assert_eq!(hierarchy.len(), 1);
    assert!(!hierarchy.is_empty());
}

// ============================================================================
// Targeted Propagation
// ============================================================================

#[test]
fn propagate_subtree_leaves_other_branches_stale() {
    let mut hierarchy = Hierarchy::new();
    let a = hierarchy.add_root(node_at(Vec3::X));
    let a_child = hierarchy.add_child(a, node_at(Vec3::X));
    let b = hierarchy.add_root(node_at(Vec3::Y));

    hierarchy.update_world_transforms();

    // Move both roots, then refresh only a's subtree.
    hierarchy.node_mut(a).unwrap().transform.local.position = Vec3::new(10.0, 0.0, 0.0);
    hierarchy.node_mut(b).unwrap().transform.local.position = Vec3::new(0.0, 10.0, 0.0);
    hierarchy.propagate_subtree(a);

    assert!(vec3_approx(world_position(&hierarchy, a), Vec3::new(10.0, 0.0, 0.0)));
    assert!(vec3_approx(world_position(&hierarchy, a_child), Vec3::new(11.0, 0.0, 0.0)));
    // b's world still reflects the previous pass.
    assert!(vec3_approx(world_position(&hierarchy, b), Vec3::Y));
}

#[test]
fn propagate_subtree_reads_current_parent_world() {
    let mut hierarchy = Hierarchy::new();
    let root = hierarchy.add_root(node_at(Vec3::new(2.0, 0.0, 0.0)));
    let child = hierarchy.add_child(root, node_at(Vec3::X));

    hierarchy.update_world_transforms();

    // A subtree refresh below an unchanged parent starts from the
    // parent's existing world transform.
    hierarchy.node_mut(child).unwrap().transform.local.position = Vec3::new(0.0, 1.0, 0.0);
    hierarchy.propagate_subtree(child);

    assert!(vec3_approx(world_position(&hierarchy, child), Vec3::new(2.0, 1.0, 0.0)));
}
