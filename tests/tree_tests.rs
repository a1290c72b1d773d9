//! Render tree and tree algorithm tests
//!
//! Tests for:
//! - RenderTree linking, breaking, reparenting and subtree deletion
//! - JSON round trip of the tree topology
//! - Transform queries over an entity class hierarchy
//! - Reparenting with and without keeping the world transform
//! - Node duplication, deletion and coarse hit testing

use std::f32::consts::FRAC_PI_2;

use rustc_hash::FxHashMap;
use strata::core::transform::transform_point;
use strata::core::tree::{tree_node_from_json, tree_node_to_json};
use strata::prelude::*;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec2_approx(a: Vec2, b: Vec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

//  1 ─┬─ 2 ── 4
//     └─ 3
//  5
fn sample_tree() -> RenderTree<u32> {
    let mut tree = RenderTree::new();
    tree.link_child(None, 1);
    tree.link_child(Some(1), 2);
    tree.link_child(Some(1), 3);
    tree.link_child(Some(2), 4);
    tree.link_child(None, 5);
    tree
}

fn pre_order(tree: &RenderTree<u32>) -> Vec<u32> {
    let mut order = Vec::new();
    tree.pre_order_traverse_for_each(|n| order.push(n), None);
    order
}

fn node_at(name: &str, x: f32, y: f32) -> NodeClass {
    let mut node = NodeClass::new(name);
    node.set_translation(Vec2::new(x, y));
    node
}

// ============================================================================
// Topology
// ============================================================================

#[test]
fn tree_link_then_break_restores_topology() {
    let mut tree = sample_tree();
    let before = pre_order(&tree);

    tree.link_child(Some(3), 6);
    assert_eq!(tree.get_parent(6), Some(3));
    assert!(tree.has_children(Some(3)));

    tree.break_child(6);
    assert!(!tree.has_node(6));
    assert!(!tree.has_children(Some(3)));
    assert_eq!(pre_order(&tree), before);
    assert!(tree.is_consistent());
}

#[test]
fn tree_break_keeps_subtree_together() {
    let mut tree = sample_tree();
    tree.break_child(2);
    assert!(!tree.has_node(2));
    assert_eq!(tree.children(Some(1)), &[3]);

    // the detached subtree comes back whole when relinked
    tree.link_child(Some(5), 2);
    assert_eq!(tree.get_parent(4), Some(2));
    assert_eq!(pre_order(&tree), vec![1, 3, 5, 2, 4]);
    assert!(tree.is_consistent());
}

#[test]
fn tree_reparent_moves_to_last_child() {
    let mut tree = sample_tree();
    tree.reparent_child(Some(1), 5);
    assert_eq!(tree.children(None), &[1]);
    assert_eq!(tree.children(Some(1)), &[2, 3, 5]);
    assert_eq!(tree.path_to_root(4), vec![4, 2, 1]);
}

#[test]
fn tree_delete_removes_subtree() {
    let mut tree = sample_tree();
    tree.delete_node(1);
    assert_eq!(tree.len(), 1);
    for gone in [1, 2, 3, 4] {
        assert!(!tree.has_node(gone));
    }
    assert_eq!(tree.children(None), &[5]);
    assert!(tree.is_consistent());
}

#[test]
fn tree_collect_subtree_is_pre_order() {
    let tree = sample_tree();
    assert_eq!(tree.collect_subtree(1), vec![1, 2, 4, 3]);
    assert_eq!(tree.collect_subtree(4), vec![4]);
}

#[test]
fn tree_from_tree_maps_keys() {
    let tree = sample_tree();
    let mut copy: RenderTree<u64> = RenderTree::new();
    copy.from_tree(&tree, |k| u64::from(k) * 10);
    assert_eq!(copy.children(None), &[10, 50]);
    assert_eq!(copy.children(Some(10)), &[20, 30]);
    assert_eq!(copy.get_parent(40), Some(20));
}

#[test]
fn tree_json_round_trip() -> anyhow::Result<()> {
    let tree = sample_tree();
    let json = tree.into_json(|k| tree_node_to_json(&format!("node-{k}")));
    let text = serde_json::to_string(&json)?;

    let ids: FxHashMap<String, u32> = (1..=5).map(|k| (format!("node-{k}"), k)).collect();
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let copy = RenderTree::from_json(&value, |chunk| tree_node_from_json(&ids, chunk))?;

    assert_eq!(pre_order(&copy), pre_order(&tree));
    assert_eq!(copy.children(Some(1)), &[2, 3]);
    assert!(copy.is_consistent());
    Ok(())
}

#[test]
fn tree_json_with_unknown_id_fails() {
    let tree = sample_tree();
    let json = tree.into_json(|k| tree_node_to_json(&k.to_string()));
    let ids: FxHashMap<String, u32> = (1..=4).map(|k| (k.to_string(), k)).collect();
    let result = RenderTree::from_json(&json, |chunk| tree_node_from_json(&ids, chunk));
    assert!(matches!(result, Err(StrataError::UnknownNode(id)) if id == "5"));
}

// ============================================================================
// Transforms over a class hierarchy
// ============================================================================

#[test]
fn class_node_transform_accumulates() {
    let mut class = EntityClass::new("ship");
    let mut body = node_at("body", 10.0, 0.0);
    body.set_rotation(FRAC_PI_2);
    let body = class.add_node(body);
    let gun = class.add_node(node_at("gun", 5.0, 0.0));
    class.link_child(None, body);
    class.link_child(Some(body), gun);

    // gun is 5 units along the rotated body X axis, i.e. straight down +Y
    let gun_to_world = class.find_node_transform(gun);
    assert!(vec2_approx(transform_point(&gun_to_world, Vec2::ZERO), Vec2::new(10.0, 5.0)));
}

#[test]
fn class_reparent_keeps_world_position() {
    let mut class = EntityClass::new("ship");
    let mut parent = node_at("parent", 10.0, 5.0);
    parent.set_rotation(FRAC_PI_2);
    let parent = class.add_node(parent);
    let child = class.add_node(node_at("child", 20.0, 5.0));
    class.link_child(None, parent);
    class.link_child(None, child);

    class.reparent_child(Some(parent), child, true);

    assert_eq!(class.find_node_parent(child), Some(parent));
    let world = transform_point(&class.find_node_transform(child), Vec2::ZERO);
    assert!(vec2_approx(world, Vec2::new(20.0, 5.0)), "world = {world}");
    assert!(vec2_approx(class.node(child).translation(), Vec2::new(0.0, -10.0)));
    assert!(approx_eq(class.node(child).rotation(), -FRAC_PI_2));
}

#[test]
fn class_reparent_from_scaled_parent_keeps_world_points() {
    let mut class = EntityClass::new("ship");
    let mut scaled = node_at("scaled", 5.0, 0.0);
    scaled.set_scale(Vec2::splat(2.0));
    let scaled = class.add_node(scaled);
    let mut turned = node_at("turned", 0.0, 0.0);
    turned.set_rotation(FRAC_PI_2);
    let turned = class.add_node(turned);
    let child = class.add_node(node_at("child", 1.0, 0.0));
    class.link_child(None, scaled);
    class.link_child(None, turned);
    class.link_child(Some(scaled), child);

    let local_point = Vec2::new(1.0, 0.0);
    let before = transform_point(&class.find_node_transform(child), local_point);
    assert!(vec2_approx(before, Vec2::new(9.0, 0.0)), "before = {before}");

    class.reparent_child(Some(turned), child, true);

    assert_eq!(class.find_node_parent(child), Some(turned));
    let after = transform_point(&class.find_node_transform(child), local_point);
    assert!(vec2_approx(after, before), "after = {after}");
    assert!(vec2_approx(class.node(child).scale(), Vec2::splat(2.0)));
    assert!(approx_eq(class.node(child).rotation(), -FRAC_PI_2));
}

#[test]
fn class_reparent_without_retain_keeps_local_transform() {
    let mut class = EntityClass::new("ship");
    let parent = class.add_node(node_at("parent", 10.0, 5.0));
    let child = class.add_node(node_at("child", 1.0, 1.0));
    class.link_child(None, parent);
    class.link_child(None, child);

    class.reparent_child(Some(parent), child, false);

    assert_eq!(class.node(child).translation(), Vec2::new(1.0, 1.0));
    let world = transform_point(&class.find_node_transform(child), Vec2::ZERO);
    assert!(vec2_approx(world, Vec2::new(11.0, 6.0)));
}

#[test]
fn class_break_child_with_retain_moves_to_world() {
    let mut class = EntityClass::new("ship");
    let mut parent = node_at("parent", 3.0, 4.0);
    parent.set_rotation(FRAC_PI_2);
    parent.set_scale(Vec2::splat(2.0));
    let parent = class.add_node(parent);
    let child = class.add_node(node_at("child", 1.0, 0.0));
    class.link_child(None, parent);
    class.link_child(Some(parent), child);

    let corner = Vec2::new(1.0, 0.0);
    let before = transform_point(&class.find_node_transform(child), corner);
    assert!(vec2_approx(before, Vec2::new(3.0, 8.0)), "before = {before}");

    class.break_child(child, true);
    assert!(!class.render_tree().has_node(child));
    assert!(vec2_approx(class.node(child).translation(), Vec2::new(3.0, 6.0)));
    assert!(approx_eq(class.node(child).rotation(), FRAC_PI_2));
    assert!(vec2_approx(class.node(child).scale(), Vec2::splat(2.0)));

    class.link_child(None, child);
    let after = transform_point(&class.find_node_transform(child), corner);
    assert!(vec2_approx(after, before), "after = {after}");
}

// ============================================================================
// Duplication, deletion and hit testing
// ============================================================================

#[test]
fn class_duplicate_copies_subtree_under_same_parent() {
    let mut class = EntityClass::new("ship");
    let root = class.add_node(NodeClass::new("root"));
    let arm = class.add_node(NodeClass::new("arm"));
    let hand = class.add_node(NodeClass::new("hand"));
    class.link_child(None, root);
    class.link_child(Some(root), arm);
    class.link_child(Some(arm), hand);

    let copy = class.duplicate_node(arm);

    assert_eq!(class.num_nodes(), 5);
    assert_eq!(class.find_node_parent(copy), Some(root));
    assert_eq!(class.node(copy).name(), "Copy of arm");
    assert_ne!(class.node(copy).id(), class.node(arm).id());
    let copied_children = class.render_tree().children(Some(copy));
    assert_eq!(copied_children.len(), 1);
    assert_eq!(class.node(copied_children[0]).name(), "Copy of hand");
}

#[test]
fn class_delete_node_removes_descendants() {
    let mut class = EntityClass::new("ship");
    let root = class.add_node(NodeClass::new("root"));
    let arm = class.add_node(NodeClass::new("arm"));
    let hand = class.add_node(NodeClass::new("hand"));
    class.link_child(None, root);
    class.link_child(Some(root), arm);
    class.link_child(Some(arm), hand);

    class.delete_node(arm);

    assert_eq!(class.num_nodes(), 1);
    assert!(class.find_node_by_name("hand").is_none());
    assert!(!class.render_tree().has_children(Some(root)));
}

#[test]
fn class_coarse_hit_test_reports_box_position() {
    let mut class = EntityClass::new("ship");
    let mut big = node_at("big", 0.0, 0.0);
    big.set_size(Vec2::new(10.0, 10.0));
    let big = class.add_node(big);
    let small = class.add_node(node_at("small", 20.0, 0.0));
    class.link_child(None, big);
    class.link_child(None, small);

    let hits = class.coarse_hit_test(Vec2::new(1.0, 2.0));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].node, big);
    assert!(vec2_approx(hits[0].box_position, Vec2::new(6.0, 7.0)));

    assert!(class.coarse_hit_test(Vec2::new(50.0, 50.0)).is_empty());
}

#[test]
fn class_node_box_coordinate_mapping() {
    let mut class = EntityClass::new("ship");
    let mut node = node_at("node", 10.0, 10.0);
    node.set_size(Vec2::new(4.0, 2.0));
    let node = class.add_node(node);
    class.link_child(None, node);

    // box origin is the top left corner
    let corner = class.map_coords_from_node_box(Vec2::ZERO, node);
    assert!(vec2_approx(corner, Vec2::new(8.0, 9.0)));
    let back = class.map_coords_to_node_box(corner, node);
    assert!(vec2_approx(back, Vec2::ZERO));

    let rect = class.find_node_bounding_rect(node);
    assert!(vec2_approx(rect.position(), Vec2::new(8.0, 9.0)));
    assert!(vec2_approx(rect.size(), Vec2::new(4.0, 2.0)));
}
