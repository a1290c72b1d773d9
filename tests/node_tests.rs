//! Node class and node instance tests
//!
//! Tests for:
//! - Instances seeded from the class transform and components
//! - Copy-on-write component editing on shared classes
//! - Per tick component updates (movers, drawable clocks)
//! - Node class JSON and content hashing

use strata::nodes::{DrawableClass, LinearMoverClass, MoverFlags, TextItemClass};
use strata::prelude::*;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec2_approx(a: Vec2, b: Vec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn moving_class(velocity: Vec2) -> NodeClass {
    let mut class = NodeClass::new("mover");
    class.set_linear_mover(LinearMoverClass {
        linear_velocity: velocity,
        ..Default::default()
    });
    class
}

// ============================================================================
// Instantiation
// ============================================================================

#[test]
fn node_copies_class_state() {
    let mut class = NodeClass::new("body");
    class.set_translation(Vec2::new(1.0, 2.0));
    class.set_size(Vec2::new(3.0, 4.0));
    class.create_drawable().time_scale = 2.0;
    let node = Node::new(Arc::new(class));

    assert_eq!(node.name(), "body");
    assert_eq!(node.class_name(), "body");
    assert_ne!(node.id(), node.class_id());
    assert_eq!(node.translation(), Vec2::new(1.0, 2.0));
    assert_eq!(node.size(), Vec2::new(3.0, 4.0));
    assert!(node.has_drawable());
    assert!(!node.has_rigid_body());
    assert_eq!(node.drawable().map(|d| d.time_scale()), Some(2.0));
}

#[test]
fn node_changes_do_not_touch_class() {
    let class = Arc::new(NodeClass::new("body"));
    let mut node = Node::new(Arc::clone(&class));
    node.set_translation(Vec2::new(5.0, 5.0));
    node.rotate(1.0);
    assert_eq!(class.translation(), Vec2::ZERO);
    assert_eq!(class.rotation(), 0.0);

    node.reset();
    assert_eq!(node.translation(), Vec2::ZERO);
    assert_eq!(node.rotation(), 0.0);
}

#[test]
fn node_reset_restores_components() {
    let mut class = NodeClass::new("label");
    class.set_text_item(TextItemClass {
        text: "hello".into(),
        ..Default::default()
    });
    let mut node = Node::new(Arc::new(class));
    if let Some(text) = node.text_item_mut() {
        text.set_text("bye");
    }
    assert_eq!(node.text_item().map(|t| t.text()), Some("bye"));

    node.reset();
    assert_eq!(node.text_item().map(|t| t.text()), Some("hello"));
}

#[test]
fn class_component_edit_is_copy_on_write() {
    let mut class = NodeClass::new("body");
    class.set_drawable(DrawableClass::default());
    let shared = class.clone();

    if let Some(drawable) = class.drawable_mut() {
        drawable.layer = 7;
    }
    assert_eq!(class.drawable().map(|d| d.layer), Some(7));
    assert_eq!(shared.drawable().map(|d| d.layer), Some(0));

    class.remove_drawable();
    assert!(!class.has_drawable());
    assert!(shared.has_drawable());
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn node_update_runs_linear_mover() {
    let mut node = Node::new(Arc::new(moving_class(Vec2::new(2.0, 0.0))));
    node.update(0.5);
    node.update(0.5);
    assert!(vec2_approx(node.translation(), Vec2::new(2.0, 0.0)));
}

#[test]
fn node_update_skips_disabled_mover() {
    let mut class = moving_class(Vec2::new(2.0, 0.0));
    if let Some(mover) = class.linear_mover_mut() {
        mover.set_flag(MoverFlags::ENABLED, false);
    }
    let mut node = Node::new(Arc::new(class));
    node.update(1.0);
    assert_eq!(node.translation(), Vec2::ZERO);
}

#[test]
fn node_update_advances_drawable_clock() {
    let mut class = NodeClass::new("sprite");
    class.create_drawable().time_scale = 0.5;
    let mut node = Node::new(Arc::new(class));
    node.update(2.0);
    let play_time = node.drawable().map_or(0.0, |d| d.play_time());
    assert!((play_time - 1.0).abs() < 1e-9);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn node_class_json_round_trip() -> anyhow::Result<()> {
    let mut class = NodeClass::new("body");
    class.set_tag("hull");
    class.set_translation(Vec2::new(1.0, -1.0));
    class.set_scale(Vec2::new(2.0, 2.0));
    class.set_rotation(0.25);
    class.create_drawable().material_id = "steel".into();
    class.set_linear_mover(LinearMoverClass::default());

    let text = serde_json::to_string(&class.into_json())?;
    let copy = NodeClass::from_json(&serde_json::from_str(&text)?)?;

    assert_eq!(copy.id(), class.id());
    assert_eq!(copy.tag(), "hull");
    assert_eq!(copy.transform(), class.transform());
    assert_eq!(copy.drawable().map(|d| d.material_id.as_str()), Some("steel"));
    assert!(copy.has_linear_mover());
    assert!(!copy.has_text_item());
    assert_eq!(copy.hash_value(), class.hash_value());
    Ok(())
}

#[test]
fn node_class_missing_id_is_an_error() {
    let value = serde_json::json!({ "name": "anonymous" });
    assert!(matches!(
        NodeClass::from_json(&value),
        Err(StrataError::MissingField { field: "id", .. })
    ));
}

#[test]
fn node_class_unknown_flag_bits_are_dropped() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let value = serde_json::json!({ "id": "n1", "name": "legacy", "flags": 0b1010 });
    let class = NodeClass::from_json(&value)?;
    assert_eq!(class.flags(), NodeClassFlags::VISIBLE_IN_GAME);
    Ok(())
}

#[test]
fn node_class_hash_tracks_components() {
    let mut class = NodeClass::new("body");
    let bare = class.hash_value();
    class.create_text_item();
    let with_text = class.hash_value();
    assert_ne!(bare, with_text);

    if let Some(text) = class.text_item_mut() {
        text.text = "changed".into();
    }
    assert_ne!(class.hash_value(), with_text);
}
