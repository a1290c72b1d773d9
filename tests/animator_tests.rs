//! Animation and animator tests
//!
//! Tests for:
//! - Transform animator interpolation and exact end state
//! - Property animators (start value capture, type checks, missing components)
//! - Boolean property animators (single flip per playback)
//! - Kinematic and material animators
//! - Animator windows, delays and restart
//! - Animation class JSON

use strata::nodes::{DrawableClass, DrawableFlags, LinearMoverClass, MaterialParam, TextItemClass};
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

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn node_with(setup: impl FnOnce(&mut NodeClass)) -> Node {
    let mut class = NodeClass::new("node");
    setup(&mut class);
    Node::new(Arc::new(class))
}

fn one_second(animator: impl Into<AnimatorClass>) -> Animation {
    let mut class = AnimationClass::new("test");
    class.set_duration(1.0);
    class.add_animator(animator);
    Animation::new(Arc::new(class))
}

fn step(animation: &mut Animation, node: &mut Node, dt: f32) {
    animation.update(dt);
    animation.apply(node);
}

// ============================================================================
// Transform animator
// ============================================================================

#[test]
fn transform_animator_moves_node_and_lands_exactly() {
    let mut node = node_with(|_| {});
    let mut animator = TransformAnimatorClass::new("move", node.class_id());
    animator.end.position = Vec2::new(10.0, 0.0);
    let mut animation = one_second(animator);

    step(&mut animation, &mut node, 0.5);
    assert!(vec2_approx(node.translation(), Vec2::new(5.0, 0.0)));

    step(&mut animation, &mut node, 0.5);
    assert_eq!(node.translation(), Vec2::new(10.0, 0.0));
    assert!(animation.is_complete());
}

#[test]
fn transform_animator_starts_from_current_state() {
    let mut node = node_with(|c| c.set_translation(Vec2::new(2.0, 2.0)));
    let mut animator = TransformAnimatorClass::new("move", node.class_id());
    animator.base.set_start_time(0.5);
    animator.base.set_duration(0.5);
    animator.end.position = Vec2::new(4.0, 2.0);
    animator.end.rotation = 1.0;
    let mut animation = one_second(animator);

    // before the window nothing changes, even when the node moves
    step(&mut animation, &mut node, 0.25);
    assert_eq!(node.translation(), Vec2::new(2.0, 2.0));
    node.set_translation(Vec2::ZERO);

    step(&mut animation, &mut node, 0.5);
    // 0.75 is halfway through [0.5, 1.0]
    assert!(vec2_approx(node.translation(), Vec2::new(2.0, 1.0)));
    assert!(approx_eq(node.rotation(), 0.5));
}

#[test]
fn dynamic_transform_animator_can_be_retargeted() {
    let mut node = node_with(|_| {});
    let mut animator = TransformAnimatorClass::new("move", node.class_id());
    animator.base.set_flag(AnimatorFlags::STATIC_INSTANCE, false);
    animator.end.position = Vec2::new(10.0, 0.0);
    let mut animation = one_second(animator);

    if let Some(transform) = animation
        .find_animator_by_name_mut("move")
        .and_then(|a| a.as_transform_mut())
    {
        transform.set_end_position(Vec2::new(0.0, 8.0));
    }
    step(&mut animation, &mut node, 1.0);
    assert_eq!(node.translation(), Vec2::new(0.0, 8.0));
}

#[test]
fn animator_only_touches_its_node() {
    let mut target = node_with(|_| {});
    let mut other = node_with(|_| {});
    let mut animator = TransformAnimatorClass::new("move", target.class_id());
    animator.end.position = Vec2::new(1.0, 1.0);
    let mut animation = one_second(animator);

    animation.update(1.0);
    animation.apply(&mut other);
    animation.apply(&mut target);
    assert_eq!(other.translation(), Vec2::ZERO);
    assert_eq!(target.translation(), Vec2::new(1.0, 1.0));
}

// ============================================================================
// Property animator
// ============================================================================

#[test]
fn property_animator_interpolates_from_captured_start() {
    let mut node = node_with(|c| c.create_drawable().time_scale = 1.0);
    let animator = PropertyAnimatorClass::new(
        "speed",
        node.class_id(),
        PropertyName::DrawableTimeScale,
        PropertyValue::Float(3.0),
    );
    let mut animation = one_second(animator);

    step(&mut animation, &mut node, 0.0);
    assert_eq!(node.drawable().map(|d| d.time_scale()), Some(1.0));

    step(&mut animation, &mut node, 0.5);
    let scale = node.drawable().map_or(0.0, |d| d.time_scale());
    assert!(approx_eq(scale, 2.0));

    step(&mut animation, &mut node, 0.5);
    assert_eq!(node.drawable().map(|d| d.time_scale()), Some(3.0));
}

#[test]
fn property_animator_with_wrong_value_type_does_nothing() {
    init_logging();
    let mut node = node_with(|c| {
        c.set_linear_mover(LinearMoverClass {
            linear_velocity: Vec2::new(1.0, 1.0),
            ..Default::default()
        });
    });
    let animator = PropertyAnimatorClass::new(
        "velocity",
        node.class_id(),
        PropertyName::LinearMoverLinearVelocity,
        PropertyValue::Float(5.0),
    );
    let mut animation = one_second(animator);

    step(&mut animation, &mut node, 0.5);
    step(&mut animation, &mut node, 0.5);
    assert_eq!(node.linear_mover().map(|m| m.linear_velocity()), Some(Vec2::new(1.0, 1.0)));
    assert!(animation.is_complete());
}

#[test]
fn property_animator_without_component_is_a_no_op() {
    init_logging();
    let mut node = node_with(|_| {});
    let animator = PropertyAnimatorClass::new(
        "speed",
        node.class_id(),
        PropertyName::DrawableTimeScale,
        PropertyValue::Float(3.0),
    );
    let mut animation = one_second(animator);
    step(&mut animation, &mut node, 1.0);
    assert!(!node.has_drawable());
    assert!(animation.is_complete());
}

#[test]
fn property_animator_sets_text_at_the_end() {
    let mut node = node_with(|c| {
        c.set_text_item(TextItemClass {
            text: "3".into(),
            ..Default::default()
        });
    });
    let mut animator = PropertyAnimatorClass::new(
        "countdown",
        node.class_id(),
        PropertyName::TextItemText,
        PropertyValue::String("go".into()),
    );
    animator.interpolation = Interpolation::StepEnd;
    let mut animation = one_second(animator);

    step(&mut animation, &mut node, 0.75);
    assert_eq!(node.text_item().map(|t| t.text()), Some("3"));
    step(&mut animation, &mut node, 0.25);
    assert_eq!(node.text_item().map(|t| t.text()), Some("go"));
}

// ============================================================================
// Boolean property animator
// ============================================================================

#[test]
fn boolean_toggle_flips_exactly_once() {
    let mut node = node_with(|c| {
        c.set_drawable(DrawableClass::default());
    });
    let mut animator = BooleanPropertyAnimatorClass::new(
        "blink",
        node.class_id(),
        BooleanPropertyName::DrawableVisibleInGame,
        FlagAction::Toggle,
    );
    animator.set_time(0.5);
    let mut animation = one_second(animator);
    let visible = |node: &Node| node.drawable().is_some_and(|d| d.test_flag(DrawableFlags::VISIBLE_IN_GAME));
    assert!(visible(&node));

    step(&mut animation, &mut node, 0.25);
    assert!(visible(&node));
    step(&mut animation, &mut node, 0.5);
    assert!(!visible(&node));
    step(&mut animation, &mut node, 0.25);
    assert!(!visible(&node));
    assert!(animation.is_complete());
}

#[test]
fn boolean_animator_finish_applies_pending_flip() {
    let mut node = node_with(|c| {
        c.set_drawable(DrawableClass::default());
    });
    let animator = BooleanPropertyAnimatorClass::new(
        "flip",
        node.class_id(),
        BooleanPropertyName::DrawableFlipHorizontally,
        FlagAction::On,
    );
    let mut animation = one_second(animator);
    animation.finish(&mut node);
    assert!(node.drawable().is_some_and(|d| d.test_flag(DrawableFlags::FLIP_HORIZONTALLY)));
}

#[test]
fn boolean_animator_restart_flips_again() {
    let mut node = node_with(|c| {
        c.set_drawable(DrawableClass::default());
    });
    let mut animator = BooleanPropertyAnimatorClass::new(
        "blink",
        node.class_id(),
        BooleanPropertyName::DrawableVisibleInGame,
        FlagAction::Toggle,
    );
    animator.set_time(0.0);
    let mut animation = one_second(animator);
    let visible = |node: &Node| node.drawable().is_some_and(|d| d.is_visible());

    step(&mut animation, &mut node, 1.0);
    assert!(!visible(&node));
    animation.restart();
    step(&mut animation, &mut node, 1.0);
    assert!(visible(&node));
}

// ============================================================================
// Kinematic and material animators
// ============================================================================

#[test]
fn kinematic_animator_drives_linear_mover() {
    let mut node = node_with(|c| {
        c.set_linear_mover(LinearMoverClass::default());
    });
    let mut animator =
        KinematicAnimatorClass::new("accelerate", node.class_id(), KinematicTarget::LinearMover);
    animator.end_linear_velocity = Vec2::new(4.0, 0.0);
    animator.end_angular_velocity = 2.0;
    let mut animation = one_second(animator);

    step(&mut animation, &mut node, 0.5);
    let velocity = node.linear_mover().map_or(Vec2::ZERO, |m| m.linear_velocity());
    assert!(vec2_approx(velocity, Vec2::new(2.0, 0.0)));

    step(&mut animation, &mut node, 0.5);
    assert_eq!(node.linear_mover().map(|m| m.angular_velocity()), Some(2.0));
}

#[test]
fn material_animator_mixes_known_params() {
    let mut node = node_with(|c| {
        c.create_drawable().set_material_param("alpha", MaterialParam::Float(0.0));
    });
    let mut animator = MaterialAnimatorClass::new("fade", node.class_id());
    animator.set_param("alpha", MaterialParam::Float(1.0));
    let mut animation = one_second(animator);

    step(&mut animation, &mut node, 0.5);
    let alpha = node.drawable().and_then(|d| d.material_param("alpha")).cloned();
    assert!(matches!(alpha, Some(MaterialParam::Float(v)) if approx_eq(v, 0.5)));

    step(&mut animation, &mut node, 0.5);
    let alpha = node.drawable().and_then(|d| d.material_param("alpha")).cloned();
    assert_eq!(alpha, Some(MaterialParam::Float(1.0)));
}

// ============================================================================
// Playback clock
// ============================================================================

#[test]
fn delayed_animation_waits_before_applying() {
    let mut node = node_with(|_| {});
    let mut animator = TransformAnimatorClass::new("move", node.class_id());
    animator.end.position = Vec2::new(10.0, 0.0);
    let mut class = AnimationClass::new("delayed");
    class.set_delay(0.5);
    class.add_animator(animator);
    let mut animation = Animation::new(Arc::new(class));

    step(&mut animation, &mut node, 0.4);
    assert_eq!(node.translation(), Vec2::ZERO);
    assert!(!animation.is_complete());

    step(&mut animation, &mut node, 0.6);
    assert!(vec2_approx(node.translation(), Vec2::new(5.0, 0.0)));
}

#[test]
fn animator_window_is_clamped_to_the_animation() {
    let mut animator = TransformAnimatorClass::new("late", "node");
    animator.base.set_start_time(0.8);
    animator.base.set_duration(0.5);
    assert!(approx_eq(animator.base.end_time(), 1.0));
    animator.base.set_start_time(2.0);
    assert_eq!(animator.base.start_time(), 1.0);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn animation_class_json_round_trip() -> anyhow::Result<()> {
    let mut class = AnimationClass::new("attack");
    class.set_duration(2.0);
    class.set_delay(0.25);
    class.set_looping(true);
    let mut transform = TransformAnimatorClass::new("lunge", "body");
    transform.end.position = Vec2::new(3.0, 0.0);
    transform.interpolation = Interpolation::EaseOutCubic;
    class.add_animator(transform);
    class.add_animator(PropertyAnimatorClass::new(
        "tint",
        "label",
        PropertyName::TextItemColor,
        PropertyValue::Color(Color4f::RED),
    ));
    class.add_animator(BooleanPropertyAnimatorClass::new(
        "hide",
        "body",
        BooleanPropertyName::DrawableVisibleInGame,
        FlagAction::Off,
    ));

    let text = serde_json::to_string(&class.into_json())?;
    let copy = AnimationClass::from_json(&serde_json::from_str(&text)?)?;

    assert_eq!(copy.id(), class.id());
    assert_eq!(copy.num_animators(), 3);
    assert!(copy.is_looping());
    assert_eq!(copy.find_animator_by_name("tint").map(AnimatorClass::node_id), Some("label"));
    assert_eq!(copy.hash_value(), class.hash_value());
    Ok(())
}

#[test]
fn animation_class_skips_unknown_animator_types() -> anyhow::Result<()> {
    init_logging();
    let value = serde_json::json!({
        "id": "a1",
        "name": "broken",
        "animators": [
            { "type": "TeleportAnimator", "animator": { "id": "x", "node": "n" } },
            { "type": "TransformAnimator", "animator": { "id": "t", "name": "move", "node": "n" } }
        ]
    });
    let class = AnimationClass::from_json(&value)?;
    assert_eq!(class.num_animators(), 1);
    assert_eq!(class.animator(0).id(), "t");
    Ok(())
}
