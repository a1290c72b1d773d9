//! Entity class and entity instance tests
//!
//! Tests for:
//! - Spawning: node instancing, spawn transform, script variable overrides
//! - Per tick update: animations, queue, looping, timers and posted events
//! - Lifecycle flags (die, die_in, limited lifetime)
//! - Entity class JSON and content hashing

use strata::scene::{PostedEvent, ScriptVarValue, TimerEvent};
use strata::core::transform::transform_point;
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

/// "prop" class: a single node moved from (0,0) to (10,0) by the one second
/// "move" animation.
fn prop_class() -> EntityClass {
    let mut class = EntityClass::new("prop");
    let body = class.add_node(NodeClass::new("body"));
    class.link_child(None, body);

    let mut animator = TransformAnimatorClass::new("slide", class.node(body).id());
    animator.end.position = Vec2::new(10.0, 0.0);
    let mut animation = AnimationClass::new("move");
    animation.set_duration(1.0);
    animation.add_animator(animator);
    class.add_animation(animation);
    class
}

/// Root node with one child node, both at (1,0) relative to their parent.
fn arm_class() -> EntityClass {
    let mut class = EntityClass::new("arm");
    let mut shoulder = NodeClass::new("shoulder");
    shoulder.set_translation(Vec2::new(1.0, 0.0));
    let mut hand = NodeClass::new("hand");
    hand.set_translation(Vec2::new(1.0, 0.0));
    let shoulder = class.add_node(shoulder);
    let hand = class.add_node(hand);
    class.link_child(None, shoulder);
    class.link_child(Some(shoulder), hand);
    class
}

fn node_named(entity: &Entity, name: &str) -> NodeKey {
    entity
        .find_node_by_class_name(name)
        .unwrap_or_else(|| panic!("no node named {name}"))
}

// ============================================================================
// Spawning
// ============================================================================

#[test]
fn entity_instances_every_class_node() {
    let class = Arc::new(arm_class());
    let entity = Entity::from_class(Arc::clone(&class));

    assert_eq!(entity.num_nodes(), 2);
    assert_eq!(entity.class_name(), "arm");
    assert!(!entity.id().is_empty());
    let shoulder = node_named(&entity, "shoulder");
    let hand = node_named(&entity, "hand");
    assert_eq!(entity.find_node_parent(hand), Some(shoulder));
    assert_eq!(entity.find_node_parent(shoulder), None);

    let class_hand = class.find_node_by_name("hand").map(|k| class.node(k).id().to_owned());
    assert_eq!(class_hand.as_deref(), Some(entity.node(hand).class_id()));
    assert_ne!(entity.node(hand).id(), entity.node(hand).class_id());
}

#[test]
fn spawn_transform_applies_to_top_level_nodes_only() {
    let mut args = EntityArgs::new(Arc::new(arm_class()));
    args.position = Vec2::new(10.0, 0.0);
    args.scale = Vec2::splat(2.0);
    args.name = "left arm".into();
    let entity = Entity::new(args);

    let shoulder = node_named(&entity, "shoulder");
    let hand = node_named(&entity, "hand");
    assert_eq!(entity.name(), "left arm");
    assert_eq!(entity.node(shoulder).translation(), Vec2::new(11.0, 0.0));
    assert_eq!(entity.node(shoulder).scale(), Vec2::splat(2.0));
    assert_eq!(entity.node(hand).translation(), Vec2::new(1.0, 0.0));
    assert_eq!(entity.node(hand).scale(), Vec2::ONE);

    let hand_world = transform_point(&entity.find_node_transform(hand), Vec2::ZERO);
    assert!(vec2_approx(hand_world, Vec2::new(13.0, 0.0)));
}

#[test]
fn spawn_arguments_override_script_variables() {
    init_logging();
    let mut class = EntityClass::new("ship");
    class.add_script_var(ScriptVar::new("speed", 1.0_f32, false));
    class.add_script_var(ScriptVar::new("max", 5, true));
    class.add_script_var(ScriptVar::new("label", "ship", false));
    let ids: Vec<String> = class.script_vars().iter().map(|v| v.id().to_owned()).collect();
    let class = Arc::new(class);

    let mut args = EntityArgs::new(Arc::clone(&class));
    args.script_vars = vec![
        ScriptVarValue { id: ids[0].clone(), value: ScriptValue::Float(2.0) },
        ScriptVarValue { id: ids[1].clone(), value: ScriptValue::Integer(9) },
        // wrong type, ignored
        ScriptVarValue { id: ids[2].clone(), value: ScriptValue::Integer(1) },
    ];
    let mut entity = Entity::new(args);

    assert_eq!(entity.script_var("speed").ok(), Some(&ScriptValue::Float(2.0)));
    assert_eq!(entity.script_var("max").ok(), Some(&ScriptValue::Integer(9)));
    assert_eq!(entity.script_var("label").ok(), Some(&ScriptValue::String("ship".into())));
    assert_eq!(class.script_var(1).value(), &ScriptValue::Integer(5));

    // the private copy of a read-only variable is still read-only
    assert!(!entity.set_script_var("max", 3));
    assert_eq!(entity.script_var("max").ok(), Some(&ScriptValue::Integer(9)));
}

#[test]
fn script_variable_writes_check_access_and_type() {
    init_logging();
    let mut class = EntityClass::new("ship");
    class.add_script_var(ScriptVar::new("speed", 1.0_f32, false));
    class.add_script_var(ScriptVar::new("kind", "fighter", true));
    let mut entity = Entity::from_class(Arc::new(class));

    assert!(entity.set_script_var("speed", 4.0_f32));
    assert_eq!(entity.script_var("speed").ok(), Some(&ScriptValue::Float(4.0)));
    assert!(!entity.set_script_var("speed", true));
    assert!(!entity.set_script_var("kind", "bomber"));
    assert_eq!(entity.script_var("kind").ok().and_then(ScriptValue::as_str), Some("fighter"));
    assert!(matches!(
        entity.script_var("missing"),
        Err(StrataError::NoSuchVariable(name)) if name == "missing"
    ));
}

// ============================================================================
// Animation playback
// ============================================================================

#[test]
fn prop_animation_reaches_exact_end() {
    let mut entity = Entity::from_class(Arc::new(prop_class()));
    let body = node_named(&entity, "body");
    let mut events = Vec::new();

    assert!(entity.play_animation_by_name("move").is_some());
    entity.update(0.5, &mut events);
    assert!(vec2_approx(entity.node(body).translation(), Vec2::new(5.0, 0.0)));
    assert!(entity.is_animating());

    entity.update(0.5, &mut events);
    assert_eq!(entity.node(body).translation(), Vec2::new(10.0, 0.0));
    assert!(!entity.is_animating());
    assert!(entity.did_finish_animation());
    assert_eq!(entity.finished_animation().map(Animation::class_name), Some("move"));

    // the finished slot only lasts for one update
    entity.update(0.1, &mut events);
    assert!(!entity.did_finish_animation());
    assert!(events.is_empty());
}

#[test]
fn unknown_animation_name_plays_nothing() {
    let mut entity = Entity::from_class(Arc::new(prop_class()));
    assert!(entity.play_animation_by_name("dance").is_none());
    assert!(!entity.is_animating());
}

#[test]
fn queued_animation_starts_after_current_one() {
    let class = Arc::new(prop_class());
    let move_class = Arc::clone(&class.animations()[0]);
    let mut entity = Entity::from_class(class);
    let body = node_named(&entity, "body");
    let mut events = Vec::new();

    entity.play_animation_class(Arc::clone(&move_class));
    entity.queue_animation(Animation::new(move_class));
    assert_eq!(entity.num_queued_animations(), 1);

    entity.update(1.0, &mut events);
    assert!(entity.did_finish_animation());
    assert!(!entity.is_animating());

    // the next update promotes the queued animation
    entity.update(0.0, &mut events);
    assert!(entity.is_animating());
    assert_eq!(entity.num_queued_animations(), 0);

    // it starts from where the first one left the node
    entity.update(0.5, &mut events);
    assert_eq!(entity.node(body).translation(), Vec2::new(10.0, 0.0));
}

#[test]
fn looping_animation_resets_child_nodes() {
    let mut class = arm_class();
    let hand = class.find_node_by_name("hand").map(|k| class.node(k).id().to_owned());
    let mut animator = TransformAnimatorClass::new("wave", hand.unwrap_or_default());
    animator.end.position = Vec2::new(5.0, 0.0);
    let mut wave = AnimationClass::new("wave");
    wave.set_looping(true);
    wave.add_animator(animator);
    class.add_animation(wave);

    let mut entity = Entity::from_class(Arc::new(class));
    let hand = node_named(&entity, "hand");
    let mut events = Vec::new();
    entity.play_animation_by_name("wave");

    entity.update(0.5, &mut events);
    assert!(vec2_approx(entity.node(hand).translation(), Vec2::new(3.0, 0.0)));

    entity.update(0.5, &mut events);
    assert!(entity.is_animating());
    assert!(!entity.did_finish_animation());
    assert_eq!(entity.node(hand).translation(), Vec2::new(1.0, 0.0));

    entity.update(0.5, &mut events);
    assert!(vec2_approx(entity.node(hand).translation(), Vec2::new(3.0, 0.0)));
}

#[test]
fn looping_animation_keeps_top_level_node_placement() {
    let mut class = arm_class();
    let shoulder = class.find_node_by_name("shoulder").map(|k| class.node(k).id().to_owned());
    let mut animator = TransformAnimatorClass::new("slide", shoulder.unwrap_or_default());
    animator.end.position = Vec2::new(4.0, 0.0);
    let mut slide = AnimationClass::new("slide");
    slide.set_looping(true);
    slide.add_animator(animator);
    class.add_animation(slide);

    let mut entity = Entity::from_class(Arc::new(class));
    let shoulder = node_named(&entity, "shoulder");
    let mut events = Vec::new();
    entity.play_animation_by_name("slide");

    entity.update(1.0, &mut events);
    assert!(entity.is_animating());
    assert!(vec2_approx(entity.node(shoulder).translation(), Vec2::new(4.0, 0.0)));
}

#[test]
fn stop_animation_leaves_nodes_where_they_are() {
    let mut entity = Entity::from_class(Arc::new(prop_class()));
    let body = node_named(&entity, "body");
    let mut events = Vec::new();
    entity.play_animation_by_name("move");
    entity.update(0.5, &mut events);

    entity.stop_animation();
    assert!(!entity.is_animating());
    assert!(!entity.did_finish_animation());
    entity.update(0.5, &mut events);
    assert!(vec2_approx(entity.node(body).translation(), Vec2::new(5.0, 0.0)));
}

#[test]
fn finish_animation_jumps_to_end_state() {
    let mut entity = Entity::from_class(Arc::new(prop_class()));
    let body = node_named(&entity, "body");
    entity.play_animation_by_name("move");

    entity.finish_animation();
    assert!(!entity.is_animating());
    assert!(entity.did_finish_animation());
    assert_eq!(entity.node(body).translation(), Vec2::new(10.0, 0.0));
}

#[test]
fn idle_animation_plays_only_when_idle() {
    let mut class = prop_class();
    let idle = class.animation(0).id().to_owned();
    class.set_idle_track_id(idle);
    let mut entity = Entity::from_class(Arc::new(class));

    assert!(entity.has_idle_track());
    assert!(entity.play_idle().is_some());
    assert!(entity.play_idle().is_none());
}

// ============================================================================
// Timers, events and lifecycle
// ============================================================================

#[test]
fn timer_fires_once_with_jitter() {
    let mut entity = Entity::from_class(Arc::new(EntityClass::new("clock")));
    let mut events = Vec::new();
    entity.set_timer("tick", 0.5);

    entity.update(0.3, &mut events);
    assert!(events.is_empty());

    entity.update(0.3, &mut events);
    assert_eq!(events.len(), 1);
    let EntityEvent::Timer(TimerEvent { name, jitter }) = &events[0] else {
        panic!("expected a timer event, got {:?}", events[0]);
    };
    assert_eq!(name, "tick");
    assert!((jitter - 0.1).abs() < 1e-4);

    events.clear();
    entity.update(1.0, &mut events);
    assert!(events.is_empty());
}

#[test]
fn posted_events_are_reported_by_next_update() {
    let mut entity = Entity::from_class(Arc::new(EntityClass::new("target")));
    let mut events = Vec::new();
    entity.post_event(PostedEvent {
        message: "hit".into(),
        sender: "bullet".into(),
        value: ScriptValue::Integer(10),
    });
    entity.update(0.016, &mut events);
    assert!(matches!(
        &events[..],
        [EntityEvent::Posted(PostedEvent { message, .. })] if message == "hit"
    ));
}

#[test]
fn die_in_kills_after_countdown() {
    let mut entity = Entity::from_class(Arc::new(EntityClass::new("bomb")));
    let mut events = Vec::new();
    entity.die_in(1.0);

    entity.update(0.5, &mut events);
    assert!(!entity.has_been_killed());
    entity.update(0.5, &mut events);
    assert!(entity.has_been_killed());
}

#[test]
fn die_only_raises_a_request() {
    let mut entity = Entity::from_class(Arc::new(EntityClass::new("bomb")));
    entity.die();
    assert!(entity.wants_to_die());
    assert!(!entity.has_been_killed());
}

#[test]
fn limited_lifetime_expires() {
    let mut class = EntityClass::new("spark");
    class.set_flag(EntityFlags::LIMIT_LIFETIME, true);
    class.set_lifetime(1.0);
    let mut entity = Entity::from_class(Arc::new(class));
    let mut events = Vec::new();

    entity.update(0.5, &mut events);
    assert!(!entity.has_expired());
    entity.update(0.5, &mut events);
    assert!(entity.has_expired());
    assert!(approx_eq(entity.current_time(), 1.0));
}

#[test]
fn default_flags_leave_lifetime_unlimited() {
    let entity = Entity::from_class(Arc::new(EntityClass::new("rock")));
    assert!(entity.is_visible());
    assert!(!entity.test_flag(EntityFlags::LIMIT_LIFETIME));
    assert!(entity.test_flag(EntityFlags::KILL_AT_LIFETIME));
    assert!(entity.is_logging_enabled());
}

// ============================================================================
// Entity class persistence
// ============================================================================

#[test]
fn entity_class_json_round_trip() -> anyhow::Result<()> {
    let mut class = arm_class();
    class.set_tag("limb");
    class.set_flag(EntityFlags::LIMIT_LIFETIME, true);
    class.set_lifetime(3.5);
    class.add_script_var(ScriptVar::new("reach", Vec2::new(1.0, 2.0), false));
    let hand_id = class
        .find_node_by_name("hand")
        .map(|k| class.node(k).id().to_owned())
        .unwrap_or_default();
    let mut wave = AnimationClass::new("wave");
    wave.add_animator(TransformAnimatorClass::new("wave", hand_id));
    let wave_id = class.add_animation(wave).id().to_owned();
    class.set_idle_track_id(wave_id.clone());

    let text = serde_json::to_string(&class.into_json())?;
    let copy = EntityClass::from_json(&serde_json::from_str(&text)?)?;

    assert_eq!(copy.id(), class.id());
    assert_eq!(copy.tag(), "limb");
    assert_eq!(copy.flags(), class.flags());
    assert_eq!(copy.idle_track_id(), wave_id);
    assert_eq!(copy.num_nodes(), 2);
    let shoulder = copy.find_node_by_name("shoulder");
    let hand = copy.find_node_by_name("hand");
    assert!(shoulder.is_some() && hand.is_some());
    assert_eq!(hand.and_then(|h| copy.find_node_parent(h)), shoulder);
    assert_eq!(
        copy.find_script_var_by_name("reach").map(ScriptVar::value),
        Some(&ScriptValue::Vec2(Vec2::new(1.0, 2.0)))
    );
    assert_eq!(copy.hash_value(), class.hash_value());
    Ok(())
}

#[test]
fn entity_class_hash_changes_with_topology() {
    let mut class = arm_class();
    let before = class.hash_value();
    let hand = class.find_node_by_name("hand");
    if let Some(hand) = hand {
        class.reparent_child(None, hand, false);
    }
    assert_ne!(class.hash_value(), before);
}
