//! Entity state controller tests
//!
//! Tests for:
//! - Entering the initial state and offering transitions
//! - Timed and instant transitions and the actions they report
//! - Controller values
//! - Entities ticking their controller and forwarding its actions
//! - Controller JSON, hashing and class cloning through the entity class

use strata::scene::ControllerState;
use strata::prelude::*;

// ============================================================================
// Helper
// ============================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// "door": "closed" (initial) to "open" over one second through "opening",
/// and back instantly through "closing".
fn door_controller() -> EntityStateControllerClass {
    let mut class = EntityStateControllerClass::new("door");
    let closed = class.add_state(EntityStateClass::new("closed")).id().to_owned();
    let open = class.add_state(EntityStateClass::new("open")).id().to_owned();
    class.set_initial_state_id(closed.clone());
    let mut opening = EntityStateTransitionClass::new("opening", closed.clone(), open.clone());
    opening.set_duration(1.0);
    class.add_transition(opening);
    class.add_transition(EntityStateTransitionClass::new("closing", open, closed));
    class
}

struct Ids {
    closed: String,
    open: String,
    opening: String,
    closing: String,
}

fn ids(class: &EntityStateControllerClass) -> Ids {
    let state = |name: &str| {
        class
            .find_state_by_name(name)
            .map(|s| s.id().to_owned())
            .unwrap_or_default()
    };
    let transition = |name: &str| {
        class
            .find_transition_by_name(name)
            .map(|t| t.id().to_owned())
            .unwrap_or_default()
    };
    Ids {
        closed: state("closed"),
        open: state("open"),
        opening: transition("opening"),
        closing: transition("closing"),
    }
}

fn door_entity_class() -> EntityClass {
    let mut class = EntityClass::new("door");
    let panel = class.add_node(NodeClass::new("panel"));
    class.link_child(None, panel);
    class.set_state_controller(door_controller());
    class
}

// ============================================================================
// Controller
// ============================================================================

#[test]
fn first_update_enters_initial_state() {
    let class = Arc::new(door_controller());
    let ids = ids(&class);
    let mut controller = EntityStateController::new(Arc::clone(&class));
    assert!(controller.current_state().is_none());

    let mut actions = Vec::new();
    controller.update(0.25, &mut actions);
    assert_eq!(
        actions,
        vec![
            StateAction::EnterState { state: ids.closed.clone() },
            StateAction::UpdateState { state: ids.closed.clone(), time: 0.0, dt: 0.25 },
            StateAction::EvalTransition {
                from: ids.closed.clone(),
                to: ids.open.clone(),
                transition: ids.opening.clone(),
            },
        ]
    );
    assert_eq!(controller.controller_state(), ControllerState::InState);
    assert_eq!(controller.current_state().map(EntityStateClass::name), Some("closed"));

    actions.clear();
    controller.update(0.25, &mut actions);
    assert_eq!(
        actions[0],
        StateAction::UpdateState { state: ids.closed, time: 0.25, dt: 0.25 }
    );
    assert_eq!(actions.len(), 2);
    assert_eq!(controller.time(), 0.5);
}

#[test]
fn timed_transition_reports_leave_start_and_finish() {
    let class = Arc::new(door_controller());
    let ids = ids(&class);
    let mut controller = EntityStateController::new(Arc::clone(&class));
    let mut actions = Vec::new();
    controller.update(0.25, &mut actions);

    controller.start_transition(&ids.opening).expect("opening leaves closed");
    assert_eq!(controller.controller_state(), ControllerState::InTransition);
    assert!(controller.current_state().is_none());
    assert_eq!(controller.prev_state().map(EntityStateClass::name), Some("closed"));
    assert_eq!(controller.next_state().map(EntityStateClass::name), Some("open"));

    actions.clear();
    controller.update(0.5, &mut actions);
    assert_eq!(
        actions,
        vec![
            StateAction::LeaveState { state: ids.closed.clone() },
            StateAction::StartTransition {
                from: ids.closed.clone(),
                to: ids.open.clone(),
                transition: ids.opening.clone(),
            },
            StateAction::UpdateTransition {
                from: ids.closed.clone(),
                to: ids.open.clone(),
                transition: ids.opening.clone(),
                time: 0.0,
                dt: 0.5,
            },
        ]
    );

    // the last step is clamped to the end of the transition
    actions.clear();
    controller.update(0.75, &mut actions);
    assert_eq!(
        actions,
        vec![
            StateAction::UpdateTransition {
                from: ids.closed.clone(),
                to: ids.open.clone(),
                transition: ids.opening.clone(),
                time: 0.5,
                dt: 0.5,
            },
            StateAction::FinishTransition {
                from: ids.closed.clone(),
                to: ids.open.clone(),
                transition: ids.opening,
            },
            StateAction::EnterState { state: ids.open.clone() },
        ]
    );
    assert_eq!(controller.controller_state(), ControllerState::InState);
    assert_eq!(controller.current_state().map(EntityStateClass::id), Some(ids.open.as_str()));
    assert!(controller.transition().is_none());
    assert_eq!(controller.time(), 0.0);
}

#[test]
fn instant_transition_finishes_in_one_update() {
    let class = Arc::new(door_controller());
    let ids = ids(&class);
    let mut controller = EntityStateController::new(Arc::clone(&class));
    let mut actions = Vec::new();
    controller.update(0.0, &mut actions);
    controller.start_transition(&ids.opening).expect("opening");
    controller.update(1.0, &mut actions);
    assert_eq!(controller.current_state().map(EntityStateClass::name), Some("open"));

    controller.start_transition(&ids.closing).expect("closing leaves open");
    actions.clear();
    controller.update(0.25, &mut actions);
    assert!(matches!(
        actions.as_slice(),
        [
            StateAction::LeaveState { .. },
            StateAction::StartTransition { .. },
            StateAction::UpdateTransition { dt, .. },
            StateAction::FinishTransition { .. },
            StateAction::EnterState { state },
        ] if *dt == 0.0 && *state == ids.closed
    ));
}

#[test]
fn transition_is_rejected_outside_its_source_state() {
    let class = Arc::new(door_controller());
    let ids = ids(&class);
    let mut controller = EntityStateController::new(Arc::clone(&class));

    // not entered yet
    assert!(controller.start_transition(&ids.opening).is_err());

    let mut actions = Vec::new();
    controller.update(0.1, &mut actions);
    assert!(matches!(
        controller.start_transition(&ids.closing),
        Err(StrataError::NotFound(_))
    ));
    assert!(matches!(
        controller.start_transition("no-such-transition"),
        Err(StrataError::NotFound(_))
    ));

    controller.start_transition(&ids.opening).expect("opening");
    // already moving
    assert!(controller.start_transition(&ids.opening).is_err());
}

#[test]
fn controller_values() {
    let mut controller = EntityStateController::new(Arc::new(door_controller()));
    assert!(!controller.has_value("speed"));
    controller.set_value("speed", 2.5_f32);
    controller.set_value("locked", true);
    assert_eq!(controller.find_value("speed"), Some(&ScriptValue::Float(2.5)));

    controller.set_value("speed", "fast");
    assert_eq!(controller.find_value("speed").and_then(ScriptValue::as_str), Some("fast"));

    controller.clear_values();
    assert!(!controller.has_value("locked"));
    assert!(controller.find_value("speed").is_none());
}

// ============================================================================
// Entity
// ============================================================================

#[test]
fn entity_forwards_controller_actions() {
    init_logging();
    let class = Arc::new(door_entity_class());
    let ids = ids(class.state_controller().expect("controller"));
    let mut entity = Entity::from_class(Arc::clone(&class));
    let mut events = Vec::new();

    entity.update(0.5, &mut events);
    let actions: Vec<&StateAction> = events
        .iter()
        .filter_map(|e| match e {
            EntityEvent::State(action) => Some(action),
            _ => None,
        })
        .collect();
    assert_eq!(actions.len(), 3);
    assert_eq!(actions[0], &StateAction::EnterState { state: ids.closed.clone() });

    let controller = entity.state_controller_mut().expect("instance");
    controller.start_transition(&ids.opening).expect("opening");
    events.clear();
    entity.update(1.0, &mut events);
    assert!(events.contains(&EntityEvent::State(StateAction::EnterState {
        state: ids.open.clone()
    })));
    assert_eq!(
        entity.state_controller().and_then(|c| c.current_state()).map(EntityStateClass::id),
        Some(ids.open.as_str())
    );
}

#[test]
fn entity_without_controller_reports_no_state_actions() {
    let mut class = door_entity_class();
    class.delete_state_controller();
    let mut entity = Entity::from_class(Arc::new(class));
    let mut events = Vec::new();
    entity.update(0.5, &mut events);
    assert!(entity.state_controller().is_none());
    assert!(events.is_empty());
}

#[test]
fn scene_forwards_controller_actions() {
    let entity_class = Arc::new(door_entity_class());
    let mut scene_class = SceneClass::new("hall");
    let door = scene_class.add_node(EntityPlacement::new("door", entity_class));
    scene_class.link_child(None, door);
    let mut scene = Scene::new(Arc::new(scene_class));

    let mut events = Vec::new();
    scene.update(0.25, &mut events);
    assert!(events
        .iter()
        .any(|e| matches!(e.event, EntityEvent::State(StateAction::EnterState { .. }))));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn entity_class_json_keeps_state_controller() -> anyhow::Result<()> {
    init_logging();
    let mut class = door_entity_class();
    if let Some(controller) = class.state_controller_mut() {
        controller.set_script_id("door-script");
    }

    let text = serde_json::to_string(&class.into_json())?;
    let copy = EntityClass::from_json(&serde_json::from_str(&text)?)?;
    let loaded = copy.state_controller().expect("controller");
    let original = class.state_controller().expect("controller");
    assert_eq!(loaded.id(), original.id());
    assert_eq!(loaded.initial_state_id(), original.initial_state_id());
    assert_eq!(loaded.script_id(), "door-script");
    assert_eq!(loaded.states(), original.states());
    assert_eq!(loaded.transitions(), original.transitions());
    assert_eq!(copy.hash_value(), class.hash_value());
    Ok(())
}

#[test]
fn entity_class_hash_tracks_state_controller() {
    let mut class = door_entity_class();
    let before = class.hash_value();

    if let Some(controller) = class.state_controller_mut() {
        controller.transition_mut(0).set_duration(2.0);
    }
    let edited = class.hash_value();
    assert_ne!(edited, before);

    class.delete_state_controller();
    assert_ne!(class.hash_value(), edited);
}

#[test]
fn state_controller_edit_does_not_touch_spawned_entities() {
    let mut class = door_entity_class();
    let shared = Arc::new(class.clone());
    let entity = Entity::from_class(Arc::clone(&shared));

    if let Some(controller) = class.state_controller_mut() {
        controller.set_name("gate");
    }
    assert_eq!(entity.state_controller().map(EntityStateController::name), Some("door"));
    assert_eq!(class.state_controller().map(EntityStateControllerClass::name), Some("gate"));
}

#[test]
fn entity_class_clone_copies_state_controller() {
    let class = door_entity_class();
    let copy = class.clone_class();
    let original = class.state_controller().expect("controller");
    let cloned = copy.state_controller().expect("controller");
    assert_ne!(cloned.id(), original.id());
    assert_eq!(cloned.states().len(), 2);
    let closed = cloned.find_state_by_name("closed").expect("closed");
    assert_eq!(cloned.initial_state_id(), closed.id());
    assert_ne!(closed.id(), original.initial_state_id());
}
