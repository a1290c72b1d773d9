//! Entity state controllers.
//!
//! An [`EntityStateControllerClass`] is a small state machine attached to an
//! entity class: named states linked by timed transitions, plus the state
//! the machine starts in. An [`EntityStateController`] runs one instance of
//! it for an entity.
//!
//! The controller never picks a transition by itself. Each tick it reports
//! what happened as [`StateAction`]s, including one
//! [`StateAction::EvalTransition`] per transition leaving the current state.
//! Game code answers by calling [`EntityStateController::start_transition`]
//! for the one it wants to take.
//!
//! ```rust,ignore
//! let mut actions = Vec::new();
//! controller.update(dt, &mut actions);
//! for action in &actions {
//!     if let StateAction::EvalTransition { transition, .. } = action {
//!         if wants(transition) {
//!             controller.start_transition(transition)?;
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read_array, read_or, read_str, to_json};
use strata_core::{Result, StrataError, new_id};

use crate::script_var::ScriptValue;

// ============================================================================
// Classes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EntityStateClass {
    id: String,
    name: String,
}

impl EntityStateClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let hash = hash_combine(0, &self.id);
        hash_combine(hash, &self.name)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "entity state";
        Ok(Self {
            id: read_str(value, CONTEXT, "id")?.to_owned(),
            name: read_or(value, CONTEXT, "name", String::new())?,
        })
    }
}

/// A timed move from one state to another.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStateTransitionClass {
    id: String,
    name: String,
    src_state_id: String,
    dst_state_id: String,
    /// Seconds.
    duration: f32,
}

impl EntityStateTransitionClass {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        src_state_id: impl Into<String>,
        dst_state_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            src_state_id: src_state_id.into(),
            dst_state_id: dst_state_id.into(),
            duration: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn src_state_id(&self) -> &str {
        &self.src_state_id
    }

    pub fn set_src_state_id(&mut self, id: impl Into<String>) {
        self.src_state_id = id.into();
    }

    #[must_use]
    pub fn dst_state_id(&self) -> &str {
        &self.dst_state_id
    }

    pub fn set_dst_state_id(&mut self, id: impl Into<String>) {
        self.dst_state_id = id.into();
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, seconds: f32) {
        self.duration = seconds.max(0.0);
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.src_state_id);
        hash = hash_combine(hash, &self.dst_state_id);
        hash_combine(hash, &self.duration)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("src_state".into(), Value::String(self.src_state_id.clone()));
        chunk.insert("dst_state".into(), Value::String(self.dst_state_id.clone()));
        chunk.insert("duration".into(), to_json(&self.duration));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "entity state transition";
        let mut transition = Self {
            id: read_str(value, CONTEXT, "id")?.to_owned(),
            name: read_or(value, CONTEXT, "name", String::new())?,
            src_state_id: read_or(value, CONTEXT, "src_state", String::new())?,
            dst_state_id: read_or(value, CONTEXT, "dst_state", String::new())?,
            duration: 0.0,
        };
        transition.set_duration(read_or(value, CONTEXT, "duration", 0.0)?);
        Ok(transition)
    }
}

#[derive(Debug, Clone)]
pub struct EntityStateControllerClass {
    id: String,
    name: String,
    initial_state_id: String,
    script_id: String,
    states: Vec<EntityStateClass>,
    transitions: Vec<EntityStateTransitionClass>,
}

impl Default for EntityStateControllerClass {
    fn default() -> Self {
        Self::with_id(new_id())
    }
}

impl EntityStateControllerClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut class = Self::default();
        class.name = name.into();
        class
    }

    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            initial_state_id: String::new(),
            script_id: String::new(),
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn initial_state_id(&self) -> &str {
        &self.initial_state_id
    }

    pub fn set_initial_state_id(&mut self, id: impl Into<String>) {
        self.initial_state_id = id.into();
    }

    /// Id of the script that drives the controller, empty when none.
    #[must_use]
    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn set_script_id(&mut self, id: impl Into<String>) {
        self.script_id = id.into();
    }

    #[must_use]
    pub fn has_script_id(&self) -> bool {
        !self.script_id.is_empty()
    }

    // ========================================================================
    // States and transitions
    // ========================================================================

    pub fn add_state(&mut self, state: EntityStateClass) -> &EntityStateClass {
        self.states.push(state);
        let last = self.states.len() - 1;
        &self.states[last]
    }

    pub fn add_transition(
        &mut self,
        transition: EntityStateTransitionClass,
    ) -> &EntityStateTransitionClass {
        self.transitions.push(transition);
        let last = self.transitions.len() - 1;
        &self.transitions[last]
    }

    #[must_use]
    pub fn states(&self) -> &[EntityStateClass] {
        &self.states
    }

    #[must_use]
    pub fn transitions(&self) -> &[EntityStateTransitionClass] {
        &self.transitions
    }

    pub fn state_mut(&mut self, index: usize) -> &mut EntityStateClass {
        &mut self.states[index]
    }

    pub fn transition_mut(&mut self, index: usize) -> &mut EntityStateTransitionClass {
        &mut self.transitions[index]
    }

    /// Delete a state together with every transition into or out of it.
    pub fn delete_state_by_id(&mut self, id: &str) {
        self.states.retain(|s| s.id != id);
        self.transitions
            .retain(|t| t.src_state_id != id && t.dst_state_id != id);
        if self.initial_state_id == id {
            self.initial_state_id.clear();
        }
    }

    pub fn delete_transition_by_id(&mut self, id: &str) {
        self.transitions.retain(|t| t.id != id);
    }

    fn state_index(&self, id: &str) -> Option<usize> {
        self.states.iter().position(|s| s.id == id)
    }

    fn transition_index(&self, id: &str) -> Option<usize> {
        self.transitions.iter().position(|t| t.id == id)
    }

    #[must_use]
    pub fn find_state_by_id(&self, id: &str) -> Option<&EntityStateClass> {
        self.states.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn find_state_by_name(&self, name: &str) -> Option<&EntityStateClass> {
        self.states.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn find_transition_by_id(&self, id: &str) -> Option<&EntityStateTransitionClass> {
        self.transitions.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn find_transition_by_name(&self, name: &str) -> Option<&EntityStateTransitionClass> {
        self.transitions.iter().find(|t| t.name == name)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.name);
        hash = hash_combine(hash, &self.id);
        hash = hash_combine(hash, &self.script_id);
        hash = hash_combine(hash, &self.initial_state_id);
        for state in &self.states {
            hash = hash_combine(hash, &state.hash_value());
        }
        for transition in &self.transitions {
            hash = hash_combine(hash, &transition.hash_value());
        }
        hash
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("initial_state".into(), Value::String(self.initial_state_id.clone()));
        chunk.insert("script_id".into(), Value::String(self.script_id.clone()));
        chunk.insert(
            "states".into(),
            Value::Array(self.states.iter().map(EntityStateClass::into_json).collect()),
        );
        chunk.insert(
            "transitions".into(),
            Value::Array(
                self.transitions
                    .iter()
                    .map(EntityStateTransitionClass::into_json)
                    .collect(),
            ),
        );
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "entity state controller";
        let mut class = Self::with_id(read_str(value, CONTEXT, "id")?);
        class.name = read_or(value, CONTEXT, "name", String::new())?;
        class.initial_state_id = read_or(value, CONTEXT, "initial_state", String::new())?;
        class.script_id = read_or(value, CONTEXT, "script_id", String::new())?;
        for chunk in read_array(value, "states") {
            class.states.push(EntityStateClass::from_json(chunk)?);
        }
        for chunk in read_array(value, "transitions") {
            class.transitions.push(EntityStateTransitionClass::from_json(chunk)?);
        }
        Ok(class)
    }

    /// Deep copy with new ids for the controller, its states and
    /// transitions. Transition endpoints and the initial state follow the
    /// copied states.
    #[must_use]
    pub fn clone_class(&self) -> Self {
        let mut copy = Self::new(self.name.clone());
        copy.script_id = self.script_id.clone();

        let mut id_map: FxHashMap<&str, String> = FxHashMap::default();
        for state in &self.states {
            let clone = EntityStateClass::new(state.name.clone());
            id_map.insert(&state.id, clone.id.clone());
            copy.states.push(clone);
        }
        let remap = |id: &str| id_map.get(id).cloned().unwrap_or_default();
        for transition in &self.transitions {
            let mut clone = EntityStateTransitionClass::new(
                transition.name.clone(),
                remap(&transition.src_state_id),
                remap(&transition.dst_state_id),
            );
            clone.duration = transition.duration;
            copy.transitions.push(clone);
        }
        copy.initial_state_id = remap(&self.initial_state_id);
        copy
    }
}

// ============================================================================
// Instance
// ============================================================================

/// What the controller did during one update, in order. States and
/// transitions are named by their class ids.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAction {
    EnterState {
        state: String,
    },
    LeaveState {
        state: String,
    },
    /// `time` is the time spent in the state before this update.
    UpdateState {
        state: String,
        time: f32,
        dt: f32,
    },
    StartTransition {
        from: String,
        to: String,
        transition: String,
    },
    /// `time` is the time spent in the transition before this update and
    /// `dt` is clamped to the end of the transition.
    UpdateTransition {
        from: String,
        to: String,
        transition: String,
        time: f32,
        dt: f32,
    },
    FinishTransition {
        from: String,
        to: String,
        transition: String,
    },
    /// The transition may be taken with
    /// [`EntityStateController::start_transition`].
    EvalTransition {
        from: String,
        to: String,
        transition: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    InState,
    InTransition,
}

// Indices into the shared class, which never changes under the instance.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    /// The initial state has not been entered yet.
    Idle,
    InState(usize),
    InTransition {
        from: usize,
        to: usize,
        transition: usize,
        started: bool,
    },
}

#[derive(Debug, Clone)]
pub struct EntityStateController {
    class: Arc<EntityStateControllerClass>,
    phase: Phase,
    /// Seconds in the current state or transition.
    time: f32,
    values: FxHashMap<String, ScriptValue>,
}

impl EntityStateController {
    #[must_use]
    pub fn new(class: Arc<EntityStateControllerClass>) -> Self {
        Self {
            class,
            phase: Phase::Idle,
            time: 0.0,
            values: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn class(&self) -> &EntityStateControllerClass {
        &self.class
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.class.id()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Advance the controller by `dt` seconds and append what happened to
    /// `actions`. The first update enters the initial state; a controller
    /// whose initial state doesn't exist stays idle.
    pub fn update(&mut self, dt: f32, actions: &mut Vec<StateAction>) {
        let class = Arc::clone(&self.class);
        let state_id = |index: usize| class.states[index].id.clone();

        if self.phase == Phase::Idle {
            let Some(initial) = class.state_index(&class.initial_state_id) else {
                return;
            };
            self.phase = Phase::InState(initial);
            self.time = 0.0;
            actions.push(StateAction::EnterState { state: state_id(initial) });
        }

        match self.phase {
            Phase::Idle => {}
            Phase::InTransition { from, to, transition, started } => {
                let transition_id = class.transitions[transition].id.clone();
                if !started {
                    actions.push(StateAction::LeaveState { state: state_id(from) });
                    actions.push(StateAction::StartTransition {
                        from: state_id(from),
                        to: state_id(to),
                        transition: transition_id.clone(),
                    });
                }
                let duration = class.transitions[transition].duration;
                if self.time + dt >= duration {
                    actions.push(StateAction::UpdateTransition {
                        from: state_id(from),
                        to: state_id(to),
                        transition: transition_id.clone(),
                        time: self.time,
                        dt: duration - self.time,
                    });
                    actions.push(StateAction::FinishTransition {
                        from: state_id(from),
                        to: state_id(to),
                        transition: transition_id,
                    });
                    actions.push(StateAction::EnterState { state: state_id(to) });
                    self.phase = Phase::InState(to);
                    self.time = 0.0;
                } else {
                    actions.push(StateAction::UpdateTransition {
                        from: state_id(from),
                        to: state_id(to),
                        transition: transition_id,
                        time: self.time,
                        dt,
                    });
                    self.phase = Phase::InTransition { from, to, transition, started: true };
                    self.time += dt;
                }
            }
            Phase::InState(current) => {
                actions.push(StateAction::UpdateState {
                    state: state_id(current),
                    time: self.time,
                    dt,
                });
                self.time += dt;

                let current_id = &class.states[current].id;
                let leaving = class
                    .transitions
                    .iter()
                    .filter(|t| &t.src_state_id == current_id);
                for transition in leaving {
                    match class.state_index(&transition.dst_state_id) {
                        Some(next) => actions.push(StateAction::EvalTransition {
                            from: current_id.clone(),
                            to: state_id(next),
                            transition: transition.id.clone(),
                        }),
                        None => log::warn!(
                            "Transition has no destination state. [controller='{}', transition='{}']",
                            class.name,
                            transition.name
                        ),
                    }
                }
            }
        }
    }

    /// Start the transition with the given class id. It must leave the
    /// current state. The leave and start actions are reported by the next
    /// [`EntityStateController::update`].
    pub fn start_transition(&mut self, transition_id: &str) -> Result<()> {
        let Phase::InState(current) = self.phase else {
            return Err(StrataError::NotFound(format!(
                "current state for transition '{transition_id}'"
            )));
        };
        let Some(transition) = self.class.transition_index(transition_id) else {
            return Err(StrataError::NotFound(format!("transition '{transition_id}'")));
        };
        let class = &self.class.transitions[transition];
        if class.src_state_id != self.class.states[current].id {
            return Err(StrataError::NotFound(format!(
                "transition '{}' from state '{}'",
                class.name, self.class.states[current].name
            )));
        }
        let Some(to) = self.class.state_index(&class.dst_state_id) else {
            return Err(StrataError::NotFound(format!("state '{}'", class.dst_state_id)));
        };
        self.phase = Phase::InTransition {
            from: current,
            to,
            transition,
            started: false,
        };
        self.time = 0.0;
        Ok(())
    }

    #[must_use]
    pub fn controller_state(&self) -> ControllerState {
        match self.phase {
            Phase::InTransition { .. } => ControllerState::InTransition,
            Phase::Idle | Phase::InState(_) => ControllerState::InState,
        }
    }

    /// Current state; `None` before the first update and during transitions.
    #[must_use]
    pub fn current_state(&self) -> Option<&EntityStateClass> {
        match self.phase {
            Phase::InState(index) => Some(&self.class.states[index]),
            _ => None,
        }
    }

    /// State being left by the current transition.
    #[must_use]
    pub fn prev_state(&self) -> Option<&EntityStateClass> {
        match self.phase {
            Phase::InTransition { from, .. } => Some(&self.class.states[from]),
            _ => None,
        }
    }

    /// State being entered by the current transition.
    #[must_use]
    pub fn next_state(&self) -> Option<&EntityStateClass> {
        match self.phase {
            Phase::InTransition { to, .. } => Some(&self.class.states[to]),
            _ => None,
        }
    }

    #[must_use]
    pub fn transition(&self) -> Option<&EntityStateTransitionClass> {
        match self.phase {
            Phase::InTransition { transition, .. } => Some(&self.class.transitions[transition]),
            _ => None,
        }
    }

    /// Seconds spent in the current state or transition.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    // ========================================================================
    // Values
    // ========================================================================

    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn find_value(&self, name: &str) -> Option<&ScriptValue> {
        self.values.get(name)
    }

    /// Set a named value, replacing any previous one of any type.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<ScriptValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door() -> EntityStateControllerClass {
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

    #[test]
    fn deleting_state_drops_its_transitions() {
        let mut class = door();
        let closed = class.initial_state_id().to_owned();
        class.delete_state_by_id(&closed);
        assert_eq!(class.states().len(), 1);
        assert!(class.transitions().is_empty());
        assert_eq!(class.initial_state_id(), "");
    }

    #[test]
    fn clone_class_remaps_transition_endpoints() {
        let class = door();
        let copy = class.clone_class();
        assert_ne!(copy.id(), class.id());
        let closed = copy.find_state_by_name("closed").unwrap();
        let open = copy.find_state_by_name("open").unwrap();
        assert_ne!(closed.id(), class.states()[0].id());
        assert_eq!(copy.initial_state_id(), closed.id());
        let opening = copy.find_transition_by_name("opening").unwrap();
        assert_eq!(opening.src_state_id(), closed.id());
        assert_eq!(opening.dst_state_id(), open.id());
        assert_eq!(opening.duration(), 1.0);
    }

    #[test]
    fn missing_initial_state_keeps_controller_idle() {
        let mut class = door();
        class.set_initial_state_id("nowhere");
        let mut controller = EntityStateController::new(Arc::new(class));
        let mut actions = Vec::new();
        controller.update(0.1, &mut actions);
        assert!(actions.is_empty());
        assert!(controller.current_state().is_none());
        assert!(controller.start_transition("anything").is_err());
    }

    #[test]
    fn transition_must_leave_current_state() {
        let class = Arc::new(door());
        let closing = class.find_transition_by_name("closing").unwrap().id().to_owned();
        let mut controller = EntityStateController::new(Arc::clone(&class));
        let mut actions = Vec::new();
        controller.update(0.1, &mut actions);
        assert!(matches!(
            controller.start_transition(&closing),
            Err(StrataError::NotFound(_))
        ));
        assert_eq!(controller.current_state().map(EntityStateClass::name), Some("closed"));
    }
}
