//! Animations: a set of animators sharing one playback clock.
//!
//! [`AnimationClass`] owns the animator classes plus the playback settings
//! (duration in seconds, start delay, looping). [`Animation`] is one
//! playback: it owns an animator instance per class animator and drives
//! them against the nodes of an entity.
//!
//! ```rust,ignore
//! let mut class = AnimationClass::new("idle");
//! class.set_duration(2.0);
//! class.add_animator(TransformAnimatorClass::new("slide", node_class_id));
//!
//! let mut animation = Animation::new(Arc::new(class));
//! animation.update(dt);
//! for node in nodes.iter_mut() {
//!     animation.apply(node);
//! }
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read, read_array, read_or, read_str, to_json};
use strata_core::{Result, StrataError, new_id};
use strata_nodes::Node;

use crate::animator::{Animator, AnimatorClass, AnimatorType, NodeAnimator};

#[derive(Debug, Clone)]
pub struct AnimationClass {
    id: String,
    name: String,
    /// Seconds.
    duration: f32,
    /// Seconds before the playback actually begins.
    delay: f32,
    looping: bool,
    animators: Vec<AnimatorClass>,
}

impl Default for AnimationClass {
    fn default() -> Self {
        Self {
            id: new_id(),
            name: String::new(),
            duration: 1.0,
            delay: 0.0,
            looping: false,
            animators: Vec::new(),
        }
    }
}

impl AnimationClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
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

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn set_duration(&mut self, seconds: f32) {
        self.duration = seconds.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn set_delay(&mut self, seconds: f32) {
        self.delay = seconds.max(0.0);
    }

    #[inline]
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    // ========================================================================
    // Animators
    // ========================================================================

    pub fn add_animator(&mut self, animator: impl Into<AnimatorClass>) {
        self.animators.push(animator.into());
    }

    #[must_use]
    pub fn animators(&self) -> &[AnimatorClass] {
        &self.animators
    }

    #[must_use]
    pub fn num_animators(&self) -> usize {
        self.animators.len()
    }

    #[must_use]
    pub fn animator(&self, index: usize) -> &AnimatorClass {
        &self.animators[index]
    }

    pub fn animator_mut(&mut self, index: usize) -> &mut AnimatorClass {
        &mut self.animators[index]
    }

    pub fn delete_animator(&mut self, index: usize) {
        assert!(index < self.animators.len(), "animator index out of bounds");
        self.animators.remove(index);
    }

    /// Returns false when no animator has the id.
    pub fn delete_animator_by_id(&mut self, id: &str) -> bool {
        let before = self.animators.len();
        self.animators.retain(|a| a.id() != id);
        self.animators.len() != before
    }

    #[must_use]
    pub fn find_animator_by_id(&self, id: &str) -> Option<&AnimatorClass> {
        self.animators.iter().find(|a| a.id() == id)
    }

    #[must_use]
    pub fn find_animator_by_name(&self, name: &str) -> Option<&AnimatorClass> {
        self.animators.iter().find(|a| a.name() == name)
    }

    pub fn find_animator_by_id_mut(&mut self, id: &str) -> Option<&mut AnimatorClass> {
        self.animators.iter_mut().find(|a| a.id() == id)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.duration);
        hash = hash_combine(hash, &self.looping);
        hash = hash_combine(hash, &self.delay);
        for animator in &self.animators {
            hash = hash_combine(hash, &animator.hash_value());
        }
        hash
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("duration".into(), to_json(&self.duration));
        chunk.insert("delay".into(), to_json(&self.delay));
        chunk.insert("looping".into(), Value::Bool(self.looping));
        let animators = self
            .animators
            .iter()
            .map(|animator| {
                serde_json::json!({
                    "type": to_json(&animator.animator_type()),
                    "animator": animator.into_json(),
                })
            })
            .collect();
        chunk.insert("animators".into(), Value::Array(animators));
        Value::Object(chunk)
    }

    /// Load an animation class. Animator chunks that fail to load are
    /// skipped with a warning.
    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "animation";
        let mut class = Self {
            id: read_str(value, CONTEXT, "id")?.to_owned(),
            name: read_or(value, CONTEXT, "name", String::new())?,
            ..Self::default()
        };
        class.set_duration(read_or(value, CONTEXT, "duration", 1.0)?);
        class.set_delay(read_or(value, CONTEXT, "delay", 0.0)?);
        class.looping = read_or(value, CONTEXT, "looping", false)?;

        for meta in read_array(value, "animators") {
            let loaded = read::<AnimatorType>(meta, CONTEXT, "type").and_then(|animator_type| {
                let chunk = meta.get("animator").ok_or(StrataError::MissingField {
                    context: CONTEXT,
                    field: "animator",
                })?;
                AnimatorClass::from_json(animator_type, chunk)
            });
            match loaded {
                Ok(animator) => class.animators.push(animator),
                Err(err) => log::warn!(
                    "Skipping animator that failed to load. [animation='{}', error='{}']",
                    class.name,
                    err
                ),
            }
        }
        Ok(class)
    }

    /// Deep copy with new ids for the animation and every animator.
    #[must_use]
    pub fn clone_class(&self) -> Self {
        Self {
            id: new_id(),
            name: self.name.clone(),
            duration: self.duration,
            delay: self.delay,
            looping: self.looping,
            animators: self.animators.iter().map(AnimatorClass::clone_class).collect(),
        }
    }
}

// ============================================================================
// Animation
// ============================================================================

#[derive(Debug, Clone)]
struct Track {
    animator: Animator,
    /// Class id of the target node.
    node_id: String,
    started: bool,
    ended: bool,
}

/// One playback of an [`AnimationClass`].
#[derive(Debug, Clone)]
pub struct Animation {
    class: Arc<AnimationClass>,
    tracks: Vec<Track>,
    /// Seconds, starts at `-delay`.
    current_time: f32,
    delay: f32,
}

impl Animation {
    #[must_use]
    pub fn new(class: Arc<AnimationClass>) -> Self {
        let tracks = class.animators.iter().map(Self::create_track).collect();
        let delay = class.delay;
        Self {
            class,
            tracks,
            current_time: -delay,
            delay,
        }
    }

    fn create_track(class: &AnimatorClass) -> Track {
        Track {
            animator: class.create_instance(),
            node_id: class.node_id().to_owned(),
            started: false,
            ended: false,
        }
    }

    #[must_use]
    pub fn class(&self) -> &AnimationClass {
        &self.class
    }

    #[must_use]
    pub fn shared_class(&self) -> &Arc<AnimationClass> {
        &self.class
    }

    #[must_use]
    pub fn class_id(&self) -> &str {
        &self.class.id
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.class.looping
    }

    /// Seconds since the start of the playback, negative while delaying.
    #[must_use]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[must_use]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Change the delay of a playback that hasn't begun yet.
    pub fn set_delay(&mut self, seconds: f32) {
        if self.current_time <= 0.0 {
            self.delay = seconds.max(0.0);
            self.current_time = -self.delay;
        }
    }

    /// Playback position in [0, 1].
    #[must_use]
    pub fn normalized_time(&self) -> f32 {
        let duration = self.class.duration;
        if duration <= 0.0 {
            return 1.0;
        }
        (self.current_time / duration).clamp(0.0, 1.0)
    }

    /// Advance the clock, clamped to `[-delay, duration]`.
    pub fn update(&mut self, dt: f32) {
        self.current_time = (self.current_time + dt).clamp(-self.delay, self.class.duration);
    }

    /// Drive every animator that targets this node.
    pub fn apply(&mut self, node: &mut Node) {
        if self.current_time < 0.0 {
            return;
        }
        let pos = self.normalized_time();

        for track in &mut self.tracks {
            if track.node_id != node.class_id() {
                continue;
            }
            let start = track.animator.start_time();
            let end = track.animator.end_time();
            if pos < start {
                continue;
            }
            if pos >= end {
                if !track.ended {
                    track.animator.finish(node);
                    track.ended = true;
                }
                continue;
            }
            if !track.started {
                track.animator.start(node);
                track.started = true;
            }
            let t = ((pos - start) / (end - start)).clamp(0.0, 1.0);
            track.animator.apply(node, t);
        }
    }

    /// Finish every animator on this node that hasn't finished yet.
    pub fn finish(&mut self, node: &mut Node) {
        for track in &mut self.tracks {
            if track.node_id == node.class_id() && !track.ended {
                track.animator.finish(node);
                track.ended = true;
            }
        }
    }

    /// True once every animator finished and the clock reached the end.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tracks.iter().all(|t| t.ended) && self.current_time >= self.class.duration
    }

    /// Start the playback over with fresh animator instances.
    pub fn restart(&mut self) {
        for track in &mut self.tracks {
            if let Some(class) = self.class.find_animator_by_id(track.animator.class_id()) {
                *track = Self::create_track(class);
            }
        }
        self.current_time = -self.delay;
    }

    pub fn animators(&self) -> impl Iterator<Item = &Animator> {
        self.tracks.iter().map(|t| &t.animator)
    }

    #[must_use]
    pub fn find_animator_by_class_id(&self, id: &str) -> Option<&Animator> {
        self.animators().find(|a| a.class_id() == id)
    }

    #[must_use]
    pub fn find_animator_by_name(&self, name: &str) -> Option<&Animator> {
        self.animators().find(|a| a.class_name() == name)
    }

    /// Run-time access for retargeting, e.g. a dynamic transform animator.
    pub fn find_animator_by_class_id_mut(&mut self, id: &str) -> Option<&mut Animator> {
        self.tracks
            .iter_mut()
            .map(|t| &mut t.animator)
            .find(|a| a.class_id() == id)
    }

    pub fn find_animator_by_name_mut(&mut self, name: &str) -> Option<&mut Animator> {
        self.tracks
            .iter_mut()
            .map(|t| &mut t.animator)
            .find(|a| a.class_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformAnimatorClass;

    #[test]
    fn clock_starts_at_negative_delay_and_clamps() {
        let mut class = AnimationClass::new("a");
        class.set_delay(0.5);
        class.set_duration(2.0);
        let mut animation = Animation::new(Arc::new(class));
        assert_eq!(animation.current_time(), -0.5);

        animation.update(-10.0);
        assert_eq!(animation.current_time(), -0.5);
        animation.update(100.0);
        assert_eq!(animation.current_time(), 2.0);
        assert_eq!(animation.normalized_time(), 1.0);
    }

    #[test]
    fn empty_animation_completes_at_duration() {
        let mut animation = Animation::new(Arc::new(AnimationClass::new("empty")));
        assert!(!animation.is_complete());
        animation.update(1.0);
        assert!(animation.is_complete());
    }

    #[test]
    fn clone_class_assigns_new_ids() {
        let mut class = AnimationClass::new("a");
        class.add_animator(TransformAnimatorClass::new("t", "node"));
        let copy = class.clone_class();
        assert_ne!(copy.id(), class.id());
        assert_ne!(copy.animator(0).id(), class.animator(0).id());
        assert_eq!(copy.animator(0).name(), "t");
    }
}
