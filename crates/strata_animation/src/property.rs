//! Property animator: drives a single named value on one of the node's
//! components.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_core::hash::{StableHash, Xxh3, hash_combine};
use strata_core::json::{read, read_or, to_json};
use strata_core::{Color4f, Interpolatable, Interpolation, Result, interpolate};
use strata_nodes::{BasicLight, Drawable, LinearMover, Node, RigidBody, TextItem};

use crate::animator::{AnimatorBase, BaseKeys, NodeAnimator};

/// Component a property lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTarget {
    Drawable,
    RigidBody,
    TextItem,
    LinearMover,
    BasicLight,
}

/// Value type a property expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    String,
    Vec2,
    Vec3,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyName {
    #[default]
    DrawableTimeScale,
    DrawableRotationX,
    DrawableRotationY,
    DrawableRotationZ,
    DrawableTranslationX,
    DrawableTranslationY,
    DrawableTranslationZ,
    DrawableSizeZ,
    RigidBodyLinearVelocityX,
    RigidBodyLinearVelocityY,
    RigidBodyLinearVelocity,
    RigidBodyAngularVelocity,
    TextItemText,
    TextItemColor,
    LinearMoverLinearVelocity,
    LinearMoverLinearVelocityX,
    LinearMoverLinearVelocityY,
    LinearMoverLinearAcceleration,
    LinearMoverLinearAccelerationX,
    LinearMoverLinearAccelerationY,
    LinearMoverAngularVelocity,
    LinearMoverAngularAcceleration,
    BasicLightDirection,
    BasicLightTranslation,
    BasicLightAmbientColor,
    BasicLightDiffuseColor,
    BasicLightSpecularColor,
    BasicLightSpotHalfAngle,
    BasicLightConstantAttenuation,
    BasicLightLinearAttenuation,
    BasicLightQuadraticAttenuation,
}

impl PropertyName {
    #[must_use]
    pub fn target(self) -> PropertyTarget {
        use PropertyName as P;
        match self {
            P::DrawableTimeScale
            | P::DrawableRotationX
            | P::DrawableRotationY
            | P::DrawableRotationZ
            | P::DrawableTranslationX
            | P::DrawableTranslationY
            | P::DrawableTranslationZ
            | P::DrawableSizeZ => PropertyTarget::Drawable,
            P::RigidBodyLinearVelocityX
            | P::RigidBodyLinearVelocityY
            | P::RigidBodyLinearVelocity
            | P::RigidBodyAngularVelocity => PropertyTarget::RigidBody,
            P::TextItemText | P::TextItemColor => PropertyTarget::TextItem,
            P::LinearMoverLinearVelocity
            | P::LinearMoverLinearVelocityX
            | P::LinearMoverLinearVelocityY
            | P::LinearMoverLinearAcceleration
            | P::LinearMoverLinearAccelerationX
            | P::LinearMoverLinearAccelerationY
            | P::LinearMoverAngularVelocity
            | P::LinearMoverAngularAcceleration => PropertyTarget::LinearMover,
            P::BasicLightDirection
            | P::BasicLightTranslation
            | P::BasicLightAmbientColor
            | P::BasicLightDiffuseColor
            | P::BasicLightSpecularColor
            | P::BasicLightSpotHalfAngle
            | P::BasicLightConstantAttenuation
            | P::BasicLightLinearAttenuation
            | P::BasicLightQuadraticAttenuation => PropertyTarget::BasicLight,
        }
    }

    #[must_use]
    pub fn value_kind(self) -> ValueKind {
        use PropertyName as P;
        match self {
            P::TextItemText => ValueKind::String,
            P::TextItemColor
            | P::BasicLightAmbientColor
            | P::BasicLightDiffuseColor
            | P::BasicLightSpecularColor => ValueKind::Color,
            P::RigidBodyLinearVelocity
            | P::LinearMoverLinearVelocity
            | P::LinearMoverLinearAcceleration => ValueKind::Vec2,
            P::BasicLightDirection | P::BasicLightTranslation => ValueKind::Vec3,
            _ => ValueKind::Float,
        }
    }
}

/// End (and captured start) value of a property animator.
///
/// Serialized without a tag: a number, a string, a 2 or 3 element array or
/// a color object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Float(f32),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Color(Color4f),
}

impl Default for PropertyValue {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

impl PropertyValue {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::Color(_) => ValueKind::Color,
        }
    }

    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<Color4f> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl StableHash for PropertyValue {
    fn stable_hash(&self, state: &mut Xxh3) {
        match self {
            Self::Float(v) => {
                0u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::String(v) => {
                1u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Vec2(v) => {
                2u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Vec3(v) => {
                3u8.stable_hash(state);
                v.stable_hash(state);
            }
            Self::Color(v) => {
                4u8.stable_hash(state);
                v.stable_hash(state);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyAnimatorClass {
    pub base: AnimatorBase,
    pub interpolation: Interpolation,
    pub property: PropertyName,
    pub end_value: PropertyValue,
}

impl PropertyAnimatorClass {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        node_id: impl Into<String>,
        property: PropertyName,
        end_value: PropertyValue,
    ) -> Self {
        Self {
            base: AnimatorBase::new(name, node_id),
            interpolation: Interpolation::default(),
            property,
            end_value,
        }
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = self.base.hash_value(0);
        hash = hash_combine(hash, &self.interpolation);
        hash = hash_combine(hash, &(self.property as u32));
        hash_combine(hash, &self.end_value)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        self.base.write_json(&mut chunk, BaseKeys::PROPERTY);
        chunk.insert("method".into(), to_json(&self.interpolation));
        chunk.insert("name".into(), to_json(&self.property));
        chunk.insert("value".into(), to_json(&self.end_value));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "property animator";
        Ok(Self {
            base: AnimatorBase::read_json(value, CONTEXT, BaseKeys::PROPERTY)?,
            interpolation: read_or(value, CONTEXT, "method", Interpolation::default())?,
            property: read(value, CONTEXT, "name")?,
            end_value: read(value, CONTEXT, "value")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PropertyAnimator {
    class: Arc<PropertyAnimatorClass>,
    start_value: Option<PropertyValue>,
}

impl PropertyAnimator {
    #[must_use]
    pub fn new(class: Arc<PropertyAnimatorClass>) -> Self {
        Self {
            class,
            start_value: None,
        }
    }

    #[must_use]
    pub fn class(&self) -> &PropertyAnimatorClass {
        &self.class
    }

    #[must_use]
    pub fn start_value(&self) -> Option<&PropertyValue> {
        self.start_value.as_ref()
    }

    fn capture(&self, node: &Node) -> Option<PropertyValue> {
        use PropertyName as P;
        use PropertyValue as V;
        let draw = node.drawable();
        let body = node.rigid_body();
        let text = node.text_item();
        let mover = node.linear_mover();
        let light = node.basic_light();
        Some(match self.class.property {
            P::DrawableTimeScale => V::Float(draw?.time_scale()),
            P::DrawableRotationX => V::Float(draw?.rotator().x),
            P::DrawableRotationY => V::Float(draw?.rotator().y),
            P::DrawableRotationZ => V::Float(draw?.rotator().z),
            P::DrawableTranslationX => V::Float(draw?.offset().x),
            P::DrawableTranslationY => V::Float(draw?.offset().y),
            P::DrawableTranslationZ => V::Float(draw?.offset().z),
            P::DrawableSizeZ => V::Float(draw?.depth()),
            P::RigidBodyLinearVelocityX => V::Float(body?.linear_velocity().x),
            P::RigidBodyLinearVelocityY => V::Float(body?.linear_velocity().y),
            P::RigidBodyLinearVelocity => V::Vec2(body?.linear_velocity()),
            P::RigidBodyAngularVelocity => V::Float(body?.angular_velocity()),
            P::TextItemText => V::String(text?.text().to_owned()),
            P::TextItemColor => V::Color(text?.text_color()),
            P::LinearMoverLinearVelocity => V::Vec2(mover?.linear_velocity()),
            P::LinearMoverLinearVelocityX => V::Float(mover?.linear_velocity().x),
            P::LinearMoverLinearVelocityY => V::Float(mover?.linear_velocity().y),
            P::LinearMoverLinearAcceleration => V::Vec2(mover?.linear_acceleration()),
            P::LinearMoverLinearAccelerationX => V::Float(mover?.linear_acceleration().x),
            P::LinearMoverLinearAccelerationY => V::Float(mover?.linear_acceleration().y),
            P::LinearMoverAngularVelocity => V::Float(mover?.angular_velocity()),
            P::LinearMoverAngularAcceleration => V::Float(mover?.angular_acceleration()),
            P::BasicLightDirection => V::Vec3(light?.direction),
            P::BasicLightTranslation => V::Vec3(light?.translation),
            P::BasicLightAmbientColor => V::Color(light?.ambient_color),
            P::BasicLightDiffuseColor => V::Color(light?.diffuse_color),
            P::BasicLightSpecularColor => V::Color(light?.specular_color),
            P::BasicLightSpotHalfAngle => V::Float(light?.spot_half_angle),
            P::BasicLightConstantAttenuation => V::Float(light?.constant_attenuation),
            P::BasicLightLinearAttenuation => V::Float(light?.linear_attenuation),
            P::BasicLightQuadraticAttenuation => V::Float(light?.quadratic_attenuation),
        })
    }

    /// The value at `t`, or the exact end value when not interpolating.
    fn value<T: Interpolatable>(
        &self,
        t: f32,
        interpolate_value: bool,
        get: fn(&PropertyValue) -> Option<T>,
    ) -> Option<T> {
        let end = get(&self.class.end_value)?;
        if !interpolate_value {
            return Some(end);
        }
        let start = self.start_value.as_ref().and_then(get).unwrap_or(end);
        Some(interpolate(start, end, t, self.class.interpolation))
    }

    fn set_value(&self, node: &mut Node, t: f32, interpolate_value: bool) {
        if !self.can_apply(node, false) {
            return;
        }
        let property = self.class.property;
        let float = || self.value(t, interpolate_value, PropertyValue::as_f32);
        let vec2 = || self.value(t, interpolate_value, PropertyValue::as_vec2);
        let vec3 = || self.value(t, interpolate_value, PropertyValue::as_vec3);
        let color = || self.value(t, interpolate_value, PropertyValue::as_color);

        match property.target() {
            PropertyTarget::Drawable => {
                if let (Some(draw), Some(value)) = (node.drawable_mut(), float()) {
                    set_drawable_value(draw, property, value);
                }
            }
            PropertyTarget::RigidBody => {
                if let Some(body) = node.rigid_body_mut() {
                    set_rigid_body_value(body, property, float(), vec2());
                }
            }
            PropertyTarget::TextItem => {
                if let Some(text) = node.text_item_mut() {
                    if property == PropertyName::TextItemColor {
                        if let Some(value) = color() {
                            text.set_text_color(value);
                        }
                    } else {
                        self.set_text(text, t);
                    }
                }
            }
            PropertyTarget::LinearMover => {
                if let Some(mover) = node.linear_mover_mut() {
                    set_mover_value(mover, property, float(), vec2());
                }
            }
            PropertyTarget::BasicLight => {
                if let Some(light) = node.basic_light_mut() {
                    set_light_value(light, property, float(), vec3(), color());
                }
            }
        }
    }

    fn set_text(&self, text: &mut TextItem, t: f32) {
        let Some(end) = self.class.end_value.as_str() else {
            return;
        };
        let apply = match self.class.interpolation {
            Interpolation::StepStart => true,
            Interpolation::Step => t >= 0.5,
            _ => t >= 1.0,
        };
        if apply {
            text.set_text(end);
        }
    }
}

fn set_drawable_value(draw: &mut Drawable, property: PropertyName, value: f32) {
    use PropertyName as P;
    match property {
        P::DrawableTimeScale => draw.set_time_scale(value),
        P::DrawableRotationX | P::DrawableRotationY | P::DrawableRotationZ => {
            let mut rotator = draw.rotator();
            match property {
                P::DrawableRotationX => rotator.x = value,
                P::DrawableRotationY => rotator.y = value,
                _ => rotator.z = value,
            }
            draw.set_rotator(rotator);
        }
        P::DrawableTranslationX | P::DrawableTranslationY | P::DrawableTranslationZ => {
            let mut offset = draw.offset();
            match property {
                P::DrawableTranslationX => offset.x = value,
                P::DrawableTranslationY => offset.y = value,
                _ => offset.z = value,
            }
            draw.set_offset(offset);
        }
        P::DrawableSizeZ => draw.set_depth(value),
        _ => {}
    }
}

fn set_rigid_body_value(
    body: &mut RigidBody,
    property: PropertyName,
    float: Option<f32>,
    vec2: Option<Vec2>,
) {
    use PropertyName as P;
    match (property, float, vec2) {
        (P::RigidBodyAngularVelocity, Some(value), _) => body.adjust_angular_velocity(value),
        (P::RigidBodyLinearVelocityX, Some(value), _) => {
            let velocity = body.linear_velocity();
            body.adjust_linear_velocity(Vec2::new(value, velocity.y));
        }
        (P::RigidBodyLinearVelocityY, Some(value), _) => {
            let velocity = body.linear_velocity();
            body.adjust_linear_velocity(Vec2::new(velocity.x, value));
        }
        (P::RigidBodyLinearVelocity, _, Some(value)) => body.adjust_linear_velocity(value),
        _ => {}
    }
}

fn set_mover_value(
    mover: &mut LinearMover,
    property: PropertyName,
    float: Option<f32>,
    vec2: Option<Vec2>,
) {
    use PropertyName as P;
    match (property, float, vec2) {
        (P::LinearMoverLinearVelocity, _, Some(value)) => mover.set_linear_velocity(value),
        (P::LinearMoverLinearVelocityX, Some(value), _) => {
            let velocity = mover.linear_velocity();
            mover.set_linear_velocity(Vec2::new(value, velocity.y));
        }
        (P::LinearMoverLinearVelocityY, Some(value), _) => {
            let velocity = mover.linear_velocity();
            mover.set_linear_velocity(Vec2::new(velocity.x, value));
        }
        (P::LinearMoverLinearAcceleration, _, Some(value)) => {
            mover.set_linear_acceleration(value);
        }
        (P::LinearMoverLinearAccelerationX, Some(value), _) => {
            let acceleration = mover.linear_acceleration();
            mover.set_linear_acceleration(Vec2::new(value, acceleration.y));
        }
        (P::LinearMoverLinearAccelerationY, Some(value), _) => {
            let acceleration = mover.linear_acceleration();
            mover.set_linear_acceleration(Vec2::new(acceleration.x, value));
        }
        (P::LinearMoverAngularVelocity, Some(value), _) => mover.set_angular_velocity(value),
        (P::LinearMoverAngularAcceleration, Some(value), _) => {
            mover.set_angular_acceleration(value);
        }
        _ => {}
    }
}

fn set_light_value(
    light: &mut BasicLight,
    property: PropertyName,
    float: Option<f32>,
    vec3: Option<Vec3>,
    color: Option<Color4f>,
) {
    use PropertyName as P;
    match property {
        P::BasicLightDirection => light.direction = vec3.unwrap_or(light.direction),
        P::BasicLightTranslation => light.translation = vec3.unwrap_or(light.translation),
        P::BasicLightAmbientColor => light.ambient_color = color.unwrap_or(light.ambient_color),
        P::BasicLightDiffuseColor => light.diffuse_color = color.unwrap_or(light.diffuse_color),
        P::BasicLightSpecularColor => {
            light.specular_color = color.unwrap_or(light.specular_color);
        }
        P::BasicLightSpotHalfAngle => light.spot_half_angle = float.unwrap_or(light.spot_half_angle),
        P::BasicLightConstantAttenuation => {
            light.constant_attenuation = float.unwrap_or(light.constant_attenuation);
        }
        P::BasicLightLinearAttenuation => {
            light.linear_attenuation = float.unwrap_or(light.linear_attenuation);
        }
        P::BasicLightQuadraticAttenuation => {
            light.quadratic_attenuation = float.unwrap_or(light.quadratic_attenuation);
        }
        _ => {}
    }
}

impl NodeAnimator for PropertyAnimator {
    fn start(&mut self, node: &mut Node) {
        if !self.can_apply(node, true) {
            return;
        }
        self.start_value = self.capture(node);
    }

    fn apply(&mut self, node: &mut Node, t: f32) {
        self.set_value(node, t, true);
    }

    fn finish(&mut self, node: &mut Node) {
        self.set_value(node, 1.0, false);
    }

    fn can_apply(&self, node: &Node, verbose: bool) -> bool {
        let property = self.class.property;
        if self.class.end_value.kind() != property.value_kind() {
            if verbose {
                log::warn!(
                    "Property animator value has the wrong type for the property. [animator='{}', node='{}', property={:?}, value={:?}]",
                    self.class.base.name,
                    node.name(),
                    property,
                    self.class.end_value
                );
            }
            return false;
        }
        let (present, what) = match property.target() {
            PropertyTarget::Drawable => (node.has_drawable(), "a drawable"),
            PropertyTarget::RigidBody => (node.has_rigid_body(), "a rigid body"),
            PropertyTarget::TextItem => (node.has_text_item(), "a text item"),
            PropertyTarget::LinearMover => (node.has_linear_mover(), "a linear mover"),
            PropertyTarget::BasicLight => (node.has_basic_light(), "a basic light"),
        };
        if !present {
            if verbose {
                log::warn!(
                    "Property animator can't set a value on a node without {}. [animator='{}', node='{}', value={:?}]",
                    what,
                    self.class.base.name,
                    node.name(),
                    property
                );
            }
            return false;
        }
        if property == PropertyName::TextItemText && !self.class.interpolation.is_step() && verbose {
            log::warn!(
                "Property animator can't apply interpolation on text. [animator='{}', node='{}', interpolation={:?}]",
                self.class.base.name,
                node.name(),
                self.class.interpolation
            );
        }
        true
    }

    fn base(&self) -> &AnimatorBase {
        &self.class.base
    }
}
