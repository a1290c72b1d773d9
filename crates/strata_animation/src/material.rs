//! Material animator: drives named material parameters of a drawable.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use strata_core::hash::hash_combine;
use strata_core::json::{read, read_array, read_or, read_str, to_json};
use strata_core::{Interpolation, Result, interpolate};
use strata_nodes::{MaterialParam, MaterialParamMap, Node};

use crate::animator::{AnimatorBase, BaseKeys, NodeAnimator};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialAnimatorClass {
    pub base: AnimatorBase,
    pub interpolation: Interpolation,
    /// End values keyed by parameter name.
    pub params: MaterialParamMap,
}

impl MaterialAnimatorClass {
    #[must_use]
    pub fn new(name: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            base: AnimatorBase::new(name, node_id),
            ..Self::default()
        }
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: MaterialParam) {
        self.params.insert(name.into(), value);
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&MaterialParam> {
        self.params.get(name)
    }

    pub fn delete_param(&mut self, name: &str) {
        self.params.remove(name);
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = self.base.hash_value(0);
        hash = hash_combine(hash, &self.interpolation);
        for (key, value) in &self.params {
            hash = hash_combine(hash, key);
            hash = hash_combine(hash, value);
        }
        hash
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        self.base.write_json(&mut chunk, BaseKeys::MATERIAL);
        chunk.insert("method".into(), to_json(&self.interpolation));
        let params = self
            .params
            .iter()
            .map(|(name, value)| {
                serde_json::json!({
                    "name": name,
                    "value": to_json(value),
                })
            })
            .collect();
        chunk.insert("params".into(), Value::Array(params));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "material animator";
        let mut class = Self {
            base: AnimatorBase::read_json(value, CONTEXT, BaseKeys::MATERIAL)?,
            interpolation: read_or(value, CONTEXT, "method", Interpolation::default())?,
            params: MaterialParamMap::new(),
        };
        for chunk in read_array(value, "params") {
            let name = read_str(chunk, CONTEXT, "name")?;
            let param: MaterialParam = read(chunk, CONTEXT, "value")?;
            class.params.insert(name.to_owned(), param);
        }
        Ok(class)
    }
}

#[derive(Debug, Clone)]
pub struct MaterialAnimator {
    class: Arc<MaterialAnimatorClass>,
    start_values: BTreeMap<String, MaterialParam>,
}

impl MaterialAnimator {
    #[must_use]
    pub fn new(class: Arc<MaterialAnimatorClass>) -> Self {
        Self {
            class,
            start_values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn class(&self) -> &MaterialAnimatorClass {
        &self.class
    }
}

fn mix(start: &MaterialParam, end: &MaterialParam, t: f32, method: Interpolation) -> Option<MaterialParam> {
    use MaterialParam as M;
    Some(match (start, end) {
        (M::Float(a), M::Float(b)) => M::Float(interpolate(*a, *b, t, method)),
        (M::Int(a), M::Int(b)) => M::Int(interpolate(*a, *b, t, method)),
        (M::Vec2(a), M::Vec2(b)) => M::Vec2(interpolate(*a, *b, t, method)),
        (M::Vec3(a), M::Vec3(b)) => M::Vec3(interpolate(*a, *b, t, method)),
        (M::Vec4(a), M::Vec4(b)) => M::Vec4(interpolate(*a, *b, t, method)),
        (M::Color(a), M::Color(b)) => M::Color(interpolate(*a, *b, t, method)),
        // Strings and mismatched types can't be interpolated.
        _ => return None,
    })
}

impl NodeAnimator for MaterialAnimator {
    fn start(&mut self, node: &mut Node) {
        if !self.can_apply(node, true) {
            return;
        }
        let Some(draw) = node.drawable() else {
            return;
        };
        self.start_values.clear();
        for key in self.class.params.keys() {
            if let Some(value) = draw.material_param(key) {
                self.start_values.insert(key.clone(), value.clone());
            } else {
                log::warn!(
                    "Entity node material parameter was not found. [node='{}', param='{}']",
                    node.name(),
                    key
                );
            }
        }
    }

    fn apply(&mut self, node: &mut Node, t: f32) {
        let Some(draw) = node.drawable_mut() else {
            return;
        };
        for (key, start) in &self.start_values {
            let Some(end) = self.class.params.get(key) else {
                continue;
            };
            if let Some(value) = mix(start, end, t, self.class.interpolation) {
                draw.set_material_param(key.clone(), value);
            }
        }
    }

    fn finish(&mut self, node: &mut Node) {
        let Some(draw) = node.drawable_mut() else {
            return;
        };
        for (key, value) in &self.class.params {
            draw.set_material_param(key.clone(), value.clone());
        }
    }

    fn can_apply(&self, node: &Node, verbose: bool) -> bool {
        let present = node.has_drawable();
        if !present && verbose {
            log::warn!(
                "Material animator can't apply on a node without a drawable. [animator='{}', node='{}']",
                self.class.base.name,
                node.name()
            );
        }
        present
    }

    fn base(&self) -> &AnimatorBase {
        &self.class.base
    }
}
