//! # strata_nodes
//!
//! The node model of entity classes: [`NodeClass`] templates, their
//! [`Node`] instances and the optional components (drawable, rigid body,
//! text, spatial index, fixture, map, movers, light, mesh effect) a node
//! can carry.

#[macro_use]
mod macros;

pub mod components;
pub mod node;
pub mod transform;

pub use components::*;
pub use node::{Node, NodeClass, NodeClassFlags};
pub use transform::NodeTransform;
