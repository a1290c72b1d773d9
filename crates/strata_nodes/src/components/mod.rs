//! Optional node components.
//!
//! Every component comes as a pair: an immutable `XxxClass` shared between
//! all instances through an `Arc`, and an `Xxx` instance holding the state
//! that can change at runtime, seeded from the class.

pub mod drawable;
pub mod fixture;
pub mod light;
pub mod linear_mover;
pub mod map;
pub mod mesh_effect;
pub mod rigid_body;
pub mod spatial;
pub mod spline_mover;
pub mod text;

pub use drawable::{Drawable, DrawableClass, DrawableFlags, MaterialParam, MaterialParamMap};
pub use fixture::{Fixture, FixtureClass, FixtureFlags};
pub use light::{BasicLight, BasicLightClass, LightFlags, LightType};
pub use linear_mover::{Integrator, LinearMover, LinearMoverClass, MoverFlags};
pub use map::{MapNode, MapNodeClass};
pub use mesh_effect::{MeshEffect, MeshEffectClass, MeshEffectType};
pub use rigid_body::{CollisionShape, RigidBody, RigidBodyClass, RigidBodyFlags, Simulation};
pub use spatial::{SpatialFlags, SpatialNode, SpatialNodeClass, SpatialShape};
pub use spline_mover::{
    PathCoordinateSpace, PathCurveType, RotationMode, SplineMover, SplineMoverClass,
    SplineMoverFlags,
};
pub use text::{HorizontalTextAlign, TextFlags, TextItem, TextItemClass, VerticalTextAlign};
