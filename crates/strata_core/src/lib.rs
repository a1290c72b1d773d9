//! # strata_core
//!
//! Foundation types shared by every Strata crate: the render tree and the
//! generic algorithms over it, ordered node storage, 2D transform math,
//! interpolation, colors, deterministic hashing and error handling.

pub mod arena;
pub mod color;
pub mod errors;
pub mod flags;
pub mod geometry;
pub mod hash;
pub mod ids;
pub mod interpolation;
pub mod json;
pub mod transform;
pub mod tree;
pub mod treeop;

pub use arena::NodeArena;
pub use color::Color4f;
pub use errors::{Result, StrataError};
pub use geometry::{OrientedBox, Rect};
pub use hash::{StableHash, hash_combine};
pub use ids::{new_id, random_string};
pub use interpolation::{Interpolatable, Interpolation, interpolate};
pub use transform::TransformStack;
pub use tree::{RenderTree, TreeVisitor};
pub use treeop::{NodeHit, TreeNode};
