//! Error Types
//!
//! This module defines the error type shared by every Strata crate.
//!
//! # Overview
//!
//! Only the load/serialization boundary and the scripting surface report
//! failures through [`StrataError`]. Tree and node layers treat misuse
//! (linking an already linked node, indexing out of bounds) as programmer
//! error and panic, while animators degrade missing prerequisites into
//! logged no-ops.
//!
//! ```rust,ignore
//! use strata_core::errors::{StrataError, Result};
//!
//! fn load(value: &serde_json::Value) -> Result<EntityClass> {
//!     EntityClass::from_json(value)
//! }
//! ```

use thiserror::Error;

/// The main error type for the Strata engine.
#[derive(Error, Debug)]
pub enum StrataError {
    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// Malformed JSON or a value with the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field was not present in the serialized data.
    #[error("Missing field '{field}' in {context}")]
    MissingField {
        /// What was being loaded
        context: &'static str,
        /// The missing field name
        field: &'static str,
    },

    /// A field was present but its value could not be used.
    #[error("Invalid field '{field}' in {context}: {reason}")]
    InvalidField {
        /// What was being loaded
        context: &'static str,
        /// The offending field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// A serialized tree refers to a node the lookup can't resolve.
    #[error("Unknown tree node: {0}")]
    UnknownNode(String),

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// Script variable lookup failed.
    #[error("No such variable: {0}")]
    NoSuchVariable(String),

    /// Generic lookup miss (animation, node, entity).
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
