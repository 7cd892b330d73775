//! nodetype - property assignability checks for a typed content store
//!
//! Decides whether a value, or an ordered array of values, may be written
//! to a typed property slot of a node type:
//! - `value`: semantic types, values, the coercion table and conversions
//! - `nodetype`: definitions, constraints, the registry and the checker
//! - `observability`: structured JSON logging
//! - `cli`: command-line front end

pub mod cli;
pub mod nodetype;
pub mod observability;
pub mod value;
