//! Core contracts for mockweave.
//!
//! This crate defines the schema document model (typed generation nodes and
//! their options), the `SchemaPath` location descriptor used for addressing
//! and value pooling, and the error type shared by the other crates.

pub mod error;
pub mod options;
pub mod path;
pub mod schema;

pub use error::{Error, Result};
pub use options::{SchemaOptions, SerializerOptions};
pub use path::{SchemaPath, normalize_path};
pub use schema::{
    ArrayLength, ArrayNode, BooleanNode, ConstantLength, DateNode, EmailGenerator,
    FormatGenerator, Literal, NodeOptions, NumberNode, ObjectNode, OneOfNode, PasswordGenerator,
    PluginNode, RandomLength, ReferenceNode, Schema, SchemaNode, StringGenerator, StringNode,
    UsernameGenerator,
};

/// Prefix marking a string as a reference expression.
pub const REF_PREFIX: &str = "ref:";
