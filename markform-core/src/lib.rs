//! # markform-core
//!
//! Schema model, decoded-value model, conversion traits, and error taxonomy
//! for markform's structured-response text protocol.
//!
//! ## Core Concepts
//!
//! - **[`SchemaObject`]** / **[`SchemaField`]**: a declarative, ordered
//!   description of a response object's fields and their kinds.
//! - **[`FieldKind`]**: the supported field kinds — primitives, enums,
//!   date/time, nested objects, and lists.
//! - **[`DecodedValue`]** / **[`DecodedObject`]**: the dynamically-typed tree
//!   the decoder resolves before typed construction.
//! - **[`StructuredResponse`]**, **[`ResponseEnum`]**, **[`FieldValue`]**: the
//!   traits derived types implement; the seam between Rust types and the
//!   schema-driven encoder/decoder.
//!
//! This crate is pure data and conversion logic: no I/O, no async, no shared
//! state. See the `markform` crate for the encoder and decoder themselves.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod convert;
pub mod error;
pub mod schema;
pub mod value;

pub use convert::{FieldValue, ResponseEnum, StructuredResponse};
pub use error::{DecodeError, ResponseParseError, SchemaError};
pub use schema::{Constraints, FieldKind, SchemaBuilder, SchemaField, SchemaObject, SchemaRef};
pub use value::{DecodedObject, DecodedValue};
