//! # Markform - Structured LLM Responses Over Tagged Markup
//!
//! Markform turns plain Rust types into prompt templates that teach a
//! language model to answer in a tagged-markup format, and decodes the
//! model's free-text answer back into those types. It targets models and
//! deployments without native function-calling: the whole contract lives in
//! the prompt text and a tolerant decoder.
//!
//! ## Quick Start
//!
//! ```ignore
//! use markform::prelude::*;
//!
//! #[derive(StructuredResponse)]
//! struct WeatherReport {
//!     /// City the report covers
//!     city: String,
//!     /// Temperature in celsius
//!     #[field(ge = -90, le = 60)]
//!     temperature: f64,
//!     /// Further remarks, if any
//!     remarks: Option<String>,
//! }
//!
//! // Append to the prompt sent to the model:
//! let instructions = render_schema_prompt::<WeatherReport>(&[])?;
//!
//! // Decode whatever the model answered:
//! let report: WeatherReport = parse_schema_response(&model_output, &[])?;
//! ```
//!
//! ## Key Features
//!
//! - **Derived schemas** with field descriptions harvested from doc comments
//! - **Tolerant decoding** of code fences, comments, prose and duplicate tags
//! - **Nested objects, lists and enums** with cycle-safe rendering
//! - **Permissive date/time parsing** for human-formatted answers
//! - **Dynamic schemas** via a builder, for shapes assembled at runtime
//!
//! ## Architecture
//!
//! Markform is organized as a workspace of focused crates:
//!
//! - [`markform_core`] - Schema model, decoded values, traits and errors
//! - [`markform_macros`] - `StructuredResponse` / `ResponseEnum` derives
//! - `markform` (this crate) - Encoder, decoder and markup utilities

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod datetime;
pub mod decode;
pub mod encode;
pub mod markup;

/// Schema model, decoded values, traits and errors.
pub use markform_core as core;

// Core type re-exports (flat). Generated derive code resolves these through
// the `::markform::` paths, so every name it references must live here.
pub use markform_core::{
    Constraints, DecodeError, DecodedObject, DecodedValue, FieldKind, FieldValue, ResponseEnum,
    ResponseParseError, SchemaBuilder, SchemaError, SchemaField, SchemaObject, SchemaRef,
    StructuredResponse,
};

pub use decode::{decode_response, parse_schema_response};
pub use encode::{render_prompt, render_schema_prompt, OPTIONAL_COMMENT, RESPONSE_TAG};

// The derives share names with the traits they implement, so a single
// `use markform::StructuredResponse` brings in both.
#[cfg(feature = "macros")]
#[cfg_attr(docsrs, doc(cfg(feature = "macros")))]
pub use markform_macros::{ResponseEnum, StructuredResponse};

/// Convenient prelude for common imports.
///
/// ```ignore
/// use markform::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        Constraints, DecodeError, DecodedObject, DecodedValue, FieldKind, FieldValue,
        ResponseParseError, SchemaBuilder, SchemaError, SchemaField, SchemaObject, SchemaRef,
    };

    pub use crate::decode::{decode_response, parse_schema_response};
    pub use crate::encode::{render_prompt, render_schema_prompt, RESPONSE_TAG};

    pub use crate::core::{ResponseEnum, StructuredResponse};

    #[cfg(feature = "macros")]
    pub use markform_macros::{ResponseEnum, StructuredResponse};
}

/// Returns the current version of markform.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
