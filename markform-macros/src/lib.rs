//! # markform-macros
//!
//! Procedural macros for markform.
//!
//! This crate provides the derive macros that turn plain Rust types into
//! structured-response schemas without hand-written registration.
//!
//! ## StructuredResponse Macro
//!
//! ```ignore
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
//! ```
//!
//! ## ResponseEnum Macro
//!
//! ```ignore
//! #[derive(ResponseEnum)]
//! enum Sky {
//!     Clear,
//!     Cloudy,
//!     #[value("heavy_rain")]
//!     Rain,
//! }
//! ```

extern crate proc_macro;

mod response;
mod utils;
mod variants;

use proc_macro::TokenStream;

/// Derive macro for implementing the `StructuredResponse` trait.
///
/// Generates the schema (fields in declaration order), the typed constructor
/// from decoded values, and a `FieldValue` impl so the type can nest inside
/// other structured responses.
///
/// # Attributes
///
/// Field descriptions come from `///` doc comments, or from
/// `#[field(description = "...")]` which takes precedence. Numeric and length
/// bounds are informational and rendered into the generated prompt:
///
/// - `#[field(ge = ..., gt = ..., le = ..., lt = ...)]` - numeric bounds
/// - `#[field(multiple_of = ...)]` - multiple-of bound
/// - `#[field(min_length = ..., max_length = ...)]` - length bounds
///
/// # Example
///
/// ```ignore
/// #[derive(StructuredResponse)]
/// struct Person {
///     /// Person's full name
///     name: String,
///     /// Age in years
///     #[field(ge = 0, le = 150)]
///     age: u32,
///     /// Optional email address
///     email: Option<String>,
/// }
/// ```
#[proc_macro_derive(StructuredResponse, attributes(field))]
pub fn derive_structured_response(input: TokenStream) -> TokenStream {
    response::derive_structured_response_impl(input)
}

/// Derive macro for implementing the `ResponseEnum` trait.
///
/// Each unit variant maps to a tag value, the snake_case variant name by
/// default; `#[value("...")]` overrides it. Also generates a `FieldValue`
/// impl so the enum can be used as a field kind.
///
/// # Example
///
/// ```ignore
/// #[derive(ResponseEnum)]
/// enum Severity {
///     Low,
///     Medium,
///     #[value("very_high")]
///     High,
/// }
/// ```
#[proc_macro_derive(ResponseEnum, attributes(value))]
pub fn derive_response_enum(input: TokenStream) -> TokenStream {
    variants::derive_response_enum_impl(input)
}
