//! ResponseEnum derive macro implementation.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::utils::to_snake_case;

/// Implementation for `#[derive(ResponseEnum)]`
pub fn derive_response_enum_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let name_str = name.to_string();

    let variants = match &input.data {
        syn::Data::Enum(data) => &data.variants,
        _ => {
            return syn::Error::new_spanned(name, "ResponseEnum can only be derived for enums")
                .to_compile_error()
                .into()
        }
    };

    let mut idents = Vec::new();
    let mut values = Vec::new();
    for variant in variants {
        if !matches!(variant.fields, syn::Fields::Unit) {
            return syn::Error::new_spanned(variant, "ResponseEnum variants must be unit variants")
                .to_compile_error()
                .into();
        }
        let ident = &variant.ident;
        let mut value = to_snake_case(&ident.to_string());
        for attr in &variant.attrs {
            if attr.path().is_ident("value") {
                match attr.parse_args::<syn::LitStr>() {
                    Ok(lit) => value = lit.value(),
                    Err(err) => return err.to_compile_error().into(),
                }
            }
        }
        idents.push(ident.clone());
        values.push(value);
    }

    let expanded = quote! {
        impl ::markform::ResponseEnum for #name {
            fn allowed_values() -> &'static [&'static str] {
                &[#(#values),*]
            }

            fn from_tag_value(value: &str) -> ::std::option::Option<Self> {
                match value {
                    #(#values => ::std::option::Option::Some(Self::#idents),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn tag_value(&self) -> &'static str {
                match self {
                    #(Self::#idents => #values,)*
                }
            }
        }

        impl ::markform::FieldValue for #name {
            fn kind() -> ::markform::FieldKind {
                ::markform::FieldKind::Enum {
                    name: ::std::string::String::from(#name_str),
                    values: <Self as ::markform::ResponseEnum>::allowed_values()
                        .iter()
                        .map(|v| ::std::string::String::from(*v))
                        .collect(),
                }
            }

            fn from_decoded(
                field: &str,
                value: &::markform::DecodedValue,
            ) -> ::std::result::Result<Self, ::markform::DecodeError> {
                match value {
                    ::markform::DecodedValue::Text(s) => {
                        <Self as ::markform::ResponseEnum>::from_tag_value(s).ok_or_else(|| {
                            ::markform::DecodeError::validation(
                                field,
                                ::std::format!("'{}' is not an allowed value", s),
                            )
                        })
                    }
                    ::markform::DecodedValue::Null => {
                        ::std::result::Result::Err(::markform::DecodeError::validation(
                            field,
                            "missing required enum value",
                        ))
                    }
                    other => ::std::result::Result::Err(::markform::DecodeError::validation(
                        field,
                        ::std::format!("expected enum value, found {}", other.kind_name()),
                    )),
                }
            }
        }
    };

    TokenStream::from(expanded)
}
