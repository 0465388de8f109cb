//! StructuredResponse derive macro implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Field};

use crate::utils::doc_description;

/// Per-field settings gathered from `#[field(...)]` and doc comments.
struct FieldSettings {
    description: String,
    ge: Option<f64>,
    gt: Option<f64>,
    le: Option<f64>,
    lt: Option<f64>,
    multiple_of: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

/// Implementation for `#[derive(StructuredResponse)]`
pub fn derive_structured_response_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    name,
                    "StructuredResponse requires a struct with named fields",
                )
                .to_compile_error()
                .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "StructuredResponse can only be derived for structs")
                .to_compile_error()
                .into()
        }
    };

    let mut schema_fields = Vec::new();
    let mut from_fields = Vec::new();
    for field in fields {
        let ident = field.ident.as_ref().unwrap();
        let field_name = ident.to_string();
        let ty = &field.ty;

        let settings = match parse_field_settings(field) {
            Ok(settings) => settings,
            Err(err) => return err.to_compile_error().into(),
        };
        let description = &settings.description;
        let constraints = constraints_tokens(&settings);

        schema_fields.push(quote! {
            ::markform::SchemaField::new(#field_name, <#ty as ::markform::FieldValue>::kind())
                .with_description(#description)
                .with_constraints(#constraints)
        });
        from_fields.push(quote! {
            #ident: <#ty as ::markform::FieldValue>::from_decoded(
                #field_name,
                decoded.get(#field_name).unwrap_or(&::markform::DecodedValue::Null),
            )?
        });
    }

    let expanded = quote! {
        impl #impl_generics ::markform::StructuredResponse for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #name_str
            }

            fn schema() -> ::markform::SchemaObject {
                ::markform::SchemaObject::with_fields(
                    #name_str,
                    ::std::vec![#(#schema_fields),*],
                )
            }

            fn from_decoded(
                decoded: &::markform::DecodedObject,
            ) -> ::std::result::Result<Self, ::markform::DecodeError> {
                ::std::result::Result::Ok(Self {
                    #(#from_fields),*
                })
            }
        }

        impl #impl_generics ::markform::FieldValue for #name #ty_generics #where_clause {
            fn kind() -> ::markform::FieldKind {
                ::markform::FieldKind::Object(::markform::SchemaRef::from_fn(
                    #name_str,
                    <#name #ty_generics as ::markform::StructuredResponse>::schema,
                ))
            }

            fn from_decoded(
                field: &str,
                value: &::markform::DecodedValue,
            ) -> ::std::result::Result<Self, ::markform::DecodeError> {
                match value {
                    ::markform::DecodedValue::Object(obj) => {
                        <#name #ty_generics as ::markform::StructuredResponse>::from_decoded(obj)
                    }
                    ::markform::DecodedValue::Null => {
                        ::std::result::Result::Err(::markform::DecodeError::validation(
                            field,
                            "missing required nested object",
                        ))
                    }
                    other => ::std::result::Result::Err(::markform::DecodeError::validation(
                        field,
                        ::std::format!("expected nested object, found {}", other.kind_name()),
                    )),
                }
            }
        }
    };

    TokenStream::from(expanded)
}

fn parse_field_settings(field: &Field) -> syn::Result<FieldSettings> {
    let mut settings = FieldSettings {
        description: doc_description(&field.attrs),
        ge: None,
        gt: None,
        le: None,
        lt: None,
        multiple_of: None,
        min_length: None,
        max_length: None,
    };

    for attr in &field.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("description") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                settings.description = lit.value();
            } else if meta.path.is_ident("ge") {
                settings.ge = Some(parse_number(&meta)?);
            } else if meta.path.is_ident("gt") {
                settings.gt = Some(parse_number(&meta)?);
            } else if meta.path.is_ident("le") {
                settings.le = Some(parse_number(&meta)?);
            } else if meta.path.is_ident("lt") {
                settings.lt = Some(parse_number(&meta)?);
            } else if meta.path.is_ident("multiple_of") {
                settings.multiple_of = Some(parse_number(&meta)?);
            } else if meta.path.is_ident("min_length") {
                settings.min_length = Some(parse_usize(&meta)?);
            } else if meta.path.is_ident("max_length") {
                settings.max_length = Some(parse_usize(&meta)?);
            } else {
                return Err(meta.error("unknown `field` attribute"));
            }
            Ok(())
        })?;
    }

    Ok(settings)
}

fn parse_number(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<f64> {
    let value = meta.value()?;
    let lit: syn::Lit = value.parse()?;
    match lit {
        syn::Lit::Int(int) => int.base10_parse::<f64>(),
        syn::Lit::Float(float) => float.base10_parse::<f64>(),
        other => Err(syn::Error::new_spanned(other, "expected a numeric literal")),
    }
}

fn parse_usize(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<usize> {
    let value = meta.value()?;
    let lit: syn::LitInt = value.parse()?;
    lit.base10_parse::<usize>()
}

fn constraints_tokens(settings: &FieldSettings) -> TokenStream2 {
    let mut tokens = quote! { ::markform::Constraints::new() };
    if let Some(v) = settings.ge {
        tokens = quote! { #tokens.with_ge(#v) };
    }
    if let Some(v) = settings.gt {
        tokens = quote! { #tokens.with_gt(#v) };
    }
    if let Some(v) = settings.le {
        tokens = quote! { #tokens.with_le(#v) };
    }
    if let Some(v) = settings.lt {
        tokens = quote! { #tokens.with_lt(#v) };
    }
    if let Some(v) = settings.multiple_of {
        tokens = quote! { #tokens.with_multiple_of(#v) };
    }
    if let Some(v) = settings.min_length {
        tokens = quote! { #tokens.with_min_length(#v) };
    }
    if let Some(v) = settings.max_length {
        tokens = quote! { #tokens.with_max_length(#v) };
    }
    tokens
}
