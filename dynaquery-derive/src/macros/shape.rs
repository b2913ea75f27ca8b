//! Derive macro for `Shape`
//!
//! Emits the property table plus `IntoRecord`/`FromRecord`, so a derived
//! element type can be read from any engine and written into the in-memory
//! engine without hand-written glue.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

use crate::attributes::parse_shape_attributes;
use crate::utils;

pub fn derive_shape(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let shape_name = LitStr::new(&utils::unraw(struct_name), struct_name.span());
    let fields = utils::named_fields(input, "Shape")?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut properties = Vec::new();
    let mut record_inserts = Vec::new();
    let mut extractions: Vec<TokenStream2> = Vec::new();
    let mut key_seen = false;

    for field in fields {
        let attrs = parse_shape_attributes(field)?;
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;

        if attrs.is_skipped {
            extractions.push(quote! {
                #field_ident: ::core::default::Default::default()
            });
            continue;
        }

        if attrs.is_key {
            if key_seen {
                return Err(syn::Error::new_spanned(field, "only one field can be `#[shape(key)]`"));
            }
            key_seen = true;
        }

        let name = attrs.rename.unwrap_or_else(|| utils::unraw(field_ident));
        let name = LitStr::new(&name, field_ident.span());
        let constructor = if attrs.is_key {
            quote! { ::dynaquery::Property::key }
        } else {
            quote! { ::dynaquery::Property::new }
        };

        properties.push(quote! {
            #constructor(#name, <#field_type as ::dynaquery::ValueType>::KIND)
        });
        record_inserts.push(quote! {
            record.insert(
                #name,
                ::dynaquery::ValueType::into_value(::core::clone::Clone::clone(&self.#field_ident)),
            );
        });
        extractions.push(quote! {
            #field_ident: record.extract::<#field_type>(#name)?
        });
    }

    let property_count = properties.len();

    Ok(quote! {
        impl #impl_generics ::dynaquery::Shape for #struct_name #ty_generics #where_clause {
            const NAME: &'static str = #shape_name;
            const PROPERTIES: &'static [::dynaquery::Property] = &[
                #(#properties),*
            ];
        }

        impl #impl_generics ::dynaquery::IntoRecord for #struct_name #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn to_record(&self) -> ::dynaquery::Record {
                let mut record = ::dynaquery::Record::with_capacity(#property_count);
                #(#record_inserts)*
                record
            }
        }

        impl #impl_generics ::dynaquery::FromRecord for #struct_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn from_record(
                record: &::dynaquery::Record,
            ) -> ::core::result::Result<Self, ::dynaquery::ValueExtractionError> {
                ::core::result::Result::Ok(Self {
                    #(#extractions),*
                })
            }
        }
    })
}
