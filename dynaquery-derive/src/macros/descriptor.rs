//! Derive macro for `Descriptor`

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

use crate::attributes::{extract_offset_method, parse_descriptor_attributes};
use crate::utils;

pub fn derive_descriptor(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let fields = utils::named_fields(input, "Descriptor")?;
    let offset_method = extract_offset_method(&input.attrs)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut field_inserts = Vec::new();
    let mut flattened = Vec::new();

    for field in fields {
        let attrs = parse_descriptor_attributes(field)?;
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        if attrs.is_skipped {
            continue;
        }

        if attrs.is_flattened {
            field_inserts.push(quote! {
                for (name, value) in ::dynaquery::Descriptor::fields(&self.#field_ident).iter() {
                    record.insert(name, ::core::clone::Clone::clone(value));
                }
            });
            flattened.push(field_ident);
            continue;
        }

        let name = attrs.rename.unwrap_or_else(|| utils::unraw(field_ident));
        let name = LitStr::new(&name, field_ident.span());
        field_inserts.push(quote! {
            record.insert(
                #name,
                ::dynaquery::ValueType::into_value(::core::clone::Clone::clone(&self.#field_ident)),
            );
        });
    }

    // explicit accessor first, then the flattened fields in declaration order
    let page_offset = match offset_method {
        Some(method) => quote! {
            ::core::option::Option::Some(::dynaquery::Value::UInt(self.#method()))
        },
        None => {
            let lookups = flattened.iter().map(|field_ident| {
                quote! {
                    if let ::core::option::Option::Some(offset) =
                        ::dynaquery::Descriptor::page_offset(&self.#field_ident)
                    {
                        return ::core::option::Option::Some(offset);
                    }
                }
            });
            quote! {
                #(#lookups)*
                ::core::option::Option::None
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::dynaquery::Descriptor for #struct_name #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn fields(&self) -> ::dynaquery::Record {
                let mut record = ::dynaquery::Record::new();
                #(#field_inserts)*
                record
            }

            fn page_offset(&self) -> ::core::option::Option<::dynaquery::Value> {
                #page_offset
            }
        }
    })
}
