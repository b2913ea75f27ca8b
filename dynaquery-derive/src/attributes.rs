//! Attribute parsing utilities

use syn::{Attribute, Field, LitStr};

/// Options of one `#[shape(..)]` field.
#[derive(Default)]
pub struct ShapeFieldAttributes {
    pub is_key: bool,
    pub rename: Option<String>,
    pub is_skipped: bool,
}

/// Options of one `#[descriptor(..)]` field.
#[derive(Default)]
pub struct DescriptorFieldAttributes {
    pub is_flattened: bool,
    pub rename: Option<String>,
    pub is_skipped: bool,
}

/// Parse `#[shape(key, rename = "..", skip)]` on a field
pub fn parse_shape_attributes(field: &Field) -> syn::Result<ShapeFieldAttributes> {
    let mut attrs = ShapeFieldAttributes::default();

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("shape")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                attrs.is_key = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                attrs.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.is_skipped = true;
                Ok(())
            } else {
                Err(meta.error("expected `key`, `rename` or `skip`"))
            }
        })?;
    }

    if attrs.is_key && attrs.is_skipped {
        return Err(syn::Error::new_spanned(field, "a skipped field cannot be the key"));
    }
    Ok(attrs)
}

/// Parse `#[descriptor(flatten, rename = "..", skip)]` on a field
pub fn parse_descriptor_attributes(field: &Field) -> syn::Result<DescriptorFieldAttributes> {
    let mut attrs = DescriptorFieldAttributes::default();

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("descriptor")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("flatten") {
                attrs.is_flattened = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                attrs.rename = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                attrs.is_skipped = true;
                Ok(())
            } else {
                Err(meta.error("expected `flatten`, `rename` or `skip`"))
            }
        })?;
    }

    if attrs.is_flattened && attrs.rename.is_some() {
        return Err(syn::Error::new_spanned(field, "a flattened field has no name to rename"));
    }
    Ok(attrs)
}

/// Extract `#[descriptor(offset = "method")]` from struct attributes
pub fn extract_offset_method(attrs: &[Attribute]) -> syn::Result<Option<syn::Ident>> {
    let mut method = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("descriptor")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("offset") {
                let name: LitStr = meta.value()?.parse()?;
                method = Some(name.parse::<syn::Ident>()?);
                Ok(())
            } else {
                Err(meta.error("expected `offset`"))
            }
        })?;
    }
    Ok(method)
}
