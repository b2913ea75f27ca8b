//! Listing descriptors.
//!
//! A descriptor is any caller-supplied object carrying listing intent plus
//! optional search fields. It is read structurally through the [`Descriptor`]
//! trait, normally derived:
//!
//! ```
//! use dynaquery::{read_descriptor, Descriptor, Paging};
//!
//! #[derive(Descriptor)]
//! struct ItemFilter {
//!     column_order: String,
//!     is_desc: bool,
//!     #[descriptor(flatten)]
//!     paging: Paging,
//!     name: Option<String>,
//! }
//!
//! let filter = ItemFilter {
//!     column_order: "name".to_string(),
//!     is_desc: false,
//!     paging: Paging { page_index: 3, page_size: 20 },
//!     name: None,
//! };
//! let parsed = read_descriptor(&filter, "build_listing").unwrap();
//! assert_eq!(parsed.offset, 40);
//! assert_eq!(parsed.size, 20);
//! ```
//!
//! Recognized field names are exact: `column_order`, `is_desc`, `page_size`,
//! and an offset source. The offset comes from [`Descriptor::page_offset`]
//! when the descriptor computes one, then from a `page_offset` field, then
//! from a raw `page_index` field using [`page_offset`].

use crate::query::error::QueryError;
use crate::shape::Record;
use crate::value::coerce::{self, Coerced};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const COLUMN_ORDER: &str = "column_order";
pub const IS_DESC: &str = "is_desc";
pub const PAGE_SIZE: &str = "page_size";
pub const PAGE_INDEX: &str = "page_index";
pub const PAGE_OFFSET: &str = "page_offset";

/// Field names that never take part in search.
pub const RECOGNIZED_FIELDS: [&str; 5] = [COLUMN_ORDER, IS_DESC, PAGE_SIZE, PAGE_INDEX, PAGE_OFFSET];

/// Structural view of a descriptor.
pub trait Descriptor {
    /// All fields in declaration order.
    fn fields(&self) -> Record;

    /// Computed page offset, if the descriptor has an accessor for it.
    fn page_offset(&self) -> Option<Value> {
        None
    }
}

impl<D: Descriptor + ?Sized> Descriptor for &D {
    fn fields(&self) -> Record {
        (**self).fields()
    }

    fn page_offset(&self) -> Option<Value> {
        (**self).page_offset()
    }
}

impl Descriptor for Record {
    fn fields(&self) -> Record {
        self.clone()
    }
}

/// Offset of the page at `index` (1-based) with `size` rows per page.
///
/// Index 0 passes through as offset 0, so both 0 and 1 address the first page.
pub fn page_offset(index: u64, size: u16) -> u64 {
    if index > 0 {
        (index - 1).saturating_mul(u64::from(size))
    } else {
        index
    }
}

/// The four listing values read from a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSpec {
    pub column_order: String,
    pub is_desc: bool,
    pub offset: u64,
    pub size: u16,
}

fn lenient<T>(operation: &'static str, field: &'static str, coerced: Coerced<T>) -> T {
    if !coerced.ok {
        log::debug!("{operation}: [{field}] not convertible, using zero value");
    }
    coerced.into_inner()
}

/// Read the listing values from `descriptor`.
///
/// Every recognized field must be present; values are converted leniently.
pub fn read_descriptor<D: Descriptor + ?Sized>(
    descriptor: &D,
    operation: &'static str,
) -> Result<ListingSpec, QueryError> {
    let fields = descriptor.fields();
    let require = |field: &'static str| {
        fields
            .get(field)
            .ok_or(QueryError::MissingDescriptorField { operation, field })
    };

    let column_order = lenient(operation, COLUMN_ORDER, coerce::to_text(require(COLUMN_ORDER)?));
    let is_desc = lenient(operation, IS_DESC, coerce::to_bool(require(IS_DESC)?));
    let size = lenient(operation, PAGE_SIZE, coerce::to_u16(require(PAGE_SIZE)?));

    let offset = if let Some(computed) = descriptor.page_offset() {
        lenient(operation, PAGE_OFFSET, coerce::to_u64(&computed))
    } else if let Some(raw) = fields.get(PAGE_OFFSET) {
        lenient(operation, PAGE_OFFSET, coerce::to_u64(raw))
    } else if let Some(raw) = fields.get(PAGE_INDEX) {
        page_offset(lenient(operation, PAGE_INDEX, coerce::to_u64(raw)), size)
    } else {
        return Err(QueryError::MissingDescriptorField {
            operation,
            field: PAGE_OFFSET,
        });
    };

    Ok(ListingSpec {
        column_order,
        is_desc,
        offset,
        size,
    })
}

/// Page position of a listing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub page_index: u64,
    pub page_size: u16,
}

impl Paging {
    pub fn new(page_index: u64, page_size: u16) -> Self {
        Self {
            page_index,
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        page_offset(self.page_index, self.page_size)
    }
}

impl Descriptor for Paging {
    fn fields(&self) -> Record {
        Record::with_capacity(2)
            .with(PAGE_INDEX, self.page_index)
            .with(PAGE_SIZE, self.page_size)
    }

    fn page_offset(&self) -> Option<Value> {
        Some(Value::UInt(self.offset()))
    }
}

/// Ready-made listing descriptor: order column, direction flag and paging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, crate::Descriptor)]
pub struct Listing {
    pub column_order: String,
    pub is_desc: bool,
    #[serde(flatten)]
    #[descriptor(flatten)]
    pub paging: Paging,
}

/// Descriptor over an arbitrary JSON object, e.g. a request body.
///
/// Field order follows the object's key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonDescriptor(serde_json::Map<String, serde_json::Value>);

impl JsonDescriptor {
    pub fn new(object: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(object)
    }
}

impl FromStr for JsonDescriptor {
    type Err = serde_json::Error;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(json)
    }
}

impl Descriptor for JsonDescriptor {
    fn fields(&self) -> Record {
        self.0
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value.clone())))
            .collect()
    }
}
