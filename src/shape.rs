//! Element shapes and records.
//!
//! A [`Shape`] is the compile-time description of an element type: its name
//! and its ordered, typed properties. Builders work against [`ShapeInfo`], the
//! erased form, so the same code path serves typed [`Query<T>`](crate::Query)
//! handles and untyped [`DynQuery`](crate::DynQuery) handles.
//!
//! Shapes are normally derived:
//!
//! ```
//! use dynaquery::{Shape, ShapeInfo};
//!
//! #[derive(Shape, Clone, Debug)]
//! struct Item {
//!     #[shape(key)]
//!     code: String,
//!     name: String,
//!     status: i32,
//! }
//!
//! let shape = ShapeInfo::of::<Item>();
//! assert_eq!(shape.name, "Item");
//! assert_eq!(shape.key_property().map(|p| p.name), Some("code"));
//! ```

use crate::value::{Value, ValueExtractionError, ValueKind, ValueType};

/// One readable property of an element shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: &'static str,
    pub kind: ValueKind,
    /// Marked as the primary-key-like field.
    pub key: bool,
}

impl Property {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            key: false,
        }
    }

    pub const fn key(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            key: true,
        }
    }
}

/// Compile-time description of an element type.
pub trait Shape {
    /// Shape name used in diagnostics.
    const NAME: &'static str;

    /// Properties in declaration order.
    const PROPERTIES: &'static [Property];
}

/// Erased shape description carried by query handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeInfo {
    pub name: &'static str,
    pub properties: &'static [Property],
}

impl ShapeInfo {
    pub fn of<T: Shape + ?Sized>() -> Self {
        Self {
            name: T::NAME,
            properties: T::PROPERTIES,
        }
    }

    /// Property with exactly this name.
    pub fn property(&self, name: &str) -> Option<&'static Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// First property annotated as key.
    pub fn key_property(&self) -> Option<&'static Property> {
        self.properties.iter().find(|p| p.key)
    }

    pub fn first_property(&self) -> Option<&'static Property> {
        self.properties.first()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// An ordered set of named values: one materialized element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set a field, replacing an existing one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Extract a typed field; a missing field reads as `Null`.
    pub fn extract<T: ValueType>(&self, name: &str) -> Result<T, ValueExtractionError> {
        T::from_value(self.get(name).unwrap_or(&Value::Null)).map_err(|reason| {
            ValueExtractionError::Field {
                field: name.to_string(),
                reason: Box::new(reason),
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

/// Types that can be written into a [`Record`].
pub trait IntoRecord {
    fn to_record(&self) -> Record;
}

/// Types that can be decoded from a [`Record`].
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, ValueExtractionError>;
}

impl IntoRecord for Record {
    fn to_record(&self) -> Record {
        self.clone()
    }
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> Result<Self, ValueExtractionError> {
        Ok(record.clone())
    }
}
