//! Backend-agnostic clause IR.
//!
//! Builders never touch a backend; they append [`Clause`]s to a handle. A
//! backend either evaluates the sequence directly (see
//! [`MemoryEngine`](crate::MemoryEngine)) or lowers it into its own query API
//! (see [`lower`](crate::query::lower)). Clause order is significant: a second
//! `Skip`/`Take` pair applies to the rows left by the first.

use crate::shape::ShapeInfo;
use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => f.write_str("asc"),
            Direction::Descending => f.write_str("desc"),
        }
    }
}

/// Comparison operator of a search predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    GreaterOrEqual,
    LessOrEqual,
    /// Substring match on text.
    Contains,
    Equal,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Contains => "contains",
            Operator::Equal => "==",
        };
        f.write_str(symbol)
    }
}

/// `property <operator> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub property: String,
    pub operator: Operator,
    pub value: Value,
}

impl Predicate {
    pub fn new(property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equal(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Operator::Equal, value)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.property, self.operator, self.value)
    }
}

/// Where a projected field takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingSource {
    /// The identically named source field.
    Field(&'static str),
    /// The target field's zero value.
    Default(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub target: &'static str,
    pub source: BindingSource,
}

/// `select new Target { .. }` from the current element shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub source: ShapeInfo,
    pub target: ShapeInfo,
    pub bindings: Vec<Binding>,
}

/// One composable step of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Order {
        property: &'static str,
        direction: Direction,
    },
    Skip(u64),
    Take(u64),
    Filter(Predicate),
    Project(Projection),
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Order {
                property,
                direction,
            } => write!(f, "order_by({property}, {direction})"),
            Clause::Skip(n) => write!(f, "skip({n})"),
            Clause::Take(n) => write!(f, "take({n})"),
            Clause::Filter(p) => write!(f, "where({p})"),
            Clause::Project(p) => write!(f, "select({})", p.target.name),
        }
    }
}
