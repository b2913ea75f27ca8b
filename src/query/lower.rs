//! Lowering of the clause IR into sea-query statements.
//!
//! Clauses are applied in order to a single `SELECT`. When a clause cannot be
//! expressed on the current statement without changing its meaning (a filter
//! after `LIMIT`, a second `OFFSET`, a second ordering) the statement so far
//! becomes a subquery and lowering continues on `SELECT * FROM (...) AS tN`.
//!
//! ```
//! use dynaquery::query::lower::to_select_statement;
//! use dynaquery::{Query, Shape};
//! use sea_query::PostgresQueryBuilder;
//!
//! #[derive(Shape)]
//! struct Item {
//!     id: u64,
//!     name: String,
//! }
//!
//! let q = Query::<Item>::new("items").build_paging(20, 10);
//! let sql = to_select_statement(q.as_dyn()).to_string(PostgresQueryBuilder);
//! assert!(sql.contains("LIMIT 10"));
//! assert!(sql.contains("OFFSET 20"));
//! ```

use crate::query::clause::{BindingSource, Clause, Direction, Operator, Predicate, Projection};
use crate::query::handle::DynQuery;
use crate::value::coerce;
use crate::value::Value;
use sea_query::{Asterisk, Expr, ExprTrait, Iden, LikeExpr, Order, Query as SqlQuery, SelectStatement};

/// Identifier taken from a collection, property or alias name.
struct Name(String);

impl Name {
    fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Iden for Name {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

struct Lowering {
    stmt: SelectStatement,
    depth: usize,
    offset: bool,
    limit: bool,
    ordered: bool,
    projected: bool,
}

impl Lowering {
    fn new(collection: &str) -> Self {
        let mut stmt = SqlQuery::select();
        stmt.column(Asterisk).from(Name::new(collection));
        Self {
            stmt,
            depth: 0,
            offset: false,
            limit: false,
            ordered: false,
            projected: false,
        }
    }

    fn paged(&self) -> bool {
        self.offset || self.limit
    }

    fn wrap(&mut self) {
        self.depth += 1;
        let inner = std::mem::replace(&mut self.stmt, SqlQuery::select());
        self.stmt
            .column(Asterisk)
            .from_subquery(inner, Name::new(format!("t{}", self.depth)));
        self.offset = false;
        self.limit = false;
        self.ordered = false;
        self.projected = false;
    }

    fn apply(&mut self, clause: &Clause) {
        match clause {
            Clause::Filter(predicate) => {
                if self.paged() || self.projected {
                    self.wrap();
                }
                self.stmt.cond_where(condition(predicate));
            }
            Clause::Order {
                property,
                direction,
            } => {
                if self.paged() || self.ordered {
                    self.wrap();
                }
                let order = match direction {
                    Direction::Ascending => Order::Asc,
                    Direction::Descending => Order::Desc,
                };
                self.stmt.order_by(Name::new(*property), order);
                self.ordered = true;
            }
            Clause::Skip(n) => {
                if self.paged() {
                    self.wrap();
                }
                self.stmt.offset(*n);
                self.offset = true;
            }
            Clause::Take(n) => {
                if self.limit {
                    self.wrap();
                }
                self.stmt.limit(*n);
                self.limit = true;
            }
            Clause::Project(projection) => {
                if self.projected {
                    self.wrap();
                }
                self.project(projection);
                self.projected = true;
            }
        }
    }

    fn project(&mut self, projection: &Projection) {
        self.stmt.clear_selects();
        for binding in &projection.bindings {
            let expr = match &binding.source {
                BindingSource::Field(name) => Expr::col(Name::new(*name)),
                BindingSource::Default(value) => Expr::val(sea_query::Value::from(value.clone())),
            };
            self.stmt.expr_as(expr, Name::new(binding.target));
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn condition(predicate: &Predicate) -> Expr {
    let column = Expr::col(Name::new(predicate.property.as_str()));
    if predicate.value.is_null() {
        return match predicate.operator {
            Operator::Equal => column.is_null(),
            _ => Expr::cust("FALSE"),
        };
    }
    let value = sea_query::Value::from(predicate.value.clone());
    match predicate.operator {
        Operator::GreaterOrEqual => column.gte(value),
        Operator::LessOrEqual => column.lte(value),
        Operator::Equal => column.eq(value),
        Operator::Contains => {
            let text = coerce::to_text(&predicate.value).into_inner();
            column.like(LikeExpr::new(format!("%{}%", escape_like(&text))).escape('\\'))
        }
    }
}

/// Lower the clause sequence of `query` into one `SELECT`.
pub fn to_select_statement(query: &DynQuery) -> SelectStatement {
    let mut lowering = Lowering::new(query.collection());
    for clause in query.clauses() {
        lowering.apply(clause);
    }
    lowering.stmt
}

/// `SELECT COUNT(*)` over the rows `query` yields.
pub fn to_count_statement(query: &DynQuery) -> SelectStatement {
    let mut stmt = SqlQuery::select();
    stmt.expr(Expr::cust("COUNT(*)"))
        .from_subquery(to_select_statement(query), Name::new("count_subquery"));
    stmt
}

/// Append `predicate` as an extra filter before lowering.
pub fn with_predicate(query: &DynQuery, predicate: Option<&Predicate>) -> DynQuery {
    match predicate {
        Some(p) => query.filter(p.clone()),
        None => query.clone(),
    }
}

/// Value rendered for a `Contains` pattern, exposed for engines that match text
/// themselves.
pub fn contains_text(value: &Value) -> String {
    coerce::to_text(value).into_inner()
}
