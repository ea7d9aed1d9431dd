use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Comparison applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Exact match.
    Eq(Value),
    /// Case-insensitive substring match on text columns.
    Contains(String),
    /// Inclusive lower bound.
    Gte(Value),
    /// Inclusive upper bound.
    Lte(Value),
    /// Column value is one of the listed values. An empty list matches nothing.
    In(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self { column, op: FilterOp::Eq(value.into()) }
    }

    pub fn contains(column: &'static str, term: impl Into<String>) -> Self {
        Self { column, op: FilterOp::Contains(term.into()) }
    }

    pub fn gte(column: &'static str, value: impl Into<Value>) -> Self {
        Self { column, op: FilterOp::Gte(value.into()) }
    }

    pub fn lte(column: &'static str, value: impl Into<Value>) -> Self {
        Self { column, op: FilterOp::Lte(value.into()) }
    }

    pub fn is_in<I, V>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            column,
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        let value = &row[self.column];
        match &self.op {
            FilterOp::Eq(expected) => values_equal(value, expected),
            FilterOp::Contains(term) => value
                .as_str()
                .map(|text| text.to_lowercase().contains(&term.to_lowercase()))
                .unwrap_or(false),
            FilterOp::Gte(bound) => {
                !value.is_null() && compare_values(value, bound) != Ordering::Less
            }
            FilterOp::Lte(bound) => {
                !value.is_null() && compare_values(value, bound) != Ordering::Greater
            }
            FilterOp::In(candidates) => candidates.iter().any(|c| values_equal(value, c)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Filter(Filter),
    /// At least one of the filters must match.
    Any(Vec<Filter>),
}

impl Condition {
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Condition::Filter(filter) => filter.matches(row),
            Condition::Any(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self { column, descending: false }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self { column, descending: true }
    }
}

/// Conjunction of conditions plus ordering and paging, independent of the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub conditions: Vec<Condition>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.conditions.push(Condition::Filter(filter));
        self
    }

    pub fn filter_opt(self, filter: Option<Filter>) -> Self {
        match filter {
            Some(filter) => self.filter(filter),
            None => self,
        }
    }

    pub fn any(mut self, filters: Vec<Filter>) -> Self {
        if filters.is_empty() {
            self.conditions
                .push(Condition::Filter(Filter::is_in("id", Vec::<Value>::new())));
        } else {
            self.conditions.push(Condition::Any(filters));
        }
        self
    }

    pub fn order_by(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, limit: Option<usize>, offset: Option<usize>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Sorts by the requested columns, then by ascending id.
    pub fn sort(&self, rows: &mut [Value]) {
        rows.sort_by(|a, b| {
            for order in &self.order {
                let ord = compare_values(&a[order.column], &b[order.column]);
                let ord = if order.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            compare_values(&a["id"], &b["id"])
        });
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total order over JSON values. Dates and RFC 3339 timestamps compare chronologically,
/// other text compares case-insensitively. Nulls sort first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => compare_text(x, y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn compare_text(x: &str, y: &str) -> Ordering {
    if let (Ok(dx), Ok(dy)) = (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
        return dx.cmp(&dy);
    }
    if let (Ok(dx), Ok(dy)) = (
        NaiveDate::parse_from_str(x, "%Y-%m-%d"),
        NaiveDate::parse_from_str(y, "%Y-%m-%d"),
    ) {
        return dx.cmp(&dy);
    }
    x.to_lowercase()
        .cmp(&y.to_lowercase())
        .then_with(|| x.cmp(y))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
