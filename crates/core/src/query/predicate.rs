//! Filter predicates and their evaluation against tickets.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::field::{compare_text, FieldKind, FieldValue, TicketField};
use super::request::WhereFilter;
use super::QueryError;
use crate::ticket::{parse_timestamp, Ticket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    DoesNotStartWith,
    EndsWith,
    DoesNotEndWith,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.to_ascii_lowercase().as_str() {
            "equal" => FilterOperator::Equal,
            "notequal" => FilterOperator::NotEqual,
            "greaterthan" => FilterOperator::GreaterThan,
            "greaterthanorequal" => FilterOperator::GreaterThanOrEqual,
            "lessthan" => FilterOperator::LessThan,
            "lessthanorequal" => FilterOperator::LessThanOrEqual,
            "contains" => FilterOperator::Contains,
            "doesnotcontain" => FilterOperator::DoesNotContain,
            "startswith" => FilterOperator::StartsWith,
            "doesnotstartwith" => FilterOperator::DoesNotStartWith,
            "endswith" => FilterOperator::EndsWith,
            "doesnotendwith" => FilterOperator::DoesNotEndWith,
            "isnull" => FilterOperator::IsNull,
            "isnotnull" => FilterOperator::IsNotNull,
            "isempty" => FilterOperator::IsEmpty,
            "isnotempty" => FilterOperator::IsNotEmpty,
            _ => return Err(QueryError::UnknownOperator(s.to_string())),
        };
        Ok(op)
    }
}

/// How a complex predicate combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    And,
    Or,
}

impl FromStr for Condition {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Condition::And),
            "or" => Ok(Condition::Or),
            _ => Err(QueryError::UnknownCondition(s.to_string())),
        }
    }
}

/// Filter value coerced to the kind of the field it is compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

impl Operand {
    /// `None` when the value cannot be read as the field's kind.
    fn coerce(kind: FieldKind, value: &Value) -> Option<Self> {
        if value.is_null() {
            return Some(Operand::Null);
        }

        match kind {
            FieldKind::Int => match value {
                Value::Number(n) => n.as_i64().map(Operand::Int),
                Value::String(s) => s.trim().parse().ok().map(Operand::Int),
                _ => None,
            },
            FieldKind::Time => match value {
                Value::String(s) => parse_timestamp(s).map(Operand::Time),
                // epoch milliseconds, as JavaScript dates serialize via getTime()
                Value::Number(n) => n
                    .as_i64()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .map(Operand::Time),
                _ => None,
            },
            FieldKind::Text => scalar_text(value).map(Operand::Text),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPredicate {
    pub field: TicketField,
    pub operator: FilterOperator,
    pub operand: Option<Operand>,
    /// Raw value as text, for substring operators.
    pub text: Option<String>,
    pub ignore_case: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Leaf(LeafPredicate),
    Complex {
        condition: Condition,
        predicates: Vec<Predicate>,
    },
}

impl Predicate {
    /// Validate a wire filter into a typed predicate.
    pub fn parse(filter: &WhereFilter) -> Result<Self, QueryError> {
        if filter.is_complex {
            let condition = filter
                .condition
                .as_deref()
                .unwrap_or("and")
                .parse::<Condition>()?;
            let predicates = filter
                .predicates
                .iter()
                .flatten()
                .map(Predicate::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Predicate::Complex {
                condition,
                predicates,
            });
        }

        let field: TicketField = filter
            .field
            .as_deref()
            .ok_or(QueryError::MissingField)?
            .parse()?;
        let operator: FilterOperator = filter
            .operator
            .as_deref()
            .ok_or_else(|| QueryError::MissingOperator(field.name().to_string()))?
            .parse()?;

        Ok(Predicate::Leaf(LeafPredicate {
            field,
            operator,
            operand: Operand::coerce(field.kind(), &filter.value),
            text: scalar_text(&filter.value),
            ignore_case: filter.ignore_case.unwrap_or(true),
        }))
    }

    /// First operator declared, searching depth-first.
    pub fn first_operator(&self) -> Option<FilterOperator> {
        match self {
            Predicate::Leaf(leaf) => Some(leaf.operator),
            Predicate::Complex { predicates, .. } => {
                predicates.iter().find_map(Predicate::first_operator)
            }
        }
    }

    /// Evaluate against a ticket. `governing` replaces every leaf's own
    /// operator when set.
    pub fn matches(&self, ticket: &Ticket, governing: Option<FilterOperator>) -> bool {
        match self {
            Predicate::Leaf(leaf) => leaf.matches(ticket, governing.unwrap_or(leaf.operator)),
            Predicate::Complex { predicates, .. } if predicates.is_empty() => true,
            Predicate::Complex {
                condition: Condition::And,
                predicates,
            } => predicates.iter().all(|p| p.matches(ticket, governing)),
            Predicate::Complex {
                condition: Condition::Or,
                predicates,
            } => predicates.iter().any(|p| p.matches(ticket, governing)),
        }
    }
}

impl LeafPredicate {
    fn matches(&self, ticket: &Ticket, operator: FilterOperator) -> bool {
        let value = self.field.value(ticket);

        match operator {
            FilterOperator::IsNull => value.is_null(),
            FilterOperator::IsNotNull => !value.is_null(),
            FilterOperator::IsEmpty => is_empty(&value),
            FilterOperator::IsNotEmpty => !is_empty(&value),
            FilterOperator::Equal => self.equals(&value).unwrap_or(false),
            FilterOperator::NotEqual => self.equals(&value).map_or(false, |eq| !eq),
            FilterOperator::GreaterThan => self.ordering(&value) == Some(Ordering::Greater),
            FilterOperator::GreaterThanOrEqual => matches!(
                self.ordering(&value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::LessThan => self.ordering(&value) == Some(Ordering::Less),
            FilterOperator::LessThanOrEqual => matches!(
                self.ordering(&value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Contains => self.substring(&value, |h, n| h.contains(n)),
            FilterOperator::DoesNotContain => !self.substring(&value, |h, n| h.contains(n)),
            FilterOperator::StartsWith => self.substring(&value, |h, n| h.starts_with(n)),
            FilterOperator::DoesNotStartWith => !self.substring(&value, |h, n| h.starts_with(n)),
            FilterOperator::EndsWith => self.substring(&value, |h, n| h.ends_with(n)),
            FilterOperator::DoesNotEndWith => !self.substring(&value, |h, n| h.ends_with(n)),
        }
    }

    /// `None` when the filter value could not be coerced.
    fn equals(&self, value: &FieldValue<'_>) -> Option<bool> {
        let operand = self.operand.as_ref()?;
        let equal = match (value, operand) {
            (FieldValue::Null, Operand::Null) => true,
            (_, Operand::Null) | (FieldValue::Null, _) => false,
            (FieldValue::Text(a), Operand::Text(b)) if self.ignore_case => {
                a.to_lowercase() == b.to_lowercase()
            }
            _ => self.ordering(value) == Some(Ordering::Equal),
        };
        Some(equal)
    }

    fn ordering(&self, value: &FieldValue<'_>) -> Option<Ordering> {
        match (value, self.operand.as_ref()?) {
            (FieldValue::Int(a), Operand::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Time(a), Operand::Time(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), Operand::Text(b)) if self.ignore_case => {
                Some(compare_text(a, b))
            }
            (FieldValue::Text(a), Operand::Text(b)) => Some((*a).cmp(b.as_str())),
            _ => None,
        }
    }

    fn substring(&self, value: &FieldValue<'_>, test: impl Fn(&str, &str) -> bool) -> bool {
        let (Some(haystack), Some(needle)) = (value.display(), self.text.as_deref()) else {
            return false;
        };

        if self.ignore_case {
            test(&haystack.to_lowercase(), &needle.to_lowercase())
        } else {
            test(&haystack, needle)
        }
    }
}

fn is_empty(value: &FieldValue<'_>) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::Text(s) => s.is_empty(),
        _ => false,
    }
}
