//! Named access to ticket fields and the value model shared by search,
//! filtering, sorting and grouping.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::QueryError;
use crate::ticket::Ticket;

/// A column of the ticket table, addressed by its PascalCase wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketField {
    TicketId,
    PublicTicketId,
    Title,
    Description,
    Category,
    Department,
    Assignee,
    CreatedBy,
    Status,
    Priority,
    ResponseDue,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

/// Storage kind of a field; filter values are coerced to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    Time,
}

impl TicketField {
    pub const ALL: [TicketField; 14] = [
        TicketField::TicketId,
        TicketField::PublicTicketId,
        TicketField::Title,
        TicketField::Description,
        TicketField::Category,
        TicketField::Department,
        TicketField::Assignee,
        TicketField::CreatedBy,
        TicketField::Status,
        TicketField::Priority,
        TicketField::ResponseDue,
        TicketField::DueDate,
        TicketField::CreatedAt,
        TicketField::UpdatedAt,
    ];

    /// Fields searched when a search entry names none.
    pub const TEXT: [TicketField; 9] = [
        TicketField::PublicTicketId,
        TicketField::Title,
        TicketField::Description,
        TicketField::Category,
        TicketField::Department,
        TicketField::Assignee,
        TicketField::CreatedBy,
        TicketField::Status,
        TicketField::Priority,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TicketField::TicketId => "TicketId",
            TicketField::PublicTicketId => "PublicTicketId",
            TicketField::Title => "Title",
            TicketField::Description => "Description",
            TicketField::Category => "Category",
            TicketField::Department => "Department",
            TicketField::Assignee => "Assignee",
            TicketField::CreatedBy => "CreatedBy",
            TicketField::Status => "Status",
            TicketField::Priority => "Priority",
            TicketField::ResponseDue => "ResponseDue",
            TicketField::DueDate => "DueDate",
            TicketField::CreatedAt => "CreatedAt",
            TicketField::UpdatedAt => "UpdatedAt",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            TicketField::TicketId => FieldKind::Int,
            TicketField::ResponseDue
            | TicketField::DueDate
            | TicketField::CreatedAt
            | TicketField::UpdatedAt => FieldKind::Time,
            _ => FieldKind::Text,
        }
    }

    pub fn value(self, ticket: &Ticket) -> FieldValue<'_> {
        let time = |t: Option<DateTime<Utc>>| t.map_or(FieldValue::Null, FieldValue::Time);

        match self {
            TicketField::TicketId => FieldValue::Int(ticket.ticket_id),
            TicketField::PublicTicketId => text(&ticket.public_ticket_id),
            TicketField::Title => text(&ticket.title),
            TicketField::Description => text(&ticket.description),
            TicketField::Category => text(&ticket.category),
            TicketField::Department => text(&ticket.department),
            TicketField::Assignee => text(&ticket.assignee),
            TicketField::CreatedBy => text(&ticket.created_by),
            TicketField::Status => text(&ticket.status),
            TicketField::Priority => text(&ticket.priority),
            TicketField::ResponseDue => time(ticket.response_due),
            TicketField::DueDate => time(ticket.due_date),
            TicketField::CreatedAt => time(ticket.created_at),
            TicketField::UpdatedAt => time(ticket.updated_at),
        }
    }
}

fn text(value: &Option<String>) -> FieldValue<'_> {
    value.as_deref().map_or(FieldValue::Null, FieldValue::Text)
}

impl FromStr for TicketField {
    type Err = QueryError;

    /// Case-insensitive; underscores are ignored so `due_date` names `DueDate`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '_').collect();
        TicketField::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| QueryError::UnknownField(s.to_string()))
    }
}

/// A field value borrowed from a ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Int(i64),
    Text(&'a str),
    Time(DateTime<Utc>),
}

impl FieldValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text form used by substring operators and search.
    pub fn display(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Null => None,
            FieldValue::Int(n) => Some(Cow::Owned(n.to_string())),
            FieldValue::Text(s) => Some(Cow::Borrowed(*s)),
            FieldValue::Time(t) => Some(Cow::Owned(format_time(t))),
        }
    }

    /// Group key as it appears in the response.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Text(s) => Value::from(*s),
            FieldValue::Time(t) => Value::from(format_time(t)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Int(_) => 1,
            FieldValue::Text(_) => 2,
            FieldValue::Time(_) => 3,
        }
    }
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Case-insensitive text ordering with an ordinal tie-break.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Total order used for sorting. Nulls sort first.
pub fn compare_values(a: &FieldValue<'_>, b: &FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Int(x), FieldValue::Int(y)) => x.cmp(y),
        (FieldValue::Text(x), FieldValue::Text(y)) => compare_text(x, y),
        (FieldValue::Time(x), FieldValue::Time(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}
