//! The list pipeline: search → filter → sort → count → group | page.
//!
//! Each stage takes the previous stage's tickets by value and returns a new
//! vector, so stages can be exercised on their own. The order is fixed;
//! callers cannot reorder it.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::field::{compare_values, TicketField};
use super::predicate::Predicate;
use super::types::{SearchTerm, SortDirection, SortKey, TicketQuery};
use crate::config::FilterMode;
use crate::ticket::Ticket;

/// One group of a grouped result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: Value,
    pub field: String,
    pub count: usize,
    pub items: GroupItems,
}

/// Tickets at the innermost grouping level, sub-groups above it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GroupItems {
    Tickets(Vec<Ticket>),
    Groups(Vec<Group>),
}

/// Response body of a list request. The grid relies on all three shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Grouped { result: Vec<Group>, count: usize },
    Counted { result: Vec<Ticket>, count: usize },
    Plain(Vec<Ticket>),
}

impl QueryOutput {
    /// Short label of the response shape (for logs and metrics).
    pub fn shape(&self) -> &'static str {
        match self {
            QueryOutput::Grouped { .. } => "grouped",
            QueryOutput::Counted { .. } => "counted",
            QueryOutput::Plain(_) => "plain",
        }
    }
}

/// Run every stage over the full ticket set.
pub fn run(tickets: Vec<Ticket>, query: &TicketQuery, mode: FilterMode) -> QueryOutput {
    let total = tickets.len();

    let tickets = search(tickets, &query.search);
    let tickets = filter(tickets, &query.filters, mode);
    let tickets = sort(tickets, &query.sort);
    let count = tickets.len();

    debug!(total, count, "Query matched tickets");

    if !query.group.is_empty() {
        return QueryOutput::Grouped {
            result: group(tickets, &query.group),
            count,
        };
    }

    let tickets = page(tickets, query.skip, query.take);

    if query.requires_counts {
        QueryOutput::Counted {
            result: tickets,
            count,
        }
    } else {
        QueryOutput::Plain(tickets)
    }
}

/// Keep tickets matching at least one search term.
pub fn search(tickets: Vec<Ticket>, terms: &[SearchTerm]) -> Vec<Ticket> {
    if terms.is_empty() {
        return tickets;
    }

    tickets
        .into_iter()
        .filter(|ticket| terms.iter().any(|term| term.matches(ticket)))
        .collect()
}

/// Keep tickets satisfying every predicate.
pub fn filter(tickets: Vec<Ticket>, predicates: &[Predicate], mode: FilterMode) -> Vec<Ticket> {
    if predicates.is_empty() {
        return tickets;
    }

    let governing = match mode {
        FilterMode::PerPredicate => None,
        FilterMode::FirstOperator => predicates.iter().find_map(Predicate::first_operator),
    };

    tickets
        .into_iter()
        .filter(|ticket| predicates.iter().all(|p| p.matches(ticket, governing)))
        .collect()
}

/// Stable multi-key sort; the first key is the primary one.
pub fn sort(mut tickets: Vec<Ticket>, keys: &[SortKey]) -> Vec<Ticket> {
    if keys.is_empty() {
        return tickets;
    }

    tickets.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering = compare_values(&key.field.value(a), &key.field.value(b));
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    tickets
}

/// Partition by the first field, then recursively by the rest.
///
/// Groups appear in the order their key is first seen.
pub fn group(tickets: Vec<Ticket>, fields: &[TicketField]) -> Vec<Group> {
    let Some((&field, rest)) = fields.split_first() else {
        return Vec::new();
    };

    let mut buckets: Vec<(Value, Vec<Ticket>)> = Vec::new();
    for ticket in tickets {
        let key = field.value(&ticket).to_json();
        match buckets.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(ticket),
            None => buckets.push((key, vec![ticket])),
        }
    }

    buckets
        .into_iter()
        .map(|(key, members)| {
            let count = members.len();
            let items = if rest.is_empty() {
                GroupItems::Tickets(members)
            } else {
                GroupItems::Groups(group(members, rest))
            };
            Group {
                key,
                field: field.name().to_string(),
                count,
                items,
            }
        })
        .collect()
}

/// Skip then take. A `take` of zero means no limit.
pub fn page(tickets: Vec<Ticket>, skip: usize, take: usize) -> Vec<Ticket> {
    let remaining = tickets.into_iter().skip(skip);
    if take == 0 {
        remaining.collect()
    } else {
        remaining.take(take).collect()
    }
}
