//! Validated list query.

use std::str::FromStr;

use super::field::TicketField;
use super::predicate::Predicate;
use super::request::DataManagerRequest;
use super::QueryError;
use crate::ticket::Ticket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortDirection::Ascending),
            "descending" | "desc" => Ok(SortDirection::Descending),
            _ => Err(QueryError::UnknownDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: TicketField,
    pub direction: SortDirection,
}

/// One search term and the fields it is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// Lowercased search key.
    pub key: String,
    /// Empty means every text field.
    pub fields: Vec<TicketField>,
}

impl SearchTerm {
    pub fn new(key: &str, fields: Vec<TicketField>) -> Self {
        Self {
            key: key.to_lowercase(),
            fields,
        }
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        let fields: &[TicketField] = if self.fields.is_empty() {
            &TicketField::TEXT
        } else {
            &self.fields
        };

        fields.iter().any(|field| {
            field
                .value(ticket)
                .display()
                .is_some_and(|text| text.to_lowercase().contains(&self.key))
        })
    }
}

/// A list request after validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketQuery {
    pub search: Vec<SearchTerm>,
    pub filters: Vec<Predicate>,
    pub sort: Vec<SortKey>,
    pub group: Vec<TicketField>,
    pub skip: usize,
    /// Zero means no limit.
    pub take: usize,
    pub requires_counts: bool,
}

impl TryFrom<&DataManagerRequest> for TicketQuery {
    type Error = QueryError;

    fn try_from(request: &DataManagerRequest) -> Result<Self, Self::Error> {
        let search = request
            .search
            .iter()
            .flatten()
            .filter(|entry| !entry.key.is_empty())
            .map(|entry| -> Result<SearchTerm, QueryError> {
                let fields = entry
                    .fields
                    .iter()
                    .flatten()
                    .map(|name| name.parse())
                    .collect::<Result<Vec<TicketField>, _>>()?;
                Ok(SearchTerm::new(&entry.key, fields))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        let filters = request
            .where_filters
            .iter()
            .flatten()
            .map(Predicate::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let sort = request
            .sorted
            .iter()
            .flatten()
            .map(|sort| -> Result<SortKey, QueryError> {
                Ok(SortKey {
                    field: sort.name.parse()?,
                    direction: match sort.direction.as_deref() {
                        Some(direction) => direction.parse()?,
                        None => SortDirection::default(),
                    },
                })
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        let group = request
            .group
            .iter()
            .flatten()
            .map(|name| name.parse())
            .collect::<Result<Vec<TicketField>, _>>()?;

        Ok(TicketQuery {
            search,
            filters,
            sort,
            group,
            skip: request.skip.unwrap_or(0),
            take: request.take.unwrap_or(0),
            requires_counts: request.requires_counts.unwrap_or(false),
        })
    }
}
