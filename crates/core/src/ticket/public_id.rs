//! Human-readable ticket identifiers (`NET-1001`, `NET-1002`, ...).

use regex_lite::Regex;

use super::TicketError;
use crate::config::PublicIdConfig;

/// Derives the next public identifier from the identifiers already stored.
///
/// The generator is stateless: callers hand it the current identifiers and
/// it returns `max(suffix) + 1`. Two callers working from the same snapshot
/// get the same answer, so uniqueness depends on the caller serializing the
/// read and the following insert.
#[derive(Debug, Clone)]
pub struct PublicIdGenerator {
    config: PublicIdConfig,
    pattern: Regex,
}

impl PublicIdGenerator {
    pub fn new(config: PublicIdConfig) -> Result<Self, TicketError> {
        let pattern = Regex::new(&format!(
            r"^{}{}(\d+)$",
            regex_lite::escape(&config.prefix),
            regex_lite::escape(&config.separator)
        ))
        .map_err(|e| TicketError::Config(e.to_string()))?;

        Ok(Self { config, pattern })
    }

    /// Literal `<prefix><separator>` every generated identifier starts with.
    pub fn stem(&self) -> String {
        format!("{}{}", self.config.prefix, self.config.separator)
    }

    /// Numeric suffix of `id` if it follows this generator's scheme.
    pub fn suffix_of(&self, id: &str) -> Option<u64> {
        self.pattern
            .captures(id)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Next identifier given the identifiers currently in storage.
    pub fn next_from<'a, I>(&self, existing: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let next = existing
            .into_iter()
            .filter_map(|id| self.suffix_of(id))
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(self.config.start_number);

        format!("{}{}", self.stem(), next)
    }
}
