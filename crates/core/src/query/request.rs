//! Wire format of grid list requests.
//!
//! The grid posts every list request as one JSON object. Only the clauses
//! the pipeline understands are modelled; anything else it sends
//! (`aggregates`, `select`, `params`, ...) is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A list request as posted by the grid.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataManagerRequest {
    #[serde(default)]
    pub search: Option<Vec<SearchFilter>>,
    #[serde(default, rename = "where")]
    pub where_filters: Option<Vec<WhereFilter>>,
    #[serde(default)]
    pub sorted: Option<Vec<Sort>>,
    #[serde(default)]
    pub group: Option<Vec<String>>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub take: Option<usize>,
    #[serde(default)]
    pub requires_counts: Option<bool>,
}

/// One search box entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Columns to search. Empty means every text column.
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    pub key: String,
}

/// A filter predicate, possibly a nested and/or group.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereFilter {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub ignore_case: Option<bool>,
    #[serde(default)]
    pub is_complex: bool,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub predicates: Option<Vec<WhereFilter>>,
}

/// A sort column.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sort {
    pub name: String,
    #[serde(default)]
    pub direction: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_grid_request() {
        let json = r#"{
            "requiresCounts": true,
            "skip": 10,
            "take": 5,
            "sorted": [{"name": "Priority", "direction": "descending"}],
            "where": [{
                "isComplex": true,
                "condition": "and",
                "predicates": [
                    {"field": "Status", "operator": "equal", "value": "Open", "ignoreCase": true}
                ]
            }],
            "search": [{"fields": ["Title"], "key": "printer", "operator": "contains", "ignoreCase": true}],
            "group": ["Department"],
            "aggregates": [],
            "params": {}
        }"#;

        let request: DataManagerRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.requires_counts, Some(true));
        assert_eq!(request.skip, Some(10));
        assert_eq!(request.take, Some(5));
        assert_eq!(request.sorted.as_ref().unwrap()[0].name, "Priority");

        let filters = request.where_filters.as_ref().unwrap();
        assert!(filters[0].is_complex);
        let inner = filters[0].predicates.as_ref().unwrap();
        assert_eq!(inner[0].field.as_deref(), Some("Status"));
        assert_eq!(inner[0].value, Value::from("Open"));

        assert_eq!(request.search.as_ref().unwrap()[0].key, "printer");
        assert_eq!(request.group.as_ref().unwrap(), &vec!["Department".to_string()]);
    }

    #[test]
    fn test_deserialize_empty_request() {
        let request: DataManagerRequest = serde_json::from_str("{}").unwrap();
        assert!(request.search.is_none());
        assert!(request.where_filters.is_none());
        assert_eq!(request.skip, None);
    }

    #[test]
    fn test_deserialize_null_clauses() {
        let json = r#"{"where": null, "sorted": null, "skip": null, "requiresCounts": false}"#;
        let request: DataManagerRequest = serde_json::from_str(json).unwrap();
        assert!(request.where_filters.is_none());
        assert!(request.sorted.is_none());
        assert_eq!(request.requires_counts, Some(false));
    }

    #[test]
    fn test_negative_skip_rejected() {
        let result: Result<DataManagerRequest, _> = serde_json::from_str(r#"{"skip": -1}"#);
        assert!(result.is_err());
    }
}
