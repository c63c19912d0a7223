use serde::{Deserialize, Serialize};

use super::MediaItem;

/// Query and filters of a catalog search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub genres: Vec<i64>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl SearchFilters {
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Blank queries never reach the catalog
    pub fn is_empty_query(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// Query-string form of [`SearchFilters`]; `genres` is comma separated
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl SearchParams {
    pub fn into_filters(self) -> (SearchFilters, u32) {
        let genres = self
            .genres
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|g| g.trim().parse::<i64>().ok())
            .collect();

        let filters = SearchFilters {
            query: self.query,
            genres,
            year: self.year.filter(|y| !y.trim().is_empty()),
            region: self.region.filter(|r| !r.trim().is_empty()),
        };

        (filters, self.page.unwrap_or(1).max(1))
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchPage {
    pub page: u32,
    pub results: Vec<MediaItem>,
    pub total_pages: u32,
    pub total_results: u32,
    pub has_more: bool,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self {
            page: 0,
            results: Vec::new(),
            total_pages: 0,
            total_results: 0,
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_into_filters() {
        let params = SearchParams {
            query: "dune".to_string(),
            genres: Some("878, 12,,abc".to_string()),
            year: Some("".to_string()),
            region: Some("US".to_string()),
            page: Some(0),
        };

        let (filters, page) = params.into_filters();
        assert_eq!(filters.genres, vec![878, 12]);
        assert_eq!(filters.year, None);
        assert_eq!(filters.region.as_deref(), Some("US"));
        assert_eq!(page, 1);
    }

    #[test]
    fn test_blank_query() {
        assert!(SearchFilters::with_query("   ").is_empty_query());
        assert!(!SearchFilters::with_query("alien").is_empty_query());
    }
}
