//! Query string composition.

use crate::{ApiError, Result};
use serde::Serialize;
use url::form_urlencoded;

/// Builds query strings from serializable values.
///
/// Fields that serialize to nothing (`None`) or to an empty string are
/// skipped. A query without any remaining field is rejected.
///
/// ```
/// use serene_http_client::QueryFactory;
///
/// #[derive(serde::Serialize)]
/// struct Search { name: &'static str, page: u32, tag: Option<String> }
///
/// let search = Search { name: "cog", page: 2, tag: None };
/// assert_eq!(QueryFactory::build(&search).unwrap(), "name=cog&page=2");
/// assert_eq!(QueryFactory::build_fields(&search, &["page"]).unwrap(), "page=2");
/// ```
pub struct QueryFactory;

impl QueryFactory {
    /// Use every field of `query`.
    pub fn build<Q: Serialize + ?Sized>(query: &Q) -> Result<String> {
        let pairs = Self::pairs(query)?;
        Self::encode(pairs)
    }

    /// Use only the named fields of `query`, in the given order.
    pub fn build_fields<Q: Serialize + ?Sized>(query: &Q, fields: &[&str]) -> Result<String> {
        let pairs = Self::pairs(query)?;
        let selected = fields
            .iter()
            .flat_map(|field| pairs.iter().filter(move |(name, _)| name == field))
            .cloned()
            .collect();

        Self::encode(selected)
    }

    fn pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
        let encoded =
            serde_urlencoded::to_string(query).map_err(|e| ApiError::InvalidQuery(e.to_string()))?;

        Ok(form_urlencoded::parse(encoded.as_bytes())
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect())
    }

    fn encode(pairs: Vec<(String, String)>) -> Result<String> {
        if pairs.is_empty() {
            return Err(ApiError::InvalidQuery(
                "a query must have at least one value".to_string(),
            ));
        }

        Ok(form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Search {
        name: String,
        page: u32,
        colour: Option<String>,
        note: String,
    }

    fn search() -> Search {
        Search {
            name: "blue cog".to_string(),
            page: 3,
            colour: None,
            note: String::new(),
        }
    }

    #[test]
    fn test_all_fields() {
        assert_eq!(QueryFactory::build(&search()).unwrap(), "name=blue+cog&page=3");
    }

    #[test]
    fn test_selected_fields_follow_selection_order() {
        let query = QueryFactory::build_fields(&search(), &["page", "name"]).unwrap();
        assert_eq!(query, "page=3&name=blue+cog");
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let result = QueryFactory::build_fields(&search(), &["colour", "note"]);
        assert!(matches!(result, Err(ApiError::InvalidQuery(_))));
    }

    #[test]
    fn test_maps_and_pairs_are_accepted() {
        let query = QueryFactory::build(&[("id", "7"), ("sort", "asc")]).unwrap();
        assert_eq!(query, "id=7&sort=asc");
    }

    #[test]
    fn test_nested_values_are_rejected() {
        #[derive(Serialize)]
        struct Nested {
            inner: Vec<u32>,
        }

        let result = QueryFactory::build(&Nested { inner: vec![1] });
        assert!(matches!(result, Err(ApiError::InvalidQuery(_))));
    }
}
