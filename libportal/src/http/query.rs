//! Query string building
//!
//! Filters are optional; absent or falsy values (`None`, empty strings)
//! are left out of the query entirely.

use std::fmt::Display;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Bytes escaped inside one path segment: the URL path set plus `/` and `%`
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Push `value` unless it is `None` or empty
    pub fn push_str(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) if !value.is_empty() => self.push(key, value),
            _ => self,
        }
    }

    /// Push `value` unless it is `None`
    pub fn push_opt<T: Display>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` form, in insertion order
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// Encode a single path segment (ids, booking codes)
pub fn path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falsy_values_are_omitted() {
        let mut query = Query::new();
        query
            .push_str("Role", Some("Staff"))
            .push_str("Status", Some("true"))
            .push_str("Search", Some(""))
            .push_str("CinemaId", None)
            .push_opt::<bool>("HasPayment", None)
            .push("Page", 2)
            .push("PageSize", 10);

        assert_eq!(query.encode(), "Role=Staff&Status=true&Page=2&PageSize=10");
        assert!(query.get("Search").is_none());
    }

    #[test]
    fn test_false_is_kept_when_explicit() {
        let mut query = Query::new();
        query.push_opt("HasPayment", Some(false));
        assert_eq!(query.encode(), "HasPayment=false");
    }

    #[test]
    fn test_values_are_encoded() {
        let mut query = Query::new();
        query.push_str("Search", Some("Lan Nguyen&co"));
        assert_eq!(query.encode(), "Search=Lan+Nguyen%26co");
    }

    #[test]
    fn test_path_segment_escapes_separators() {
        assert_eq!(path_segment("BK-2024-001"), "BK-2024-001");
        assert_eq!(path_segment("a/b"), "a%2Fb");
        assert_eq!(path_segment("50%"), "50%25");
    }

    #[test]
    fn test_path_segment_spaces_are_percent_encoded() {
        assert_eq!(path_segment("BK 001"), "BK%20001");
        assert_eq!(path_segment("a+b"), "a+b");
        assert_eq!(path_segment("Đ?x"), "%C4%90%3Fx");
    }
}
