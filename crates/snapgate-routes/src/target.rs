//! Request target parsing.

use std::collections::BTreeMap;

use snapgate_store::canonicalize;

/// Canonical path and flat query of an inbound request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestTarget {
    /// Canonical path, without query or fragment.
    pub path: String,
    /// Query parameters. On duplicate keys the last occurrence wins.
    pub query: BTreeMap<String, String>,
}

impl RequestTarget {
    /// Parse a raw request target such as `/post/1/?a=1&a=2`.
    ///
    /// An unparseable query string yields an empty map.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.split_once('#').map_or(raw, |(before, _)| before);
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let path = if path.is_empty() { "/" } else { path };

        let query = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .unwrap_or_default()
            .into_iter()
            .collect();

        Self {
            path: canonicalize(path).to_owned(),
            query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_splits_query() {
        let target = RequestTarget::parse("/post/1/?ref=home&page=2");
        assert_eq!(target.path, "/post/1");
        assert_eq!(target.query.get("ref").map(String::as_str), Some("home"));
        assert_eq!(target.query.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let target = RequestTarget::parse("/?a=1&b=x&a=2");
        assert_eq!(target.query.get("a").map(String::as_str), Some("2"));
        assert_eq!(target.query.len(), 2);
    }

    #[test]
    fn test_query_is_decoded() {
        let target = RequestTarget::parse("/search?q=rust+lang&x=%2F");
        assert_eq!(target.query.get("q").map(String::as_str), Some("rust lang"));
        assert_eq!(target.query.get("x").map(String::as_str), Some("/"));
    }

    #[test]
    fn test_root_and_empty() {
        assert_eq!(RequestTarget::parse("/").path, "/");
        assert_eq!(RequestTarget::parse("").path, "/");
        assert_eq!(RequestTarget::parse("?a=1").path, "/");
    }

    #[test]
    fn test_fragment_dropped() {
        let target = RequestTarget::parse("/about#team");
        assert_eq!(target.path, "/about");
        assert!(target.query.is_empty());
    }
}
